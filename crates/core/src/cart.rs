//! Session-held shopping cart.
//!
//! The cart is a plain value: handlers load it from the session, call one of
//! the mutating methods and write it straight back. It never holds an entry
//! with a zero quantity, and keys are unique catalog item IDs.
//!
//! In the session the cart is stored as a list of `{item_id, quantity}`
//! entries so that it survives JSON round trips unchanged.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::order::LineAmount;
use crate::types::{CupcakeId, Price};

/// Most units of a single item one cart line may hold.
pub const MAX_LINE_QUANTITY: u32 = 999;

/// One serialized cart entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartEntry {
    /// Catalog item.
    pub item_id: CupcakeId,
    /// Requested units, always at least 1.
    pub quantity: u32,
}

/// Result of [`Cart::decrement`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decrement {
    /// Quantity lowered; the new quantity is at least 1.
    Reduced(u32),
    /// The entry had a single unit and was removed.
    Removed,
    /// The item was not in the cart.
    Missing,
}

/// Mapping from catalog item to requested quantity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<CartEntry>", into = "Vec<CartEntry>")]
pub struct Cart {
    items: BTreeMap<CupcakeId, u32>,
}

impl Cart {
    /// An empty cart.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `requested` units of an item, merging with any existing quantity.
    ///
    /// Requests below 1 are clamped to 1, and the merged line never exceeds
    /// [`MAX_LINE_QUANTITY`]. Returns the number of units actually added.
    pub fn add(&mut self, item_id: CupcakeId, requested: i64) -> u32 {
        let requested = u32::try_from(requested.max(1)).unwrap_or(u32::MAX);
        let entry = self.items.entry(item_id).or_insert(0);
        let before = *entry;
        *entry = capped(before.saturating_add(requested));
        *entry - before
    }

    /// Add one unit of an item, up to [`MAX_LINE_QUANTITY`]. Returns the new
    /// quantity.
    pub fn increment(&mut self, item_id: CupcakeId) -> u32 {
        let entry = self.items.entry(item_id).or_insert(0);
        *entry = capped(entry.saturating_add(1));
        *entry
    }

    /// Remove one unit of an item, dropping the entry when it reaches zero.
    pub fn decrement(&mut self, item_id: CupcakeId) -> Decrement {
        match self.items.get_mut(&item_id) {
            None => Decrement::Missing,
            Some(quantity) if *quantity > 1 => {
                *quantity -= 1;
                Decrement::Reduced(*quantity)
            }
            Some(_) => {
                self.items.remove(&item_id);
                Decrement::Removed
            }
        }
    }

    /// Remove an item entirely. Returns whether it was present.
    pub fn remove(&mut self, item_id: CupcakeId) -> bool {
        self.items.remove(&item_id).is_some()
    }

    /// Empty the cart.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Whether the cart has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of distinct items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Sum of all quantities, for the cart badge.
    #[must_use]
    pub fn total_units(&self) -> u32 {
        self.items.values().fold(0, |acc, q| acc.saturating_add(*q))
    }

    /// Quantity of one item, if present.
    #[must_use]
    pub fn quantity(&self, item_id: CupcakeId) -> Option<u32> {
        self.items.get(&item_id).copied()
    }

    /// IDs of every item in the cart, ascending.
    #[must_use]
    pub fn item_ids(&self) -> Vec<CupcakeId> {
        self.items.keys().copied().collect()
    }

    /// Entries in ascending item order.
    pub fn entries(&self) -> impl Iterator<Item = CartEntry> + '_ {
        self.items.iter().map(|(item_id, quantity)| CartEntry {
            item_id: *item_id,
            quantity: *quantity,
        })
    }

    /// Join the cart against the current catalog.
    ///
    /// Entries whose item is not in `catalog` (deleted since it was added)
    /// are dropped from the snapshot without error; the cart itself is left
    /// untouched.
    #[must_use]
    pub fn snapshot<T>(&self, catalog: &[T]) -> CartSnapshot<T>
    where
        T: CatalogEntry + Clone,
    {
        let by_id: HashMap<CupcakeId, &T> =
            catalog.iter().map(|item| (item.catalog_id(), item)).collect();

        let lines: Vec<CartLine<T>> = self
            .items
            .iter()
            .filter_map(|(id, quantity)| {
                by_id.get(id).map(|item| {
                    let amount = LineAmount::new(*quantity, item.unit_price());
                    CartLine {
                        item: (*item).clone(),
                        quantity: *quantity,
                        subtotal: amount.subtotal(),
                    }
                })
            })
            .collect();

        let total = lines.iter().map(|line| line.subtotal).sum();
        CartSnapshot { lines, total }
    }
}

impl From<Vec<CartEntry>> for Cart {
    fn from(entries: Vec<CartEntry>) -> Self {
        let mut items = BTreeMap::new();
        for entry in entries.into_iter().filter(|e| e.quantity > 0) {
            let slot: &mut u32 = items.entry(entry.item_id).or_insert(0);
            *slot = capped(slot.saturating_add(entry.quantity));
        }
        Self { items }
    }
}

impl From<Cart> for Vec<CartEntry> {
    fn from(cart: Cart) -> Self {
        cart.entries().collect()
    }
}

const fn capped(quantity: u32) -> u32 {
    if quantity > MAX_LINE_QUANTITY {
        MAX_LINE_QUANTITY
    } else {
        quantity
    }
}

/// A catalog item as seen by the cart.
pub trait CatalogEntry {
    /// Catalog ID of the item.
    fn catalog_id(&self) -> CupcakeId;
    /// Current unit price.
    fn unit_price(&self) -> Price;
}

/// One priced cart line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartLine<T> {
    /// The catalog item.
    pub item: T,
    /// Requested units.
    pub quantity: u32,
    /// `price × quantity`.
    pub subtotal: Price,
}

/// A cart joined against the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartSnapshot<T> {
    /// Lines for items that still exist.
    pub lines: Vec<CartLine<T>>,
    /// Sum of line subtotals.
    pub total: Price,
}

impl<T> CartSnapshot<T> {
    /// Whether no line survived the join.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq, Eq)]
    struct Item {
        id: CupcakeId,
        price: Price,
    }

    impl CatalogEntry for Item {
        fn catalog_id(&self) -> CupcakeId {
            self.id
        }

        fn unit_price(&self) -> Price {
            self.price
        }
    }

    fn id(n: i32) -> CupcakeId {
        CupcakeId::new(n)
    }

    #[test]
    fn test_add_defaults_and_merges() {
        let mut cart = Cart::new();
        assert_eq!(cart.add(id(1), 1), 1);
        assert_eq!(cart.add(id(1), 3), 3);
        assert_eq!(cart.quantity(id(1)), Some(4));
        assert_eq!(cart.len(), 1);
    }

    #[test]
    fn test_add_clamps_to_one() {
        let mut cart = Cart::new();
        assert_eq!(cart.add(id(2), 0), 1);
        assert_eq!(cart.add(id(2), -7), 1);
        assert_eq!(cart.quantity(id(2)), Some(2));
    }

    #[test]
    fn test_line_quantity_is_capped() {
        let mut cart = Cart::new();
        assert_eq!(cart.add(id(3), 3_000_000_000), MAX_LINE_QUANTITY);
        assert_eq!(cart.quantity(id(3)), Some(MAX_LINE_QUANTITY));

        // Merges and increments stay at the cap
        assert_eq!(cart.add(id(3), 5), 0);
        assert_eq!(cart.increment(id(3)), MAX_LINE_QUANTITY);

        cart.add(id(4), i64::from(MAX_LINE_QUANTITY) - 1);
        assert_eq!(cart.add(id(4), 10), 1);

        let q = cart.quantity(id(4)).unwrap();
        assert!(i32::try_from(q).is_ok());
    }

    #[test]
    fn test_deserialize_caps_merged_quantities() {
        let cart: Cart = serde_json::from_str(
            r#"[{"item_id":1,"quantity":4000000000},{"item_id":1,"quantity":4000000000}]"#,
        )
        .unwrap();
        assert_eq!(cart.quantity(id(1)), Some(MAX_LINE_QUANTITY));
    }

    #[test]
    fn test_increment_creates_entry() {
        let mut cart = Cart::new();
        assert_eq!(cart.increment(id(5)), 1);
        assert_eq!(cart.increment(id(5)), 2);
    }

    #[test]
    fn test_decrement_reduces_then_removes() {
        let mut cart = Cart::new();
        cart.add(id(3), 2);
        assert_eq!(cart.decrement(id(3)), Decrement::Reduced(1));
        assert_eq!(cart.decrement(id(3)), Decrement::Removed);
        assert_eq!(cart.quantity(id(3)), None);
        assert_eq!(cart.decrement(id(3)), Decrement::Missing);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_remove_is_noop_when_absent() {
        let mut cart = Cart::new();
        cart.add(id(1), 1);
        assert!(!cart.remove(id(9)));
        assert!(cart.remove(id(1)));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_mixed_operations_never_leave_zero_quantities() {
        let mut cart = Cart::new();
        let ops: [(u8, i32, i64); 14] = [
            (0, 1, 2),
            (2, 1, 0),
            (2, 1, 0),
            (2, 1, 0),
            (1, 2, 0),
            (0, 3, -4),
            (2, 3, 0),
            (3, 2, 0),
            (2, 2, 0),
            (1, 4, 0),
            (0, 4, 0),
            (2, 4, 0),
            (2, 4, 0),
            (3, 5, 0),
        ];
        for (op, item, qty) in ops {
            match op {
                0 => {
                    cart.add(id(item), qty);
                }
                1 => {
                    cart.increment(id(item));
                }
                2 => {
                    cart.decrement(id(item));
                }
                _ => {
                    cart.remove(id(item));
                }
            }
            assert!(cart.entries().all(|e| e.quantity >= 1));
        }
        assert!(cart.is_empty());
    }

    #[test]
    fn test_clear() {
        let mut cart = Cart::new();
        cart.add(id(1), 4);
        cart.add(id(2), 1);
        assert_eq!(cart.total_units(), 5);
        cart.clear();
        assert!(cart.is_empty());
        assert_eq!(cart.total_units(), 0);
    }

    #[test]
    fn test_snapshot_prices_lines_and_drops_missing_items() {
        let mut cart = Cart::new();
        cart.add(id(1), 3);
        cart.add(id(2), 1);
        cart.add(id(99), 2);

        let catalog = vec![
            Item {
                id: id(1),
                price: Price::from_cents(500),
            },
            Item {
                id: id(2),
                price: Price::from_cents(1250),
            },
        ];

        let snapshot = cart.snapshot(&catalog);
        assert_eq!(snapshot.lines.len(), 2);
        assert_eq!(snapshot.lines[0].subtotal, Price::from_cents(1500));
        assert_eq!(snapshot.lines[1].subtotal, Price::from_cents(1250));
        assert_eq!(snapshot.total, Price::from_cents(2750));
        // The stale entry is only hidden from the snapshot
        assert_eq!(cart.quantity(id(99)), Some(2));
    }

    #[test]
    fn test_snapshot_of_empty_cart() {
        let snapshot = Cart::new().snapshot::<Item>(&[]);
        assert!(snapshot.is_empty());
        assert_eq!(snapshot.total, Price::ZERO);
    }

    #[test]
    fn test_session_json_round_trip_keeps_entries() {
        let mut cart = Cart::new();
        cart.add(id(7), 2);
        cart.add(id(3), 1);

        let value = serde_json::to_value(&cart).unwrap();
        assert_eq!(
            value,
            serde_json::json!([
                {"item_id": 3, "quantity": 1},
                {"item_id": 7, "quantity": 2}
            ])
        );
        let restored: Cart = serde_json::from_value(value).unwrap();
        assert_eq!(restored, cart);
    }

    #[test]
    fn test_deserialize_drops_zero_and_merges_duplicates() {
        let cart: Cart = serde_json::from_str(
            r#"[{"item_id":1,"quantity":0},{"item_id":2,"quantity":1},{"item_id":2,"quantity":2}]"#,
        )
        .unwrap();
        assert_eq!(cart.quantity(id(1)), None);
        assert_eq!(cart.quantity(id(2)), Some(3));
    }
}
