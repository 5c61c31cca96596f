//! Order totals and status transitions.
//!
//! Totals are never stored on the order row. Every view (customer history,
//! admin detail, dashboard, exports) computes them through [`order_total`] from
//! the current catalog price of each line.

use crate::types::{OrderStatus, Price};

/// Quantity and current unit price of one order line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineAmount {
    /// Units ordered.
    pub quantity: u32,
    /// Current catalog price of one unit.
    pub unit_price: Price,
}

impl LineAmount {
    /// Create a line amount.
    #[must_use]
    pub const fn new(quantity: u32, unit_price: Price) -> Self {
        Self {
            quantity,
            unit_price,
        }
    }

    /// `unit_price × quantity`.
    #[must_use]
    pub fn subtotal(&self) -> Price {
        self.unit_price.times(self.quantity)
    }
}

/// Sum of line subtotals.
pub fn order_total<I>(lines: I) -> Price
where
    I: IntoIterator<Item = LineAmount>,
{
    lines.into_iter().map(|line| line.subtotal()).sum()
}

/// An administrator-driven status change.
///
/// Every transition, whatever its kind, appends exactly one entry to the
/// order's status history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusTransition {
    /// Move to the next status of the progression, wrapping after `Entregue`.
    Advance,
    /// Jump to an explicit status of the progression.
    Set(OrderStatus),
    /// Force `Cancelado` from any state.
    Cancel,
}

impl StatusTransition {
    /// Status the order ends up in when starting from `current`.
    #[must_use]
    pub fn apply(self, current: OrderStatus) -> OrderStatus {
        match self {
            Self::Advance => current.advance(),
            Self::Set(target) => target,
            Self::Cancel => OrderStatus::Cancelado,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_total_fixture() {
        let lines = [
            LineAmount::new(3, Price::from_cents(500)),
            LineAmount::new(1, Price::from_cents(1250)),
        ];
        assert_eq!(order_total(lines), Price::from_cents(2750));
    }

    #[test]
    fn test_order_total_empty_is_zero() {
        assert_eq!(order_total(Vec::<LineAmount>::new()), Price::ZERO);
    }

    #[test]
    fn test_subtotal() {
        assert_eq!(
            LineAmount::new(4, Price::from_cents(399)).subtotal(),
            Price::from_cents(1596)
        );
    }

    #[test]
    fn test_transitions() {
        assert_eq!(
            StatusTransition::Advance.apply(OrderStatus::Pronto),
            OrderStatus::Entregue
        );
        assert_eq!(
            StatusTransition::Set(OrderStatus::Pronto).apply(OrderStatus::Recebido),
            OrderStatus::Pronto
        );
        for status in OrderStatus::ALL {
            assert_eq!(StatusTransition::Cancel.apply(status), OrderStatus::Cancelado);
        }
    }
}
