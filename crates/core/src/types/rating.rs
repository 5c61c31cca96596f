//! Customer rating of a delivered order.

use serde::{Deserialize, Serialize};

use super::status::OrderStatus;

/// A star rating between 1 and 5 inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub struct Rating(u8);

impl Rating {
    /// Lowest accepted rating.
    pub const MIN: i32 = 1;
    /// Highest accepted rating.
    pub const MAX: i32 = 5;

    /// Build a rating, or `None` when the value is out of range.
    #[must_use]
    pub fn new(value: i32) -> Option<Self> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            u8::try_from(value).ok().map(Self)
        } else {
            None
        }
    }

    /// Numeric value, 1 to 5.
    #[must_use]
    pub const fn value(self) -> u8 {
        self.0
    }

    /// Filled and empty stars for display, e.g. `★★★☆☆`.
    #[must_use]
    pub fn stars(self) -> String {
        let filled = usize::from(self.0);
        format!("{}{}", "★".repeat(filled), "☆".repeat(5 - filled))
    }
}

impl TryFrom<i32> for Rating {
    type Error = String;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Self::new(value).ok_or_else(|| format!("rating must be between 1 and 5, got {value}"))
    }
}

impl From<Rating> for i32 {
    fn from(rating: Rating) -> Self {
        Self::from(rating.0)
    }
}

/// Outcome of a customer submitting a rating for one of their orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RatingDecision {
    /// The rating should be stored.
    Accept(Rating),
    /// The order has not been delivered yet.
    NotDelivered,
    /// The order already carries a rating.
    AlreadyRated,
    /// The submitted value is missing or out of range; dropped without an error.
    Ignore,
}

impl RatingDecision {
    /// Decide whether a submitted rating is applied.
    ///
    /// A rating is accepted only when the order is delivered, has no previous
    /// rating, and the submitted value is an integer in `[1, 5]`.
    #[must_use]
    pub fn evaluate(status: OrderStatus, existing: Option<Rating>, submitted: Option<i32>) -> Self {
        if !status.accepts_rating() {
            return Self::NotDelivered;
        }
        if existing.is_some() {
            return Self::AlreadyRated;
        }
        submitted
            .and_then(Rating::new)
            .map_or(Self::Ignore, Self::Accept)
    }
}
