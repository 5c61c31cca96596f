//! Money amounts in Brazilian reais using decimal arithmetic.

use core::fmt;
use core::iter::Sum;
use core::ops::Add;
use std::str::FromStr;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

/// Errors from parsing a catalog price typed by an administrator.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// The input is not a decimal number.
    #[error("price must be a number, got {0:?}")]
    Invalid(String),
    /// Catalog prices must be greater than zero.
    #[error("price must be greater than zero")]
    NotPositive,
    /// Above what the catalog price column can store.
    #[error("price must not exceed {}", Price::MAX_CATALOG)]
    TooLarge,
}

/// An amount in BRL.
///
/// Used both for catalog unit prices (always positive, see
/// [`Price::parse_positive`]) and for computed subtotals and totals, which
/// may be zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(Decimal);

impl Price {
    /// Zero reais.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Largest catalog price, `NUMERIC(10, 2)`.
    pub const MAX_CATALOG: Self = Self(Decimal::from_parts(1_410_065_407, 2, 0, false, 2));

    /// Wrap a decimal amount.
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Build an amount from a whole number of centavos.
    #[must_use]
    pub fn from_cents(cents: i64) -> Self {
        Self(Decimal::new(cents, 2))
    }

    /// Parse a catalog price from form input.
    ///
    /// Accepts `12.50`, `12,50` and `R$ 12,50`. The amount is rounded to two
    /// decimal places and must be greater than zero.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::Invalid`] for non-numeric input,
    /// [`PriceError::NotPositive`] for zero or negative amounts and
    /// [`PriceError::TooLarge`] above [`Price::MAX_CATALOG`].
    pub fn parse_positive(input: &str) -> Result<Self, PriceError> {
        let cleaned = input
            .trim()
            .trim_start_matches("R$")
            .trim()
            .replace(',', ".");
        let amount =
            Decimal::from_str(&cleaned).map_err(|_| PriceError::Invalid(input.to_owned()))?;
        let amount = amount.round_dp(2);
        if amount <= Decimal::ZERO {
            return Err(PriceError::NotPositive);
        }
        if amount > Self::MAX_CATALOG.0 {
            return Err(PriceError::TooLarge);
        }
        Ok(Self(amount))
    }

    /// The underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Subtotal for `quantity` units at this price.
    #[must_use]
    pub fn times(self, quantity: u32) -> Self {
        Self(self.0 * Decimal::from(quantity))
    }

    /// Lossy conversion for spreadsheet cells and JSON output.
    #[must_use]
    pub fn as_f64(&self) -> f64 {
        self.0.to_f64().unwrap_or_default()
    }

    /// The amount formatted with two decimals and no currency symbol.
    #[must_use]
    pub fn plain(&self) -> String {
        format!("{:.2}", self.0.round_dp(2))
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "R$ {}", self.plain())
    }
}

impl Add for Price {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Sum for Price {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Price {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <Decimal as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <Decimal as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Price {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        Ok(Self(<Decimal as sqlx::Decode<sqlx::Postgres>>::decode(value)?))
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Price {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <Decimal as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_positive_accepts_comma_and_symbol() {
        assert_eq!(Price::parse_positive("12.50").unwrap(), Price::from_cents(1250));
        assert_eq!(Price::parse_positive("12,50").unwrap(), Price::from_cents(1250));
        assert_eq!(Price::parse_positive("R$ 7,9").unwrap(), Price::from_cents(790));
    }

    #[test]
    fn test_parse_positive_rounds_to_centavos() {
        assert_eq!(Price::parse_positive("3.456").unwrap(), Price::from_cents(346));
    }

    #[test]
    fn test_parse_positive_rejects_non_numeric() {
        assert!(matches!(
            Price::parse_positive("doze"),
            Err(PriceError::Invalid(_))
        ));
        assert!(matches!(Price::parse_positive(""), Err(PriceError::Invalid(_))));
    }

    #[test]
    fn test_parse_positive_rejects_zero_and_negative() {
        assert_eq!(Price::parse_positive("0"), Err(PriceError::NotPositive));
        assert_eq!(Price::parse_positive("-4,00"), Err(PriceError::NotPositive));
        assert_eq!(Price::parse_positive("0.001"), Err(PriceError::NotPositive));
    }

    #[test]
    fn test_parse_positive_rejects_amounts_the_column_cannot_hold() {
        assert_eq!(Price::MAX_CATALOG.plain(), "99999999.99");
        assert_eq!(
            Price::parse_positive("99999999,99").unwrap(),
            Price::MAX_CATALOG
        );
        assert_eq!(Price::parse_positive("1000000000"), Err(PriceError::TooLarge));
        assert_eq!(Price::parse_positive("99999999.995"), Err(PriceError::TooLarge));
    }

    #[test]
    fn test_times_and_sum() {
        let total: Price = [Price::from_cents(500).times(3), Price::from_cents(1250).times(1)]
            .into_iter()
            .sum();
        assert_eq!(total, Price::from_cents(2750));
    }

    #[test]
    fn test_display() {
        assert_eq!(Price::from_cents(2750).to_string(), "R$ 27.50");
        assert_eq!(Price::ZERO.to_string(), "R$ 0.00");
        assert_eq!(Price::from_cents(1000).plain(), "10.00");
    }

    #[test]
    fn test_as_f64() {
        assert!((Price::from_cents(1250).as_f64() - 12.5).abs() < f64::EPSILON);
    }
}
