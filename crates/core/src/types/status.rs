//! Order status lifecycle.
//!
//! ```text
//! Recebido -> Em produção -> Pronto -> Entregue -> (Recebido)
//!     \___________\______________\________\______-> Cancelado
//! ```
//!
//! Advancing is cyclic: advancing a delivered order starts it over at
//! `Recebido`. Cancellation is reachable from every state. Status values are
//! stored in `pedidos.status` and `pedido_status_log.status` using their
//! Portuguese labels.

use core::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Error for a status label that is not one of the five known values.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid order status: {0:?}")]
pub struct StatusParseError(pub String);

/// Status of a bakery order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum OrderStatus {
    /// Order placed, waiting for the kitchen.
    #[default]
    #[serde(rename = "Recebido")]
    Recebido,
    /// Being baked.
    #[serde(rename = "Em produção")]
    EmProducao,
    /// Ready for pickup or delivery.
    #[serde(rename = "Pronto")]
    Pronto,
    /// Handed to the customer. Unlocks rating.
    #[serde(rename = "Entregue")]
    Entregue,
    /// Cancelled by an administrator.
    #[serde(rename = "Cancelado")]
    Cancelado,
}

impl OrderStatus {
    /// The ordered progression used by [`OrderStatus::advance`] and accepted
    /// by the explicit "set status" form.
    pub const PROGRESSION: [Self; 4] = [Self::Recebido, Self::EmProducao, Self::Pronto, Self::Entregue];

    /// Every status, in display order.
    pub const ALL: [Self; 5] = [
        Self::Recebido,
        Self::EmProducao,
        Self::Pronto,
        Self::Entregue,
        Self::Cancelado,
    ];

    /// Portuguese label, as stored in the database and shown to customers.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Recebido => "Recebido",
            Self::EmProducao => "Em produção",
            Self::Pronto => "Pronto",
            Self::Entregue => "Entregue",
            Self::Cancelado => "Cancelado",
        }
    }

    /// Next status in the progression, wrapping after `Entregue`.
    ///
    /// `Cancelado` is outside the progression and restarts at `Recebido`.
    #[must_use]
    pub fn advance(self) -> Self {
        let next = Self::PROGRESSION
            .iter()
            .position(|s| *s == self)
            .map_or(0, |i| (i + 1) % Self::PROGRESSION.len());
        Self::PROGRESSION
            .get(next)
            .copied()
            .unwrap_or(Self::Recebido)
    }

    /// Parse a target for the explicit "set status" transition.
    ///
    /// Only the progression values are accepted; cancelling has its own
    /// transition.
    ///
    /// # Errors
    ///
    /// Returns [`StatusParseError`] for any other input, including `Cancelado`.
    pub fn parse_target(input: &str) -> Result<Self, StatusParseError> {
        let status: Self = input.parse()?;
        if Self::PROGRESSION.contains(&status) {
            Ok(status)
        } else {
            Err(StatusParseError(input.to_owned()))
        }
    }

    /// Whether a customer may rate an order in this status.
    #[must_use]
    pub const fn accepts_rating(self) -> bool {
        matches!(self, Self::Entregue)
    }

    /// CSS badge class for templates.
    #[must_use]
    pub const fn badge_class(self) -> &'static str {
        match self {
            Self::Recebido => "badge badge-info",
            Self::EmProducao => "badge badge-warning",
            Self::Pronto => "badge badge-primary",
            Self::Entregue => "badge badge-success",
            Self::Cancelado => "badge badge-destructive",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for OrderStatus {
    type Err = StatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Self::ALL
            .into_iter()
            .find(|status| status.label() == trimmed)
            .ok_or_else(|| StatusParseError(s.to_owned()))
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for OrderStatus {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for OrderStatus {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let label = <&str as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(label.parse()?)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for OrderStatus {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <&str as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.label(), buf)
    }
}
