//! User domain types.
//!
//! These types represent validated domain objects separate from database row types.

use cupcake_core::{Email, UserId};

/// A customer or administrator account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// Display name.
    pub name: String,
    /// Login email, unique across accounts.
    pub email: Email,
    /// Contact phone, `(11) 98765-4321` style.
    pub phone: Option<String>,
    /// Whether the user can reach the administration panel.
    pub is_admin: bool,
}

impl User {
    /// Phone for display, or an empty string.
    #[must_use]
    pub fn phone_or_empty(&self) -> &str {
        self.phone.as_deref().unwrap_or_default()
    }
}
