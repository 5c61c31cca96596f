//! Per-page layout data shared by every rendered template.

use axum::{extract::FromRequestParts, http::request::Parts};
use tower_sessions::Session;

use cupcake_core::Cart;

use super::flash::{Flash, take_flashes};
use crate::models::{CurrentUser, session_keys};

/// What the base layout needs: who is logged in, the cart badge and the
/// pending flash messages.
///
/// Extracting this consumes the flash messages, so only handlers that render
/// a full page should ask for it.
#[derive(Debug, Clone, Default)]
pub struct PageContext {
    pub user: Option<CurrentUser>,
    pub cart_units: u32,
    pub flashes: Vec<Flash>,
}

impl PageContext {
    #[must_use]
    pub const fn is_logged_in(&self) -> bool {
        self.user.is_some()
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.user.as_ref().is_some_and(|u| u.is_admin)
    }

    #[must_use]
    pub fn user_name(&self) -> &str {
        self.user.as_ref().map_or("", |u| u.name.as_str())
    }
}

impl<S> FromRequestParts<S> for PageContext
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Some(session) = parts.extensions.get::<Session>() else {
            return Ok(Self::default());
        };

        let user = session
            .get::<CurrentUser>(session_keys::CURRENT_USER)
            .await
            .ok()
            .flatten();
        let cart_units = session
            .get::<Cart>(session_keys::CART)
            .await
            .ok()
            .flatten()
            .map_or(0, |cart| cart.total_units());
        let flashes = take_flashes(session).await;

        Ok(Self {
            user,
            cart_units,
            flashes,
        })
    }
}
