//! One-shot flash messages kept in the session.
//!
//! Handlers push a message before redirecting; the next rendered page takes
//! every pending message and shows it once.

use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use crate::models::session_keys;

/// Severity of a flash message, mapped to an alert style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashLevel {
    Success,
    Info,
    Warning,
    Danger,
}

impl FlashLevel {
    /// CSS class for templates.
    #[must_use]
    pub const fn css_class(self) -> &'static str {
        match self {
            Self::Success => "alert alert-success",
            Self::Info => "alert alert-info",
            Self::Warning => "alert alert-warning",
            Self::Danger => "alert alert-danger",
        }
    }
}

/// A pending message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub level: FlashLevel,
    pub text: String,
}

/// Queue a message for the next rendered page.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn push_flash(
    session: &Session,
    level: FlashLevel,
    text: impl Into<String>,
) -> Result<(), tower_sessions::session::Error> {
    let mut pending: Vec<Flash> = session
        .get(session_keys::FLASH)
        .await?
        .unwrap_or_default();
    pending.push(Flash {
        level,
        text: text.into(),
    });
    session.insert(session_keys::FLASH, pending).await
}

/// Remove and return every pending message.
///
/// A corrupt entry is dropped rather than blocking the page.
pub async fn take_flashes(session: &Session) -> Vec<Flash> {
    match session.remove::<Vec<Flash>>(session_keys::FLASH).await {
        Ok(pending) => pending.unwrap_or_default(),
        Err(e) => {
            tracing::warn!(error = %e, "Discarding unreadable flash messages");
            Vec::new()
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use tower_sessions::MemoryStore;

    use super::*;

    fn session() -> Session {
        Session::new(None, Arc::new(MemoryStore::default()), None)
    }

    #[tokio::test]
    async fn test_flashes_are_taken_once_in_order() {
        let session = session();
        push_flash(&session, FlashLevel::Success, "Quantidade aumentada.")
            .await
            .unwrap();
        push_flash(&session, FlashLevel::Warning, "Item removido do carrinho.")
            .await
            .unwrap();

        let taken = take_flashes(&session).await;
        assert_eq!(taken.len(), 2);
        assert_eq!(taken[0].text, "Quantidade aumentada.");
        assert_eq!(taken[1].level, FlashLevel::Warning);

        assert!(take_flashes(&session).await.is_empty());
    }

    #[test]
    fn test_level_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&FlashLevel::Danger).unwrap(),
            "\"danger\""
        );
        assert_eq!(FlashLevel::Info.css_class(), "alert alert-info");
    }
}
