//! Authentication middleware and extractors.
//!
//! Provides extractors for requiring a logged-in user, or an administrator,
//! in route handlers. A failed check never surfaces as an error page: the
//! visitor gets a flash message and a redirect.

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use super::flash::{FlashLevel, push_flash};
use crate::models::{CurrentUser, session_keys};

/// Where visitors without a session identity are sent.
pub const LOGIN_PATH: &str = "/login";

/// Where logged-in non-administrators are sent.
pub const FALLBACK_PATH: &str = "/vitrine";

/// Extractor that requires a logged-in user.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAuth(user): RequireAuth,
/// ) -> impl IntoResponse {
///     format!("Olá, {}!", user.name)
/// }
/// ```
pub struct RequireAuth(pub CurrentUser);

/// Extractor that requires a logged-in administrator.
pub struct RequireAdmin(pub CurrentUser);

/// Error returned when an access check fails.
#[derive(Debug)]
pub enum AuthRejection {
    /// No user in the session.
    RedirectToLogin,
    /// A user is logged in but is not an administrator.
    RedirectToFallback,
    /// The session layer is missing from the stack.
    MissingSession,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin => Redirect::to(LOGIN_PATH).into_response(),
            Self::RedirectToFallback => Redirect::to(FALLBACK_PATH).into_response(),
            Self::MissingSession => {
                tracing::error!("Session not found in request extensions - session layer missing");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}

async fn session_user(parts: &Parts) -> Result<(Session, Option<CurrentUser>), AuthRejection> {
    let session = parts
        .extensions
        .get::<Session>()
        .cloned()
        .ok_or(AuthRejection::MissingSession)?;

    let user = session
        .get::<CurrentUser>(session_keys::CURRENT_USER)
        .await
        .ok()
        .flatten();

    Ok((session, user))
}

/// Flash a message on the way out of a failed check.
///
/// A session store failure here only loses the message; the redirect still
/// happens.
async fn flash_rejection(session: &Session, level: FlashLevel, text: &str) {
    if let Err(e) = push_flash(session, level, text).await {
        tracing::warn!(error = %e, "Failed to store access flash message");
    }
}

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match session_user(parts).await? {
            (_, Some(user)) => Ok(Self(user)),
            (session, None) => {
                flash_rejection(&session, FlashLevel::Warning, "Você precisa estar logado.").await;
                Err(AuthRejection::RedirectToLogin)
            }
        }
    }
}

impl<S> FromRequestParts<S> for RequireAdmin
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match session_user(parts).await? {
            (_, Some(user)) if user.is_admin => Ok(Self(user)),
            (session, Some(user)) => {
                tracing::warn!(user_id = %user.id, path = %parts.uri.path(), "Admin access denied");
                flash_rejection(
                    &session,
                    FlashLevel::Danger,
                    "Acesso restrito a administradores.",
                )
                .await;
                Err(AuthRejection::RedirectToFallback)
            }
            (session, None) => {
                flash_rejection(&session, FlashLevel::Warning, "Você precisa estar logado.").await;
                Err(AuthRejection::RedirectToLogin)
            }
        }
    }
}

/// Helper to set the current user in the session.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_user(
    session: &Session,
    user: &CurrentUser,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::CURRENT_USER, user).await
}

/// Helper to clear the whole session (logout).
///
/// The cart goes with it.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn clear_current_user(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.flush().await
}
