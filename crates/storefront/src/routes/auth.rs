//! Authentication route handlers.
//!
//! Handles login, registration, logout and the WhatsApp help links. Every
//! form handler answers with a flash message and a redirect.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{Result, clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::middleware::{
    FlashLevel, PageContext, RequireAuth, clear_current_user, push_flash, set_current_user,
};
use crate::models::CurrentUser;
use crate::services::auth::{AuthError, AuthService, Registration};
use crate::services::whatsapp;
use crate::state::AppState;

// =============================================================================
// Form Types
// =============================================================================

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub senha: String,
}

/// Registration form data.
#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    pub nome: String,
    pub email: String,
    pub senha: String,
    #[serde(default)]
    pub telefone: String,
}

// =============================================================================
// Templates
// =============================================================================

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub page: PageContext,
}

/// Register page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/register.html")]
pub struct RegisterTemplate {
    pub page: PageContext,
}

/// Logged-in landing page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/home.html")]
pub struct HomeTemplate {
    pub page: PageContext,
    pub user: CurrentUser,
}

// =============================================================================
// Login Routes
// =============================================================================

/// Display the login page.
pub async fn login_page(page: PageContext) -> impl IntoResponse {
    LoginTemplate { page }
}

/// Handle login form submission.
#[instrument(skip(state, session, form), fields(email = %form.email))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Redirect> {
    let user = match AuthService::new(state.pool())
        .login(&form.email, &form.senha)
        .await
    {
        Ok(user) => user,
        Err(AuthError::InvalidCredentials) => {
            tracing::warn!("Login failed");
            push_flash(&session, FlashLevel::Danger, "Email ou senha inválidos").await?;
            return Ok(Redirect::to("/login"));
        }
        Err(e) => return Err(e.into()),
    };

    // Fresh session id on privilege change
    session.cycle_id().await?;
    let current = CurrentUser::from(&user);
    set_current_user(&session, &current).await?;
    set_sentry_user(&user.id, Some(user.email.as_str()));

    tracing::info!(user_id = %user.id, is_admin = user.is_admin, "User logged in");
    push_flash(&session, FlashLevel::Success, "Login realizado com sucesso!").await?;
    Ok(Redirect::to("/home"))
}

/// Log out and forget the cart.
#[instrument(skip(session))]
pub async fn logout(session: Session) -> Result<Redirect> {
    clear_current_user(&session).await?;
    clear_sentry_user();
    push_flash(&session, FlashLevel::Info, "Logout realizado com sucesso.").await?;
    Ok(Redirect::to("/vitrine"))
}

// =============================================================================
// Registration Routes
// =============================================================================

/// Display the registration page.
pub async fn register_page(page: PageContext) -> impl IntoResponse {
    RegisterTemplate { page }
}

/// Handle registration form submission.
#[instrument(skip(state, session, form), fields(email = %form.email))]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<RegisterForm>,
) -> Result<Redirect> {
    let registration = Registration {
        name: &form.nome,
        email: &form.email,
        password: &form.senha,
        phone: &form.telefone,
    };

    match AuthService::new(state.pool()).register(&registration).await {
        Ok(user) => {
            tracing::info!(user_id = %user.id, "User registered");
            push_flash(
                &session,
                FlashLevel::Success,
                "Cadastro realizado com sucesso!",
            )
            .await?;
            Ok(Redirect::to("/login"))
        }
        Err(e) => match e.user_message() {
            Some(message) => {
                tracing::warn!(error = %e, "Registration rejected");
                push_flash(&session, FlashLevel::Danger, message).await?;
                Ok(Redirect::to("/cadastro"))
            }
            None => Err(e.into()),
        },
    }
}

// =============================================================================
// Account Landing
// =============================================================================

/// Greeting page after login.
pub async fn home(RequireAuth(user): RequireAuth, page: PageContext) -> impl IntoResponse {
    HomeTemplate { page, user }
}

// =============================================================================
// WhatsApp Help
// =============================================================================

async fn whatsapp_redirect(
    state: &AppState,
    session: &Session,
    link: fn(&str) -> String,
) -> Result<Redirect> {
    if let Some(number) = &state.config().whatsapp_number {
        return Ok(Redirect::to(&link(number)));
    }
    push_flash(
        session,
        FlashLevel::Warning,
        "Atendimento por WhatsApp indisponível no momento.",
    )
    .await?;
    Ok(Redirect::to("/vitrine"))
}

/// Ask the store to reset a password.
#[instrument(skip(state, session))]
pub async fn forgot_password(State(state): State<AppState>, session: Session) -> Result<Redirect> {
    whatsapp_redirect(&state, &session, whatsapp::password_reset_url).await
}

/// Open a support chat with the store.
#[instrument(skip(state, session))]
pub async fn contact(State(state): State<AppState>, session: Session) -> Result<Redirect> {
    whatsapp_redirect(&state, &session, whatsapp::support_url).await
}
