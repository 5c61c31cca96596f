//! Profile editing for the logged-in user.

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

use crate::db::UserRepository;
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::{FlashLevel, PageContext, RequireAuth, push_flash, set_current_user};
use crate::models::{CurrentUser, User};
use crate::services::auth::{AccountChanges, AuthError, AuthService};
use crate::state::AppState;

/// Profile form data.
#[derive(Debug, Deserialize)]
pub struct ProfileForm {
    pub nome: String,
    pub email: String,
    #[serde(default)]
    pub telefone: String,
    /// Blank keeps the current password.
    #[serde(default)]
    pub nova_senha: String,
}

/// Profile edit page template.
#[derive(Template, WebTemplate)]
#[template(path = "account/profile.html")]
pub struct ProfileTemplate {
    pub page: PageContext,
    pub user: User,
}

/// Display the profile form.
#[instrument(skip(state, current_user, page), fields(user_id = %current_user.id))]
pub async fn edit_page(
    State(state): State<AppState>,
    RequireAuth(current_user): RequireAuth,
    page: PageContext,
) -> Result<impl IntoResponse> {
    let user = UserRepository::new(state.pool())
        .get_by_id(current_user.id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("usuário {}", current_user.id)))?;

    Ok(ProfileTemplate { page, user })
}

/// Save the profile and refresh the session identity.
#[instrument(skip(state, session, current_user, form), fields(user_id = %current_user.id))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(current_user): RequireAuth,
    Form(form): Form<ProfileForm>,
) -> Result<Redirect> {
    let changes = AccountChanges {
        name: &form.nome,
        email: &form.email,
        phone: &form.telefone,
        new_password: &form.nova_senha,
        is_admin: None,
    };

    match AuthService::new(state.pool())
        .update_account(current_user.id, &changes)
        .await
    {
        Ok(user) => {
            set_current_user(&session, &CurrentUser::from(&user)).await?;
            tracing::info!("Profile updated");
            push_flash(&session, FlashLevel::Success, "Perfil atualizado com sucesso!").await?;
            Ok(Redirect::to("/home"))
        }
        Err(AuthError::UserAlreadyExists) => {
            push_flash(
                &session,
                FlashLevel::Danger,
                "Este e-mail já está sendo utilizado por outro usuário.",
            )
            .await?;
            Ok(Redirect::to("/perfil/editar"))
        }
        Err(e) => match e.user_message() {
            Some(message) => {
                tracing::warn!(error = %e, "Profile update rejected");
                push_flash(&session, FlashLevel::Danger, message).await?;
                Ok(Redirect::to("/perfil/editar"))
            }
            None => Err(e.into()),
        },
    }
}
