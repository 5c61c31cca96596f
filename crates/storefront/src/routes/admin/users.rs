//! Account management for administrators.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    response::{IntoResponse, Redirect},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use cupcake_core::UserId;

use crate::db::UserRepository;
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::{FlashLevel, PageContext, RequireAdmin, push_flash, set_current_user};
use crate::models::{CurrentUser, User};
use crate::services::auth::{AccountChanges, AuthService};
use crate::state::AppState;

/// User editor form data.
#[derive(Debug, Deserialize)]
pub struct UserForm {
    pub nome: String,
    pub email: String,
    #[serde(default)]
    pub telefone: String,
    #[serde(default)]
    pub nova_senha: String,
    /// Checkbox; present only when ticked.
    pub is_admin: Option<String>,
}

/// User list template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/users.html")]
pub struct UsersTemplate {
    pub page: PageContext,
    pub users: Vec<User>,
}

/// User editor template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/user_form.html")]
pub struct UserFormTemplate {
    pub page: PageContext,
    pub user: User,
}

/// List every account.
#[instrument(skip(_admin, state, page))]
pub async fn index(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    page: PageContext,
) -> Result<impl IntoResponse> {
    let users = UserRepository::new(state.pool()).list().await?;
    Ok(UsersTemplate { page, users })
}

/// Display the editor for one account.
#[instrument(skip(_admin, state, page))]
pub async fn edit_page(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<UserId>,
    page: PageContext,
) -> Result<impl IntoResponse> {
    let user = UserRepository::new(state.pool())
        .get_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("usuário {id}")))?;

    Ok(UserFormTemplate { page, user })
}

/// Save an account, including its admin flag.
#[instrument(skip(admin, state, session, form), fields(admin_id = %admin.id))]
pub async fn update(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<UserId>,
    Form(form): Form<UserForm>,
) -> Result<Redirect> {
    let changes = AccountChanges {
        name: &form.nome,
        email: &form.email,
        phone: &form.telefone,
        new_password: &form.nova_senha,
        is_admin: Some(form.is_admin.is_some()),
    };

    match AuthService::new(state.pool()).update_account(id, &changes).await {
        Ok(user) => {
            // Editing yourself refreshes the session identity
            if user.id == admin.id {
                set_current_user(&session, &CurrentUser::from(&user)).await?;
            }
            tracing::info!(user_id = %id, is_admin = user.is_admin, "User updated");
            push_flash(&session, FlashLevel::Success, "Usuário atualizado com sucesso!").await?;
            Ok(Redirect::to("/admin/usuarios"))
        }
        Err(e) => match e.user_message() {
            Some(message) => {
                tracing::warn!(user_id = %id, error = %e, "User update rejected");
                push_flash(&session, FlashLevel::Danger, message).await?;
                Ok(Redirect::to(&format!("/admin/usuario/edit/{id}")))
            }
            None => Err(e.into()),
        },
    }
}

/// Delete an account and its orders.
#[instrument(skip(admin, state, session), fields(admin_id = %admin.id))]
pub async fn delete(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<UserId>,
) -> Result<Redirect> {
    if id == admin.id {
        push_flash(
            &session,
            FlashLevel::Warning,
            "Você não pode excluir a própria conta.",
        )
        .await?;
        return Ok(Redirect::to("/admin/usuarios"));
    }

    if !UserRepository::new(state.pool()).delete(id).await? {
        return Err(AppError::NotFound(format!("usuário {id}")));
    }

    tracing::info!(user_id = %id, "User deleted");
    push_flash(&session, FlashLevel::Success, "Usuário excluído com sucesso!").await?;
    Ok(Redirect::to("/admin/usuarios"))
}
