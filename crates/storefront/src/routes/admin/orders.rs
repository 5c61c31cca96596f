//! Order detail and status management.

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

use cupcake_core::{OrderId, OrderStatus, StatusTransition};

use crate::db::OrderRepository;
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::{FlashLevel, PageContext, RequireAdmin, push_flash};
use crate::models::OrderDetail;
use crate::state::AppState;

/// Set status form data.
#[derive(Debug, Deserialize)]
pub struct StatusForm {
    #[serde(default)]
    pub status: String,
}

/// Order detail template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/order_detail.html")]
pub struct OrderDetailTemplate {
    pub page: PageContext,
    pub detail: OrderDetail,
    pub statuses: [OrderStatus; 4],
}

/// Display one order with lines and history.
#[instrument(skip(_admin, state, page))]
pub async fn show(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<OrderId>,
    page: PageContext,
) -> Result<impl IntoResponse> {
    let detail = OrderRepository::new(state.pool())
        .detail(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("pedido {id}")))?;

    Ok(OrderDetailTemplate {
        page,
        detail,
        statuses: OrderStatus::PROGRESSION,
    })
}

/// Delete an order with its lines and history.
#[instrument(skip(admin, state, session), fields(admin_id = %admin.id))]
pub async fn delete(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<OrderId>,
) -> Result<Redirect> {
    if !OrderRepository::new(state.pool()).delete(id).await? {
        return Err(AppError::NotFound(format!("pedido {id}")));
    }

    tracing::info!(order_id = %id, "Order deleted");
    push_flash(
        &session,
        FlashLevel::Success,
        format!("Pedido #{id} excluído com sucesso."),
    )
    .await?;
    Ok(Redirect::to("/admin"))
}

/// Move an order to the next status.
#[instrument(skip(admin, state, session), fields(admin_id = %admin.id))]
pub async fn advance(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<OrderId>,
) -> Result<Redirect> {
    let status = OrderRepository::new(state.pool())
        .transition(id, StatusTransition::Advance)
        .await?;

    tracing::info!(order_id = %id, status = %status, "Order status advanced");
    push_flash(
        &session,
        FlashLevel::Info,
        format!("Status do pedido #{id} avançado para: {status}"),
    )
    .await?;
    Ok(Redirect::to("/admin"))
}

/// Set an explicit status from the progression.
#[instrument(skip(admin, state, session, form), fields(admin_id = %admin.id))]
pub async fn set_status(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<OrderId>,
    Form(form): Form<StatusForm>,
) -> Result<Redirect> {
    let Ok(target) = OrderStatus::parse_target(&form.status) else {
        tracing::warn!(order_id = %id, value = %form.status, "Rejected status value");
        push_flash(&session, FlashLevel::Danger, "Status inválido.").await?;
        return Ok(Redirect::to(&format!("/admin/pedido/{id}")));
    };

    let status = OrderRepository::new(state.pool())
        .transition(id, StatusTransition::Set(target))
        .await?;

    tracing::info!(order_id = %id, status = %status, "Order status set");
    push_flash(
        &session,
        FlashLevel::Success,
        format!("Status do pedido #{id} atualizado para: {status}"),
    )
    .await?;
    Ok(Redirect::to(&format!("/admin/pedido/{id}")))
}

/// Cancel an order from any status.
#[instrument(skip(admin, state, session), fields(admin_id = %admin.id))]
pub async fn cancel(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<OrderId>,
) -> Result<Redirect> {
    OrderRepository::new(state.pool())
        .transition(id, StatusTransition::Cancel)
        .await?;

    tracing::info!(order_id = %id, "Order cancelled");
    push_flash(&session, FlashLevel::Danger, "Pedido cancelado!").await?;
    Ok(Redirect::to(&format!("/admin/pedido/{id}")))
}
