//! Customer order handlers: checkout, history, repeat, rating and receipt.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use cupcake_core::{OrderId, RatingDecision};

use super::cart::{load_cart, save_cart};
use super::{Disposition, document};
use crate::db::OrderRepository;
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::{FlashLevel, PageContext, RequireAuth, push_flash};
use crate::models::{OrderDetail, session_keys};
use crate::services::export;
use crate::services::orders::{OrderError, place_order};
use crate::services::whatsapp;
use crate::state::AppState;

/// Rating form data. Anything but a whole number is ignored.
#[derive(Debug, Deserialize)]
pub struct RatingForm {
    pub avaliacao: Option<String>,
}

impl RatingForm {
    fn submitted(&self) -> Option<i32> {
        self.avaliacao
            .as_deref()
            .and_then(|v| v.trim().parse::<i32>().ok())
    }
}

/// Order history template.
#[derive(Template, WebTemplate)]
#[template(path = "orders/list.html")]
pub struct OrderListTemplate {
    pub page: PageContext,
    pub orders: Vec<OrderDetail>,
    /// Confirmation link of the order just placed, shown once.
    pub whatsapp_url: Option<String>,
}

/// Turn the session cart into an order.
#[instrument(skip(state, session, user), fields(user_id = %user.id))]
pub async fn checkout(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
) -> Result<Redirect> {
    let mut cart = load_cart(&session).await?;

    let placed = match place_order(state.pool(), user.id, &cart).await {
        Ok(placed) => placed,
        Err(OrderError::EmptyCart) => {
            push_flash(&session, FlashLevel::Warning, "Carrinho vazio!").await?;
            return Ok(Redirect::to("/carrinho"));
        }
        Err(OrderError::Unavailable(what)) => {
            tracing::warn!(reason = %what, "Checkout rejected");
            push_flash(
                &session,
                FlashLevel::Danger,
                "Um dos itens do carrinho não está mais disponível.",
            )
            .await?;
            return Ok(Redirect::to("/carrinho"));
        }
        Err(OrderError::Repository(e)) => return Err(e.into()),
    };

    cart.clear();
    save_cart(&session, &cart).await?;

    if let Some(number) = &state.config().whatsapp_number {
        let message = whatsapp::order_confirmation(placed.id, &placed.snapshot);
        session
            .insert(session_keys::WHATSAPP_URL, whatsapp::chat_url(number, &message))
            .await?;
    }

    push_flash(
        &session,
        FlashLevel::Success,
        "Pedido realizado com sucesso! 🧁",
    )
    .await?;
    Ok(Redirect::to("/pedido"))
}

/// Finalized orders of the current user, newest first.
#[instrument(skip(state, session, user, page), fields(user_id = %user.id))]
pub async fn list(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    page: PageContext,
) -> Result<impl IntoResponse> {
    let orders = OrderRepository::new(state.pool())
        .list_for_user(user.id)
        .await?;
    let whatsapp_url = session.remove::<String>(session_keys::WHATSAPP_URL).await?;

    Ok(OrderListTemplate {
        page,
        orders,
        whatsapp_url,
    })
}

/// Put every line of a past order back in the cart.
#[instrument(skip(state, session, user), fields(user_id = %user.id, order_id = %id))]
pub async fn repeat(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    Path(id): Path<OrderId>,
) -> Result<Redirect> {
    let detail = OrderRepository::new(state.pool())
        .detail(id)
        .await?
        .filter(|detail| detail.order.user_id == user.id);

    let Some(detail) = detail else {
        push_flash(&session, FlashLevel::Danger, "Pedido não encontrado.").await?;
        return Ok(Redirect::to("/pedido"));
    };

    let mut cart = load_cart(&session).await?;
    for line in &detail.lines {
        cart.add(line.cupcake_id, i64::from(line.quantity));
    }
    save_cart(&session, &cart).await?;

    push_flash(
        &session,
        FlashLevel::Success,
        "Itens adicionados ao carrinho novamente!",
    )
    .await?;
    Ok(Redirect::to("/carrinho"))
}

/// Rate a delivered order.
///
/// Invalid values are dropped without a message.
#[instrument(skip(state, session, user, form), fields(user_id = %user.id, order_id = %id))]
pub async fn rate(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    Path(id): Path<OrderId>,
    Form(form): Form<RatingForm>,
) -> Result<Redirect> {
    let orders = OrderRepository::new(state.pool());
    let order = orders
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("pedido {id}")))?;
    if order.user_id != user.id {
        tracing::warn!("Rating attempt on another customer's order");
        return Err(AppError::Forbidden(format!("pedido {id}")));
    }

    match RatingDecision::evaluate(order.status, order.rating, form.submitted()) {
        RatingDecision::Accept(rating) => {
            if orders.rate(id, user.id, rating).await? {
                tracing::info!(rating = rating.value(), "Order rated");
                push_flash(&session, FlashLevel::Success, "Obrigado pela avaliação! 🤗").await?;
            } else {
                push_flash(&session, FlashLevel::Warning, "Este pedido já foi avaliado.").await?;
            }
        }
        RatingDecision::NotDelivered => {
            push_flash(
                &session,
                FlashLevel::Warning,
                "O pedido ainda não pode ser avaliado.",
            )
            .await?;
        }
        RatingDecision::AlreadyRated => {
            push_flash(&session, FlashLevel::Warning, "Este pedido já foi avaliado.").await?;
        }
        RatingDecision::Ignore => {
            tracing::debug!("Ignoring invalid rating value");
        }
    }

    Ok(Redirect::to("/pedido"))
}

/// Single-order PDF. Administrators may fetch any order.
#[instrument(skip(state, session, user), fields(user_id = %user.id, order_id = %id))]
pub async fn receipt_pdf(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    Path(id): Path<OrderId>,
) -> Result<Response> {
    let detail = OrderRepository::new(state.pool())
        .detail(id)
        .await?
        .filter(|detail| user.is_admin || detail.order.user_id == user.id);

    let Some(detail) = detail else {
        push_flash(
            &session,
            FlashLevel::Danger,
            "Você não tem permissão para acessar este pedido.",
        )
        .await?;
        let back = if user.is_admin { "/admin" } else { "/pedido" };
        return Ok(Redirect::to(back).into_response());
    };

    let bytes = export::order_pdf(&detail)?;
    Ok(document(
        "application/pdf",
        Disposition::Inline,
        &format!("pedido_{id}.pdf"),
        bytes,
    ))
}
