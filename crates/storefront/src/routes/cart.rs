//! Cart route handlers.
//!
//! The cart lives in the session as a [`Cart`] value. Every handler loads it,
//! applies one mutation and writes it straight back before redirecting.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form, Json,
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use cupcake_core::{Cart, CartLine, CupcakeId, Decrement, Price};

use crate::db::CupcakeRepository;
use crate::error::Result;
use crate::filters;
use crate::middleware::{FlashLevel, PageContext, RequireAuth, push_flash};
use crate::models::{Cupcake, session_keys};
use crate::state::AppState;

// =============================================================================
// Session Helpers
// =============================================================================

/// Load the cart from the session. A missing cart is an empty one.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn load_cart(session: &Session) -> std::result::Result<Cart, tower_sessions::session::Error> {
    Ok(session
        .get::<Cart>(session_keys::CART)
        .await?
        .unwrap_or_default())
}

/// Write the cart back to the session.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn save_cart(
    session: &Session,
    cart: &Cart,
) -> std::result::Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::CART, cart).await
}

// =============================================================================
// Forms and Views
// =============================================================================

/// Add to cart form data.
///
/// `quantidade` is free text from a number input; anything that isn't a
/// whole number counts as 1.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub quantidade: Option<String>,
}

impl AddToCartForm {
    fn requested(&self) -> i64 {
        self.quantidade
            .as_deref()
            .and_then(|q| q.trim().parse::<i64>().ok())
            .unwrap_or(1)
    }
}

/// One `/api/carrinho` entry.
#[derive(Debug, Serialize)]
pub struct CartItemJson {
    pub id: CupcakeId,
    pub nome: String,
    pub preco: f64,
    pub imagem_url: String,
    pub quantidade: u32,
}

impl From<&CartLine<Cupcake>> for CartItemJson {
    fn from(line: &CartLine<Cupcake>) -> Self {
        Self {
            id: line.item.id,
            nome: line.item.name.clone(),
            preco: line.item.price.as_f64(),
            imagem_url: line.item.image.clone(),
            quantidade: line.quantity,
        }
    }
}

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub page: PageContext,
    pub lines: Vec<CartLine<Cupcake>>,
    pub total: Price,
}

// =============================================================================
// Handlers
// =============================================================================

/// Display the cart page.
#[instrument(skip(state, session, page))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    page: PageContext,
) -> Result<impl IntoResponse> {
    let cart = load_cart(&session).await?;
    let catalog = CupcakeRepository::new(state.pool())
        .get_many(&cart.item_ids())
        .await?;
    let snapshot = cart.snapshot(&catalog);

    Ok(CartShowTemplate {
        page,
        lines: snapshot.lines,
        total: snapshot.total,
    })
}

/// Cart contents as JSON.
#[instrument(skip(state, session))]
pub async fn api(State(state): State<AppState>, session: Session) -> Result<Json<Vec<CartItemJson>>> {
    let cart = load_cart(&session).await?;
    let catalog = CupcakeRepository::new(state.pool())
        .get_many(&cart.item_ids())
        .await?;
    let snapshot = cart.snapshot(&catalog);

    Ok(Json(snapshot.lines.iter().map(CartItemJson::from).collect()))
}

/// Whether the item exists and is on sale.
async fn is_available(state: &AppState, id: CupcakeId) -> Result<bool> {
    Ok(CupcakeRepository::new(state.pool())
        .get(id)
        .await?
        .is_some_and(|cupcake| cupcake.active))
}

/// Add units of an item and go back to the storefront.
#[instrument(skip(state, session, form), fields(cupcake_id = %id))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<CupcakeId>,
    Form(form): Form<AddToCartForm>,
) -> Result<Response> {
    if !is_available(&state, id).await? {
        tracing::warn!("Add to cart for unavailable item");
        push_flash(&session, FlashLevel::Danger, "Cupcake indisponível.").await?;
        return Ok(Redirect::to("/vitrine").into_response());
    }

    let mut cart = load_cart(&session).await?;
    let added = cart.add(id, form.requested());
    save_cart(&session, &cart).await?;

    push_flash(
        &session,
        FlashLevel::Success,
        format!("{added} unidade(s) adicionada(s) ao carrinho!"),
    )
    .await?;
    Ok(Redirect::to("/vitrine").into_response())
}

/// Add one unit.
#[instrument(skip(state, session), fields(cupcake_id = %id))]
pub async fn increase(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<CupcakeId>,
) -> Result<Redirect> {
    if !is_available(&state, id).await? {
        tracing::warn!("Increase for unavailable item");
        push_flash(&session, FlashLevel::Danger, "Cupcake indisponível.").await?;
        return Ok(Redirect::to("/carrinho"));
    }

    let mut cart = load_cart(&session).await?;
    cart.increment(id);
    save_cart(&session, &cart).await?;

    push_flash(&session, FlashLevel::Info, "Quantidade aumentada.").await?;
    Ok(Redirect::to("/carrinho"))
}

/// Remove one unit, dropping the line at zero.
#[instrument(skip(session), fields(cupcake_id = %id))]
pub async fn decrease(session: Session, Path(id): Path<CupcakeId>) -> Result<Redirect> {
    let mut cart = load_cart(&session).await?;
    let (level, text) = match cart.decrement(id) {
        Decrement::Reduced(_) => (FlashLevel::Info, "Quantidade reduzida."),
        Decrement::Removed => (FlashLevel::Warning, "Item removido do carrinho."),
        Decrement::Missing => (FlashLevel::Warning, "Item não encontrado no carrinho."),
    };
    save_cart(&session, &cart).await?;

    push_flash(&session, level, text).await?;
    Ok(Redirect::to("/carrinho"))
}

/// Drop a whole line. Requires a logged-in user.
#[instrument(skip(session, _user), fields(cupcake_id = %id))]
pub async fn remove(
    session: Session,
    RequireAuth(_user): RequireAuth,
    Path(id): Path<CupcakeId>,
) -> Result<Redirect> {
    let mut cart = load_cart(&session).await?;
    if cart.remove(id) {
        save_cart(&session, &cart).await?;
        push_flash(&session, FlashLevel::Warning, "Item removido do carrinho.").await?;
    }
    Ok(Redirect::to("/carrinho"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_form_quantity() {
        let form = |q: Option<&str>| AddToCartForm {
            quantidade: q.map(str::to_string),
        };
        assert_eq!(form(None).requested(), 1);
        assert_eq!(form(Some("3")).requested(), 3);
        assert_eq!(form(Some(" 2 ")).requested(), 2);
        assert_eq!(form(Some("abc")).requested(), 1);
        assert_eq!(form(Some("-4")).requested(), -4);
    }
}
