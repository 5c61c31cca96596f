//! Public storefront listing and search.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Query, State},
    response::{IntoResponse, Redirect},
};
use serde::Deserialize;
use tracing::instrument;

use crate::db::CupcakeRepository;
use crate::error::Result;
use crate::filters;
use crate::middleware::PageContext;
use crate::models::Cupcake;
use crate::state::AppState;

/// Search query parameters.
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
}

impl SearchQuery {
    fn term(&self) -> Option<&str> {
        self.q.as_deref().map(str::trim).filter(|q| !q.is_empty())
    }
}

/// Storefront page template.
#[derive(Template, WebTemplate)]
#[template(path = "catalog/vitrine.html")]
pub struct VitrineTemplate {
    pub page: PageContext,
    pub cupcakes: Vec<Cupcake>,
}

/// Search results fragment.
#[derive(Template, WebTemplate)]
#[template(path = "partials/cupcake_list.html")]
pub struct CupcakeListTemplate {
    pub cupcakes: Vec<Cupcake>,
}

/// `/` goes to the storefront.
pub async fn index() -> Redirect {
    Redirect::to("/vitrine")
}

/// Display every active item.
#[instrument(skip(state, page))]
pub async fn vitrine(State(state): State<AppState>, page: PageContext) -> Result<impl IntoResponse> {
    let cupcakes = CupcakeRepository::new(state.pool()).list_active(None).await?;
    Ok(VitrineTemplate { page, cupcakes })
}

/// Active items whose name contains `q`, as a list fragment.
#[instrument(skip(state))]
pub async fn search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<impl IntoResponse> {
    let cupcakes = CupcakeRepository::new(state.pool())
        .list_active(query.term())
        .await?;
    Ok(CupcakeListTemplate { cupcakes })
}
