//! Order dashboard with filters, metrics and pagination.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Query, State},
    response::IntoResponse,
};
use serde::Deserialize;
use tracing::instrument;

use cupcake_core::OrderStatus;

use crate::error::Result;
use crate::filters;
use crate::middleware::{PageContext, RequireAdmin};
use crate::models::{ReportFilter, ReportQuery};
use crate::services::orders::{DashboardPage, dashboard};
use crate::state::AppState;

/// Pagination query parameter.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<usize>,
}

/// Dashboard page template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/dashboard.html")]
pub struct DashboardTemplate {
    pub page: PageContext,
    pub filter: ReportFilter,
    pub dashboard: DashboardPage,
    pub statuses: [OrderStatus; 5],
    pub previous_link: Option<String>,
    pub next_link: Option<String>,
    pub excel_link: String,
    pub pdf_link: String,
}

/// Append the filter query string to `path`, keeping links to the same
/// filtered list.
fn with_query(path: &str, query: &str, extra: Option<String>) -> String {
    let params: Vec<String> = [Some(query.to_owned()), extra]
        .into_iter()
        .flatten()
        .filter(|p| !p.is_empty())
        .collect();
    if params.is_empty() {
        path.to_owned()
    } else {
        format!("{path}?{}", params.join("&"))
    }
}

/// Display the dashboard.
#[instrument(skip(_admin, state, page))]
pub async fn index(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Query(query): Query<ReportQuery>,
    Query(paging): Query<PageQuery>,
    page: PageContext,
) -> Result<impl IntoResponse> {
    let filter = ReportFilter::from_query(&query);
    let dashboard = dashboard(state.pool(), &filter, paging.page.unwrap_or(1)).await?;
    let query = filter.query_string();

    let page_link = |n: usize| with_query("/admin", &query, Some(format!("page={n}")));
    let previous_link = dashboard
        .has_previous()
        .then(|| page_link(dashboard.page - 1));
    let next_link = dashboard.has_next().then(|| page_link(dashboard.page + 1));

    Ok(DashboardTemplate {
        page,
        previous_link,
        next_link,
        excel_link: with_query("/admin/export/excel", &query, None),
        pdf_link: with_query("/admin/export/pdf", &query, None),
        filter,
        dashboard,
        statuses: OrderStatus::ALL,
    })
}
