//! Filtered order report downloads.

use axum::{
    extract::{Query, State},
    response::Response,
};
use tracing::instrument;

use crate::db::OrderRepository;
use crate::error::Result;
use crate::middleware::RequireAdmin;
use crate::models::{ReportFilter, ReportQuery};
use crate::routes::{Disposition, document};
use crate::services::export;
use crate::state::AppState;

/// Spreadsheet of every order matching the dashboard filter.
#[instrument(skip(_admin, state))]
pub async fn excel(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Query(query): Query<ReportQuery>,
) -> Result<Response> {
    let filter = ReportFilter::from_query(&query);
    let orders = OrderRepository::new(state.pool()).search(&filter).await?;
    let bytes = export::orders_xlsx(&orders)?;

    Ok(document(
        export::XLSX_CONTENT_TYPE,
        Disposition::Attachment,
        "pedidos.xlsx",
        bytes,
    ))
}

/// PDF report of every order matching the dashboard filter.
#[instrument(skip(_admin, state))]
pub async fn pdf(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Query(query): Query<ReportQuery>,
) -> Result<Response> {
    let filter = ReportFilter::from_query(&query);
    let orders = OrderRepository::new(state.pool()).search(&filter).await?;
    let bytes = export::orders_pdf(&orders)?;

    Ok(document(
        "application/pdf",
        Disposition::Attachment,
        "relatorio_pedidos.pdf",
        bytes,
    ))
}
