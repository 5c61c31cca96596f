//! Administration panel handlers.
//!
//! Every handler takes [`RequireAdmin`](crate::middleware::RequireAdmin)
//! first, so visitors and customers are redirected before anything runs.

pub mod cupcakes;
pub mod dashboard;
pub mod export;
pub mod orders;
pub mod users;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};

use crate::state::AppState;

/// Largest accepted catalog image upload.
pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

/// Create the `/admin` routes router.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(dashboard::index))
        // Reports
        .route("/export/excel", get(export::excel))
        .route("/export/pdf", get(export::pdf))
        // Orders
        .route("/pedido/{id}", get(orders::show))
        .route("/pedido/{id}/delete", post(orders::delete))
        .route("/pedido/{id}/cancelar", post(orders::cancel))
        .route("/status/{id}", get(orders::advance).post(orders::set_status))
        // Catalog
        .route("/cupcakes", get(cupcakes::index))
        .route(
            "/cupcake/novo",
            get(cupcakes::new_page)
                .post(cupcakes::create)
                .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route(
            "/cupcake/edit/{id}",
            get(cupcakes::edit_page)
                .post(cupcakes::update)
                .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route("/cupcake/delete/{id}", post(cupcakes::delete))
        .route("/cupcake/{id}/pedidos", get(cupcakes::orders))
        // Users
        .route("/usuarios", get(users::index))
        .route("/usuario/edit/{id}", get(users::edit_page).post(users::update))
        .route("/usuario/delete/{id}", post(users::delete))
}
