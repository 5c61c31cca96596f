//! HTTP route handlers for the storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                              - Redirect to /vitrine
//! GET  /health                        - Health check (main.rs)
//! GET  /health/ready                  - Database ping (main.rs)
//!
//! # Catalog
//! GET  /vitrine                       - Active items
//! GET  /buscar_cupcakes?q=            - Search results fragment
//!
//! # Accounts
//! GET  /login, POST /login            - Login
//! GET  /logout                        - Logout (clears the cart)
//! GET  /cadastro, POST /cadastrar     - Registration
//! GET  /home                          - Greeting (requires auth)
//! GET  /perfil/editar, POST           - Own profile (requires auth)
//! GET  /esqueci_senha                 - WhatsApp password reset request
//! GET  /fale_conosco                  - WhatsApp support chat
//!
//! # Cart
//! GET  /carrinho                      - Cart page
//! GET  /api/carrinho                  - Cart as JSON
//! POST /adicionar_ao_carrinho/{id}    - Add units
//! POST /aumentar_quantidade/{id}      - +1
//! POST /diminuir_quantidade/{id}      - -1
//! POST /remover_do_carrinho/{id}      - Remove line (requires auth)
//!
//! # Orders (requires auth)
//! POST /finalizar_pedido              - Checkout
//! GET  /pedido                        - Order history
//! GET  /repetir_pedido/{id}           - Re-add an order to the cart
//! POST /avaliar_pedido/{id}           - Rate a delivered order
//! GET  /pedido/pdf/{id}               - Order PDF
//!
//! # Administration (requires admin)
//! GET  /admin                         - Dashboard
//! GET  /admin/export/excel|pdf        - Filtered reports
//! GET  /admin/pedido/{id}             - Order detail
//! POST /admin/pedido/{id}/delete      - Delete order
//! GET  /admin/status/{id}             - Advance status
//! POST /admin/status/{id}             - Set status
//! POST /admin/pedido/{id}/cancelar    - Cancel order
//! GET  /admin/cupcakes                - Catalog with stats
//! GET|POST /admin/cupcake/novo        - Create item
//! GET|POST /admin/cupcake/edit/{id}   - Edit item
//! POST /admin/cupcake/delete/{id}     - Delete or deactivate item
//! GET  /admin/cupcake/{id}/pedidos    - Orders containing an item
//! GET  /admin/usuarios                - Accounts
//! GET|POST /admin/usuario/edit/{id}   - Edit account
//! POST /admin/usuario/delete/{id}     - Delete account
//! ```

pub mod account;
pub mod admin;
pub mod auth;
pub mod cart;
pub mod catalog;
pub mod orders;

use axum::{
    Router,
    http::header,
    response::{IntoResponse, Response},
    routing::{get, post},
};

use crate::state::AppState;

/// How a generated document is delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Shown in the browser.
    Inline,
    /// Downloaded.
    Attachment,
}

impl Disposition {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Inline => "inline",
            Self::Attachment => "attachment",
        }
    }
}

/// Response carrying a generated file.
pub(crate) fn document(
    content_type: &'static str,
    disposition: Disposition,
    file_name: &str,
    bytes: Vec<u8>,
) -> Response {
    (
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("{}; filename=\"{file_name}\"", disposition.as_str()),
            ),
        ],
        bytes,
    )
        .into_response()
}

/// Create the account and catalog routes router.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(catalog::index))
        .route("/vitrine", get(catalog::vitrine))
        .route("/buscar_cupcakes", get(catalog::search))
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/logout", get(auth::logout))
        .route("/cadastro", get(auth::register_page))
        .route("/cadastrar", post(auth::register))
        .route("/home", get(auth::home))
        .route("/esqueci_senha", get(auth::forgot_password))
        .route("/fale_conosco", get(auth::contact))
        .route(
            "/perfil/editar",
            get(account::edit_page).post(account::update),
        )
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/carrinho", get(cart::show))
        .route("/api/carrinho", get(cart::api))
        .route("/adicionar_ao_carrinho/{id}", post(cart::add))
        .route("/aumentar_quantidade/{id}", post(cart::increase))
        .route("/diminuir_quantidade/{id}", post(cart::decrease))
        .route("/remover_do_carrinho/{id}", post(cart::remove))
}

/// Create the customer order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/finalizar_pedido", post(orders::checkout))
        .route("/pedido", get(orders::list))
        .route("/repetir_pedido/{id}", get(orders::repeat))
        .route("/avaliar_pedido/{id}", post(orders::rate))
        .route("/pedido/pdf/{id}", get(orders::receipt_pdf))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(public_routes())
        .merge(cart_routes())
        .merge(order_routes())
        .nest("/admin", admin::admin_routes())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;
    use tower_sessions::{MemoryStore, Session};

    use cupcake_core::{Email, UserId};

    use super::*;
    use crate::config::tests::test_config;
    use crate::middleware::session_layer;
    use crate::middleware::set_current_user;
    use crate::models::CurrentUser;

    /// Router wired like `main.rs`, with an in-memory session store and a
    /// pool that never connects. `/test/entrar/{admin}` logs a fixture user in.
    fn app() -> Router {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/cupcake_test")
            .unwrap();
        let state = AppState::new(test_config(), pool);

        Router::new()
            .merge(routes())
            .route(
                "/test/entrar/{admin}",
                get(|session: Session, axum::extract::Path(admin): axum::extract::Path<bool>| async move {
                    let user = CurrentUser {
                        id: UserId::new(if admin { 1 } else { 2 }),
                        name: "Ana".to_string(),
                        email: Email::parse("ana@example.com").unwrap(),
                        is_admin: admin,
                    };
                    set_current_user(&session, &user).await.unwrap();
                    "ok"
                }),
            )
            .layer(session_layer(MemoryStore::default(), false))
            .with_state(state)
    }

    fn get_request(uri: &str, cookie: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        builder.body(Body::empty()).unwrap()
    }

    fn post_request(uri: &str, cookie: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        builder.body(Body::empty()).unwrap()
    }

    fn location(response: &Response) -> &str {
        response
            .headers()
            .get(header::LOCATION)
            .unwrap()
            .to_str()
            .unwrap()
    }

    fn session_cookie(response: &Response) -> String {
        let raw = response
            .headers()
            .get(header::SET_COOKIE)
            .unwrap()
            .to_str()
            .unwrap();
        raw.split(';').next().unwrap().to_string()
    }

    async fn logged_in(app: &Router, admin: bool) -> String {
        let response = app
            .clone()
            .oneshot(get_request(&format!("/test/entrar/{admin}"), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        session_cookie(&response)
    }

    #[tokio::test]
    async fn test_root_redirects_to_vitrine() {
        let response = app().oneshot(get_request("/", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/vitrine");
    }

    #[tokio::test]
    async fn test_anonymous_is_sent_to_login() {
        for uri in ["/home", "/pedido", "/perfil/editar", "/admin", "/admin/usuarios"] {
            let response = app().oneshot(get_request(uri, None)).await.unwrap();
            assert_eq!(response.status(), StatusCode::SEE_OTHER, "{uri}");
            assert_eq!(location(&response), "/login", "{uri}");
        }

        let response = app()
            .oneshot(post_request("/finalizar_pedido", None))
            .await
            .unwrap();
        assert_eq!(location(&response), "/login");
    }

    #[tokio::test]
    async fn test_customer_is_kept_out_of_admin() {
        let app = app();
        let cookie = logged_in(&app, false).await;

        for uri in ["/admin", "/admin/export/pdf", "/admin/status/1"] {
            let response = app
                .clone()
                .oneshot(get_request(uri, Some(&cookie)))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::SEE_OTHER, "{uri}");
            assert_eq!(location(&response), "/vitrine", "{uri}");
        }
    }

    #[tokio::test]
    async fn test_home_greets_logged_in_user() {
        let app = app();
        let cookie = logged_in(&app, false).await;

        let response = app
            .oneshot(get_request("/home", Some(&cookie)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_login_page_renders() {
        let response = app().oneshot(get_request("/login", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_decrease_on_empty_cart_redirects_to_cart() {
        let response = app()
            .oneshot(post_request("/diminuir_quantidade/3", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/carrinho");
    }

    #[tokio::test]
    async fn test_remove_from_cart_requires_login() {
        let response = app()
            .oneshot(post_request("/remover_do_carrinho/3", None))
            .await
            .unwrap();
        assert_eq!(location(&response), "/login");
    }

    #[tokio::test]
    async fn test_forgot_password_opens_whatsapp() {
        let response = app()
            .oneshot(get_request("/esqueci_senha", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert!(location(&response).starts_with("https://wa.me/5511948083862?text="));
    }

    #[test]
    fn test_document_headers() {
        let response = document(
            "application/pdf",
            Disposition::Attachment,
            "relatorio_pedidos.pdf",
            b"%PDF".to_vec(),
        );
        assert_eq!(
            response.headers().get(header::CONTENT_DISPOSITION).unwrap(),
            "attachment; filename=\"relatorio_pedidos.pdf\""
        );
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/pdf"
        );
    }
}
