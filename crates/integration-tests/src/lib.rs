//! Integration test helpers for the cupcake storefront.
//!
//! # Running Tests
//!
//! ```bash
//! # Prepare the database and start the server
//! cargo run -p cupcake-cli -- migrate
//! cargo run -p cupcake-storefront
//!
//! # Run the ignored end-to-end tests
//! cargo test -p cupcake-integration-tests -- --ignored
//! ```
//!
//! # Environment Variables
//!
//! - `STOREFRONT_TEST_URL` - Running server (default `http://localhost:3000`)
//! - `STOREFRONT_DATABASE_URL` - Same database the server uses, for fixtures

use reqwest::{Client, Response, redirect};
use secrecy::SecretString;
use sqlx::PgPool;

use cupcake_core::{CupcakeId, OrderId, Price, UserId};
use cupcake_storefront::db::CupcakeRepository;
use cupcake_storefront::models::CupcakeInput;
use cupcake_storefront::services::auth::{AuthService, Registration};

/// Password used for every fixture account.
pub const TEST_PASSWORD: &str = "senha-de-teste";

/// Boxed error for fixture setup.
pub type TestResult<T> = Result<T, Box<dyn std::error::Error>>;

/// Base URL of the running storefront.
#[must_use]
pub fn base_url() -> String {
    std::env::var("STOREFRONT_TEST_URL").unwrap_or_else(|_| "http://localhost:3000".to_string())
}

/// HTTP client that keeps the session cookie and does not follow redirects,
/// so tests can assert on `Location`.
///
/// # Errors
///
/// Returns an error if the client cannot be built.
pub fn client() -> reqwest::Result<Client> {
    Client::builder()
        .cookie_store(true)
        .redirect(redirect::Policy::none())
        .build()
}

/// Connect to the storefront database for fixtures.
///
/// # Errors
///
/// Returns an error if no database URL is set or the connection fails.
pub async fn pool() -> TestResult<PgPool> {
    let url = std::env::var("STOREFRONT_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)?;
    Ok(cupcake_storefront::db::create_pool(&url).await?)
}

/// Email that no other test run uses.
#[must_use]
pub fn unique_email(prefix: &str) -> String {
    format!("{prefix}-{}@example.com", uuid::Uuid::new_v4().simple())
}

/// Create an account directly in the database.
///
/// # Errors
///
/// Returns an error if the insert fails.
pub async fn create_account(pool: &PgPool, email: &str, is_admin: bool) -> TestResult<UserId> {
    let user = AuthService::new(pool)
        .create_account(
            &Registration {
                name: "Cliente Teste",
                email,
                password: TEST_PASSWORD,
                phone: "(11) 98765-4321",
            },
            is_admin,
        )
        .await?;
    Ok(user.id)
}

/// Insert an active catalog item.
///
/// # Errors
///
/// Returns an error if the insert fails.
pub async fn create_cupcake(pool: &PgPool, cents: i64) -> TestResult<CupcakeId> {
    let cupcake = CupcakeRepository::new(pool)
        .create(&CupcakeInput {
            name: format!("Teste {}", uuid::Uuid::new_v4().simple()),
            description: "Criado pelos testes de integração".to_string(),
            price: Price::from_cents(cents),
            image: None,
            active: true,
        })
        .await?;
    Ok(cupcake.id)
}

/// Most recent order for an account.
///
/// # Errors
///
/// Returns an error if the query fails.
pub async fn latest_order(pool: &PgPool, user_id: UserId) -> TestResult<Option<OrderId>> {
    let id: Option<i32> = sqlx::query_scalar("SELECT MAX(id) FROM pedidos WHERE usuario_id = $1")
        .bind(user_id.as_i32())
        .fetch_one(pool)
        .await?;
    Ok(id.map(OrderId::new))
}

/// Log in through the form and return the response.
///
/// # Errors
///
/// Returns an error if the request fails.
pub async fn login(client: &Client, email: &str, password: &str) -> reqwest::Result<Response> {
    client
        .post(format!("{}/login", base_url()))
        .form(&[("email", email), ("senha", password)])
        .send()
        .await
}

/// `Location` header of a redirect, or an empty string.
#[must_use]
pub fn location(response: &Response) -> &str {
    response
        .headers()
        .get(reqwest::header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}
