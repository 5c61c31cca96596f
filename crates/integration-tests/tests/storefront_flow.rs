//! End-to-end tests for the customer journey.
//!
//! These tests require:
//! - A migrated `PostgreSQL` database (cargo run -p cupcake-cli -- migrate)
//! - The storefront running (cargo run -p cupcake-storefront)
//!
//! Run with: cargo test -p cupcake-integration-tests -- --ignored

use reqwest::StatusCode;
use serde_json::Value;

use cupcake_integration_tests::{
    TEST_PASSWORD, base_url, client, create_account, create_cupcake, latest_order, location,
    login, pool, unique_email,
};
use cupcake_storefront::db::OrderRepository;

// ============================================================================
// Health & Catalog
// ============================================================================

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_health_endpoints() {
    let client = client().expect("Failed to create HTTP client");

    let resp = client
        .get(format!("{}/health", base_url()))
        .send()
        .await
        .expect("Failed to call /health");
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = client
        .get(format!("{}/health/ready", base_url()))
        .send()
        .await
        .expect("Failed to call /health/ready");
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_vitrine_and_search_fragment() {
    let client = client().expect("Failed to create HTTP client");

    let resp = client
        .get(format!("{}/vitrine", base_url()))
        .send()
        .await
        .expect("Failed to get vitrine");
    assert_eq!(resp.status(), StatusCode::OK);

    // Wildcards in the term are matched literally
    let resp = client
        .get(format!("{}/buscar_cupcakes?q=%25%25", base_url()))
        .send()
        .await
        .expect("Failed to search");
    assert_eq!(resp.status(), StatusCode::OK);
    let body = resp.text().await.expect("Failed to read response");
    assert!(!body.contains("<html"));
}

// ============================================================================
// Accounts
// ============================================================================

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_register_then_login() {
    let client = client().expect("Failed to create HTTP client");
    let email = unique_email("cadastro");

    let resp = client
        .post(format!("{}/cadastrar", base_url()))
        .form(&[
            ("nome", "Maria"),
            ("email", email.as_str()),
            ("senha", TEST_PASSWORD),
            ("telefone", "(11) 91234-5678"),
        ])
        .send()
        .await
        .expect("Failed to register");
    assert_eq!(location(&resp), "/login");

    // Same email again is rejected
    let resp = client
        .post(format!("{}/cadastrar", base_url()))
        .form(&[
            ("nome", "Maria"),
            ("email", email.as_str()),
            ("senha", TEST_PASSWORD),
            ("telefone", "(11) 91234-5678"),
        ])
        .send()
        .await
        .expect("Failed to register");
    assert_eq!(location(&resp), "/cadastro");

    let resp = login(&client, &email, "senha-errada")
        .await
        .expect("Failed to log in");
    assert_eq!(location(&resp), "/login");

    let resp = login(&client, &email, TEST_PASSWORD)
        .await
        .expect("Failed to log in");
    assert_eq!(location(&resp), "/home");

    let resp = client
        .get(format!("{}/home", base_url()))
        .send()
        .await
        .expect("Failed to get home");
    assert_eq!(resp.status(), StatusCode::OK);
    let body = resp.text().await.expect("Failed to read response");
    assert!(body.contains("Maria"));
}

// ============================================================================
// Cart & Orders
// ============================================================================

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_cart_checkout_and_rating() {
    let pool = pool().await.expect("Failed to connect to database");
    let email = unique_email("pedido");
    let user_id = create_account(&pool, &email, false)
        .await
        .expect("Failed to create account");
    let cupcake_id = create_cupcake(&pool, 850)
        .await
        .expect("Failed to create cupcake");

    let client = client().expect("Failed to create HTTP client");

    // Anonymous visitors can fill the cart
    let resp = client
        .post(format!("{}/adicionar_ao_carrinho/{cupcake_id}", base_url()))
        .form(&[("quantidade", "2")])
        .send()
        .await
        .expect("Failed to add to cart");
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);

    let resp = client
        .post(format!("{}/aumentar_quantidade/{cupcake_id}", base_url()))
        .send()
        .await
        .expect("Failed to increase quantity");
    assert_eq!(location(&resp), "/carrinho");

    let items: Vec<Value> = client
        .get(format!("{}/api/carrinho", base_url()))
        .send()
        .await
        .expect("Failed to get cart")
        .json()
        .await
        .expect("Cart is not JSON");
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["quantidade"], 3);
    assert_eq!(items[0]["preco"], 8.5);

    // Checkout needs a login
    let resp = client
        .post(format!("{}/finalizar_pedido", base_url()))
        .send()
        .await
        .expect("Failed to check out");
    assert_eq!(location(&resp), "/login");

    login(&client, &email, TEST_PASSWORD)
        .await
        .expect("Failed to log in");

    let resp = client
        .post(format!("{}/finalizar_pedido", base_url()))
        .send()
        .await
        .expect("Failed to check out");
    assert_eq!(location(&resp), "/pedido");

    let order_id = latest_order(&pool, user_id)
        .await
        .expect("Failed to query orders")
        .expect("Order was not created");
    let detail = OrderRepository::new(&pool)
        .detail(order_id)
        .await
        .expect("Failed to load order")
        .expect("Order missing");
    assert_eq!(detail.total.plain(), "25.50");

    // The cart is emptied by checkout
    let items: Vec<Value> = client
        .get(format!("{}/api/carrinho", base_url()))
        .send()
        .await
        .expect("Failed to get cart")
        .json()
        .await
        .expect("Cart is not JSON");
    assert!(items.is_empty());

    let resp = client
        .get(format!("{}/pedido", base_url()))
        .send()
        .await
        .expect("Failed to list orders");
    assert_eq!(resp.status(), StatusCode::OK);

    // Not delivered yet, so the rating is ignored
    client
        .post(format!("{}/avaliar_pedido/{order_id}", base_url()))
        .form(&[("avaliacao", "5")])
        .send()
        .await
        .expect("Failed to rate");
    let order = OrderRepository::new(&pool)
        .get(order_id)
        .await
        .expect("Failed to load order")
        .expect("Order missing");
    assert!(order.rating.is_none());

    let resp = client
        .get(format!("{}/pedido/pdf/{order_id}", base_url()))
        .send()
        .await
        .expect("Failed to get receipt");
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers()
            .get(reqwest::header::CONTENT_TYPE)
            .expect("Missing content type"),
        "application/pdf"
    );
}

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_empty_cart_checkout_is_rejected() {
    let pool = pool().await.expect("Failed to connect to database");
    let email = unique_email("vazio");
    create_account(&pool, &email, false)
        .await
        .expect("Failed to create account");

    let client = client().expect("Failed to create HTTP client");
    login(&client, &email, TEST_PASSWORD)
        .await
        .expect("Failed to log in");

    let resp = client
        .post(format!("{}/finalizar_pedido", base_url()))
        .send()
        .await
        .expect("Failed to check out");
    assert_eq!(location(&resp), "/carrinho");
}

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_increase_ignores_unknown_items() {
    let client = client().expect("Failed to create HTTP client");

    let resp = client
        .post(format!("{}/aumentar_quantidade/2147483000", base_url()))
        .send()
        .await
        .expect("Failed to increase quantity");
    assert_eq!(location(&resp), "/carrinho");

    let items: Vec<Value> = client
        .get(format!("{}/api/carrinho", base_url()))
        .send()
        .await
        .expect("Failed to get cart")
        .json()
        .await
        .expect("Cart is not JSON");
    assert!(items.is_empty());

    // The header badge counts nothing either
    let body = client
        .get(format!("{}/carrinho", base_url()))
        .send()
        .await
        .expect("Failed to get cart page")
        .text()
        .await
        .expect("Failed to read response");
    assert!(!body.contains("badge badge-primary"));
}
