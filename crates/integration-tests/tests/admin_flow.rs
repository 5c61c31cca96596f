//! End-to-end tests for the administration panel.
//!
//! These tests require:
//! - A migrated `PostgreSQL` database (cargo run -p cupcake-cli -- migrate)
//! - The storefront running (cargo run -p cupcake-storefront)
//!
//! Run with: cargo test -p cupcake-integration-tests -- --ignored

use reqwest::{Client, StatusCode};

use cupcake_core::{OrderId, OrderStatus};
use cupcake_integration_tests::{
    TEST_PASSWORD, base_url, client, create_account, create_cupcake, latest_order, location,
    login, pool, unique_email,
};
use cupcake_storefront::db::OrderRepository;
use cupcake_storefront::models::{ReportFilter, ReportQuery, StatusLogEntry};

/// Log in a fresh administrator.
async fn admin_client() -> Client {
    let pool = pool().await.expect("Failed to connect to database");
    let email = unique_email("admin");
    create_account(&pool, &email, true)
        .await
        .expect("Failed to create admin");

    let client = client().expect("Failed to create HTTP client");
    let resp = login(&client, &email, TEST_PASSWORD)
        .await
        .expect("Failed to log in");
    assert_eq!(location(&resp), "/home");
    client
}

/// Place an order for a fresh customer and return its ID.
async fn placed_order() -> OrderId {
    let pool = pool().await.expect("Failed to connect to database");
    let email = unique_email("cliente");
    let user_id = create_account(&pool, &email, false)
        .await
        .expect("Failed to create account");
    let cupcake_id = create_cupcake(&pool, 700)
        .await
        .expect("Failed to create cupcake");

    let client = client().expect("Failed to create HTTP client");
    login(&client, &email, TEST_PASSWORD)
        .await
        .expect("Failed to log in");
    client
        .post(format!("{}/adicionar_ao_carrinho/{cupcake_id}", base_url()))
        .form(&[("quantidade", "1")])
        .send()
        .await
        .expect("Failed to add to cart");
    client
        .post(format!("{}/finalizar_pedido", base_url()))
        .send()
        .await
        .expect("Failed to check out");

    latest_order(&pool, user_id)
        .await
        .expect("Failed to query orders")
        .expect("Order was not created")
}

async fn status_of(id: OrderId) -> OrderStatus {
    let pool = pool().await.expect("Failed to connect to database");
    OrderRepository::new(&pool)
        .get(id)
        .await
        .expect("Failed to load order")
        .expect("Order missing")
        .status
}

async fn history_of(id: OrderId) -> Vec<StatusLogEntry> {
    let pool = pool().await.expect("Failed to connect to database");
    OrderRepository::new(&pool)
        .history(id)
        .await
        .expect("Failed to load history")
}

/// Assert the log grew by exactly one entry ending in `expected`.
async fn assert_logged_once(id: OrderId, before: usize, expected: OrderStatus) -> usize {
    let history = history_of(id).await;
    assert_eq!(history.len(), before + 1);
    assert_eq!(history.last().map(|e| e.status), Some(expected));
    history.len()
}

// ============================================================================
// Access
// ============================================================================

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_customer_cannot_open_admin() {
    let pool = pool().await.expect("Failed to connect to database");
    let email = unique_email("curioso");
    create_account(&pool, &email, false)
        .await
        .expect("Failed to create account");

    let client = client().expect("Failed to create HTTP client");
    login(&client, &email, TEST_PASSWORD)
        .await
        .expect("Failed to log in");

    let resp = client
        .get(format!("{}/admin", base_url()))
        .send()
        .await
        .expect("Failed to get dashboard");
    assert_eq!(location(&resp), "/vitrine");
}

// ============================================================================
// Dashboard & Reports
// ============================================================================

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_dashboard_filters_and_exports() {
    let client = admin_client().await;

    let resp = client
        .get(format!("{}/admin?status=Recebido&page=1", base_url()))
        .send()
        .await
        .expect("Failed to get dashboard");
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = client
        .get(format!("{}/admin/export/excel", base_url()))
        .send()
        .await
        .expect("Failed to export spreadsheet");
    assert_eq!(resp.status(), StatusCode::OK);
    let disposition = resp
        .headers()
        .get(reqwest::header::CONTENT_DISPOSITION)
        .expect("Missing disposition")
        .to_str()
        .expect("Invalid header");
    assert!(disposition.contains("pedidos.xlsx"));

    let resp = client
        .get(format!("{}/admin/export/pdf", base_url()))
        .send()
        .await
        .expect("Failed to export PDF");
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = resp.bytes().await.expect("Failed to read PDF");
    assert!(bytes.starts_with(b"%PDF"));
}

// ============================================================================
// Order Status
// ============================================================================

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_status_progression_and_cancel() {
    let order_id = placed_order().await;
    let client = admin_client().await;
    assert_eq!(status_of(order_id).await, OrderStatus::Recebido);

    let history = history_of(order_id).await;
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].status, OrderStatus::Recebido);
    let logged = history.len();

    let resp = client
        .get(format!("{}/admin/status/{order_id}", base_url()))
        .send()
        .await
        .expect("Failed to advance status");
    assert_eq!(location(&resp), "/admin");
    assert_eq!(status_of(order_id).await, OrderStatus::EmProducao);
    let logged = assert_logged_once(order_id, logged, OrderStatus::EmProducao).await;

    let resp = client
        .post(format!("{}/admin/status/{order_id}", base_url()))
        .form(&[("status", "Entregue")])
        .send()
        .await
        .expect("Failed to set status");
    assert_eq!(location(&resp), format!("/admin/pedido/{order_id}"));
    assert_eq!(status_of(order_id).await, OrderStatus::Entregue);
    let logged = assert_logged_once(order_id, logged, OrderStatus::Entregue).await;

    // Unknown values leave the order and its history untouched
    client
        .post(format!("{}/admin/status/{order_id}", base_url()))
        .form(&[("status", "Perdido")])
        .send()
        .await
        .expect("Failed to set status");
    assert_eq!(status_of(order_id).await, OrderStatus::Entregue);
    assert_eq!(history_of(order_id).await.len(), logged);

    client
        .post(format!("{}/admin/pedido/{order_id}/cancelar", base_url()))
        .send()
        .await
        .expect("Failed to cancel");
    assert_eq!(status_of(order_id).await, OrderStatus::Cancelado);
    assert_logged_once(order_id, logged, OrderStatus::Cancelado).await;

    let resp = client
        .get(format!("{}/admin/pedido/{order_id}", base_url()))
        .send()
        .await
        .expect("Failed to get order detail");
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_status_filter_matches_detail_totals() {
    let ready = placed_order().await;
    let received = placed_order().await;
    let client = admin_client().await;

    client
        .post(format!("{}/admin/status/{ready}", base_url()))
        .form(&[("status", "Pronto")])
        .send()
        .await
        .expect("Failed to set status");
    assert_eq!(status_of(ready).await, OrderStatus::Pronto);
    assert_eq!(status_of(received).await, OrderStatus::Recebido);

    // Same parsing the export routes apply to their query string
    let filter = ReportFilter::from_query(&ReportQuery {
        status: Some("Pronto".to_string()),
        cliente: None,
        data_inicio: None,
        data_fim: None,
    });

    let pool = pool().await.expect("Failed to connect to database");
    let orders = OrderRepository::new(&pool);
    let rows = orders.search(&filter).await.expect("Failed to search orders");

    assert!(rows.iter().any(|row| row.order.id == ready));
    assert!(rows.iter().all(|row| row.order.id != received));
    for row in &rows {
        assert_eq!(row.order.status, OrderStatus::Pronto);
        let detail = orders
            .detail(row.order.id)
            .await
            .expect("Failed to load order")
            .expect("Order missing");
        assert_eq!(row.total, detail.total);
    }

    let resp = client
        .get(format!("{}/admin/export/excel?status=Pronto", base_url()))
        .send()
        .await
        .expect("Failed to export spreadsheet");
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_delete_order() {
    let order_id = placed_order().await;
    let client = admin_client().await;

    let resp = client
        .post(format!("{}/admin/pedido/{order_id}/delete", base_url()))
        .send()
        .await
        .expect("Failed to delete order");
    assert_eq!(location(&resp), "/admin");

    let resp = client
        .get(format!("{}/admin/pedido/{order_id}", base_url()))
        .send()
        .await
        .expect("Failed to get order detail");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
