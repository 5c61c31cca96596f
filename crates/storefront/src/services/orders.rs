//! Order placement and the administration dashboard.

use std::collections::HashSet;

use sqlx::PgPool;
use thiserror::Error;
use tracing::{info, instrument};

use cupcake_core::{Cart, CartEntry, CartSnapshot, OrderId, OrderStatus, Price, UserId};

use crate::db::{CupcakeRepository, OrderRepository, RepositoryError};
use crate::models::{Cupcake, OrderSummary, ReportFilter};

/// Orders shown per dashboard page.
pub const DASHBOARD_PAGE_SIZE: usize = 8;

/// Errors from placing an order.
#[derive(Debug, Error)]
pub enum OrderError {
    /// Nothing in the cart matches the catalog.
    #[error("cart is empty")]
    EmptyCart,

    /// A cart item vanished from the catalog while the order was written.
    #[error("catalog item unavailable: {0}")]
    Unavailable(String),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// A freshly created order and the cart contents it was built from.
#[derive(Debug)]
pub struct PlacedOrder {
    pub id: OrderId,
    pub snapshot: CartSnapshot<Cupcake>,
}

/// Create an order from the session cart.
///
/// Items that were deleted from the catalog since they were added are left
/// out. The caller clears the cart only after this returns `Ok`.
///
/// # Errors
///
/// Returns `OrderError::EmptyCart` if no cart entry matches the catalog.
/// Returns `OrderError::Unavailable` if an item is deleted mid-checkout.
#[instrument(skip(pool, cart), fields(user_id = %user_id, items = cart.len()))]
pub async fn place_order(pool: &PgPool, user_id: UserId, cart: &Cart) -> Result<PlacedOrder, OrderError> {
    if cart.is_empty() {
        return Err(OrderError::EmptyCart);
    }

    let catalog = CupcakeRepository::new(pool).get_many(&cart.item_ids()).await?;
    let snapshot = cart.snapshot(&catalog);
    if snapshot.is_empty() {
        return Err(OrderError::EmptyCart);
    }

    let entries: Vec<CartEntry> = snapshot
        .lines
        .iter()
        .map(|line| CartEntry {
            item_id: line.item.id,
            quantity: line.quantity,
        })
        .collect();

    let id = OrderRepository::new(pool)
        .create(user_id, &entries)
        .await
        .map_err(|e| match e {
            RepositoryError::Conflict(what) => OrderError::Unavailable(what),
            other => OrderError::Repository(other),
        })?;

    info!(order_id = %id, total = %snapshot.total, "Order created");

    Ok(PlacedOrder { id, snapshot })
}

/// Aggregates over every order matching the dashboard filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardMetrics {
    pub order_count: usize,
    pub customer_count: usize,
    pub revenue: Price,
    /// Order count for every status, in display order.
    pub per_status: Vec<(OrderStatus, usize)>,
}

impl DashboardMetrics {
    /// Compute the metrics of a filtered order list.
    #[must_use]
    pub fn from_orders(orders: &[OrderSummary]) -> Self {
        let customers: HashSet<UserId> = orders.iter().map(|o| o.order.user_id).collect();
        let per_status = OrderStatus::ALL
            .iter()
            .map(|status| {
                let count = orders.iter().filter(|o| o.order.status == *status).count();
                (*status, count)
            })
            .collect();

        Self {
            order_count: orders.len(),
            customer_count: customers.len(),
            revenue: orders.iter().map(|o| o.total).sum(),
            per_status,
        }
    }
}

/// One page of the dashboard.
#[derive(Debug, Clone)]
pub struct DashboardPage {
    pub orders: Vec<OrderSummary>,
    /// Current page, starting at 1.
    pub page: usize,
    /// Number of pages, at least 1.
    pub pages: usize,
    pub metrics: DashboardMetrics,
}

impl DashboardPage {
    /// Split a filtered order list into the requested page.
    ///
    /// Pages past the end come back empty, like the first page of an empty
    /// result.
    #[must_use]
    pub fn paginate(orders: Vec<OrderSummary>, page: usize) -> Self {
        let metrics = DashboardMetrics::from_orders(&orders);
        let page = page.max(1);
        let pages = orders.len().div_ceil(DASHBOARD_PAGE_SIZE).max(1);
        let orders = orders
            .into_iter()
            .skip((page - 1).saturating_mul(DASHBOARD_PAGE_SIZE))
            .take(DASHBOARD_PAGE_SIZE)
            .collect();

        Self {
            orders,
            page,
            pages,
            metrics,
        }
    }

    #[must_use]
    pub const fn has_previous(&self) -> bool {
        self.page > 1
    }

    #[must_use]
    pub const fn has_next(&self) -> bool {
        self.page < self.pages
    }
}

/// Load the dashboard for a filter and page.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if a query fails.
pub async fn dashboard(
    pool: &PgPool,
    filter: &ReportFilter,
    page: usize,
) -> Result<DashboardPage, RepositoryError> {
    let orders = OrderRepository::new(pool).search(filter).await?;
    Ok(DashboardPage::paginate(orders, page))
}
