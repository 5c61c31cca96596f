//! Order repository.
//!
//! Totals are never stored. Every read that needs one joins the lines with
//! the current catalog price and sums them in Rust.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::instrument;

use cupcake_core::{
    CartEntry, CupcakeId, OrderId, OrderStatus, Price, Rating, StatusTransition, UserId,
    order_total,
};

use super::{RepositoryError, like_pattern};
use crate::models::{Order, OrderDetail, OrderLine, OrderSummary, ReportFilter, StatusLogEntry};

/// Row type for an order header joined with its owner.
#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: i32,
    usuario_id: i32,
    cliente_nome: String,
    cliente_email: String,
    finalizado: bool,
    status: String,
    data_pedido: DateTime<Utc>,
    avaliacao: Option<i32>,
}

impl TryFrom<OrderRow> for Order {
    type Error = RepositoryError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let status: OrderStatus = row.status.parse().map_err(|e| {
            RepositoryError::DataCorruption(format!("order {}: {e}", row.id))
        })?;
        let rating = row
            .avaliacao
            .map(|value| {
                Rating::new(value).ok_or_else(|| {
                    RepositoryError::DataCorruption(format!(
                        "order {} has out-of-range rating {value}",
                        row.id
                    ))
                })
            })
            .transpose()?;
        Ok(Self {
            id: OrderId::new(row.id),
            user_id: UserId::new(row.usuario_id),
            customer_name: row.cliente_nome,
            customer_email: row.cliente_email,
            finalized: row.finalizado,
            status,
            created_at: row.data_pedido,
            rating,
        })
    }
}

/// Row type for an order line priced at the current catalog price.
#[derive(Debug, sqlx::FromRow)]
struct LineRow {
    pedido_id: i32,
    cupcake_id: i32,
    nome: String,
    quantidade: i32,
    preco: Decimal,
}

impl LineRow {
    fn into_line(self) -> Result<(OrderId, OrderLine), RepositoryError> {
        let quantity = u32::try_from(self.quantidade)
            .ok()
            .filter(|q| *q > 0)
            .ok_or_else(|| {
                RepositoryError::DataCorruption(format!(
                    "order {} has non-positive quantity {}",
                    self.pedido_id, self.quantidade
                ))
            })?;
        Ok((
            OrderId::new(self.pedido_id),
            OrderLine {
                cupcake_id: CupcakeId::new(self.cupcake_id),
                cupcake_name: self.nome,
                quantity,
                unit_price: Price::new(self.preco),
            },
        ))
    }
}

/// Row type for `pedido_status_log`.
#[derive(Debug, sqlx::FromRow)]
struct StatusLogRow {
    status: String,
    data_hora: DateTime<Utc>,
}

impl TryFrom<StatusLogRow> for StatusLogEntry {
    type Error = RepositoryError;

    fn try_from(row: StatusLogRow) -> Result<Self, Self::Error> {
        let status = row
            .status
            .parse()
            .map_err(|e| RepositoryError::DataCorruption(format!("status log: {e}")))?;
        Ok(Self {
            status,
            at: row.data_hora,
        })
    }
}

const ORDER_SELECT: &str = r"
    SELECT p.id, p.usuario_id, u.nome AS cliente_nome, u.email AS cliente_email,
           p.finalizado, p.status, p.data_pedido, p.avaliacao
    FROM pedidos p
    JOIN usuarios u ON u.id = p.usuario_id
";

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Create a finalized order in `Recebido` with one line per cart entry.
    ///
    /// The order, its lines and the first status log entry commit together.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if a cart entry references a
    /// catalog item that no longer exists.
    #[instrument(skip(self, entries), fields(user_id = %user_id))]
    pub async fn create(
        &self,
        user_id: UserId,
        entries: &[CartEntry],
    ) -> Result<OrderId, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        let status = OrderStatus::Recebido;

        let order_id: OrderId = sqlx::query_scalar(
            r"
            INSERT INTO pedidos (usuario_id, finalizado, status, data_pedido)
            VALUES ($1, TRUE, $2, NOW())
            RETURNING id
            ",
        )
        .bind(user_id)
        .bind(status)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| RepositoryError::from_write(e, "customer no longer exists"))?;

        for entry in entries {
            let quantity = i32::try_from(entry.quantity).map_err(|_| {
                RepositoryError::Conflict(format!("quantity {} is too large", entry.quantity))
            })?;
            sqlx::query(
                r"
                INSERT INTO pedido_cupcake (pedido_id, cupcake_id, quantidade)
                VALUES ($1, $2, $3)
                ",
            )
            .bind(order_id)
            .bind(entry.item_id)
            .bind(quantity)
            .execute(&mut *tx)
            .await
            .map_err(|e| RepositoryError::from_write(e, "catalog item no longer exists"))?;
        }

        append_log(&mut tx, order_id, status).await?;
        tx.commit().await?;

        Ok(order_id)
    }

    /// Get an order header.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!("{ORDER_SELECT} WHERE p.id = $1"))
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        row.map(Order::try_from).transpose()
    }

    /// Get an order with lines, total and status history.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn detail(&self, id: OrderId) -> Result<Option<OrderDetail>, RepositoryError> {
        let Some(order) = self.get(id).await? else {
            return Ok(None);
        };
        let lines = self.lines_for(&[id]).await?.remove(&id).unwrap_or_default();
        let history = self.history(id).await?;
        Ok(Some(OrderDetail::new(order, lines, history)))
    }

    /// Finalized orders of one customer, newest first, with their lines.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<OrderDetail>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "{ORDER_SELECT} WHERE p.usuario_id = $1 AND p.finalizado = TRUE ORDER BY p.data_pedido DESC, p.id DESC"
        ))
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        let orders = rows
            .into_iter()
            .map(Order::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        let ids: Vec<OrderId> = orders.iter().map(|o| o.id).collect();
        let mut lines = self.lines_for(&ids).await?;

        Ok(orders
            .into_iter()
            .map(|order| {
                let order_lines = lines.remove(&order.id).unwrap_or_default();
                OrderDetail::new(order, order_lines, Vec::new())
            })
            .collect())
    }

    /// Finalized orders matching the report filter, newest first, with totals.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    #[instrument(skip(self))]
    pub async fn search(&self, filter: &ReportFilter) -> Result<Vec<OrderSummary>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            r"
            {ORDER_SELECT}
            WHERE p.finalizado = TRUE
              AND ($1::text IS NULL OR p.status = $1)
              AND ($2::text IS NULL OR u.nome ILIKE $2)
              AND ($3::timestamptz IS NULL OR p.data_pedido >= $3)
              AND ($4::timestamptz IS NULL OR p.data_pedido < $4)
            ORDER BY p.data_pedido DESC, p.id DESC
            "
        ))
        .bind(filter.status.as_deref())
        .bind(filter.customer.as_deref().map(like_pattern))
        .bind(filter.created_from())
        .bind(filter.created_before())
        .fetch_all(self.pool)
        .await?;

        self.summarize(rows).await
    }

    /// Orders that contain a catalog item, newest first, with totals.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn containing(&self, cupcake_id: CupcakeId) -> Result<Vec<OrderSummary>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            r"
            {ORDER_SELECT}
            WHERE EXISTS (
                SELECT 1 FROM pedido_cupcake pc
                WHERE pc.pedido_id = p.id AND pc.cupcake_id = $1
            )
            ORDER BY p.data_pedido DESC, p.id DESC
            "
        ))
        .bind(cupcake_id)
        .fetch_all(self.pool)
        .await?;

        self.summarize(rows).await
    }

    async fn summarize(&self, rows: Vec<OrderRow>) -> Result<Vec<OrderSummary>, RepositoryError> {
        let orders = rows
            .into_iter()
            .map(Order::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        let ids: Vec<OrderId> = orders.iter().map(|o| o.id).collect();
        let lines = self.lines_for(&ids).await?;

        Ok(orders
            .into_iter()
            .map(|order| {
                let total = lines
                    .get(&order.id)
                    .map_or(Price::ZERO, |l| order_total(l.iter().map(OrderLine::amount)));
                OrderSummary { order, total }
            })
            .collect())
    }

    /// Lines of several orders, keyed by order, in insertion order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn lines_for(
        &self,
        ids: &[OrderId],
    ) -> Result<HashMap<OrderId, Vec<OrderLine>>, RepositoryError> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = sqlx::query_as::<_, LineRow>(
            r"
            SELECT pc.pedido_id, pc.cupcake_id, c.nome, pc.quantidade, c.preco
            FROM pedido_cupcake pc
            JOIN cupcakes c ON c.id = pc.cupcake_id
            WHERE pc.pedido_id = ANY($1)
            ORDER BY pc.pedido_id, pc.id
            ",
        )
        .bind(ids)
        .fetch_all(self.pool)
        .await?;

        let mut grouped: HashMap<OrderId, Vec<OrderLine>> = HashMap::new();
        for row in rows {
            let (order_id, line) = row.into_line()?;
            grouped.entry(order_id).or_default().push(line);
        }
        Ok(grouped)
    }

    /// Status history of an order, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn history(&self, id: OrderId) -> Result<Vec<StatusLogEntry>, RepositoryError> {
        let rows = sqlx::query_as::<_, StatusLogRow>(
            r"
            SELECT status, data_hora
            FROM pedido_status_log
            WHERE pedido_id = $1
            ORDER BY data_hora, id
            ",
        )
        .bind(id)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(StatusLogEntry::try_from).collect()
    }

    /// Apply a status transition and append it to the history.
    ///
    /// The order row is locked for the duration of the transaction, so two
    /// concurrent advances never read the same starting status.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order doesn't exist.
    #[instrument(skip(self), fields(order_id = %id))]
    pub async fn transition(
        &self,
        id: OrderId,
        transition: StatusTransition,
    ) -> Result<OrderStatus, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let current: Option<String> =
            sqlx::query_scalar("SELECT status FROM pedidos WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        let current: OrderStatus = current
            .ok_or(RepositoryError::NotFound)?
            .parse()
            .map_err(|e| RepositoryError::DataCorruption(format!("order {id}: {e}")))?;

        let next = transition.apply(current);

        sqlx::query("UPDATE pedidos SET status = $2 WHERE id = $1")
            .bind(id)
            .bind(next)
            .execute(&mut *tx)
            .await?;
        append_log(&mut tx, id, next).await?;
        tx.commit().await?;

        Ok(next)
    }

    /// Store a rating when the order belongs to `user_id`, is delivered and
    /// was never rated.
    ///
    /// # Returns
    ///
    /// Returns `true` if the rating was stored.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn rate(
        &self,
        id: OrderId,
        user_id: UserId,
        rating: Rating,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE pedidos
            SET avaliacao = $3
            WHERE id = $1
              AND usuario_id = $2
              AND status = $4
              AND avaliacao IS NULL
            ",
        )
        .bind(id)
        .bind(user_id)
        .bind(i32::from(rating))
        .bind(OrderStatus::Entregue)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete an order. Lines and history go with it.
    ///
    /// # Returns
    ///
    /// Returns `true` if the order was deleted, `false` if it didn't exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(&self, id: OrderId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM pedidos WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

async fn append_log(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    id: OrderId,
    status: OrderStatus,
) -> Result<(), RepositoryError> {
    sqlx::query(
        r"
        INSERT INTO pedido_status_log (pedido_id, status, data_hora)
        VALUES ($1, $2, NOW())
        ",
    )
    .bind(id)
    .bind(status)
    .execute(&mut **tx)
    .await?;
    Ok(())
}
