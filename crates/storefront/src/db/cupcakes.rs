//! Catalog repository.

use std::collections::{HashMap, HashSet};

use rust_decimal::Decimal;
use sqlx::PgPool;

use cupcake_core::{CupcakeId, Price};

use super::{RepositoryError, like_pattern};
use crate::models::{Cupcake, CupcakeInput, CupcakeListing};

/// Row type for `cupcakes`.
#[derive(Debug, sqlx::FromRow)]
struct CupcakeRow {
    id: i32,
    nome: String,
    descricao: String,
    preco: Decimal,
    imagem_url: String,
    ativo: bool,
}

impl TryFrom<CupcakeRow> for Cupcake {
    type Error = RepositoryError;

    fn try_from(row: CupcakeRow) -> Result<Self, Self::Error> {
        if row.preco <= Decimal::ZERO {
            return Err(RepositoryError::DataCorruption(format!(
                "cupcake {} has non-positive price {}",
                row.id, row.preco
            )));
        }
        Ok(Self {
            id: CupcakeId::new(row.id),
            name: row.nome,
            description: row.descricao,
            price: Price::new(row.preco),
            image: row.imagem_url,
            active: row.ativo,
        })
    }
}

/// What [`CupcakeRepository::delete_or_deactivate`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// The item was never sold and is gone.
    Deleted,
    /// The item is referenced by orders and was hidden instead.
    Deactivated,
}

const COLUMNS: &str = "id, nome, descricao, preco, imagem_url, ativo";

/// Repository for catalog database operations.
pub struct CupcakeRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CupcakeRepository<'a> {
    /// Create a new catalog repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Active items, optionally filtered by a case-insensitive name substring.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_active(&self, search: Option<&str>) -> Result<Vec<Cupcake>, RepositoryError> {
        let pattern = search
            .map(str::trim)
            .filter(|term| !term.is_empty())
            .map(like_pattern);

        let rows = sqlx::query_as::<_, CupcakeRow>(&format!(
            r"
            SELECT {COLUMNS}
            FROM cupcakes
            WHERE ativo = TRUE
              AND ($1::text IS NULL OR nome ILIKE $1)
            ORDER BY id
            "
        ))
        .bind(pattern)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(Cupcake::try_from).collect()
    }

    /// Every item, active or not.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_all(&self) -> Result<Vec<Cupcake>, RepositoryError> {
        let rows = sqlx::query_as::<_, CupcakeRow>(&format!(
            "SELECT {COLUMNS} FROM cupcakes ORDER BY id"
        ))
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(Cupcake::try_from).collect()
    }

    /// Items with the given IDs, active or not. Missing IDs are skipped.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_many(&self, ids: &[CupcakeId]) -> Result<Vec<Cupcake>, RepositoryError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query_as::<_, CupcakeRow>(&format!(
            "SELECT {COLUMNS} FROM cupcakes WHERE id = ANY($1) ORDER BY id"
        ))
        .bind(ids)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(Cupcake::try_from).collect()
    }

    /// Get one item.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: CupcakeId) -> Result<Option<Cupcake>, RepositoryError> {
        let row = sqlx::query_as::<_, CupcakeRow>(&format!(
            "SELECT {COLUMNS} FROM cupcakes WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(Cupcake::try_from).transpose()
    }

    /// Every item with its average rating and whether it was ever sold.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list_with_stats(&self) -> Result<Vec<CupcakeListing>, RepositoryError> {
        let cupcakes = self.list_all().await?;

        let averages: HashMap<CupcakeId, f64> = sqlx::query_as::<_, (CupcakeId, f64)>(
            r"
            SELECT pc.cupcake_id, AVG(p.avaliacao)::float8
            FROM pedido_cupcake pc
            JOIN pedidos p ON p.id = pc.pedido_id
            WHERE p.avaliacao IS NOT NULL
            GROUP BY pc.cupcake_id
            ",
        )
        .fetch_all(self.pool)
        .await?
        .into_iter()
        .collect();

        let sold: HashSet<CupcakeId> =
            sqlx::query_scalar::<_, CupcakeId>("SELECT DISTINCT cupcake_id FROM pedido_cupcake")
                .fetch_all(self.pool)
                .await?
                .into_iter()
                .collect();

        Ok(cupcakes
            .into_iter()
            .map(|cupcake| CupcakeListing {
                average_rating: averages.get(&cupcake.id).copied(),
                sold: sold.contains(&cupcake.id),
                cupcake,
            })
            .collect())
    }

    /// Add an item to the catalog. New items are always active.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, input: &CupcakeInput) -> Result<Cupcake, RepositoryError> {
        let row = sqlx::query_as::<_, CupcakeRow>(&format!(
            r"
            INSERT INTO cupcakes (nome, descricao, preco, imagem_url, ativo)
            VALUES ($1, $2, $3, $4, TRUE)
            RETURNING {COLUMNS}
            "
        ))
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.price)
        .bind(input.image.as_deref().unwrap_or_default())
        .fetch_one(self.pool)
        .await?;

        Cupcake::try_from(row)
    }

    /// Edit an item. The image is only replaced when a new one was uploaded.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the item doesn't exist.
    pub async fn update(&self, id: CupcakeId, input: &CupcakeInput) -> Result<Cupcake, RepositoryError> {
        let row = sqlx::query_as::<_, CupcakeRow>(&format!(
            r"
            UPDATE cupcakes
            SET nome = $2,
                descricao = $3,
                preco = $4,
                imagem_url = COALESCE($5, imagem_url),
                ativo = $6
            WHERE id = $1
            RETURNING {COLUMNS}
            "
        ))
        .bind(id)
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.price)
        .bind(input.image.as_deref())
        .bind(input.active)
        .fetch_optional(self.pool)
        .await?;

        row.map(Cupcake::try_from)
            .transpose()?
            .ok_or(RepositoryError::NotFound)
    }

    /// Delete an item, or deactivate it when order lines reference it.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the item doesn't exist.
    pub async fn delete_or_deactivate(&self, id: CupcakeId) -> Result<DeleteOutcome, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let exists: Option<i32> =
            sqlx::query_scalar("SELECT id FROM cupcakes WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        if exists.is_none() {
            return Err(RepositoryError::NotFound);
        }

        let referenced: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM pedido_cupcake WHERE cupcake_id = $1)",
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        let outcome = if referenced {
            sqlx::query("UPDATE cupcakes SET ativo = FALSE WHERE id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await?;
            DeleteOutcome::Deactivated
        } else {
            sqlx::query("DELETE FROM cupcakes WHERE id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await?;
            DeleteOutcome::Deleted
        };

        tx.commit().await?;
        Ok(outcome)
    }
}
