//! User repository for database operations.

use sqlx::PgPool;

use cupcake_core::{Email, UserId};

use super::RepositoryError;
use crate::models::User;

/// Row type for `usuarios`.
#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: i32,
    nome: String,
    email: String,
    telefone: Option<String>,
    is_admin: bool,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;
        Ok(Self {
            id: UserId::new(row.id),
            name: row.nome,
            email,
            phone: row.telefone,
            is_admin: row.is_admin,
        })
    }
}

/// Row type for password lookups.
#[derive(Debug, sqlx::FromRow)]
struct UserWithPasswordRow {
    #[sqlx(flatten)]
    user: UserRow,
    senha: String,
}

/// Fields for a new account.
#[derive(Debug, Clone)]
pub struct NewUser<'a> {
    pub name: &'a str,
    pub email: &'a Email,
    pub password_hash: &'a str,
    pub phone: Option<&'a str>,
    pub is_admin: bool,
}

/// Editable account fields.
#[derive(Debug, Clone)]
pub struct UserUpdate<'a> {
    pub name: &'a str,
    pub email: &'a Email,
    pub phone: Option<&'a str>,
    /// Replace the password hash when present.
    pub password_hash: Option<&'a str>,
    /// Change the admin flag when present.
    pub is_admin: Option<bool>,
}

/// Repository for user database operations.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a user by their ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the email in the database is invalid.
    pub async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r"
            SELECT id, nome, email, telefone, is_admin
            FROM usuarios
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(User::try_from).transpose()
    }

    /// Get a user by their email address.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r"
            SELECT id, nome, email, telefone, is_admin
            FROM usuarios
            WHERE email = $1
            ",
        )
        .bind(email.as_str())
        .fetch_optional(self.pool)
        .await?;

        row.map(User::try_from).transpose()
    }

    /// Get a user together with their password hash.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_password_hash(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        let row = sqlx::query_as::<_, UserWithPasswordRow>(
            r"
            SELECT id, nome, email, telefone, is_admin, senha
            FROM usuarios
            WHERE email = $1
            ",
        )
        .bind(email.as_str())
        .fetch_optional(self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let user = User::try_from(row.user)?;
        Ok(Some((user, row.senha)))
    }

    /// List every account, ordered by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<User>, RepositoryError> {
        let rows = sqlx::query_as::<_, UserRow>(
            r"
            SELECT id, nome, email, telefone, is_admin
            FROM usuarios
            ORDER BY nome, id
            ",
        )
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(User::try_from).collect()
    }

    /// Create a new account.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(&self, new: &NewUser<'_>) -> Result<User, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r"
            INSERT INTO usuarios (nome, email, senha, telefone, is_admin)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, nome, email, telefone, is_admin
            ",
        )
        .bind(new.name)
        .bind(new.email.as_str())
        .bind(new.password_hash)
        .bind(new.phone)
        .bind(new.is_admin)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_write(e, "email already exists"))?;

        User::try_from(row)
    }

    /// Update an account.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user doesn't exist.
    /// Returns `RepositoryError::Conflict` if the email belongs to another account.
    pub async fn update(&self, id: UserId, update: &UserUpdate<'_>) -> Result<User, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r"
            UPDATE usuarios
            SET nome = $2,
                email = $3,
                telefone = $4,
                senha = COALESCE($5, senha),
                is_admin = COALESCE($6, is_admin)
            WHERE id = $1
            RETURNING id, nome, email, telefone, is_admin
            ",
        )
        .bind(id)
        .bind(update.name)
        .bind(update.email.as_str())
        .bind(update.phone)
        .bind(update.password_hash)
        .bind(update.is_admin)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| RepositoryError::from_write(e, "email already exists"))?;

        row.map(User::try_from)
            .transpose()?
            .ok_or(RepositoryError::NotFound)
    }

    /// Set the admin flag for the account with this email.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no account uses the email.
    pub async fn set_admin(&self, email: &Email, is_admin: bool) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE usuarios
            SET is_admin = $2
            WHERE email = $1
            ",
        )
        .bind(email.as_str())
        .bind(is_admin)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    /// Whether the email is used by an account other than `except`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn email_taken(&self, email: &Email, except: UserId) -> Result<bool, RepositoryError> {
        let taken: bool = sqlx::query_scalar(
            r"
            SELECT EXISTS (SELECT 1 FROM usuarios WHERE email = $1 AND id <> $2)
            ",
        )
        .bind(email.as_str())
        .bind(except)
        .fetch_one(self.pool)
        .await?;

        Ok(taken)
    }

    /// Delete an account. Its orders are removed by the foreign key cascade.
    ///
    /// # Returns
    ///
    /// Returns `true` if the user was deleted, `false` if it didn't exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(&self, id: UserId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM usuarios WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
