//! Administrator account commands.
//!
//! # Usage
//!
//! ```bash
//! # Create a new administrator
//! cupcake-cli admin create -e admin@example.com -n "Admin Name" -p "s3nha-forte"
//!
//! # Promote or demote an existing account
//! cupcake-cli admin promote -e cliente@example.com
//! cupcake-cli admin demote -e cliente@example.com
//! ```
//!
//! # Environment Variables
//!
//! - `STOREFRONT_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)

use cupcake_core::{Email, UserId};
use cupcake_storefront::db::{RepositoryError, UserRepository};
use cupcake_storefront::services::auth::{AuthError, AuthService, Registration};
use thiserror::Error;

use super::{ConnectError, connect};

/// Errors that can occur during admin operations.
#[derive(Debug, Error)]
pub enum AdminError {
    /// Could not reach the database.
    #[error(transparent)]
    Connect(#[from] ConnectError),

    /// Invalid email.
    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    /// Account could not be created.
    #[error("Could not create account: {0}")]
    Account(#[from] AuthError),

    /// No account uses the email.
    #[error("No account found with email: {0}")]
    UserNotFound(String),

    /// Database error.
    #[error("Database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Create a new administrator account.
///
/// # Arguments
///
/// * `email` - Login email address
/// * `name` - Display name
/// * `password` - Initial password
/// * `phone` - Contact phone, may be empty
///
/// # Returns
///
/// The ID of the created account.
pub async fn create_user(
    email: &str,
    name: &str,
    password: &str,
    phone: &str,
) -> Result<UserId, AdminError> {
    // Validate before touching the database
    let parsed = Email::parse(email).map_err(|_| AdminError::InvalidEmail(email.to_owned()))?;

    let pool = connect().await?;

    tracing::info!("Creating admin account: {}", parsed);

    let user = AuthService::new(&pool)
        .create_account(
            &Registration {
                name,
                email,
                password,
                phone,
            },
            true,
        )
        .await?;

    tracing::info!(
        "Admin account created successfully! ID: {}, Email: {}",
        user.id,
        user.email
    );

    Ok(user.id)
}

/// Grant or revoke admin rights for the account with this email.
pub async fn set_admin(email: &str, is_admin: bool) -> Result<(), AdminError> {
    let parsed = Email::parse(email).map_err(|_| AdminError::InvalidEmail(email.to_owned()))?;

    let pool = connect().await?;

    UserRepository::new(&pool)
        .set_admin(&parsed, is_admin)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => AdminError::UserNotFound(email.to_owned()),
            other => AdminError::Repository(other),
        })?;

    if is_admin {
        tracing::info!("Admin rights granted to {}", parsed);
    } else {
        tracing::info!("Admin rights revoked from {}", parsed);
    }

    Ok(())
}
