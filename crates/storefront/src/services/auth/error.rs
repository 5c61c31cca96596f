//! Authentication error types.

use thiserror::Error;

use crate::db::RepositoryError;

/// Errors that can occur during authentication and account operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] cupcake_core::EmailError),

    /// Invalid credentials (wrong password or user not found).
    #[error("invalid credentials")]
    InvalidCredentials,

    /// User not found.
    #[error("user not found")]
    UserNotFound,

    /// Another account already uses the email.
    #[error("user already exists")]
    UserAlreadyExists,

    /// Password too weak or invalid.
    #[error("password validation failed: {0}")]
    WeakPassword(String),

    /// Phone is not in the `(11) 98765-4321` format.
    #[error("invalid phone number")]
    InvalidPhone,

    /// Name is blank.
    #[error("name is required")]
    MissingName,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,
}

impl AuthError {
    /// Message shown to the user in a flash after a rejected form.
    ///
    /// Returns `None` for failures that should surface as server errors.
    #[must_use]
    pub fn user_message(&self) -> Option<String> {
        let message = match self {
            Self::InvalidEmail(_) => "Email inválido.".to_string(),
            Self::InvalidCredentials => "Email ou senha inválidos.".to_string(),
            Self::UserNotFound => "Usuário não encontrado.".to_string(),
            Self::UserAlreadyExists => "Email já cadastrado!".to_string(),
            Self::WeakPassword(msg) => msg.clone(),
            Self::InvalidPhone => "Telefone inválido! Use o formato (11) 98765-4321".to_string(),
            Self::MissingName => "Informe o nome.".to_string(),
            Self::Repository(_) | Self::PasswordHash => return None,
        };
        Some(message)
    }
}
