//! Authentication service.
//!
//! Password login plus the account forms: registration, profile editing and
//! the administrator's user editor.

mod error;

pub use error::AuthError;

use std::sync::LazyLock;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use regex::Regex;
use sqlx::PgPool;

use cupcake_core::{Email, UserId};

use crate::db::RepositoryError;
use crate::db::users::{NewUser, UserRepository, UserUpdate};
use crate::models::User;

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 6;

static PHONE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\(\d{2}\)\s?\d{4,5}-\d{4}$").expect("Invalid regex"));

/// Fields submitted by the registration form.
#[derive(Debug, Clone)]
pub struct Registration<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub password: &'a str,
    pub phone: &'a str,
}

/// Fields submitted by the profile and user editor forms.
#[derive(Debug, Clone)]
pub struct AccountChanges<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub phone: &'a str,
    /// New password; blank keeps the current one.
    pub new_password: &'a str,
    /// New admin flag; only the administrator's editor sets it.
    pub is_admin: Option<bool>,
}

/// Authentication service.
pub struct AuthService<'a> {
    users: UserRepository<'a>,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            users: UserRepository::new(pool),
        }
    }

    /// Register a new customer.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail`, `AuthError::InvalidPhone`,
    /// `AuthError::MissingName` or `AuthError::WeakPassword` for invalid input.
    /// Returns `AuthError::UserAlreadyExists` if the email is already registered.
    pub async fn register(&self, form: &Registration<'_>) -> Result<User, AuthError> {
        // Customers must leave a phone for delivery contact
        if form.phone.trim().is_empty() {
            return Err(AuthError::InvalidPhone);
        }
        self.create_account(form, false).await
    }

    /// Create an account with an explicit admin flag.
    ///
    /// # Errors
    ///
    /// Same as [`AuthService::register`].
    pub async fn create_account(
        &self,
        form: &Registration<'_>,
        is_admin: bool,
    ) -> Result<User, AuthError> {
        let name = validate_name(form.name)?;
        let email = Email::parse(form.email)?;
        let phone = validate_phone(form.phone)?;
        validate_password(form.password)?;

        let password_hash = hash_password(form.password)?;

        let user = self
            .users
            .create(&NewUser {
                name,
                email: &email,
                password_hash: &password_hash,
                phone,
                is_admin,
            })
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Repository(other),
            })?;

        Ok(user)
    }

    /// Login with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email/password is wrong.
    pub async fn login(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let email = Email::parse(email).map_err(|_| AuthError::InvalidCredentials)?;

        let (user, password_hash) = self
            .users
            .get_password_hash(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &password_hash)?;

        Ok(user)
    }

    /// Edit an account.
    ///
    /// The email must not belong to another account. A blank new password
    /// keeps the current hash.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UserAlreadyExists` if the email is taken.
    /// Returns `AuthError::UserNotFound` if the account is gone.
    pub async fn update_account(
        &self,
        id: UserId,
        changes: &AccountChanges<'_>,
    ) -> Result<User, AuthError> {
        let name = validate_name(changes.name)?;
        let email = Email::parse(changes.email)?;
        let phone = validate_phone(changes.phone)?;

        let password_hash = if changes.new_password.is_empty() {
            None
        } else {
            validate_password(changes.new_password)?;
            Some(hash_password(changes.new_password)?)
        };

        if self.users.email_taken(&email, id).await? {
            return Err(AuthError::UserAlreadyExists);
        }

        self.users
            .update(
                id,
                &UserUpdate {
                    name,
                    email: &email,
                    phone,
                    password_hash: password_hash.as_deref(),
                    is_admin: changes.is_admin,
                },
            )
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => AuthError::UserNotFound,
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Repository(other),
            })
    }
}

fn validate_name(name: &str) -> Result<&str, AuthError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AuthError::MissingName);
    }
    Ok(name)
}

/// Validate an optional phone number. Blank means no phone.
fn validate_phone(phone: &str) -> Result<Option<&str>, AuthError> {
    let phone = phone.trim();
    if phone.is_empty() {
        return Ok(None);
    }
    if !PHONE_PATTERN.is_match(phone) {
        return Err(AuthError::InvalidPhone);
    }
    Ok(Some(phone))
}

/// Validate password meets requirements.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "A senha deve ter pelo menos {MIN_PASSWORD_LENGTH} caracteres."
        )));
    }

    Ok(())
}

/// Hash a password using Argon2id.
///
/// # Errors
///
/// Returns `AuthError::PasswordHash` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_phone_pattern() {
        assert_eq!(validate_phone("(11) 98765-4321").unwrap(), Some("(11) 98765-4321"));
        assert_eq!(validate_phone("(11)3456-7890").unwrap(), Some("(11)3456-7890"));
        assert_eq!(validate_phone("  ").unwrap(), None);
        assert!(matches!(validate_phone("11987654321"), Err(AuthError::InvalidPhone)));
        assert!(matches!(validate_phone("(11) 987-4321"), Err(AuthError::InvalidPhone)));
    }

    #[test]
    fn test_password_length() {
        assert!(validate_password("123456").is_ok());
        assert!(matches!(validate_password("12345"), Err(AuthError::WeakPassword(_))));
        assert!(validate_password("çãéíóú").is_ok());
    }

    #[test]
    fn test_blank_name_rejected() {
        assert!(matches!(validate_name("   "), Err(AuthError::MissingName)));
        assert_eq!(validate_name(" Ana ").unwrap(), "Ana");
    }

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("segredo123").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("segredo123", &hash).is_ok());
        assert!(matches!(
            verify_password("errada", &hash),
            Err(AuthError::InvalidCredentials)
        ));
        assert!(matches!(
            verify_password("segredo123", "not-a-hash"),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_user_messages() {
        assert_eq!(
            AuthError::UserAlreadyExists.user_message().as_deref(),
            Some("Email já cadastrado!")
        );
        assert!(AuthError::PasswordHash.user_message().is_none());
    }
}
