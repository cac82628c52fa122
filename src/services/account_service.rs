use std::sync::Arc;

use serde::Deserialize;
use tracing::{error, info};

use crate::auth::{hash_password, verify_dummy_password, verify_password, PasswordError};
use crate::database::{DatabaseError, NewUser, User, UserStore};
use crate::error::ApiError;

pub const MIN_PASSWORD_LEN: usize = 8;
pub const MAX_PASSWORD_LEN: usize = 128;

#[derive(Debug, Clone, Deserialize)]
pub struct SignUpRequest {
    #[serde(default)]
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    #[error("Invalid email address")]
    InvalidEmail,
    #[error("Password must be between 8 and 128 characters")]
    InvalidPassword,
    #[error("User already exists")]
    AlreadyExists,
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("Password error: {0}")]
    Password(#[from] PasswordError),
    #[error("Database error: {0}")]
    Database(DatabaseError),
}

impl From<DatabaseError> for AccountError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::Conflict(_) => AccountError::AlreadyExists,
            other => AccountError::Database(other),
        }
    }
}

impl From<AccountError> for ApiError {
    fn from(err: AccountError) -> Self {
        match err {
            AccountError::InvalidEmail | AccountError::InvalidPassword => {
                ApiError::bad_request(err.to_string())
            }
            AccountError::AlreadyExists => ApiError::conflict(err.to_string()),
            AccountError::InvalidCredentials => ApiError::unauthorized(err.to_string()),
            AccountError::Password(e) => {
                error!("{}", e);
                ApiError::internal_server_error("Internal server error")
            }
            AccountError::Database(e) => ApiError::from(e),
        }
    }
}

/// Account registration and credential checks
#[derive(Clone)]
pub struct AccountService {
    users: Arc<dyn UserStore>,
}

impl AccountService {
    pub fn new(users: Arc<dyn UserStore>) -> Self {
        Self { users }
    }

    pub async fn has_users(&self) -> Result<bool, AccountError> {
        Ok(self.users.has_users().await?)
    }

    /// First `limit` accounts, oldest first
    pub async fn list(&self, limit: i64) -> Result<Vec<User>, AccountError> {
        Ok(self.users.list(limit).await?)
    }

    /// Create an account after validating the request
    pub async fn register(&self, request: SignUpRequest) -> Result<User, AccountError> {
        let email = normalize_email(&request.email)?;
        validate_password(&request.password)?;

        let name = match request.name.trim() {
            "" => email.split('@').next().unwrap_or_default().to_string(),
            name => name.to_string(),
        };

        if self.users.find_by_email(&email).await?.is_some() {
            return Err(AccountError::AlreadyExists);
        }

        let password_hash = hash_password(&request.password).await?;
        let user = self
            .users
            .create(NewUser {
                name,
                email,
                password_hash,
            })
            .await?;

        info!(user_id = %user.id, email = %user.email, "account created");
        Ok(user)
    }

    /// Look up the account and check its password
    pub async fn authenticate(&self, request: SignInRequest) -> Result<User, AccountError> {
        let email = request.email.trim().to_lowercase();
        let Some(user) = self.users.find_by_email(&email).await? else {
            verify_dummy_password(&request.password).await;
            return Err(AccountError::InvalidCredentials);
        };

        if !verify_password(&request.password, &user.password_hash).await {
            return Err(AccountError::InvalidCredentials);
        }
        Ok(user)
    }
}

fn normalize_email(email: &str) -> Result<String, AccountError> {
    let email = email.trim().to_lowercase();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() && !domain.contains('@') => {
            Ok(email)
        }
        _ => Err(AccountError::InvalidEmail),
    }
}

fn validate_password(password: &str) -> Result<(), AccountError> {
    let len = password.chars().count();
    if (MIN_PASSWORD_LEN..=MAX_PASSWORD_LEN).contains(&len) {
        Ok(())
    } else {
        Err(AccountError::InvalidPassword)
    }
}
