//! Admin authentication: login, password changes and API key management.

use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Admin not found")]
    AdminNotFound,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for AuthError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for AuthError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AdminInfo {
    pub username: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginResult {
    pub username: String,
    pub api_key: String,
}

#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidCredentials`] if the username or password is wrong.
    async fn login(&self, username: &str, password: &str) -> Result<LoginResult, AuthError>;

    /// Username owning `api_key`, if any.
    async fn verify_api_key(&self, api_key: &str) -> Result<Option<String>, AuthError>;

    async fn admin_info(&self, username: &str) -> Result<AdminInfo, AuthError>;

    /// # Errors
    ///
    /// Returns [`AuthError::Validation`] when the current password is wrong, or
    /// the new one is shorter than 8 characters or unchanged.
    async fn change_password(
        &self,
        username: &str,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AuthError>;

    async fn api_key(&self, username: &str) -> Result<String, AuthError>;

    async fn regenerate_api_key(&self, username: &str) -> Result<String, AuthError>;
}
