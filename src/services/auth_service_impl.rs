//! `SeaORM` implementation of the `AuthService` trait.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::config::Config;
use crate::db::Store;
use crate::services::auth_service::{AdminInfo, AuthError, AuthService, LoginResult};

pub struct SeaOrmAuthService {
    store: Store,
    config: Arc<RwLock<Config>>,
}

impl SeaOrmAuthService {
    #[must_use]
    pub const fn new(store: Store, config: Arc<RwLock<Config>>) -> Self {
        Self { store, config }
    }
}

#[async_trait]
impl AuthService for SeaOrmAuthService {
    async fn login(&self, username: &str, password: &str) -> Result<LoginResult, AuthError> {
        let admins = self.store.admins();
        if !admins.verify_password(username, password).await? {
            return Err(AuthError::InvalidCredentials);
        }

        let admin = admins
            .get_by_username(username)
            .await?
            .ok_or(AuthError::AdminNotFound)?;

        Ok(LoginResult {
            username: admin.username,
            api_key: admin.api_key,
        })
    }

    async fn verify_api_key(&self, api_key: &str) -> Result<Option<String>, AuthError> {
        let admin = self.store.admins().verify_api_key(api_key).await?;
        Ok(admin.map(|a| a.username))
    }

    async fn admin_info(&self, username: &str) -> Result<AdminInfo, AuthError> {
        let admin = self
            .store
            .admins()
            .get_by_username(username)
            .await?
            .ok_or(AuthError::AdminNotFound)?;

        Ok(AdminInfo {
            username: admin.username,
            created_at: admin.created_at,
            updated_at: admin.updated_at,
        })
    }

    async fn change_password(
        &self,
        username: &str,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        if new_password.len() < 8 {
            return Err(AuthError::Validation(
                "New password must be at least 8 characters".to_string(),
            ));
        }
        if current_password == new_password {
            return Err(AuthError::Validation(
                "New password must be different from current password".to_string(),
            ));
        }

        let admins = self.store.admins();
        if !admins.verify_password(username, current_password).await? {
            return Err(AuthError::Validation(
                "Current password is incorrect".to_string(),
            ));
        }

        let security = self.config.read().await.security.clone();
        admins
            .update_password(username, new_password, &security)
            .await?;
        Ok(())
    }

    async fn api_key(&self, username: &str) -> Result<String, AuthError> {
        let admin = self
            .store
            .admins()
            .get_by_username(username)
            .await?
            .ok_or(AuthError::AdminNotFound)?;
        Ok(admin.api_key)
    }

    async fn regenerate_api_key(&self, username: &str) -> Result<String, AuthError> {
        Ok(self.store.admins().regenerate_api_key(username).await?)
    }
}
