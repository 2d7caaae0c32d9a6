use anyhow::{Context, Result};
use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use serde::Serialize;
use tokio::task;

use crate::config::SecurityConfig;
use crate::entities::admins;

/// Admin account without the password hash.
#[derive(Debug, Clone, Serialize)]
pub struct Admin {
    pub id: i32,
    pub username: String,
    #[serde(skip)]
    pub api_key: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<admins::Model> for Admin {
    fn from(model: admins::Model) -> Self {
        Self {
            id: model.id,
            username: model.username,
            api_key: model.api_key,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

pub struct AdminRepository {
    conn: DatabaseConnection,
}

impl AdminRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    async fn find_model(&self, username: &str) -> Result<Option<admins::Model>> {
        admins::Entity::find()
            .filter(admins::Column::Username.eq(username))
            .one(&self.conn)
            .await
            .context("Failed to query admin by username")
    }

    pub async fn get_by_username(&self, username: &str) -> Result<Option<Admin>> {
        Ok(self.find_model(username).await?.map(Admin::from))
    }

    /// Argon2 verification runs on the blocking pool.
    pub async fn verify_password(&self, username: &str, password: &str) -> Result<bool> {
        let Some(admin) = self.find_model(username).await? else {
            return Ok(false);
        };

        let password_hash = admin.password_hash;
        let password = password.to_string();

        task::spawn_blocking(move || {
            let parsed = PasswordHash::new(&password_hash)
                .map_err(|e| anyhow::anyhow!("Invalid password hash format: {e}"))?;
            Ok::<bool, anyhow::Error>(
                Argon2::default()
                    .verify_password(password.as_bytes(), &parsed)
                    .is_ok(),
            )
        })
        .await
        .context("Password verification task panicked")?
    }

    pub async fn update_password(
        &self,
        username: &str,
        new_password: &str,
        config: &SecurityConfig,
    ) -> Result<()> {
        let admin = self
            .find_model(username)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Admin not found: {username}"))?;

        let password = new_password.to_string();
        let config = config.clone();
        let new_hash = task::spawn_blocking(move || hash_password(&password, Some(&config)))
            .await
            .context("Password hashing task panicked")??;

        let mut active: admins::ActiveModel = admin.into();
        active.password_hash = Set(new_hash);
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());
        active.update(&self.conn).await?;
        Ok(())
    }

    pub async fn verify_api_key(&self, api_key: &str) -> Result<Option<Admin>> {
        let admin = admins::Entity::find()
            .filter(admins::Column::ApiKey.eq(api_key))
            .one(&self.conn)
            .await
            .context("Failed to query admin by API key")?;
        Ok(admin.map(Admin::from))
    }

    pub async fn regenerate_api_key(&self, username: &str) -> Result<String> {
        let admin = self
            .find_model(username)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Admin not found: {username}"))?;

        let new_api_key = generate_api_key();
        let mut active: admins::ActiveModel = admin.into();
        active.api_key = Set(new_api_key.clone());
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());
        active.update(&self.conn).await?;

        Ok(new_api_key)
    }
}

/// Argon2id hash. Without a config the crate defaults are used.
pub fn hash_password(password: &str, config: Option<&SecurityConfig>) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);

    let argon2 = match config {
        Some(cfg) => {
            let params = Params::new(
                cfg.argon2_memory_cost_kib,
                cfg.argon2_time_cost,
                cfg.argon2_parallelism,
                None,
            )
            .map_err(|e| anyhow::anyhow!("Invalid Argon2 params: {e}"))?;
            Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
        }
        None => Argon2::default(),
    };

    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {e}"))?;
    Ok(hash.to_string())
}

/// 64-character hex string.
#[must_use]
pub fn generate_api_key() -> String {
    use rand::Rng;

    let bytes: [u8; 32] = rand::rng().random();
    bytes.iter().fold(String::with_capacity(64), |mut acc, b| {
        use std::fmt::Write;
        let _ = write!(acc, "{b:02x}");
        acc
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_api_key_shape() {
        let key = generate_api_key();
        assert_eq!(key.len(), 64);
        assert!(key.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(key, generate_api_key());
    }

    #[test]
    fn test_hash_password_verifies() {
        let hash = hash_password("correct horse", None).unwrap();
        let parsed = PasswordHash::new(&hash).unwrap();
        assert!(
            Argon2::default()
                .verify_password(b"correct horse", &parsed)
                .is_ok()
        );
    }
}
