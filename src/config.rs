use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    pub server: ServerConfig,

    pub scheduler: SchedulerConfig,

    pub subscriptions: SubscriptionsConfig,

    pub push: PushConfig,

    pub fixtures: FixturesConfig,

    pub payments: PaymentsConfig,

    pub security: SecurityConfig,

    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub database_path: String,

    pub log_level: String,

    pub suppress_connection_errors: bool,

    /// Event bus buffer size (default: 100)
    pub event_bus_buffer_size: usize,

    /// Number of tokio worker threads (default: 2)
    /// Set to 0 to use the number of CPU cores
    pub worker_threads: usize,

    pub max_db_connections: u32,

    pub min_db_connections: u32,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            database_path: "sqlite:data/fanbroj.db".to_string(),
            log_level: "info".to_string(),
            suppress_connection_errors: false,
            event_bus_buffer_size: 100,
            worker_threads: 2,
            max_db_connections: 5,
            min_db_connections: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub enabled: bool,

    pub port: u16,

    pub cors_allowed_origins: Vec<String>,

    /// Whether to set the Secure flag on admin session cookies.
    pub secure_cookies: bool,

    pub session_ttl_minutes: i64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            port: 3000,
            cors_allowed_origins: vec![
                "http://localhost:3000".to_string(),
                "https://fanbroj.net".to_string(),
            ],
            secure_cookies: true,
            session_ttl_minutes: 60,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub enabled: bool,

    /// Use cron expressions. When false every job runs on a fixed interval instead.
    pub use_cron: bool,

    pub rotate_free_movie_cron: String,

    pub trial_expiry_cron: String,

    pub match_reminders_cron: String,

    pub expire_subscriptions_cron: String,

    /// Fixture sync is off unless an expression is set.
    pub fixtures_sync_cron: Option<String>,

    /// Match reminder interval in minutes when `use_cron` is false.
    pub reminder_interval_minutes: u32,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            use_cron: true,
            rotate_free_movie_cron: "0 0 0 * * Mon".to_string(),
            trial_expiry_cron: "0 0 12 * * *".to_string(),
            match_reminders_cron: "0 */5 * * * *".to_string(),
            expire_subscriptions_cron: "0 15 * * * *".to_string(),
            fixtures_sync_cron: None,
            reminder_interval_minutes: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SubscriptionsConfig {
    /// Length of the free trial granted to a brand-new viewer.
    pub trial_days: i64,
}

impl Default for SubscriptionsConfig {
    fn default() -> Self {
        Self { trial_days: 7 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PushConfig {
    pub enabled: bool,

    /// Optional relay that performs web-push encryption on our behalf.
    /// When unset, payloads are posted straight to the subscription endpoint.
    pub relay_url: Option<String>,

    pub icon: String,

    pub ttl_seconds: u32,

    pub batch_size: usize,

    pub request_timeout_seconds: u64,
}

impl Default for PushConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            relay_url: None,
            icon: "/icon-192.png".to_string(),
            ttl_seconds: 86_400,
            batch_size: 500,
            request_timeout_seconds: 15,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FixturesConfig {
    pub api_base_url: String,

    /// API-Football key. `APISPORTS_KEY` in the environment fills it when empty.
    pub api_key: String,

    pub timezone: String,

    /// Offset used to decide what "today" means for the sync.
    pub utc_offset_hours: i32,

    pub request_timeout_seconds: u64,
}

impl Default for FixturesConfig {
    fn default() -> Self {
        Self {
            api_base_url: "https://v3.football.api-sports.io".to_string(),
            api_key: String::new(),
            timezone: "Africa/Mogadishu".to_string(),
            utc_offset_hours: 3,
            request_timeout_seconds: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PaymentsConfig {
    /// Shared secret expected in `X-Webhook-Secret`. Webhooks are unauthenticated when unset.
    pub webhook_secret: Option<String>,

    /// Pending payments older than this are reported as stale.
    pub stale_pending_minutes: i64,

    pub default_currency: String,
}

impl Default for PaymentsConfig {
    fn default() -> Self {
        Self {
            webhook_secret: None,
            stale_pending_minutes: 15,
            default_currency: "USD".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Argon2 memory cost in KiB
    pub argon2_memory_cost_kib: u32,

    pub argon2_time_cost: u32,

    pub argon2_parallelism: u32,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            argon2_memory_cost_kib: 8192,
            argon2_time_cost: 3,
            argon2_parallelism: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    pub metrics_enabled: bool,

    pub loki_enabled: bool,

    pub loki_url: String,

    pub loki_labels: std::collections::HashMap<String, String>,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        let mut labels = std::collections::HashMap::new();
        labels.insert("app".to_string(), "fanbroj".to_string());

        Self {
            metrics_enabled: true,
            loki_enabled: false,
            loki_url: "http://localhost:3100".to_string(),
            loki_labels: labels,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            server: ServerConfig::default(),
            scheduler: SchedulerConfig::default(),
            subscriptions: SubscriptionsConfig::default(),
            push: PushConfig::default(),
            fixtures: FixturesConfig::default(),
            payments: PaymentsConfig::default(),
            security: SecurityConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let paths = Self::config_paths();

        let mut config = None;
        for path in &paths {
            if path.exists() {
                info!("Loading config from: {}", path.display());
                config = Some(Self::load_from_path(path)?);
                break;
            }
        }

        let mut config = config.unwrap_or_else(|| {
            info!("No config file found, using defaults");
            Self::default()
        });
        config.apply_env_overrides();
        Ok(config)
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Secrets usually live in `.env` rather than in the TOML file.
    pub fn apply_env_overrides(&mut self) {
        if self.fixtures.api_key.is_empty()
            && let Ok(key) = std::env::var("APISPORTS_KEY")
        {
            self.fixtures.api_key = key;
        }

        if self.payments.webhook_secret.is_none()
            && let Ok(secret) = std::env::var("FANBROJ_WEBHOOK_SECRET")
            && !secret.is_empty()
        {
            self.payments.webhook_secret = Some(secret);
        }
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Config saved to: {}", path.display());
        Ok(())
    }

    fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("config.toml")];

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("fanbroj").join("config.toml"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".fanbroj").join("config.toml"));
        }

        paths
    }

    fn default_config_path() -> PathBuf {
        PathBuf::from("config.toml")
    }

    pub fn create_default_if_missing() -> Result<bool> {
        let path = Self::default_config_path();
        if path.exists() {
            Ok(false)
        } else {
            let config = Self::default();
            config.save_to_path(&path)?;
            info!("Created default config file: {}", path.display());
            Ok(true)
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.scheduler.enabled {
            if self.scheduler.use_cron {
                let exprs = [
                    ("rotate_free_movie_cron", &self.scheduler.rotate_free_movie_cron),
                    ("trial_expiry_cron", &self.scheduler.trial_expiry_cron),
                    ("match_reminders_cron", &self.scheduler.match_reminders_cron),
                    (
                        "expire_subscriptions_cron",
                        &self.scheduler.expire_subscriptions_cron,
                    ),
                ];
                for (name, expr) in exprs {
                    if expr.trim().is_empty() {
                        anyhow::bail!("scheduler.{name} cannot be empty when use_cron is enabled");
                    }
                }
            } else if self.scheduler.reminder_interval_minutes == 0 {
                anyhow::bail!("scheduler.reminder_interval_minutes must be > 0");
            }
        }

        if self.push.batch_size == 0 {
            anyhow::bail!("push.batch_size must be > 0");
        }

        if !(-12..=14).contains(&self.fixtures.utc_offset_hours) {
            anyhow::bail!(
                "fixtures.utc_offset_hours must be between -12 and 14, got {}",
                self.fixtures.utc_offset_hours
            );
        }

        if self.payments.stale_pending_minutes <= 0 {
            anyhow::bail!("payments.stale_pending_minutes must be > 0");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.scheduler.match_reminders_cron, "0 */5 * * * *");
        assert_eq!(config.subscriptions.trial_days, 7);
        assert_eq!(config.push.batch_size, 500);
        assert_eq!(config.fixtures.utc_offset_hours, 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[scheduler]"));
        assert!(toml_str.contains("[push]"));
        assert!(toml_str.contains("[fixtures]"));
    }

    #[test]
    fn test_config_deserialization() {
        let toml_str = r#"
            [general]
            log_level = "debug"

            [payments]
            stale_pending_minutes = 30
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.general.log_level, "debug");
        assert_eq!(config.payments.stale_pending_minutes, 30);

        assert_eq!(config.fixtures.timezone, "Africa/Mogadishu");
        assert_eq!(config.server.port, 3000);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::default();
        config.scheduler.trial_expiry_cron = "  ".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.scheduler.use_cron = false;
        config.scheduler.reminder_interval_minutes = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.push.batch_size = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.fixtures.utc_offset_hours = 20;
        assert!(config.validate().is_err());
    }
}
