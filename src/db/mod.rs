use anyhow::Result;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;
use std::time::Duration;
use tracing::info;

pub mod migrator;
pub mod repositories;

pub use repositories::logs::SystemLog;

/// Connection pool plus typed repository accessors.
#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        let path_str = db_url.trim_start_matches("sqlite:");
        if !path_str.starts_with(":memory:") {
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    // ========================================================================
    // Repositories
    // ========================================================================

    #[must_use]
    pub fn movies(&self) -> repositories::movie::MovieRepository {
        repositories::movie::MovieRepository::new(self.conn.clone())
    }

    #[must_use]
    pub fn series(&self) -> repositories::series::SeriesRepository {
        repositories::series::SeriesRepository::new(self.conn.clone())
    }

    #[must_use]
    pub fn matches(&self) -> repositories::matches::MatchRepository {
        repositories::matches::MatchRepository::new(self.conn.clone())
    }

    #[must_use]
    pub fn channels(&self) -> repositories::channel::ChannelRepository {
        repositories::channel::ChannelRepository::new(self.conn.clone())
    }

    #[must_use]
    pub fn categories(&self) -> repositories::category::CategoryRepository {
        repositories::category::CategoryRepository::new(self.conn.clone())
    }

    #[must_use]
    pub fn hero_slides(&self) -> repositories::hero_slide::HeroSlideRepository {
        repositories::hero_slide::HeroSlideRepository::new(self.conn.clone())
    }

    #[must_use]
    pub fn banners(&self) -> repositories::banner::BannerRepository {
        repositories::banner::BannerRepository::new(self.conn.clone())
    }

    #[must_use]
    pub fn ads(&self) -> repositories::ad::AdRepository {
        repositories::ad::AdRepository::new(self.conn.clone())
    }

    #[must_use]
    pub fn ppv(&self) -> repositories::ppv::PpvRepository {
        repositories::ppv::PpvRepository::new(self.conn.clone())
    }

    #[must_use]
    pub fn viewers(&self) -> repositories::user::ViewerRepository {
        repositories::user::ViewerRepository::new(self.conn.clone())
    }

    #[must_use]
    pub fn subscriptions(&self) -> repositories::subscription::SubscriptionRepository {
        repositories::subscription::SubscriptionRepository::new(self.conn.clone())
    }

    #[must_use]
    pub fn payments(&self) -> repositories::payment::PaymentRepository {
        repositories::payment::PaymentRepository::new(self.conn.clone())
    }

    #[must_use]
    pub fn redemptions(&self) -> repositories::redemption::RedemptionRepository {
        repositories::redemption::RedemptionRepository::new(self.conn.clone())
    }

    #[must_use]
    pub fn push(&self) -> repositories::push::PushRepository {
        repositories::push::PushRepository::new(self.conn.clone())
    }

    #[must_use]
    pub fn notifications(&self) -> repositories::notification::NotificationRepository {
        repositories::notification::NotificationRepository::new(self.conn.clone())
    }

    #[must_use]
    pub fn searches(&self) -> repositories::search::SearchRepository {
        repositories::search::SearchRepository::new(self.conn.clone())
    }

    #[must_use]
    pub fn fixtures(&self) -> repositories::fixture::FixtureRepository {
        repositories::fixture::FixtureRepository::new(self.conn.clone())
    }

    #[must_use]
    pub fn settings(&self) -> repositories::settings::SettingsRepository {
        repositories::settings::SettingsRepository::new(self.conn.clone())
    }

    #[must_use]
    pub fn admins(&self) -> repositories::admin::AdminRepository {
        repositories::admin::AdminRepository::new(self.conn.clone())
    }

    #[must_use]
    pub fn logs(&self) -> repositories::logs::LogRepository {
        repositories::logs::LogRepository::new(self.conn.clone())
    }

    // ========================================================================
    // Seeding
    // ========================================================================

    /// Default categories, ad slots and leagues. Safe to run repeatedly.
    pub async fn seed_defaults(&self) -> Result<SeedReport> {
        let settings = self.settings().get().await?;
        let categories = self.categories().seed_defaults().await?;
        let ad_slots = self.ads().seed().await?;
        let leagues = self.fixtures().seed_leagues().await?;

        info!(
            categories,
            ad_slots, leagues, "Seeded defaults for {}", settings.site_name
        );

        Ok(SeedReport {
            categories,
            ad_slots_seeded: ad_slots,
            leagues,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct SeedReport {
    pub categories: usize,
    pub ad_slots_seeded: bool,
    pub leagues: usize,
}
