use std::sync::Arc;
use tokio::sync::{RwLock, broadcast};

use crate::clients::api_football::ApiFootballClient;
use crate::clients::web_push::HttpPushSender;
use crate::config::Config;
use crate::db::Store;
use crate::domain::events::NotificationEvent;
use crate::services::{
    AccessService, AnalyticsService, AuthService, CatalogService, FixtureService, LogService,
    NotificationService, PaymentService, PpvService, PushSender, PushService, RedemptionService,
    SeaOrmAccessService, SeaOrmAuthService, SeaOrmPaymentService, SeaOrmPpvService,
};

/// Build a shared HTTP client with reasonable defaults for outbound calls.
/// Reused by every client with the same timeout so connections are pooled.
fn build_shared_http_client(timeout_seconds: u64) -> anyhow::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_seconds))
        .user_agent("Fanbroj/1.0")
        .pool_max_idle_per_host(10)
        .build()
        .map_err(|e| anyhow::anyhow!("Failed to build shared HTTP client: {e}"))
}

#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<RwLock<Config>>,

    pub store: Store,

    pub event_bus: broadcast::Sender<NotificationEvent>,

    pub log_service: Arc<LogService>,

    pub auth: Arc<dyn AuthService>,

    pub ppv: Arc<dyn PpvService>,

    pub access: Arc<dyn AccessService>,

    pub payments: Arc<dyn PaymentService>,

    pub redemptions: Arc<RedemptionService>,

    pub catalog: Arc<CatalogService>,

    pub push: Arc<PushService>,

    pub notifications: Arc<NotificationService>,

    pub fixtures: Arc<FixtureService>,

    pub analytics: Arc<AnalyticsService>,
}

impl SharedState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let (event_bus, _) = broadcast::channel(config.general.event_bus_buffer_size);
        Self::init_with_event_bus(config, event_bus, None).await
    }

    /// Same as [`Self::new`] but delivers push notifications through `sender`.
    pub async fn with_push_sender(
        config: Config,
        sender: Arc<dyn PushSender>,
    ) -> anyhow::Result<Self> {
        let (event_bus, _) = broadcast::channel(config.general.event_bus_buffer_size);
        Self::init_with_event_bus(config, event_bus, Some(sender)).await
    }

    async fn init_with_event_bus(
        config: Config,
        event_bus: broadcast::Sender<NotificationEvent>,
        push_sender: Option<Arc<dyn PushSender>>,
    ) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        let push_sender = match push_sender {
            Some(sender) => sender,
            None => {
                let client = build_shared_http_client(config.push.request_timeout_seconds)?;
                Arc::new(HttpPushSender::new(
                    client,
                    config.push.relay_url.clone(),
                    config.push.ttl_seconds,
                )) as Arc<dyn PushSender>
            }
        };

        let football = Arc::new(ApiFootballClient::new(
            build_shared_http_client(config.fixtures.request_timeout_seconds)?,
            &config.fixtures.api_base_url,
            &config.fixtures.api_key,
        ));

        let config_arc = Arc::new(RwLock::new(config));

        let log_service = Arc::new(LogService::new(store.clone(), event_bus.clone()));
        log_service.clone().start_listener();

        let auth = Arc::new(SeaOrmAuthService::new(store.clone(), config_arc.clone()))
            as Arc<dyn AuthService + Send + Sync + 'static>;

        let ppv = Arc::new(SeaOrmPpvService::new(store.clone(), event_bus.clone()))
            as Arc<dyn PpvService + Send + Sync + 'static>;

        let access = Arc::new(SeaOrmAccessService::new(
            store.clone(),
            config_arc.clone(),
            event_bus.clone(),
        )) as Arc<dyn AccessService + Send + Sync + 'static>;

        let payments = Arc::new(SeaOrmPaymentService::new(
            store.clone(),
            config_arc.clone(),
            access.clone(),
            event_bus.clone(),
        )) as Arc<dyn PaymentService + Send + Sync + 'static>;

        let redemptions = Arc::new(RedemptionService::new(
            store.clone(),
            access.clone(),
            event_bus.clone(),
        ));

        let catalog = Arc::new(CatalogService::new(store.clone(), event_bus.clone()));

        let push = Arc::new(PushService::new(
            store.clone(),
            config_arc.clone(),
            push_sender,
        ));

        let notifications = Arc::new(NotificationService::new(
            store.clone(),
            push.clone(),
            event_bus.clone(),
        ));

        let fixtures = Arc::new(FixtureService::new(
            store.clone(),
            football,
            config_arc.clone(),
            event_bus.clone(),
        ));

        let analytics = Arc::new(AnalyticsService::new(store.clone()));

        Ok(Self {
            config: config_arc,
            store,
            event_bus,
            log_service,
            auth,
            ppv,
            access,
            payments,
            redemptions,
            catalog,
            push,
            notifications,
            fixtures,
            analytics,
        })
    }

    pub async fn config(&self) -> Config {
        self.config.read().await.clone()
    }
}
