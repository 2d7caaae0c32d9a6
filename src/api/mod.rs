use axum::{
    Router,
    http::HeaderValue,
    middleware,
    routing::{delete, get, post, put},
};
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};

use crate::config::Config;
use crate::domain::events::NotificationEvent;
use crate::services::{
    AccessService, AnalyticsService, AuthService, CatalogService, FixtureService,
    NotificationService, PaymentService, PpvService, PushService, RedemptionService, Scheduler,
};
use crate::state::SharedState;
use metrics_exporter_prometheus::PrometheusHandle;

mod access;
mod admin;
mod ads;
pub mod auth;
mod banners;
mod categories;
mod channels;
mod error;
pub mod events;
mod fixtures;
mod hero_slides;
mod matches;
mod movies;
mod notifications;
mod observability;
mod payments;
mod ppv;
mod push;
mod redemptions;
mod search_analytics;
mod series;
mod settings;
mod system;
mod types;
mod validation;

pub use error::ApiError;
pub use payments::WEBHOOK_SECRET_HEADER;
pub use types::*;

#[derive(Clone)]
pub struct AppState {
    pub shared: Arc<SharedState>,

    pub scheduler: Arc<Scheduler>,

    pub start_time: std::time::Instant,

    pub prometheus_handle: Option<PrometheusHandle>,
}

impl AppState {
    #[must_use]
    pub fn config(&self) -> &Arc<RwLock<Config>> {
        &self.shared.config
    }

    #[must_use]
    pub fn store(&self) -> &crate::db::Store {
        &self.shared.store
    }

    #[must_use]
    pub fn event_bus(&self) -> &tokio::sync::broadcast::Sender<NotificationEvent> {
        &self.shared.event_bus
    }

    #[must_use]
    pub fn auth(&self) -> &Arc<dyn AuthService> {
        &self.shared.auth
    }

    #[must_use]
    pub fn ppv(&self) -> &Arc<dyn PpvService> {
        &self.shared.ppv
    }

    #[must_use]
    pub fn access(&self) -> &Arc<dyn AccessService> {
        &self.shared.access
    }

    #[must_use]
    pub fn payments(&self) -> &Arc<dyn PaymentService> {
        &self.shared.payments
    }

    #[must_use]
    pub fn redemptions(&self) -> &Arc<RedemptionService> {
        &self.shared.redemptions
    }

    #[must_use]
    pub fn catalog(&self) -> &Arc<CatalogService> {
        &self.shared.catalog
    }

    #[must_use]
    pub fn push(&self) -> &Arc<PushService> {
        &self.shared.push
    }

    #[must_use]
    pub fn notifications(&self) -> &Arc<NotificationService> {
        &self.shared.notifications
    }

    #[must_use]
    pub fn fixtures(&self) -> &Arc<FixtureService> {
        &self.shared.fixtures
    }

    #[must_use]
    pub fn analytics(&self) -> &Arc<AnalyticsService> {
        &self.shared.analytics
    }
}

pub async fn create_app_state(
    shared: Arc<SharedState>,
    prometheus_handle: Option<PrometheusHandle>,
) -> Arc<AppState> {
    let scheduler_config = shared.config.read().await.scheduler.clone();
    let scheduler = Arc::new(Scheduler::new(shared.clone(), scheduler_config));

    Arc::new(AppState {
        shared,
        scheduler,
        start_time: std::time::Instant::now(),
        prometheus_handle,
    })
}

pub async fn create_app_state_from_config(
    config: Config,
    prometheus_handle: Option<PrometheusHandle>,
) -> anyhow::Result<Arc<AppState>> {
    let shared = Arc::new(SharedState::new(config).await?);
    Ok(create_app_state(shared, prometheus_handle).await)
}

pub async fn router(state: Arc<AppState>) -> Router {
    let (cors_origins, secure_cookies, session_ttl) = {
        let config = state.config().read().await;
        (
            config.server.cors_allowed_origins.clone(),
            config.server.secure_cookies,
            config.server.session_ttl_minutes,
        )
    };

    let protected_routes = create_protected_router(state.clone());

    let session_store = MemoryStore::default();
    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(secure_cookies)
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(time::Duration::minutes(session_ttl)));

    let api_router = Router::new()
        .merge(create_public_router())
        .merge(protected_routes)
        .layer(session_layer)
        .with_state(state);

    let cors_layer = if cors_origins.iter().any(|o| o == "*") {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
        CorsLayer::new().allow_origin(origins)
    };

    Router::new()
        .nest("/api", api_router)
        .layer(cors_layer.allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(observability::track_metrics))
}

/// Routes any visitor may call.
fn create_public_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/movies", get(movies::list_movies))
        .route("/movies/{slug}", get(movies::get_movie))
        .route("/movies/{slug}/view", post(movies::record_view))
        .route("/movies/id/{id}", get(movies::get_movie_by_id))
        .route("/series", get(series::list_series))
        .route("/series/{slug}", get(series::get_series))
        .route("/series/{slug}/view", post(series::record_view))
        .route("/series/id/{id}/episodes", get(series::list_episodes))
        .route("/matches", get(matches::list_matches))
        .route("/matches/grouped", get(matches::grouped_matches))
        .route("/matches/search", get(matches::search_matches))
        .route("/matches/{slug}", get(matches::get_match))
        .route("/matches/{slug}/view", post(matches::record_view))
        .route("/matches/id/{id}", get(matches::get_match_by_id))
        .route("/matches/id/{id}/related", get(matches::related_matches))
        .route("/channels", get(channels::list_channels))
        .route("/categories", get(categories::list_categories))
        .route("/categories/{slug}", get(categories::get_category))
        .route("/hero-slides", get(hero_slides::active_slides))
        .route("/banners", get(banners::list_banners))
        .route("/ads/page/{page}", get(ads::ads_for_page))
        .route("/ads/slot/{slot_key}", get(ads::get_slot))
        .route("/ads/impression", post(ads::track_impression))
        .route("/ppv/access", get(ppv::check_access))
        .route("/ppv/config", get(ppv::get_config))
        .route("/ppv/ad-watch", post(ppv::record_ad_watch))
        .route("/ppv/purchase", post(ppv::purchase))
        .route("/users/identify", post(access::identify))
        .route("/devices", post(access::register_device))
        .route("/access/premium", get(access::check_premium))
        .route("/subscriptions/me", get(access::my_subscription))
        .route("/redemptions/redeem", post(redemptions::redeem))
        .route("/pay", post(payments::create_payment))
        .route("/pay/webhook", post(payments::webhook))
        .route("/push", post(push::push_action))
        .route("/push", delete(push::unsubscribe))
        .route(
            "/notifications/preferences",
            get(notifications::get_preferences),
        )
        .route(
            "/notifications/preferences",
            put(notifications::update_preferences),
        )
        .route(
            "/notifications/reminders",
            get(notifications::reminder_status),
        )
        .route(
            "/notifications/reminders",
            post(notifications::toggle_reminder),
        )
        .route("/search-analytics", post(search_analytics::track))
        .route("/settings", get(settings::get_settings))
}

fn create_protected_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/me", get(auth::get_current_admin))
        .route("/auth/password", put(auth::change_password))
        .route("/auth/api-key", get(auth::get_api_key))
        .route(
            "/auth/api-key/regenerate",
            post(auth::regenerate_api_key),
        )
        .route("/movies", post(movies::create_movie))
        .route("/movies/id/{id}", put(movies::update_movie))
        .route("/movies/id/{id}", delete(movies::delete_movie))
        .route("/series", post(series::create_series))
        .route("/series/id/{id}", put(series::update_series))
        .route("/series/id/{id}", delete(series::delete_series))
        .route("/series/id/{id}/episodes", post(series::create_episode))
        .route("/episodes/{id}", put(series::update_episode))
        .route("/episodes/{id}", delete(series::delete_episode))
        .route("/matches", post(matches::create_match))
        .route("/matches/id/{id}", put(matches::update_match))
        .route("/matches/id/{id}", delete(matches::delete_match))
        .route("/matches/bulk-status", post(matches::bulk_update_status))
        .route("/channels", post(channels::create_channel))
        .route("/channels", put(channels::update_channel))
        .route("/channels", delete(channels::delete_channel))
        .route("/categories", post(categories::create_category))
        .route("/categories", put(categories::update_category))
        .route("/categories", delete(categories::delete_category))
        .route("/categories/seed", post(categories::seed_categories))
        .route("/hero-slides", post(hero_slides::create_slide))
        .route("/hero-slides/all", get(hero_slides::all_slides))
        .route("/hero-slides/reorder", post(hero_slides::reorder_slides))
        .route("/hero-slides/{id}", put(hero_slides::update_slide))
        .route("/hero-slides/{id}", delete(hero_slides::delete_slide))
        .route("/banners", post(banners::create_banner))
        .route("/banners", put(banners::update_banner))
        .route("/banners", delete(banners::delete_banner))
        .route("/ads", get(ads::list_ads))
        .route("/ads", post(ads::create_ad))
        .route("/ads/seed", post(ads::seed_ads))
        .route("/ads/{id}", put(ads::update_ad))
        .route("/ads/{id}", delete(ads::delete_ad))
        .route("/ads/{id}/toggle", post(ads::toggle_ad))
        .route("/ppv/configs", get(ppv::list_configs))
        .route("/ppv/configs", post(ppv::upsert_config))
        .route("/ppv/configs/{id}", delete(ppv::delete_config))
        .route("/ppv/stats", get(ppv::stats))
        .route(
            "/notifications/broadcast",
            post(notifications::broadcast),
        )
        .route(
            "/notifications/new-release",
            post(notifications::notify_new_release),
        )
        .route("/notifications/history", get(notifications::history))
        .route("/search-analytics", get(search_analytics::report))
        .route("/fixtures", get(fixtures::list_fixtures))
        .route("/fixtures/slug/{slug}", get(fixtures::get_fixture))
        .route("/fixtures/sync", post(fixtures::sync))
        .route("/fixtures/sync-logs", get(fixtures::sync_logs))
        .route("/fixtures/import", post(fixtures::import))
        .route("/fixtures/leagues", get(fixtures::list_leagues))
        .route("/fixtures/leagues", post(fixtures::add_league))
        .route("/fixtures/leagues/seed", post(fixtures::seed_leagues))
        .route(
            "/fixtures/leagues/{id}/toggle",
            post(fixtures::toggle_league),
        )
        .route("/settings", put(settings::update_settings))
        .route("/admin/payments", get(admin::payments::list_payments))
        .route(
            "/admin/subscribers",
            get(admin::subscribers::list_subscribers),
        )
        .route(
            "/admin/subscribers",
            put(admin::subscribers::update_subscriber),
        )
        .route(
            "/admin/subscribers",
            post(admin::subscribers::create_subscriber),
        )
        .route("/redemptions", get(redemptions::list_codes))
        .route("/redemptions", post(redemptions::generate_codes))
        .route("/redemptions/stats", get(redemptions::stats))
        .route("/redemptions/{id}/revoke", post(redemptions::revoke_code))
        .route("/redemptions/{id}", delete(redemptions::delete_code))
        .route("/admin/devices", get(admin::devices::list_devices))
        .route("/admin/devices", delete(admin::devices::clear_devices))
        .route("/admin/revenue", get(admin::revenue::get_revenue))
        .route("/admin/logs", get(admin::logs::get_logs))
        .route("/admin/logs", delete(admin::logs::clear_logs))
        .route("/system/status", get(system::get_status))
        .route("/system/jobs/{name}", post(system::run_job))
        .route("/metrics", get(observability::get_metrics))
        .merge(events::router())
        .route_layer(middleware::from_fn_with_state(state, auth::auth_middleware))
}
