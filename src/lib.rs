pub mod api;
pub mod cli;
pub mod clients;
pub mod config;
pub mod constants;
pub mod db;
pub mod domain;
pub mod entities;
pub mod services;
pub mod state;

use std::sync::Arc;
use tokio::signal;

use anyhow::Context;
use clap::Parser;
use cli::{AdminCommands, Cli, Commands};
pub use config::Config;
use state::SharedState;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = Config::load()?;
    config.validate()?;

    let prometheus_handle = if config.observability.metrics_enabled {
        use metrics_exporter_prometheus::PrometheusBuilder;
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .context("Failed to install Prometheus recorder")?;
        info!("Prometheus metrics recorder initialized");
        Some(handle)
    } else {
        None
    };

    init_tracing(&config)?;

    match cli.command {
        None | Some(Commands::Daemon) => run_daemon(config, prometheus_handle).await,
        Some(Commands::Init) => cli::cmd_init(),
        Some(Commands::Seed) => cli::cmd_seed(&config).await,
        Some(Commands::Job { name }) => cli::cmd_job(config, &name).await,
        Some(Commands::SyncFixtures { mode }) => cli::cmd_sync_fixtures(config, mode).await,
        Some(Commands::ExpireSubscriptions) => cli::cmd_expire_subscriptions(config).await,
        Some(Commands::Admin { command }) => match command {
            AdminCommands::ApiKey { username } => cli::cmd_show_api_key(config, &username).await,
            AdminCommands::RegenerateKey { username } => {
                cli::cmd_regenerate_api_key(config, &username).await
            }
        },
    }
}

fn init_tracing(config: &Config) -> anyhow::Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let mut log_level = config.general.log_level.clone();
    if config.general.suppress_connection_errors {
        log_level.push_str(",reqwest::retry=off,hyper_util=off");
    }

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_level));

    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer());

    if config.observability.loki_enabled {
        let url = url::Url::parse(&config.observability.loki_url).context("Invalid Loki URL")?;

        let mut builder = tracing_loki::builder().label("app", "fanbroj")?;
        for (key, value) in &config.observability.loki_labels {
            builder = builder.label(key.as_str(), value.as_str())?;
        }
        let (layer, task) = builder
            .extra_field("version", env!("CARGO_PKG_VERSION"))?
            .build_url(url)?;

        tokio::spawn(task);

        registry.with(layer).init();
        info!(
            "Loki logging initialized at {}",
            config.observability.loki_url
        );
    } else {
        registry.init();
    }

    Ok(())
}

async fn run_daemon(
    config: Config,
    prometheus_handle: Option<metrics_exporter_prometheus::PrometheusHandle>,
) -> anyhow::Result<()> {
    info!(
        "Fanbroj v{} starting in daemon mode...",
        env!("CARGO_PKG_VERSION")
    );

    let server_enabled = config.server.enabled;
    let port = config.server.port;

    let shared = Arc::new(SharedState::new(config).await?);
    let seeded = shared.store.seed_defaults().await?;
    info!(?seeded, "Default data checked");

    let api_state = api::create_app_state(shared, prometheus_handle).await;

    let scheduler = Arc::clone(&api_state.scheduler);
    let scheduler_handle = tokio::spawn(async move {
        if let Err(e) = scheduler.start().await {
            error!("Scheduler error: {}", e);
        }
    });

    let server_handle: Option<tokio::task::JoinHandle<()>> = if server_enabled {
        info!("Starting Web API on port {}", port);

        let app = api::router(api_state.clone()).await;
        let addr = format!("0.0.0.0:{port}");
        let listener = tokio::net::TcpListener::bind(&addr).await?;

        Some(tokio::spawn(async move {
            info!("Web server running at http://0.0.0.0:{}", port);
            if let Err(e) = axum::serve(listener, app).await {
                error!("Web server error: {}", e);
            }
        }))
    } else {
        None
    };

    info!("Daemon running. Press Ctrl+C to stop.");

    match signal::ctrl_c().await {
        Ok(()) => {
            info!("Shutdown signal received");
        }
        Err(e) => {
            error!("Error listening for shutdown: {}", e);
        }
    }

    api_state.scheduler.stop().await;
    scheduler_handle.abort();
    if let Some(handle) = server_handle {
        handle.abort();
    }
    info!("Daemon stopped");

    Ok(())
}
