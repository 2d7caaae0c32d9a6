//! One-shot job runs from the terminal. They share the daemon's job bodies
//! but not its overlap guard, so avoid running them against a live daemon.

use std::sync::Arc;

use crate::cli::SyncMode;
use crate::config::Config;
use crate::domain::JobName;
use crate::services::Scheduler;
use crate::services::fixtures::SyncOutcome;
use crate::state::SharedState;

async fn scheduler_for(config: Config) -> anyhow::Result<Scheduler> {
    let scheduler_config = config.scheduler.clone();
    let shared = Arc::new(SharedState::new(config).await?);
    Ok(Scheduler::new(shared, scheduler_config))
}

pub async fn cmd_job(config: Config, name: &str) -> anyhow::Result<()> {
    let job: JobName = name.parse()?;
    let report = scheduler_for(config).await?.run_job(job).await?;

    println!("{} finished in {}ms", report.job, report.duration_ms);
    if let Some(result) = report.result {
        println!("{}", serde_json::to_string_pretty(&result)?);
    }
    Ok(())
}

pub async fn cmd_sync_fixtures(config: Config, mode: SyncMode) -> anyhow::Result<()> {
    let state = SharedState::new(config).await?;

    let outcomes = match mode.day() {
        Some(day) => vec![state.fixtures.sync(day).await?],
        None => state.fixtures.sync_all_days().await?,
    };

    for outcome in &outcomes {
        print_outcome(outcome);
    }
    Ok(())
}

fn print_outcome(outcome: &SyncOutcome) {
    if outcome.ok {
        println!(
            "✓ {} ({}): fetched {}, imported {}, updated {}, skipped {}",
            outcome.mode,
            outcome.date,
            outcome.fetched,
            outcome.imported,
            outcome.updated,
            outcome.skipped
        );
    } else {
        println!(
            "✗ {} ({}): {}",
            outcome.mode,
            outcome.date,
            outcome.error.as_deref().unwrap_or("unknown error")
        );
    }
}

pub async fn cmd_expire_subscriptions(config: Config) -> anyhow::Result<()> {
    let state = SharedState::new(config).await?;
    let expired = state.access.expire_old().await?;
    println!("Expired {expired} subscription(s)");
    Ok(())
}
