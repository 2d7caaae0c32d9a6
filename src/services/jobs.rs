//! Bodies of the background jobs. Each returns a JSON summary of what it did;
//! scheduling, overlap guarding and logging live in [`super::scheduler`].

use anyhow::Result;
use rand::seq::IndexedRandom;
use serde_json::{Value, json};
use tracing::info;

use crate::domain::events::NotificationEvent;
use crate::domain::{JobName, now_millis};
use crate::state::SharedState;

pub async fn execute(state: &SharedState, job: JobName) -> Result<Value> {
    match job {
        JobName::RotateFreeMovie => rotate_free_movie(state).await,
        JobName::TrialExpiry => {
            let run = state.notifications.check_trial_expiry(now_millis()).await?;
            Ok(serde_json::to_value(run)?)
        }
        JobName::MatchReminders => {
            let run = state.notifications.send_match_reminders(now_millis()).await?;
            Ok(serde_json::to_value(run)?)
        }
        JobName::ExpireSubscriptions => {
            let expired = state.access.expire_old().await?;
            Ok(json!({ "expired": expired }))
        }
        JobName::SyncFixtures => {
            let outcomes = state.fixtures.sync_all_days().await?;
            Ok(serde_json::to_value(outcomes)?)
        }
    }
}

/// Puts a random published movie into `free_movie_of_week`.
async fn rotate_free_movie(state: &SharedState) -> Result<Value> {
    let published = state.store.movies().published_slugs().await?;
    let Some((slug, title)) = published.choose(&mut rand::rng()).cloned() else {
        info!("No published movies to feature");
        return Ok(json!({ "rotated": false }));
    };

    state.store.settings().set_free_movie(&slug).await?;
    info!(slug = %slug, title = %title, "Free movie of the week rotated");
    let _ = state.event_bus.send(NotificationEvent::FreeMovieRotated {
        slug: slug.clone(),
        title: title.clone(),
    });

    Ok(json!({ "rotated": true, "slug": slug, "title": title }))
}
