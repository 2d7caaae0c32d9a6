use crate::db::Store;
use crate::domain::events::NotificationEvent;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::error;

/// Persists bus events into `system_logs`.
pub struct LogService {
    store: Store,
    event_bus: broadcast::Sender<NotificationEvent>,
}

impl LogService {
    #[must_use]
    pub const fn new(store: Store, event_bus: broadcast::Sender<NotificationEvent>) -> Self {
        Self { store, event_bus }
    }

    pub fn start_listener(self: Arc<Self>) {
        let mut rx = self.event_bus.subscribe();
        let service = self;

        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(event) => {
                        if let Err(e) = service.handle_event(event).await {
                            error!(error = %e, "Failed to save log");
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(count)) => {
                        error!(count, "Log listener lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        error!("Log listener event bus closed");
                        break;
                    }
                }
            }
        });
    }

    async fn handle_event(&self, event: NotificationEvent) -> anyhow::Result<()> {
        let Some((level, message)) = describe(&event) else {
            return Ok(());
        };
        let details = serde_json::to_string(&event)?;

        self.store
            .logs()
            .add(event.kind(), level, &message, Some(details))
            .await
    }
}

/// Level and message for events worth keeping. `None` skips the event.
fn describe(event: &NotificationEvent) -> Option<(&'static str, String)> {
    let entry = match event {
        NotificationEvent::MovieCreated { title, .. } => ("info", format!("Movie added: {title}")),
        NotificationEvent::SeriesCreated { title, .. } => ("info", format!("Series added: {title}")),
        NotificationEvent::MatchCreated { title, .. } => ("info", format!("Match added: {title}")),
        NotificationEvent::MatchStatusChanged { ids, status } => (
            "info",
            format!("{} match(es) set to {status}", ids.len()),
        ),
        NotificationEvent::SettingsUpdated => ("info", "Site settings updated".to_string()),
        NotificationEvent::FreeMovieRotated { title, .. } => {
            ("info", format!("Free movie of the week: {title}"))
        }
        NotificationEvent::PaymentCompleted {
            order_id, amount, ..
        } => ("success", format!("Payment {order_id} completed ({amount:.2})")),
        NotificationEvent::PaymentFailed { order_id, reason } => (
            "warn",
            format!(
                "Payment {order_id} failed: {}",
                reason.as_deref().unwrap_or("no reason given")
            ),
        ),
        NotificationEvent::SubscriptionCreated { user_id, plan, .. } => {
            ("success", format!("Subscription {plan} created for user {user_id}"))
        }
        NotificationEvent::SubscriptionRevoked { id } => {
            ("warn", format!("Subscription {id} revoked"))
        }
        NotificationEvent::CodeRedeemed { code, user_id, plan } => {
            ("success", format!("Code {code} redeemed by user {user_id} ({plan})"))
        }
        NotificationEvent::DevicesCleared { scope, deleted } => {
            ("warn", format!("Cleared {deleted} device(s) ({scope})"))
        }
        NotificationEvent::PushBroadcastFinished {
            audience,
            sent,
            failed,
            ..
        } => (
            if *failed > 0 { "warn" } else { "success" },
            format!("Push to {audience}: {sent} sent, {failed} failed"),
        ),
        NotificationEvent::FixturesSynced {
            mode,
            ok,
            imported,
            updated,
            ..
        } => (
            if *ok { "success" } else { "error" },
            format!("Fixture sync ({mode}): {imported} new, {updated} updated"),
        ),
        NotificationEvent::JobFinished { job, ok: false, .. } => {
            ("error", format!("Job {job} failed"))
        }
        NotificationEvent::Error { message } => ("error", message.clone()),
        NotificationEvent::Info { message } => ("info", message.clone()),

        NotificationEvent::MovieUpdated { .. }
        | NotificationEvent::SeriesUpdated { .. }
        | NotificationEvent::MatchUpdated { .. }
        | NotificationEvent::PpvUnlocked { .. }
        | NotificationEvent::JobStarted { .. }
        | NotificationEvent::JobFinished { .. } => return None,
    };
    Some(entry)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_noisy_events_are_skipped() {
        assert!(describe(&NotificationEvent::JobStarted {
            job: "match_reminders".into()
        })
        .is_none());
        assert!(describe(&NotificationEvent::JobFinished {
            job: "match_reminders".into(),
            duration_ms: 3,
            ok: true,
        })
        .is_none());
    }

    #[test]
    fn test_failed_job_is_logged_as_error() {
        let (level, message) = describe(&NotificationEvent::JobFinished {
            job: "sync_fixtures".into(),
            duration_ms: 10,
            ok: false,
        })
        .unwrap();
        assert_eq!(level, "error");
        assert!(message.contains("sync_fixtures"));
    }
}
