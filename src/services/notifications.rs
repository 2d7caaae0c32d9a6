//! Notification preferences, match reminders and targeted broadcasts.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{debug, info};

use crate::constants::reminders::{WINDOW_END_MINUTES, WINDOW_START_MINUTES};
use crate::constants::time::{MILLIS_PER_DAY, MILLIS_PER_MINUTE};
use crate::db::Store;
use crate::db::repositories::notification::{
    DEFAULT_REMINDER_MINUTES, NewNotificationLog, NotificationLog, NotificationPreferences,
    PreferencesPatch,
};
use crate::db::repositories::push::PushSubscription;
use crate::domain::events::NotificationEvent;
use crate::domain::{Audience, ReleaseKind, now_millis};
use crate::services::push::{DeliveryReport, PushError, PushService};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PreferencesView {
    pub device_id: String,
    pub match_reminders: bool,
    pub new_releases: bool,
    pub promotions: bool,
    pub content_requests: bool,
    pub reminder_minutes_before: i32,
}

impl PreferencesView {
    fn defaults(device_id: &str) -> Self {
        Self {
            device_id: device_id.to_string(),
            match_reminders: true,
            new_releases: true,
            promotions: true,
            content_requests: true,
            reminder_minutes_before: DEFAULT_REMINDER_MINUTES,
        }
    }
}

impl From<NotificationPreferences> for PreferencesView {
    fn from(p: NotificationPreferences) -> Self {
        Self {
            device_id: p.device_id,
            match_reminders: p.match_reminders,
            new_releases: p.new_releases,
            promotions: p.promotions,
            content_requests: p.content_requests,
            reminder_minutes_before: p.reminder_minutes_before,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReminderToggle {
    Added,
    Removed,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BroadcastRequest {
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_audience")]
    pub audience: Audience,
    #[serde(default)]
    pub sent_by: Option<String>,
}

const fn default_audience() -> Audience {
    Audience::All
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReminderRun {
    pub matches: usize,
    pub reminders: usize,
    pub sent: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TrialRun {
    pub scanned: usize,
    pub reminded: usize,
    pub expired: usize,
}

/// Whether a viewer falls in `audience`.
#[must_use]
pub const fn in_audience(audience: Audience, is_premium: bool, trial_active: bool) -> bool {
    match audience {
        Audience::All => true,
        Audience::Premium => is_premium,
        Audience::Trial => trial_active && !is_premium,
        Audience::Free => !is_premium && !trial_active,
    }
}

/// Which trial message, if any, applies with `days_left` remaining.
#[must_use]
pub fn trial_message(days_left: f64) -> Option<(&'static str, &'static str)> {
    if days_left > 1.5 && days_left < 2.5 {
        Some((
            "🔥 3 days left!",
            "Don't lose your Premium access. Lock in $1.50/week now!",
        ))
    } else if days_left > -1.0 && days_left < 0.0 {
        Some((
            "❌ Trial ended",
            "Unlock full access (Live Matches + Movies) for just $0.25!",
        ))
    } else {
        None
    }
}

#[must_use]
pub fn release_message(kind: ReleaseKind, title: &str, slug: &str) -> (String, String, String) {
    let (heading, path) = match kind {
        ReleaseKind::Movie => ("🎬 Film Cusub!", "movies"),
        ReleaseKind::Series => ("📺 Musalsal Cusub!", "series"),
    };
    (
        heading.to_string(),
        format!("{title} hadda waa diyaar. Daawo hadda!"),
        format!("/{path}/{slug}"),
    )
}

pub struct NotificationService {
    store: Store,
    push: Arc<PushService>,
    event_bus: broadcast::Sender<NotificationEvent>,
}

impl NotificationService {
    #[must_use]
    pub const fn new(
        store: Store,
        push: Arc<PushService>,
        event_bus: broadcast::Sender<NotificationEvent>,
    ) -> Self {
        Self {
            store,
            push,
            event_bus,
        }
    }

    // ========================================================================
    // Preferences
    // ========================================================================

    pub async fn preferences(&self, device_id: &str) -> Result<PreferencesView, PushError> {
        Ok(self
            .store
            .notifications()
            .preferences(device_id)
            .await?
            .map_or_else(|| PreferencesView::defaults(device_id), PreferencesView::from))
    }

    pub async fn update_preferences(
        &self,
        device_id: &str,
        patch: PreferencesPatch,
    ) -> Result<PreferencesView, PushError> {
        if device_id.trim().is_empty() {
            return Err(PushError::Validation("device_id is required".to_string()));
        }
        if let Some(minutes) = patch.reminder_minutes_before
            && !(1..=120).contains(&minutes)
        {
            return Err(PushError::Validation(
                "reminder_minutes_before must be between 1 and 120".to_string(),
            ));
        }
        let saved = self
            .store
            .notifications()
            .update_preferences(device_id, patch)
            .await?;
        Ok(saved.into())
    }

    // ========================================================================
    // Match reminders
    // ========================================================================

    pub async fn toggle_reminder(
        &self,
        match_id: i32,
        user_id: Option<i32>,
        device_id: &str,
    ) -> Result<ReminderToggle, PushError> {
        if self.store.matches().get(match_id).await?.is_none() {
            return Err(PushError::NotFound(format!("Match {match_id}")));
        }

        let repo = self.store.notifications();
        let existing = match user_id {
            Some(user_id) => repo.find_reminder_for_user(match_id, user_id).await?,
            None => None,
        };
        let existing = match existing {
            Some(r) => Some(r),
            None => repo.find_reminder(match_id, device_id).await?,
        };

        if let Some(reminder) = existing {
            repo.delete_reminder(reminder.id).await?;
            return Ok(ReminderToggle::Removed);
        }

        repo.add_reminder(match_id, user_id, device_id).await?;
        Ok(ReminderToggle::Added)
    }

    pub async fn reminder_status(
        &self,
        match_id: i32,
        user_id: Option<i32>,
        device_id: Option<&str>,
    ) -> Result<bool, PushError> {
        let repo = self.store.notifications();
        if let Some(user_id) = user_id
            && repo.find_reminder_for_user(match_id, user_id).await?.is_some()
        {
            return Ok(true);
        }
        if let Some(device_id) = device_id {
            return Ok(repo.find_reminder(match_id, device_id).await?.is_some());
        }
        Ok(false)
    }

    /// Push reminders for upcoming matches kicking off in the reminder window.
    pub async fn send_match_reminders(&self, now: i64) -> Result<ReminderRun, PushError> {
        let from = now + WINDOW_START_MINUTES * MILLIS_PER_MINUTE;
        let to = now + WINDOW_END_MINUTES * MILLIS_PER_MINUTE;
        let matches = self.store.matches().upcoming_between(from, to).await?;

        let repo = self.store.notifications();
        let mut run = ReminderRun {
            matches: matches.len(),
            ..ReminderRun::default()
        };
        if !self.push.is_enabled().await {
            // Keep reminders pending until push is switched back on.
            debug!(matches = run.matches, "Push disabled, match reminders left pending");
            return Ok(run);
        }

        for m in matches {
            let reminders = repo.pending_reminders(m.id).await?;
            if reminders.is_empty() {
                continue;
            }

            let device_ids: Vec<String> = reminders.iter().map(|r| r.device_id.clone()).collect();
            let muted: HashSet<String> = repo
                .preferences_for_devices(&device_ids)
                .await?
                .into_iter()
                .filter(|p| !p.match_reminders)
                .map(|p| p.device_id)
                .collect();

            let payload = self
                .push
                .payload(
                    "⚽ Ciyaarta waa bilaabanaysaa!",
                    &format!("{} vs {} - 15 daqiiqo kadib!", m.team_a, m.team_b),
                    Some(&format!("/match/{}", m.slug)),
                )
                .await;

            for reminder in reminders {
                if muted.contains(&reminder.device_id) {
                    continue;
                }
                let targets = match reminder.user_id {
                    Some(user_id) => self.store.push().for_user(user_id).await?,
                    None => {
                        self.store
                            .push()
                            .for_devices(std::slice::from_ref(&reminder.device_id))
                            .await?
                    }
                };
                let report = self.push.send_batch(targets, &payload).await?;
                run.reminders += 1;
                run.sent += report.sent;
                repo.mark_notified(reminder.id).await?;
            }
        }

        if run.reminders > 0 {
            info!(
                matches = run.matches,
                reminders = run.reminders,
                sent = run.sent,
                "Match reminders sent"
            );
        }
        Ok(run)
    }

    /// Full scan of viewers with a trial; acceptable at current scale.
    pub async fn check_trial_expiry(&self, now: i64) -> Result<TrialRun, PushError> {
        let viewers = self.store.viewers().list_with_trial().await?;
        let premium: HashSet<i32> = self
            .store
            .subscriptions()
            .all_active(now)
            .await?
            .into_iter()
            .map(|s| s.user_id)
            .collect();

        let mut run = TrialRun {
            scanned: viewers.len(),
            ..TrialRun::default()
        };

        for viewer in viewers {
            let Some(trial_end) = viewer.trial_expires_at else {
                continue;
            };
            if premium.contains(&viewer.id) {
                continue;
            }

            #[allow(clippy::cast_precision_loss)]
            let days_left = (trial_end - now) as f64 / MILLIS_PER_DAY as f64;
            let Some((title, body)) = trial_message(days_left) else {
                continue;
            };

            let payload = self.push.payload(title, body, Some("/pricing")).await;
            self.push.send_to_user(viewer.id, &payload).await?;
            if days_left < 0.0 {
                run.expired += 1;
            } else {
                run.reminded += 1;
            }
        }

        debug!(?run, "Trial expiry scan finished");
        Ok(run)
    }

    // ========================================================================
    // Broadcasts
    // ========================================================================

    async fn audience_subscriptions(
        &self,
        audience: Audience,
    ) -> Result<Vec<PushSubscription>, PushError> {
        let now = now_millis();
        let viewers = self.store.viewers().list_all().await?;
        let premium: HashSet<i32> = self
            .store
            .subscriptions()
            .all_active(now)
            .await?
            .into_iter()
            .map(|s| s.user_id)
            .collect();

        let targeted: Vec<i32> = viewers
            .iter()
            .filter(|v| {
                let trial_active = v.trial_expires_at.is_some_and(|t| t > now);
                in_audience(audience, premium.contains(&v.id), trial_active)
            })
            .map(|v| v.id)
            .collect();

        let devices = self.store.viewers().devices_for_users(&targeted).await?;
        let device_ids: Vec<String> = devices.iter().map(|d| d.device_id.clone()).collect();
        let prefs: HashMap<String, bool> = self
            .store
            .notifications()
            .preferences_for_devices(&device_ids)
            .await?
            .into_iter()
            .map(|p| (p.device_id, p.promotions))
            .collect();

        let eligible: HashSet<i32> = devices
            .iter()
            .filter(|d| prefs.get(&d.device_id).copied().unwrap_or(true))
            .map(|d| d.user_id)
            .collect();
        let eligible: Vec<i32> = eligible.into_iter().collect();

        Ok(self.store.push().for_users(&eligible).await?)
    }

    pub async fn broadcast(&self, request: BroadcastRequest) -> Result<DeliveryReport, PushError> {
        if request.title.trim().is_empty() || request.body.trim().is_empty() {
            return Err(PushError::Validation(
                "title and body are required".to_string(),
            ));
        }

        let subscriptions = self.audience_subscriptions(request.audience).await?;
        let payload = self
            .push
            .payload(&request.title, &request.body, request.url.as_deref())
            .await;
        let report = self.push.send_batch(subscriptions, &payload).await?;

        self.log(
            "broadcast",
            &payload,
            request.audience.as_str(),
            report,
            request.sent_by,
        )
        .await?;

        info!(
            audience = %request.audience,
            sent = report.sent,
            failed = report.failed,
            "Broadcast finished"
        );
        let _ = self.event_bus.send(NotificationEvent::PushBroadcastFinished {
            audience: request.audience.as_str().to_string(),
            sent: report.sent,
            failed: report.failed,
            deactivated: report.deactivated,
        });
        Ok(report)
    }

    /// Announce a new movie or series to devices that did not opt out.
    pub async fn notify_new_release(
        &self,
        kind: ReleaseKind,
        title: &str,
        slug: &str,
    ) -> Result<DeliveryReport, PushError> {
        let muted: HashSet<String> = self
            .store
            .notifications()
            .devices_without_new_releases()
            .await?
            .into_iter()
            .collect();

        let subscriptions: Vec<PushSubscription> = self
            .push
            .all_active()
            .await?
            .into_iter()
            .filter(|s| s.device_id.as_ref().is_none_or(|d| !muted.contains(d)))
            .collect();

        let (heading, body, url) = release_message(kind, title, slug);
        let payload = self.push.payload(&heading, &body, Some(&url)).await;
        let report = self.push.send_batch(subscriptions, &payload).await?;

        self.log("new_release", &payload, "all", report, None).await?;
        Ok(report)
    }

    pub async fn history(&self, limit: u64) -> Result<Vec<NotificationLog>, PushError> {
        Ok(self.store.notifications().history(limit).await?)
    }

    async fn log(
        &self,
        kind: &str,
        payload: &crate::services::push::PushPayload,
        audience: &str,
        report: DeliveryReport,
        sent_by: Option<String>,
    ) -> Result<(), PushError> {
        self.store
            .notifications()
            .log(NewNotificationLog {
                notification_type: kind.to_string(),
                title: payload.title.clone(),
                body: payload.body.clone(),
                url: payload.url.clone(),
                target_audience: audience.to_string(),
                sent_count: i32::try_from(report.sent).unwrap_or(i32::MAX),
                failed_count: i32::try_from(report.failed).unwrap_or(i32::MAX),
                sent_by,
            })
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audience_partition() {
        for (premium, trial) in [(true, true), (true, false), (false, true), (false, false)] {
            assert!(in_audience(Audience::All, premium, trial));
            let buckets = [Audience::Premium, Audience::Trial, Audience::Free]
                .into_iter()
                .filter(|a| in_audience(*a, premium, trial))
                .count();
            assert_eq!(buckets, 1, "premium={premium} trial={trial}");
        }
    }

    #[test]
    fn test_trial_thresholds() {
        assert_eq!(trial_message(2.0).map(|m| m.0), Some("🔥 3 days left!"));
        assert_eq!(trial_message(-0.5).map(|m| m.0), Some("❌ Trial ended"));
        assert!(trial_message(1.5).is_none());
        assert!(trial_message(2.5).is_none());
        assert!(trial_message(0.0).is_none());
        assert!(trial_message(-1.0).is_none());
        assert!(trial_message(5.0).is_none());
    }

    #[test]
    fn test_release_message() {
        let (title, body, url) = release_message(ReleaseKind::Series, "Dirilis", "dirilis");
        assert_eq!(title, "📺 Musalsal Cusub!");
        assert_eq!(body, "Dirilis hadda waa diyaar. Daawo hadda!");
        assert_eq!(url, "/series/dirilis");
        assert_eq!(release_message(ReleaseKind::Movie, "X", "x").2, "/movies/x");
    }
}
