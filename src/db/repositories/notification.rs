use crate::domain::now_millis;
use crate::entities::notification_preferences::Entity as PreferencesEntity;
use crate::entities::prelude::{MatchReminders, NotificationLogs};
use crate::entities::{match_reminders, notification_logs, notification_preferences};
use anyhow::Result;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use serde::{Deserialize, Serialize};

pub use match_reminders::Model as MatchReminder;
pub use notification_logs::Model as NotificationLog;
pub use notification_preferences::Model as NotificationPreferences;

pub const DEFAULT_REMINDER_MINUTES: i32 = 15;

pub struct NotificationRepository {
    conn: DatabaseConnection,
}

impl NotificationRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    // ========================================================================
    // Preferences
    // ========================================================================

    pub async fn preferences(&self, device_id: &str) -> Result<Option<NotificationPreferences>> {
        Ok(PreferencesEntity::find()
            .filter(notification_preferences::Column::DeviceId.eq(device_id))
            .one(&self.conn)
            .await?)
    }

    pub async fn preferences_for_devices(
        &self,
        device_ids: &[String],
    ) -> Result<Vec<NotificationPreferences>> {
        if device_ids.is_empty() {
            return Ok(Vec::new());
        }
        Ok(PreferencesEntity::find()
            .filter(notification_preferences::Column::DeviceId.is_in(device_ids.iter().cloned()))
            .all(&self.conn)
            .await?)
    }

    /// Devices that turned new-release notifications off.
    pub async fn devices_without_new_releases(&self) -> Result<Vec<String>> {
        Ok(PreferencesEntity::find()
            .select_only()
            .column(notification_preferences::Column::DeviceId)
            .filter(notification_preferences::Column::NewReleases.eq(false))
            .into_tuple()
            .all(&self.conn)
            .await?)
    }

    pub async fn update_preferences(
        &self,
        device_id: &str,
        patch: PreferencesPatch,
    ) -> Result<NotificationPreferences> {
        let existing = self.preferences(device_id).await?;
        let now = now_millis();

        let model = if let Some(existing) = existing {
            let mut active: notification_preferences::ActiveModel = existing.into();
            if let Some(v) = patch.match_reminders {
                active.match_reminders = Set(v);
            }
            if let Some(v) = patch.new_releases {
                active.new_releases = Set(v);
            }
            if let Some(v) = patch.promotions {
                active.promotions = Set(v);
            }
            if let Some(v) = patch.content_requests {
                active.content_requests = Set(v);
            }
            if let Some(v) = patch.reminder_minutes_before {
                active.reminder_minutes_before = Set(v);
            }
            active.updated_at = Set(now);
            active.update(&self.conn).await?
        } else {
            notification_preferences::ActiveModel {
                device_id: Set(device_id.to_string()),
                match_reminders: Set(patch.match_reminders.unwrap_or(true)),
                new_releases: Set(patch.new_releases.unwrap_or(true)),
                promotions: Set(patch.promotions.unwrap_or(true)),
                content_requests: Set(patch.content_requests.unwrap_or(true)),
                reminder_minutes_before: Set(patch
                    .reminder_minutes_before
                    .unwrap_or(DEFAULT_REMINDER_MINUTES)),
                updated_at: Set(now),
                ..Default::default()
            }
            .insert(&self.conn)
            .await?
        };
        Ok(model)
    }

    // ========================================================================
    // Match reminders
    // ========================================================================

    pub async fn find_reminder(
        &self,
        match_id: i32,
        device_id: &str,
    ) -> Result<Option<MatchReminder>> {
        Ok(MatchReminders::find()
            .filter(match_reminders::Column::MatchId.eq(match_id))
            .filter(match_reminders::Column::DeviceId.eq(device_id))
            .one(&self.conn)
            .await?)
    }

    pub async fn find_reminder_for_user(
        &self,
        match_id: i32,
        user_id: i32,
    ) -> Result<Option<MatchReminder>> {
        Ok(MatchReminders::find()
            .filter(match_reminders::Column::MatchId.eq(match_id))
            .filter(match_reminders::Column::UserId.eq(user_id))
            .one(&self.conn)
            .await?)
    }

    pub async fn add_reminder(
        &self,
        match_id: i32,
        user_id: Option<i32>,
        device_id: &str,
    ) -> Result<MatchReminder> {
        Ok(match_reminders::ActiveModel {
            user_id: Set(user_id),
            device_id: Set(device_id.to_string()),
            match_id: Set(match_id),
            notified: Set(false),
            created_at: Set(now_millis()),
            ..Default::default()
        }
        .insert(&self.conn)
        .await?)
    }

    pub async fn delete_reminder(&self, id: i32) -> Result<bool> {
        let result = MatchReminders::delete_by_id(id).exec(&self.conn).await?;
        Ok(result.rows_affected > 0)
    }

    pub async fn pending_reminders(&self, match_id: i32) -> Result<Vec<MatchReminder>> {
        Ok(MatchReminders::find()
            .filter(match_reminders::Column::MatchId.eq(match_id))
            .filter(match_reminders::Column::Notified.eq(false))
            .all(&self.conn)
            .await?)
    }

    pub async fn mark_notified(&self, id: i32) -> Result<()> {
        MatchReminders::update_many()
            .col_expr(match_reminders::Column::Notified, Expr::value(true))
            .filter(match_reminders::Column::Id.eq(id))
            .exec(&self.conn)
            .await?;
        Ok(())
    }

    // ========================================================================
    // Notification log
    // ========================================================================

    pub async fn log(&self, entry: NewNotificationLog) -> Result<NotificationLog> {
        Ok(notification_logs::ActiveModel {
            notification_type: Set(entry.notification_type),
            title: Set(entry.title),
            body: Set(entry.body),
            url: Set(entry.url),
            target_audience: Set(entry.target_audience),
            sent_count: Set(entry.sent_count),
            failed_count: Set(entry.failed_count),
            sent_by: Set(entry.sent_by),
            created_at: Set(now_millis()),
            ..Default::default()
        }
        .insert(&self.conn)
        .await?)
    }

    pub async fn history(&self, limit: u64) -> Result<Vec<NotificationLog>> {
        Ok(NotificationLogs::find()
            .order_by_desc(notification_logs::Column::CreatedAt)
            .limit(limit)
            .all(&self.conn)
            .await?)
    }
}

// ============================================================================
// Data Types
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PreferencesPatch {
    pub match_reminders: Option<bool>,
    pub new_releases: Option<bool>,
    pub promotions: Option<bool>,
    pub content_requests: Option<bool>,
    pub reminder_minutes_before: Option<i32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewNotificationLog {
    pub notification_type: String,
    pub title: String,
    pub body: String,
    pub url: Option<String>,
    pub target_audience: String,
    pub sent_count: i32,
    pub failed_count: i32,
    pub sent_by: Option<String>,
}
