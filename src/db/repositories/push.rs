use crate::domain::now_millis;
use crate::entities::{prelude::*, push_subscriptions};
use anyhow::Result;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::Deserialize;

pub use push_subscriptions::Model as PushSubscription;

pub struct PushRepository {
    conn: DatabaseConnection,
}

impl PushRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Upsert by endpoint. Saving again reactivates the row and clears its failures.
    pub async fn save(&self, input: SavePushSubscription) -> Result<PushSubscription> {
        let existing = PushSubscriptions::find()
            .filter(push_subscriptions::Column::Endpoint.eq(input.endpoint.as_str()))
            .one(&self.conn)
            .await?;

        let model = if let Some(existing) = existing {
            let mut active: push_subscriptions::ActiveModel = existing.into();
            active.user_id = Set(input.user_id);
            active.device_id = Set(input.device_id);
            active.p256dh = Set(input.p256dh);
            active.auth = Set(input.auth);
            active.user_agent = Set(input.user_agent);
            active.is_active = Set(true);
            active.fail_count = Set(0);
            active.update(&self.conn).await?
        } else {
            push_subscriptions::ActiveModel {
                user_id: Set(input.user_id),
                device_id: Set(input.device_id),
                endpoint: Set(input.endpoint),
                p256dh: Set(input.p256dh),
                auth: Set(input.auth),
                user_agent: Set(input.user_agent),
                is_active: Set(true),
                fail_count: Set(0),
                created_at: Set(now_millis()),
                ..Default::default()
            }
            .insert(&self.conn)
            .await?
        };
        Ok(model)
    }

    pub async fn delete_by_endpoint(&self, endpoint: &str) -> Result<bool> {
        let result = PushSubscriptions::delete_many()
            .filter(push_subscriptions::Column::Endpoint.eq(endpoint))
            .exec(&self.conn)
            .await?;
        Ok(result.rows_affected > 0)
    }

    pub async fn mark_inactive(&self, id: i32) -> Result<bool> {
        let result = PushSubscriptions::update_many()
            .col_expr(push_subscriptions::Column::IsActive, Expr::value(false))
            .filter(push_subscriptions::Column::Id.eq(id))
            .exec(&self.conn)
            .await?;
        Ok(result.rows_affected > 0)
    }

    pub async fn record_failure(&self, id: i32) -> Result<()> {
        PushSubscriptions::update_many()
            .col_expr(
                push_subscriptions::Column::FailCount,
                Expr::col(push_subscriptions::Column::FailCount).add(1),
            )
            .filter(push_subscriptions::Column::Id.eq(id))
            .exec(&self.conn)
            .await?;
        Ok(())
    }

    pub async fn record_delivery(&self, id: i32) -> Result<()> {
        PushSubscriptions::update_many()
            .col_expr(
                push_subscriptions::Column::LastUsedAt,
                Expr::value(now_millis()),
            )
            .filter(push_subscriptions::Column::Id.eq(id))
            .exec(&self.conn)
            .await?;
        Ok(())
    }

    pub async fn for_user(&self, user_id: i32) -> Result<Vec<PushSubscription>> {
        Ok(PushSubscriptions::find()
            .filter(push_subscriptions::Column::UserId.eq(user_id))
            .filter(push_subscriptions::Column::IsActive.eq(true))
            .all(&self.conn)
            .await?)
    }

    pub async fn for_users(&self, user_ids: &[i32]) -> Result<Vec<PushSubscription>> {
        if user_ids.is_empty() {
            return Ok(Vec::new());
        }
        Ok(PushSubscriptions::find()
            .filter(push_subscriptions::Column::UserId.is_in(user_ids.iter().copied()))
            .filter(push_subscriptions::Column::IsActive.eq(true))
            .all(&self.conn)
            .await?)
    }

    pub async fn for_devices(&self, device_ids: &[String]) -> Result<Vec<PushSubscription>> {
        if device_ids.is_empty() {
            return Ok(Vec::new());
        }
        Ok(PushSubscriptions::find()
            .filter(push_subscriptions::Column::DeviceId.is_in(device_ids.iter().cloned()))
            .filter(push_subscriptions::Column::IsActive.eq(true))
            .all(&self.conn)
            .await?)
    }

    pub async fn all_active(&self) -> Result<Vec<PushSubscription>> {
        Ok(PushSubscriptions::find()
            .filter(push_subscriptions::Column::IsActive.eq(true))
            .order_by_asc(push_subscriptions::Column::Id)
            .all(&self.conn)
            .await?)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SavePushSubscription {
    pub endpoint: String,
    pub p256dh: String,
    pub auth: String,
    #[serde(default)]
    pub user_id: Option<i32>,
    #[serde(default)]
    pub device_id: Option<String>,
    #[serde(default)]
    pub user_agent: Option<String>,
}
