use crate::domain::now_millis;
use crate::entities::{devices, prelude::*, users};
use anyhow::{Context, Result};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};

pub use devices::Model as Device;
pub use users::Model as Viewer;

/// Viewers and the devices that identify them.
pub struct ViewerRepository {
    conn: DatabaseConnection,
}

impl ViewerRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    // ========================================================================
    // Viewers
    // ========================================================================

    pub async fn get(&self, id: i32) -> Result<Option<Viewer>> {
        Ok(Users::find_by_id(id).one(&self.conn).await?)
    }

    pub async fn list_all(&self) -> Result<Vec<Viewer>> {
        Ok(Users::find()
            .order_by_asc(users::Column::Id)
            .all(&self.conn)
            .await?)
    }

    /// Viewers that ever had a trial.
    pub async fn list_with_trial(&self) -> Result<Vec<Viewer>> {
        Ok(Users::find()
            .filter(users::Column::TrialExpiresAt.is_not_null())
            .all(&self.conn)
            .await?)
    }

    /// Creates a viewer together with its first device.
    pub async fn create_with_device(
        &self,
        device_id: &str,
        user_agent: Option<&str>,
        trial_expires_at: Option<i64>,
    ) -> Result<(Viewer, Device)> {
        let now = now_millis();
        let txn = self.conn.begin().await?;

        let viewer = users::ActiveModel {
            trial_expires_at: Set(trial_expires_at),
            created_at: Set(now),
            last_seen_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .context("Failed to create viewer")?;

        let device = devices::ActiveModel {
            device_id: Set(device_id.to_string()),
            user_id: Set(viewer.id),
            user_agent: Set(user_agent.map(str::to_string)),
            last_seen_at: Set(now),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .context("Failed to register first device")?;

        txn.commit().await?;
        Ok((viewer, device))
    }

    pub async fn touch(&self, user_id: i32) -> Result<()> {
        Users::update_many()
            .col_expr(users::Column::LastSeenAt, Expr::value(now_millis()))
            .filter(users::Column::Id.eq(user_id))
            .exec(&self.conn)
            .await?;
        Ok(())
    }

    // ========================================================================
    // Devices
    // ========================================================================

    pub async fn find_device(&self, device_id: &str) -> Result<Option<Device>> {
        Ok(Devices::find()
            .filter(devices::Column::DeviceId.eq(device_id))
            .one(&self.conn)
            .await?)
    }

    pub async fn devices_for_user(&self, user_id: i32) -> Result<Vec<Device>> {
        Ok(Devices::find()
            .filter(devices::Column::UserId.eq(user_id))
            .order_by_desc(devices::Column::LastSeenAt)
            .all(&self.conn)
            .await?)
    }

    pub async fn devices_for_users(&self, user_ids: &[i32]) -> Result<Vec<Device>> {
        if user_ids.is_empty() {
            return Ok(Vec::new());
        }
        Ok(Devices::find()
            .filter(devices::Column::UserId.is_in(user_ids.iter().copied()))
            .all(&self.conn)
            .await?)
    }

    pub async fn count_devices(&self, user_id: i32) -> Result<u64> {
        Ok(Devices::find()
            .filter(devices::Column::UserId.eq(user_id))
            .count(&self.conn)
            .await?)
    }

    pub async fn insert_device(
        &self,
        user_id: i32,
        device_id: &str,
        user_agent: Option<&str>,
    ) -> Result<Device> {
        let now = now_millis();
        Ok(devices::ActiveModel {
            device_id: Set(device_id.to_string()),
            user_id: Set(user_id),
            user_agent: Set(user_agent.map(str::to_string)),
            last_seen_at: Set(now),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(&self.conn)
        .await?)
    }

    pub async fn touch_device(&self, device: Device, user_agent: Option<&str>) -> Result<Device> {
        let mut active: devices::ActiveModel = device.into();
        active.last_seen_at = Set(now_millis());
        if let Some(ua) = user_agent {
            active.user_agent = Set(Some(ua.to_string()));
        }
        Ok(active.update(&self.conn).await?)
    }

    /// Moves a device to another viewer.
    pub async fn reassign_device(&self, device: Device, user_id: i32) -> Result<Device> {
        let mut active: devices::ActiveModel = device.into();
        active.user_id = Set(user_id);
        active.last_seen_at = Set(now_millis());
        Ok(active.update(&self.conn).await?)
    }

    pub async fn delete_device(&self, device_id: &str) -> Result<u64> {
        let result = Devices::delete_many()
            .filter(devices::Column::DeviceId.eq(device_id))
            .exec(&self.conn)
            .await?;
        Ok(result.rows_affected)
    }

    pub async fn delete_devices_for_user(&self, user_id: i32) -> Result<u64> {
        let result = Devices::delete_many()
            .filter(devices::Column::UserId.eq(user_id))
            .exec(&self.conn)
            .await?;
        Ok(result.rows_affected)
    }

    pub async fn delete_all_devices(&self) -> Result<u64> {
        let result = Devices::delete_many().exec(&self.conn).await?;
        Ok(result.rows_affected)
    }
}
