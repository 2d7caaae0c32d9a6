use crate::domain::pagination::PageRequest;
use crate::domain::{Plan, SubscriptionStatus, now_millis};
use crate::entities::{prelude::*, subscriptions};
use anyhow::Result;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};

pub use subscriptions::Model as Subscription;

pub struct SubscriptionRepository {
    conn: DatabaseConnection,
}

impl SubscriptionRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn get(&self, id: i32) -> Result<Option<Subscription>> {
        Ok(Subscriptions::find_by_id(id).one(&self.conn).await?)
    }

    /// First active, unexpired subscription of the viewer.
    pub async fn active_for_user(&self, user_id: i32, now: i64) -> Result<Option<Subscription>> {
        Ok(Subscriptions::find()
            .filter(subscriptions::Column::UserId.eq(user_id))
            .filter(subscriptions::Column::Status.eq(SubscriptionStatus::Active.as_str()))
            .filter(subscriptions::Column::ExpiresAt.gt(now))
            .order_by_desc(subscriptions::Column::ExpiresAt)
            .one(&self.conn)
            .await?)
    }

    /// Active, unexpired subscription opened with `code`.
    pub async fn active_by_access_code(&self, code: &str, now: i64) -> Result<Option<Subscription>> {
        Ok(Subscriptions::find()
            .filter(subscriptions::Column::AccessCode.eq(code))
            .filter(subscriptions::Column::Status.eq(SubscriptionStatus::Active.as_str()))
            .filter(subscriptions::Column::ExpiresAt.gt(now))
            .one(&self.conn)
            .await?)
    }

    /// Revokes every active subscription opened with `code`.
    pub async fn revoke_by_access_code(&self, code: &str) -> Result<Vec<i32>> {
        let ids: Vec<i32> = Subscriptions::find()
            .select_only()
            .column(subscriptions::Column::Id)
            .filter(subscriptions::Column::AccessCode.eq(code))
            .filter(subscriptions::Column::Status.eq(SubscriptionStatus::Active.as_str()))
            .into_tuple()
            .all(&self.conn)
            .await?;
        if ids.is_empty() {
            return Ok(ids);
        }
        Subscriptions::update_many()
            .col_expr(
                subscriptions::Column::Status,
                Expr::value(SubscriptionStatus::Revoked.as_str()),
            )
            .filter(subscriptions::Column::Id.is_in(ids.iter().copied()))
            .exec(&self.conn)
            .await?;
        Ok(ids)
    }

    pub async fn all_active(&self, now: i64) -> Result<Vec<Subscription>> {
        Ok(Subscriptions::find()
            .filter(subscriptions::Column::Status.eq(SubscriptionStatus::Active.as_str()))
            .filter(subscriptions::Column::ExpiresAt.gt(now))
            .all(&self.conn)
            .await?)
    }

    pub async fn create(&self, input: NewSubscription) -> Result<Subscription> {
        Ok(subscriptions::ActiveModel {
            user_id: Set(input.user_id),
            plan: Set(input.plan.as_str().to_string()),
            status: Set(SubscriptionStatus::Active.as_str().to_string()),
            match_id: Set(input.match_id),
            expires_at: Set(input.expires_at),
            max_devices: Set(input.max_devices),
            access_code: Set(input.access_code),
            created_at: Set(now_millis()),
            ..Default::default()
        }
        .insert(&self.conn)
        .await?)
    }

    pub async fn set_status(
        &self,
        id: i32,
        status: SubscriptionStatus,
    ) -> Result<Option<Subscription>> {
        let Some(existing) = Subscriptions::find_by_id(id).one(&self.conn).await? else {
            return Ok(None);
        };
        let mut active: subscriptions::ActiveModel = existing.into();
        active.status = Set(status.as_str().to_string());
        Ok(Some(active.update(&self.conn).await?))
    }

    /// Flips active subscriptions past their expiry to `expired`.
    pub async fn expire_old(&self, now: i64) -> Result<u64> {
        let result = Subscriptions::update_many()
            .col_expr(
                subscriptions::Column::Status,
                Expr::value(SubscriptionStatus::Expired.as_str()),
            )
            .filter(subscriptions::Column::Status.eq(SubscriptionStatus::Active.as_str()))
            .filter(subscriptions::Column::ExpiresAt.lte(now))
            .exec(&self.conn)
            .await?;
        Ok(result.rows_affected)
    }

    /// Admin listing, newest first.
    pub async fn list_page(
        &self,
        request: PageRequest,
        status: Option<SubscriptionStatus>,
        search: Option<&str>,
    ) -> Result<(Vec<Subscription>, u64)> {
        let mut query = Subscriptions::find().order_by_desc(subscriptions::Column::CreatedAt);

        if let Some(status) = status {
            query = query.filter(subscriptions::Column::Status.eq(status.as_str()));
        }
        if let Some(term) = search.map(str::trim).filter(|t| !t.is_empty()) {
            let mut condition = Condition::any().add(subscriptions::Column::Plan.contains(term));
            if let Ok(user_id) = term.parse::<i32>() {
                condition = condition.add(subscriptions::Column::UserId.eq(user_id));
            }
            query = query.filter(condition);
        }

        let paginator = query.paginate(&self.conn, request.limit);
        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(request.index()).await?;
        Ok((items, total))
    }

    pub async fn count_created_since(&self, since: i64) -> Result<u64> {
        Ok(Subscriptions::find()
            .filter(subscriptions::Column::CreatedAt.gte(since))
            .count(&self.conn)
            .await?)
    }
}

#[derive(Debug, Clone)]
pub struct NewSubscription {
    pub user_id: i32,
    pub plan: Plan,
    pub match_id: Option<i32>,
    pub expires_at: i64,
    pub max_devices: i32,
    pub access_code: Option<String>,
}
