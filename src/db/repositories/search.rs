use crate::domain::{SearchItemType, now_millis};
use crate::entities::{prelude::*, search_events};
use anyhow::Result;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};

pub use search_events::Model as SearchEvent;

pub struct SearchRepository {
    conn: DatabaseConnection,
}

impl SearchRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn insert(
        &self,
        query: &str,
        results_count: i32,
        device_id: Option<String>,
    ) -> Result<i32> {
        let model = search_events::ActiveModel {
            query: Set(query.to_string()),
            query_lower: Set(query.to_lowercase()),
            results_count: Set(results_count),
            has_results: Set(results_count > 0),
            device_id: Set(device_id),
            created_at: Set(now_millis()),
            ..Default::default()
        }
        .insert(&self.conn)
        .await?;
        Ok(model.id)
    }

    pub async fn set_click(&self, id: i32, item: &str, kind: SearchItemType) -> Result<bool> {
        let result = SearchEvents::update_many()
            .col_expr(search_events::Column::ClickedItem, Expr::value(item))
            .col_expr(search_events::Column::ClickedType, Expr::value(kind.as_str()))
            .filter(search_events::Column::Id.eq(id))
            .exec(&self.conn)
            .await?;
        Ok(result.rows_affected > 0)
    }

    /// Every event at or after `since`, oldest first.
    pub async fn since(&self, since: i64) -> Result<Vec<SearchEvent>> {
        Ok(SearchEvents::find()
            .filter(search_events::Column::CreatedAt.gte(since))
            .order_by_asc(search_events::Column::CreatedAt)
            .all(&self.conn)
            .await?)
    }

    pub async fn recent(&self, limit: u64) -> Result<Vec<SearchEvent>> {
        Ok(SearchEvents::find()
            .order_by_desc(search_events::Column::CreatedAt)
            .limit(limit)
            .all(&self.conn)
            .await?)
    }
}
