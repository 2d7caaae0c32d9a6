use crate::entities::{prelude::*, system_logs};
use anyhow::Result;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};

pub use system_logs::Model as SystemLog;

pub struct LogRepository {
    conn: DatabaseConnection,
}

impl LogRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn add(
        &self,
        event_type: &str,
        level: &str,
        message: &str,
        details: Option<String>,
    ) -> Result<()> {
        let active_model = system_logs::ActiveModel {
            event_type: Set(event_type.to_string()),
            level: Set(level.to_string()),
            message: Set(message.to_string()),
            details: Set(details),
            ..Default::default()
        };

        SystemLogs::insert(active_model).exec(&self.conn).await?;
        Ok(())
    }

    /// Newest first. Returns the page and the total page count.
    pub async fn page(
        &self,
        page: u64,
        page_size: u64,
        filter: &LogFilter,
    ) -> Result<(Vec<SystemLog>, u64)> {
        let mut query = SystemLogs::find().order_by_desc(system_logs::Column::CreatedAt);

        if let Some(level) = &filter.level {
            query = query.filter(system_logs::Column::Level.eq(level.as_str()));
        }
        if let Some(event_type) = &filter.event_type {
            query = query.filter(system_logs::Column::EventType.contains(event_type.as_str()));
        }
        if let Some(start) = &filter.start_date {
            query = query.filter(system_logs::Column::CreatedAt.gte(start.as_str()));
        }
        if let Some(end) = &filter.end_date {
            query = query.filter(system_logs::Column::CreatedAt.lte(end.as_str()));
        }

        let paginator = query.paginate(&self.conn, page_size);
        let total_pages = paginator.num_pages().await?;
        let items = paginator.fetch_page(page.saturating_sub(1)).await?;

        Ok((items, total_pages))
    }

    pub async fn clear(&self) -> Result<u64> {
        let result = SystemLogs::delete_many().exec(&self.conn).await?;
        Ok(result.rows_affected)
    }
}

#[derive(Debug, Clone, Default)]
pub struct LogFilter {
    pub level: Option<String>,
    pub event_type: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}
