use sea_orm::entity::prelude::*;
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "search_events")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub query: String,
    #[sea_orm(indexed)]
    pub query_lower: String,
    pub results_count: i32,
    pub has_results: bool,
    pub device_id: Option<String>,
    pub clicked_item: Option<String>,
    /// match | movie | series
    pub clicked_type: Option<String>,
    pub created_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
