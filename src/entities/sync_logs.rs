use sea_orm::entity::prelude::*;
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "sync_logs")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub date: String,
    pub mode: String,
    pub ok: bool,
    pub fetched_count: i32,
    pub skipped_count: i32,
    pub imported_count: i32,
    pub updated_count: i32,
    #[sea_orm(column_type = "Text", nullable)]
    pub error: Option<String>,
    pub ran_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
