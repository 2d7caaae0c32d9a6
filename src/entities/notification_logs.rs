use sea_orm::entity::prelude::*;
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "notification_logs")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    /// admin_broadcast | new_release
    pub notification_type: String,
    pub title: String,
    #[sea_orm(column_type = "Text")]
    pub body: String,
    pub url: Option<String>,
    pub target_audience: String,
    pub sent_count: i32,
    pub failed_count: i32,
    pub sent_by: Option<String>,
    pub created_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
