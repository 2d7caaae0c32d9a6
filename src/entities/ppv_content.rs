use sea_orm::entity::prelude::*;
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "ppv_content")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    /// match | movie
    pub content_type: String,
    pub content_id: String,
    pub title: String,
    pub price: f64,
    pub ad_supported_enabled: bool,
    pub min_ads_required: i32,
    pub access_duration_hours: i32,
    pub is_active: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
