use sea_orm::entity::prelude::*;
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "promo_banners")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    pub banner_type: String,
    pub headline: String,
    pub subheadline: Option<String>,
    pub cta_text: Option<String>,
    pub cta_link: Option<String>,
    pub left_image_url: Option<String>,
    pub right_image_url: Option<String>,
    pub background_image_url: Option<String>,
    pub background_color: Option<String>,
    pub accent_color: Option<String>,
    pub start_date: Option<i64>,
    pub end_date: Option<i64>,
    pub is_active: bool,
    pub priority: i32,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
