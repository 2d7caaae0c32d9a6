use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "hero_slides")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    /// movie | series | custom
    pub content_type: String,
    /// Slug of the referenced movie or series
    pub content_id: Option<String>,
    pub title: Option<String>,
    pub subtitle: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub cta_text: Option<String>,
    pub cta_link: Option<String>,
    pub sort_order: i32,
    pub is_active: bool,
    pub created_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
