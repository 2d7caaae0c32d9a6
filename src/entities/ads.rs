use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "ads")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub slot_key: String,
    pub network: String,
    pub format: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub code_html: Option<String>,
    pub adsense_client: Option<String>,
    pub adsense_slot: Option<String>,
    pub adsterra_key: Option<String>,
    pub adsterra_domain: Option<String>,
    pub monetag_id: Option<String>,
    pub vast_url: Option<String>,
    pub video_url: Option<String>,
    pub video_skip_after: Option<i32>,
    pub popup_url: Option<String>,
    /// JSON array of page keys
    #[sea_orm(column_type = "Text")]
    pub show_on: String,
    pub enabled: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
