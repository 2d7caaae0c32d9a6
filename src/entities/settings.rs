use sea_orm::entity::prelude::*;

/// Single-row site settings.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "settings")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub site_name: String,
    pub whatsapp_number: String,
    pub ads_enabled: bool,
    pub price_match: f64,
    pub price_weekly: f64,
    pub price_monthly: f64,
    pub price_yearly: f64,
    pub max_devices_match: i32,
    pub max_devices_weekly: i32,
    pub max_devices_monthly: i32,
    pub max_devices_yearly: i32,
    pub free_movie_of_week: Option<String>,
    pub trial_days: i32,
    pub updated_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
