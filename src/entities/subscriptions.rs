use sea_orm::entity::prelude::*;
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "subscriptions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub user_id: i32,
    /// match | weekly | monthly | yearly
    pub plan: String,
    /// active | expired | revoked
    pub status: String,
    /// Only set for single-match passes.
    pub match_id: Option<i32>,
    pub expires_at: i64,
    pub max_devices: i32,
    pub access_code: Option<String>,
    pub created_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
