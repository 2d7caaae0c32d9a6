use sea_orm::entity::prelude::*;
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "allowed_leagues")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub league_name: String,
    #[sea_orm(unique)]
    pub api_league_id: i32,
    pub enabled: bool,
    pub created_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
