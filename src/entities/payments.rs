use sea_orm::entity::prelude::*;
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "payments")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub order_id: String,
    pub device_id: String,
    pub plan: String,
    pub amount: f64,
    pub currency: String,
    pub gateway: String,
    /// pending | success | failed
    pub status: String,
    pub sid: Option<String>,
    pub payment_type: Option<String>,
    pub user_id: Option<i32>,
    pub subscription_id: Option<i32>,
    pub access_code: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub failure_reason: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub last_gateway_message: Option<String>,
    pub created_at: i64,
    pub completed_at: Option<i64>,
    pub failed_at: Option<i64>,
    pub verified_at: Option<i64>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
