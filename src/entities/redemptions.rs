use sea_orm::entity::prelude::*;
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "redemptions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub code: String,
    /// match | weekly | monthly | yearly
    pub plan: String,
    pub duration_days: i32,
    pub max_devices: i32,
    /// manual | auto_payment
    pub source: String,
    pub payment_order_id: Option<String>,
    pub note: Option<String>,
    /// Last moment the code can be redeemed.
    pub expires_at: Option<i64>,
    pub used_by_user_id: Option<i32>,
    pub used_at: Option<i64>,
    pub revoked_at: Option<i64>,
    pub created_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
