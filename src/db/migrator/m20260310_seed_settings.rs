use crate::entities::{prelude::*, settings};
use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let now = chrono::Utc::now().timestamp_millis();

        let insert = Query::insert()
            .into_table(Settings)
            .columns([
                settings::Column::Id,
                settings::Column::SiteName,
                settings::Column::WhatsappNumber,
                settings::Column::AdsEnabled,
                settings::Column::PriceMatch,
                settings::Column::PriceWeekly,
                settings::Column::PriceMonthly,
                settings::Column::PriceYearly,
                settings::Column::MaxDevicesMatch,
                settings::Column::MaxDevicesWeekly,
                settings::Column::MaxDevicesMonthly,
                settings::Column::MaxDevicesYearly,
                settings::Column::TrialDays,
                settings::Column::UpdatedAt,
            ])
            .values_panic([
                1.into(),
                "Fanbroj".into(),
                "+252618274188".into(),
                false.into(),
                0.2_f64.into(),
                1.0_f64.into(),
                3.5_f64.into(),
                11.0_f64.into(),
                1.into(),
                2.into(),
                3.into(),
                5.into(),
                7.into(),
                now.into(),
            ])
            .on_conflict(
                OnConflict::column(settings::Column::Id)
                    .do_nothing()
                    .to_owned(),
            )
            .to_owned();

        manager.exec_stmt(insert).await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let delete = Query::delete().from_table(Settings).to_owned();
        manager.exec_stmt(delete).await
    }
}
