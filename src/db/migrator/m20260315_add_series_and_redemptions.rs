use crate::entities::prelude::*;
use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::{EntityTrait, Schema};

#[derive(DeriveMigrationName)]
pub struct Migration;

async fn create<E>(manager: &SchemaManager<'_>, schema: &Schema, entity: E) -> Result<(), DbErr>
where
    E: EntityTrait,
{
    manager
        .create_table(
            schema
                .create_table_from_entity(entity)
                .if_not_exists()
                .to_owned(),
        )
        .await
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let schema = Schema::new(manager.get_database_backend());

        create(manager, &schema, Series).await?;
        create(manager, &schema, Episodes).await?;
        create(manager, &schema, Redemptions).await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_episodes_series_season_episode")
                    .table(EpisodeIden::Table)
                    .col(EpisodeIden::SeriesId)
                    .col(EpisodeIden::SeasonNumber)
                    .col(EpisodeIden::EpisodeNumber)
                    .unique()
                    .if_not_exists()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(
                Table::drop()
                    .table(Redemptions)
                    .table(Episodes)
                    .table(Series)
                    .to_owned(),
            )
            .await
    }
}

#[derive(DeriveIden)]
enum EpisodeIden {
    #[sea_orm(iden = "episodes")]
    Table,
    SeriesId,
    SeasonNumber,
    EpisodeNumber,
}
