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
        let backend = manager.get_database_backend();
        let schema = Schema::new(backend);

        // Catalogue
        create(manager, &schema, Movies).await?;
        create(manager, &schema, Matches).await?;
        create(manager, &schema, Channels).await?;
        create(manager, &schema, Categories).await?;
        create(manager, &schema, HeroSlides).await?;
        create(manager, &schema, PromoBanners).await?;

        // Monetisation
        create(manager, &schema, Ads).await?;
        create(manager, &schema, AdImpressions).await?;
        create(manager, &schema, PpvContent).await?;
        create(manager, &schema, PpvPurchases).await?;

        // Viewers and access
        create(manager, &schema, Users).await?;
        create(manager, &schema, Devices).await?;
        create(manager, &schema, Subscriptions).await?;
        create(manager, &schema, Payments).await?;

        // Notifications
        create(manager, &schema, PushSubscriptions).await?;
        create(manager, &schema, NotificationPreferences).await?;
        create(manager, &schema, MatchReminders).await?;
        create(manager, &schema, NotificationLogs).await?;

        // Analytics, fixtures, settings
        create(manager, &schema, SearchEvents).await?;
        create(manager, &schema, Fixtures).await?;
        create(manager, &schema, SyncLogs).await?;
        create(manager, &schema, AllowedLeagues).await?;
        create(manager, &schema, Settings).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(
                Table::drop()
                    .table(Settings)
                    .table(AllowedLeagues)
                    .table(SyncLogs)
                    .table(Fixtures)
                    .table(SearchEvents)
                    .table(NotificationLogs)
                    .table(MatchReminders)
                    .table(NotificationPreferences)
                    .table(PushSubscriptions)
                    .table(Payments)
                    .table(Subscriptions)
                    .table(Devices)
                    .table(Users)
                    .table(PpvPurchases)
                    .table(PpvContent)
                    .table(AdImpressions)
                    .table(Ads)
                    .table(PromoBanners)
                    .table(HeroSlides)
                    .table(Categories)
                    .table(Channels)
                    .table(Matches)
                    .table(Movies)
                    .to_owned(),
            )
            .await
    }
}
