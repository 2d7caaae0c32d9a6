use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_index(
                Index::create()
                    .name("idx_matches_status_kickoff")
                    .table(Matches::Table)
                    .col(Matches::Status)
                    .col(Matches::KickoffAt)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_subscriptions_user_status")
                    .table(Subscriptions::Table)
                    .col(Subscriptions::UserId)
                    .col(Subscriptions::Status)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_ppv_purchases_lookup")
                    .table(PpvPurchases::Table)
                    .col(PpvPurchases::UserId)
                    .col(PpvPurchases::ContentType)
                    .col(PpvPurchases::ContentId)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_payments_created_at")
                    .table(Payments::Table)
                    .col(Payments::CreatedAt)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_search_events_created_at")
                    .table(SearchEvents::Table)
                    .col(SearchEvents::CreatedAt)
                    .if_not_exists()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_search_events_created_at")
                    .table(SearchEvents::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_index(
                Index::drop()
                    .name("idx_payments_created_at")
                    .table(Payments::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_index(
                Index::drop()
                    .name("idx_ppv_purchases_lookup")
                    .table(PpvPurchases::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_index(
                Index::drop()
                    .name("idx_subscriptions_user_status")
                    .table(Subscriptions::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_index(
                Index::drop()
                    .name("idx_matches_status_kickoff")
                    .table(Matches::Table)
                    .to_owned(),
            )
            .await
    }
}

#[derive(DeriveIden)]
enum Matches {
    Table,
    Status,
    KickoffAt,
}

#[derive(DeriveIden)]
enum Subscriptions {
    Table,
    UserId,
    Status,
}

#[derive(DeriveIden)]
enum PpvPurchases {
    Table,
    UserId,
    ContentType,
    ContentId,
}

#[derive(DeriveIden)]
enum Payments {
    Table,
    CreatedAt,
}

#[derive(DeriveIden)]
enum SearchEvents {
    Table,
    CreatedAt,
}
