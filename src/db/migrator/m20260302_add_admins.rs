use crate::constants::auth::{DEFAULT_ADMIN_USERNAME, DEFAULT_API_KEY};
use crate::entities::{admins, prelude::*};
use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::Schema;

#[derive(DeriveMigrationName)]
pub struct Migration;

fn hash_default_password() -> String {
    use argon2::{
        Argon2,
        password_hash::{PasswordHasher, SaltString, rand_core::OsRng},
    };

    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(b"password", &salt)
        .expect("Failed to hash default admin password")
        .to_string()
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let schema = Schema::new(manager.get_database_backend());

        manager
            .create_table(
                schema
                    .create_table_from_entity(Admins)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        let now = chrono::Utc::now().to_rfc3339();
        let insert = Query::insert()
            .into_table(Admins)
            .columns([
                admins::Column::Username,
                admins::Column::PasswordHash,
                admins::Column::ApiKey,
                admins::Column::CreatedAt,
                admins::Column::UpdatedAt,
            ])
            .values_panic([
                DEFAULT_ADMIN_USERNAME.into(),
                hash_default_password().into(),
                DEFAULT_API_KEY.into(),
                now.clone().into(),
                now.into(),
            ])
            .to_owned();

        manager.exec_stmt(insert).await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Admins).to_owned())
            .await
    }
}
