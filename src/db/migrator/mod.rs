use sea_orm_migration::prelude::*;

mod m20260301_initial;
mod m20260302_add_admins;
mod m20260303_add_system_logs;
mod m20260305_add_lookup_indexes;
mod m20260310_seed_settings;
mod m20260315_add_series_and_redemptions;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260301_initial::Migration),
            Box::new(m20260302_add_admins::Migration),
            Box::new(m20260303_add_system_logs::Migration),
            Box::new(m20260305_add_lookup_indexes::Migration),
            Box::new(m20260310_seed_settings::Migration),
            Box::new(m20260315_add_series_and_redemptions::Migration),
        ]
    }
}
