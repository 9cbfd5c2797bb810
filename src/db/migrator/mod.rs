use sea_orm_migration::prelude::*;

mod m20260301_create_users;
mod m20260302_create_community;
mod m20260303_create_catalog_tables;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260301_create_users::Migration),
            Box::new(m20260302_create_community::Migration),
            Box::new(m20260303_create_catalog_tables::Migration),
        ]
    }
}
