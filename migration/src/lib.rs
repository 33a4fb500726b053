pub use sea_orm_migration::prelude::*;

mod m20240601_000001_create_catalog;
mod m20240602_000001_add_genre_name_unique;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240601_000001_create_catalog::Migration),
            Box::new(m20240602_000001_add_genre_name_unique::Migration),
        ]
    }
}
