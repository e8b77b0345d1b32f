//! Database migrations.
//!
//! Each migration is a separate module following SeaORM conventions.
//! Migration names follow the pattern: m{YYYYMMDD}_{NNNNNN}_{description}
//!
//! Every foreign key uses `ON DELETE RESTRICT`, so rows must be removed
//! children-first.

use sea_orm_migration::prelude::*;

mod m20240101_000001_create_catalog_tables;
mod m20240101_000002_create_commerce_tables;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_catalog_tables::Migration),
            Box::new(m20240101_000002_create_commerce_tables::Migration),
        ]
    }
}
