//! Db command - test database management and migrations.

use std::sync::Arc;

use serde::Serialize;

use crate::cli::args::{DbAction, DbArgs, MigrateAction, MigrateArgs};
use crate::config::Config;
use crate::errors::{AppError, AppResult};
use crate::infra::db::{Database, DatabaseLifecycle, SeaOrmConnector, Table};

#[derive(Debug, Serialize)]
struct TableCount {
    table: Table,
    rows: u64,
}

/// Execute the db command
pub async fn execute(args: DbArgs, config: Config) -> AppResult<i32> {
    if let DbAction::Migrate(args) = args.action {
        migrate(args, &config).await?;
        return Ok(0);
    }

    let lifecycle = DatabaseLifecycle::new(config.database.clone(), Arc::new(SeaOrmConnector));
    let result = run(&lifecycle, args.action).await;
    lifecycle.tear_down().await;
    result?;

    Ok(0)
}

async fn run(lifecycle: &DatabaseLifecycle, action: DbAction) -> AppResult<()> {
    match action {
        DbAction::Setup => {
            let store = lifecycle.set_up().await?;
            let categories = store.count(Table::Categories).await?;
            let products = store.count(Table::Products).await?;
            println!("ready: {} categories, {} products", categories, products);
        }
        DbAction::Reset => {
            lifecycle.connect().await?;
            let report = lifecycle.reset_database().await?;
            for (table, rows) in &report.deleted {
                println!("{:<18} {}", table, rows);
            }
            println!("deleted {} rows", report.total());
        }
        DbAction::Seed => {
            lifecycle.connect().await?;
            let report = lifecycle.seed_data().await?;
            println!(
                "seeded {} categories, {} products",
                report.categories, report.products
            );
        }
        DbAction::Stats { json } => {
            let store = lifecycle.connect().await?;
            let mut counts = Vec::with_capacity(Table::RESET_ORDER.len());
            for table in Table::RESET_ORDER {
                counts.push(TableCount {
                    table,
                    rows: store.count(table).await?,
                });
            }

            if json {
                let output = serde_json::to_string_pretty(&counts)
                    .map_err(|e| AppError::internal(e.to_string()))?;
                println!("{}", output);
            } else {
                for count in &counts {
                    println!("{:<18} {}", count.table, count.rows);
                }
            }
        }
        DbAction::Migrate(_) => {
            return Err(AppError::invalid_state("migrations bypass the session lifecycle"));
        }
    }

    Ok(())
}

async fn migrate(args: MigrateArgs, config: &Config) -> AppResult<()> {
    tracing::info!("Running migration command...");

    // Connect without auto-running migrations for manual control
    let db = Database::connect_without_migrations(&config.database.url).await?;

    match args.action {
        MigrateAction::Up => {
            tracing::info!("Running pending migrations...");
            db.run_migrations().await?;
            tracing::info!("Migrations completed successfully");
        }
        MigrateAction::Down => {
            tracing::info!("Rolling back last migration...");
            db.rollback_migration().await?;
            tracing::info!("Rollback completed successfully");
        }
        MigrateAction::Status => {
            for (name, applied) in db.migration_status().await? {
                let status = if applied { "applied" } else { "pending" };
                println!("{}: {}", name, status);
            }
        }
        MigrateAction::Fresh => {
            tracing::warn!("Dropping all tables and running all migrations...");
            db.fresh_migrations().await?;
            tracing::info!("Fresh migrations completed successfully");
        }
    }

    db.close().await?;
    Ok(())
}
