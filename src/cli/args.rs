//! CLI argument definitions.
//!
//! Uses clap derive macros for type-safe argument parsing.

use clap::{Parser, Subcommand};

/// Storefront test harness - database lifecycle and cache connection tooling
#[derive(Parser, Debug)]
#[command(name = "storefront-harness")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage the test database
    Db(DbArgs),

    /// Inspect the cache connection
    Cache(CacheArgs),

    /// Probe database and cache connectivity
    Health,

    /// Run a command between global setup and teardown
    Session(SessionArgs),
}

/// Arguments for the db command
#[derive(Parser, Debug)]
pub struct DbArgs {
    #[command(subcommand)]
    pub action: DbAction,
}

/// Database actions
#[derive(Subcommand, Debug)]
pub enum DbAction {
    /// Connect, reset and seed
    Setup,
    /// Delete every row, children first
    Reset,
    /// Insert the fixed catalog
    Seed,
    /// Show row counts per table
    Stats {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Run database migrations
    Migrate(MigrateArgs),
}

/// Arguments for the migrate subcommand
#[derive(Parser, Debug)]
pub struct MigrateArgs {
    #[command(subcommand)]
    pub action: MigrateAction,
}

/// Migration actions
#[derive(Subcommand, Debug)]
pub enum MigrateAction {
    /// Run pending migrations
    Up,
    /// Rollback last migration
    Down,
    /// Show migration status
    Status,
    /// Reset and re-run all migrations
    Fresh,
}

/// Arguments for the cache command
#[derive(Parser, Debug)]
pub struct CacheArgs {
    #[command(subcommand)]
    pub action: CacheAction,
}

/// Cache actions
#[derive(Subcommand, Debug)]
pub enum CacheAction {
    /// PING round-trip
    Ping,
    /// Connect and report status
    Status,
}

/// Arguments for the session command
#[derive(Parser, Debug)]
pub struct SessionArgs {
    /// Test command and its arguments
    #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
    pub command: Vec<String>,
}
