//! CLI module - Command-line interface for the harness.
//!
//! Provides commands for:
//! - `db` - Database setup, reset, seed, stats and migrations
//! - `cache` - Cache ping and status
//! - `health` - Probe both backends
//! - `session` - Run a test command between global setup and teardown

pub mod args;

pub use args::{Cli, Commands};
