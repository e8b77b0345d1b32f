//! Commands module - CLI command implementations.
//!
//! Each command returns the process exit code on success; errors are
//! reported by the entry point with exit code 1.

pub mod cache;
pub mod db;
pub mod health;
pub mod session;
