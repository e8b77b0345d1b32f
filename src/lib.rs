//! Storefront harness - data-layer plumbing for the storefront test suite
//!
//! Two independent components:
//!
//! - a database lifecycle controller that connects to PostgreSQL, clears
//!   every table in dependency order, seeds a fixed catalog and disconnects
//!   once the session is over;
//! - a cache manager that lazily opens one self-healing Redis connection
//!   with bounded retries, capped backoff and an offline queue.
//!
//! # Architecture Layers
//!
//! - **cli**: Command-line interface
//! - **commands**: CLI command implementations
//! - **config**: Configuration and defaults
//! - **services**: Composition root and session setup/teardown
//! - **infra**: Database, cache and listener plumbing
//! - **errors**: Centralized error handling
//!
//! # CLI Usage
//!
//! ```bash
//! # Reset and seed the test database
//! cargo run -- db setup
//!
//! # Run the test suite inside one global setup/teardown
//! cargo run -- session -- cargo test --workspace
//!
//! # Check connectivity
//! cargo run -- health
//! ```

pub mod cli;
pub mod commands;
pub mod config;
pub mod errors;
pub mod infra;
pub mod services;

// Re-export commonly used types at crate root
pub use config::Config;
pub use errors::{AppError, AppResult};
pub use infra::{CacheManager, CacheService, DatabaseLifecycle};
pub use services::Services;
