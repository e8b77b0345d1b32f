//! Domain layer - Catalog entities and the fixed seed fixtures.
//!
//! This crate contains pure domain types with no infrastructure dependencies.
//! The seed fixtures are shared by the database lifecycle and the tests that
//! assert against seeded rows.

pub mod catalog;
pub mod constants;
pub mod error;
pub mod fixtures;

pub use catalog::{check_integrity, Category, Product};
pub use constants::*;
pub use error::{DomainError, DomainResult};
