//! Domain-level errors.
//!
//! These errors represent catalog rule violations. They are independent of
//! infrastructure concerns (database, cache).

use thiserror::Error;
use uuid::Uuid;

/// Domain-specific errors for catalog rule violations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A product points at a category that is not part of the same set
    #[error("Product {product} references unknown category {category}")]
    DanglingCategory { product: String, category: Uuid },

    /// Two entities of the same kind share a slug
    #[error("Duplicate slug: {0}")]
    DuplicateSlug(String),

    /// Validation failed for a field
    #[error("Validation error: {0}")]
    Validation(String),
}

impl DomainError {
    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        DomainError::Validation(msg.into())
    }
}

/// Result type alias for domain operations
pub type DomainResult<T> = Result<T, DomainError>;
