//! Centralized error handling.
//!
//! Provides a unified error type for the harness. Errors touching the
//! relational store during setup are fatal; cache errors are transient and
//! never abort the primary workflow.

use thiserror::Error;

use crate::infra::cache::CacheError;

/// How an error affects the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Aborts the whole run; no tests may execute against the store
    FatalSetup,
    /// Logged and degraded; reported only through status probes
    RecoverableTransient,
}

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Invalid lifecycle state: {0}")]
    InvalidState(String),

    #[error("Seed data rejected: {0}")]
    Seed(#[from] domain::DomainError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Get error code for logs and CLI output
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Database(_) => "DATABASE_ERROR",
            AppError::Cache(_) => "CACHE_ERROR",
            AppError::Config(_) => "CONFIG_ERROR",
            AppError::InvalidState(_) => "INVALID_STATE",
            AppError::Seed(_) => "SEED_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Classify the error for the propagation rule.
    pub fn class(&self) -> ErrorClass {
        match self {
            AppError::Cache(_) => ErrorClass::RecoverableTransient,
            _ => ErrorClass::FatalSetup,
        }
    }

    pub fn is_fatal(&self) -> bool {
        self.class() == ErrorClass::FatalSetup
    }
}

/// Result type alias
pub type AppResult<T> = Result<T, AppError>;

/// Convenience constructors
impl AppError {
    pub fn config(msg: impl Into<String>) -> Self {
        AppError::Config(msg.into())
    }

    pub fn invalid_state(msg: impl Into<String>) -> Self {
        AppError::InvalidState(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        AppError::Internal(msg.into())
    }
}
