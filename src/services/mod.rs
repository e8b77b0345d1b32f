//! Application services layer.
//!
//! Wires the database lifecycle and the cache manager together from one
//! configuration and exposes the session-wide setup and teardown used by the
//! test runner.

pub mod container;

pub use container::{ServiceContainer, Services};

#[cfg(any(test, feature = "test-utils"))]
pub use container::MockServiceContainer;
