//! Domain-level constants.
//!
//! Stable identifiers for the seed fixtures. Tests reference these rows by id
//! across the whole suite, so they must never be generated.

use uuid::{uuid, Uuid};

// =============================================================================
// Categories
// =============================================================================

/// Seeded "Coffee" category
pub const COFFEE_CATEGORY_ID: Uuid = uuid!("6f1c1a52-3b0e-4c8a-9d41-0c7a2f6b1e01");

/// Seeded "Tea" category
pub const TEA_CATEGORY_ID: Uuid = uuid!("6f1c1a52-3b0e-4c8a-9d41-0c7a2f6b1e02");

// =============================================================================
// Products
// =============================================================================

/// Seeded arabica coffee product
pub const ARABICA_PRODUCT_ID: Uuid = uuid!("a8d3e0f4-71b2-4f6e-8c19-5b2d9e4a7c01");

/// Seeded green tea product
pub const SENCHA_PRODUCT_ID: Uuid = uuid!("a8d3e0f4-71b2-4f6e-8c19-5b2d9e4a7c02");

/// Slug of the seeded arabica product
pub const ARABICA_PRODUCT_SLUG: &str = "arabica-premium";

/// Slug of the seeded green tea product
pub const SENCHA_PRODUCT_SLUG: &str = "sencha-organic";
