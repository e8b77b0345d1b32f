//! Catalog domain entities.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{DomainError, DomainResult};

/// Product category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub is_active: bool,
}

/// Sellable product belonging to exactly one category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub sku: String,
    pub base_price: Decimal,
    pub stock_quantity: i32,
    pub category_id: Uuid,
    pub is_active: bool,
    /// Shipping weight in grams
    pub weight: i32,
}

impl Product {
    /// Check whether this product belongs to `category`.
    pub fn belongs_to(&self, category: &Category) -> bool {
        self.category_id == category.id
    }
}

/// Check that a set of categories and products can be inserted together.
///
/// Every product must reference a category from `categories`, and slugs
/// must be unique per entity kind.
pub fn check_integrity(categories: &[Category], products: &[Product]) -> DomainResult<()> {
    check_unique_slugs(categories.iter().map(|c| c.slug.as_str()))?;
    check_unique_slugs(products.iter().map(|p| p.slug.as_str()))?;

    for product in products {
        if product.base_price.is_sign_negative() {
            return Err(DomainError::validation(format!(
                "{} has a negative base price",
                product.slug
            )));
        }
        if !categories.iter().any(|c| product.belongs_to(c)) {
            return Err(DomainError::DanglingCategory {
                product: product.slug.clone(),
                category: product.category_id,
            });
        }
    }

    Ok(())
}

fn check_unique_slugs<'a>(slugs: impl Iterator<Item = &'a str>) -> DomainResult<()> {
    let mut seen = std::collections::HashSet::new();
    for slug in slugs {
        if !seen.insert(slug) {
            return Err(DomainError::DuplicateSlug(slug.to_string()));
        }
    }
    Ok(())
}
