//! Fixed seed data inserted after every database reset.
//!
//! Categories must be inserted before products.

use rust_decimal::Decimal;

use crate::catalog::{Category, Product};
use crate::constants::{
    ARABICA_PRODUCT_ID, ARABICA_PRODUCT_SLUG, COFFEE_CATEGORY_ID, SENCHA_PRODUCT_ID,
    SENCHA_PRODUCT_SLUG, TEA_CATEGORY_ID,
};

/// Seeded categories, in insertion order.
pub fn categories() -> Vec<Category> {
    vec![
        Category {
            id: COFFEE_CATEGORY_ID,
            name: "Coffee".to_string(),
            slug: "coffee".to_string(),
            description: "Single-origin and blended coffee beans".to_string(),
            is_active: true,
        },
        Category {
            id: TEA_CATEGORY_ID,
            name: "Tea".to_string(),
            slug: "tea".to_string(),
            description: "Loose-leaf green, black and herbal teas".to_string(),
            is_active: true,
        },
    ]
}

/// Seeded products, in insertion order.
pub fn products() -> Vec<Product> {
    vec![
        Product {
            id: ARABICA_PRODUCT_ID,
            name: "Arabica Premium".to_string(),
            slug: ARABICA_PRODUCT_SLUG.to_string(),
            description: "Medium roast arabica beans from high-altitude farms".to_string(),
            sku: "COF-ARA-001".to_string(),
            base_price: Decimal::new(2599, 2),
            stock_quantity: 100,
            category_id: COFFEE_CATEGORY_ID,
            is_active: true,
            weight: 500,
        },
        Product {
            id: SENCHA_PRODUCT_ID,
            name: "Organic Sencha".to_string(),
            slug: SENCHA_PRODUCT_SLUG.to_string(),
            description: "Steamed Japanese green tea, first flush".to_string(),
            sku: "TEA-SEN-001".to_string(),
            base_price: Decimal::new(1850, 2),
            stock_quantity: 50,
            category_id: TEA_CATEGORY_ID,
            is_active: true,
            weight: 100,
        },
    ]
}
