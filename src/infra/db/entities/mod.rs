//! SeaORM entity definitions
//!
//! These are database-specific entities separate from the domain models.
//! Only the seeded tables need entities; the remaining tables are reached
//! through raw statements during reset.

pub mod category;
pub mod product;

pub use category::{
    ActiveModel as CategoryActiveModel, Entity as CategoryEntity, Model as CategoryModel,
};
pub use product::{
    ActiveModel as ProductActiveModel, Entity as ProductEntity, Model as ProductModel,
};
