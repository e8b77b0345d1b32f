//! Product database entity for SeaORM.

use sea_orm::entity::prelude::*;
use sea_orm::Set;

use domain::Product;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "products")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    #[sea_orm(unique)]
    pub slug: String,
    pub description: String,
    #[sea_orm(unique)]
    pub sku: String,
    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    pub base_price: Decimal,
    pub stock_quantity: i32,
    pub category_id: Uuid,
    pub is_active: bool,
    /// Shipping weight in grams
    pub weight: i32,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::category::Entity",
        from = "Column::CategoryId",
        to = "super::category::Column::Id"
    )]
    Category,
}

impl Related<super::category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Convert database model to domain entity
impl From<Model> for Product {
    fn from(model: Model) -> Self {
        Product {
            id: model.id,
            name: model.name,
            slug: model.slug,
            description: model.description,
            sku: model.sku,
            base_price: model.base_price,
            stock_quantity: model.stock_quantity,
            category_id: model.category_id,
            is_active: model.is_active,
            weight: model.weight,
        }
    }
}

/// Build an insertable row from a domain entity, keeping its id
impl From<&Product> for ActiveModel {
    fn from(product: &Product) -> Self {
        let now = chrono::Utc::now();
        ActiveModel {
            id: Set(product.id),
            name: Set(product.name.clone()),
            slug: Set(product.slug.clone()),
            description: Set(product.description.clone()),
            sku: Set(product.sku.clone()),
            base_price: Set(product.base_price),
            stock_quantity: Set(product.stock_quantity),
            category_id: Set(product.category_id),
            is_active: Set(product.is_active),
            weight: Set(product.weight),
            created_at: Set(now),
            updated_at: Set(now),
        }
    }
}
