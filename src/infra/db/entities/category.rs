//! Category database entity for SeaORM.

use sea_orm::entity::prelude::*;
use sea_orm::Set;

use domain::Category;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "categories")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    #[sea_orm(unique)]
    pub slug: String,
    pub description: String,
    pub is_active: bool,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::product::Entity")]
    Products,
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Products.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Convert database model to domain entity
impl From<Model> for Category {
    fn from(model: Model) -> Self {
        Category {
            id: model.id,
            name: model.name,
            slug: model.slug,
            description: model.description,
            is_active: model.is_active,
        }
    }
}

/// Build an insertable row from a domain entity, keeping its id
impl From<&Category> for ActiveModel {
    fn from(category: &Category) -> Self {
        let now = chrono::Utc::now();
        ActiveModel {
            id: Set(category.id),
            name: Set(category.name.clone()),
            slug: Set(category.slug.clone()),
            description: Set(category.description.clone()),
            is_active: Set(category.is_active),
            created_at: Set(now),
            updated_at: Set(now),
        }
    }
}
