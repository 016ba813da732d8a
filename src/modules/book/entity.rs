//! SeaORM entity for the `book` table.

use sea_orm::entity::prelude::*;

use super::models::Book;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "book")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub title: String,
    pub rating: f64,
    pub price: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Book {
    fn from(model: Model) -> Self {
        Book {
            id: Some(model.id),
            title: model.title,
            rating: model.rating,
            price: model.price,
        }
    }
}
