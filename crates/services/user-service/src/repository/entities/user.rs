//! User database entity for SeaORM.

use sea_orm::entity::prelude::*;
use sea_orm::Set;

use domain::{Cpf, FilterField, User};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub name: String,
    /// Canonical digits only
    #[sea_orm(unique)]
    pub cpf: String,
    #[sea_orm(unique)]
    pub email: String,
    pub birth_date: Date,
    pub created_at: DateTimeUtc,
    /// NULL until the first update
    pub updated_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<FilterField> for Column {
    fn from(field: FilterField) -> Self {
        match field {
            FilterField::Cpf => Column::Cpf,
            FilterField::Email => Column::Email,
            FilterField::Name => Column::Name,
        }
    }
}

/// Convert database model to domain entity
impl From<Model> for User {
    fn from(model: Model) -> Self {
        User {
            id: Some(model.id),
            name: model.name,
            cpf: Cpf::new(model.cpf),
            email: model.email,
            birth_date: model.birth_date,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

impl ActiveModel {
    /// Full-replace active model for `user` stored under `id`
    pub fn from_user(id: String, user: &User) -> Self {
        Self {
            id: Set(id),
            name: Set(user.name.clone()),
            cpf: Set(user.cpf.canonical()),
            email: Set(user.email.clone()),
            birth_date: Set(user.birth_date),
            created_at: Set(user.created_at),
            updated_at: Set(user.updated_at),
        }
    }
}
