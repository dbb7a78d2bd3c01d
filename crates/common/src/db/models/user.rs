//! User entity

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Avatar stored when a user is created without one
pub const DEFAULT_AVATAR_URL: &str =
    "https://www.gravatar.com/avatar/00000000000000000000000000000000?d=mp";

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false, column_type = "Text")]
    pub username: String,

    #[sea_orm(column_type = "Text")]
    pub name: String,

    #[sea_orm(column_type = "Text")]
    pub avatar_url: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::article::Entity")]
    Articles,

    #[sea_orm(has_many = "super::comment::Entity")]
    Comments,
}

impl Related<super::article::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Articles.def()
    }
}

impl Related<super::comment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Comments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Request body for creating a user
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewUser {
    #[validate(length(min = 1))]
    pub username: String,

    #[validate(length(min = 1))]
    pub name: String,

    #[serde(default)]
    pub avatar_url: Option<String>,
}

impl NewUser {
    /// Avatar to store, falling back to the placeholder when absent or blank
    pub fn avatar_or_default(&self) -> String {
        match self.avatar_url.as_deref().map(str::trim) {
            Some(url) if !url.is_empty() => url.to_string(),
            _ => DEFAULT_AVATAR_URL.to_string(),
        }
    }
}
