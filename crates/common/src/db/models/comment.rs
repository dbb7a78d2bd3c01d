//! Comment entity

use sea_orm::entity::prelude::*;
use sea_orm::FromQueryResult;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "comments")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub comment_id: i32,

    #[sea_orm(column_type = "Text")]
    pub body: String,

    pub article_id: i32,

    #[sea_orm(column_type = "Text")]
    pub author: String,

    pub votes: i32,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::article::Entity",
        from = "Column::ArticleId",
        to = "super::article::Column::ArticleId",
        on_delete = "Cascade"
    )]
    Article,

    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::Author",
        to = "super::user::Column::Username",
        on_delete = "Cascade"
    )]
    Author,
}

impl Related<super::article::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Article.def()
    }
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Author.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// One row of an article's comment page
#[derive(Clone, Debug, PartialEq, Eq, FromQueryResult, Serialize)]
pub struct CommentRow {
    pub comment_id: i32,
    pub body: String,
    pub article_id: i32,
    pub author: String,
    pub votes: i32,
    pub created_at: DateTimeWithTimeZone,
    /// Comments on the article before pagination
    pub total_count: i64,
}

/// Request body for posting a comment.
///
/// Fields are optional at the serde layer so that absent and null values reach
/// [`NewComment::into_parts`] and are rejected with the same message as wrong types.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewComment {
    #[serde(default)]
    pub username: Option<String>,

    #[serde(default)]
    pub body: Option<String>,
}

impl NewComment {
    /// Validated `(username, body)`; both must be non-empty text
    pub fn into_parts(self) -> crate::errors::Result<(String, String)> {
        match (self.username, self.body) {
            (Some(username), Some(body)) if !username.is_empty() && !body.trim().is_empty() => {
                Ok((username, body))
            }
            _ => Err(AppError::InvalidInput),
        }
    }
}
