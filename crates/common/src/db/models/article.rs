//! Article entity
//!
//! `comment_count` and `total_count` are derived at read time and live on the
//! query result types below, never on the table.

use sea_orm::entity::prelude::*;
use sea_orm::FromQueryResult;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Image stored when an article is created without one
pub const DEFAULT_ARTICLE_IMG_URL: &str =
    "https://images.pexels.com/photos/97050/pexels-photo-97050.jpeg?w=700&h=700";

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "articles")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub article_id: i32,

    #[sea_orm(column_type = "Text")]
    pub title: String,

    #[sea_orm(column_type = "Text")]
    pub topic: String,

    #[sea_orm(column_type = "Text")]
    pub author: String,

    #[sea_orm(column_type = "Text")]
    pub body: String,

    pub created_at: DateTimeWithTimeZone,

    pub votes: i32,

    #[sea_orm(column_type = "Text")]
    pub article_img_url: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::topic::Entity",
        from = "Column::Topic",
        to = "super::topic::Column::Slug"
    )]
    Topic,

    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::Author",
        to = "super::user::Column::Username",
        on_delete = "Cascade"
    )]
    Author,

    #[sea_orm(has_many = "super::comment::Entity")]
    Comments,
}

impl Related<super::topic::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Topic.def()
    }
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Author.def()
    }
}

impl Related<super::comment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Comments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// One row of the article listing
#[derive(Clone, Debug, PartialEq, Eq, FromQueryResult, Serialize)]
pub struct ArticleSummary {
    pub author: String,
    pub title: String,
    pub article_id: i32,
    pub topic: String,
    pub created_at: DateTimeWithTimeZone,
    pub votes: i32,
    pub article_img_url: String,
    pub comment_count: i64,
    /// Rows matching the filter before pagination
    pub total_count: i64,
}

/// A single article with its body and comment count
#[derive(Clone, Debug, PartialEq, Eq, FromQueryResult, Serialize)]
pub struct ArticleDetail {
    pub article_id: i32,
    pub title: String,
    pub topic: String,
    pub author: String,
    pub body: String,
    pub created_at: DateTimeWithTimeZone,
    pub votes: i32,
    pub article_img_url: String,
    pub comment_count: i64,
}

/// Request body for creating an article
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewArticle {
    #[validate(length(min = 1))]
    pub author: String,

    #[validate(length(min = 1))]
    pub title: String,

    #[validate(length(min = 1))]
    pub body: String,

    #[validate(length(min = 1))]
    pub topic: String,

    #[serde(default)]
    pub article_img_url: Option<String>,
}

impl NewArticle {
    /// Image to store, falling back to the placeholder when absent or blank
    pub fn img_url_or_default(&self) -> String {
        match self.article_img_url.as_deref().map(str::trim) {
            Some(url) if !url.is_empty() => url.to_string(),
            _ => DEFAULT_ARTICLE_IMG_URL.to_string(),
        }
    }
}
