//! SeaORM entity models
//!
//! Database entities for Newsboard

mod article;
mod comment;
mod topic;
mod user;

pub use topic::{
    Entity as TopicEntity,
    Model as Topic,
    ActiveModel as TopicActiveModel,
    Column as TopicColumn,
    NewTopic,
};

pub use user::{
    Entity as UserEntity,
    Model as User,
    ActiveModel as UserActiveModel,
    Column as UserColumn,
    NewUser,
    DEFAULT_AVATAR_URL,
};

pub use article::{
    Entity as ArticleEntity,
    Model as Article,
    ActiveModel as ArticleActiveModel,
    Column as ArticleColumn,
    Relation as ArticleRelation,
    ArticleDetail,
    ArticleSummary,
    NewArticle,
    DEFAULT_ARTICLE_IMG_URL,
};

pub use comment::{
    Entity as CommentEntity,
    Model as Comment,
    ActiveModel as CommentActiveModel,
    Column as CommentColumn,
    CommentRow,
    NewComment,
};
