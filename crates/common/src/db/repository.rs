//! Repository for database operations
//!
//! Provides a single interface for all data access with error classification
//! and transaction support. Check-then-insert sequences run inside one
//! transaction on the primary.

use crate::db::models::*;
use crate::db::DbPool;
use crate::errors::{AppError, Result};
use crate::metrics;
use crate::query::{
    article_detail, article_listing, comment_listing, vote_increment, ArticleListParams,
    Pagination, VoteTarget,
};
use sea_orm::{
    ActiveModelTrait, DatabaseConnection, EntityTrait, Set, TransactionTrait,
};
use tracing::{debug, info};
use validator::Validate;

/// Repository for data access operations
#[derive(Clone)]
pub struct Repository {
    pool: DbPool,
}

impl Repository {
    /// Create a new repository with the given connection pool
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Get the read connection
    fn read_conn(&self) -> &DatabaseConnection {
        self.pool.read()
    }

    /// Get the write connection
    fn write_conn(&self) -> &DatabaseConnection {
        self.pool.write()
    }

    // ========================================================================
    // Health Check
    // ========================================================================

    /// Ping the database
    pub async fn ping(&self) -> Result<()> {
        self.pool.ping().await
    }

    // ========================================================================
    // Topic Operations
    // ========================================================================

    pub async fn list_topics(&self) -> Result<Vec<Topic>> {
        TopicEntity::find()
            .all(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// Slugs of every topic, read fresh on each call
    pub async fn topic_slugs(&self) -> Result<Vec<String>> {
        let topics = self.list_topics().await?;
        Ok(topics.into_iter().map(|topic| topic.slug).collect())
    }

    pub async fn create_topic(&self, new_topic: NewTopic) -> Result<Topic> {
        new_topic.validate()?;

        let topic = TopicActiveModel {
            slug: Set(new_topic.slug),
            description: Set(new_topic.description),
        }
        .insert(self.write_conn())
        .await?;

        metrics::record_mutation("topic", "create");
        info!(slug = %topic.slug, "Topic created");

        Ok(topic)
    }

    // ========================================================================
    // User Operations
    // ========================================================================

    pub async fn list_users(&self) -> Result<Vec<User>> {
        UserEntity::find()
            .all(self.read_conn())
            .await
            .map_err(Into::into)
    }

    pub async fn get_user(&self, username: &str) -> Result<User> {
        UserEntity::find_by_id(username.to_string())
            .one(self.read_conn())
            .await?
            .ok_or_else(|| AppError::not_found("user", username))
    }

    pub async fn create_user(&self, new_user: NewUser) -> Result<User> {
        new_user.validate()?;
        let avatar_url = new_user.avatar_or_default();

        let user = UserActiveModel {
            username: Set(new_user.username),
            name: Set(new_user.name),
            avatar_url: Set(avatar_url),
        }
        .insert(self.write_conn())
        .await?;

        metrics::record_mutation("user", "create");
        info!(username = %user.username, "User created");

        Ok(user)
    }

    /// Delete a user; their articles and comments go with them
    pub async fn delete_user(&self, username: &str) -> Result<()> {
        let result = UserEntity::delete_by_id(username.to_string())
            .exec(self.write_conn())
            .await?;

        if result.rows_affected == 0 {
            return Err(AppError::not_found("user", username));
        }

        metrics::record_mutation("user", "delete");
        info!(username, "User deleted");

        Ok(())
    }

    // ========================================================================
    // Article Operations
    // ========================================================================

    /// One page of articles for already validated parameters
    pub async fn list_articles(&self, params: ArticleListParams) -> Result<Vec<ArticleSummary>> {
        if params.topic.is_some() {
            let slugs = self.topic_slugs().await?;
            params.ensure_known_topic(&slugs)?;
        }

        let articles = article_listing(&params)
            .into_model::<ArticleSummary>()
            .all(self.read_conn())
            .await?;

        debug!(
            topic = ?params.topic,
            sort = params.sort.as_str(),
            order = ?params.order,
            rows = articles.len(),
            "Listed articles"
        );
        metrics::record_listing("article", articles.len());

        Ok(articles)
    }

    pub async fn get_article(&self, article_id: i32) -> Result<ArticleDetail> {
        self.find_article_detail(self.read_conn(), article_id).await
    }

    async fn find_article_detail(
        &self,
        conn: &DatabaseConnection,
        article_id: i32,
    ) -> Result<ArticleDetail> {
        article_detail(article_id)
            .into_model::<ArticleDetail>()
            .one(conn)
            .await?
            .ok_or_else(|| AppError::not_found("article", article_id))
    }

    /// Insert an article after checking its author and topic exist.
    ///
    /// Nothing is written when either reference is missing.
    pub async fn create_article(&self, new_article: NewArticle) -> Result<ArticleDetail> {
        new_article.validate()?;
        let article_img_url = new_article.img_url_or_default();

        let txn = self.write_conn().begin().await?;

        if UserEntity::find_by_id(new_article.author.clone())
            .one(&txn)
            .await?
            .is_none()
        {
            return Err(AppError::missing_reference("user", new_article.author));
        }

        if TopicEntity::find_by_id(new_article.topic.clone())
            .one(&txn)
            .await?
            .is_none()
        {
            return Err(AppError::missing_reference("topic", new_article.topic));
        }

        let article = ArticleActiveModel {
            title: Set(new_article.title),
            topic: Set(new_article.topic),
            author: Set(new_article.author),
            body: Set(new_article.body),
            article_img_url: Set(article_img_url),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;

        metrics::record_mutation("article", "create");
        info!(
            article_id = article.article_id,
            author = %article.author,
            topic = %article.topic,
            "Article created"
        );

        self.find_article_detail(self.write_conn(), article.article_id).await
    }

    pub async fn increment_article_votes(&self, article_id: i32, delta: i32) -> Result<Article> {
        let article = ArticleEntity::find()
            .from_raw_sql(vote_increment(VoteTarget::Article, article_id, delta))
            .one(self.write_conn())
            .await?
            .ok_or_else(|| AppError::not_found(VoteTarget::Article.entity(), article_id))?;

        metrics::record_mutation("article", "vote");
        info!(article_id, delta, votes = article.votes, "Article votes updated");

        Ok(article)
    }

    /// Delete an article and its comments
    pub async fn delete_article(&self, article_id: i32) -> Result<()> {
        let result = ArticleEntity::delete_by_id(article_id)
            .exec(self.write_conn())
            .await?;

        if result.rows_affected == 0 {
            return Err(AppError::not_found("article", article_id));
        }

        metrics::record_mutation("article", "delete");
        info!(article_id, "Article deleted");

        Ok(())
    }

    // ========================================================================
    // Comment Operations
    // ========================================================================

    /// One page of an article's comments, newest first.
    ///
    /// An article without comments yields an empty page; a missing article is not found.
    pub async fn list_comments(
        &self,
        article_id: i32,
        pagination: Pagination,
    ) -> Result<Vec<CommentRow>> {
        let conn = self.read_conn();

        let (article, comments) = futures::try_join!(
            ArticleEntity::find_by_id(article_id).one(conn),
            comment_listing(article_id, &pagination)
                .into_model::<CommentRow>()
                .all(conn),
        )?;

        if article.is_none() {
            return Err(AppError::not_found("article", article_id));
        }

        metrics::record_listing("comment", comments.len());

        Ok(comments)
    }

    /// Insert a comment after checking the article and author exist
    pub async fn create_comment(&self, article_id: i32, new_comment: NewComment) -> Result<Comment> {
        let (username, body) = new_comment.into_parts()?;

        let txn = self.write_conn().begin().await?;

        if ArticleEntity::find_by_id(article_id).one(&txn).await?.is_none() {
            return Err(AppError::not_found("article", article_id));
        }

        if UserEntity::find_by_id(username.clone()).one(&txn).await?.is_none() {
            return Err(AppError::missing_reference("user", username));
        }

        let comment = CommentActiveModel {
            body: Set(body),
            article_id: Set(article_id),
            author: Set(username),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;

        metrics::record_mutation("comment", "create");
        info!(
            comment_id = comment.comment_id,
            article_id,
            author = %comment.author,
            "Comment created"
        );

        Ok(comment)
    }

    pub async fn increment_comment_votes(&self, comment_id: i32, delta: i32) -> Result<Comment> {
        let comment = CommentEntity::find()
            .from_raw_sql(vote_increment(VoteTarget::Comment, comment_id, delta))
            .one(self.write_conn())
            .await?
            .ok_or_else(|| AppError::not_found(VoteTarget::Comment.entity(), comment_id))?;

        metrics::record_mutation("comment", "vote");
        info!(comment_id, delta, votes = comment.votes, "Comment votes updated");

        Ok(comment)
    }

    pub async fn delete_comment(&self, comment_id: i32) -> Result<()> {
        let result = CommentEntity::delete_by_id(comment_id)
            .exec(self.write_conn())
            .await?;

        if result.rows_affected == 0 {
            return Err(AppError::not_found("comment", comment_id));
        }

        metrics::record_mutation("comment", "delete");
        info!(comment_id, "Comment deleted");

        Ok(())
    }
}
