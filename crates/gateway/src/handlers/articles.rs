//! Article handlers

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use super::VoteUpdate;
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::AppState;
use newsboard_common::{
    db::{
        models::{Article, ArticleDetail, ArticleSummary, NewArticle},
        Repository,
    },
    errors::Result,
    query::ArticleListQuery,
};

#[derive(Serialize)]
pub struct ArticlesResponse {
    pub articles: Vec<ArticleSummary>,
}

#[derive(Serialize)]
pub struct ArticleResponse<T> {
    pub article: T,
}

/// List articles.
///
/// Query parameters are validated before any storage call; only the topic
/// filter needs the database to check.
pub async fn list_articles(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ArticleListQuery>,
) -> Result<Json<ArticlesResponse>> {
    let params = query.validate()?;
    let articles = Repository::new(state.db.clone()).list_articles(params).await?;
    Ok(Json(ArticlesResponse { articles }))
}

pub async fn get_article(
    State(state): State<AppState>,
    ApiPath(article_id): ApiPath<i32>,
) -> Result<Json<ArticleResponse<ArticleDetail>>> {
    let article = Repository::new(state.db.clone()).get_article(article_id).await?;
    Ok(Json(ArticleResponse { article }))
}

pub async fn create_article(
    State(state): State<AppState>,
    ApiJson(new_article): ApiJson<NewArticle>,
) -> Result<(StatusCode, Json<ArticleResponse<ArticleDetail>>)> {
    let article = Repository::new(state.db.clone()).create_article(new_article).await?;
    Ok((StatusCode::CREATED, Json(ArticleResponse { article })))
}

pub async fn vote_on_article(
    State(state): State<AppState>,
    ApiPath(article_id): ApiPath<i32>,
    ApiJson(update): ApiJson<VoteUpdate>,
) -> Result<(StatusCode, Json<ArticleResponse<Article>>)> {
    let article = Repository::new(state.db.clone())
        .increment_article_votes(article_id, update.inc_votes)
        .await?;
    Ok((StatusCode::ACCEPTED, Json(ArticleResponse { article })))
}

pub async fn delete_article(
    State(state): State<AppState>,
    ApiPath(article_id): ApiPath<i32>,
) -> Result<StatusCode> {
    Repository::new(state.db.clone()).delete_article(article_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
