//! Comment handlers

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use super::VoteUpdate;
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::AppState;
use newsboard_common::{
    db::{
        models::{Comment, CommentRow, NewComment},
        Repository,
    },
    errors::Result,
    query::CommentListQuery,
};

#[derive(Serialize)]
pub struct CommentsResponse {
    pub comments: Vec<CommentRow>,
}

#[derive(Serialize)]
pub struct CommentResponse {
    pub comment: Comment,
}

pub async fn list_comments(
    State(state): State<AppState>,
    ApiPath(article_id): ApiPath<i32>,
    ApiQuery(query): ApiQuery<CommentListQuery>,
) -> Result<Json<CommentsResponse>> {
    let pagination = query.validate()?;
    let comments = Repository::new(state.db.clone())
        .list_comments(article_id, pagination)
        .await?;
    Ok(Json(CommentsResponse { comments }))
}

/// Post a comment; unknown body properties are ignored
pub async fn create_comment(
    State(state): State<AppState>,
    ApiPath(article_id): ApiPath<i32>,
    ApiJson(new_comment): ApiJson<NewComment>,
) -> Result<(StatusCode, Json<CommentResponse>)> {
    let comment = Repository::new(state.db.clone())
        .create_comment(article_id, new_comment)
        .await?;
    Ok((StatusCode::CREATED, Json(CommentResponse { comment })))
}

pub async fn vote_on_comment(
    State(state): State<AppState>,
    ApiPath(comment_id): ApiPath<i32>,
    ApiJson(update): ApiJson<VoteUpdate>,
) -> Result<(StatusCode, Json<CommentResponse>)> {
    let comment = Repository::new(state.db.clone())
        .increment_comment_votes(comment_id, update.inc_votes)
        .await?;
    Ok((StatusCode::ACCEPTED, Json(CommentResponse { comment })))
}

pub async fn delete_comment(
    State(state): State<AppState>,
    ApiPath(comment_id): ApiPath<i32>,
) -> Result<StatusCode> {
    Repository::new(state.db.clone()).delete_comment(comment_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
