//! User handlers

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use crate::extract::{ApiJson, ApiPath};
use crate::AppState;
use newsboard_common::{
    db::{models::{NewUser, User}, Repository},
    errors::Result,
};

#[derive(Serialize)]
pub struct UsersResponse {
    pub users: Vec<User>,
}

#[derive(Serialize)]
pub struct UserResponse {
    pub user: User,
}

pub async fn list_users(State(state): State<AppState>) -> Result<Json<UsersResponse>> {
    let users = Repository::new(state.db.clone()).list_users().await?;
    Ok(Json(UsersResponse { users }))
}

pub async fn get_user(
    State(state): State<AppState>,
    ApiPath(username): ApiPath<String>,
) -> Result<Json<UserResponse>> {
    let user = Repository::new(state.db.clone()).get_user(&username).await?;
    Ok(Json(UserResponse { user }))
}

pub async fn create_user(
    State(state): State<AppState>,
    ApiJson(new_user): ApiJson<NewUser>,
) -> Result<(StatusCode, Json<UserResponse>)> {
    let user = Repository::new(state.db.clone()).create_user(new_user).await?;
    Ok((StatusCode::CREATED, Json(UserResponse { user })))
}

/// Remove a user along with their articles and comments
pub async fn delete_user(
    State(state): State<AppState>,
    ApiPath(username): ApiPath<String>,
) -> Result<StatusCode> {
    Repository::new(state.db.clone()).delete_user(&username).await?;
    Ok(StatusCode::NO_CONTENT)
}
