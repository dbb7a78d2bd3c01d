//! API handlers module

pub mod api;
pub mod articles;
pub mod comments;
pub mod health;
pub mod topics;
pub mod users;

use newsboard_common::errors::AppError;
use serde::Deserialize;

/// Body of a vote PATCH; `inc_votes` may be negative
#[derive(Debug, Deserialize)]
pub struct VoteUpdate {
    pub inc_votes: i32,
}

/// Fallback for unmatched routes
pub async fn not_found() -> AppError {
    AppError::RouteNotFound
}
