//! Topic handlers

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use crate::extract::ApiJson;
use crate::AppState;
use newsboard_common::{
    db::{models::{NewTopic, Topic}, Repository},
    errors::Result,
};

#[derive(Serialize)]
pub struct TopicsResponse {
    pub topics: Vec<Topic>,
}

#[derive(Serialize)]
pub struct TopicResponse {
    pub topic: Topic,
}

pub async fn list_topics(State(state): State<AppState>) -> Result<Json<TopicsResponse>> {
    let topics = Repository::new(state.db.clone()).list_topics().await?;
    Ok(Json(TopicsResponse { topics }))
}

pub async fn create_topic(
    State(state): State<AppState>,
    ApiJson(new_topic): ApiJson<NewTopic>,
) -> Result<(StatusCode, Json<TopicResponse>)> {
    let topic = Repository::new(state.db.clone()).create_topic(new_topic).await?;
    Ok((StatusCode::CREATED, Json(TopicResponse { topic })))
}
