//! Endpoint descriptor served at `GET /api`

use axum::{http::header, response::IntoResponse};

const ENDPOINTS: &str = include_str!("../../endpoints.json");

pub async fn endpoints() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "application/json")], ENDPOINTS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_is_valid_json() {
        let descriptor: serde_json::Value = serde_json::from_str(ENDPOINTS).unwrap();
        assert!(descriptor.get("GET /api/articles").is_some());
        assert!(descriptor.get("PATCH /api/comments/:comment_id").is_some());
    }
}
