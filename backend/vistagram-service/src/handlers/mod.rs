//! HTTP handlers. Each one builds the service it needs from [`AppState`](crate::AppState)
//! and maps the result onto a response.

pub mod auth;
pub mod bookmarks;
pub mod health;
pub mod posts;
pub mod upload;
pub mod users;

use actix_web::HttpResponse;
use uuid::Uuid;

use crate::error::{AppError, Result};

/// Path ids that do not parse can never name a post.
pub(crate) fn parse_post_id(raw: &str) -> Result<Uuid> {
    Uuid::parse_str(raw.trim()).map_err(|_| AppError::NotFound("Post not found".to_string()))
}

/// Fallback for any route that is not registered
pub async fn not_found() -> HttpResponse {
    HttpResponse::NotFound().json(serde_json::json!({ "error": "Route not found" }))
}
