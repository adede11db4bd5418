use actix_middleware::UserId;
use actix_web::{web, HttpResponse};

use crate::error::Result;
use crate::handlers::parse_post_id;
use crate::models::{BookmarkResponse, FeedResponse};
use crate::pagination::{PageQuery, PageRequest};
use crate::services::EngagementService;
use crate::AppState;

/// Toggle a server-side bookmark
#[utoipa::path(
    post,
    path = "/api/posts/{id}/bookmark",
    tag = "bookmarks",
    params(("id" = String, Path, description = "Post id")),
    responses(
        (status = 200, description = "New bookmark state", body = BookmarkResponse),
        (status = 401, description = "Access token required"),
        (status = 404, description = "Post not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn toggle_bookmark(
    state: web::Data<AppState>,
    user_id: UserId,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let post_id = parse_post_id(&path)?;
    let response = EngagementService::new(state.store.clone(), state.client_url.clone())
        .toggle_bookmark(user_id.0, post_id)
        .await?;
    Ok(HttpResponse::Ok().json(response))
}

/// Caller's bookmarked posts, most recent bookmark first
#[utoipa::path(
    get,
    path = "/api/bookmarks",
    tag = "bookmarks",
    params(
        ("page" = Option<i64>, Query, description = "1-based page number"),
        ("limit" = Option<i64>, Query, description = "Page size, at most 50")
    ),
    responses(
        (status = 200, description = "One page of bookmarked posts", body = FeedResponse),
        (status = 401, description = "Access token required")
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_bookmarks(
    state: web::Data<AppState>,
    user_id: UserId,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse> {
    let page = PageRequest::from_query(&query);
    let response = EngagementService::new(state.store.clone(), state.client_url.clone())
        .bookmarks(user_id.0, page)
        .await?;
    Ok(HttpResponse::Ok().json(response))
}
