/// Post handlers - feed, single post, creation, like and share
use actix_middleware::{client_ip, UserId};
use actix_multipart::Multipart;
use actix_web::{web, HttpRequest, HttpResponse};

use crate::error::Result;
use crate::handlers::{parse_post_id, upload};
use crate::models::{CreatePostResponse, FeedResponse, LikeResponse, PostResponse, ShareResponse};
use crate::pagination::{PageQuery, PageRequest};
use crate::services::{EngagementService, PostService};
use crate::AppState;

/// Multipart body accepted by `POST /api/posts`
#[allow(dead_code)]
#[derive(utoipa::ToSchema)]
pub struct CreatePostForm {
    /// JPG, PNG or WEBP, at most 5MB
    #[schema(value_type = String, format = Binary)]
    image: Vec<u8>,
    caption: String,
    location: Option<String>,
}

/// Create a post from an uploaded image
#[utoipa::path(
    post,
    path = "/api/posts",
    tag = "posts",
    request_body(content = CreatePostForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Post created", body = CreatePostResponse),
        (status = 400, description = "Missing image or caption, bad file type or size"),
        (status = 401, description = "Access token required")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_post(
    state: web::Data<AppState>,
    user_id: UserId,
    payload: Multipart,
) -> Result<HttpResponse> {
    let draft = upload::read_post_form(payload).await?;
    let post = PostService::new(state.store.clone(), state.images.clone())
        .create_post(user_id.0, draft)
        .await?;

    Ok(HttpResponse::Created().json(CreatePostResponse {
        message: "Post created successfully".to_string(),
        post,
    }))
}

/// Reverse-chronological feed
#[utoipa::path(
    get,
    path = "/api/posts",
    tag = "posts",
    params(
        ("page" = Option<i64>, Query, description = "1-based page number"),
        ("limit" = Option<i64>, Query, description = "Page size, at most 50")
    ),
    responses((status = 200, description = "One page of posts", body = FeedResponse))
)]
pub async fn list_posts(
    state: web::Data<AppState>,
    viewer: Option<UserId>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse> {
    let page = PageRequest::from_query(&query);
    let feed = PostService::new(state.store.clone(), state.images.clone())
        .feed(page, viewer.map(|v| v.0))
        .await?;
    Ok(HttpResponse::Ok().json(feed))
}

/// Get a post by ID
#[utoipa::path(
    get,
    path = "/api/posts/{id}",
    tag = "posts",
    params(("id" = String, Path, description = "Post id")),
    responses(
        (status = 200, description = "The post", body = PostResponse),
        (status = 404, description = "Post not found")
    )
)]
pub async fn get_post(
    state: web::Data<AppState>,
    viewer: Option<UserId>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let post_id = parse_post_id(&path)?;
    let post = PostService::new(state.store.clone(), state.images.clone())
        .get_post(post_id, viewer.map(|v| v.0))
        .await?;
    Ok(HttpResponse::Ok().json(PostResponse { post }))
}

/// Toggle the caller's like
#[utoipa::path(
    post,
    path = "/api/posts/{id}/like",
    tag = "posts",
    params(("id" = String, Path, description = "Post id")),
    responses(
        (status = 200, description = "New like state", body = LikeResponse),
        (status = 401, description = "Access token required"),
        (status = 404, description = "Post not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn toggle_like(
    state: web::Data<AppState>,
    user_id: UserId,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let post_id = parse_post_id(&path)?;
    let response = EngagementService::new(state.store.clone(), state.client_url.clone())
        .toggle_like(user_id.0, post_id)
        .await?;
    Ok(HttpResponse::Ok().json(response))
}

/// Record a share and hand back a link to the post
#[utoipa::path(
    post,
    path = "/api/posts/{id}/share",
    tag = "posts",
    params(("id" = String, Path, description = "Post id")),
    responses(
        (status = 200, description = "Share recorded", body = ShareResponse),
        (status = 404, description = "Post not found")
    )
)]
pub async fn share_post(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let post_id = parse_post_id(&path)?;
    let ip = client_ip(&req, &state.trusted_proxies).map(|ip| ip.to_string());
    let response = EngagementService::new(state.store.clone(), state.client_url.clone())
        .share(post_id, ip)
        .await?;
    Ok(HttpResponse::Ok().json(response))
}
