/// OpenAPI documentation for the Vistagram API
use actix_web::HttpResponse;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::OpenApi;

use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Vistagram API",
        version = "1.0.0",
        description = "Photo sharing: accounts, image posts, a paginated feed, likes, shares, bookmarks and profiles.",
        license(name = "MIT")
    ),
    servers(
        (url = "http://localhost:5000", description = "Development server"),
    ),
    paths(
        handlers::health::health_check,
        handlers::health::readiness_check,
        handlers::auth::register,
        handlers::auth::login,
        handlers::auth::me,
        handlers::posts::create_post,
        handlers::posts::list_posts,
        handlers::posts::get_post,
        handlers::posts::toggle_like,
        handlers::posts::share_post,
        handlers::bookmarks::toggle_bookmark,
        handlers::bookmarks::list_bookmarks,
        handlers::users::get_profile,
    ),
    components(schemas(
        models::RegisterRequest,
        models::LoginRequest,
        models::AuthResponse,
        models::MeResponse,
        models::UserResponse,
        models::PublicUser,
        models::PostView,
        models::CreatePostResponse,
        models::PostResponse,
        models::Pagination,
        models::FeedResponse,
        models::LikeResponse,
        models::ShareResponse,
        models::BookmarkResponse,
        models::ProfileResponse,
        handlers::posts::CreatePostForm,
        handlers::health::HealthResponse,
    )),
    tags(
        (name = "health", description = "Liveness and readiness probes"),
        (name = "auth", description = "Registration, login and the current user"),
        (name = "posts", description = "Feed, post creation, likes and shares"),
        (name = "bookmarks", description = "Server-side bookmarks"),
        (name = "users", description = "Public profiles"),
    ),
    modifiers(&SecurityAddon),
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("JWT Bearer token"))
                        .build(),
                ),
            )
        }
    }
}

pub async fn openapi_json() -> HttpResponse {
    HttpResponse::Ok().json(ApiDoc::openapi())
}
