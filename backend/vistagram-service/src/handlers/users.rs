use actix_web::{web, HttpResponse};

use crate::error::Result;
use crate::models::ProfileResponse;
use crate::services::ProfileService;
use crate::AppState;

/// Public profile with post and like totals
#[utoipa::path(
    get,
    path = "/api/users/{username}",
    tag = "users",
    params(("username" = String, Path, description = "Unique username")),
    responses(
        (status = 200, description = "Profile", body = ProfileResponse),
        (status = 404, description = "User not found")
    )
)]
pub async fn get_profile(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let profile = ProfileService::new(state.store.clone())
        .get_profile(path.trim())
        .await?;
    Ok(HttpResponse::Ok().json(profile))
}
