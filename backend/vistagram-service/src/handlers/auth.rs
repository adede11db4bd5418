use actix_web::{web, HttpResponse};
use actix_middleware::UserId;

use crate::error::Result;
use crate::models::{AuthResponse, LoginRequest, MeResponse, RegisterRequest};
use crate::services::AuthService;
use crate::AppState;

/// Register endpoint handler
#[utoipa::path(
    post,
    path = "/api/auth/register",
    tag = "auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered", body = AuthResponse),
        (status = 400, description = "Invalid input"),
        (status = 409, description = "Username or email already taken")
    )
)]
pub async fn register(
    state: web::Data<AppState>,
    payload: web::Json<RegisterRequest>,
) -> Result<HttpResponse> {
    let response = AuthService::new(state.store.clone())
        .register(payload.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(response))
}

/// Login endpoint handler
#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login(
    state: web::Data<AppState>,
    payload: web::Json<LoginRequest>,
) -> Result<HttpResponse> {
    let response = AuthService::new(state.store.clone())
        .login(payload.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(response))
}

/// Resolve the caller from their bearer token
#[utoipa::path(
    get,
    path = "/api/auth/me",
    tag = "auth",
    responses(
        (status = 200, description = "Current user", body = MeResponse),
        (status = 401, description = "Access token required"),
        (status = 403, description = "Invalid or expired token")
    ),
    security(("bearer_auth" = []))
)]
pub async fn me(state: web::Data<AppState>, user_id: UserId) -> Result<HttpResponse> {
    let user = AuthService::new(state.store.clone())
        .current_user(user_id.0)
        .await?;
    Ok(HttpResponse::Ok().json(MeResponse { user }))
}
