use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::AppState;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub environment: String,
}

/// Liveness probe; never touches the database
#[utoipa::path(
    get,
    path = "/api/health",
    tag = "health",
    responses((status = 200, description = "Service is up", body = HealthResponse))
)]
pub async fn health_check(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(HealthResponse {
        status: "OK".to_string(),
        timestamp: Utc::now(),
        environment: state.environment.as_str().to_string(),
    })
}

/// Readiness probe: 503 until the store answers
#[utoipa::path(
    get,
    path = "/api/health/ready",
    tag = "health",
    responses(
        (status = 200, description = "Store reachable", body = HealthResponse),
        (status = 503, description = "Store unreachable", body = HealthResponse)
    )
)]
pub async fn readiness_check(state: web::Data<AppState>) -> HttpResponse {
    let environment = state.environment.as_str().to_string();

    match state.store.ping().await {
        Ok(()) => HttpResponse::Ok().json(HealthResponse {
            status: "OK".to_string(),
            timestamp: Utc::now(),
            environment,
        }),
        Err(e) => {
            tracing::warn!(error = %e, "readiness check failed");
            HttpResponse::ServiceUnavailable().json(HealthResponse {
                status: "UNAVAILABLE".to_string(),
                timestamp: Utc::now(),
                environment,
            })
        }
    }
}
