use actix_web::{
    dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform},
    http::StatusCode,
    Error, FromRequest, HttpMessage, HttpRequest, HttpResponse, ResponseError,
};
use futures::future::{ready, LocalBoxFuture, Ready};
use std::rc::Rc;
use uuid::Uuid;

/// Caller identity resolved from a valid bearer token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserId(pub Uuid);

/// Marker left in request extensions when a bearer token was present but invalid.
#[derive(Debug, Clone, Copy)]
struct RejectedToken;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Access token required")]
    MissingToken,
    #[error("Invalid or expired token")]
    InvalidToken,
}

impl ResponseError for AuthError {
    fn status_code(&self) -> StatusCode {
        match self {
            AuthError::MissingToken => StatusCode::UNAUTHORIZED,
            AuthError::InvalidToken => StatusCode::FORBIDDEN,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(serde_json::json!({
            "error": self.to_string(),
        }))
    }
}

/// Bearer credential middleware.
///
/// Resolves `Authorization: Bearer <jwt>` into a [`UserId`] request extension and
/// never rejects on its own. Handlers decide: extracting `UserId` makes a route
/// protected, extracting `Option<UserId>` makes authentication optional.
pub struct JwtAuthMiddleware;

impl<S, B> Transform<S, ServiceRequest> for JwtAuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = JwtAuthMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(JwtAuthMiddlewareService {
            service: Rc::new(service),
        }))
    }
}

pub struct JwtAuthMiddlewareService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for JwtAuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();

        Box::pin(async move {
            let header = req
                .headers()
                .get("Authorization")
                .map(|h| h.to_str().unwrap_or_default().to_string());

            if let Some(header) = header {
                match resolve_bearer(&header) {
                    Ok(user_id) => {
                        req.extensions_mut().insert(UserId(user_id));
                    }
                    Err(reason) => {
                        tracing::debug!(reason = %reason, path = %req.path(), "Bearer token rejected");
                        req.extensions_mut().insert(RejectedToken);
                    }
                }
            }

            service.call(req).await
        })
    }
}

fn resolve_bearer(header: &str) -> Result<Uuid, String> {
    let token = header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| "Invalid Authorization header format".to_string())?;

    crypto_core::jwt::get_user_id_from_token(token).map_err(|e| e.to_string())
}

impl FromRequest for UserId {
    type Error = AuthError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let extensions = req.extensions();
        let result = match extensions.get::<UserId>() {
            Some(user_id) => Ok(*user_id),
            None if extensions.get::<RejectedToken>().is_some() => Err(AuthError::InvalidToken),
            None => Err(AuthError::MissingToken),
        };
        ready(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{test, web, App};

    fn init_secret() {
        static INIT: std::sync::Once = std::sync::Once::new();
        INIT.call_once(|| {
            crypto_core::jwt::initialize_jwt_secret("middleware-test-secret-0123456789", 1)
                .expect("Failed to initialize JWT secret");
        });
    }

    async fn protected(user_id: UserId) -> HttpResponse {
        HttpResponse::Ok().body(user_id.0.to_string())
    }

    async fn optional(user_id: Option<UserId>) -> HttpResponse {
        match user_id {
            Some(id) => HttpResponse::Ok().body(id.0.to_string()),
            None => HttpResponse::Ok().body("anonymous"),
        }
    }

    macro_rules! app {
        () => {
            test::init_service(
                App::new()
                    .wrap(JwtAuthMiddleware)
                    .route("/protected", web::get().to(protected))
                    .route("/optional", web::get().to(optional)),
            )
            .await
        };
    }

    #[actix_web::test]
    async fn test_missing_token_is_401() {
        init_secret();
        let app = app!();

        let req = test::TestRequest::get().uri("/protected").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "Access token required");
    }

    #[actix_web::test]
    async fn test_invalid_token_is_403() {
        init_secret();
        let app = app!();

        let req = test::TestRequest::get()
            .uri("/protected")
            .insert_header(("Authorization", "Bearer not.a.jwt"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }

    #[actix_web::test]
    async fn test_non_bearer_scheme_is_403() {
        init_secret();
        let app = app!();

        let req = test::TestRequest::get()
            .uri("/protected")
            .insert_header(("Authorization", "Basic YWxpY2U6c2VjcmV0"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }

    #[actix_web::test]
    async fn test_valid_token_resolves_user() {
        init_secret();
        let app = app!();
        let user_id = Uuid::new_v4();
        let token = crypto_core::jwt::generate_token(user_id, "alice").unwrap();

        let req = test::TestRequest::get()
            .uri("/protected")
            .insert_header(("Authorization", format!("Bearer {token}")))
            .to_request();
        let body = test::call_and_read_body(&app, req).await;
        assert_eq!(body, user_id.to_string().as_bytes());
    }

    #[actix_web::test]
    async fn test_optional_route_tolerates_bad_token() {
        init_secret();
        let app = app!();

        let req = test::TestRequest::get()
            .uri("/optional")
            .insert_header(("Authorization", "Bearer garbage"))
            .to_request();
        let body = test::call_and_read_body(&app, req).await;
        assert_eq!(body, "anonymous".as_bytes());
    }
}
