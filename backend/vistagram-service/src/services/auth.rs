use crate::db::{NewUser, SocialStore};
use crate::error::{AppError, Result, ResultExt};
use crate::models::{AuthResponse, LoginRequest, RegisterRequest, UserResponse};
use crate::services::validate_request;
use std::sync::Arc;
use uuid::Uuid;

const INVALID_CREDENTIALS: &str = "Invalid credentials";

pub struct AuthService {
    store: Arc<dyn SocialStore>,
}

impl AuthService {
    pub fn new(store: Arc<dyn SocialStore>) -> Self {
        Self { store }
    }

    pub async fn register(&self, request: RegisterRequest) -> Result<AuthResponse> {
        let request = RegisterRequest {
            username: request.username.trim().to_string(),
            email: request.email.trim().to_lowercase(),
            password: request.password,
        };
        validate_request(&request)?;

        if self
            .store
            .user_exists(&request.username, &request.email)
            .await
            .context("Failed to register user")?
        {
            return Err(AppError::Conflict(
                "User with this email or username already exists".to_string(),
            ));
        }

        let password_hash = hash_blocking(request.password)
            .await
            .context("Failed to register user")?;

        let user = self
            .store
            .create_user(NewUser {
                username: request.username,
                email: request.email,
                password_hash,
            })
            .await
            .context("Failed to register user")?;

        tracing::info!(user_id = %user.id, username = %user.username, "user registered");

        Ok(AuthResponse {
            message: "User registered successfully".to_string(),
            token: issue_token(user.id, &user.username)?,
            user: UserResponse::from(&user),
        })
    }

    pub async fn login(&self, request: LoginRequest) -> Result<AuthResponse> {
        let request = LoginRequest {
            email: request.email.trim().to_lowercase(),
            password: request.password,
        };
        validate_request(&request)?;

        let user = self
            .store
            .find_user_by_email(&request.email)
            .await
            .context("Failed to login")?
            .ok_or_else(|| AppError::Unauthorized(INVALID_CREDENTIALS.to_string()))?;

        let hash = user.password_hash.clone();
        let password = request.password;
        let matches = tokio::task::spawn_blocking(move || {
            crypto_core::verify_password(&password, &hash)
        })
        .await
        .map_err(|e| AppError::Internal(format!("password verification task failed: {e}")))
        .context("Failed to login")?
        .context("Failed to login")?;

        if !matches {
            tracing::info!(user_id = %user.id, "login rejected");
            return Err(AppError::Unauthorized(INVALID_CREDENTIALS.to_string()));
        }

        Ok(AuthResponse {
            message: "Login successful".to_string(),
            token: issue_token(user.id, &user.username)?,
            user: UserResponse::from(&user),
        })
    }

    pub async fn current_user(&self, user_id: Uuid) -> Result<UserResponse> {
        self.store
            .find_user_by_id(user_id)
            .await
            .context("Failed to fetch user")?
            .map(|user| UserResponse::from(&user))
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }
}

async fn hash_blocking(password: String) -> Result<String> {
    tokio::task::spawn_blocking(move || crypto_core::hash_password(&password))
        .await
        .map_err(|e| AppError::Internal(format!("password hashing task failed: {e}")))?
        .map_err(AppError::from)
}

fn issue_token(user_id: Uuid, username: &str) -> Result<String> {
    crypto_core::jwt::generate_token(user_id, username)
        .map_err(|e| AppError::Internal(e.to_string()))
        .context("Failed to issue token")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use crate::test_support::init_jwt;

    fn service() -> AuthService {
        init_jwt();
        AuthService::new(Arc::new(MemoryStore::new()))
    }

    fn alice() -> RegisterRequest {
        RegisterRequest {
            username: "alice".into(),
            email: "alice@x.com".into(),
            password: "secret1".into(),
        }
    }

    #[tokio::test]
    async fn test_register_then_login() {
        let auth = service();

        let registered = auth.register(alice()).await.unwrap();
        assert_eq!(registered.user.username, "alice");
        assert!(!registered.token.is_empty());

        let logged_in = auth
            .login(LoginRequest {
                email: "ALICE@x.com ".into(),
                password: "secret1".into(),
            })
            .await
            .unwrap();
        assert_eq!(logged_in.user.id, registered.user.id);

        let claims = crypto_core::jwt::validate_token(&logged_in.token).unwrap().claims;
        assert_eq!(claims.sub, registered.user.id.to_string());
    }

    #[tokio::test]
    async fn test_duplicate_registration_conflicts() {
        let auth = service();
        auth.register(alice()).await.unwrap();

        let err = auth.register(alice()).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_wrong_password_and_unknown_email_look_the_same() {
        let auth = service();
        auth.register(alice()).await.unwrap();

        let wrong = auth
            .login(LoginRequest {
                email: "alice@x.com".into(),
                password: "nope123".into(),
            })
            .await
            .unwrap_err();
        let unknown = auth
            .login(LoginRequest {
                email: "bob@x.com".into(),
                password: "secret1".into(),
            })
            .await
            .unwrap_err();

        assert_eq!(wrong.to_string(), INVALID_CREDENTIALS);
        assert_eq!(unknown.to_string(), INVALID_CREDENTIALS);
    }

    #[tokio::test]
    async fn test_register_validation_message() {
        let auth = service();
        let err = auth
            .register(RegisterRequest {
                username: "al".into(),
                email: "alice@x.com".into(),
                password: "secret1".into(),
            })
            .await
            .unwrap_err();
        match err {
            AppError::Validation(msg) => assert_eq!(msg, "Username must be 3-20 characters"),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_current_user_missing() {
        let auth = service();
        let err = auth.current_user(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
