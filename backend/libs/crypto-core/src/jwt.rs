//! Bearer token issuance and validation (HS256).
//!
//! Services call `initialize_jwt_secret()` once during startup, before any
//! token is generated or validated:
//!
//! ```rust,no_run
//! use crypto_core::jwt;
//!
//! let secret = std::env::var("JWT_SECRET").unwrap_or_default();
//! jwt::initialize_jwt_secret(&secret, 168).expect("JWT secret already set");
//! ```
use anyhow::{anyhow, Result};
use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, Algorithm, DecodingKey, EncodingKey, Header, TokenData, Validation,
};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const JWT_ALGORITHM: Algorithm = Algorithm::HS256;

/// Claims carried by every Vistagram access token
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (user ID as UUID string)
    pub sub: String,
    pub username: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    expiry: Duration,
}

/// Set once at startup, immutable afterwards.
static JWT_KEYS: OnceCell<JwtKeys> = OnceCell::new();

/// Initialize the shared HS256 secret and token lifetime.
///
/// Can only be called once; a second call returns an error and leaves the
/// first configuration in place.
pub fn initialize_jwt_secret(secret: &str, expiry_hours: i64) -> Result<()> {
    if secret.is_empty() {
        return Err(anyhow!("JWT secret must not be empty"));
    }
    if expiry_hours <= 0 {
        return Err(anyhow!("JWT expiry must be positive, got {expiry_hours}h"));
    }

    JWT_KEYS
        .set(JwtKeys {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            expiry: Duration::hours(expiry_hours),
        })
        .map_err(|_| anyhow!("JWT secret already initialized"))
}

/// Whether `initialize_jwt_secret` has run.
pub fn is_initialized() -> bool {
    JWT_KEYS.get().is_some()
}

fn keys() -> Result<&'static JwtKeys> {
    JWT_KEYS
        .get()
        .ok_or_else(|| anyhow!("JWT secret not initialized. Call initialize_jwt_secret() during startup."))
}

/// Issue an access token for a user.
pub fn generate_token(user_id: Uuid, username: &str) -> Result<String> {
    let keys = keys()?;
    let now = Utc::now();

    let claims = Claims {
        sub: user_id.to_string(),
        username: username.to_string(),
        iat: now.timestamp(),
        exp: (now + keys.expiry).timestamp(),
    };

    encode(&Header::new(JWT_ALGORITHM), &claims, &keys.encoding)
        .map_err(|e| anyhow!("Failed to generate token: {e}"))
}

/// Validate signature and expiry, returning the decoded claims.
///
/// Only HS256 is accepted; tokens signed with any other algorithm fail.
pub fn validate_token(token: &str) -> Result<TokenData<Claims>> {
    let keys = keys()?;

    let mut validation = Validation::new(JWT_ALGORITHM);
    validation.validate_exp = true;
    validation.leeway = 0;

    decode::<Claims>(token, &keys.decoding, &validation)
        .map_err(|e| anyhow!("Token validation failed: {e}"))
}

/// Extract the user ID from a validated token.
pub fn get_user_id_from_token(token: &str) -> Result<Uuid> {
    let token_data = validate_token(token)?;
    Uuid::parse_str(&token_data.claims.sub)
        .map_err(|e| anyhow!("Invalid user ID format in token: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_SECRET: &str = "unit-test-secret-that-is-long-enough-for-hs256";

    fn init_test_secret() {
        static INIT: std::sync::Once = std::sync::Once::new();
        INIT.call_once(|| {
            initialize_jwt_secret(TEST_SECRET, 1).expect("Failed to initialize test secret");
        });
    }

    #[test]
    fn test_generate_token_has_three_parts() {
        init_test_secret();

        let token = generate_token(Uuid::new_v4(), "alice").expect("token");
        assert_eq!(token.matches('.').count(), 2);
    }

    #[test]
    fn test_validate_round_trips_claims() {
        init_test_secret();

        let user_id = Uuid::new_v4();
        let token = generate_token(user_id, "alice").expect("token");

        let data = validate_token(&token).expect("valid token");
        assert_eq!(data.claims.sub, user_id.to_string());
        assert_eq!(data.claims.username, "alice");
        assert!(data.claims.exp > data.claims.iat);
        assert_eq!(get_user_id_from_token(&token).unwrap(), user_id);
    }

    #[test]
    fn test_validate_rejects_garbage() {
        init_test_secret();
        assert!(validate_token("invalid.token.here").is_err());
    }

    #[test]
    fn test_validate_rejects_foreign_secret() {
        init_test_secret();

        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: Uuid::new_v4().to_string(),
            username: "mallory".into(),
            iat: now,
            exp: now + 3600,
        };
        let forged = encode(
            &Header::new(JWT_ALGORITHM),
            &claims,
            &EncodingKey::from_secret(b"some-other-secret"),
        )
        .unwrap();

        assert!(validate_token(&forged).is_err());
    }

    #[test]
    fn test_validate_rejects_expired() {
        init_test_secret();

        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: Uuid::new_v4().to_string(),
            username: "alice".into(),
            iat: now - 7200,
            exp: now - 3600,
        };
        let expired = encode(
            &Header::new(JWT_ALGORITHM),
            &claims,
            &EncodingKey::from_secret(TEST_SECRET.as_bytes()),
        )
        .unwrap();

        assert!(validate_token(&expired).is_err());
    }

    #[test]
    fn test_second_initialization_fails() {
        init_test_secret();
        assert!(is_initialized());
        assert!(initialize_jwt_secret("another-secret", 1).is_err());
    }
}
