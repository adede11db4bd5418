//! Token lifecycle as seen by a consuming service.
use crypto_core::jwt::{generate_token, initialize_jwt_secret, validate_token};
use std::sync::Once;
use uuid::Uuid;

static INIT: Once = Once::new();

fn init() {
    INIT.call_once(|| {
        initialize_jwt_secret("integration-test-secret-0123456789abcdef", 168)
            .expect("Failed to initialize JWT secret");
    });
}

#[test]
fn token_lifetime_matches_configured_hours() {
    init();

    let token = generate_token(Uuid::new_v4(), "bob").unwrap();
    let claims = validate_token(&token).unwrap().claims;

    assert_eq!(claims.exp - claims.iat, 168 * 3600);
}

#[test]
fn tampered_signature_is_rejected() {
    init();

    let token = generate_token(Uuid::new_v4(), "bob").unwrap();
    let (head, sig) = token.rsplit_once('.').unwrap();
    let flipped: String = sig
        .chars()
        .map(|c| if c == 'A' { 'B' } else { 'A' })
        .collect();

    assert!(validate_token(&format!("{head}.{flipped}")).is_err());
}

#[test]
fn distinct_users_get_distinct_tokens() {
    init();

    let a = generate_token(Uuid::new_v4(), "a").unwrap();
    let b = generate_token(Uuid::new_v4(), "b").unwrap();
    assert_ne!(a, b);
}
