//! Shared harness for service integration tests.
//!
//! Builds the real `/api` app over the in-memory store and image store, plus
//! helpers for bearer headers and hand-rolled multipart bodies.
#![allow(dead_code)]

use std::sync::{Arc, Once};
use vistagram_service::config::Environment;
use vistagram_service::db::MemoryStore;
use vistagram_service::storage::MemoryImageStore;
use vistagram_service::AppState;

pub const CLIENT_URL: &str = "https://vistagram.test";
pub const BOUNDARY: &str = "----vistagram-test-boundary";

/// Smallest byte sequence that starts like a JPEG file
pub const JPEG_BYTES: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F', 0x00, 0xFF, 0xD9];

static JWT_INIT: Once = Once::new();

pub fn init_jwt() {
    JWT_INIT.call_once(|| {
        crypto_core::jwt::initialize_jwt_secret("integration-secret-0123456789abcdef0123", 24)
            .expect("jwt secret initializes once");
    });
}

pub struct TestContext {
    pub store: Arc<MemoryStore>,
    pub images: Arc<MemoryImageStore>,
    pub state: AppState,
}

impl TestContext {
    pub fn new() -> Self {
        init_jwt();
        let store = Arc::new(MemoryStore::new());
        let images = Arc::new(MemoryImageStore::new("https://images.vistagram.test"));
        let state = AppState::new(store.clone(), images.clone(), CLIENT_URL, Environment::Development);
        Self { store, images, state }
    }
}

/// Build the full app (credential middleware, `/api` routes, 404 fallback).
macro_rules! init_app {
    ($state:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data(actix_web::web::Data::new($state.clone()))
                .configure(vistagram_service::configure_api)
                .default_service(actix_web::web::to(vistagram_service::handlers::not_found))
                .wrap(actix_middleware::JwtAuthMiddleware),
        )
        .await
    };
}

pub fn bearer(token: &str) -> (actix_web::http::header::HeaderName, String) {
    (actix_web::http::header::AUTHORIZATION, format!("Bearer {token}"))
}

pub enum Part<'a> {
    Text {
        name: &'a str,
        value: &'a str,
    },
    File {
        name: &'a str,
        filename: &'a str,
        content_type: &'a str,
        bytes: &'a [u8],
    },
}

/// Returns the `Content-Type` header value and the encoded body.
pub fn multipart(parts: &[Part<'_>]) -> (String, Vec<u8>) {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match part {
            Part::Text { name, value } => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
                );
                body.extend_from_slice(value.as_bytes());
            }
            Part::File {
                name,
                filename,
                content_type,
                bytes,
            } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\nContent-Type: {content_type}\r\n\r\n"
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(bytes);
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    (format!("multipart/form-data; boundary={BOUNDARY}"), body)
}

/// Standard post form: a JPEG image plus caption
pub fn post_form(caption: &str) -> (String, Vec<u8>) {
    multipart(&[
        Part::File {
            name: "image",
            filename: "photo.jpg",
            content_type: "image/jpeg",
            bytes: JPEG_BYTES,
        },
        Part::Text {
            name: "caption",
            value: caption,
        },
    ])
}
