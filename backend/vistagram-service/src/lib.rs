//! Vistagram Service Library
//!
//! REST backend for a photo-sharing feed: accounts, image posts, likes,
//! shares, bookmarks and profiles.

pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod models;
pub mod openapi;
pub mod pagination;
pub mod services;
pub mod storage;

use actix_web::web;
use std::net::IpAddr;
use std::sync::Arc;

use crate::config::Environment;
use crate::db::SocialStore;
use crate::error::AppError;
use crate::handlers::{auth, bookmarks, health, posts, users};
use crate::storage::ImageStore;

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn SocialStore>,
    pub images: Arc<dyn ImageStore>,
    /// Web client base URL used to build share links
    pub client_url: String,
    pub environment: Environment,
    /// Proxies whose `X-Forwarded-For` is believed when recording share IPs
    pub trusted_proxies: Vec<IpAddr>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn SocialStore>,
        images: Arc<dyn ImageStore>,
        client_url: impl Into<String>,
        environment: Environment,
    ) -> Self {
        Self {
            store,
            images,
            client_url: client_url.into().trim_end_matches('/').to_string(),
            environment,
            trusted_proxies: Vec::new(),
        }
    }

    pub fn with_trusted_proxies(mut self, trusted_proxies: Vec<IpAddr>) -> Self {
        self.trusted_proxies = trusted_proxies;
        self
    }
}

/// Register every `/api` route plus the extractor error handlers.
pub fn configure_api(cfg: &mut web::ServiceConfig) {
    let json_config = web::JsonConfig::default()
        .error_handler(|err, _req| AppError::Validation(err.to_string()).into());
    let query_config = web::QueryConfig::default()
        .error_handler(|err, _req| AppError::Validation(err.to_string()).into());

    cfg.app_data(json_config).app_data(query_config).service(
        web::scope("/api")
            .route("/health", web::get().to(health::health_check))
            .route("/health/ready", web::get().to(health::readiness_check))
            .route("/openapi.json", web::get().to(openapi::openapi_json))
            .service(
                web::scope("/auth")
                    .route("/register", web::post().to(auth::register))
                    .route("/login", web::post().to(auth::login))
                    .route("/me", web::get().to(auth::me)),
            )
            .service(
                web::resource("/posts")
                    .route(web::get().to(posts::list_posts))
                    .route(web::post().to(posts::create_post)),
            )
            .route("/posts/{id}", web::get().to(posts::get_post))
            .route("/posts/{id}/like", web::post().to(posts::toggle_like))
            .route("/posts/{id}/share", web::post().to(posts::share_post))
            .route("/posts/{id}/bookmark", web::post().to(bookmarks::toggle_bookmark))
            .route("/bookmarks", web::get().to(bookmarks::list_bookmarks))
            .route("/users/{username}", web::get().to(users::get_profile)),
    );
}
