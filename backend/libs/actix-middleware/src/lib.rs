//! # Actix Middleware Library
//!
//! Request-level middleware shared by Vistagram actix services
//!
//! ## Modules
//! - `jwt_auth`: bearer credential resolution and the `UserId` extractor
//! - `rate_limit`: per-IP fixed-window rate limiting

pub mod jwt_auth;
pub mod rate_limit;

pub use jwt_auth::{AuthError, JwtAuthMiddleware, UserId};
pub use rate_limit::{client_ip, FixedWindowLimiter, RateLimitConfig, RateLimitMiddleware};
