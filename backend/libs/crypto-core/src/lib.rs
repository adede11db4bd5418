//! Credential primitives shared by Vistagram crates.
//!
//! - `jwt`: HS256 bearer token issuance and validation
//! - `password`: Argon2id password hashing

pub mod jwt;
pub mod password;

pub use password::{hash_password, verify_password, PasswordError};
