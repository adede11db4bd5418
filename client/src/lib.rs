//! # Vistagram Client
//!
//! Client side of the Vistagram API:
//! - `api`: typed HTTP client over the REST surface
//! - `storage`: file-backed key-value store standing in for browser storage
//! - `session`: persisted bearer token and signed-in user
//! - `bookmarks`: device-local bookmark set
//! - `feed`: paginated feed state with optimistic likes

pub mod api;
pub mod bookmarks;
pub mod error;
pub mod feed;
pub mod models;
pub mod session;
pub mod storage;

pub use api::{ApiClient, FeedApi};
pub use bookmarks::BookmarkStore;
pub use error::{ClientError, Result};
pub use feed::{Feed, FeedState, LoadTicket, PAGE_SIZE};
pub use session::Session;
pub use storage::LocalStorage;
