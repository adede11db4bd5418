use uuid::Uuid;

pub type Result<T> = std::result::Result<T, ClientError>;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-2xx response; `message` is the server's `error` field, else the
    /// body text, else empty
    #[error("{}", describe_api(*status, message))]
    Api { status: u16, message: String },

    /// Rejected locally before any request was sent
    #[error("{0}")]
    Validation(String),

    #[error("storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("invalid stored data: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("like for post {0} is still in flight")]
    LikePending(Uuid),

    #[error("post {0} is not in the feed")]
    UnknownPost(Uuid),
}

impl ClientError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            ClientError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

fn describe_api(status: u16, message: &str) -> String {
    if message.is_empty() {
        format!("HTTP {status}")
    } else {
        format!("{message} (HTTP {status})")
    }
}
