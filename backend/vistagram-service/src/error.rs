/// Error types for Vistagram Service
///
/// Client errors carry the message shown to the caller. Server errors are
/// wrapped with an operation-level message via [`ResultExt::context`]; their
/// detail is only exposed while running in development.
use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use std::sync::atomic::{AtomicBool, Ordering};

/// Result type for vistagram-service operations
pub type Result<T> = std::result::Result<T, AppError>;

static EXPOSE_DETAILS: AtomicBool = AtomicBool::new(false);

/// Toggle whether 500 responses include the underlying error detail.
pub fn expose_error_details(enabled: bool) {
    EXPOSE_DETAILS.store(enabled, Ordering::Relaxed);
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("database error: {0}")]
    Database(String),

    #[error("image storage error: {0}")]
    Storage(String),

    #[error("internal error: {0}")]
    Internal(String),

    /// Server-side failure annotated with the operation that failed
    #[error("{context}: {source}")]
    Operation {
        context: &'static str,
        #[source]
        source: Box<AppError>,
    },
}

impl AppError {
    pub fn is_server_error(&self) -> bool {
        self.status_code().is_server_error()
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Database(_)
            | AppError::Storage(_)
            | AppError::Internal(_)
            | AppError::Operation { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();

        if !status.is_server_error() {
            return HttpResponse::build(status).json(serde_json::json!({
                "error": self.to_string(),
            }));
        }

        let (summary, detail) = match self {
            AppError::Operation { context, source } => (*context, source.to_string()),
            other => ("Something went wrong!", other.to_string()),
        };

        tracing::error!(error = %self, "Request failed");

        let message = if EXPOSE_DETAILS.load(Ordering::Relaxed) {
            detail
        } else {
            "Internal server error".to_string()
        };

        HttpResponse::build(status).json(serde_json::json!({
            "error": summary,
            "message": message,
        }))
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.code().as_deref() == Some("23505") {
                let message = match db_err.constraint() {
                    Some(c) if c.starts_with("users_") => {
                        "User with this email or username already exists"
                    }
                    _ => "Resource already exists",
                };
                return AppError::Conflict(message.to_string());
            }
        }
        AppError::Database(err.to_string())
    }
}

impl From<crypto_core::PasswordError> for AppError {
    fn from(err: crypto_core::PasswordError) -> Self {
        AppError::Internal(err.to_string())
    }
}

pub trait ResultExt<T> {
    /// Attach an operation message to server-side failures; client errors pass through.
    fn context(self, context: &'static str) -> Result<T>;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: Into<AppError>,
{
    fn context(self, context: &'static str) -> Result<T> {
        self.map_err(|e| {
            let err = e.into();
            match err {
                AppError::Operation { .. } => err,
                err if err.is_server_error() => AppError::Operation {
                    context,
                    source: Box::new(err),
                },
                err => err,
            }
        })
    }
}
