//! Business logic for each resource. Handlers build a service per request
//! from the shared [`AppState`](crate::AppState).

pub mod auth;
pub mod engagement;
pub mod posts;
pub mod profiles;

pub use auth::AuthService;
pub use engagement::EngagementService;
pub use posts::{PostDraft, PostService};
pub use profiles::ProfileService;

use crate::error::{AppError, Result};
use validator::Validate;

/// Run `validator` rules and flatten failures into one 400 message.
pub(crate) fn validate_request<T: Validate>(request: &T) -> Result<()> {
    let Err(errors) = request.validate() else {
        return Ok(());
    };

    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by(|a, b| a.0.cmp(&b.0));

    let message = fields
        .into_iter()
        .map(|(field, errs)| {
            errs.first()
                .and_then(|e| e.message.as_ref())
                .map(|m| m.to_string())
                .unwrap_or_else(|| format!("Invalid {field}"))
        })
        .collect::<Vec<_>>()
        .join("; ");

    Err(AppError::Validation(message))
}
