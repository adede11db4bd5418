//! `multipart/form-data` parsing for post creation.
//!
//! The image part is checked against the allow-list as soon as its headers
//! arrive, then read chunk by chunk so an oversized body is refused without
//! buffering the remainder.

use actix_multipart::{Field, Multipart};
use futures::StreamExt;

use crate::error::{AppError, Result};
use crate::services::PostDraft;
use crate::storage::{check_content_type, ImageUpload, FILE_TOO_LARGE, MAX_IMAGE_BYTES};

const MAX_TEXT_FIELD_BYTES: usize = 16 * 1024;

pub async fn read_post_form(mut payload: Multipart) -> Result<PostDraft> {
    let mut draft = PostDraft::default();

    while let Some(item) = payload.next().await {
        let mut field = item.map_err(|e| AppError::Validation(format!("Invalid form data: {e}")))?;
        let name = field.name().unwrap_or_default().to_string();

        match name.as_str() {
            "image" => {
                let content_type = field
                    .content_type()
                    .cloned()
                    .unwrap_or(mime::APPLICATION_OCTET_STREAM);
                check_content_type(&content_type)?;

                let filename = field
                    .content_disposition()
                    .and_then(|cd| cd.get_filename())
                    .map(String::from);
                let bytes = read_limited(&mut field, MAX_IMAGE_BYTES, FILE_TOO_LARGE).await?;

                draft.image = Some(ImageUpload::new(bytes, &content_type, filename)?);
            }
            "caption" => draft.caption = Some(read_text(&mut field).await?),
            "location" => draft.location = Some(read_text(&mut field).await?),
            _ => {
                // Ignore unknown fields
            }
        }
    }

    Ok(draft)
}

async fn read_limited(field: &mut Field, limit: usize, too_large: &str) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    while let Some(chunk) = field.next().await {
        let data = chunk.map_err(|e| AppError::Validation(format!("Invalid form data: {e}")))?;
        if buf.len() + data.len() > limit {
            return Err(AppError::Validation(too_large.to_string()));
        }
        buf.extend_from_slice(&data);
    }
    Ok(buf)
}

async fn read_text(field: &mut Field) -> Result<String> {
    let bytes = read_limited(field, MAX_TEXT_FIELD_BYTES, "Form field too large").await?;
    String::from_utf8(bytes).map_err(|_| AppError::Validation("Form fields must be UTF-8".to_string()))
}
