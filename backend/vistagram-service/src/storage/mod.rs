//! Image ingestion: upload validation and the external image host.

pub mod memory;
pub mod s3;

use crate::error::AppError;
use async_trait::async_trait;

pub use memory::MemoryImageStore;
pub use s3::S3ImageStore;

/// 5 MiB upper bound on a single image
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

pub const ALLOWED_IMAGE_TYPES: [&str; 4] = ["image/jpeg", "image/jpg", "image/png", "image/webp"];

pub const FILE_TOO_LARGE: &str = "File too large. Maximum size is 5MB.";
pub const FILE_TYPE_INVALID: &str = "Only image files (JPG, PNG, WEBP) are allowed";

/// Where an uploaded image ended up
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredImage {
    pub url: String,
    /// Provider identifier used for later deletion
    pub public_id: String,
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("upload failed: {0}")]
    Upload(String),
    #[error("delete failed: {0}")]
    Delete(String),
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        AppError::Storage(err.to_string())
    }
}

/// A validated image ready to hand to an [`ImageStore`]
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub bytes: Vec<u8>,
    pub content_type: mime::Mime,
    pub filename: Option<String>,
}

impl ImageUpload {
    pub fn new(
        bytes: Vec<u8>,
        content_type: &mime::Mime,
        filename: Option<String>,
    ) -> Result<Self, AppError> {
        check_content_type(content_type)?;
        if bytes.len() > MAX_IMAGE_BYTES {
            return Err(AppError::Validation(FILE_TOO_LARGE.to_string()));
        }
        if bytes.is_empty() {
            return Err(AppError::Validation("Image is required".to_string()));
        }

        Ok(Self {
            bytes,
            content_type: content_type.clone(),
            filename,
        })
    }

    /// File extension matching the content type
    pub fn extension(&self) -> &'static str {
        match self.content_type.subtype().as_str().to_ascii_lowercase().as_str() {
            "png" => "png",
            "webp" => "webp",
            _ => "jpg",
        }
    }
}

/// Reject anything outside the image allow-list.
pub fn check_content_type(content_type: &mime::Mime) -> Result<(), AppError> {
    let essence = content_type.essence_str().to_ascii_lowercase();
    if ALLOWED_IMAGE_TYPES.contains(&essence.as_str()) {
        Ok(())
    } else {
        Err(AppError::Validation(FILE_TYPE_INVALID.to_string()))
    }
}

/// External host that stores image bytes and serves them by URL
#[async_trait]
pub trait ImageStore: Send + Sync {
    async fn upload(&self, image: &ImageUpload) -> Result<StoredImage, StorageError>;
    async fn delete(&self, public_id: &str) -> Result<(), StorageError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allow_list() {
        for allowed in ALLOWED_IMAGE_TYPES {
            let mime: mime::Mime = allowed.parse().unwrap();
            assert!(check_content_type(&mime).is_ok(), "{allowed} should be allowed");
        }
        assert!(check_content_type(&mime::IMAGE_GIF).is_err());
        assert!(check_content_type(&mime::APPLICATION_PDF).is_err());
        assert!(check_content_type(&mime::TEXT_PLAIN).is_err());
    }

    #[test]
    fn test_params_ignored_in_type_check() {
        let mime: mime::Mime = "image/PNG; charset=binary".parse().unwrap();
        assert!(check_content_type(&mime).is_ok());
    }

    #[test]
    fn test_size_bound() {
        let at_limit = ImageUpload::new(vec![0u8; MAX_IMAGE_BYTES], &mime::IMAGE_JPEG, None);
        assert!(at_limit.is_ok());

        let over = ImageUpload::new(vec![0u8; MAX_IMAGE_BYTES + 1], &mime::IMAGE_JPEG, None);
        match over {
            Err(AppError::Validation(msg)) => assert_eq!(msg, FILE_TOO_LARGE),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_extension() {
        let png = ImageUpload::new(vec![1], &mime::IMAGE_PNG, None).unwrap();
        assert_eq!(png.extension(), "png");
        let jpeg = ImageUpload::new(vec![1], &mime::IMAGE_JPEG, None).unwrap();
        assert_eq!(jpeg.extension(), "jpg");
    }
}
