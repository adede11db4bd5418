use super::{ImageStore, ImageUpload, StorageError, StoredImage};
use crate::config::StorageConfig;
use async_trait::async_trait;
use aws_sdk_s3::config::Region;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use uuid::Uuid;

/// Images stored in an S3-compatible bucket and served from a public base URL
#[derive(Clone)]
pub struct S3ImageStore {
    client: Client,
    bucket: String,
    key_prefix: String,
    public_base_url: String,
}

impl S3ImageStore {
    pub fn new(client: Client, config: &StorageConfig) -> Self {
        Self {
            client,
            bucket: config.bucket.clone(),
            key_prefix: config.key_prefix.trim_matches('/').to_string(),
            public_base_url: config.public_base_url.clone(),
        }
    }

    /// Build a client from the default AWS credential chain.
    ///
    /// A custom endpoint switches to path-style addressing for MinIO-like stores.
    pub async fn from_config(config: &StorageConfig) -> Self {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(Region::new(config.region.clone()));
        if let Some(endpoint) = &config.endpoint {
            loader = loader.endpoint_url(endpoint);
        }
        let shared = loader.load().await;

        let s3_config = aws_sdk_s3::config::Builder::from(&shared)
            .force_path_style(config.endpoint.is_some())
            .build();

        Self::new(Client::from_conf(s3_config), config)
    }

    fn object_key(&self, image: &ImageUpload) -> String {
        format!("{}/{}.{}", self.key_prefix, Uuid::new_v4(), image.extension())
    }

    pub fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.public_base_url, key)
    }
}

#[async_trait]
impl ImageStore for S3ImageStore {
    async fn upload(&self, image: &ImageUpload) -> Result<StoredImage, StorageError> {
        let key = self.object_key(image);

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .content_type(image.content_type.essence_str())
            .body(ByteStream::from(image.bytes.clone()))
            .send()
            .await
            .map_err(|e| StorageError::Upload(e.to_string()))?;

        tracing::debug!(bucket = %self.bucket, key = %key, bytes = image.bytes.len(), "image uploaded");

        Ok(StoredImage {
            url: self.public_url(&key),
            public_id: key,
        })
    }

    async fn delete(&self, public_id: &str) -> Result<(), StorageError> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(public_id)
            .send()
            .await
            .map_err(|e| StorageError::Delete(e.to_string()))?;
        Ok(())
    }
}
