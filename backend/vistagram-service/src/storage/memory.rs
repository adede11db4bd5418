use super::{ImageStore, ImageUpload, StorageError, StoredImage};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

/// Keeps uploaded images in process memory.
///
/// Used for local development (`STORAGE_BACKEND=memory`) and tests.
pub struct MemoryImageStore {
    base_url: String,
    objects: Mutex<HashMap<String, ImageUpload>>,
}

impl MemoryImageStore {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            objects: Mutex::new(HashMap::new()),
        }
    }

    fn objects(&self) -> MutexGuard<'_, HashMap<String, ImageUpload>> {
        // A panic while holding the lock cannot leave the map half-written.
        self.objects.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn contains(&self, public_id: &str) -> bool {
        self.objects().contains_key(public_id)
    }

    pub fn len(&self) -> usize {
        self.objects().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ImageStore for MemoryImageStore {
    async fn upload(&self, image: &ImageUpload) -> Result<StoredImage, StorageError> {
        let public_id = format!("vistagram/{}", Uuid::new_v4());
        let url = format!("{}/{}.{}", self.base_url, public_id, image.extension());

        self.objects().insert(public_id.clone(), image.clone());
        Ok(StoredImage { url, public_id })
    }

    async fn delete(&self, public_id: &str) -> Result<(), StorageError> {
        self.objects()
            .remove(public_id)
            .map(|_| ())
            .ok_or_else(|| StorageError::Delete(format!("no object {public_id}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_upload_then_delete() {
        let store = MemoryImageStore::new("http://localhost:5000/media/");
        let image = ImageUpload::new(vec![0xFF, 0xD8], &mime::IMAGE_JPEG, None).unwrap();

        let stored = store.upload(&image).await.unwrap();
        assert!(stored.url.starts_with("http://localhost:5000/media/vistagram/"));
        assert!(stored.url.ends_with(".jpg"));
        assert!(store.contains(&stored.public_id));

        store.delete(&stored.public_id).await.unwrap();
        assert!(store.is_empty());
        assert!(store.delete(&stored.public_id).await.is_err());
    }
}
