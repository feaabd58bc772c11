//! Object storage collaborator for profile photos
//!
//! The backend never stores image bytes itself; uploads go to an external
//! media service addressed by URL and deleted by public id. `ObjectStorage`
//! is the seam, with an HTTP implementation for production and an in-memory
//! implementation for tests and storage-less deployments.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Storage errors
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Storage request failed: {0}")]
    Request(String),

    #[error("Storage response missing field: {0}")]
    BadResponse(&'static str),
}

/// Handle to an uploaded object
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredObject {
    pub url: String,
    pub public_id: String,
}

/// External object storage reachable via upload and delete-by-id
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Upload raw bytes into a folder; returns the public URL and the id
    /// needed for later deletion.
    async fn upload(
        &self,
        data: Vec<u8>,
        filename: &str,
        folder: &str,
    ) -> Result<StoredObject, StorageError>;

    /// Delete an object by its public id. Unknown ids are not an error.
    async fn delete(&self, public_id: &str) -> Result<(), StorageError>;
}

/// HTTP implementation speaking to an external media service
pub struct HttpObjectStorage {
    client: reqwest::Client,
    base_url: String,
}

impl HttpObjectStorage {
    /// Create a client for the media service at `base_url`
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl ObjectStorage for HttpObjectStorage {
    async fn upload(
        &self,
        data: Vec<u8>,
        filename: &str,
        folder: &str,
    ) -> Result<StoredObject, StorageError> {
        let part = reqwest::multipart::Part::bytes(data).file_name(filename.to_string());
        let form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("folder", folder.to_string());

        let response = self
            .client
            .post(format!("{}/upload", self.base_url))
            .multipart(form)
            .send()
            .await
            .map_err(|e| StorageError::Request(e.to_string()))?
            .error_for_status()
            .map_err(|e| StorageError::Request(e.to_string()))?;

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| StorageError::Request(e.to_string()))?;

        let url = body["secure_url"]
            .as_str()
            .ok_or(StorageError::BadResponse("secure_url"))?
            .to_string();
        let public_id = body["public_id"]
            .as_str()
            .ok_or(StorageError::BadResponse("public_id"))?
            .to_string();

        Ok(StoredObject { url, public_id })
    }

    async fn delete(&self, public_id: &str) -> Result<(), StorageError> {
        let response = self
            .client
            .delete(format!("{}/assets/{}", self.base_url, public_id))
            .send()
            .await
            .map_err(|e| StorageError::Request(e.to_string()))?;

        // Deleting an already-gone object is fine
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(());
        }

        response
            .error_for_status()
            .map_err(|e| StorageError::Request(e.to_string()))?;

        Ok(())
    }
}

/// In-memory implementation for tests and storage-less deployments
#[derive(Default)]
pub struct InMemoryStorage {
    objects: Mutex<HashMap<String, Vec<u8>>>,
    counter: AtomicU64,
}

impl InMemoryStorage {
    /// Number of stored objects
    pub fn len(&self) -> usize {
        self.objects.lock().unwrap().len()
    }

    /// True when nothing is stored
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Check whether an object exists
    pub fn contains(&self, public_id: &str) -> bool {
        self.objects.lock().unwrap().contains_key(public_id)
    }
}

#[async_trait]
impl ObjectStorage for InMemoryStorage {
    async fn upload(
        &self,
        data: Vec<u8>,
        filename: &str,
        folder: &str,
    ) -> Result<StoredObject, StorageError> {
        let n = self.counter.fetch_add(1, Ordering::Relaxed);
        let public_id = format!("{}/{}-{}", folder, n, filename);
        let url = format!("memory://{}", public_id);

        self.objects.lock().unwrap().insert(public_id.clone(), data);

        Ok(StoredObject { url, public_id })
    }

    async fn delete(&self, public_id: &str) -> Result<(), StorageError> {
        self.objects.lock().unwrap().remove(public_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_upload_and_delete() {
        let storage = InMemoryStorage::default();

        let stored = storage
            .upload(vec![1, 2, 3], "avatar.png", "profile_photos")
            .await
            .unwrap();

        assert!(stored.public_id.starts_with("profile_photos/"));
        assert!(stored.url.starts_with("memory://"));
        assert!(storage.contains(&stored.public_id));

        storage.delete(&stored.public_id).await.unwrap();
        assert!(!storage.contains(&stored.public_id));
    }

    #[tokio::test]
    async fn test_in_memory_delete_unknown_id_is_ok() {
        let storage = InMemoryStorage::default();

        assert!(storage.delete("profile_photos/missing").await.is_ok());
    }

    #[tokio::test]
    async fn test_in_memory_distinct_public_ids() {
        let storage = InMemoryStorage::default();

        let a = storage
            .upload(vec![1], "same.png", "folder")
            .await
            .unwrap();
        let b = storage
            .upload(vec![2], "same.png", "folder")
            .await
            .unwrap();

        assert_ne!(a.public_id, b.public_id);
        assert_eq!(storage.len(), 2);
    }

    #[test]
    fn test_http_storage_trims_trailing_slash() {
        let storage = HttpObjectStorage::new("https://media.example.com/");
        assert_eq!(storage.base_url, "https://media.example.com");
    }

    #[test]
    fn test_storage_error_display() {
        let err = StorageError::BadResponse("secure_url");
        assert!(format!("{}", err).contains("secure_url"));
    }
}
