//! In-memory storage backend for tests.
//!
//! Mirrors the strictness of the real backends: deleting or copying a
//! missing key errors, probing one does not.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream;

use verdant_core::error::AppError;
use verdant_core::result::AppResult;
use verdant_core::traits::storage::{
    expiry_timestamp, ByteStream, FileStat, StorageProvider, UploadCredential,
};

/// Storage backend holding objects in a shared in-memory map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorageProvider {
    objects: Arc<Mutex<HashMap<String, (Vec<u8>, String)>>>,
}

impl MemoryStorageProvider {
    /// Create an empty backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an object directly, bypassing the trait surface.
    pub fn insert(&self, key: &str, data: Vec<u8>, mime_type: &str) {
        self.objects
            .lock()
            .unwrap()
            .insert(key.to_string(), (data, mime_type.to_string()));
    }

    /// Raw bytes stored under a key, for assertions.
    pub fn contents(&self, key: &str) -> Option<Vec<u8>> {
        self.objects
            .lock()
            .unwrap()
            .get(key)
            .map(|(data, _)| data.clone())
    }

    /// Whether a key is present.
    pub fn has_key(&self, key: &str) -> bool {
        self.objects.lock().unwrap().contains_key(key)
    }

    /// Number of stored objects.
    pub fn object_count(&self) -> usize {
        self.objects.lock().unwrap().len()
    }
}

#[async_trait]
impl StorageProvider for MemoryStorageProvider {
    fn provider_type(&self) -> &'static str {
        "memory"
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(true)
    }

    async fn generate_upload_url(
        &self,
        key: &str,
        mime_type: &str,
        expires_in: Duration,
    ) -> AppResult<UploadCredential> {
        let mut headers = HashMap::new();
        headers.insert("content-type".to_string(), mime_type.to_string());
        Ok(UploadCredential {
            url: format!("memory://upload/{key}"),
            method: "PUT".to_string(),
            headers,
            expires_at: expiry_timestamp(expires_in)?,
        })
    }

    async fn generate_download_url(&self, key: &str, _expires_in: Duration) -> AppResult<String> {
        if !self.has_key(key) {
            return Err(AppError::not_found(format!("Object {key} does not exist")));
        }
        Ok(format!("memory://download/{key}"))
    }

    async fn verify_file_exists(&self, key: &str) -> AppResult<FileStat> {
        let objects = self.objects.lock().unwrap();
        match objects.get(key) {
            Some((data, mime_type)) => Ok(FileStat {
                exists: true,
                size: Some(data.len() as u64),
                etag: None,
                mime_type: Some(mime_type.clone()),
            }),
            None => Ok(FileStat::missing()),
        }
    }

    async fn delete_file(&self, key: &str) -> AppResult<()> {
        self.objects
            .lock()
            .unwrap()
            .remove(key)
            .map(|_| ())
            .ok_or_else(|| AppError::not_found(format!("Object {key} does not exist")))
    }

    async fn copy_file(&self, from: &str, to: &str) -> AppResult<()> {
        let mut objects = self.objects.lock().unwrap();
        let entry = objects
            .get(from)
            .cloned()
            .ok_or_else(|| AppError::not_found(format!("Object {from} does not exist")))?;
        objects.insert(to.to_string(), entry);
        Ok(())
    }

    async fn get_file_stream(&self, key: &str) -> AppResult<ByteStream> {
        let data = self
            .contents(key)
            .ok_or_else(|| AppError::not_found(format!("Object {key} does not exist")))?;
        Ok(Box::pin(stream::once(async move {
            Ok(Bytes::from(data))
        })))
    }

    async fn upload_file(&self, key: &str, data: Bytes, mime_type: &str) -> AppResult<String> {
        self.insert(key, data.to_vec(), mime_type);
        Ok(self.public_url(key))
    }

    fn public_url(&self, key: &str) -> String {
        format!("memory://files/{key}")
    }
}
