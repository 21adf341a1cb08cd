//! Storage provider trait for pluggable file storage backends.

use std::collections::HashMap;
use std::pin::Pin;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::Stream;

use crate::error::AppError;
use crate::result::AppResult;

/// A byte stream type used for reading file contents.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, std::io::Error>> + Send>>;

/// Credential for a client-side upload.
///
/// For backends with native presigning this is a presigned PUT URL. For
/// backends without presigning the URL points at the application's own
/// upload proxy endpoint, carrying an opaque token.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct UploadCredential {
    /// The URL the client must send the file bytes to.
    pub url: String,
    /// HTTP method to use (always uppercase, e.g. "PUT").
    pub method: String,
    /// Headers the client must include verbatim.
    pub headers: HashMap<String, String>,
    /// When the credential stops being accepted.
    pub expires_at: DateTime<Utc>,
}

/// Result of probing a backend for a stored object.
///
/// A missing object is a regular value, not an error: 404-class backend
/// responses translate to `exists: false`, every other failure propagates.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct FileStat {
    /// Whether the object exists.
    pub exists: bool,
    /// Size in bytes, when the backend reports it.
    pub size: Option<u64>,
    /// Entity tag, when the backend reports one.
    pub etag: Option<String>,
    /// MIME type, when the backend reports it.
    pub mime_type: Option<String>,
}

impl FileStat {
    /// Stat for an object that does not exist.
    pub fn missing() -> Self {
        Self {
            exists: false,
            size: None,
            etag: None,
            mime_type: None,
        }
    }
}

/// Compute the absolute expiry timestamp for a credential lifetime.
pub fn expiry_timestamp(expires_in: Duration) -> AppResult<DateTime<Utc>> {
    let delta = chrono::Duration::from_std(expires_in)
        .map_err(|e| AppError::validation(format!("Invalid expiry duration: {e}")))?;
    Ok(Utc::now() + delta)
}

/// Trait for file storage backends.
///
/// Implementations exist for S3-compatible object storage and for a
/// blob-storage SaaS. The [`StorageProvider`] trait is defined here in
/// `verdant-core` and implemented in `verdant-storage`. Keys are opaque
/// caller-chosen strings; every operation targets exactly one key.
#[async_trait]
pub trait StorageProvider: Send + Sync + std::fmt::Debug + 'static {
    /// Return the provider type name (e.g., "object_storage").
    fn provider_type(&self) -> &'static str;

    /// Check whether the provider is healthy and reachable.
    async fn health_check(&self) -> AppResult<bool>;

    /// Produce a credential a client can use to upload bytes for `key`.
    async fn generate_upload_url(
        &self,
        key: &str,
        mime_type: &str,
        expires_in: Duration,
    ) -> AppResult<UploadCredential>;

    /// Produce a time-limited read URL for an existing object.
    ///
    /// Probes the backend first; a missing key is an error.
    async fn generate_download_url(&self, key: &str, expires_in: Duration) -> AppResult<String>;

    /// Probe the backend for `key`.
    async fn verify_file_exists(&self, key: &str) -> AppResult<FileStat>;

    /// Delete the object at `key`.
    ///
    /// Deleting a missing key may error depending on the backend; callers
    /// tolerate that where deletion is best-effort.
    async fn delete_file(&self, key: &str) -> AppResult<()>;

    /// Copy an object from one key to another within this backend.
    async fn copy_file(&self, from: &str, to: &str) -> AppResult<()>;

    /// Read the object at `key` as a byte stream.
    async fn get_file_stream(&self, key: &str) -> AppResult<ByteStream>;

    /// Write bytes server-side and return a URL the upload is readable at.
    ///
    /// Used for derived artifacts such as thumbnails and for proxied
    /// uploads. Depending on the backend the URL is either signed with a
    /// bounded lifetime or a permanent public URL.
    async fn upload_file(&self, key: &str, data: Bytes, mime_type: &str) -> AppResult<String>;

    /// Return the permanent public URL shape for `key`.
    fn public_url(&self, key: &str) -> String;
}
