//! Storage backend configuration.

use serde::{Deserialize, Serialize};

/// Top-level storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Provider new uploads are assigned to: `"object_storage"` or
    /// `"blob_storage"`. Existing files keep their stored tag.
    #[serde(default = "default_provider")]
    pub default_provider: String,
    /// Lifetime of generated upload credentials in seconds.
    #[serde(default = "default_upload_ttl")]
    pub upload_url_ttl_seconds: u64,
    /// Lifetime of generated download URLs in seconds.
    #[serde(default = "default_download_ttl")]
    pub download_url_ttl_seconds: u64,
    /// Lifetime of URLs returned for server-side artifact writes, in
    /// seconds (default 7 days).
    #[serde(default = "default_artifact_ttl")]
    pub artifact_url_ttl_seconds: u64,
    /// Maximum upload size in bytes (default 100 MB).
    #[serde(default = "default_max_upload")]
    pub max_upload_size_bytes: u64,
    /// Longest edge of generated thumbnails, in pixels.
    #[serde(default = "default_thumbnail_dimension")]
    pub thumbnail_max_dimension: u32,
    /// S3-compatible object storage configuration.
    #[serde(default)]
    pub object: ObjectStorageConfig,
    /// Blob-storage SaaS configuration.
    #[serde(default)]
    pub blob: BlobStorageConfig,
}

/// S3-compatible object storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ObjectStorageConfig {
    /// Whether this backend is available.
    #[serde(default)]
    pub enabled: bool,
    /// Endpoint URL for non-AWS services (MinIO, R2). Empty for AWS.
    #[serde(default)]
    pub endpoint: String,
    /// Region name.
    #[serde(default = "default_region")]
    pub region: String,
    /// Bucket name.
    #[serde(default)]
    pub bucket: String,
    /// Access key ID.
    #[serde(default)]
    pub access_key: String,
    /// Secret access key.
    #[serde(default)]
    pub secret_key: String,
}

/// Blob-storage SaaS configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BlobStorageConfig {
    /// Whether this backend is available.
    #[serde(default)]
    pub enabled: bool,
    /// Base URL of the blob store's REST API.
    #[serde(default)]
    pub base_url: String,
    /// Base URL blobs are publicly readable under.
    #[serde(default)]
    pub public_base_url: String,
    /// Read-write bearer token.
    #[serde(default)]
    pub token: String,
    /// Absolute URL of this application's proxy upload endpoint. The blob
    /// backend has no native presigning, so upload credentials point here.
    #[serde(default = "default_upload_proxy_url")]
    pub upload_proxy_url: String,
    /// HTTP request timeout in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
}

fn default_provider() -> String {
    "object_storage".to_string()
}

fn default_upload_ttl() -> u64 {
    900
}

fn default_download_ttl() -> u64 {
    900
}

fn default_artifact_ttl() -> u64 {
    604_800
}

fn default_max_upload() -> u64 {
    104_857_600
}

fn default_thumbnail_dimension() -> u32 {
    512
}

fn default_region() -> String {
    "us-east-1".to_string()
}

fn default_upload_proxy_url() -> String {
    "http://localhost:8080/api/files/proxy".to_string()
}

fn default_request_timeout() -> u64 {
    30
}
