//! File payload entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::provider::StorageProviderKind;
use super::upload_status::UploadStatus;

/// Top-level key in `storage_metadata` holding external provider links
/// (e.g. a legacy Google Drive import), cleared by a maintenance call.
pub const EXTERNAL_PROVIDERS_KEY: &str = "externalProviders";

/// The stored-bytes side of a `file` content node (1:1).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct FilePayload {
    /// Unique payload identifier.
    pub id: Uuid,
    /// The content node this payload backs.
    pub content_id: Uuid,
    /// The backend the bytes live on. Persisted at upload time; all
    /// later operations dispatch on this tag.
    pub storage_provider: StorageProviderKind,
    /// Backend key the bytes are stored under.
    pub storage_key: String,
    /// MIME type as declared at upload time.
    pub mime_type: String,
    /// Size in bytes (0 until the upload is verified).
    pub file_size: i64,
    /// Whether the bytes are confirmed present.
    pub upload_status: UploadStatus,
    /// Free-form backend metadata. Known sub-keys:
    /// `externalProviders.googleDrive` (legacy import link) and
    /// `thumbnail` (`{key, url}` of the generated preview).
    pub storage_metadata: serde_json::Value,
    /// When the payload was created.
    pub created_at: DateTime<Utc>,
    /// When the payload was last updated.
    pub updated_at: DateTime<Utc>,
}

impl FilePayload {
    /// Check whether the payload's bytes are confirmed present.
    pub fn is_ready(&self) -> bool {
        self.upload_status.is_ready()
    }

    /// Check whether the payload is an image by MIME type.
    pub fn is_image(&self) -> bool {
        self.mime_type.starts_with("image/")
    }
}

/// Data required to create a new file payload.
///
/// Carries no `content_id`: the payload row is only ever inserted in the
/// same transaction as its node, which assigns the id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateFilePayload {
    /// Assigned storage backend.
    pub storage_provider: StorageProviderKind,
    /// Backend key.
    pub storage_key: String,
    /// Declared MIME type.
    pub mime_type: String,
    /// Declared size in bytes.
    pub file_size: i64,
}
