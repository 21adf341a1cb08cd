//! Storage provider tag enumeration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The storage backend a file payload lives on.
///
/// This is a closed set: every stored file carries exactly one of these
/// tags, persisted at upload time and never re-derived. Dispatch to a
/// backend always goes through the stored tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "storage_provider", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum StorageProviderKind {
    /// S3-compatible object storage.
    ObjectStorage,
    /// Blob-storage SaaS.
    BlobStorage,
}

impl StorageProviderKind {
    /// Return the provider tag as a snake_case string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ObjectStorage => "object_storage",
            Self::BlobStorage => "blob_storage",
        }
    }
}

impl fmt::Display for StorageProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for StorageProviderKind {
    type Err = verdant_core::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "object_storage" => Ok(Self::ObjectStorage),
            "blob_storage" => Ok(Self::BlobStorage),
            _ => Err(verdant_core::AppError::validation(format!(
                "Invalid storage provider: '{s}'. Expected one of: object_storage, blob_storage"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_str() {
        assert_eq!(
            "object_storage".parse::<StorageProviderKind>().unwrap(),
            StorageProviderKind::ObjectStorage
        );
        assert_eq!(
            "blob_storage".parse::<StorageProviderKind>().unwrap(),
            StorageProviderKind::BlobStorage
        );
        assert!("local".parse::<StorageProviderKind>().is_err());
    }

    #[test]
    fn test_round_trip() {
        for kind in [
            StorageProviderKind::ObjectStorage,
            StorageProviderKind::BlobStorage,
        ] {
            assert_eq!(kind.as_str().parse::<StorageProviderKind>().unwrap(), kind);
        }
    }
}
