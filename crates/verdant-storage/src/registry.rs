//! Provider registry — routes operations to the correct backend by its
//! persisted provider tag.
//!
//! The set of backends is closed and fixed at startup: one optional
//! object storage backend and one optional blob storage backend, each
//! constructed eagerly from configuration so credential problems surface
//! at boot instead of on the first upload. Dispatch always goes through a
//! [`StorageProviderKind`] tag read from the file's payload row.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use verdant_core::config::storage::StorageConfig;
use verdant_core::error::AppError;
use verdant_core::result::AppResult;
use verdant_core::traits::storage::StorageProvider;
use verdant_entity::file::StorageProviderKind;

use crate::providers::blob::BlobStorageProvider;
use crate::providers::object::ObjectStorageProvider;

/// Fixed two-slot registry of storage backends.
#[derive(Debug, Clone)]
pub struct ProviderRegistry {
    object: Option<Arc<dyn StorageProvider>>,
    blob: Option<Arc<dyn StorageProvider>>,
    default_kind: StorageProviderKind,
}

impl ProviderRegistry {
    /// Assemble a registry from explicit providers. The seam used by
    /// tests to substitute in-memory backends.
    pub fn new(
        object: Option<Arc<dyn StorageProvider>>,
        blob: Option<Arc<dyn StorageProvider>>,
        default_kind: StorageProviderKind,
    ) -> AppResult<Self> {
        let registry = Self {
            object,
            blob,
            default_kind,
        };
        // The default backend must actually be configured.
        registry.get(default_kind)?;
        Ok(registry)
    }

    /// Construct every enabled backend from configuration.
    pub async fn from_config(config: &StorageConfig) -> AppResult<Self> {
        let object = if config.object.enabled {
            let artifact_ttl = Duration::from_secs(config.artifact_url_ttl_seconds);
            let provider = ObjectStorageProvider::new(&config.object, artifact_ttl).await?;
            Some(Arc::new(provider) as Arc<dyn StorageProvider>)
        } else {
            None
        };

        let blob = if config.blob.enabled {
            let provider = BlobStorageProvider::new(&config.blob)?;
            Some(Arc::new(provider) as Arc<dyn StorageProvider>)
        } else {
            None
        };

        let default_kind: StorageProviderKind = config.default_provider.parse()?;
        Self::new(object, blob, default_kind)
    }

    /// Resolve a backend by its persisted tag.
    pub fn get(&self, kind: StorageProviderKind) -> AppResult<Arc<dyn StorageProvider>> {
        let slot = match kind {
            StorageProviderKind::ObjectStorage => &self.object,
            StorageProviderKind::BlobStorage => &self.blob,
        };
        slot.clone().ok_or_else(|| {
            AppError::configuration(format!("Storage backend '{kind}' is not configured"))
        })
    }

    /// The backend new uploads go to.
    pub fn default_kind(&self) -> StorageProviderKind {
        self.default_kind
    }

    /// Resolve the default backend.
    pub fn get_default(&self) -> AppResult<Arc<dyn StorageProvider>> {
        self.get(self.default_kind)
    }

    /// Tags with a configured backend.
    pub fn configured_kinds(&self) -> Vec<StorageProviderKind> {
        let mut kinds = Vec::new();
        if self.object.is_some() {
            kinds.push(StorageProviderKind::ObjectStorage);
        }
        if self.blob.is_some() {
            kinds.push(StorageProviderKind::BlobStorage);
        }
        kinds
    }

    /// Probe every configured backend.
    pub async fn health_check_all(&self) -> HashMap<StorageProviderKind, bool> {
        let mut results = HashMap::new();
        for kind in self.configured_kinds() {
            if let Ok(provider) = self.get(kind) {
                let healthy = provider.health_check().await.unwrap_or(false);
                results.insert(kind, healthy);
            }
        }
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemoryStorageProvider;

    fn memory() -> Arc<dyn StorageProvider> {
        Arc::new(MemoryStorageProvider::new())
    }

    #[test]
    fn test_dispatch_by_kind() {
        let registry = ProviderRegistry::new(
            Some(memory()),
            Some(memory()),
            StorageProviderKind::ObjectStorage,
        )
        .unwrap();

        assert!(registry.get(StorageProviderKind::ObjectStorage).is_ok());
        assert!(registry.get(StorageProviderKind::BlobStorage).is_ok());
        assert_eq!(registry.configured_kinds().len(), 2);
    }

    #[test]
    fn test_unconfigured_backend_is_an_error() {
        let registry =
            ProviderRegistry::new(Some(memory()), None, StorageProviderKind::ObjectStorage)
                .unwrap();

        let err = registry.get(StorageProviderKind::BlobStorage).unwrap_err();
        assert_eq!(
            err.kind,
            verdant_core::error::ErrorKind::Configuration
        );
    }

    #[test]
    fn test_default_must_be_configured() {
        let result = ProviderRegistry::new(None, Some(memory()), StorageProviderKind::ObjectStorage);
        assert!(result.is_err());
    }
}
