//! File payload domain entities.

pub mod model;
pub mod provider;
pub mod upload_status;

pub use model::{CreateFilePayload, EXTERNAL_PROVIDERS_KEY, FilePayload};
pub use provider::StorageProviderKind;
pub use upload_status::UploadStatus;
