//! Storage backend implementations.

pub mod blob;
pub mod object;

pub use blob::BlobStorageProvider;
pub use object::ObjectStorageProvider;
