//! # verdant-storage
//!
//! Storage backends for Verdant: S3-compatible object storage and a
//! blob-storage SaaS, dispatched through a closed [`ProviderRegistry`]
//! keyed by each file's persisted provider tag.

pub mod providers;
pub mod registry;
pub mod testing;
pub mod token;

pub use registry::ProviderRegistry;
pub use token::UploadToken;
