//! Core traits defined in `verdant-core` and implemented by other crates.

pub mod storage;

pub use storage::StorageProvider;
