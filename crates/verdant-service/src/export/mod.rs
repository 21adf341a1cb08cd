//! Vault export: a user's whole garden as a ZIP archive.

pub mod service;

pub use service::{ExportService, VaultArchive};
