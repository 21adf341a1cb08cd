//! File upload, download, and maintenance flows.

pub mod service;
pub mod thumbnail;

pub use service::{CreateFileUpload, CreatedUpload, FileService, sanitize_file_name};
