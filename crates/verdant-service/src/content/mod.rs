//! Content tree operations: slugs, materialized paths, CRUD, outline.

pub mod outline;
pub mod path;
pub mod service;
pub mod slug;

pub use outline::{OutlineItem, extract_outline};
pub use path::PathService;
pub use service::ContentService;
pub use slug::{generate_slug, is_valid_slug};
