//! Tag domain entities.

pub mod model;

pub use model::{ContentTag, Tag, TagPosition, TagWithCount};
