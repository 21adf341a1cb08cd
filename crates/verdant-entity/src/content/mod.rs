//! Content tree domain entities.

pub mod kind;
pub mod model;
pub mod path;

pub use kind::ContentKind;
pub use model::{ContentNode, CreateContentNode, UpdateContentNode};
pub use path::ContentPath;
