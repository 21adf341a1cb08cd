//! Content node kind enumeration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The kind of a content node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "content_kind", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    /// A rich-text note.
    Note,
    /// A folder grouping other nodes.
    Folder,
    /// A node backed by a stored file payload.
    File,
}

impl ContentKind {
    /// Check whether nodes of this kind may have children.
    ///
    /// Notes nest like folders do; file nodes are always leaves.
    pub fn can_have_children(&self) -> bool {
        !matches!(self, Self::File)
    }

    /// Return the kind as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Note => "note",
            Self::Folder => "folder",
            Self::File => "file",
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ContentKind {
    type Err = verdant_core::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "note" => Ok(Self::Note),
            "folder" => Ok(Self::Folder),
            "file" => Ok(Self::File),
            _ => Err(verdant_core::AppError::validation(format!(
                "Invalid content kind: '{s}'. Expected one of: note, folder, file"
            ))),
        }
    }
}
