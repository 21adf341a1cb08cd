//! Outline extraction from stored note bodies.
//!
//! Note bodies are rich-text documents in ProseMirror's JSON shape:
//! nodes with a `type`, optional `attrs`, and a `content` array of child
//! nodes; leaves of type `text` carry the actual characters.

use serde::{Deserialize, Serialize};

/// One heading in a note's outline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutlineItem {
    /// Heading level, clamped to 1..=6.
    pub level: u8,
    /// Concatenated text content of the heading.
    pub text: String,
}

/// Walks a note body and collects its headings in document order.
///
/// Anything that is not a recognizable document yields an empty outline
/// rather than an error; a note with a malformed body simply has no
/// outline.
pub fn extract_outline(body: &serde_json::Value) -> Vec<OutlineItem> {
    let mut items = Vec::new();
    walk(body, &mut items);
    items
}

fn walk(node: &serde_json::Value, items: &mut Vec<OutlineItem>) {
    let Some(obj) = node.as_object() else {
        return;
    };

    if obj.get("type").and_then(|t| t.as_str()) == Some("heading") {
        let level = obj
            .get("attrs")
            .and_then(|a| a.get("level"))
            .and_then(|l| l.as_u64())
            .unwrap_or(1)
            .clamp(1, 6) as u8;

        let mut text = String::new();
        collect_text(node, &mut text);
        items.push(OutlineItem { level, text });
        // Headings do not nest further headings.
        return;
    }

    if let Some(children) = obj.get("content").and_then(|c| c.as_array()) {
        for child in children {
            walk(child, items);
        }
    }
}

fn collect_text(node: &serde_json::Value, out: &mut String) {
    let Some(obj) = node.as_object() else {
        return;
    };

    if let Some(text) = obj.get("text").and_then(|t| t.as_str()) {
        out.push_str(text);
    }

    if let Some(children) = obj.get("content").and_then(|c| c.as_array()) {
        for child in children {
            collect_text(child, out);
        }
    }
}
