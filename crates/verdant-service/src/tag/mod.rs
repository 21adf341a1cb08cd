//! Tagging: per-owner tag names attached to content nodes.

pub mod service;

pub use service::{AttachedTag, TagInput, TagService};
