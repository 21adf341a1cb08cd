//! Per-user settings entities.

pub mod model;

pub use model::{EditorSettings, ExportSettings, Theme, UserSettings, UserSettingsRecord};
