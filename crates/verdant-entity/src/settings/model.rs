//! Typed per-user settings container.
//!
//! Settings live in the database as one JSONB document per user; this
//! module is the serialization boundary. The typed [`UserSettings`]
//! struct is the only way settings enter or leave that document, and
//! unknown keys are rejected at the boundary rather than stored.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// UI color theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    /// Light theme.
    Light,
    /// Dark theme.
    Dark,
    /// Follow the operating system preference.
    #[default]
    System,
}

/// Editor preferences.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EditorSettings {
    /// Editor font size in points.
    pub font_size: u8,
    /// Maximum line width in characters (0 = unlimited).
    pub line_width: u16,
    /// Whether the outline sidebar is shown.
    pub show_outline: bool,
    /// Autosave interval in seconds (0 = disabled).
    pub autosave_seconds: u16,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            font_size: 14,
            line_width: 80,
            show_outline: true,
            autosave_seconds: 30,
        }
    }
}

/// Vault export preferences.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExportSettings {
    /// Whether file payloads are included in vault exports.
    pub include_files: bool,
    /// Whether soft-deleted nodes are included in vault exports.
    pub include_deleted: bool,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            include_files: true,
            include_deleted: false,
        }
    }
}

/// The complete typed settings container for one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct UserSettings {
    /// UI color theme.
    pub theme: Theme,
    /// BCP 47 locale tag (empty = browser default).
    pub locale: String,
    /// Editor preferences.
    pub editor: EditorSettings,
    /// Vault export preferences.
    pub export: ExportSettings,
}

/// The stored settings row for one user.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserSettingsRecord {
    /// The user these settings belong to.
    pub user_id: Uuid,
    /// The serialized settings document.
    pub settings: serde_json::Value,
    /// When the settings were last updated.
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_round_trip() {
        let settings = UserSettings::default();
        let json = serde_json::to_value(&settings).expect("serialize");
        let parsed: UserSettings = serde_json::from_value(json).expect("deserialize");
        assert_eq!(settings, parsed);
    }

    #[test]
    fn test_missing_fields_take_defaults() {
        let parsed: UserSettings =
            serde_json::from_value(serde_json::json!({"theme": "dark"})).expect("deserialize");
        assert_eq!(parsed.theme, Theme::Dark);
        assert_eq!(parsed.editor.font_size, 14);
    }

    #[test]
    fn test_unknown_keys_rejected() {
        let result = serde_json::from_value::<UserSettings>(serde_json::json!({
            "theme": "dark",
            "sidebar_width": 300
        }));
        assert!(result.is_err());
    }
}
