//! Settings reads, partial updates, and resets.
//!
//! The stored document is only ever written in the canonical shape
//! produced by serializing [`UserSettings`], so a partial patch is
//! merged into the stored JSON first and the result must parse back
//! through the typed container before it is persisted.

use serde_json::{Map, Value};
use tracing::{info, warn};

use verdant_core::error::AppError;
use verdant_core::result::AppResult;
use verdant_database::repositories::SettingsRepository;
use verdant_entity::audit::action::AuditAction;
use verdant_entity::settings::UserSettings;

use crate::audit::AuditService;
use crate::context::RequestContext;

/// Top-level keys a settings patch may carry.
const KNOWN_KEYS: &[&str] = &["theme", "locale", "editor", "export"];

/// Manages each user's settings document.
#[derive(Debug, Clone)]
pub struct SettingsService {
    settings: SettingsRepository,
    audit: AuditService,
}

impl SettingsService {
    /// Creates a new settings service.
    pub fn new(settings: SettingsRepository, audit: AuditService) -> Self {
        Self { settings, audit }
    }

    /// Returns the user's settings, falling back to defaults when
    /// nothing is stored.
    ///
    /// A stored document that no longer parses is treated as absent
    /// rather than an error; the next update overwrites it with a
    /// canonical one.
    pub async fn get(&self, ctx: &RequestContext) -> AppResult<UserSettings> {
        let Some(record) = self.settings.find_by_user(ctx.user_id).await? else {
            return Ok(UserSettings::default());
        };

        match serde_json::from_value(record.settings) {
            Ok(settings) => Ok(settings),
            Err(e) => {
                warn!(
                    user_id = %ctx.user_id,
                    error = %e,
                    "Stored settings document is unreadable, serving defaults"
                );
                Ok(UserSettings::default())
            }
        }
    }

    /// Applies a partial patch to the user's settings.
    ///
    /// Objects merge recursively, scalars and arrays replace, and `null`
    /// removes a key so its default applies again. The merged document
    /// must round-trip through [`UserSettings`], which rejects unknown
    /// nested keys.
    pub async fn update(&self, ctx: &RequestContext, patch: Value) -> AppResult<UserSettings> {
        let Some(patch_map) = patch.as_object() else {
            return Err(AppError::validation("Settings patch must be a JSON object"));
        };
        for key in patch_map.keys() {
            if !KNOWN_KEYS.contains(&key.as_str()) {
                return Err(AppError::validation(format!("Unknown settings key '{key}'")));
            }
        }

        let mut merged = match self.settings.find_by_user(ctx.user_id).await? {
            Some(record) if record.settings.is_object() => record.settings,
            _ => Value::Object(Map::new()),
        };
        deep_merge(&mut merged, &patch);

        let validated: UserSettings = serde_json::from_value(merged)
            .map_err(|e| AppError::validation(format!("Invalid settings: {e}")))?;
        let canonical = serde_json::to_value(&validated)?;
        self.settings.upsert(ctx.user_id, &canonical).await?;

        let keys: Vec<&str> = patch_map.keys().map(String::as_str).collect();
        self.audit
            .record(
                ctx,
                AuditAction::SettingsUpdate,
                None,
                None,
                Some(serde_json::json!({ "keys": keys })),
            )
            .await?;
        info!(user_id = %ctx.user_id, ?keys, "Settings updated");

        Ok(validated)
    }

    /// Drops the stored document, reverting the user to defaults.
    pub async fn reset(&self, ctx: &RequestContext) -> AppResult<UserSettings> {
        let removed = self.settings.delete(ctx.user_id).await?;
        if removed {
            self.audit
                .record(
                    ctx,
                    AuditAction::SettingsUpdate,
                    None,
                    None,
                    Some(serde_json::json!({ "reset": true })),
                )
                .await?;
            info!(user_id = %ctx.user_id, "Settings reset to defaults");
        }
        Ok(UserSettings::default())
    }
}

/// Merges `patch` into `target`.
///
/// Object values merge key by key, `null` removes the key, everything
/// else replaces whatever was there.
fn deep_merge(target: &mut Value, patch: &Value) {
    let Some(patch_map) = patch.as_object() else {
        *target = patch.clone();
        return;
    };

    if !target.is_object() {
        *target = Value::Object(Map::new());
    }
    let Some(target_map) = target.as_object_mut() else {
        return;
    };

    for (key, value) in patch_map {
        if value.is_null() {
            target_map.remove(key);
        } else if value.is_object() {
            let slot = target_map
                .entry(key.clone())
                .or_insert(Value::Object(Map::new()));
            deep_merge(slot, value);
        } else {
            target_map.insert(key.clone(), value.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn merge_replaces_scalars_and_keeps_siblings() {
        let mut target = json!({"theme": "light", "locale": "en-US"});
        deep_merge(&mut target, &json!({"theme": "dark"}));
        assert_eq!(target, json!({"theme": "dark", "locale": "en-US"}));
    }

    #[test]
    fn merge_recurses_into_objects() {
        let mut target = json!({"editor": {"font_size": 14, "line_width": 80}});
        deep_merge(&mut target, &json!({"editor": {"font_size": 18}}));
        assert_eq!(
            target,
            json!({"editor": {"font_size": 18, "line_width": 80}})
        );
    }

    #[test]
    fn null_removes_a_key() {
        let mut target = json!({"theme": "dark", "locale": "de-DE"});
        deep_merge(&mut target, &json!({"locale": null}));
        assert_eq!(target, json!({"theme": "dark"}));
    }

    #[test]
    fn object_patch_overwrites_a_scalar() {
        let mut target = json!({"editor": "broken"});
        deep_merge(&mut target, &json!({"editor": {"font_size": 12}}));
        assert_eq!(target, json!({"editor": {"font_size": 12}}));
    }

    #[test]
    fn removed_keys_fall_back_to_defaults_on_parse() {
        let mut target =
            serde_json::to_value(UserSettings::default()).expect("serialize defaults");
        deep_merge(&mut target, &json!({"editor": null}));

        let parsed: UserSettings = serde_json::from_value(target).expect("parse merged");
        assert_eq!(parsed.editor.font_size, 14);
    }

    #[test]
    fn unknown_nested_keys_fail_the_round_trip() {
        let mut target =
            serde_json::to_value(UserSettings::default()).expect("serialize defaults");
        deep_merge(&mut target, &json!({"editor": {"vim_mode": true}}));

        assert!(serde_json::from_value::<UserSettings>(target).is_err());
    }
}
