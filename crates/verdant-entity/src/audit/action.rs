//! Audit action enumeration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The closed set of auditable actions.
///
/// Entries are stored as their dotted string form (`"user.create"`);
/// every write into the audit log goes through this enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    /// Successful login.
    Login,
    /// Failed login attempt.
    LoginFailed,
    /// Logout.
    Logout,
    /// A session was terminated by an admin.
    SessionTerminate,
    /// A user account was created.
    UserCreate,
    /// A user's profile was updated.
    UserUpdate,
    /// A user's role was changed.
    UserRoleChange,
    /// A user's status was changed.
    UserStatusChange,
    /// A user's password was reset by an admin.
    UserPasswordReset,
    /// A user account was deleted.
    UserDelete,
    /// A content node was soft-deleted.
    ContentDelete,
    /// A soft-deleted content node was restored.
    ContentRestore,
    /// A vault export was produced.
    VaultExport,
    /// Per-user settings were updated.
    SettingsUpdate,
    /// A file's external provider link was cleared.
    ClearExternalLink,
    /// The materialized path cache was rebuilt.
    PathsRebuild,
}

impl AuditAction {
    /// Return the action in its stored dotted form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Login => "auth.login",
            Self::LoginFailed => "auth.login_failed",
            Self::Logout => "auth.logout",
            Self::SessionTerminate => "session.terminate",
            Self::UserCreate => "user.create",
            Self::UserUpdate => "user.update",
            Self::UserRoleChange => "user.role_change",
            Self::UserStatusChange => "user.status_change",
            Self::UserPasswordReset => "user.password_reset",
            Self::UserDelete => "user.delete",
            Self::ContentDelete => "content.delete",
            Self::ContentRestore => "content.restore",
            Self::VaultExport => "export.vault",
            Self::SettingsUpdate => "settings.update",
            Self::ClearExternalLink => "file.clear_external_link",
            Self::PathsRebuild => "paths.rebuild",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for AuditAction {
    type Err = verdant_core::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "auth.login" => Ok(Self::Login),
            "auth.login_failed" => Ok(Self::LoginFailed),
            "auth.logout" => Ok(Self::Logout),
            "session.terminate" => Ok(Self::SessionTerminate),
            "user.create" => Ok(Self::UserCreate),
            "user.update" => Ok(Self::UserUpdate),
            "user.role_change" => Ok(Self::UserRoleChange),
            "user.status_change" => Ok(Self::UserStatusChange),
            "user.password_reset" => Ok(Self::UserPasswordReset),
            "user.delete" => Ok(Self::UserDelete),
            "content.delete" => Ok(Self::ContentDelete),
            "content.restore" => Ok(Self::ContentRestore),
            "export.vault" => Ok(Self::VaultExport),
            "settings.update" => Ok(Self::SettingsUpdate),
            "file.clear_external_link" => Ok(Self::ClearExternalLink),
            "paths.rebuild" => Ok(Self::PathsRebuild),
            _ => Err(verdant_core::AppError::validation(format!(
                "Unknown audit action: '{s}'"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        for action in [
            AuditAction::Login,
            AuditAction::UserRoleChange,
            AuditAction::ClearExternalLink,
            AuditAction::PathsRebuild,
        ] {
            assert_eq!(action.as_str().parse::<AuditAction>().unwrap(), action);
        }
    }

    #[test]
    fn test_unknown_action_rejected() {
        assert!("user.promote".parse::<AuditAction>().is_err());
    }
}
