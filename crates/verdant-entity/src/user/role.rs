//! User role enumeration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Roles available in the RBAC system.
///
/// Roles are ordered by privilege level: Owner > Admin > Member > Guest.
/// The owner is the gardener the instance belongs to; admins run the
/// admin panel; members edit content; guests read published content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// Instance owner with full control.
    Owner,
    /// Can manage users and run maintenance operations.
    Admin,
    /// Can create and edit content.
    Member,
    /// Read-only access.
    Guest,
}

impl UserRole {
    /// Return the privilege level (higher = more privileged).
    pub fn privilege_level(&self) -> u8 {
        match self {
            Self::Owner => 4,
            Self::Admin => 3,
            Self::Member => 2,
            Self::Guest => 1,
        }
    }

    /// Check if this role has at least the given role's privileges.
    pub fn has_at_least(&self, other: &UserRole) -> bool {
        self.privilege_level() >= other.privilege_level()
    }

    /// Check if this role may use the admin surface.
    pub fn is_admin(&self) -> bool {
        self.has_at_least(&Self::Admin)
    }

    /// Check if this role may create and edit content.
    pub fn can_write(&self) -> bool {
        self.has_at_least(&Self::Member)
    }

    /// Return the role as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Owner => "owner",
            Self::Admin => "admin",
            Self::Member => "member",
            Self::Guest => "guest",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = verdant_core::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "owner" => Ok(Self::Owner),
            "admin" => Ok(Self::Admin),
            "member" => Ok(Self::Member),
            "guest" => Ok(Self::Guest),
            _ => Err(verdant_core::AppError::validation(format!(
                "Invalid user role: '{s}'. Expected one of: owner, admin, member, guest"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_privilege_ordering() {
        assert!(UserRole::Owner.has_at_least(&UserRole::Guest));
        assert!(UserRole::Owner.has_at_least(&UserRole::Owner));
        assert!(UserRole::Admin.has_at_least(&UserRole::Member));
        assert!(!UserRole::Guest.has_at_least(&UserRole::Member));
    }

    #[test]
    fn test_admin_surface() {
        assert!(UserRole::Owner.is_admin());
        assert!(UserRole::Admin.is_admin());
        assert!(!UserRole::Member.is_admin());
    }

    #[test]
    fn test_from_str() {
        assert_eq!("owner".parse::<UserRole>().unwrap(), UserRole::Owner);
        assert_eq!("GUEST".parse::<UserRole>().unwrap(), UserRole::Guest);
        assert!("wizard".parse::<UserRole>().is_err());
    }
}
