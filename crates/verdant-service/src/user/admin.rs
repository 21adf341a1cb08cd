//! Admin panel user management.
//!
//! Every mutation here lands in the audit log with the acting admin as
//! the actor. Owner accounts are fenced off: only an owner may touch
//! them, and the owner role itself can only be granted by an owner.

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use verdant_auth::{PasswordHasher, PasswordValidator, SessionManager};
use verdant_core::error::AppError;
use verdant_core::result::AppResult;
use verdant_core::types::pagination::{PageRequest, PageResponse};
use verdant_database::repositories::{ContentRepository, UserRepository};
use verdant_entity::audit::action::AuditAction;
use verdant_entity::session::Session;
use verdant_entity::user::model::{CreateUser, UpdateUser};
use verdant_entity::user::{User, UserRole, UserStatus};

use crate::audit::AuditService;
use crate::context::RequestContext;
use crate::user::service::UpdateProfileRequest;

/// Generated temporary password length.
const TEMP_PASSWORD_LENGTH: usize = 16;

/// Request to create a user account.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateUserRequest {
    /// Desired username.
    pub username: String,
    /// Email address.
    pub email: Option<String>,
    /// Display name.
    pub display_name: Option<String>,
    /// Assigned role.
    pub role: UserRole,
    /// Initial password; when omitted a temporary one is generated.
    pub password: Option<String>,
}

/// A freshly created account.
///
/// `temporary_password` is shown exactly once and never stored in the
/// clear.
#[derive(Debug, Clone, Serialize)]
pub struct CreatedUser {
    /// The new account.
    pub user: User,
    /// The generated password, when none was supplied.
    pub temporary_password: Option<String>,
}

/// One user's admin detail view.
#[derive(Debug, Clone, Serialize)]
pub struct UserDetail {
    /// The account.
    pub user: User,
    /// Their live sessions.
    pub active_sessions: Vec<Session>,
    /// How many live content nodes they own.
    pub content_count: u64,
}

/// Operations administrators perform on other accounts.
#[derive(Debug, Clone)]
pub struct AdminUserService {
    users: UserRepository,
    content: ContentRepository,
    sessions: SessionManager,
    hasher: PasswordHasher,
    validator: PasswordValidator,
    audit: AuditService,
}

impl AdminUserService {
    /// Creates a new admin user service.
    pub fn new(
        users: UserRepository,
        content: ContentRepository,
        sessions: SessionManager,
        hasher: PasswordHasher,
        validator: PasswordValidator,
        audit: AuditService,
    ) -> Self {
        Self {
            users,
            content,
            sessions,
            hasher,
            validator,
            audit,
        }
    }

    /// Lists accounts, newest first.
    pub async fn list_users(
        &self,
        ctx: &RequestContext,
        page: &PageRequest,
    ) -> AppResult<PageResponse<User>> {
        ctx.require_admin()?;
        self.users.find_all(page).await
    }

    /// Searches accounts by username, email, or display name.
    pub async fn search_users(
        &self,
        ctx: &RequestContext,
        query: &str,
        page: &PageRequest,
    ) -> AppResult<PageResponse<User>> {
        ctx.require_admin()?;
        self.users.search(query, page).await
    }

    /// One account with its sessions and content footprint.
    pub async fn get_user_detail(&self, ctx: &RequestContext, id: Uuid) -> AppResult<UserDetail> {
        ctx.require_admin()?;

        let user = self.require_user(id).await?;
        let active_sessions = self.sessions.list_active_sessions(id).await?;
        let content_count = self.content.count_live(id).await?;

        Ok(UserDetail {
            user,
            active_sessions,
            content_count,
        })
    }

    /// Creates an account.
    ///
    /// When no password is supplied a strong temporary one is generated
    /// and returned once.
    pub async fn create_user(
        &self,
        ctx: &RequestContext,
        req: CreateUserRequest,
    ) -> AppResult<CreatedUser> {
        ctx.require_admin()?;
        validate_username(&req.username)?;
        if req.role == UserRole::Owner && ctx.role != UserRole::Owner {
            return Err(AppError::forbidden("Only the owner may grant the owner role"));
        }

        let (password, temporary_password) = match req.password {
            Some(password) => (password, None),
            None => {
                let generated = generate_temporary_password(TEMP_PASSWORD_LENGTH);
                (generated.clone(), Some(generated))
            }
        };
        self.validator.validate(&password, &[&req.username])?;
        let password_hash = self.hasher.hash_password(&password)?;

        let user = self
            .users
            .create(&CreateUser {
                username: req.username,
                email: req.email,
                password_hash,
                display_name: req.display_name,
                role: req.role,
            })
            .await?;

        self.audit
            .record(
                ctx,
                AuditAction::UserCreate,
                Some(user.id),
                None,
                Some(serde_json::json!({ "role": user.role })),
            )
            .await?;
        info!(admin_id = %ctx.user_id, user_id = %user.id, role = %user.role, "User created");

        Ok(CreatedUser {
            user,
            temporary_password,
        })
    }

    /// Updates another account's profile fields.
    pub async fn update_user(
        &self,
        ctx: &RequestContext,
        id: Uuid,
        req: UpdateProfileRequest,
    ) -> AppResult<User> {
        ctx.require_admin()?;

        let target = self.require_user(id).await?;
        self.guard_owner_target(ctx, &target)?;

        let updated = self
            .users
            .update(&UpdateUser {
                id,
                email: req.email,
                display_name: req.display_name,
            })
            .await?;

        self.audit
            .record(ctx, AuditAction::UserUpdate, Some(id), None, None)
            .await?;
        info!(admin_id = %ctx.user_id, user_id = %id, "User profile updated by admin");

        Ok(updated)
    }

    /// Changes an account's role.
    pub async fn update_role(
        &self,
        ctx: &RequestContext,
        id: Uuid,
        role: UserRole,
    ) -> AppResult<User> {
        ctx.require_admin()?;
        if id == ctx.user_id {
            return Err(AppError::validation("Cannot change your own role"));
        }

        let target = self.require_user(id).await?;
        self.guard_owner_target(ctx, &target)?;
        if role == UserRole::Owner && ctx.role != UserRole::Owner {
            return Err(AppError::forbidden("Only the owner may grant the owner role"));
        }

        let updated = self.users.update_role(id, role).await?;

        self.audit
            .record(
                ctx,
                AuditAction::UserRoleChange,
                Some(id),
                None,
                Some(serde_json::json!({ "from": target.role, "to": role })),
            )
            .await?;
        info!(
            admin_id = %ctx.user_id,
            user_id = %id,
            from = %target.role,
            to = %role,
            "User role changed"
        );

        Ok(updated)
    }

    /// Enables or disables an account.
    ///
    /// Disabling terminates every session the account holds.
    pub async fn update_status(
        &self,
        ctx: &RequestContext,
        id: Uuid,
        status: UserStatus,
    ) -> AppResult<User> {
        ctx.require_admin()?;
        if id == ctx.user_id {
            return Err(AppError::validation("Cannot change your own status"));
        }

        let target = self.require_user(id).await?;
        self.guard_owner_target(ctx, &target)?;

        let updated = self.users.update_status(id, status).await?;
        if status == UserStatus::Disabled {
            self.sessions
                .terminate_all_for_user(id, Some(ctx.user_id), "account disabled")
                .await?;
        }

        self.audit
            .record(
                ctx,
                AuditAction::UserStatusChange,
                Some(id),
                None,
                Some(serde_json::json!({ "status": status })),
            )
            .await?;
        info!(admin_id = %ctx.user_id, user_id = %id, status = %status, "User status changed");

        Ok(updated)
    }

    /// Resets an account's password to a generated temporary one.
    ///
    /// Terminates the account's sessions; the new password is returned
    /// once.
    pub async fn reset_password(&self, ctx: &RequestContext, id: Uuid) -> AppResult<String> {
        ctx.require_admin()?;

        let target = self.require_user(id).await?;
        self.guard_owner_target(ctx, &target)?;

        let temporary = generate_temporary_password(TEMP_PASSWORD_LENGTH);
        let hash = self.hasher.hash_password(&temporary)?;
        self.users.update_password(id, &hash).await?;
        self.sessions
            .terminate_all_for_user(id, Some(ctx.user_id), "password reset by administrator")
            .await?;

        self.audit
            .record(ctx, AuditAction::UserPasswordReset, Some(id), None, None)
            .await?;
        info!(admin_id = %ctx.user_id, user_id = %id, "User password reset");

        Ok(temporary)
    }

    /// Deletes an account and everything it owns.
    pub async fn delete_user(&self, ctx: &RequestContext, id: Uuid) -> AppResult<()> {
        ctx.require_admin()?;
        if id == ctx.user_id {
            return Err(AppError::validation("Cannot delete your own account"));
        }

        let target = self.require_user(id).await?;
        if target.role == UserRole::Owner {
            return Err(AppError::forbidden("The owner account cannot be deleted"));
        }

        if !self.users.delete(id).await? {
            return Err(AppError::not_found("User not found"));
        }

        self.audit
            .record(
                ctx,
                AuditAction::UserDelete,
                Some(id),
                None,
                Some(serde_json::json!({ "username": target.username })),
            )
            .await?;
        info!(admin_id = %ctx.user_id, user_id = %id, "User deleted");

        Ok(())
    }

    async fn require_user(&self, id: Uuid) -> AppResult<User> {
        self.users
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))
    }

    /// Owner accounts may only be managed by an owner.
    fn guard_owner_target(&self, ctx: &RequestContext, target: &User) -> AppResult<()> {
        if target.role == UserRole::Owner && ctx.role != UserRole::Owner {
            return Err(AppError::forbidden(
                "Only the owner may manage owner accounts",
            ));
        }
        Ok(())
    }
}

/// Checks a username is usable as a login and a stable identifier.
fn validate_username(username: &str) -> AppResult<()> {
    if username.len() < 3 || username.len() > 32 {
        return Err(AppError::validation(
            "Username must be between 3 and 32 characters",
        ));
    }
    let mut chars = username.chars();
    let starts_with_letter = chars.next().is_some_and(|c| c.is_ascii_lowercase());
    if !starts_with_letter
        || !username
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_')
    {
        return Err(AppError::validation(
            "Username must start with a letter and contain only lowercase letters, digits, '-' and '_'",
        ));
    }
    Ok(())
}

/// Generates a random password guaranteed to contain an uppercase
/// letter, a lowercase letter, a digit, and a special character.
///
/// Visually ambiguous characters (0/O, 1/l/I) are excluded since these
/// passwords get read out or retyped.
fn generate_temporary_password(length: usize) -> String {
    const UPPER: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ";
    const LOWER: &[u8] = b"abcdefghijkmnpqrstuvwxyz";
    const DIGITS: &[u8] = b"23456789";
    const SPECIAL: &[u8] = b"!@#$%^&*-_=+";

    let mut rng = rand::rng();
    let mut chars = vec![
        UPPER[rng.random_range(0..UPPER.len())],
        LOWER[rng.random_range(0..LOWER.len())],
        DIGITS[rng.random_range(0..DIGITS.len())],
        SPECIAL[rng.random_range(0..SPECIAL.len())],
    ];

    let pool = [UPPER, LOWER, DIGITS, SPECIAL].concat();
    while chars.len() < length {
        chars.push(pool[rng.random_range(0..pool.len())]);
    }
    chars.shuffle(&mut rng);

    String::from_utf8_lossy(&chars).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use verdant_core::config::AuthConfig;

    fn validator() -> PasswordValidator {
        PasswordValidator::new(&AuthConfig {
            jwt_secret: "test-secret".to_string(),
            jwt_access_ttl_minutes: 15,
            jwt_refresh_ttl_hours: 72,
            password_min_length: 12,
            password_min_score: 3,
            max_failed_attempts: 5,
            lockout_duration_minutes: 15,
        })
    }

    #[test]
    fn temporary_passwords_pass_the_validator() {
        let validator = validator();
        for _ in 0..20 {
            let password = generate_temporary_password(TEMP_PASSWORD_LENGTH);
            assert_eq!(password.len(), TEMP_PASSWORD_LENGTH);
            validator
                .validate(&password, &[])
                .expect("generated password should satisfy the policy");
        }
    }

    #[test]
    fn temporary_passwords_cover_all_classes() {
        let password = generate_temporary_password(TEMP_PASSWORD_LENGTH);
        assert!(password.chars().any(|c| c.is_ascii_uppercase()));
        assert!(password.chars().any(|c| c.is_ascii_lowercase()));
        assert!(password.chars().any(|c| c.is_ascii_digit()));
        assert!(password.chars().any(|c| !c.is_ascii_alphanumeric()));
    }

    #[test]
    fn usernames_are_checked() {
        assert!(validate_username("fern").is_ok());
        assert!(validate_username("fern-grows_2").is_ok());
        assert!(validate_username("ab").is_err());
        assert!(validate_username("2fast").is_err());
        assert!(validate_username("Fern").is_err());
        assert!(validate_username("fern grows").is_err());
    }
}
