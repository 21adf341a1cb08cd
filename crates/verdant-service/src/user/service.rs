//! Self-service account operations.

use serde::{Deserialize, Serialize};
use tracing::info;

use uuid::Uuid;

use verdant_auth::{PasswordHasher, PasswordValidator, SessionManager};
use verdant_core::error::AppError;
use verdant_core::result::AppResult;
use verdant_database::repositories::{AccountRepository, UserRepository};
use verdant_entity::account::Account;
use verdant_entity::audit::action::AuditAction;
use verdant_entity::user::User;
use verdant_entity::user::model::UpdateUser;

use crate::audit::AuditService;
use crate::context::RequestContext;

/// Request to update the current user's profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateProfileRequest {
    /// New email address.
    pub email: Option<String>,
    /// New display name.
    pub display_name: Option<String>,
}

/// Request to change the current user's password.
#[derive(Debug, Clone, Deserialize)]
pub struct ChangePasswordRequest {
    /// The password in use now.
    pub current_password: String,
    /// The replacement.
    pub new_password: String,
}

/// Operations a user performs on their own account.
#[derive(Debug, Clone)]
pub struct UserService {
    users: UserRepository,
    accounts: AccountRepository,
    sessions: SessionManager,
    hasher: PasswordHasher,
    validator: PasswordValidator,
    audit: AuditService,
}

impl UserService {
    /// Creates a new user service.
    pub fn new(
        users: UserRepository,
        accounts: AccountRepository,
        sessions: SessionManager,
        hasher: PasswordHasher,
        validator: PasswordValidator,
        audit: AuditService,
    ) -> Self {
        Self {
            users,
            accounts,
            sessions,
            hasher,
            validator,
            audit,
        }
    }

    /// The current user's account.
    pub async fn me(&self, ctx: &RequestContext) -> AppResult<User> {
        self.users
            .find_by_id(ctx.user_id)
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))
    }

    /// Updates the current user's profile.
    pub async fn update_profile(
        &self,
        ctx: &RequestContext,
        req: UpdateProfileRequest,
    ) -> AppResult<User> {
        if let Some(email) = &req.email {
            if !email.contains('@') {
                return Err(AppError::validation("Invalid email address"));
            }
        }

        let updated = self
            .users
            .update(&UpdateUser {
                id: ctx.user_id,
                email: req.email,
                display_name: req.display_name,
            })
            .await?;

        self.audit
            .record(ctx, AuditAction::UserUpdate, Some(ctx.user_id), None, None)
            .await?;
        info!(user_id = %ctx.user_id, "Profile updated");

        Ok(updated)
    }

    /// Changes the current user's password.
    ///
    /// Every session is terminated afterwards, the current one included;
    /// the client logs in again with the new password.
    pub async fn change_password(
        &self,
        ctx: &RequestContext,
        req: ChangePasswordRequest,
    ) -> AppResult<()> {
        let user = self.me(ctx).await?;

        if !self
            .hasher
            .verify_password(&req.current_password, &user.password_hash)?
        {
            return Err(AppError::unauthorized("Current password is incorrect"));
        }

        self.validator
            .validate_not_same(&req.current_password, &req.new_password)?;

        let mut inputs = vec![user.username.as_str()];
        if let Some(email) = &user.email {
            inputs.push(email);
        }
        if let Some(name) = &user.display_name {
            inputs.push(name);
        }
        self.validator.validate(&req.new_password, &inputs)?;

        let hash = self.hasher.hash_password(&req.new_password)?;
        self.users.update_password(user.id, &hash).await?;
        self.sessions
            .terminate_all_for_user(user.id, None, "password changed")
            .await?;

        self.audit
            .record(
                ctx,
                AuditAction::UserUpdate,
                Some(user.id),
                None,
                Some(serde_json::json!({ "password_changed": true })),
            )
            .await?;
        info!(user_id = %user.id, "Password changed");

        Ok(())
    }

    /// The current user's linked external identities.
    pub async fn list_accounts(&self, ctx: &RequestContext) -> AppResult<Vec<Account>> {
        self.accounts.find_by_user(ctx.user_id).await
    }

    /// Unlinks one of the current user's external identities.
    pub async fn unlink_account(&self, ctx: &RequestContext, account_id: Uuid) -> AppResult<()> {
        let account = self
            .accounts
            .find_by_id(account_id)
            .await?
            .ok_or_else(|| AppError::not_found("Account link not found"))?;
        if account.user_id != ctx.user_id {
            return Err(AppError::forbidden("You do not own this account link"));
        }

        self.accounts.delete(account_id).await?;

        self.audit
            .record(
                ctx,
                AuditAction::UserUpdate,
                Some(ctx.user_id),
                None,
                Some(serde_json::json!({ "account_unlinked": account.provider })),
            )
            .await?;
        info!(user_id = %ctx.user_id, provider = %account.provider, "External account unlinked");

        Ok(())
    }
}
