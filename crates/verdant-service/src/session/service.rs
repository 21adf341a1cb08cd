//! Login, logout, refresh, and session administration.
//!
//! Wraps [`SessionManager`] so that every auth event lands in the audit
//! log with the actor and origin IP attached.

use std::net::IpAddr;

use tracing::info;
use uuid::Uuid;

use verdant_auth::{LoginResult, SessionManager};
use verdant_core::error::ErrorKind;
use verdant_core::result::AppResult;
use verdant_database::repositories::UserRepository;
use verdant_entity::audit::action::AuditAction;
use verdant_entity::session::Session;

use crate::audit::AuditService;
use crate::context::RequestContext;

/// Authentication facade for the HTTP layer.
#[derive(Debug, Clone)]
pub struct SessionService {
    manager: SessionManager,
    users: UserRepository,
    audit: AuditService,
}

impl SessionService {
    /// Creates a new session service.
    pub fn new(manager: SessionManager, users: UserRepository, audit: AuditService) -> Self {
        Self {
            manager,
            users,
            audit,
        }
    }

    /// Authenticates a login attempt and records its outcome.
    ///
    /// Failed attempts against a known account are audited under that
    /// account; attempts against unknown usernames leave no trail, since
    /// there is no actor to attribute them to.
    pub async fn login(
        &self,
        username: &str,
        password: &str,
        ip_address: IpAddr,
        user_agent: Option<String>,
    ) -> AppResult<LoginResult> {
        match self
            .manager
            .login(username, password, ip_address, user_agent)
            .await
        {
            Ok(result) => {
                self.audit
                    .record_for_actor(
                        result.user.id,
                        AuditAction::Login,
                        Some(ip_address.to_string()),
                        None,
                    )
                    .await?;
                Ok(result)
            }
            Err(e) if matches!(e.kind, ErrorKind::Unauthorized | ErrorKind::Forbidden) => {
                if let Some(user) = self.users.find_by_username(username).await? {
                    self.audit
                        .record_for_actor(
                            user.id,
                            AuditAction::LoginFailed,
                            Some(ip_address.to_string()),
                            Some(serde_json::json!({ "reason": e.message })),
                        )
                        .await?;
                }
                Err(e)
            }
            Err(e) => Err(e),
        }
    }

    /// Resolves an access token into a request context.
    pub async fn authenticate(
        &self,
        access_token: &str,
        ip_address: String,
        user_agent: Option<String>,
    ) -> AppResult<RequestContext> {
        let claims = self.manager.authenticate(access_token).await?;
        Ok(RequestContext::new(
            claims.sub,
            claims.sid,
            claims.role,
            claims.username,
            ip_address,
            user_agent,
        ))
    }

    /// Rotates a refresh token into a new token pair.
    ///
    /// Not audited: rotation is routine and the session row already
    /// tracks its own activity.
    pub async fn refresh(&self, refresh_token: &str) -> AppResult<LoginResult> {
        self.manager.refresh(refresh_token).await
    }

    /// Ends the current session.
    pub async fn logout(&self, ctx: &RequestContext) -> AppResult<()> {
        self.manager.logout(ctx.session_id).await?;
        self.audit
            .record(ctx, AuditAction::Logout, None, None, None)
            .await?;
        Ok(())
    }

    /// Lists the current user's active sessions.
    pub async fn list_sessions(&self, ctx: &RequestContext) -> AppResult<Vec<Session>> {
        self.manager.list_active_sessions(ctx.user_id).await
    }

    /// Terminates any session by id, for administrators.
    pub async fn admin_terminate(
        &self,
        ctx: &RequestContext,
        session_id: Uuid,
        reason: Option<&str>,
    ) -> AppResult<()> {
        ctx.require_admin()?;

        self.manager
            .admin_terminate(session_id, ctx.user_id, reason)
            .await?;
        self.audit
            .record(
                ctx,
                AuditAction::SessionTerminate,
                None,
                None,
                Some(serde_json::json!({
                    "session_id": session_id,
                    "reason": reason.unwrap_or("terminated by administrator"),
                })),
            )
            .await?;
        info!(admin_id = %ctx.user_id, session_id = %session_id, "Session terminated by admin");

        Ok(())
    }
}
