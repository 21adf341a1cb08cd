//! Session lifecycle orchestration.
//!
//! Every session is a database row holding SHA-256 hashes of the tokens
//! issued for it. Login creates the row, refresh rotates the hashes,
//! and validation re-checks the presented token against the stored hash
//! on every request, so terminating a session or rotating its tokens
//! revokes everything minted for it immediately.

use std::net::IpAddr;

use chrono::{Duration, Utc};
use sha2::{Digest, Sha256};
use tracing::{info, warn};
use uuid::Uuid;

use verdant_core::config::{AuthConfig, SessionConfig};
use verdant_core::error::AppError;
use verdant_core::result::AppResult;
use verdant_database::repositories::{SessionRepository, UserRepository};
use verdant_entity::session::Session;
use verdant_entity::session::model::CreateSession;
use verdant_entity::user::User;

use crate::jwt::claims::Claims;
use crate::jwt::decoder::JwtDecoder;
use crate::jwt::encoder::{JwtEncoder, TokenPair};
use crate::password::hasher::PasswordHasher;

/// Outcome of a successful login or refresh.
#[derive(Debug, Clone)]
pub struct LoginResult {
    /// The freshly issued token pair.
    pub tokens: TokenPair,
    /// The session the tokens belong to.
    pub session: Session,
    /// The authenticated user.
    pub user: User,
}

/// Orchestrates login, refresh, validation, and termination against the
/// database.
#[derive(Debug, Clone)]
pub struct SessionManager {
    users: UserRepository,
    sessions: SessionRepository,
    encoder: JwtEncoder,
    decoder: JwtDecoder,
    hasher: PasswordHasher,
    auth_config: AuthConfig,
    session_config: SessionConfig,
}

impl SessionManager {
    /// Creates a new session manager.
    pub fn new(
        users: UserRepository,
        sessions: SessionRepository,
        encoder: JwtEncoder,
        decoder: JwtDecoder,
        hasher: PasswordHasher,
        auth_config: AuthConfig,
        session_config: SessionConfig,
    ) -> Self {
        Self {
            users,
            sessions,
            encoder,
            decoder,
            hasher,
            auth_config,
            session_config,
        }
    }

    /// Authenticates a user and creates a new session.
    ///
    /// Failed attempts are counted per user; reaching the configured
    /// maximum locks the account for `lockout_duration_minutes`. The
    /// error message never reveals whether the username exists.
    pub async fn login(
        &self,
        username: &str,
        password: &str,
        ip_address: IpAddr,
        user_agent: Option<String>,
    ) -> AppResult<LoginResult> {
        let Some(user) = self.users.find_by_username(username).await? else {
            warn!(username, "Login attempt for unknown username");
            return Err(AppError::unauthorized("Invalid username or password"));
        };

        if user.is_locked() {
            warn!(user_id = %user.id, "Login attempt on locked account");
            return Err(AppError::unauthorized(
                "Account is temporarily locked due to repeated failed logins",
            ));
        }

        if !user.status.can_login() {
            return Err(AppError::forbidden("Account is disabled"));
        }

        if !self.hasher.verify_password(password, &user.password_hash)? {
            self.handle_failed_login(&user).await?;
            return Err(AppError::unauthorized("Invalid username or password"));
        }

        if user.failed_login_attempts > 0 {
            self.users.reset_failed_attempts(user.id).await?;
        }

        // The session id goes into the JWT claims, so it has to exist
        // before the tokens are signed.
        let session_id = Uuid::new_v4();
        let tokens = self
            .encoder
            .generate_token_pair(user.id, session_id, user.role, &user.username)?;

        let expires_at =
            Utc::now() + Duration::hours(self.session_config.absolute_timeout_hours as i64);
        let session = self
            .sessions
            .create(&CreateSession {
                id: session_id,
                user_id: user.id,
                token_hash: sha256_hex(&tokens.access_token),
                refresh_token_hash: Some(sha256_hex(&tokens.refresh_token)),
                ip_address,
                user_agent,
                expires_at,
            })
            .await?;

        self.users.update_last_login(user.id).await?;
        info!(user_id = %user.id, session_id = %session.id, "User logged in");

        Ok(LoginResult {
            tokens,
            session,
            user,
        })
    }

    /// Exchanges a refresh token for a new token pair.
    ///
    /// Rotation replaces both stored hashes, so presenting an already
    /// rotated refresh token terminates the session outright: either the
    /// token leaked or the client lost the rotation response, and both
    /// warrant a fresh login. The session's absolute expiry is never
    /// extended by refreshing.
    pub async fn refresh(&self, refresh_token: &str) -> AppResult<LoginResult> {
        let claims = self.decoder.decode_refresh_token(refresh_token)?;

        let session = self
            .sessions
            .find_by_id(claims.session_id())
            .await?
            .ok_or_else(|| AppError::unauthorized("Session not found"))?;

        if session.terminated_at.is_some() {
            return Err(AppError::unauthorized("Session has been terminated"));
        }
        if session.is_expired() {
            return Err(AppError::unauthorized("Session has expired"));
        }

        let presented_hash = sha256_hex(refresh_token);
        if session.refresh_token_hash.as_deref() != Some(presented_hash.as_str()) {
            self.sessions
                .terminate(session.id, None, "refresh token reuse")
                .await?;
            warn!(session_id = %session.id, "Stale refresh token presented; session terminated");
            return Err(AppError::unauthorized("Refresh token is no longer valid"));
        }

        let user = self
            .users
            .find_by_id(session.user_id)
            .await?
            .ok_or_else(|| AppError::unauthorized("User no longer exists"))?;

        if !user.status.can_login() {
            return Err(AppError::forbidden("Account is disabled"));
        }
        if user.is_locked() {
            return Err(AppError::unauthorized("Account is temporarily locked"));
        }

        let tokens = self
            .encoder
            .generate_token_pair(user.id, session.id, user.role, &user.username)?;

        let session = self
            .sessions
            .rotate_tokens(
                session.id,
                &sha256_hex(&tokens.access_token),
                &sha256_hex(&tokens.refresh_token),
                session.expires_at,
            )
            .await?;

        info!(user_id = %user.id, session_id = %session.id, "Session tokens rotated");

        Ok(LoginResult {
            tokens,
            session,
            user,
        })
    }

    /// Validates that a decoded access token still belongs to a live
    /// session, and records the activity.
    ///
    /// Callers decode the token first; this check then enforces
    /// termination, absolute expiry, hash binding, and the idle timeout.
    /// An idle session is terminated on the spot.
    pub async fn validate_session(
        &self,
        session_id: Uuid,
        access_token: &str,
    ) -> AppResult<Session> {
        let session = self
            .sessions
            .find_by_id(session_id)
            .await?
            .ok_or_else(|| AppError::unauthorized("Session not found"))?;

        if session.terminated_at.is_some() {
            return Err(AppError::unauthorized("Session has been terminated"));
        }
        if session.is_expired() {
            return Err(AppError::unauthorized("Session has expired"));
        }

        if session.token_hash != sha256_hex(access_token) {
            return Err(AppError::unauthorized(
                "Token no longer matches this session",
            ));
        }

        let idle_cutoff = session.last_activity
            + Duration::minutes(self.session_config.idle_timeout_minutes as i64);
        if Utc::now() > idle_cutoff {
            self.sessions
                .terminate(session.id, None, "idle timeout")
                .await?;
            info!(session_id = %session.id, "Session terminated after idle timeout");
            return Err(AppError::unauthorized(
                "Session timed out due to inactivity",
            ));
        }

        self.sessions.touch(session.id).await?;
        Ok(session)
    }

    /// Decodes an access token and validates its session in one step.
    ///
    /// The request-authentication entry point: returns the claims the
    /// request should act as.
    pub async fn authenticate(&self, access_token: &str) -> AppResult<Claims> {
        let claims = self.decoder.decode_access_token(access_token)?;
        self.validate_session(claims.sid, access_token).await?;
        Ok(claims)
    }

    /// Ends a session at the user's own request.
    ///
    /// Logging out an already terminated session is not an error.
    pub async fn logout(&self, session_id: Uuid) -> AppResult<()> {
        let terminated = self.sessions.terminate(session_id, None, "logout").await?;
        if terminated {
            info!(session_id = %session_id, "User logged out");
        }
        Ok(())
    }

    /// Terminates another user's session on behalf of an administrator.
    pub async fn admin_terminate(
        &self,
        session_id: Uuid,
        admin_id: Uuid,
        reason: Option<&str>,
    ) -> AppResult<()> {
        let reason = reason.unwrap_or("terminated by administrator");
        let terminated = self
            .sessions
            .terminate(session_id, Some(admin_id), reason)
            .await?;
        if !terminated {
            return Err(AppError::not_found(
                "Session not found or already terminated",
            ));
        }
        info!(session_id = %session_id, admin_id = %admin_id, "Session terminated by admin");
        Ok(())
    }

    /// Terminates every live session a user holds. Used when an account
    /// is disabled or its password changes.
    pub async fn terminate_all_for_user(
        &self,
        user_id: Uuid,
        terminated_by: Option<Uuid>,
        reason: &str,
    ) -> AppResult<u64> {
        let count = self
            .sessions
            .terminate_all_for_user(user_id, terminated_by, reason)
            .await?;
        if count > 0 {
            info!(user_id = %user_id, count, reason, "Terminated all sessions for user");
        }
        Ok(count)
    }

    /// Lists a user's live sessions, most recently active first.
    pub async fn list_active_sessions(&self, user_id: Uuid) -> AppResult<Vec<Session>> {
        self.sessions.find_active_by_user(user_id).await
    }

    async fn handle_failed_login(&self, user: &User) -> AppResult<()> {
        let attempts = self.users.increment_failed_attempts(user.id).await?;
        if attempts >= self.auth_config.max_failed_attempts {
            let until =
                Utc::now() + Duration::minutes(self.auth_config.lockout_duration_minutes as i64);
            self.users.lock_until(user.id, until).await?;
            warn!(user_id = %user.id, attempts, "Account locked after repeated failed logins");
        }
        Ok(())
    }
}

/// Hex-encoded SHA-256 of a token string, as stored on the session row.
fn sha256_hex(input: &str) -> String {
    let digest = Sha256::digest(input.as_bytes());
    digest.iter().map(|byte| format!("{byte:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha256_hex_matches_known_vector() {
        assert_eq!(
            sha256_hex("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn sha256_hex_of_empty_input() {
        assert_eq!(
            sha256_hex(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}
