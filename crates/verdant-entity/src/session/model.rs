//! Session entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// An active user session.
///
/// Sessions are created on login and destroyed on logout, expiry,
/// or admin termination.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Session {
    /// Unique session identifier.
    pub id: Uuid,
    /// The user this session belongs to.
    pub user_id: Uuid,
    /// SHA-256 hash of the access token.
    #[serde(skip_serializing)]
    pub token_hash: String,
    /// SHA-256 hash of the refresh token (if issued).
    #[serde(skip_serializing)]
    pub refresh_token_hash: Option<String>,
    /// IP address from which the session was created.
    pub ip_address: std::net::IpAddr,
    /// User-Agent header value.
    pub user_agent: Option<String>,
    /// The admin who terminated this session (if applicable).
    pub terminated_by: Option<Uuid>,
    /// Reason for termination.
    pub terminated_reason: Option<String>,
    /// When the session was terminated.
    pub terminated_at: Option<DateTime<Utc>>,
    /// When the session was created (login time).
    pub created_at: DateTime<Utc>,
    /// When the session expires (absolute timeout).
    pub expires_at: DateTime<Utc>,
    /// Last activity timestamp.
    pub last_activity: DateTime<Utc>,
}

impl Session {
    /// Check whether the session is still active (not terminated and not expired).
    pub fn is_active(&self) -> bool {
        self.terminated_at.is_none() && self.expires_at > Utc::now()
    }

    /// Check whether the session has expired.
    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now()
    }

    /// Calculate how long the session has been idle (in seconds).
    pub fn idle_seconds(&self) -> i64 {
        (Utc::now() - self.last_activity).num_seconds().max(0)
    }
}

/// Data required to create a new session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSession {
    /// Session identifier, generated before the row is inserted so the
    /// JWT claims minted alongside it can reference the session.
    pub id: Uuid,
    /// The user this session belongs to.
    pub user_id: Uuid,
    /// SHA-256 hash of the access token.
    pub token_hash: String,
    /// SHA-256 hash of the refresh token.
    pub refresh_token_hash: Option<String>,
    /// IP address of the client.
    pub ip_address: std::net::IpAddr,
    /// User-Agent header.
    pub user_agent: Option<String>,
    /// When the session expires.
    pub expires_at: DateTime<Utc>,
}
