//! External account link entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A link between a user and an external identity provider.
///
/// The OAuth handshake itself happens outside this service; Verdant only
/// stores the resulting link so admins can see and sever it.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Account {
    /// Unique link identifier.
    pub id: Uuid,
    /// The linked user.
    pub user_id: Uuid,
    /// Provider name (e.g. `"github"`, `"google"`).
    pub provider: String,
    /// The user's identifier at the provider.
    pub provider_account_id: String,
    /// When the link was created.
    pub created_at: DateTime<Utc>,
}

/// Data required to record a new account link.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAccount {
    /// The linked user.
    pub user_id: Uuid,
    /// Provider name.
    pub provider: String,
    /// The user's identifier at the provider.
    pub provider_account_id: String,
}
