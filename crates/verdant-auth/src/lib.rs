//! # verdant-auth
//!
//! Authentication and session management for Verdant.
//!
//! ## Modules
//!
//! - `jwt` — JWT token creation and validation
//! - `password` — Argon2id password hashing and policy enforcement
//! - `session` — Session lifecycle management (login, refresh, terminate)
//!
//! Tokens are stateless JWTs, but every request is also checked against
//! the session row that issued the token: rotating or terminating a
//! session invalidates all tokens minted for it, with no blocklist.

pub mod jwt;
pub mod password;
pub mod session;

pub use jwt::{Claims, JwtDecoder, JwtEncoder, TokenPair};
pub use password::{PasswordHasher, PasswordValidator};
pub use session::{LoginResult, SessionCleanup, SessionManager};
