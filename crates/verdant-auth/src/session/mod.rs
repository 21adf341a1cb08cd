//! Session lifecycle management: login, refresh, validation, termination.

pub mod cleanup;
pub mod manager;

pub use cleanup::SessionCleanup;
pub use manager::{LoginResult, SessionManager};
