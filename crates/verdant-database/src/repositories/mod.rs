//! Repository implementations for all Verdant entities.

pub mod account;
pub mod audit;
pub mod content;
pub mod file;
pub mod path;
pub mod session;
pub mod settings;
pub mod tag;
pub mod user;

pub use account::AccountRepository;
pub use audit::{AuditLogRepository, AuditSearchFilter};
pub use content::ContentRepository;
pub use file::FilePayloadRepository;
pub use path::PathRepository;
pub use session::SessionRepository;
pub use settings::SettingsRepository;
pub use tag::TagRepository;
pub use user::UserRepository;
