//! # verdant-service
//!
//! Business logic service layer for Verdant. Each service orchestrates
//! repositories, storage providers, and authentication to implement
//! application-level use cases.
//!
//! Services follow constructor injection — all dependencies are provided
//! at construction time and every service is cheap to clone.

pub mod audit;
pub mod content;
pub mod context;
pub mod export;
pub mod file;
pub mod session;
pub mod settings;
pub mod tag;
pub mod user;

pub use audit::{AuditDashboard, AuditService};
pub use content::{ContentService, OutlineItem, PathService};
pub use context::RequestContext;
pub use export::ExportService;
pub use file::FileService;
pub use session::SessionService;
pub use settings::SettingsService;
pub use tag::TagService;
pub use user::{AdminUserService, UserService};
