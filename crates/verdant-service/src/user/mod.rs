//! User account management: self-service and the admin panel.

pub mod admin;
pub mod service;

pub use admin::AdminUserService;
pub use service::UserService;
