//! Per-user settings document management.

pub mod service;

pub use service::SettingsService;
