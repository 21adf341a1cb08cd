//! Authentication flows with audit logging layered on top.

pub mod service;

pub use service::SessionService;
