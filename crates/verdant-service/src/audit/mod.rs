//! Audit logging and audit search.

pub mod service;

pub use service::{AuditDashboard, AuditService};
