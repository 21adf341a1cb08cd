//! # verdant-entity
//!
//! Domain entity models for Verdant. Every struct in this crate
//! represents a database table row or a domain value object. All entities
//! derive `Debug`, `Clone`, `Serialize`, `Deserialize`, and database
//! entities additionally derive `sqlx::FromRow`.

pub mod account;
pub mod audit;
pub mod content;
pub mod file;
pub mod session;
pub mod settings;
pub mod tag;
pub mod user;
