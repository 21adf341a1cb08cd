//! HTTP request handlers, organized by domain.

pub mod admin;
pub mod auth;
pub mod content;
pub mod export;
pub mod file;
pub mod health;
pub mod settings;
pub mod tag;
pub mod user;
