//! # verdant-api
//!
//! HTTP API layer for Verdant, built on Axum.
//!
//! ## Modules
//!
//! - `app` — application builder and server entry point
//! - `router` — route definitions, organized by domain
//! - `handlers` — request handlers
//! - `extractors` — authentication and pagination extractors
//! - `middleware` — request logging, CORS, compression
//! - `dto` — request and response data transfer objects
//! - `error` — domain error to HTTP response mapping
//! - `state` — shared application state

pub mod app;
pub mod dto;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use app::{build_app, run_server};
pub use state::AppState;
