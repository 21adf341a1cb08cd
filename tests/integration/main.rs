//! DB-backed integration tests.
//!
//! Every test here needs a running PostgreSQL reachable through
//! `config/test.toml` (or a `VERDANT__DATABASE__URL` override) and is
//! marked `#[ignore]`; run them with `cargo test -- --ignored`.
//! Fixtures use randomized names so tests can run in parallel and
//! repeatedly against the same database.

mod helpers;

mod admin_test;
mod auth_test;
mod content_test;
mod export_test;
mod file_test;
mod reorder_test;
mod settings_test;
mod tag_test;
