//! HTTP middleware: request logging, CORS, and compression layers.

pub mod compression;
pub mod cors;
pub mod logging;
