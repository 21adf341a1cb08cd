//! External account link entities.

pub mod model;

pub use model::{Account, CreateAccount};
