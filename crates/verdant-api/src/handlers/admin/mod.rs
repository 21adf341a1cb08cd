//! Admin panel handlers.
//!
//! Every operation here re-checks the admin role at the service layer;
//! the handlers only shape requests and responses.

pub mod audit;
pub mod paths;
pub mod sessions;
pub mod users;
