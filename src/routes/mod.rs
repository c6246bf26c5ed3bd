pub(crate) mod auth;
pub(crate) mod chat;
pub mod health_checks;
pub(crate) mod index;
pub(crate) mod model;

pub use health_checks::*;
