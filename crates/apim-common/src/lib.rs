//! Shared runtime helpers for the API management plane services.

pub mod logging;

pub use logging::{init_logging, LogFormat};
