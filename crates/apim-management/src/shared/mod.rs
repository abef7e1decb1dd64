//! Shared infrastructure used by every aggregate.

pub mod api_common;
pub mod error;
pub mod ids;
pub mod memory;
pub mod middleware;

pub use error::{ManagementError, Result};
