//! Use Case Infrastructure
//!
//! - `UseCaseResult<T>` - sealed result type for use case outcomes
//! - `UseCaseError` - categorized error types for consistent handling
//! - `ExecutionContext` - principal, tenancy and correlation for one execution

pub mod result;
pub mod error;
pub mod execution_context;

pub use result::UseCaseResult;
pub use error::UseCaseError;
pub use execution_context::ExecutionContext;
