//! Use Case Result Type

use super::error::UseCaseError;

/// Result type for use case execution.
///
/// Use cases run their steps as `Result<T, UseCaseError>` so that `?` works,
/// then hand back a `UseCaseResult` at the boundary.
///
/// ```ignore
/// pub async fn execute(&self, input: RollbackApiInput, ctx: ExecutionContext) -> UseCaseResult<RollbackApiOutput> {
///     self.run(input, &ctx).await.into()
/// }
/// ```
pub enum UseCaseResult<T> {
    Success(T),
    Failure(UseCaseError),
}

impl<T> UseCaseResult<T> {
    pub fn failure(error: UseCaseError) -> Self {
        UseCaseResult::Failure(error)
    }

    pub(crate) fn success(value: T) -> Self {
        UseCaseResult::Success(value)
    }

    pub fn is_success(&self) -> bool {
        matches!(self, UseCaseResult::Success(_))
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, UseCaseResult::Failure(_))
    }

    /// Get the success value, consuming self.
    pub fn unwrap(self) -> T {
        match self {
            UseCaseResult::Success(v) => v,
            UseCaseResult::Failure(e) => panic!("Called unwrap on a Failure: {}", e),
        }
    }

    /// Get the error, consuming self.
    pub fn unwrap_err(self) -> UseCaseError {
        match self {
            UseCaseResult::Success(_) => panic!("Called unwrap_err on a Success"),
            UseCaseResult::Failure(e) => e,
        }
    }

    pub fn map<U, F>(self, f: F) -> UseCaseResult<U>
    where
        F: FnOnce(T) -> U,
    {
        match self {
            UseCaseResult::Success(v) => UseCaseResult::Success(f(v)),
            UseCaseResult::Failure(e) => UseCaseResult::Failure(e),
        }
    }

    pub fn into_result(self) -> Result<T, UseCaseError> {
        match self {
            UseCaseResult::Success(v) => Ok(v),
            UseCaseResult::Failure(e) => Err(e),
        }
    }
}

impl<T> From<Result<T, UseCaseError>> for UseCaseResult<T> {
    fn from(result: Result<T, UseCaseError>) -> Self {
        match result {
            Ok(v) => UseCaseResult::success(v),
            Err(e) => UseCaseResult::failure(e),
        }
    }
}

impl<T> From<UseCaseResult<T>> for Result<T, UseCaseError> {
    fn from(result: UseCaseResult<T>) -> Self {
        result.into_result()
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for UseCaseResult<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UseCaseResult::Success(v) => f.debug_tuple("Success").field(v).finish(),
            UseCaseResult::Failure(e) => f.debug_tuple("Failure").field(e).finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_result() {
        let result: UseCaseResult<String> = UseCaseResult::success("test".to_string());
        assert!(result.is_success());
        assert_eq!(result.unwrap(), "test");
    }

    #[test]
    fn test_failure_result() {
        let result: UseCaseResult<String> =
            UseCaseResult::failure(UseCaseError::validation("CODE", "message"));
        assert!(result.is_failure());
        assert_eq!(result.unwrap_err().code(), "CODE");
    }

    #[test]
    fn test_from_std_result() {
        let ok: UseCaseResult<i32> = Ok::<i32, UseCaseError>(42).into();
        assert_eq!(ok.map(|v| v * 2).unwrap(), 84);

        let err: UseCaseResult<i32> = Err(UseCaseError::technical("boom")).into();
        assert_eq!(err.into_result().unwrap_err().code(), "TECHNICAL_ERROR");
    }
}
