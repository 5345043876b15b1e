//! Result type alias for Atheno data-layer operations.

use super::atheno_error::AthenoError;

/// Type alias for Results using [`AthenoError`].
///
/// Use this type for functions that can fail with any data-layer error.
///
/// # Example
///
/// ```ignore
/// use atheno_data::error::AthenoResult;
///
/// fn load_courses() -> AthenoResult<Vec<Course>> {
///     // Implementation that may return various error types
///     Ok(courses)
/// }
/// ```
pub type AthenoResult<T> = Result<T, AthenoError>;
