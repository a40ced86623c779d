//! Result type alias for Lossport

use super::errors::LossportError;

/// Result type alias for Lossport operations
///
/// # Examples
///
/// ```
/// use lossport::domain::result::Result;
/// use lossport::domain::errors::LossportError;
///
/// fn example_function() -> Result<String> {
///     Ok("success".to_string())
/// }
///
/// fn failing_function() -> Result<()> {
///     Err(LossportError::Export("no geometry".to_string()))
/// }
/// ```
pub type Result<T> = std::result::Result<T, LossportError>;
