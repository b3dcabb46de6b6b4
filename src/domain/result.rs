//! Result type alias for popstats

use super::errors::ExportError;

/// Result type alias for popstats operations
///
/// # Examples
///
/// ```
/// use popstats::domain::result::Result;
/// use popstats::domain::errors::ExportError;
///
/// fn failing_function() -> Result<()> {
///     Err(ExportError::Validation("Invalid input".to_string()))
/// }
/// assert!(failing_function().is_err());
/// ```
pub type Result<T> = std::result::Result<T, ExportError>;
