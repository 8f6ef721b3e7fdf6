use thiserror::Error;

/// Crate-wide result alias for fallible core operations.
pub type Result<T> = std::result::Result<T, AdasError>;

/// Errors produced by the decision-and-control core.
///
/// The variants encode where recovery happens, not just where the error was
/// raised: a `Validation` failure drops the offending item and the frame
/// continues, `PerceptionUnavailable` is absorbed by substituting empty
/// inputs, `Planning` and `Control` are fatal for the frame (no command is
/// emitted), and `Configuration` is fatal before any frame is processed.
/// Safety clamps are deliberately not errors; they surface as
/// [`SafetyEvent`](crate::control::safety::SafetyEvent) values instead.
///
/// # Examples
///
/// ```rust
/// use adas::core::error::AdasError;
///
/// let err = AdasError::Validation("confidence must be in [0, 1], got 1.3".to_string());
/// assert_eq!(
///     err.to_string(),
///     "invalid input: confidence must be in [0, 1], got 1.3"
/// );
/// ```
#[derive(Debug, Error)]
pub enum AdasError {
    /// A single malformed input value; the item is dropped, the frame goes on.
    #[error("invalid input: {0}")]
    Validation(String),
    /// The perception boundary produced nothing this frame.
    #[error("perception unavailable: {0}")]
    PerceptionUnavailable(String),
    /// An internal contradiction in planning inputs; fatal for this frame.
    #[error("planning failed: {0}")]
    Planning(String),
    /// Command synthesis contradicted its own output contract; fatal for this frame.
    #[error("control synthesis failed: {0}")]
    Control(String),
    /// An out-of-range or malformed option discovered at startup.
    #[error("invalid configuration: {0}")]
    Configuration(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let err = AdasError::Planning("negative distance -1.0".to_string());
        assert_eq!(err.to_string(), "planning failed: negative distance -1.0");

        let err = AdasError::Configuration("fps must be >= 1, got 0".to_string());
        assert_eq!(
            err.to_string(),
            "invalid configuration: fps must be >= 1, got 0"
        );
    }

    #[test]
    fn test_result_alias() {
        fn fails() -> Result<f64> {
            Err(AdasError::Control("non-finite plan".to_string()))
        }
        assert!(fails().is_err());
    }
}
