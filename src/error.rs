//! Error types for term evaluation.
//!
//! All variants are structural: they signal an inconsistent mesh, a missing
//! collaborator or mismatched sizes, and abort the whole evaluation pass.
//! Numerical edge cases inside physics functions never surface here.

use thiserror::Error;

/// Errors raised by the term engines and their collaborators.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SdError {
    /// Missing required collaborator or invalid option.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A face point has no coincident partner on the other side of the face.
    #[error(
        "Connectivity error: face {face} of element {element} has no coincident point for face point {point} at {coord:?}"
    )]
    Connectivity {
        element: usize,
        face: usize,
        point: usize,
        coord: Vec<f64>,
    },

    /// Sizes disagree between coupled components.
    #[error("Dimension mismatch for {what}: expected {expected}, got {actual}")]
    DimensionMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },
}

impl SdError {
    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Create a dimension mismatch error.
    pub fn dimension_mismatch(what: &'static str, expected: usize, actual: usize) -> Self {
        Self::DimensionMismatch {
            what,
            expected,
            actual,
        }
    }

    /// Fail with a dimension mismatch unless `actual == expected`.
    #[inline]
    pub fn check_dimension(what: &'static str, expected: usize, actual: usize) -> Result<()> {
        if expected == actual {
            Ok(())
        } else {
            Err(Self::dimension_mismatch(what, expected, actual))
        }
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, SdError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_dimension() {
        assert!(SdError::check_dimension("equations", 3, 3).is_ok());

        let err = SdError::check_dimension("equations", 3, 4).unwrap_err();
        assert_eq!(err, SdError::dimension_mismatch("equations", 3, 4));
    }

    #[test]
    fn test_error_messages() {
        let err = SdError::configuration("no terms registered");
        assert_eq!(err.to_string(), "Configuration error: no terms registered");

        let err = SdError::Connectivity {
            element: 2,
            face: 1,
            point: 0,
            coord: vec![1.0, 0.5],
        };
        let msg = err.to_string();
        assert!(msg.contains("face 1 of element 2"));
        assert!(msg.contains("[1.0, 0.5]"));
    }
}
