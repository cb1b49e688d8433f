//! Error types for graph recommendation operations.
//!
//! Every failure in this crate is a caller error detected eagerly, either
//! when a model is constructed or when a call enters. There are no transient
//! failures and nothing is retried.

use thiserror::Error;

/// Main error type for the recommender.
///
/// # Examples
///
/// ```
/// use lightgcn::error::GcnError;
///
/// let err = GcnError::IndexOutOfRange {
///     kind: "user",
///     index: 7,
///     len: 3,
/// };
/// assert!(err.to_string().contains("user index 7"));
/// ```
#[derive(Debug, Error)]
pub enum GcnError {
    /// Matrix or batch dimensions don't match what the operation requires.
    #[error("Shape mismatch in {context}: expected {expected}, got {actual}")]
    ShapeMismatch {
        /// Operation or parameter being checked
        context: String,
        /// Expected shape description
        expected: String,
        /// Actual shape found
        actual: String,
    },

    /// Configuration value outside its allowed range.
    #[error("Invalid configuration: {param} = {value}, expected {constraint}")]
    InvalidConfig {
        /// Parameter name
        param: String,
        /// Provided value
        value: String,
        /// Constraint description
        constraint: String,
    },

    /// Index beyond the number of users, items or groups.
    #[error("{kind} index {index} out of range (len={len})")]
    IndexOutOfRange {
        /// "user", "item" or "group"
        kind: &'static str,
        /// Offending index
        index: usize,
        /// Number of nodes of that kind
        len: usize,
    },

    /// Config (de)serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error while reading or writing a config file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl GcnError {
    /// Create a shape mismatch error for a `rows x cols` check.
    #[must_use]
    pub fn shape(context: &str, expected: (usize, usize), actual: (usize, usize)) -> Self {
        Self::ShapeMismatch {
            context: context.to_string(),
            expected: format!("{}x{}", expected.0, expected.1),
            actual: format!("{}x{}", actual.0, actual.1),
        }
    }

    /// Create a length mismatch error.
    #[must_use]
    pub fn length(context: &str, expected: usize, actual: usize) -> Self {
        Self::ShapeMismatch {
            context: context.to_string(),
            expected: format!("len={expected}"),
            actual: format!("len={actual}"),
        }
    }

    /// Create an invalid configuration error.
    #[must_use]
    pub fn config(param: &str, value: impl ToString, constraint: &str) -> Self {
        Self::InvalidConfig {
            param: param.to_string(),
            value: value.to_string(),
            constraint: constraint.to_string(),
        }
    }
}

/// Convenience type alias for Results.
pub type Result<T> = std::result::Result<T, GcnError>;
