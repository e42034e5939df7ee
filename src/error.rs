//! Error types for rule mining and classifier construction.
//!
//! Provides rich error context for library consumers.

use std::fmt;

use crate::data::ClassLabel;

/// Main error type for rulelist operations.
///
/// # Examples
///
/// ```
/// use rulelist::error::RuleListError;
///
/// let err = RuleListError::InvalidParameter {
///     param: "min_support".to_string(),
///     value: "1.5".to_string(),
///     constraint: "in (0, 1]".to_string(),
/// };
/// assert!(err.to_string().contains("min_support"));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum RuleListError {
    /// A threshold or other parameter is out of range.
    InvalidParameter {
        /// Parameter name
        param: String,
        /// Provided value
        value: String,
        /// Constraint description
        constraint: String,
    },

    /// Input holds nothing the operation can work with.
    EmptyInput(String),

    /// An instance carries a class code outside the declared class list.
    UnknownClass {
        /// Offending class code
        class: ClassLabel,
    },

    /// Prediction was requested before training.
    NotFitted,
}

impl fmt::Display for RuleListError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleListError::InvalidParameter {
                param,
                value,
                constraint,
            } => {
                write!(
                    f,
                    "Invalid parameter: {param} = {value}, expected {constraint}"
                )
            }
            RuleListError::EmptyInput(context) => write!(f, "empty input: {context}"),
            RuleListError::UnknownClass { class } => {
                write!(f, "class {class} is not in the declared class list")
            }
            RuleListError::NotFitted => write!(f, "Model not fitted. Call fit() first."),
        }
    }
}

impl std::error::Error for RuleListError {}

impl RuleListError {
    /// Create an out-of-range error for a threshold that must lie in (0, 1].
    #[must_use]
    pub fn unit_interval(param: &str, value: f64) -> Self {
        Self::InvalidParameter {
            param: param.to_string(),
            value: value.to_string(),
            constraint: "a value in (0, 1]".to_string(),
        }
    }

    /// Create an empty input error
    #[must_use]
    pub fn empty_input(context: &str) -> Self {
        Self::EmptyInput(context.to_string())
    }
}

/// Convenience type alias for Results.
pub type Result<T> = std::result::Result<T, RuleListError>;

/// Checks that `value` lies in (0, 1]. NaN is rejected.
pub(crate) fn check_unit_interval(param: &str, value: f64) -> Result<()> {
    if value > 0.0 && value <= 1.0 {
        Ok(())
    } else {
        Err(RuleListError::unit_interval(param, value))
    }
}
