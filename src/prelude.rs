//! Convenience re-exports for common usage.
//!
//! # Usage
//!
//! ```
//! use rulelist::prelude::*;
//! ```

pub use crate::classification::{build_classifier, train, Cba, CbaClassifier, RuleListClassifier};
pub use crate::data::{ClassLabel, Dataset, Instance, Item};
pub use crate::error::{Result, RuleListError};
pub use crate::metrics::{accuracy, ConfusionMatrix};
pub use crate::mining::{ClassApriori, RuleSource, SupportMode};
pub use crate::rules::{PessimisticError, Rule, RuleStats};
pub use crate::traits::{Classifier, Estimator};
