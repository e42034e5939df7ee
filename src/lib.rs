//! Rulelist: class association rule mining and rule-list classification.
//!
//! Rulelist mines rules of the form `itemset ⇒ class` from labeled
//! transactional data and compresses them into an ordered decision list
//! with the database-coverage heuristic of CBA (Classification Based on
//! Associations).
//!
//! # Quick Start
//!
//! ```
//! use rulelist::prelude::*;
//!
//! // Items 1/2 and 3/4 encode two attributes; 10 and 11 are classes
//! let dataset = Dataset::from_rows(&[
//!     vec![1, 3, 10],
//!     vec![1, 4, 10],
//!     vec![2, 3, 11],
//!     vec![2, 4, 11],
//! ]).expect("rows carry a trailing class code");
//!
//! // Mine with min_support 0.25 and min_confidence 0.5, then select rules
//! let classifier = train(&dataset, 0.25, 0.5).expect("valid thresholds");
//!
//! // Make predictions
//! assert_eq!(classifier.predict(&Instance::new(vec![1, 4], 0)), 10);
//! assert_eq!(classifier.score(&dataset), 1.0);
//!
//! println!("{classifier}");
//! ```
//!
//! # Modules
//!
//! - [`data`]: Instances and datasets of item and class codes
//! - [`rules`]: Class association rules and their precedence order
//! - [`mining`]: Rule mining (Apriori for class association rules)
//! - [`classification`]: Rule selection and the rule-list classifier
//! - [`metrics`]: Evaluation metrics
//! - [`model_selection`]: Holdout and k-fold evaluation
//! - [`error`]: Error type shared by every module
//!
//! # Logging
//!
//! The crate emits [`tracing`] events (`debug` per mining level and per
//! selection stage) and never installs a subscriber.

pub mod classification;
pub mod data;
pub mod error;
pub mod metrics;
pub mod mining;
pub mod model_selection;
pub mod prelude;
pub mod rules;
pub mod traits;

pub use error::{Result, RuleListError};
pub use traits::{Classifier, Estimator};
