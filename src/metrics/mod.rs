//! Evaluation metrics for rule-based classifiers.
//!
//! Includes accuracy and a confusion matrix with precision, recall and
//! F1-score over arbitrary class codes.

pub mod classification;

pub use classification::{accuracy, Average, ConfusionMatrix};
