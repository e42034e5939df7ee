//! Core traits for rule-based classifiers.
//!
//! These traits define the API contracts shared by trainable models and
//! fitted decision lists.

use crate::data::{ClassLabel, Dataset, Instance};
use crate::error::Result;
use crate::metrics::accuracy;

/// Trainable model following fit/predict/score conventions.
///
/// # Examples
///
/// ```
/// use rulelist::classification::Cba;
/// use rulelist::prelude::*;
///
/// let train = Dataset::from_rows(&[
///     vec![1, 3, 10],
///     vec![1, 4, 10],
///     vec![2, 3, 11],
///     vec![2, 4, 11],
/// ]).expect("valid rows");
///
/// let mut model = Cba::new().with_min_support(0.25);
/// Estimator::fit(&mut model, &train).expect("valid thresholds");
/// let score = Estimator::score(&model, &train).expect("fitted");
/// assert!(score > 0.99);
/// ```
pub trait Estimator {
    /// Fits the model to a training set.
    ///
    /// # Errors
    ///
    /// Returns an error if fitting fails (invalid parameters, no class, etc.).
    fn fit(&mut self, dataset: &Dataset) -> Result<()>;

    /// Predicts the class of one instance.
    ///
    /// # Errors
    ///
    /// Returns an error if the model is not fitted.
    fn predict(&self, instance: &Instance) -> Result<ClassLabel>;

    /// Accuracy on a labeled dataset.
    ///
    /// # Errors
    ///
    /// Returns an error if the model is not fitted.
    fn score(&self, dataset: &Dataset) -> Result<f64>;
}

/// Fitted model that assigns a class to every instance.
pub trait Classifier {
    /// Predicts the class of one instance. Never fails.
    fn predict(&self, instance: &Instance) -> ClassLabel;

    /// Predicts every instance of `dataset`, in order.
    fn predict_batch(&self, dataset: &Dataset) -> Vec<ClassLabel> {
        dataset
            .instances()
            .iter()
            .map(|instance| self.predict(instance))
            .collect()
    }

    /// Fraction of `dataset` predicted correctly; 0 for an empty dataset.
    fn score(&self, dataset: &Dataset) -> f64 {
        if dataset.is_empty() {
            return 0.0;
        }
        let y_true: Vec<ClassLabel> = dataset.instances().iter().map(Instance::class).collect();
        accuracy(&self.predict_batch(dataset), &y_true)
    }
}
