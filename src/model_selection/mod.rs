//! Model selection utilities for holdout and cross-validated evaluation.
//!
//! This module provides tools for:
//! - Train/test splitting of a [`Dataset`]
//! - K-Fold cross-validation
//! - Train-and-evaluate runs that report accuracy and rule counts

use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::classification::Cba;
use crate::data::Dataset;
use crate::error::{Result, RuleListError};
use crate::metrics::ConfusionMatrix;
use crate::traits::Classifier;

/// Outcome of training on one part of a dataset and testing on the other.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoldResult {
    /// Accuracy on the instances the model was trained on
    pub train_accuracy: f64,
    /// Accuracy on the held-out instances
    pub test_accuracy: f64,
    /// Rules in the fitted list, default rule included
    pub n_rules: usize,
    /// Predictions on the held-out instances
    pub matrix: ConfusionMatrix,
}

/// Results from holdout or cross-validation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    /// One entry per train/test split
    pub folds: Vec<FoldResult>,
}

impl EvaluationResult {
    /// Mean test accuracy across folds
    #[must_use]
    pub fn mean_accuracy(&self) -> f64 {
        self.mean_of(|f| f.test_accuracy)
    }

    /// Standard deviation of the test accuracy
    #[must_use]
    pub fn std_accuracy(&self) -> f64 {
        if self.folds.is_empty() {
            return 0.0;
        }
        let mean = self.mean_accuracy();
        let variance = self
            .folds
            .iter()
            .map(|f| (f.test_accuracy - mean).powi(2))
            .sum::<f64>()
            / self.folds.len() as f64;
        variance.sqrt()
    }

    /// Mean training accuracy across folds
    #[must_use]
    pub fn mean_train_accuracy(&self) -> f64 {
        self.mean_of(|f| f.train_accuracy)
    }

    /// Average size of the fitted rule lists
    #[must_use]
    pub fn avg_rule_count(&self) -> f64 {
        self.mean_of(|f| f.n_rules as f64)
    }

    fn mean_of<F: Fn(&FoldResult) -> f64>(&self, value: F) -> f64 {
        if self.folds.is_empty() {
            return 0.0;
        }
        self.folds.iter().map(value).sum::<f64>() / self.folds.len() as f64
    }
}

/// K-Fold cross-validator.
///
/// Splits data into K consecutive folds. Each fold is used once as test set
/// while the remaining K-1 folds form the training set. Without a random
/// state the instances keep their order.
///
/// # Example
///
/// ```
/// use rulelist::model_selection::KFold;
///
/// let kfold = KFold::new(3);
/// let splits = kfold.split(10);
///
/// assert_eq!(splits.len(), 3);
/// assert_eq!(splits[0].1, vec![0, 1, 2, 3]);
/// assert_eq!(splits[2].1, vec![7, 8, 9]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KFold {
    n_splits: usize,
    random_state: Option<u64>,
}

impl KFold {
    /// Create a new K-Fold cross-validator.
    ///
    /// # Arguments
    ///
    /// * `n_splits` - Number of folds. Must be at least 2.
    #[must_use]
    pub fn new(n_splits: usize) -> Self {
        Self {
            n_splits,
            random_state: None,
        }
    }

    /// Shuffle the instances with a fixed seed before splitting.
    #[must_use]
    pub fn with_random_state(mut self, random_state: u64) -> Self {
        self.random_state = Some(random_state);
        self
    }

    /// Number of folds.
    #[must_use]
    pub fn n_splits(&self) -> usize {
        self.n_splits
    }

    /// Generate train/test indices for each fold.
    ///
    /// The first `n_samples % n_splits` folds hold one extra instance.
    #[must_use]
    pub fn split(&self, n_samples: usize) -> Vec<(Vec<usize>, Vec<usize>)> {
        let indices = ordered_indices(n_samples, self.random_state);
        if self.n_splits == 0 {
            return Vec::new();
        }

        let fold_size = n_samples / self.n_splits;
        let remainder = n_samples % self.n_splits;

        let mut result = Vec::with_capacity(self.n_splits);
        let mut start = 0;
        for i in 0..self.n_splits {
            let current = if i < remainder { fold_size + 1 } else { fold_size };
            let end = start + current;

            let test = indices[start..end].to_vec();
            let mut train = Vec::with_capacity(n_samples - current);
            train.extend_from_slice(&indices[..start]);
            train.extend_from_slice(&indices[end..]);

            result.push((train, test));
            start = end;
        }
        result
    }

    fn validate(&self, n_samples: usize) -> Result<()> {
        if self.n_splits < 2 {
            return Err(RuleListError::InvalidParameter {
                param: "n_splits".to_string(),
                value: self.n_splits.to_string(),
                constraint: "at least 2".to_string(),
            });
        }
        if n_samples < self.n_splits {
            return Err(RuleListError::InvalidParameter {
                param: "n_splits".to_string(),
                value: self.n_splits.to_string(),
                constraint: format!("at most the number of instances ({n_samples})"),
            });
        }
        Ok(())
    }
}

/// Split a dataset into a training part and a test part.
///
/// The last `round(n * test_size)` instances (after an optional seeded
/// shuffle) form the test part. Both parts keep the class order of
/// `dataset`.
///
/// # Errors
///
/// Returns [`RuleListError::InvalidParameter`] if `test_size` is not in
/// (0, 1) or either part would be empty.
///
/// # Example
///
/// ```
/// use rulelist::data::Dataset;
/// use rulelist::model_selection::train_test_split;
///
/// let rows: Vec<Vec<u32>> = (0..10).map(|i| vec![i, 100 + i % 2]).collect();
/// let dataset = Dataset::from_rows(&rows).expect("rows carry a class");
///
/// let (train, test) = train_test_split(&dataset, 0.2, None).expect("valid split");
/// assert_eq!(train.len(), 8);
/// assert_eq!(test.len(), 2);
/// assert_eq!(test.classes(), dataset.classes());
/// ```
pub fn train_test_split(
    dataset: &Dataset,
    test_size: f64,
    random_state: Option<u64>,
) -> Result<(Dataset, Dataset)> {
    let n_train = validate_split(dataset.len(), test_size)?;
    let indices = ordered_indices(dataset.len(), random_state);
    Ok((
        extract(dataset, &indices[..n_train])?,
        extract(dataset, &indices[n_train..])?,
    ))
}

/// Train `model` on one part of `dataset` and evaluate it on the rest.
///
/// # Errors
///
/// Returns an error if the split is invalid or fitting fails.
pub fn holdout(
    model: &Cba,
    dataset: &Dataset,
    test_size: f64,
    random_state: Option<u64>,
) -> Result<EvaluationResult> {
    let (train, test) = train_test_split(dataset, test_size, random_state)?;
    let fold = run_fold(model, &train, &test)?;
    Ok(EvaluationResult { folds: vec![fold] })
}

/// Run cross-validation on a model.
///
/// Trains a fresh copy of `model` on each training part and scores it on
/// the matching test fold.
///
/// # Errors
///
/// Returns [`RuleListError::InvalidParameter`] for fewer than two folds or
/// more folds than instances, or the first fitting error.
///
/// # Example
///
/// ```
/// use rulelist::prelude::*;
/// use rulelist::model_selection::{cross_validate, KFold};
///
/// let rows: Vec<Vec<u32>> = (0..12).map(|i| vec![1 + i % 2, 10 + i % 2]).collect();
/// let dataset = Dataset::from_rows(&rows).expect("rows carry a class");
///
/// let model = Cba::new().with_min_support(0.1);
/// let results = cross_validate(&model, &dataset, &KFold::new(3)).expect("valid folds");
///
/// assert_eq!(results.folds.len(), 3);
/// assert_eq!(results.mean_accuracy(), 1.0);
/// ```
pub fn cross_validate(model: &Cba, dataset: &Dataset, cv: &KFold) -> Result<EvaluationResult> {
    cv.validate(dataset.len())?;

    let mut folds = Vec::with_capacity(cv.n_splits());
    for (i, (train_idx, test_idx)) in cv.split(dataset.len()).into_iter().enumerate() {
        let train = extract(dataset, &train_idx)?;
        let test = extract(dataset, &test_idx)?;
        let fold = run_fold(model, &train, &test)?;
        debug!(
            fold = i,
            test_accuracy = fold.test_accuracy,
            n_rules = fold.n_rules,
            "fold done"
        );
        folds.push(fold);
    }
    Ok(EvaluationResult { folds })
}

fn run_fold(model: &Cba, train: &Dataset, test: &Dataset) -> Result<FoldResult> {
    let mut fold_model = model.clone();
    fold_model.fit(train)?;
    let classifier = fold_model.into_classifier()?;

    let matrix = ConfusionMatrix::evaluate(&classifier, test);
    Ok(FoldResult {
        train_accuracy: classifier.score(train),
        test_accuracy: matrix.accuracy(),
        n_rules: classifier.n_rules(),
        matrix,
    })
}

/// Number of training instances for a valid split.
fn validate_split(n_samples: usize, test_size: f64) -> Result<usize> {
    if !(test_size > 0.0 && test_size < 1.0) {
        return Err(RuleListError::InvalidParameter {
            param: "test_size".to_string(),
            value: test_size.to_string(),
            constraint: "a value in (0, 1)".to_string(),
        });
    }

    let n_test = (n_samples as f64 * test_size).round() as usize;
    let n_train = n_samples.saturating_sub(n_test);
    if n_test == 0 || n_train == 0 {
        return Err(RuleListError::InvalidParameter {
            param: "test_size".to_string(),
            value: test_size.to_string(),
            constraint: format!(
                "a non-empty train and test part (n_train={n_train}, n_test={n_test})"
            ),
        });
    }
    Ok(n_train)
}

/// Instance positions, shuffled when a seed is given.
fn ordered_indices(n_samples: usize, random_state: Option<u64>) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..n_samples).collect();
    if let Some(seed) = random_state {
        let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
        indices.shuffle(&mut rng);
    }
    indices
}

fn extract(dataset: &Dataset, indices: &[usize]) -> Result<Dataset> {
    let instances = indices
        .iter()
        .map(|&i| dataset.instances()[i].clone())
        .collect();
    Dataset::with_classes(instances, dataset.classes().to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Three attributes; the class is decided by the first one alone.
    fn first_attribute_decides() -> Dataset {
        let mut rows = Vec::new();
        for _ in 0..2 {
            for a in 1..=3 {
                for b in 4..=5 {
                    for c in 6..=7 {
                        rows.push(vec![a, b, c, 9 + a]);
                    }
                }
            }
        }
        Dataset::from_rows(&rows).expect("valid rows")
    }

    fn numbered(n: u32) -> Dataset {
        let rows: Vec<Vec<u32>> = (0..n).map(|i| vec![i, 100 + i % 2]).collect();
        Dataset::from_rows(&rows).expect("valid rows")
    }

    #[test]
    fn test_kfold_sizes_with_remainder() {
        let splits = KFold::new(3).split(10);
        let sizes: Vec<usize> = splits.iter().map(|(_, test)| test.len()).collect();
        assert_eq!(sizes, vec![4, 3, 3]);
        for (train, test) in &splits {
            assert_eq!(train.len() + test.len(), 10);
        }
    }

    #[test]
    fn test_kfold_folds_partition_instances() {
        let splits = KFold::new(4).with_random_state(7).split(13);
        let mut seen: Vec<usize> = splits.iter().flat_map(|(_, test)| test.clone()).collect();
        seen.sort_unstable();
        assert_eq!(seen, (0..13).collect::<Vec<_>>());

        for (train, test) in &splits {
            assert!(train.iter().all(|i| !test.contains(i)));
        }
    }

    #[test]
    fn test_kfold_random_state_is_reproducible() {
        let a = KFold::new(3).with_random_state(42).split(20);
        let b = KFold::new(3).with_random_state(42).split(20);
        assert_eq!(a, b);
    }

    #[test]
    fn test_kfold_rejects_bad_fold_counts() {
        let dataset = numbered(4);
        let model = Cba::new();

        let err = cross_validate(&model, &dataset, &KFold::new(1)).expect_err("one fold");
        assert!(err.to_string().contains("n_splits"));

        let err = cross_validate(&model, &dataset, &KFold::new(5)).expect_err("too many folds");
        assert!(err.to_string().contains("number of instances"));
    }

    #[test]
    fn test_train_test_split_keeps_order_without_seed() {
        let dataset = numbered(10);
        let (train, test) = train_test_split(&dataset, 0.3, None).expect("valid split");

        assert_eq!(train.len(), 7);
        assert_eq!(test.len(), 3);
        assert_eq!(test.instances(), &dataset.instances()[7..]);
    }

    #[test]
    fn test_train_test_split_keeps_declared_classes() {
        let dataset = numbered(10);
        // The single test instance is odd, but both classes stay known.
        let (_, test) = train_test_split(&dataset, 0.1, None).expect("valid split");
        assert_eq!(test.len(), 1);
        assert_eq!(test.classes(), &[100, 101]);
    }

    #[test]
    fn test_train_test_split_reproducible() {
        let dataset = numbered(20);
        let first = train_test_split(&dataset, 0.25, Some(3)).expect("valid split");
        let second = train_test_split(&dataset, 0.25, Some(3)).expect("valid split");
        assert_eq!(first, second);
        assert_eq!(first.0.len() + first.1.len(), 20);
    }

    #[test]
    fn test_train_test_split_invalid_size() {
        let dataset = numbered(10);
        assert!(train_test_split(&dataset, 0.0, None).is_err());
        assert!(train_test_split(&dataset, 1.0, None).is_err());
        assert!(train_test_split(&dataset, f64::NAN, None).is_err());
        // rounds to an empty test part
        assert!(train_test_split(&dataset, 0.01, None).is_err());
    }

    #[test]
    fn test_holdout_learns_single_attribute_concept() {
        let dataset = first_attribute_decides();
        let model = Cba::new().with_min_support(0.05).with_min_confidence(0.6);

        let results = holdout(&model, &dataset, 0.25, None).expect("valid split");
        assert_eq!(results.folds.len(), 1);
        let fold = &results.folds[0];
        assert_eq!(fold.matrix.total(), 6);
        assert_eq!(fold.test_accuracy, 1.0);
        assert_eq!(fold.train_accuracy, 1.0);
        assert_eq!(fold.n_rules, 3);
    }

    #[test]
    fn test_cross_validate_reports_accuracy_and_rule_count() {
        let dataset = first_attribute_decides();
        let model = Cba::new().with_min_support(0.05).with_min_confidence(0.6);

        let results = cross_validate(&model, &dataset, &KFold::new(3)).expect("valid folds");
        assert_eq!(results.folds.len(), 3);
        assert_eq!(results.mean_accuracy(), 1.0);
        assert_eq!(results.std_accuracy(), 0.0);
        assert_eq!(results.mean_train_accuracy(), 1.0);
        assert_eq!(results.avg_rule_count(), 3.0);
    }

    #[test]
    fn test_cross_validate_leaves_model_unfitted() {
        let dataset = first_attribute_decides();
        let model = Cba::new();
        cross_validate(&model, &dataset, &KFold::new(2)).expect("valid folds");
        assert!(model.classifier().is_none());
    }

    #[test]
    fn test_cross_validate_propagates_fit_errors() {
        let dataset = first_attribute_decides();
        let model = Cba::new().with_min_support(2.0);
        let err = cross_validate(&model, &dataset, &KFold::new(2)).expect_err("bad threshold");
        assert!(err.to_string().contains("min_support"));
    }

    #[test]
    fn test_empty_result_means_are_zero() {
        let results = EvaluationResult::default();
        assert_eq!(results.mean_accuracy(), 0.0);
        assert_eq!(results.std_accuracy(), 0.0);
        assert_eq!(results.avg_rule_count(), 0.0);
    }
}
