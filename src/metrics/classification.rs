//! Classification metrics for evaluating classifier performance.
//!
//! Provides accuracy and a confusion matrix over arbitrary class codes, with
//! per-class and averaged precision, recall and F1-score.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::data::{ClassLabel, Dataset};
use crate::traits::Classifier;

/// Averaging strategy for multi-class metrics.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Average {
    /// Calculate metrics for each label, return unweighted mean.
    Macro,
    /// Calculate metrics globally by counting total TP, FP, FN.
    Micro,
    /// Weighted mean by support (number of true instances per label).
    Weighted,
}

/// Compute classification accuracy.
///
/// accuracy = `correct_predictions` / `total_predictions`
///
/// # Panics
///
/// Panics if the slices have different lengths or are empty.
///
/// # Examples
///
/// ```
/// use rulelist::metrics::accuracy;
///
/// let y_true = vec![10, 11, 12, 10, 11, 12];
/// let y_pred = vec![10, 12, 11, 10, 10, 11];
/// let acc = accuracy(&y_pred, &y_true);
/// assert!((acc - 0.333333).abs() < 0.001);
/// ```
#[must_use]
pub fn accuracy(y_pred: &[ClassLabel], y_true: &[ClassLabel]) -> f64 {
    assert_eq!(y_pred.len(), y_true.len(), "Slices must have same length");
    assert!(!y_true.is_empty(), "Slices cannot be empty");

    let correct = y_pred
        .iter()
        .zip(y_true.iter())
        .filter(|(p, t)| p == t)
        .count();

    correct as f64 / y_true.len() as f64
}

/// Counts of (actual, predicted) class pairs.
///
/// # Examples
///
/// ```
/// use rulelist::metrics::{Average, ConfusionMatrix};
///
/// let mut cm = ConfusionMatrix::new();
/// cm.add(10, 10);
/// cm.add(10, 11);
/// cm.add(11, 11);
///
/// assert_eq!(cm.total(), 3);
/// assert_eq!(cm.correct(), 2);
/// assert_eq!(cm.recall(10), 0.5);
/// assert_eq!(cm.precision(11), 0.5);
/// assert!((cm.f1_score(Average::Micro) - 2.0 / 3.0).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    classes: BTreeSet<ClassLabel>,
    /// Actual class to predicted class to count.
    counts: BTreeMap<ClassLabel, BTreeMap<ClassLabel, usize>>,
}

impl ConfusionMatrix {
    /// Creates an empty matrix.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty matrix that already knows `classes`, so classes that
    /// never occur still take part in macro averages.
    #[must_use]
    pub fn with_classes(classes: &[ClassLabel]) -> Self {
        Self {
            classes: classes.iter().copied().collect(),
            counts: BTreeMap::new(),
        }
    }

    /// Tallies the predictions of `classifier` on every instance of `dataset`.
    #[must_use]
    pub fn evaluate<C: Classifier + ?Sized>(classifier: &C, dataset: &Dataset) -> Self {
        let mut matrix = Self::with_classes(dataset.classes());
        for instance in dataset.instances() {
            matrix.add(instance.class(), classifier.predict(instance));
        }
        matrix
    }

    /// Records one prediction.
    pub fn add(&mut self, actual: ClassLabel, predicted: ClassLabel) {
        self.classes.insert(actual);
        self.classes.insert(predicted);
        *self
            .counts
            .entry(actual)
            .or_default()
            .entry(predicted)
            .or_insert(0) += 1;
    }

    /// Known classes, ascending.
    pub fn classes(&self) -> impl Iterator<Item = ClassLabel> + '_ {
        self.classes.iter().copied()
    }

    /// Number of instances of class `actual` predicted as `predicted`.
    #[must_use]
    pub fn count(&self, actual: ClassLabel, predicted: ClassLabel) -> usize {
        self.counts
            .get(&actual)
            .and_then(|row| row.get(&predicted))
            .copied()
            .unwrap_or(0)
    }

    /// Number of recorded predictions.
    #[must_use]
    pub fn total(&self) -> usize {
        self.counts.values().flat_map(BTreeMap::values).sum()
    }

    /// Number of correct predictions.
    #[must_use]
    pub fn correct(&self) -> usize {
        self.classes.iter().map(|&c| self.count(c, c)).sum()
    }

    /// Fraction of correct predictions; 0 when nothing was recorded.
    #[must_use]
    pub fn accuracy(&self) -> f64 {
        ratio(self.correct(), self.total())
    }

    /// Precision of one class: TP / (TP + FP).
    #[must_use]
    pub fn precision(&self, class: ClassLabel) -> f64 {
        let (tp, fp, _) = self.tp_fp_fn(class);
        ratio(tp, tp + fp)
    }

    /// Recall of one class: TP / (TP + FN).
    #[must_use]
    pub fn recall(&self, class: ClassLabel) -> f64 {
        let (tp, _, fn_count) = self.tp_fp_fn(class);
        ratio(tp, tp + fn_count)
    }

    /// F1-score of one class.
    #[must_use]
    pub fn f1(&self, class: ClassLabel) -> f64 {
        let (tp, fp, fn_count) = self.tp_fp_fn(class);
        class_f1(tp, fp, fn_count)
    }

    /// Averaged precision.
    #[must_use]
    pub fn precision_score(&self, average: Average) -> f64 {
        self.averaged(average, |m, c| m.precision(c))
    }

    /// Averaged recall.
    #[must_use]
    pub fn recall_score(&self, average: Average) -> f64 {
        self.averaged(average, |m, c| m.recall(c))
    }

    /// Averaged F1-score.
    #[must_use]
    pub fn f1_score(&self, average: Average) -> f64 {
        self.averaged(average, |m, c| m.f1(c))
    }

    /// Number of instances whose actual class is `class`.
    fn support(&self, class: ClassLabel) -> usize {
        self.classes.iter().map(|&p| self.count(class, p)).sum()
    }

    fn tp_fp_fn(&self, class: ClassLabel) -> (usize, usize, usize) {
        let tp = self.count(class, class);
        let predicted: usize = self.classes.iter().map(|&a| self.count(a, class)).sum();
        (
            tp,
            predicted.saturating_sub(tp),
            self.support(class).saturating_sub(tp),
        )
    }

    fn averaged<F>(&self, average: Average, metric: F) -> f64
    where
        F: Fn(&Self, ClassLabel) -> f64,
    {
        if self.classes.is_empty() {
            return 0.0;
        }
        match average {
            // Every misclassification is one FP and one FN, so micro
            // precision, recall and F1 all equal accuracy.
            Average::Micro => self.accuracy(),
            Average::Macro => {
                let sum: f64 = self.classes.iter().map(|&c| metric(self, c)).sum();
                sum / self.classes.len() as f64
            }
            Average::Weighted => {
                let total = self.total();
                if total == 0 {
                    return 0.0;
                }
                self.classes
                    .iter()
                    .map(|&c| metric(self, c) * self.support(c) as f64 / total as f64)
                    .sum()
            }
        }
    }
}

impl fmt::Display for ConfusionMatrix {
    /// Rows are actual classes, columns predicted classes.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:>8}", "")?;
        for predicted in &self.classes {
            write!(f, " {predicted:>8}")?;
        }
        writeln!(f)?;
        for &actual in &self.classes {
            write!(f, "{actual:>8}")?;
            for &predicted in &self.classes {
                write!(f, " {:>8}", self.count(actual, predicted))?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

fn class_f1(tp: usize, fp: usize, fn_count: usize) -> f64 {
    let denominator = 2 * tp + fp + fn_count;
    ratio(2 * tp, denominator)
}
