//! Rule-list classification.
//!
//! This module builds ordered decision lists from class association rules:
//! - [`Cba`]: mines rules with [`ClassApriori`] and selects a rule list by
//!   database coverage
//! - [`RuleListClassifier`]: the resulting first-match decision list
//! - [`build_classifier`]: selection over the output of any
//!   [`RuleSource`](crate::mining::RuleSource)
//!
//! # Example
//!
//! ```
//! use rulelist::classification::Cba;
//! use rulelist::prelude::*;
//!
//! // a1 = 1, a2 = 2, b1 = 3, b2 = 4; classes X = 10, Y = 11
//! let dataset = Dataset::from_rows(&[
//!     vec![1, 3, 10],
//!     vec![1, 4, 10],
//!     vec![2, 3, 11],
//!     vec![2, 4, 11],
//! ]).expect("rows carry a trailing class code");
//!
//! let mut model = Cba::new()
//!     .with_min_support(0.25)
//!     .with_min_confidence(0.5);
//! model.fit(&dataset).expect("thresholds are valid");
//!
//! let predicted = model
//!     .predict(&Instance::new(vec![2, 3], 0))
//!     .expect("model is fitted");
//! assert_eq!(predicted, 11);
//! ```

mod coverage;

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::data::{ClassLabel, Dataset, Instance};
use crate::error::{Result, RuleListError};
use crate::mining::{ClassApriori, RuleSource, SupportMode};
use crate::rules::{PessimisticError, Rule, RuleStats};
use crate::traits::{Classifier, Estimator};

/// Ordered decision list: the first rule whose antecedent is contained in
/// an instance decides its class. The last rule is always the default rule,
/// which has an empty antecedent and matches everything.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleListClassifier<S = ()> {
    rules: Vec<Rule<S>>,
    default_class: ClassLabel,
    training_errors: Option<usize>,
}

/// Rule list produced by [`Cba`] and [`train`].
pub type CbaClassifier = RuleListClassifier<PessimisticError>;

impl<S: RuleStats> RuleListClassifier<S> {
    /// Creates a rule list from rules in classification order, followed by
    /// a default rule predicting `default_class`.
    #[must_use]
    pub fn from_rules(mut rules: Vec<Rule<S>>, default_class: ClassLabel) -> Self {
        rules.push(Rule::default_rule(default_class));
        Self {
            rules,
            default_class,
            training_errors: None,
        }
    }
}

impl<S> RuleListClassifier<S> {
    /// Predicts the class of one instance.
    #[must_use]
    pub fn predict(&self, instance: &Instance) -> ClassLabel {
        self.rules
            .iter()
            .find(|rule| rule.matches(instance))
            .map_or(self.default_class, Rule::class)
    }

    /// All rules in classification order, the default rule last.
    #[must_use]
    pub fn rules(&self) -> &[Rule<S>] {
        &self.rules
    }

    /// Class predicted when no other rule matches.
    #[must_use]
    pub fn default_class(&self) -> ClassLabel {
        self.default_class
    }

    /// Number of rules, the default rule included.
    #[must_use]
    pub fn n_rules(&self) -> usize {
        self.rules.len()
    }

    /// Mean antecedent size over all rules, the default rule included.
    #[must_use]
    pub fn average_antecedent_len(&self) -> f64 {
        if self.rules.is_empty() {
            return 0.0;
        }
        let total: usize = self.rules.iter().map(Rule::len).sum();
        total as f64 / self.rules.len() as f64
    }

    /// Errors on the training set at the selected cutoff, when known.
    #[must_use]
    pub fn training_errors(&self) -> Option<usize> {
        self.training_errors
    }
}

impl<S> Classifier for RuleListClassifier<S> {
    fn predict(&self, instance: &Instance) -> ClassLabel {
        RuleListClassifier::predict(self, instance)
    }
}

impl<S: RuleStats> fmt::Display for RuleListClassifier<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for rule in &self.rules {
            writeln!(f, "{rule}")?;
        }
        Ok(())
    }
}

/// Builds a rule list from an unordered pool of evaluated rules.
///
/// The pool is sorted by precedence and pruned by database coverage; rules
/// that are selected are moved into the classifier.
///
/// # Errors
///
/// Returns [`RuleListError::EmptyInput`] if the dataset knows no class.
pub fn build_classifier<S: RuleStats>(
    dataset: &Dataset,
    pool: Vec<Rule<S>>,
) -> Result<RuleListClassifier<S>> {
    let pool_size = pool.len();
    let selection = coverage::select(dataset, pool)?;
    debug!(
        pool = pool_size,
        selected = selection.rules.len(),
        default_class = selection.default_class,
        "built rule list"
    );
    let mut classifier = RuleListClassifier::from_rules(selection.rules, selection.default_class);
    classifier.training_errors = selection.total_errors;
    Ok(classifier)
}

/// Mines rules with the given thresholds and builds a rule list.
///
/// # Errors
///
/// Returns [`RuleListError::InvalidParameter`] if a threshold is outside
/// (0, 1], or [`RuleListError::EmptyInput`] if the dataset knows no class.
pub fn train(dataset: &Dataset, min_support: f64, min_confidence: f64) -> Result<CbaClassifier> {
    let miner = ClassApriori::new()
        .with_min_support(min_support)
        .with_min_confidence(min_confidence);
    build_classifier(dataset, miner.mine(dataset)?)
}

/// Classification Based on Associations.
///
/// Mines class association rules with [`ClassApriori`], then keeps the
/// prefix of the precedence-sorted rules that minimizes training errors.
///
/// # Parameters
///
/// - `min_support`: minimum rule support, in (0, 1] (default 0.1)
/// - `min_confidence`: minimum rule confidence, in (0, 1] (default 0.5)
/// - `support_mode`: global or per-class support (default global)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cba {
    miner: ClassApriori,
    classifier: Option<CbaClassifier>,
}

impl Cba {
    /// Creates an unfitted model with default parameters.
    #[must_use]
    pub fn new() -> Self {
        Self {
            miner: ClassApriori::new(),
            classifier: None,
        }
    }

    /// Sets the minimum support threshold.
    #[must_use]
    pub fn with_min_support(mut self, min_support: f64) -> Self {
        self.miner = self.miner.with_min_support(min_support);
        self
    }

    /// Sets the minimum confidence threshold.
    #[must_use]
    pub fn with_min_confidence(mut self, min_confidence: f64) -> Self {
        self.miner = self.miner.with_min_confidence(min_confidence);
        self
    }

    /// Sets how the support threshold is applied.
    #[must_use]
    pub fn with_support_mode(mut self, support_mode: SupportMode) -> Self {
        self.miner = self.miner.with_support_mode(support_mode);
        self
    }

    /// The configured rule miner.
    #[must_use]
    pub fn miner(&self) -> &ClassApriori {
        &self.miner
    }

    /// Mines rules from `dataset` and selects the rule list.
    ///
    /// A failed fit leaves a previously fitted classifier untouched.
    ///
    /// # Errors
    ///
    /// Returns an error if a threshold is out of range or the dataset knows
    /// no class.
    pub fn fit(&mut self, dataset: &Dataset) -> Result<()> {
        let rules = self.miner.mine(dataset)?;
        self.classifier = Some(build_classifier(dataset, rules)?);
        Ok(())
    }

    /// Predicts the class of one instance.
    ///
    /// # Errors
    ///
    /// Returns [`RuleListError::NotFitted`] before a successful `fit`.
    pub fn predict(&self, instance: &Instance) -> Result<ClassLabel> {
        Ok(self.fitted()?.predict(instance))
    }

    /// The fitted rule list, if any.
    #[must_use]
    pub fn classifier(&self) -> Option<&CbaClassifier> {
        self.classifier.as_ref()
    }

    /// Consumes the model and returns the fitted rule list.
    ///
    /// # Errors
    ///
    /// Returns [`RuleListError::NotFitted`] before a successful `fit`.
    pub fn into_classifier(self) -> Result<CbaClassifier> {
        self.classifier.ok_or(RuleListError::NotFitted)
    }

    fn fitted(&self) -> Result<&CbaClassifier> {
        self.classifier.as_ref().ok_or(RuleListError::NotFitted)
    }
}

impl Default for Cba {
    fn default() -> Self {
        Self::new()
    }
}

impl Estimator for Cba {
    fn fit(&mut self, dataset: &Dataset) -> Result<()> {
        Cba::fit(self, dataset)
    }

    fn predict(&self, instance: &Instance) -> Result<ClassLabel> {
        Cba::predict(self, instance)
    }

    fn score(&self, dataset: &Dataset) -> Result<f64> {
        Ok(self.fitted()?.score(dataset))
    }
}
