//! Class association rules.
//!
//! A [`Rule`] states that instances containing every item of its
//! antecedent tend to carry its class. Rules are created with zero
//! counters, filled once by [`Rule::evaluate`], and read-only afterwards.
//!
//! The rule type is generic over an algorithm-specific statistics payload
//! (see [`RuleStats`]); the core fields and the precedence order are shared
//! by every payload.
//!
//! # Example
//!
//! ```
//! use rulelist::data::Dataset;
//! use rulelist::rules::Rule;
//!
//! let dataset = Dataset::from_rows(&[vec![1, 3, 10], vec![1, 4, 10], vec![2, 3, 11]])
//!     .expect("valid rows");
//!
//! let mut rule: Rule = Rule::new(vec![1], 10);
//! rule.evaluate(&dataset);
//!
//! assert_eq!(rule.support_antecedent(), 2);
//! assert_eq!(rule.support_rule(), 2);
//! assert_eq!(rule.confidence(), 1.0);
//! ```

pub mod precedence;

use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::data::{ClassLabel, Dataset, Instance, Item};

/// Extra per-rule statistics computed alongside the support counters.
pub trait RuleStats: Clone + Default + fmt::Debug {
    /// Refreshes the payload after the counters changed.
    fn update(&mut self, _support_antecedent: usize, _support_rule: usize) {}

    /// Appends payload measures to the rule's textual form.
    fn fmt_measures(&self, _f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Ok(())
    }
}

impl RuleStats for () {}

/// Pessimistic (upper-confidence) error rate of a rule over the instances
/// its antecedent covers, with a confidence factor of 0.25.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PessimisticError {
    rate: f64,
}

impl PessimisticError {
    /// Confidence factor of the estimate.
    pub const CONFIDENCE_FACTOR: f64 = 0.25;

    /// Error rate in `[0, 1]`; zero for a rule that covers nothing.
    #[must_use]
    pub fn rate(&self) -> f64 {
        self.rate
    }

    /// Estimated error rate for `covered` instances of which `errors` are
    /// misclassified.
    #[must_use]
    pub fn estimate(covered: usize, errors: usize) -> f64 {
        if covered == 0 {
            return 0.0;
        }
        let n = covered as f64;
        let e = errors as f64;
        ((e + added_errors(n, e, Self::CONFIDENCE_FACTOR)) / n).min(1.0)
    }
}

impl RuleStats for PessimisticError {
    fn update(&mut self, support_antecedent: usize, support_rule: usize) {
        self.rate = Self::estimate(
            support_antecedent,
            support_antecedent.saturating_sub(support_rule),
        );
    }

    fn fmt_measures(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, " #ERROR: {}", self.rate)
    }
}

/// Extra errors to add to `e` observed errors among `n` cases so that the
/// total is an upper confidence bound at level `cf`.
fn added_errors(n: f64, e: f64, cf: f64) -> f64 {
    if e < 1e-6 {
        n * (1.0 - (cf.ln() / n).exp())
    } else if e < 0.9999 {
        let v0 = n * (1.0 - (cf.ln() / n).exp());
        v0 + e * (added_errors(n, 1.0, cf) - v0)
    } else if e + 0.5 >= n {
        0.67 * (n - e)
    } else {
        let z2 = normal_deviate(cf).powi(2);
        let pr = (e + 0.5 + z2 / 2.0 + (z2 * ((e + 0.5) * (1.0 - (e + 0.5) / n) + z2 / 4.0)).sqrt())
            / (n + z2);
        n * pr - e
    }
}

/// Upper-tail standard normal deviate for probability `cf`, interpolated
/// from a fixed table.
fn normal_deviate(cf: f64) -> f64 {
    const VAL: [f64; 17] = [
        0.0, 1e-9, 1e-8, 1e-7, 1e-6, 1e-5, 5e-5, 1e-4, 5e-4, 1e-3, 5e-3, 0.01, 0.05, 0.10, 0.20,
        0.40, 1.00,
    ];
    const DEV: [f64; 17] = [
        100.0, 6.0, 5.61, 5.2, 4.75, 4.26, 3.89, 3.72, 3.29, 3.09, 2.58, 2.33, 1.65, 1.28, 0.84,
        0.25, 0.0,
    ];
    let i = VAL
        .iter()
        .position(|&v| cf <= v)
        .unwrap_or(VAL.len() - 1)
        .max(1);
    DEV[i - 1] + (DEV[i] - DEV[i - 1]) * (cf - VAL[i - 1]) / (VAL[i] - VAL[i - 1])
}

/// A class association rule `antecedent ⇒ class`.
///
/// Two rules are equal when their antecedents and classes are equal; the
/// counters, ordinal and payload do not take part in equality or hashing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rule<S = ()> {
    antecedent: Vec<Item>,
    class: ClassLabel,
    support_antecedent: usize,
    support_rule: usize,
    support_class: usize,
    ordinal: u64,
    stats: S,
}

impl<S: RuleStats> Rule<S> {
    /// Creates an unevaluated rule. The antecedent is sorted and deduplicated.
    #[must_use]
    pub fn new(mut antecedent: Vec<Item>, class: ClassLabel) -> Self {
        antecedent.sort_unstable();
        antecedent.dedup();
        Self {
            antecedent,
            class,
            support_antecedent: 0,
            support_rule: 0,
            support_class: 0,
            ordinal: 0,
            stats: S::default(),
        }
    }

    /// Creates the antecedent-free rule that matches every instance.
    #[must_use]
    pub fn default_rule(class: ClassLabel) -> Self {
        Self::new(Vec::new(), class)
    }

    /// Sets the creation ordinal used as the last precedence tie-break.
    #[must_use]
    pub fn with_ordinal(mut self, ordinal: u64) -> Self {
        self.ordinal = ordinal;
        self
    }

    /// Sets the counters directly, for rule sources that count on their own.
    #[must_use]
    pub fn with_counts(
        mut self,
        support_antecedent: usize,
        support_rule: usize,
        support_class: usize,
    ) -> Self {
        self.support_antecedent = support_antecedent;
        self.support_rule = support_rule;
        self.support_class = support_class;
        self.stats.update(support_antecedent, support_rule);
        self
    }

    /// Unevaluated copy of this rule's antecedent and class with `item`
    /// added, carrying a fresh ordinal.
    #[must_use]
    pub(crate) fn extended(&self, item: Item, ordinal: u64) -> Self {
        let mut antecedent = Vec::with_capacity(self.antecedent.len() + 1);
        antecedent.extend_from_slice(&self.antecedent);
        match antecedent.last() {
            Some(&last) if last >= item => {
                if let Err(pos) = antecedent.binary_search(&item) {
                    antecedent.insert(pos, item);
                }
            }
            _ => antecedent.push(item),
        }
        Self {
            antecedent,
            class: self.class,
            support_antecedent: 0,
            support_rule: 0,
            support_class: 0,
            ordinal,
            stats: S::default(),
        }
    }

    /// Counts supports with one scan over `dataset`, replacing previous counts.
    pub fn evaluate(&mut self, dataset: &Dataset) {
        let mut support_antecedent = 0;
        let mut support_rule = 0;
        let mut support_class = 0;

        for instance in dataset.instances() {
            let class_matches = instance.class() == self.class;
            if class_matches {
                support_class += 1;
            }
            if self.matches(instance) {
                support_antecedent += 1;
                if class_matches {
                    support_rule += 1;
                }
            }
        }

        self.support_antecedent = support_antecedent;
        self.support_rule = support_rule;
        self.support_class = support_class;
        self.stats.update(support_antecedent, support_rule);
    }

    /// Strictly higher precedence than `other`.
    #[must_use]
    pub fn precedes(&self, other: &Self) -> bool {
        precedence::compare(self, other).is_lt()
    }
}

impl<S> Rule<S> {
    /// Sorted, duplicate-free antecedent items.
    #[must_use]
    pub fn antecedent(&self) -> &[Item] {
        &self.antecedent
    }

    /// Predicted class.
    #[must_use]
    pub fn class(&self) -> ClassLabel {
        self.class
    }

    /// Number of items in the antecedent.
    #[must_use]
    pub fn len(&self) -> usize {
        self.antecedent.len()
    }

    /// True for an antecedent-free (default) rule.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.antecedent.is_empty()
    }

    /// Instances containing the antecedent.
    #[must_use]
    pub fn support_antecedent(&self) -> usize {
        self.support_antecedent
    }

    /// Instances containing the antecedent and labeled with the class.
    #[must_use]
    pub fn support_rule(&self) -> usize {
        self.support_rule
    }

    /// Instances labeled with the class.
    #[must_use]
    pub fn support_class(&self) -> usize {
        self.support_class
    }

    /// Creation ordinal.
    #[must_use]
    pub fn ordinal(&self) -> u64 {
        self.ordinal
    }

    /// Algorithm-specific statistics.
    #[must_use]
    pub fn stats(&self) -> &S {
        &self.stats
    }

    /// `support_rule / support_antecedent`, or 0 when the antecedent never occurs.
    #[must_use]
    pub fn confidence(&self) -> f64 {
        if self.support_antecedent == 0 {
            0.0
        } else {
            self.support_rule as f64 / self.support_antecedent as f64
        }
    }

    /// True if the instance contains every antecedent item.
    #[must_use]
    pub fn matches(&self, instance: &Instance) -> bool {
        instance.contains_all(&self.antecedent)
    }

    /// Structural identity (antecedent and class) of this rule.
    #[must_use]
    pub fn key(&self) -> (&[Item], ClassLabel) {
        (&self.antecedent, self.class)
    }
}

impl<S> PartialEq for Rule<S> {
    fn eq(&self, other: &Self) -> bool {
        self.class == other.class && self.antecedent == other.antecedent
    }
}

impl<S> Eq for Rule<S> {}

impl<S> Hash for Rule<S> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.antecedent.hash(state);
        self.class.hash(state);
    }
}

impl<S: RuleStats> fmt::Display for Rule<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.antecedent.is_empty() {
            return write!(f, "DEFAULT ==> {}", self.class);
        }
        let items: Vec<String> = self.antecedent.iter().map(ToString::to_string).collect();
        write!(
            f,
            "{} ==> {} #SUP: {} #CONF: {}",
            items.join(" "),
            self.class,
            self.support_rule,
            self.confidence()
        )?;
        self.stats.fmt_measures(f)
    }
}
