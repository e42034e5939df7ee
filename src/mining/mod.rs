//! Class association rule mining.
//!
//! This module discovers rules of the form `itemset ⇒ class` from a labeled
//! [`Dataset`], for use as the candidate pool of a rule-list classifier.
//!
//! # Algorithms
//!
//! - [`ClassApriori`]: levelwise (Apriori) search for class association
//!   rules, with a global or a per-class minimum support
//!
//! Any type implementing [`RuleSource`] can feed the classifier builder.
//!
//! # Example
//!
//! ```
//! use rulelist::data::Dataset;
//! use rulelist::mining::{ClassApriori, RuleSource};
//!
//! // Two attributes (items 1/2 and 3/4) and a trailing class (10 or 11)
//! let dataset = Dataset::from_rows(&[
//!     vec![1, 3, 10],
//!     vec![1, 4, 10],
//!     vec![2, 3, 11],
//!     vec![2, 4, 11],
//! ]).expect("valid rows");
//!
//! let miner = ClassApriori::new()
//!     .with_min_support(0.25)
//!     .with_min_confidence(0.9);
//!
//! let rules = miner.mine(&dataset).expect("valid thresholds");
//! for rule in &rules {
//!     println!("{rule}");
//! }
//! assert!(rules.iter().any(|r| r.antecedent() == [1] && r.class() == 10));
//! ```

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::data::{ClassLabel, Dataset, Item};
use crate::error::{check_unit_interval, Result};
use crate::rules::{PessimisticError, Rule, RuleStats};

/// A producer of candidate class association rules.
///
/// The classifier builder only needs evaluated rules; how they are found is
/// up to the source.
pub trait RuleSource {
    /// Statistics payload attached to every produced rule.
    type Stats: RuleStats;

    /// Mines evaluated rules from `dataset`, in no particular order.
    ///
    /// # Errors
    ///
    /// Returns an error if the source is misconfigured.
    fn mine(&self, dataset: &Dataset) -> Result<Vec<Rule<Self::Stats>>>;
}

/// How the minimum support threshold is applied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SupportMode {
    /// One threshold relative to the number of instances.
    #[default]
    Global,
    /// One threshold per class, relative to the number of instances of that
    /// class. Helps minority classes on unbalanced data.
    PerClass,
}

/// Rules produced by [`ClassApriori`].
pub type MinedRule = Rule<PessimisticError>;

/// Apriori search for class association rules.
///
/// # Algorithm
///
/// 1. Find the frequent items (class codes excluded), sorted ascending
/// 2. Build `{item} ⇒ class` for every frequent item and every class
/// 3. Join rules of the same class that share all but their last item
/// 4. Prune candidates with a missing one-item-smaller sub-rule
/// 5. Count every remaining candidate with a full dataset scan
/// 6. Keep candidates meeting `min_support` for the next level, and emit
///    those that also meet `min_confidence`
/// 7. Repeat until a level is empty
///
/// # Parameters
///
/// - `min_support`: minimum rule support, a fraction in (0, 1]
/// - `min_confidence`: minimum rule confidence, in (0, 1]
/// - `support_mode`: global or per-class support threshold
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassApriori {
    min_support: f64,
    min_confidence: f64,
    support_mode: SupportMode,
}

impl ClassApriori {
    /// Create a new miner with default parameters.
    ///
    /// # Default Parameters
    ///
    /// - `min_support`: 0.1 (10%)
    /// - `min_confidence`: 0.5 (50%)
    /// - `support_mode`: [`SupportMode::Global`]
    #[must_use]
    pub fn new() -> Self {
        Self {
            min_support: 0.1,
            min_confidence: 0.5,
            support_mode: SupportMode::Global,
        }
    }

    /// Set the minimum support threshold.
    ///
    /// # Arguments
    ///
    /// * `min_support` - Minimum support, in (0, 1]
    #[must_use]
    pub fn with_min_support(mut self, min_support: f64) -> Self {
        self.min_support = min_support;
        self
    }

    /// Set the minimum confidence threshold.
    ///
    /// # Arguments
    ///
    /// * `min_confidence` - Minimum confidence, in (0, 1]
    #[must_use]
    pub fn with_min_confidence(mut self, min_confidence: f64) -> Self {
        self.min_confidence = min_confidence;
        self
    }

    /// Set how the support threshold is applied.
    #[must_use]
    pub fn with_support_mode(mut self, support_mode: SupportMode) -> Self {
        self.support_mode = support_mode;
        self
    }

    /// Minimum support fraction.
    #[must_use]
    pub fn min_support(&self) -> f64 {
        self.min_support
    }

    /// Minimum confidence.
    #[must_use]
    pub fn min_confidence(&self) -> f64 {
        self.min_confidence
    }

    /// Support threshold mode.
    #[must_use]
    pub fn support_mode(&self) -> SupportMode {
        self.support_mode
    }

    /// Checks both thresholds lie in (0, 1].
    ///
    /// # Errors
    ///
    /// Returns [`RuleListError::InvalidParameter`](crate::error::RuleListError::InvalidParameter)
    /// naming the first offending threshold.
    pub fn validate(&self) -> Result<()> {
        check_unit_interval("min_support", self.min_support)?;
        check_unit_interval("min_confidence", self.min_confidence)
    }

    /// Mines rules and also returns every level of frequent rules found on
    /// the way (antecedent size 1 first), regardless of confidence.
    ///
    /// # Errors
    ///
    /// Returns an error if a threshold is out of range.
    pub fn mine_levels(&self, dataset: &Dataset) -> Result<(Vec<MinedRule>, Vec<Vec<MinedRule>>)> {
        let mut levels = Vec::new();
        let rules = self.run(dataset, |level| levels.push(level.to_vec()))?;
        Ok((rules, levels))
    }

    fn run<F>(&self, dataset: &Dataset, mut on_level: F) -> Result<Vec<MinedRule>>
    where
        F: FnMut(&[MinedRule]),
    {
        self.validate()?;

        let thresholds = Thresholds::new(self.support_mode, self.min_support, dataset);
        let mut ordinals = Ordinals::default();
        let mut rules = Vec::new();

        let frequent = frequent_items(dataset, thresholds.items());
        debug!(
            instances = dataset.len(),
            frequent_items = frequent.len(),
            threshold = thresholds.items(),
            "found frequent items"
        );
        if frequent.is_empty() {
            return Ok(rules);
        }

        let mut level = self.singleton_level(dataset, &frequent, &thresholds, &mut ordinals, &mut rules);
        let mut k = 1;
        while !level.is_empty() {
            on_level(&level);
            k += 1;
            level = self.next_level(dataset, &level, &thresholds, &mut ordinals, &mut rules);
            trace!(k, survivors = level.len(), "level done");
        }

        debug!(rules = rules.len(), levels = k - 1, "mining finished");
        Ok(rules)
    }

    /// Rules `{item} ⇒ class` for every frequent item and class.
    fn singleton_level(
        &self,
        dataset: &Dataset,
        frequent: &[Item],
        thresholds: &Thresholds,
        ordinals: &mut Ordinals,
        rules: &mut Vec<MinedRule>,
    ) -> Vec<MinedRule> {
        let mut level = Vec::new();
        let mut candidates = 0;
        for &item in frequent {
            for &class in dataset.classes() {
                candidates += 1;
                let candidate = MinedRule::new(vec![item], class).with_ordinal(ordinals.next());
                self.test(candidate, dataset, thresholds, &mut level, rules);
            }
        }
        debug!(k = 1, candidates, survivors = level.len(), emitted = rules.len(), "mined level");
        level
    }

    /// Joins the rules of `previous` into rules one item longer.
    fn next_level(
        &self,
        dataset: &Dataset,
        previous: &[MinedRule],
        thresholds: &Thresholds,
        ordinals: &mut Ordinals,
        rules: &mut Vec<MinedRule>,
    ) -> Vec<MinedRule> {
        let emitted_before = rules.len();
        let mut level = Vec::new();
        let mut candidates = 0;

        for first in previous {
            for second in previous {
                let Some(last) = join_item(first, second) else {
                    continue;
                };
                candidates += 1;
                let candidate = first.extended(last, ordinals.next());
                if !subsets_present(&candidate, previous) {
                    trace!(rule = %candidate, "pruned: infrequent sub-rule");
                    continue;
                }
                self.test(candidate, dataset, thresholds, &mut level, rules);
            }
        }

        if candidates > 0 {
            debug!(
                k = previous.first().map_or(0, |r| r.len() + 1),
                candidates,
                survivors = level.len(),
                emitted = rules.len() - emitted_before,
                "mined level"
            );
        }
        level
    }

    /// Counts `candidate` and files it into the level and the output.
    fn test(
        &self,
        mut candidate: MinedRule,
        dataset: &Dataset,
        thresholds: &Thresholds,
        level: &mut Vec<MinedRule>,
        rules: &mut Vec<MinedRule>,
    ) {
        candidate.evaluate(dataset);
        if candidate.support_rule() < thresholds.for_class(candidate.class()) {
            trace!(rule = %candidate, "rejected: support");
            return;
        }
        if candidate.confidence() >= self.min_confidence {
            rules.push(candidate.clone());
        }
        level.push(candidate);
    }
}

impl Default for ClassApriori {
    fn default() -> Self {
        Self::new()
    }
}

impl RuleSource for ClassApriori {
    type Stats = PessimisticError;

    fn mine(&self, dataset: &Dataset) -> Result<Vec<MinedRule>> {
        self.run(dataset, |_| {})
    }
}

/// Absolute support thresholds for one mining run.
struct Thresholds {
    global: usize,
    per_class: Option<BTreeMap<ClassLabel, usize>>,
}

impl Thresholds {
    fn new(mode: SupportMode, min_support: f64, dataset: &Dataset) -> Self {
        let global = absolute(min_support, dataset.len());
        let per_class = match mode {
            SupportMode::Global => None,
            SupportMode::PerClass => Some(
                dataset
                    .classes()
                    .iter()
                    .map(|&c| (c, absolute(min_support, dataset.class_count(c))))
                    .collect(),
            ),
        };
        Self { global, per_class }
    }

    /// Threshold for single items: the loosest class threshold.
    fn items(&self) -> usize {
        self.per_class
            .as_ref()
            .and_then(|m| m.values().copied().min())
            .unwrap_or(self.global)
    }

    fn for_class(&self, class: ClassLabel) -> usize {
        self.per_class
            .as_ref()
            .and_then(|m| m.get(&class).copied())
            .unwrap_or(self.global)
    }
}

/// `ceil(fraction × count)`, never below one instance.
fn absolute(fraction: f64, count: usize) -> usize {
    ((fraction * count as f64).ceil() as usize).max(1)
}

/// Per-run creation counter.
#[derive(Default)]
struct Ordinals(u64);

impl Ordinals {
    fn next(&mut self) -> u64 {
        let ordinal = self.0;
        self.0 += 1;
        ordinal
    }
}

/// Items occurring in at least `threshold` instances, ascending.
fn frequent_items(dataset: &Dataset, threshold: usize) -> Vec<Item> {
    let mut counts: BTreeMap<Item, usize> = BTreeMap::new();
    for instance in dataset.instances() {
        for &item in instance.items() {
            *counts.entry(item).or_insert(0) += 1;
        }
    }
    counts
        .into_iter()
        .filter(|&(_, count)| count >= threshold)
        .map(|(item, _)| item)
        .collect()
}

/// Item to append to `first` when it joins with `second`: both predict the
/// same class, share every item but the last, and `first` ends lower.
fn join_item<S>(first: &Rule<S>, second: &Rule<S>) -> Option<Item> {
    if first.class() != second.class() {
        return None;
    }
    let (&a, prefix_a) = first.antecedent().split_last()?;
    let (&b, prefix_b) = second.antecedent().split_last()?;
    (prefix_a == prefix_b && a < b).then_some(b)
}

/// True if every sub-rule of `candidate` with one item removed is in `previous`.
fn subsets_present<S>(candidate: &Rule<S>, previous: &[Rule<S>]) -> bool {
    let items = candidate.antecedent();
    (0..items.len()).all(|skip| {
        previous.iter().any(|rule| {
            rule.class() == candidate.class() && cmp_without(rule.antecedent(), items, skip).is_eq()
        })
    })
}

/// Compares `shorter` with `longer` minus its item at position `skip`.
fn cmp_without(shorter: &[Item], longer: &[Item], skip: usize) -> Ordering {
    let rest = longer
        .iter()
        .enumerate()
        .filter(|&(i, _)| i != skip)
        .map(|(_, item)| item);
    shorter.iter().cmp(rest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RuleListError;

    /// a1 = 1, a2 = 2, b1 = 3, b2 = 4; X = 10, Y = 11.
    fn four_instances() -> Dataset {
        Dataset::from_rows(&[
            vec![1, 3, 10],
            vec![1, 4, 10],
            vec![2, 3, 11],
            vec![2, 4, 11],
        ])
        .expect("valid rows")
    }

    fn find<'a>(rules: &'a [MinedRule], antecedent: &[Item], class: ClassLabel) -> Option<&'a MinedRule> {
        rules
            .iter()
            .find(|r| r.antecedent() == antecedent && r.class() == class)
    }

    #[test]
    fn test_class_apriori_new() {
        let miner = ClassApriori::new();
        assert!((miner.min_support() - 0.1).abs() < 1e-12);
        assert!((miner.min_confidence() - 0.5).abs() < 1e-12);
        assert_eq!(miner.support_mode(), SupportMode::Global);
        assert_eq!(miner, ClassApriori::default());
    }

    #[test]
    fn test_builder_methods() {
        let miner = ClassApriori::new()
            .with_min_support(0.3)
            .with_min_confidence(0.8)
            .with_support_mode(SupportMode::PerClass);
        assert!((miner.min_support() - 0.3).abs() < 1e-12);
        assert!((miner.min_confidence() - 0.8).abs() < 1e-12);
        assert_eq!(miner.support_mode(), SupportMode::PerClass);
    }

    #[test]
    fn test_rejects_out_of_range_thresholds() {
        let dataset = four_instances();
        for bad in [0.0, -0.5, 1.5, f64::NAN] {
            let err = ClassApriori::new()
                .with_min_support(bad)
                .mine(&dataset)
                .expect_err("min_support out of range");
            assert!(matches!(
                err,
                RuleListError::InvalidParameter { ref param, .. } if param == "min_support"
            ));

            let err = ClassApriori::new()
                .with_min_confidence(bad)
                .mine(&dataset)
                .expect_err("min_confidence out of range");
            assert!(matches!(
                err,
                RuleListError::InvalidParameter { ref param, .. } if param == "min_confidence"
            ));
        }
    }

    #[test]
    fn test_mines_expected_rules() {
        let rules = ClassApriori::new()
            .with_min_support(0.25)
            .with_min_confidence(0.5)
            .mine(&four_instances())
            .expect("valid thresholds");

        assert_eq!(rules.len(), 10);

        let a1_x = find(&rules, &[1], 10).expect("{a1} => X");
        assert_eq!(a1_x.support_antecedent(), 2);
        assert_eq!(a1_x.support_rule(), 2);
        assert_eq!(a1_x.support_class(), 2);
        assert_eq!(a1_x.confidence(), 1.0);

        let a2_y = find(&rules, &[2], 11).expect("{a2} => Y");
        assert_eq!(a2_y.confidence(), 1.0);

        let b1_x = find(&rules, &[3], 10).expect("{b1} => X");
        assert!((b1_x.confidence() - 0.5).abs() < 1e-12);

        assert!(find(&rules, &[1, 3], 10).is_some());
        assert!(find(&rules, &[2, 4], 11).is_some());
        // never co-occur
        assert!(find(&rules, &[3, 4], 10).is_none());
        assert!(find(&rules, &[1], 11).is_none());
    }

    #[test]
    fn test_min_confidence_filters_output_only() {
        let miner = ClassApriori::new()
            .with_min_support(0.25)
            .with_min_confidence(0.6);
        let (rules, levels) = miner.mine_levels(&four_instances()).expect("valid");

        assert_eq!(rules.len(), 6);
        assert!(rules.iter().all(|r| r.confidence() >= 0.6));
        // {b1} => X has confidence 0.5 but still seeds the next level
        assert!(find(&levels[0], &[3], 10).is_some());
        assert!(find(&levels[1], &[1, 3], 10).is_some());
    }

    #[test]
    fn test_levels_are_anti_monotone() {
        let (_, levels) = ClassApriori::new()
            .with_min_support(0.25)
            .with_min_confidence(0.5)
            .mine_levels(&four_instances())
            .expect("valid");

        assert_eq!(levels.len(), 2);
        for pair in levels.windows(2) {
            for rule in &pair[1] {
                for skip in 0..rule.len() {
                    let sub: Vec<Item> = rule
                        .antecedent()
                        .iter()
                        .enumerate()
                        .filter(|&(i, _)| i != skip)
                        .map(|(_, &item)| item)
                        .collect();
                    assert!(find(&pair[0], &sub, rule.class()).is_some());
                }
            }
        }
    }

    #[test]
    fn test_ordinals_are_unique_and_start_at_zero() {
        let miner = ClassApriori::new()
            .with_min_support(0.25)
            .with_min_confidence(0.5);
        let rules = miner.mine(&four_instances()).expect("valid");

        let mut ordinals: Vec<u64> = rules.iter().map(MinedRule::ordinal).collect();
        assert_eq!(ordinals[0], 0);
        assert!(ordinals.windows(2).all(|w| w[0] < w[1]));
        ordinals.dedup();
        assert_eq!(ordinals.len(), rules.len());

        // a second run restarts the counter
        let again = miner.mine(&four_instances()).expect("valid");
        assert_eq!(again[0].ordinal(), 0);
    }

    #[test]
    fn test_empty_dataset_yields_no_rules() {
        let rules = ClassApriori::new()
            .mine(&Dataset::new(Vec::new()))
            .expect("valid thresholds");
        assert!(rules.is_empty());
    }

    #[test]
    fn test_no_frequent_items_yields_no_rules() {
        let dataset = Dataset::from_rows(&[vec![1, 10], vec![2, 10], vec![3, 11]]).expect("rows");
        let rules = ClassApriori::new()
            .with_min_support(0.9)
            .mine(&dataset)
            .expect("valid thresholds");
        assert!(rules.is_empty());
    }

    #[test]
    fn test_per_class_support_keeps_minority_rules() {
        let dataset = Dataset::from_rows(&[
            vec![1, 10],
            vec![1, 10],
            vec![1, 10],
            vec![2, 10],
            vec![2, 11],
        ])
        .expect("rows");

        let global = ClassApriori::new()
            .with_min_support(0.5)
            .with_min_confidence(0.5)
            .mine(&dataset)
            .expect("valid");
        assert!(find(&global, &[1], 10).is_some());
        assert!(find(&global, &[2], 11).is_none());

        let per_class = ClassApriori::new()
            .with_min_support(0.5)
            .with_min_confidence(0.5)
            .with_support_mode(SupportMode::PerClass)
            .mine(&dataset)
            .expect("valid");
        assert!(find(&per_class, &[1], 10).is_some());
        assert!(find(&per_class, &[2], 11).is_some());
        // {2} => 10 has support 1, below the class-10 threshold of 2
        assert!(find(&per_class, &[2], 10).is_none());
    }

    #[test]
    fn test_mined_rules_carry_pessimistic_error() {
        let rules = ClassApriori::new()
            .with_min_support(0.25)
            .mine(&four_instances())
            .expect("valid");
        let a1_x = find(&rules, &[1], 10).expect("{a1} => X");
        let expected = PessimisticError::estimate(2, 0);
        assert!((a1_x.stats().rate() - expected).abs() < 1e-12);
        assert!(a1_x.stats().rate() > 0.0);
    }

    #[test]
    fn test_cmp_without() {
        assert_eq!(cmp_without(&[1, 3], &[1, 2, 3], 1), Ordering::Equal);
        assert_eq!(cmp_without(&[1, 2], &[1, 2, 3], 2), Ordering::Equal);
        assert_eq!(cmp_without(&[2, 3], &[1, 2, 3], 0), Ordering::Equal);
        assert_eq!(cmp_without(&[1, 3], &[1, 2, 3], 0), Ordering::Less);
        assert_eq!(cmp_without(&[2, 4], &[1, 2, 3], 0), Ordering::Greater);
    }

    #[test]
    fn test_join_item() {
        let r13: MinedRule = Rule::new(vec![1, 3], 10);
        let r14: MinedRule = Rule::new(vec![1, 4], 10);
        let r24: MinedRule = Rule::new(vec![2, 4], 10);
        let r14_y: MinedRule = Rule::new(vec![1, 4], 11);

        assert_eq!(join_item(&r13, &r14), Some(4));
        assert_eq!(join_item(&r14, &r13), None);
        assert_eq!(join_item(&r13, &r24), None);
        assert_eq!(join_item(&r13, &r14_y), None);
    }
}
