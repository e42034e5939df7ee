//! Database-coverage rule selection.
//!
//! Compresses a pool of evaluated rules into an ordered rule list in three
//! passes over the training data:
//!
//! 1. **Mark**: for every instance find the first rule that classifies it
//!    correctly (`c`) and the first that does not (`w`). When `c` comes
//!    first it is marked as decisive. Otherwise the instance is deferred.
//! 2. **Resolve**: deferred instances either move their credit to a marked
//!    `w`, or register a possible takeover with every candidate rule that
//!    would have classified them before `c`.
//! 3. **Cutoff**: walk the candidates in precedence order, cover instances,
//!    pick a default class after each rule, and keep the prefix with the
//!    fewest total errors.
//!
//! All bookkeeping lives in side tables indexed by a rule's position in the
//! sorted pool, so rules stay immutable until the selected ones are moved
//! into the result.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use tracing::{debug, trace, warn};

use crate::data::{majority_in, ClassLabel, Dataset};
use crate::error::{Result, RuleListError};
use crate::rules::{precedence, Rule};

/// Outcome of a selection: rules in classification order and the class of
/// the trailing default rule.
#[derive(Debug)]
pub(crate) struct Selection<S> {
    pub(crate) rules: Vec<Rule<S>>,
    pub(crate) default_class: ClassLabel,
    /// Training errors of the chosen cutoff, if any rule was a candidate.
    pub(crate) total_errors: Option<usize>,
}

/// An instance whose first matching rule predicts the wrong class.
#[derive(Debug, Clone, Copy)]
struct Conflict {
    instance: usize,
    class: ClassLabel,
    c_rule: Option<usize>,
    w_rule: usize,
}

/// Note that a rule may take over `instance` from `c_rule`.
#[derive(Debug, Clone, Copy)]
struct Replacement {
    c_rule: Option<usize>,
    instance: usize,
    class: ClassLabel,
}

/// Candidate cutoff recorded in stage 3.
#[derive(Debug, Clone, Copy)]
struct Cutoff {
    rule: usize,
    default_class: ClassLabel,
    total_errors: usize,
}

/// Builder state for one selection run.
struct Coverage<'a, S> {
    dataset: &'a Dataset,
    rules: Vec<Rule<S>>,
    /// Per rule: how many instances of each class it is credited with.
    credits: Vec<BTreeMap<ClassLabel, i64>>,
    marked: Vec<bool>,
    replacements: Vec<Vec<Replacement>>,
    conflicts: Vec<Conflict>,
    u: BTreeSet<usize>,
    q: BTreeSet<usize>,
}

/// Selects an ordered rule list from `pool`.
///
/// # Errors
///
/// Returns [`RuleListError::EmptyInput`] if the dataset has no class to use
/// as a default.
pub(crate) fn select<S>(dataset: &Dataset, pool: Vec<Rule<S>>) -> Result<Selection<S>> {
    let Some(majority) = dataset.majority_class() else {
        return Err(RuleListError::empty_input("training set without any class"));
    };

    let mut coverage = Coverage::new(dataset, pool);
    coverage.mark();
    coverage.resolve();
    let cutoffs = coverage.cut();

    let Some(best) = lowest_errors(&cutoffs) else {
        debug!(default_class = majority, "no rule selected");
        return Ok(Selection {
            rules: Vec::new(),
            default_class: majority,
            total_errors: None,
        });
    };

    let mut chosen: Vec<usize> = cutoffs[..=best].iter().map(|c| c.rule).collect();
    let default_class = cutoffs[best].default_class;
    let total_errors = cutoffs[best].total_errors;

    // Trailing rules predicting the default class change nothing.
    while let Some(&last) = chosen.last() {
        if coverage.rules[last].class() != default_class {
            break;
        }
        chosen.pop();
    }

    debug!(
        candidates = cutoffs.len(),
        cutoff = best,
        selected = chosen.len(),
        default_class,
        total_errors,
        "stage 3 done"
    );

    Ok(Selection {
        rules: coverage.take(&chosen),
        default_class,
        total_errors: Some(total_errors),
    })
}

/// Position of the first cutoff with the fewest total errors.
fn lowest_errors(cutoffs: &[Cutoff]) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (i, cutoff) in cutoffs.iter().enumerate() {
        match best {
            Some(b) if cutoffs[b].total_errors <= cutoff.total_errors => {}
            _ => best = Some(i),
        }
    }
    best
}

impl<'a, S> Coverage<'a, S> {
    fn new(dataset: &'a Dataset, mut rules: Vec<Rule<S>>) -> Self {
        precedence::sort(&mut rules);

        // A structural duplicate always sits behind its first copy, which
        // matches the same instances, so it can never be selected.
        let before = rules.len();
        let mut seen = HashSet::with_capacity(rules.len());
        rules.retain(|r| {
            let (items, class) = r.key();
            seen.insert((items.to_vec(), class))
        });
        if rules.len() < before {
            trace!(dropped = before - rules.len(), "dropped duplicate rules");
        }

        let n = rules.len();
        Self {
            dataset,
            rules,
            credits: vec![BTreeMap::new(); n],
            marked: vec![false; n],
            replacements: vec![Vec::new(); n],
            conflicts: Vec::new(),
            u: BTreeSet::new(),
            q: BTreeSet::new(),
        }
    }

    fn credit(&mut self, rule: usize, class: ClassLabel, delta: i64) {
        *self.credits[rule].entry(class).or_insert(0) += delta;
    }

    fn credit_of(&self, rule: usize, class: ClassLabel) -> i64 {
        self.credits[rule].get(&class).copied().unwrap_or(0)
    }

    /// Stage 1.
    fn mark(&mut self) {
        let dataset = self.dataset;
        for (id, instance) in dataset.instances().iter().enumerate() {
            let class = instance.class();
            let mut c_rule = None;
            let mut w_rule = None;
            for (j, rule) in self.rules.iter().enumerate() {
                if c_rule.is_some() && w_rule.is_some() {
                    break;
                }
                if !rule.matches(instance) {
                    continue;
                }
                if rule.class() == class {
                    c_rule.get_or_insert(j);
                } else {
                    w_rule.get_or_insert(j);
                }
            }

            match (c_rule, w_rule) {
                (None, None) => {}
                (Some(c), w) => {
                    self.u.insert(c);
                    self.credit(c, class, 1);
                    if w.map_or(true, |w| c < w) {
                        self.marked[c] = true;
                        self.q.insert(c);
                    } else if let Some(w) = w {
                        self.conflicts.push(Conflict {
                            instance: id,
                            class,
                            c_rule: Some(c),
                            w_rule: w,
                        });
                    }
                }
                (None, Some(w)) => self.conflicts.push(Conflict {
                    instance: id,
                    class,
                    c_rule: None,
                    w_rule: w,
                }),
            }
        }
        debug!(
            u = self.u.len(),
            q = self.q.len(),
            conflicts = self.conflicts.len(),
            "stage 1 done"
        );
    }

    /// Stage 2.
    fn resolve(&mut self) {
        let dataset = self.dataset;
        let conflicts = std::mem::take(&mut self.conflicts);
        for conflict in &conflicts {
            if self.marked[conflict.w_rule] {
                if let Some(c) = conflict.c_rule {
                    self.credit(c, conflict.class, -1);
                }
                self.credit(conflict.w_rule, conflict.class, 1);
                continue;
            }

            let instance = &dataset.instances()[conflict.instance];
            let takers: Vec<usize> = self
                .u
                .iter()
                .copied()
                .filter(|&r| {
                    let rule = &self.rules[r];
                    rule.class() != conflict.class
                        && conflict.c_rule.map_or(true, |c| r < c)
                        && rule.matches(instance)
                })
                .collect();

            for r in takers {
                self.replacements[r].push(Replacement {
                    c_rule: conflict.c_rule,
                    instance: conflict.instance,
                    class: conflict.class,
                });
                self.credit(r, conflict.class, 1);
                self.q.insert(r);
            }
        }
        debug!(
            conflicts = conflicts.len(),
            q = self.q.len(),
            "stage 2 done"
        );
        self.conflicts = conflicts;
    }

    /// Stage 3: records a cutoff after every rule of Q that still holds
    /// credit for its own class.
    fn cut(&mut self) -> Vec<Cutoff> {
        let dataset = self.dataset;
        let mut covered = vec![false; dataset.len()];
        let mut remaining = dataset.class_distribution();
        let mut rule_errors = 0;
        let mut cutoffs = Vec::new();

        let order: Vec<usize> = self.q.iter().copied().collect();
        for r in order {
            let own_class = self.rules[r].class();
            if self.credit_of(r, own_class) <= 0 {
                trace!(rule = r, "skipped: no credit left");
                continue;
            }

            for note in std::mem::take(&mut self.replacements[r]) {
                let Some(&is_covered) = covered.get(note.instance) else {
                    warn!(rule = r, instance = note.instance, "replacement names an unknown instance");
                    continue;
                };
                if is_covered {
                    self.credit(r, note.class, -1);
                } else if let Some(c) = note.c_rule {
                    if c < self.rules.len() {
                        self.credit(c, note.class, -1);
                    } else {
                        warn!(rule = r, c_rule = c, "replacement names an unknown rule");
                    }
                }
            }

            let rule = &self.rules[r];
            for (id, instance) in dataset.instances().iter().enumerate() {
                if covered[id] || !rule.matches(instance) {
                    continue;
                }
                covered[id] = true;
                if let Some(count) = remaining.get_mut(&instance.class()) {
                    *count = count.saturating_sub(1);
                }
                if instance.class() != own_class {
                    rule_errors += 1;
                }
            }

            let default_class = majority_in(dataset.classes(), &remaining).unwrap_or(own_class);
            let default_errors: usize = remaining
                .iter()
                .filter(|&(&class, _)| class != default_class)
                .map(|(_, &count)| count)
                .sum();

            cutoffs.push(Cutoff {
                rule: r,
                default_class,
                total_errors: rule_errors + default_errors,
            });
        }
        cutoffs
    }

    /// Moves the rules at `positions` out of the pool, in that order.
    fn take(self, positions: &[usize]) -> Vec<Rule<S>> {
        let mut slots: Vec<Option<Rule<S>>> = self.rules.into_iter().map(Some).collect();
        positions
            .iter()
            .filter_map(|&p| slots.get_mut(p).and_then(Option::take))
            .collect()
    }
}
