//! Labeled transactional data.
//!
//! A [`Dataset`] is an ordered, read-only collection of [`Instance`]s. Each
//! instance is a fixed-width vector of item codes (one per attribute, as
//! produced by an upstream encoder) plus a class code.
//!
//! # Example
//!
//! ```
//! use rulelist::data::{Dataset, Instance};
//!
//! let dataset = Dataset::from_rows(&[
//!     vec![1, 3, 10],
//!     vec![1, 4, 10],
//!     vec![2, 3, 11],
//! ]).expect("rows carry a trailing class code");
//!
//! assert_eq!(dataset.len(), 3);
//! assert_eq!(dataset.classes(), &[10, 11]);
//! assert_eq!(dataset.class_count(10), 2);
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Result, RuleListError};

/// Code of one attribute value.
pub type Item = u32;

/// Code of one class value.
pub type ClassLabel = u32;

/// One labeled record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instance {
    items: Vec<Item>,
    class: ClassLabel,
}

impl Instance {
    /// Creates an instance from its item codes and class code.
    #[must_use]
    pub fn new(items: Vec<Item>, class: ClassLabel) -> Self {
        Self { items, class }
    }

    /// Creates an instance from an encoded row whose last element is the class.
    ///
    /// # Errors
    ///
    /// Returns an error if the row is empty.
    pub fn from_row(row: &[u32]) -> Result<Self> {
        match row.split_last() {
            Some((&class, items)) => Ok(Self::new(items.to_vec(), class)),
            None => Err(RuleListError::empty_input("instance row without class code")),
        }
    }

    /// Item codes, one per attribute.
    #[must_use]
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    /// Class code.
    #[must_use]
    pub fn class(&self) -> ClassLabel {
        self.class
    }

    /// True if every item of `itemset` occurs in this instance.
    ///
    /// The empty itemset is contained in every instance.
    #[must_use]
    pub fn contains_all(&self, itemset: &[Item]) -> bool {
        itemset.iter().all(|item| self.items.contains(item))
    }
}

/// Immutable ordered collection of instances with derived class statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    instances: Vec<Instance>,
    classes: Vec<ClassLabel>,
    class_counts: BTreeMap<ClassLabel, usize>,
}

impl Dataset {
    /// Builds a dataset; classes are enumerated in order of first appearance.
    #[must_use]
    pub fn new(instances: Vec<Instance>) -> Self {
        let mut classes = Vec::new();
        for instance in &instances {
            if !classes.contains(&instance.class) {
                classes.push(instance.class);
            }
        }
        let class_counts = count_classes(&instances, &classes);
        Self {
            instances,
            classes,
            class_counts,
        }
    }

    /// Builds a dataset with an explicitly declared class order.
    ///
    /// Declared classes without instances are kept (with a count of zero).
    ///
    /// # Errors
    ///
    /// Returns [`RuleListError::UnknownClass`] if an instance carries a class
    /// that was not declared.
    pub fn with_classes(instances: Vec<Instance>, classes: Vec<ClassLabel>) -> Result<Self> {
        let mut declared: Vec<ClassLabel> = Vec::with_capacity(classes.len());
        for class in classes {
            if !declared.contains(&class) {
                declared.push(class);
            }
        }
        if let Some(unknown) = instances.iter().find(|i| !declared.contains(&i.class)) {
            return Err(RuleListError::UnknownClass {
                class: unknown.class,
            });
        }
        let class_counts = count_classes(&instances, &declared);
        Ok(Self {
            instances,
            classes: declared,
            class_counts,
        })
    }

    /// Builds a dataset from encoded rows, each ending with its class code.
    ///
    /// # Errors
    ///
    /// Returns an error if any row is empty.
    pub fn from_rows(rows: &[Vec<u32>]) -> Result<Self> {
        let instances = rows
            .iter()
            .map(|row| Instance::from_row(row))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(instances))
    }

    /// Instances in their original order.
    #[must_use]
    pub fn instances(&self) -> &[Instance] {
        &self.instances
    }

    /// Number of instances.
    #[must_use]
    pub fn len(&self) -> usize {
        self.instances.len()
    }

    /// True if the dataset holds no instances.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// Distinct class codes in enumeration order.
    #[must_use]
    pub fn classes(&self) -> &[ClassLabel] {
        &self.classes
    }

    /// Number of instances labeled with `class`.
    #[must_use]
    pub fn class_count(&self, class: ClassLabel) -> usize {
        self.class_counts.get(&class).copied().unwrap_or(0)
    }

    /// Per-class instance counts (a fresh copy the caller may mutate).
    #[must_use]
    pub fn class_distribution(&self) -> BTreeMap<ClassLabel, usize> {
        self.class_counts.clone()
    }

    /// Most frequent class; the first class in enumeration order wins ties.
    ///
    /// Returns `None` only when the dataset knows no class at all.
    #[must_use]
    pub fn majority_class(&self) -> Option<ClassLabel> {
        majority_in(&self.classes, &self.class_counts)
    }
}

/// Majority class of a tally, scanning `classes` in order.
///
/// A later class replaces the current pick only with a strictly larger count.
pub(crate) fn majority_in(
    classes: &[ClassLabel],
    counts: &BTreeMap<ClassLabel, usize>,
) -> Option<ClassLabel> {
    let count = |c: &ClassLabel| counts.get(c).copied().unwrap_or(0);
    let mut best = *classes.first()?;
    for class in &classes[1..] {
        if count(class) > count(&best) {
            best = *class;
        }
    }
    Some(best)
}

fn count_classes(instances: &[Instance], classes: &[ClassLabel]) -> BTreeMap<ClassLabel, usize> {
    let mut counts: BTreeMap<ClassLabel, usize> = classes.iter().map(|&c| (c, 0)).collect();
    for instance in instances {
        *counts.entry(instance.class).or_insert(0) += 1;
    }
    counts
}
