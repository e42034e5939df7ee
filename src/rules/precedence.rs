//! Total precedence order over rules.
//!
//! Keys, in order:
//! 1. confidence, descending (compared exactly on the integer counters)
//! 2. rule support, descending
//! 3. antecedent size, ascending
//! 4. antecedent items, lexicographically ascending
//! 5. class code, ascending
//! 6. creation ordinal, ascending
//!
//! `Ordering::Less` means "comes first".

use std::cmp::Ordering;

use super::Rule;

/// Compares two rules by precedence.
#[must_use]
pub fn compare<S>(a: &Rule<S>, b: &Rule<S>) -> Ordering {
    compare_confidence(a, b)
        .then_with(|| b.support_rule.cmp(&a.support_rule))
        .then_with(|| a.antecedent.len().cmp(&b.antecedent.len()))
        .then_with(|| a.antecedent.cmp(&b.antecedent))
        .then_with(|| a.class.cmp(&b.class))
        .then_with(|| a.ordinal.cmp(&b.ordinal))
}

/// Sorts rules so that the highest precedence comes first.
pub fn sort<S>(rules: &mut [Rule<S>]) {
    rules.sort_by(compare);
}

/// Higher confidence first, without going through floating point.
fn compare_confidence<S>(a: &Rule<S>, b: &Rule<S>) -> Ordering {
    let (a_num, a_den) = confidence_ratio(a);
    let (b_num, b_den) = confidence_ratio(b);
    let lhs = a_num * b_den;
    let rhs = b_num * a_den;
    rhs.cmp(&lhs)
}

fn confidence_ratio<S>(rule: &Rule<S>) -> (u128, u128) {
    if rule.support_antecedent == 0 {
        (0, 1)
    } else {
        (rule.support_rule as u128, rule.support_antecedent as u128)
    }
}
