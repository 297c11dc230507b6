//! Alert evaluation
//!
//! The engine keeps no state between calls. Every size-changing operation
//! hands it the queue's size before and after the mutation together with the
//! rules attached at that moment, and the engine works out which thresholds
//! the transition crossed.
//!
//! A threshold `t` is crossed ascending when `old < t <= new` and descending
//! when `new <= t < old`. A `size` rule has the single threshold `trigger`;
//! a `progressive` rule treats every positive multiple of `trigger` as a
//! threshold, so one large batch can fire it several times.

use super::config::{AlertRule, AlertType};

/// A rule that fired, together with the threshold that was crossed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Firing {
    pub rule: AlertRule,
    pub threshold: usize,
    pub rising: bool,
}

/// Stateless evaluator for queue alert rules
#[derive(Debug, Default, Clone, Copy)]
pub struct AlertEngine;

impl AlertEngine {
    pub fn new() -> Self {
        Self
    }

    /// Evaluate all rules against one size transition.
    ///
    /// Firings are returned in rule attachment order, and within a rule in
    /// the order the thresholds were passed.
    pub fn evaluate(&self, rules: &[AlertRule], old_size: usize, new_size: usize) -> Vec<Firing> {
        if old_size == new_size {
            return Vec::new();
        }

        let rising = new_size > old_size;
        let mut firings = Vec::new();

        for rule in rules {
            for threshold in Self::crossings(rule, old_size, new_size) {
                firings.push(Firing {
                    rule: rule.clone(),
                    threshold,
                    rising,
                });
            }
        }

        firings
    }

    /// Thresholds of a single rule crossed by `old -> new`
    pub fn crossings(rule: &AlertRule, old_size: usize, new_size: usize) -> Vec<usize> {
        let rising = new_size > old_size;
        let falling = new_size < old_size;

        if (rising && !rule.direction.ascending()) || (falling && !rule.direction.descending()) {
            return Vec::new();
        }

        match rule.kind {
            AlertType::Size => {
                if crossed(old_size, new_size, rule.trigger) {
                    vec![rule.trigger]
                } else {
                    Vec::new()
                }
            }
            AlertType::Progressive => progressive_crossings(old_size, new_size, rule.trigger),
        }
    }
}

/// Whether `old -> new` reaches `threshold` from the other side
pub fn crossed(old_size: usize, new_size: usize, threshold: usize) -> bool {
    if new_size > old_size {
        old_size < threshold && threshold <= new_size
    } else if new_size < old_size {
        new_size <= threshold && threshold < old_size
    } else {
        false
    }
}

/// Positive multiples of `step` crossed by `old -> new`, in crossing order
fn progressive_crossings(old_size: usize, new_size: usize, step: usize) -> Vec<usize> {
    if step == 0 || old_size == new_size {
        return Vec::new();
    }

    if new_size > old_size {
        // old < m <= new
        let first = (old_size / step + 1) * step;
        let last = (new_size / step) * step;
        if first > last {
            return Vec::new();
        }
        (first..=last).step_by(step).collect()
    } else {
        // new <= m < old, m >= step
        let lowest = new_size.div_ceil(step).max(1) * step;
        let highest = ((old_size - 1) / step) * step;
        if lowest > highest {
            return Vec::new();
        }
        (lowest..=highest).rev().step_by(step).collect()
    }
}

/// Number of multiples of `step` crossed by `old -> new`
pub fn progressive_crossing_count(old_size: usize, new_size: usize, step: usize) -> usize {
    progressive_crossings(old_size, new_size, step).len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alerts::config::Direction;
    use proptest::prelude::*;

    fn rule(kind: AlertType, trigger: usize, direction: Direction) -> AlertRule {
        AlertRule {
            id: "a1".to_string(),
            kind,
            trigger,
            direction,
            queue: "alerts".to_string(),
        }
    }

    #[test]
    fn test_size_ascending_boundaries() {
        let r = rule(AlertType::Size, 10, Direction::Asc);

        assert_eq!(AlertEngine::crossings(&r, 9, 10), vec![10]);
        assert_eq!(AlertEngine::crossings(&r, 0, 13), vec![10]);
        assert!(AlertEngine::crossings(&r, 10, 11).is_empty());
        assert!(AlertEngine::crossings(&r, 8, 9).is_empty());
        // Decreasing transitions are ignored by asc rules
        assert!(AlertEngine::crossings(&r, 11, 9).is_empty());
    }

    #[test]
    fn test_size_descending_boundaries() {
        let r = rule(AlertType::Size, 10, Direction::Desc);

        assert_eq!(AlertEngine::crossings(&r, 11, 10), vec![10]);
        assert_eq!(AlertEngine::crossings(&r, 15, 2), vec![10]);
        assert!(AlertEngine::crossings(&r, 10, 9).is_empty());
        assert!(AlertEngine::crossings(&r, 15, 11).is_empty());
        assert!(AlertEngine::crossings(&r, 9, 12).is_empty());
    }

    #[test]
    fn test_size_both_directions() {
        let r = rule(AlertType::Size, 10, Direction::Both);

        assert_eq!(AlertEngine::crossings(&r, 9, 10), vec![10]);
        assert_eq!(AlertEngine::crossings(&r, 11, 7), vec![10]);
        assert!(AlertEngine::crossings(&r, 10, 10).is_empty());
    }

    #[test]
    fn test_progressive_ascending_batch() {
        let r = rule(AlertType::Progressive, 10, Direction::Asc);

        assert_eq!(AlertEngine::crossings(&r, 5, 35), vec![10, 20, 30]);
        assert_eq!(AlertEngine::crossings(&r, 10, 19), Vec::<usize>::new());
        assert_eq!(AlertEngine::crossings(&r, 19, 20), vec![20]);
    }

    #[test]
    fn test_progressive_descending_batch() {
        let r = rule(AlertType::Progressive, 10, Direction::Desc);

        assert_eq!(AlertEngine::crossings(&r, 25, 10), vec![20, 10]);
        assert_eq!(AlertEngine::crossings(&r, 21, 20), vec![20]);
        assert!(AlertEngine::crossings(&r, 20, 11).is_empty());

        let r7 = rule(AlertType::Progressive, 7, Direction::Desc);
        assert_eq!(AlertEngine::crossings(&r7, 47, 0), vec![42, 35, 28, 21, 14, 7]);
        // Zero is never a threshold
        assert!(AlertEngine::crossings(&r, 5, 0).is_empty());
    }

    #[test]
    fn test_evaluate_multiple_rules_in_order() {
        let rules = vec![
            rule(AlertType::Size, 3, Direction::Asc),
            rule(AlertType::Progressive, 2, Direction::Both),
            rule(AlertType::Size, 1, Direction::Desc),
        ];

        let firings = AlertEngine::new().evaluate(&rules, 0, 4);
        let thresholds: Vec<usize> = firings.iter().map(|f| f.threshold).collect();
        assert_eq!(thresholds, vec![3, 2, 4]);
        assert!(firings.iter().all(|f| f.rising));

        let firings = AlertEngine::new().evaluate(&rules, 4, 1);
        let thresholds: Vec<usize> = firings.iter().map(|f| f.threshold).collect();
        assert_eq!(thresholds, vec![2, 1]);
        assert!(firings.iter().all(|f| !f.rising));
    }

    #[test]
    fn test_evaluate_no_change() {
        let rules = vec![rule(AlertType::Size, 0, Direction::Both)];
        assert!(AlertEngine::new().evaluate(&rules, 7, 7).is_empty());
    }

    proptest! {
        #[test]
        fn prop_progressive_batch_count(start in 0usize..500, batch in 1usize..500, step in 1usize..50) {
            let end = start + batch;
            prop_assert_eq!(
                progressive_crossing_count(start, end, step),
                end / step - start / step
            );
        }

        #[test]
        fn prop_progressive_split_matches_batch(start in 0usize..300, a in 0usize..100, b in 0usize..100, step in 1usize..20) {
            // Two consecutive posts fire as often as one combined post
            let split = progressive_crossing_count(start, start + a, step)
                + progressive_crossing_count(start + a, start + a + b, step);
            prop_assert_eq!(split, progressive_crossing_count(start, start + a + b, step));
        }

        #[test]
        fn prop_descending_mirrors_ascending(low in 0usize..300, span in 1usize..300, step in 1usize..30) {
            // Dropping back from high to low passes the same multiples, except that
            // a multiple sitting exactly on `low` only counts on the way down.
            let high = low + span;
            let up = progressive_crossings(low, high, step);
            let mut down = progressive_crossings(high, low, step);
            down.reverse();

            let expected: Vec<usize> = (1..=high / step)
                .map(|k| k * step)
                .filter(|m| low <= *m && *m < high)
                .collect();
            prop_assert_eq!(down, expected);
            prop_assert!(up.iter().all(|m| low < *m && *m <= high));
        }

        #[test]
        fn prop_size_rule_fires_at_most_once(old in 0usize..100, new in 0usize..100, trigger in 1usize..100) {
            let r = rule(AlertType::Size, trigger, Direction::Both);
            prop_assert!(AlertEngine::crossings(&r, old, new).len() <= 1);
        }
    }
}
