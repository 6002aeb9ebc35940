//! Observed state of a keyed resource set
//!
//! Holds the last value seen for every key and turns a fresh observation into
//! the list of transitions since the previous one.

use crate::transition::Transition;
use std::collections::{BTreeMap, HashMap, HashSet};

/// Last known value per key, owned by exactly one monitor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservedState<V> {
    entries: BTreeMap<String, V>,
}

impl<V> Default for ObservedState<V> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }
}

impl<V> ObservedState<V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&V> {
        self.entries.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &V)> {
        self.entries.iter()
    }
}

impl<V: Clone + PartialEq> ObservedState<V> {
    /// Apply one observation and return what changed.
    ///
    /// Transitions for present keys follow the order of `current`. A key that
    /// occurs more than once keeps its first position and its last value.
    /// When `reconcile` is set, recorded keys missing from `current` are
    /// removed and reported as disappeared, in key order.
    ///
    /// An empty observation changes nothing and reports nothing.
    pub fn observe<I>(&mut self, current: I, reconcile: bool) -> Vec<Transition<V>>
    where
        I: IntoIterator<Item = (String, V)>,
    {
        let mut order = Vec::new();
        let mut latest: HashMap<String, V> = HashMap::new();
        for (key, value) in current {
            if latest.insert(key.clone(), value).is_none() {
                order.push(key);
            }
        }

        if order.is_empty() {
            return Vec::new();
        }

        let mut transitions = Vec::new();
        for key in &order {
            let Some(value) = latest.remove(key) else {
                continue;
            };

            match self.entries.get(key) {
                None => transitions.push(Transition::Appeared {
                    key: key.clone(),
                    value: value.clone(),
                }),
                Some(old) if *old != value => transitions.push(Transition::Changed {
                    key: key.clone(),
                    old: old.clone(),
                    new: value.clone(),
                }),
                Some(_) => {}
            }

            self.entries.insert(key.clone(), value);
        }

        if reconcile {
            let seen: HashSet<&str> = order.iter().map(String::as_str).collect();
            let gone: Vec<String> = self
                .entries
                .keys()
                .filter(|key| !seen.contains(key.as_str()))
                .cloned()
                .collect();

            for key in gone {
                if let Some(last) = self.entries.remove(&key) {
                    transitions.push(Transition::Disappeared { key, last });
                }
            }
        }

        transitions
    }
}

impl<V> FromIterator<(String, V)> for ObservedState<V> {
    fn from_iter<I: IntoIterator<Item = (String, V)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::InstancePhase::{self, Pending, Running, Stopped};

    fn poll(items: &[(&str, InstancePhase)]) -> Vec<(String, InstancePhase)> {
        items
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_unchanged_poll_is_silent() {
        let mut state = ObservedState::new();
        state.observe(poll(&[("a", Running), ("b", Pending)]), true);

        let transitions = state.observe(poll(&[("a", Running), ("b", Pending)]), true);
        assert!(transitions.is_empty());
        assert_eq!(state.len(), 2);
    }

    #[test]
    fn test_new_key_appears_once() {
        let mut state = ObservedState::new();
        let transitions = state.observe(poll(&[("a", Pending)]), false);

        assert_eq!(
            transitions,
            vec![Transition::Appeared {
                key: "a".to_string(),
                value: Pending
            }]
        );
        assert_eq!(state.get("a"), Some(&Pending));
    }

    #[test]
    fn test_changed_value_carries_old_and_new() {
        let mut state: ObservedState<InstancePhase> =
            [("a".to_string(), Pending)].into_iter().collect();

        let transitions = state.observe(poll(&[("a", Running)]), false);
        assert_eq!(
            transitions,
            vec![Transition::Changed {
                key: "a".to_string(),
                old: Pending,
                new: Running
            }]
        );
    }

    #[test]
    fn test_missing_key_disappears_only_when_reconciling() {
        let mut state = ObservedState::new();
        state.observe(poll(&[("a", Running), ("b", Running)]), false);

        // bring-up style: missing keys are kept
        assert!(state.observe(poll(&[("b", Running)]), false).is_empty());
        assert!(state.contains("a"));

        let transitions = state.observe(poll(&[("b", Running)]), true);
        assert_eq!(
            transitions,
            vec![Transition::Disappeared {
                key: "a".to_string(),
                last: Running
            }]
        );
        assert!(!state.contains("a"));
    }

    #[test]
    fn test_disappeared_key_can_reappear() {
        let mut state = ObservedState::new();
        state.observe(poll(&[("a", Running), ("b", Running)]), true);
        state.observe(poll(&[("b", Running)]), true);

        let transitions = state.observe(poll(&[("a", Pending), ("b", Running)]), true);
        assert_eq!(
            transitions,
            vec![Transition::Appeared {
                key: "a".to_string(),
                value: Pending
            }]
        );
    }

    #[test]
    fn test_empty_poll_keeps_state() {
        let mut state = ObservedState::<InstancePhase>::new();
        assert!(state.observe(Vec::new(), true).is_empty());
        assert!(state.is_empty());

        state.observe(poll(&[("a", Running)]), true);
        assert!(state.observe(Vec::new(), true).is_empty());
        assert_eq!(state.get("a"), Some(&Running));
    }

    #[test]
    fn test_duplicate_keys_last_write_wins() {
        let mut state = ObservedState::new();
        let transitions = state.observe(poll(&[("a", Pending), ("b", Pending), ("a", Running)]), true);

        assert_eq!(
            transitions,
            vec![
                Transition::Appeared {
                    key: "a".to_string(),
                    value: Running
                },
                Transition::Appeared {
                    key: "b".to_string(),
                    value: Pending
                },
            ]
        );
        assert_eq!(state.get("a"), Some(&Running));
    }

    #[test]
    fn test_oscillation_is_not_debounced() {
        let mut state = ObservedState::new();
        state.observe(poll(&[("a", Running)]), true);

        assert_eq!(state.observe(poll(&[("a", Stopped)]), true).len(), 1);
        assert_eq!(state.observe(poll(&[("a", Running)]), true).len(), 1);
        assert_eq!(state.observe(poll(&[("a", Stopped)]), true).len(), 1);
    }

    #[test]
    fn test_three_poll_scenario() {
        let mut state = ObservedState::new();

        assert_eq!(
            state.observe(poll(&[("A", Pending)]), false),
            vec![Transition::Appeared {
                key: "A".to_string(),
                value: Pending
            }]
        );

        assert_eq!(
            state.observe(poll(&[("A", Running), ("B", Pending)]), false),
            vec![
                Transition::Changed {
                    key: "A".to_string(),
                    old: Pending,
                    new: Running
                },
                Transition::Appeared {
                    key: "B".to_string(),
                    value: Pending
                },
            ]
        );

        assert_eq!(
            state.observe(poll(&[("B", Running)]), true),
            vec![
                Transition::Changed {
                    key: "B".to_string(),
                    old: Pending,
                    new: Running
                },
                Transition::Disappeared {
                    key: "A".to_string(),
                    last: Running
                },
            ]
        );
    }
}
