//! Per-step knob override store.
//!
//! Values are raw strings and every write is live for its step. No
//! classification is stored here; see [`crate::validation`] and
//! [`crate::filter`] for the derived views.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::error::{RecipeError, Result};

/// Sparse `knob name -> raw value` map for one step.
pub type OverrideMap = BTreeMap<String, String>;

/// Shallow overwrite: keys in `fragment` replace those in `target`, all
/// other keys in `target` are preserved. Returns the number of keys written.
pub fn merge_into(target: &mut OverrideMap, fragment: &OverrideMap) -> usize {
    for (key, value) in fragment {
        target.insert(key.clone(), value.clone());
    }
    fragment.len()
}

/// Override maps keyed by workflow step id.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct OverrideStore {
    steps: BTreeMap<String, OverrideMap>,
}

impl OverrideStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_steps(steps: BTreeMap<String, OverrideMap>) -> Self {
        Self { steps }
    }

    /// Overrides for a step, if any were ever written.
    pub fn get(&self, step_id: &str) -> Option<&OverrideMap> {
        self.steps.get(step_id)
    }

    /// Overrides for a step, empty when none exist.
    pub fn overrides(&self, step_id: &str) -> OverrideMap {
        self.steps.get(step_id).cloned().unwrap_or_default()
    }

    pub fn steps(&self) -> impl Iterator<Item = (&String, &OverrideMap)> {
        self.steps.iter()
    }

    fn entry(&mut self, step_id: &str) -> &mut OverrideMap {
        self.steps.entry(step_id.to_string()).or_default()
    }

    /// Write one value, returning the previous value for the key.
    pub fn set(&mut self, step_id: &str, key: &str, value: &str) -> Result<Option<String>> {
        if key.trim().is_empty() {
            return Err(RecipeError::EmptyKnobName);
        }
        Ok(self.entry(step_id).insert(key.to_string(), value.to_string()))
    }

    pub fn remove(&mut self, step_id: &str, key: &str) -> Option<String> {
        self.steps.get_mut(step_id)?.remove(key)
    }

    /// Replace a step's whole map, as an editor does on save.
    pub fn replace(&mut self, step_id: &str, overrides: OverrideMap) -> Result<()> {
        if overrides.keys().any(|k| k.trim().is_empty()) {
            return Err(RecipeError::EmptyKnobName);
        }
        self.steps.insert(step_id.to_string(), overrides);
        Ok(())
    }

    /// Shallow-merge a fragment into one step.
    pub fn merge(&mut self, step_id: &str, fragment: &OverrideMap) -> usize {
        merge_into(self.entry(step_id), fragment)
    }

    /// Shallow-merge the same fragment into every target step. Each target
    /// is an independent merge.
    pub fn copy(&mut self, fragment: &OverrideMap, target_step_ids: &[String]) -> usize {
        target_step_ids
            .iter()
            .map(|target| self.merge(target, fragment))
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(pairs: &[(&str, &str)]) -> OverrideMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn copy_preserves_untouched_keys() {
        let mut store = OverrideStore::new();
        store.set("test-a", "X", "9").expect("set");

        store.copy(&map(&[("Y", "1")]), &["test-a".to_string()]);

        assert_eq!(store.overrides("test-a"), map(&[("X", "9"), ("Y", "1")]));
    }

    #[test]
    fn copy_overwrites_shared_keys_in_every_target() {
        let mut store = OverrideStore::new();
        store.set("a", "K", "old").expect("set");
        store.set("b", "K", "older").expect("set");

        let written = store.copy(&map(&[("K", "new")]), &["a".to_string(), "b".to_string()]);

        assert_eq!(written, 2);
        assert_eq!(store.overrides("a")["K"], "new");
        assert_eq!(store.overrides("b")["K"], "new");
    }

    #[test]
    fn empty_value_is_a_real_entry() {
        let mut store = OverrideStore::new();
        store.set("build", "Knob", "").expect("set");
        assert_eq!(store.overrides("build").get("Knob").map(String::as_str), Some(""));
    }

    #[test]
    fn empty_key_rejected() {
        let mut store = OverrideStore::new();
        assert!(matches!(
            store.set("build", "  ", "1"),
            Err(RecipeError::EmptyKnobName)
        ));
        assert!(store.replace("build", map(&[("", "1")])).is_err());
        assert!(store.get("build").is_none());
    }

    #[test]
    fn remove_and_set_report_previous_values() {
        let mut store = OverrideStore::new();
        assert_eq!(store.set("s", "A", "1").expect("set"), None);
        assert_eq!(store.set("s", "A", "2").expect("set"), Some("1".to_string()));
        assert_eq!(store.remove("s", "A"), Some("2".to_string()));
        assert_eq!(store.remove("missing", "A"), None);
    }

    #[test]
    fn steps_are_independent() {
        let mut store = OverrideStore::new();
        store.merge("a", &map(&[("K", "1")]));
        assert!(store.overrides("b").is_empty());
    }
}
