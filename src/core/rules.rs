//! Rule and settings data model.
//!
//! A [`RuleSet`] is an ordered collection of at most [`MAX_RULES`] rules.
//! Editing keeps dense-prefix semantics at the boundary: setting an empty
//! process name at index `i` terminates the list there.

use serde::Serialize;

use crate::config::{DEFAULT_PERIOD_SECS, MAX_PROCESS_NAME_LEN, MAX_RULES};
use crate::error::EngineError;

/// One enforcement rule: pin every process named `process_name` onto the
/// CPUs selected by `affinity_mask`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rule {
    /// Exact, case-sensitive executable name (at most 63 characters).
    pub process_name: String,
    /// One bit per logical CPU; never zero.
    pub affinity_mask: u32,
    /// Transient: whether the last enforcement tick applied the mask to
    /// every matching process. Reset on Stop, never persisted.
    #[serde(skip)]
    pub applied: bool,
}

impl Rule {
    pub fn new(process_name: impl Into<String>, affinity_mask: u32) -> Self {
        Rule {
            process_name: truncate_name(process_name.into()),
            affinity_mask,
            applied: false,
        }
    }
}

/// Global engine settings, persisted as independent scalar keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Settings {
    /// Enforcement poll period in seconds (0..=99). Zero means a single
    /// immediate pass per Start.
    pub poll_period_secs: u32,
    /// Start enforcement at launch without surfacing any UI.
    pub silent_start: bool,
    /// Register for elevated auto-start; acted on by an external
    /// task-registration collaborator, stored here only.
    pub auto_start: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            poll_period_secs: DEFAULT_PERIOD_SECS,
            silent_start: false,
            auto_start: false,
        }
    }
}

/// Ordered collection of at most [`MAX_RULES`] rules.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    pub fn new() -> Self {
        RuleSet::default()
    }

    /// Builds a set from already-validated rules. Capacity is the caller's
    /// contract; anything past [`MAX_RULES`] is dropped.
    pub fn from_rules(mut rules: Vec<Rule>) -> Self {
        rules.truncate(MAX_RULES);
        RuleSet { rules }
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Rule> {
        self.rules.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter()
    }

    /// Edits the rule at `index`. An empty name truncates the list at that
    /// index (dense-prefix semantics); `index == len` appends; `index > len`
    /// or `index >= MAX_RULES` is rejected.
    pub fn set(&mut self, index: usize, name: &str, mask: u32) -> Result<(), EngineError> {
        if name.is_empty() {
            if index > self.rules.len() {
                return Err(EngineError::BadIndex(index));
            }
            self.rules.truncate(index);
            return Ok(());
        }

        if index >= MAX_RULES || index > self.rules.len() {
            return Err(EngineError::BadIndex(index));
        }

        let rule = Rule::new(name, mask);
        if index == self.rules.len() {
            self.rules.push(rule);
        } else {
            // Editing in place preserves the slot's applied flag lifetime
            // semantics: a changed rule has not been applied yet.
            self.rules[index] = rule;
        }
        Ok(())
    }

    /// Copies out the (index, name, mask) targets for one enforcement pass.
    pub fn targets(&self) -> Vec<(usize, String, u32)> {
        self.rules
            .iter()
            .enumerate()
            .map(|(i, r)| (i, r.process_name.clone(), r.affinity_mask))
            .collect()
    }

    pub fn set_applied(&mut self, index: usize, applied: bool) {
        if let Some(rule) = self.rules.get_mut(index) {
            rule.applied = applied;
        }
    }

    /// Resets every rule's transient applied flag, as Stop requires.
    pub fn clear_applied(&mut self) {
        for rule in &mut self.rules {
            rule.applied = false;
        }
    }
}

fn truncate_name(mut name: String) -> String {
    if name.chars().count() > MAX_PROCESS_NAME_LEN {
        name = name.chars().take(MAX_PROCESS_NAME_LEN).collect();
    }
    name
}
