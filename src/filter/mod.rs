//! PresetFilter - predicate state over per-slot constraints.
//!
//! A preset is visible when it satisfies every active constraint. Constraints
//! are set from live text entry, so a pattern that fails to compile is kept and
//! simply never matches.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{trace, warn};

use crate::error::RegistryError;
use crate::preset::Preset;

/// A constraint on one string slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterConstraint {
    pub slot: String,
    pub pattern: String,
    #[serde(default)]
    pub is_regex: bool,
}

impl FilterConstraint {
    pub fn exact(slot: impl Into<String>, pattern: impl Into<String>) -> Self {
        FilterConstraint {
            slot: slot.into(),
            pattern: pattern.into(),
            is_regex: false,
        }
    }

    pub fn regex(slot: impl Into<String>, pattern: impl Into<String>) -> Self {
        FilterConstraint {
            slot: slot.into(),
            pattern: pattern.into(),
            is_regex: true,
        }
    }
}

#[derive(Debug)]
enum Matcher {
    Exact,
    Search(Regex),
    Invalid(String),
}

#[derive(Debug)]
struct ActiveConstraint {
    constraint: FilterConstraint,
    matcher: Matcher,
}

impl ActiveConstraint {
    fn compile(constraint: FilterConstraint) -> Self {
        let matcher = if constraint.is_regex {
            match Regex::new(&constraint.pattern) {
                Ok(regex) => Matcher::Search(regex),
                Err(e) => {
                    warn!(
                        slot = %constraint.slot,
                        pattern = %constraint.pattern,
                        error = %e,
                        "filter pattern does not compile; constraint will match nothing"
                    );
                    Matcher::Invalid(e.to_string())
                }
            }
        } else {
            Matcher::Exact
        };
        ActiveConstraint {
            constraint,
            matcher,
        }
    }

    fn matches(&self, text: &str) -> bool {
        match &self.matcher {
            Matcher::Exact => text == self.constraint.pattern,
            Matcher::Search(regex) => regex.is_match(text),
            Matcher::Invalid(_) => false,
        }
    }

    fn error(&self) -> Option<RegistryError> {
        match &self.matcher {
            Matcher::Invalid(message) => Some(RegistryError::FilterEvaluation {
                slot: self.constraint.slot.clone(),
                pattern: self.constraint.pattern.clone(),
                message: message.clone(),
            }),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
pub struct PresetFilter {
    active: BTreeMap<String, ActiveConstraint>,
}

impl PresetFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set, replace (`Some`) or clear (`None`) the constraint on `slot`.
    ///
    /// A new constraint is an exact match. Replacing a pattern keeps the slot's
    /// current mode. Returns whether the filter changed.
    pub fn set_constraint(&mut self, slot: &str, pattern: Option<&str>) -> bool {
        match pattern {
            None => {
                let removed = self.active.remove(slot).is_some();
                if removed {
                    trace!(slot, "filter constraint cleared");
                }
                removed
            }
            Some(pattern) => {
                if self
                    .active
                    .get(slot)
                    .is_some_and(|c| c.constraint.pattern == pattern)
                {
                    return false;
                }
                let constraint = FilterConstraint {
                    slot: slot.to_string(),
                    pattern: pattern.to_string(),
                    is_regex: self.active.get(slot).is_some_and(|c| c.constraint.is_regex),
                };
                trace!(slot, pattern, regex = constraint.is_regex, "filter constraint set");
                self.active
                    .insert(slot.to_string(), ActiveConstraint::compile(constraint));
                true
            }
        }
    }

    /// Install a fully specified constraint.
    pub fn insert(&mut self, constraint: FilterConstraint) {
        let slot = constraint.slot.clone();
        self.active.insert(slot, ActiveConstraint::compile(constraint));
    }

    /// Switch the constraint on `slot` between exact and regex matching.
    ///
    /// The mode belongs to the constraint, so a slot without one is left alone.
    /// Returns whether the constraint changed.
    pub fn set_constraint_mode(&mut self, slot: &str, is_regex: bool) -> bool {
        match self.active.remove(slot) {
            Some(current) if current.constraint.is_regex != is_regex => {
                let mut constraint = current.constraint;
                constraint.is_regex = is_regex;
                self.active
                    .insert(slot.to_string(), ActiveConstraint::compile(constraint));
                true
            }
            Some(current) => {
                self.active.insert(slot.to_string(), current);
                false
            }
            None => false,
        }
    }

    pub fn constraint(&self, slot: &str) -> Option<&FilterConstraint> {
        self.active.get(slot).map(|c| &c.constraint)
    }

    pub fn constraints(&self) -> impl Iterator<Item = &FilterConstraint> {
        self.active.values().map(|c| &c.constraint)
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    /// Drop every constraint.
    pub fn clear(&mut self) -> bool {
        let changed = !self.active.is_empty();
        self.active.clear();
        changed
    }

    /// AND over all constraints. A preset without the constrained string slot fails.
    pub fn is_visible(&self, preset: &Preset) -> bool {
        self.active.values().all(|active| {
            preset
                .string(&active.constraint.slot)
                .is_some_and(|text| active.matches(text))
        })
    }

    /// Compile error of the constraint on `slot`, if it has one.
    pub fn constraint_error(&self, slot: &str) -> Option<RegistryError> {
        self.active.get(slot).and_then(ActiveConstraint::error)
    }

    /// First malformed constraint, if any.
    pub fn validate(&self) -> Result<(), RegistryError> {
        match self.active.values().find_map(ActiveConstraint::error) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}
