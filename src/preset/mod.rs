//! Presets - registry records made of named typed slots.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::slot::SlotValue;

/// Process-unique preset identifier, assigned by the store in increasing order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct PresetId(u64);

impl PresetId {
    pub const fn new(raw: u64) -> Self {
        PresetId(raw)
    }

    pub const fn get(self) -> u64 {
        self.0
    }

    pub(crate) fn next(self) -> Self {
        PresetId(self.0 + 1)
    }
}

impl fmt::Display for PresetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for PresetId {
    fn from(raw: u64) -> Self {
        PresetId(raw)
    }
}

/// A preset record. Slot order is irrelevant.
#[derive(Debug)]
pub struct Preset {
    id: PresetId,
    slots: HashMap<String, SlotValue>,
}

impl Preset {
    pub(crate) fn new(id: PresetId) -> Self {
        Preset {
            id,
            slots: HashMap::new(),
        }
    }

    pub fn id(&self) -> PresetId {
        self.id
    }

    pub fn slot(&self, name: &str) -> Option<&SlotValue> {
        self.slots.get(name)
    }

    /// The slot's text, if it holds a string.
    pub fn string(&self, name: &str) -> Option<&str> {
        self.slots.get(name).and_then(SlotValue::as_str)
    }

    pub fn has_slot(&self, name: &str) -> bool {
        self.slots.contains_key(name)
    }

    pub fn slots(&self) -> impl Iterator<Item = (&str, &SlotValue)> {
        self.slots.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Store `value`, returning the displaced value so the caller decides when it is released.
    pub(crate) fn insert_slot(&mut self, name: &str, value: SlotValue) -> Option<SlotValue> {
        self.slots.insert(name.to_string(), value)
    }

    pub(crate) fn take_slot(&mut self, name: &str) -> Option<SlotValue> {
        self.slots.remove(name)
    }

    /// Detach every slot, leaving the record empty.
    pub(crate) fn take_slots(&mut self) -> Vec<SlotValue> {
        self.slots.drain().map(|(_, value)| value).collect()
    }

    /// Release every slot in place. The record itself stays intact and empty.
    pub(crate) fn release_slots(&mut self) {
        for (_, value) in self.slots.drain() {
            drop(value);
        }
    }

    /// True if `name` holds a string equal to `value`.
    pub(crate) fn string_equals(&self, name: &str, value: &str) -> bool {
        self.string(name) == Some(value)
    }
}

impl Drop for Preset {
    fn drop(&mut self) {
        self.release_slots();
    }
}
