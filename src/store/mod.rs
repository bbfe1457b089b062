//! PresetStore - in-memory registry of presets keyed by increasing ids.
//!
//! The store owns no UI state. Every mutation that changes what a row would show
//! marks the preset dirty; the synchronizer drains that set with [`PresetStore::take_dirty`].
//!
//! ## Example
//!
//! ```
//! use preset_registry::{PresetStore, SlotWrite};
//!
//! let mut store = PresetStore::new();
//! let id = store.create();
//! assert_eq!(store.set_slot(id, "group", "X").unwrap(), SlotWrite::Changed);
//! assert_eq!(store.set_slot(id, "group", "X").unwrap(), SlotWrite::Unchanged);
//! assert_eq!(store.string_slot(id, "group"), "X");
//! ```

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, trace};

use crate::error::RegistryError;
use crate::preset::{Preset, PresetId};
use crate::slot::{ExternalHandle, SharedObject, SlotKind, SlotValue};

/// What happens to the id counter when every preset is removed at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdCounterPolicy {
    /// Ids are never reused for the lifetime of the store.
    #[default]
    Monotonic,
    /// `remove_all` restarts numbering at zero. `remove_all_where` never does.
    ResetOnClear,
}

/// Outcome of a slot write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotWrite {
    /// The slot already held an identical value; nothing was touched.
    Unchanged,
    /// The value was replaced and the preset marked dirty.
    Changed,
}

impl SlotWrite {
    pub fn is_changed(self) -> bool {
        self == SlotWrite::Changed
    }
}

pub struct PresetStore {
    presets: BTreeMap<PresetId, Preset>,
    next_id: PresetId,
    policy: IdCounterPolicy,
    dirty: BTreeSet<PresetId>,
}

impl Default for PresetStore {
    fn default() -> Self {
        Self::new()
    }
}

impl PresetStore {
    pub fn new() -> Self {
        Self::with_policy(IdCounterPolicy::default())
    }

    pub fn with_policy(policy: IdCounterPolicy) -> Self {
        PresetStore {
            presets: BTreeMap::new(),
            next_id: PresetId::new(0),
            policy,
            dirty: BTreeSet::new(),
        }
    }

    pub fn policy(&self) -> IdCounterPolicy {
        self.policy
    }

    /// The id the next `create` will hand out.
    pub fn peek_next_id(&self) -> PresetId {
        self.next_id
    }

    /// Insert an empty preset and return its id.
    pub fn create(&mut self) -> PresetId {
        let id = self.next_id;
        self.next_id = id.next();
        self.presets.insert(id, Preset::new(id));
        self.dirty.insert(id);
        debug!(preset = %id, "preset created");
        id
    }

    pub fn has(&self, id: PresetId) -> bool {
        self.presets.contains_key(&id)
    }

    pub fn get(&self, id: PresetId) -> Option<&Preset> {
        self.presets.get(&id)
    }

    /// Presets in creation order.
    pub fn iter(&self) -> impl Iterator<Item = &Preset> {
        self.presets.values()
    }

    pub fn ids(&self) -> impl Iterator<Item = PresetId> + '_ {
        self.presets.keys().copied()
    }

    /// Write a slot. Re-writing an identical value is a no-op and does not mark the preset dirty.
    ///
    /// The displaced value is released before the new one is stored.
    pub fn set_slot(
        &mut self,
        id: PresetId,
        name: &str,
        value: impl Into<SlotValue>,
    ) -> Result<SlotWrite, RegistryError> {
        let value = value.into();
        let preset = self.presets.get_mut(&id).ok_or_else(|| {
            trace!(preset = %id, slot = name, "set_slot on unknown preset");
            RegistryError::UnknownPreset(id)
        })?;

        if preset.slot(name).is_some_and(|current| current.same_as(&value)) {
            return Ok(SlotWrite::Unchanged);
        }

        drop(preset.take_slot(name));
        preset.insert_slot(name, value);
        self.dirty.insert(id);
        Ok(SlotWrite::Changed)
    }

    pub fn slot(&self, id: PresetId, name: &str) -> Option<&SlotValue> {
        self.presets.get(&id).and_then(|p| p.slot(name))
    }

    /// Remove a slot. Returns whether it existed.
    pub fn delete_slot(&mut self, id: PresetId, name: &str) -> Result<bool, RegistryError> {
        Ok(self.take_slot(id, name)?.is_some())
    }

    /// Detach a slot and hand its value to the caller, who decides when it is released.
    pub fn take_slot(
        &mut self,
        id: PresetId,
        name: &str,
    ) -> Result<Option<SlotValue>, RegistryError> {
        let preset = self
            .presets
            .get_mut(&id)
            .ok_or(RegistryError::UnknownPreset(id))?;

        let taken = preset.take_slot(name);
        if taken.is_some() {
            self.dirty.insert(id);
        }
        Ok(taken)
    }

    /// Detach every slot of the preset. The record stays, empty, until it is removed.
    pub fn take_slots(&mut self, id: PresetId) -> Result<Vec<SlotValue>, RegistryError> {
        let preset = self
            .presets
            .get_mut(&id)
            .ok_or(RegistryError::UnknownPreset(id))?;

        let taken = preset.take_slots();
        if !taken.is_empty() {
            self.dirty.insert(id);
        }
        Ok(taken)
    }

    /// Release every slot of the preset, then drop the record.
    pub fn remove(&mut self, id: PresetId) -> Result<(), RegistryError> {
        let preset = self
            .presets
            .get_mut(&id)
            .ok_or(RegistryError::UnknownPreset(id))?;
        preset.release_slots();
        self.presets.remove(&id);
        self.dirty.insert(id);
        debug!(preset = %id, "preset removed");
        Ok(())
    }

    /// Remove every preset. Returns how many were removed.
    pub fn remove_all(&mut self) -> usize {
        for preset in self.presets.values_mut() {
            preset.release_slots();
        }
        let removed = self.presets.len();
        let ids: Vec<PresetId> = self.presets.keys().copied().collect();
        self.presets.clear();
        self.dirty.extend(ids);

        if self.policy == IdCounterPolicy::ResetOnClear {
            self.next_id = PresetId::new(0);
        }
        debug!(removed, policy = ?self.policy, "all presets removed");
        removed
    }

    /// Remove every preset whose `slot` holds the string `value`.
    pub fn remove_all_where(&mut self, slot: &str, value: &str) -> usize {
        let ids = self.ids_where(slot, value);

        for id in &ids {
            if let Some(preset) = self.presets.get_mut(id) {
                preset.release_slots();
            }
        }
        for id in &ids {
            self.presets.remove(id);
            self.dirty.insert(*id);
        }
        debug!(removed = ids.len(), slot, value, "presets removed by slot value");
        ids.len()
    }

    /// Ids of presets whose `slot` holds the string `value`, in creation order.
    pub fn ids_where(&self, slot: &str, value: &str) -> Vec<PresetId> {
        self.presets
            .values()
            .filter(|p| p.string_equals(slot, value))
            .map(Preset::id)
            .collect()
    }

    pub fn count(&self) -> usize {
        self.presets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.presets.is_empty()
    }

    pub fn count_where(&self, slot: &str, value: &str) -> usize {
        self.presets
            .values()
            .filter(|p| p.string_equals(slot, value))
            .count()
    }

    /// The id at `index` in creation order. Only stable until the next insert or removal.
    pub fn nth_id(&self, index: usize) -> Option<PresetId> {
        self.presets.keys().nth(index).copied()
    }

    pub fn nth_id_where(&self, index: usize, slot: &str, value: &str) -> Option<PresetId> {
        self.presets
            .values()
            .filter(|p| p.string_equals(slot, value))
            .nth(index)
            .map(Preset::id)
    }

    /// Distinct string values of `slot`, in the order they are first seen.
    pub fn distinct_values(&self, slot: &str) -> Vec<String> {
        let mut seen = Vec::new();
        for preset in self.presets.values() {
            if let Some(value) = preset.string(slot) {
                if !seen.iter().any(|v: &String| v == value) {
                    seen.push(value.to_string());
                }
            }
        }
        seen
    }

    // ------------------------------------------------------------------------
    // Dirty tracking
    // ------------------------------------------------------------------------

    pub fn is_dirty(&self, id: PresetId) -> bool {
        self.dirty.contains(&id)
    }

    /// Force a preset to be reconciled again. Returns false for unknown ids.
    pub fn mark_dirty(&mut self, id: PresetId) -> bool {
        if self.has(id) {
            self.dirty.insert(id);
            true
        } else {
            false
        }
    }

    /// Drain the dirty set, in id order. Removed ids are included.
    pub fn take_dirty(&mut self) -> Vec<PresetId> {
        std::mem::take(&mut self.dirty).into_iter().collect()
    }

    // ------------------------------------------------------------------------
    // Typed accessors: absent or mistyped slots read as the type's empty value.
    // ------------------------------------------------------------------------

    pub fn int_slot(&self, id: PresetId, name: &str) -> i64 {
        self.slot(id, name).and_then(SlotValue::as_int).unwrap_or(0)
    }

    pub fn double_slot(&self, id: PresetId, name: &str) -> f64 {
        self.slot(id, name)
            .and_then(SlotValue::as_double)
            .unwrap_or(0.0)
    }

    pub fn string_slot(&self, id: PresetId, name: &str) -> &str {
        self.slot(id, name).and_then(SlotValue::as_str).unwrap_or("")
    }

    pub fn pointer_slot(&self, id: PresetId, name: &str) -> Option<ExternalHandle> {
        self.slot(id, name).and_then(SlotValue::as_pointer)
    }

    /// A new strong reference to the slot's object.
    pub fn object_slot(&self, id: PresetId, name: &str) -> Option<SharedObject> {
        self.slot(id, name).and_then(SlotValue::as_object).cloned()
    }

    // ------------------------------------------------------------------------
    // Strict accessors: `Ok(None)` when the slot is absent, an error when mistyped.
    // ------------------------------------------------------------------------

    pub fn try_int(&self, id: PresetId, name: &str) -> Result<Option<i64>, RegistryError> {
        self.typed(id, name, SlotKind::Int, SlotValue::as_int)
    }

    pub fn try_double(&self, id: PresetId, name: &str) -> Result<Option<f64>, RegistryError> {
        self.typed(id, name, SlotKind::Double, SlotValue::as_double)
    }

    pub fn try_string(&self, id: PresetId, name: &str) -> Result<Option<String>, RegistryError> {
        self.typed(id, name, SlotKind::String, |v| v.as_str().map(str::to_string))
    }

    fn typed<T>(
        &self,
        id: PresetId,
        name: &str,
        expected: SlotKind,
        read: impl Fn(&SlotValue) -> Option<T>,
    ) -> Result<Option<T>, RegistryError> {
        let preset = self.get(id).ok_or(RegistryError::UnknownPreset(id))?;
        match preset.slot(name) {
            None => Ok(None),
            Some(value) => read(value).map(Some).ok_or_else(|| RegistryError::InvalidSlotType {
                slot: name.to_string(),
                expected,
                actual: value.kind(),
            }),
        }
    }
}
