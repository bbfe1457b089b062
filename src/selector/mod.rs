//! PresetSelector - the selector widget's core.
//!
//! Composes the store, the filter and the row synchronizer around a host view
//! and scheduler. Every mutation that dirties a preset queues it for the single
//! deferred pass; filter changes and bulk removals resync the whole view at once.
//!
//! Everything runs on the UI thread. Clones of a selector share state, and the
//! deferred callback only holds a weak reference, so it turns into a no-op once
//! the selector is shut down or dropped.
//!
//! Slot values leave the store before they are dropped, and the drop happens
//! with the state unborrowed. An object finalizer may therefore read the
//! selector; it sees the record still present and the slot already gone.
//!
//! ## Example
//!
//! ```
//! use preset_registry::{IdleQueue, InMemoryView, PresetSelector, SelectorConfig, SlotRole, View};
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! let view = Rc::new(RefCell::new(InMemoryView::new(0)));
//! let queue = IdleQueue::new();
//! let selector =
//!     PresetSelector::new(SelectorConfig::default(), view.clone(), Rc::new(queue.clone())).unwrap();
//!
//! let id = selector.create();
//! selector.set_role(id, SlotRole::Comment, "hello");
//! assert_eq!(view.borrow().row_count(), 0);
//!
//! queue.run_pending();
//! let row = view.borrow().find_row_by_hidden_id(id).unwrap();
//! assert_eq!(view.borrow().text(row, 1), Some("hello"));
//! ```

mod hooks;

use std::cell::RefCell;
use std::collections::BTreeSet;
use std::rc::{Rc, Weak};
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::{debug, trace, warn};

use crate::config::{ConfigError, SelectorConfig, SlotRole};
use crate::filter::PresetFilter;
use crate::image::{ImagePipeline, RawBitmap};
use crate::error::RegistryError;
use crate::preset::PresetId;
use crate::scheduler::Scheduler;
use crate::slot::{SharedObject, SlotKind, SlotValue};
use crate::snapshot::PresetSnapshot;
use crate::store::{PresetStore, SlotWrite};
use crate::sync::{RowSynchronizer, SyncReport};
use crate::view::{ColumnKind, View};

pub use hooks::{AddHandler, PresetHandler, RemoveHandler};
use hooks::Hooks;

struct SelectorState {
    config: SelectorConfig,
    store: PresetStore,
    filter: PresetFilter,
    sync: RowSynchronizer,
    view: Rc<RefCell<dyn View>>,
    alive: bool,
    /// Presets whose remove handler is running.
    removing: BTreeSet<PresetId>,
}

impl SelectorState {
    fn run_deferred(&mut self) -> SyncReport {
        let SelectorState {
            store,
            filter,
            sync,
            view,
            ..
        } = self;
        let mut view = view.borrow_mut();
        sync.run_deferred(store, filter, &mut *view)
    }

    fn full_resync(&mut self) -> SyncReport {
        let SelectorState {
            store,
            filter,
            sync,
            view,
            ..
        } = self;
        let mut view = view.borrow_mut();
        sync.full_resync(store, filter, &mut *view)
    }
}

#[derive(Clone)]
pub struct PresetSelector {
    state: Rc<RefCell<SelectorState>>,
    hooks: Rc<RefCell<Hooks>>,
    scheduler: Rc<dyn Scheduler>,
}

impl PresetSelector {
    pub fn new(
        config: SelectorConfig,
        view: Rc<RefCell<dyn View>>,
        scheduler: Rc<dyn Scheduler>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let state = SelectorState {
            store: PresetStore::with_policy(config.id_policy),
            filter: PresetFilter::new(),
            sync: RowSynchronizer::from_config(&config),
            view,
            config,
            alive: true,
            removing: BTreeSet::new(),
        };
        Ok(PresetSelector {
            state: Rc::new(RefCell::new(state)),
            hooks: Rc::new(RefCell::new(Hooks::default())),
            scheduler,
        })
    }

    pub fn config(&self) -> SelectorConfig {
        self.state.borrow().config.clone()
    }

    /// Name of the slot currently playing `role`.
    pub fn slot_name(&self, role: SlotRole) -> String {
        self.state.borrow().config.slot_names.name(role).to_string()
    }

    /// Read-only access to the store.
    pub fn with_store<R>(&self, f: impl FnOnce(&PresetStore) -> R) -> R {
        f(&self.state.borrow().store)
    }

    pub fn is_alive(&self) -> bool {
        self.state.borrow().alive
    }

    // ------------------------------------------------------------------------
    // Store operations
    // ------------------------------------------------------------------------

    /// Create a preset, stamping its creation time when configured to.
    pub fn create(&self) -> PresetId {
        let id = {
            let mut state = self.state.borrow_mut();
            let id = state.store.create();
            if state.config.stamp_creation_time {
                let slot = state.config.slot_names.creation_time.clone();
                let _ = state.store.set_slot(id, &slot, unix_seconds());
            }
            id
        };
        self.schedule_dirty();
        id
    }

    pub fn has(&self, id: PresetId) -> bool {
        self.state.borrow().store.has(id)
    }

    /// Write a slot. Returns false if the preset does not exist.
    pub fn set_slot(&self, id: PresetId, name: &str, value: impl Into<SlotValue>) -> bool {
        match self.write_slot(id, name, value.into()) {
            Ok(_) => {
                self.schedule_dirty();
                true
            }
            Err(e) => {
                debug!(error = %e, slot = name, "slot write ignored");
                false
            }
        }
    }

    pub fn set_role(&self, id: PresetId, role: SlotRole, value: impl Into<SlotValue>) -> bool {
        let name = self.slot_name(role);
        self.set_slot(id, &name, value)
    }

    /// A copy of the slot value. Object slots come back as a new strong reference.
    pub fn slot(&self, id: PresetId, name: &str) -> Option<SlotValue> {
        self.state.borrow().store.slot(id, name).cloned()
    }

    pub fn int_slot(&self, id: PresetId, name: &str) -> i64 {
        self.state.borrow().store.int_slot(id, name)
    }

    pub fn double_slot(&self, id: PresetId, name: &str) -> f64 {
        self.state.borrow().store.double_slot(id, name)
    }

    pub fn string_slot(&self, id: PresetId, name: &str) -> String {
        self.state.borrow().store.string_slot(id, name).to_string()
    }

    pub fn object_slot(&self, id: PresetId, name: &str) -> Option<SharedObject> {
        self.state.borrow().store.object_slot(id, name)
    }

    fn slot_kind(&self, id: PresetId, name: &str) -> Option<SlotKind> {
        self.state.borrow().store.slot(id, name).map(SlotValue::kind)
    }

    /// String value of a role slot, empty when unset.
    pub fn role_string(&self, id: PresetId, role: SlotRole) -> String {
        let state = self.state.borrow();
        let name = state.config.slot_names.name(role);
        state.store.string_slot(id, name).to_string()
    }

    /// Remove a slot. Returns whether it existed.
    pub fn delete_slot(&self, id: PresetId, name: &str) -> bool {
        let result = self.state.borrow_mut().store.take_slot(id, name);
        match result {
            Ok(old) => {
                let existed = old.is_some();
                drop(old);
                self.schedule_dirty();
                existed
            }
            Err(e) => {
                debug!(error = %e, slot = name, "slot delete ignored");
                false
            }
        }
    }

    /// Remove one preset after asking the remove handler. Returns whether it was removed.
    ///
    /// A handler that removes the preset itself is not asked a second time.
    pub fn remove(&self, id: PresetId) -> bool {
        if !self.has(id) {
            debug!(preset = %id, "remove of unknown preset ignored");
            return false;
        }
        let ask = self.state.borrow_mut().removing.insert(id);
        if ask {
            let allowed = self.ask_remove(id);
            self.state.borrow_mut().removing.remove(&id);
            if !allowed {
                debug!(preset = %id, "removal vetoed");
                return false;
            }
        } else {
            trace!(preset = %id, "remove from within its own remove handler");
        }
        // Either removes it here or finds the handler already did.
        self.release_and_remove(id);
        self.schedule_dirty();
        true
    }

    /// Remove every selected preset the remove handler agrees to. Returns how many went.
    pub fn remove_selected(&self) -> usize {
        self.selected()
            .into_iter()
            .filter(|id| self.remove(*id))
            .count()
    }

    pub fn remove_all(&self) -> usize {
        let ids: Vec<PresetId> = self.state.borrow().store.ids().collect();
        self.release_slots_of(&ids);
        let removed = {
            let mut state = self.state.borrow_mut();
            let removed = state.store.remove_all();
            state.store.take_dirty();
            removed
        };
        self.request_full_resync();
        removed
    }

    pub fn remove_all_in_group(&self, group: &str) -> usize {
        let ids = {
            let state = self.state.borrow();
            state
                .store
                .ids_where(state.config.slot_names.name(SlotRole::Group), group)
        };
        self.release_slots_of(&ids);
        let removed = {
            let mut state = self.state.borrow_mut();
            let removed = ids
                .iter()
                .filter(|id| state.store.remove(**id).is_ok())
                .count();
            state.store.take_dirty();
            removed
        };
        debug!(removed, group, "group removed");
        self.request_full_resync();
        removed
    }

    /// Detach a slot value under the borrow and drop it after the borrow ends.
    fn write_slot(
        &self,
        id: PresetId,
        name: &str,
        value: SlotValue,
    ) -> Result<SlotWrite, RegistryError> {
        let displaced = {
            let mut state = self.state.borrow_mut();
            let same = state.store.slot(id, name).map(|current| current.same_as(&value));
            match same {
                Some(true) => return Ok(SlotWrite::Unchanged),
                Some(false) => state.store.take_slot(id, name)?,
                None => None,
            }
        };
        drop(displaced);
        self.state.borrow_mut().store.set_slot(id, name, value)
    }

    fn release_slots_of(&self, ids: &[PresetId]) {
        for id in ids {
            let released = self.state.borrow_mut().store.take_slots(*id);
            drop(released);
        }
    }

    fn release_and_remove(&self, id: PresetId) {
        self.release_slots_of(&[id]);
        let removed = self.state.borrow_mut().store.remove(id);
        if let Err(e) = removed {
            trace!(error = %e, "preset already gone");
        }
    }

    pub fn count(&self) -> usize {
        self.state.borrow().store.count()
    }

    pub fn count_in_group(&self, group: &str) -> usize {
        let state = self.state.borrow();
        state
            .store
            .count_where(state.config.slot_names.name(SlotRole::Group), group)
    }

    pub fn nth_id(&self, index: usize) -> Option<PresetId> {
        self.state.borrow().store.nth_id(index)
    }

    pub fn nth_in_group(&self, index: usize, group: &str) -> Option<PresetId> {
        let state = self.state.borrow();
        state
            .store
            .nth_id_where(index, state.config.slot_names.name(SlotRole::Group), group)
    }

    /// Distinct group values in first-seen order.
    pub fn groups(&self) -> Vec<String> {
        let state = self.state.borrow();
        state
            .store
            .distinct_values(state.config.slot_names.name(SlotRole::Group))
    }

    // ------------------------------------------------------------------------
    // Filtering
    // ------------------------------------------------------------------------

    /// Set or clear the constraint on `slot` and resync the view if it changed.
    pub fn set_constraint(&self, slot: &str, pattern: Option<&str>) {
        let changed = self.state.borrow_mut().filter.set_constraint(slot, pattern);
        if changed {
            self.request_full_resync();
        }
    }

    pub fn set_constraint_mode(&self, slot: &str, is_regex: bool) {
        let changed = self
            .state
            .borrow_mut()
            .filter
            .set_constraint_mode(slot, is_regex);
        if changed {
            self.request_full_resync();
        }
    }

    /// Show only `group` (`None` shows every group).
    pub fn set_group_filter(&self, group: Option<&str>) {
        let slot = self.slot_name(SlotRole::Group);
        self.set_constraint(&slot, group);
    }

    pub fn clear_filter(&self) {
        let changed = self.state.borrow_mut().filter.clear();
        if changed {
            self.request_full_resync();
        }
    }

    pub fn is_visible(&self, id: PresetId) -> bool {
        let state = self.state.borrow();
        state
            .store
            .get(id)
            .is_some_and(|preset| state.filter.is_visible(preset))
    }

    /// Read-only access to the filter, e.g. to report a malformed pattern.
    pub fn with_filter<R>(&self, f: impl FnOnce(&PresetFilter) -> R) -> R {
        f(&self.state.borrow().filter)
    }

    // ------------------------------------------------------------------------
    // View synchronization
    // ------------------------------------------------------------------------

    /// Queue `id` for the deferred pass, arming the idle callback if needed.
    pub fn request_row_update(&self, id: PresetId) {
        let arm = {
            let mut state = self.state.borrow_mut();
            if !state.alive {
                return;
            }
            state.sync.request_row_update(id)
        };
        if arm {
            let weak = Rc::downgrade(&self.state);
            self.scheduler
                .schedule_idle(Box::new(move || run_deferred(&weak)));
        }
    }

    /// Reconcile the whole view now.
    pub fn request_full_resync(&self) -> SyncReport {
        let mut state = self.state.borrow_mut();
        if !state.alive {
            return SyncReport::default();
        }
        state.full_resync()
    }

    /// Whether a deferred pass is armed and has not run yet.
    pub fn has_pending_sync(&self) -> bool {
        self.state.borrow().sync.is_armed()
    }

    /// Stop synchronizing. An armed deferred pass will do nothing when it fires.
    pub fn shutdown(&self) {
        let mut state = self.state.borrow_mut();
        state.alive = false;
        state.sync.reset();
        debug!("preset selector shut down");
    }

    fn schedule_dirty(&self) {
        let dirty = self.state.borrow_mut().store.take_dirty();
        for id in dirty {
            self.request_row_update(id);
        }
    }

    // ------------------------------------------------------------------------
    // Command surface
    // ------------------------------------------------------------------------

    /// The "add" gesture.
    pub fn add(&self) {
        if !self.fire_add() {
            self.create();
        }
    }

    /// The "apply" gesture. Returns false for unknown ids.
    pub fn apply(&self, id: PresetId) -> bool {
        if !self.has(id) {
            return false;
        }
        self.fire_apply(id);
        true
    }

    /// The "update" gesture. Returns false for unknown ids.
    pub fn update(&self, id: PresetId) -> bool {
        if !self.has(id) {
            return false;
        }
        self.fire_update(id);
        true
    }

    /// Apply a user edit of `column` to the bound slot, then notify the change handler.
    ///
    /// Returns false when the column is not editable, the preset is unknown, or a
    /// numeric column receives text that is not a number.
    pub fn edit_cell(&self, id: PresetId, column: usize, text: &str) -> bool {
        let target = {
            let state = self.state.borrow();
            state
                .config
                .binding(column)
                .filter(|binding| binding.editable)
                .map(|binding| {
                    (
                        state.config.slot_names.resolve(&binding.slot).to_string(),
                        binding.kind,
                    )
                })
        };
        let Some((slot, kind)) = target else {
            trace!(column, "edit on a column that is not editable");
            return false;
        };

        let value = match kind {
            ColumnKind::Text => SlotValue::from(text),
            ColumnKind::Numeric => match parse_number(text, self.slot_kind(id, &slot)) {
                Some(value) => value,
                None => {
                    debug!(column, text, "numeric cell edit rejected");
                    return false;
                }
            },
            ColumnKind::Image => return false,
        };

        match self.write_slot(id, &slot, value) {
            Ok(SlotWrite::Changed) => {
                self.schedule_dirty();
                self.fire_preset_changed(id);
                true
            }
            Ok(SlotWrite::Unchanged) => {
                self.schedule_dirty();
                true
            }
            Err(e) => {
                debug!(error = %e, column, "cell edit ignored");
                false
            }
        }
    }

    /// Ids of the rows currently selected in the view.
    pub fn selected(&self) -> BTreeSet<PresetId> {
        let view = Rc::clone(&self.state.borrow().view);
        let selected = view.borrow().selected_ids();
        selected
    }

    /// Store thumbnail and screenshot images rendered from `bitmap`.
    pub fn set_images(
        &self,
        id: PresetId,
        bitmap: &RawBitmap,
        pipeline: &dyn ImagePipeline,
    ) -> bool {
        if !self.has(id) {
            return false;
        }
        if !bitmap.is_valid() {
            warn!(preset = %id, width = bitmap.width, height = bitmap.height, "bitmap size mismatch");
            return false;
        }
        let Some(images) = pipeline.render(bitmap) else {
            warn!(preset = %id, "image pipeline produced nothing");
            return false;
        };
        self.set_role(id, SlotRole::Thumbnail, images.thumbnail)
            && self.set_role(id, SlotRole::Screenshot, images.screenshot)
    }

    // ------------------------------------------------------------------------
    // Snapshots
    // ------------------------------------------------------------------------

    pub fn snapshot(&self) -> PresetSnapshot {
        PresetSnapshot::capture(&self.state.borrow().store)
    }

    /// Add the snapshot's presets under fresh ids and resync the view.
    pub fn restore(&self, snapshot: PresetSnapshot) -> Vec<PresetId> {
        let ids = {
            let mut state = self.state.borrow_mut();
            let ids = snapshot.restore_into(&mut state.store);
            state.store.take_dirty();
            ids
        };
        self.request_full_resync();
        ids
    }
}

fn run_deferred(state: &Weak<RefCell<SelectorState>>) {
    let Some(state) = state.upgrade() else {
        debug!("deferred row sync fired after the selector was dropped");
        return;
    };
    let mut state = state.borrow_mut();
    if !state.alive {
        debug!("deferred row sync fired after shutdown");
        return;
    }
    state.run_deferred();
}

fn unix_seconds() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

/// Parse a numeric edit, keeping the slot's current numeric type when the text allows it.
fn parse_number(text: &str, current: Option<SlotKind>) -> Option<SlotValue> {
    let text = text.trim();
    if current == Some(SlotKind::Double) {
        return text.parse::<f64>().ok().map(SlotValue::Double);
    }
    if let Ok(value) = text.parse::<i64>() {
        return Some(SlotValue::Int(value));
    }
    let value = text.parse::<f64>().ok()?;
    let integral = value.fract() == 0.0 && value.abs() < i64::MAX as f64;
    if current == Some(SlotKind::Int) && integral {
        return Some(SlotValue::Int(value as i64));
    }
    Some(SlotValue::Double(value))
}
