//! RowSynchronizer - keeps one view row per visible preset.
//!
//! Two entry points:
//! - [`RowSynchronizer::request_row_update`] collects ids into a pending set and
//!   tells the caller when the single deferred pass has to be armed.
//! - [`RowSynchronizer::full_resync`] walks the whole store immediately and also
//!   drops rows whose preset no longer exists.
//!
//! Both apply the same reconciliation per preset: insert a row when it became
//! visible, delete it when it stopped being visible, otherwise rewrite the cells
//! that changed in place so the row keeps its identity and position.

use std::any::Any;
use std::collections::{BTreeSet, HashMap};
use std::rc::Weak;
use tracing::{debug, trace};

use crate::config::SelectorConfig;
use crate::filter::PresetFilter;
use crate::preset::{Preset, PresetId};
use crate::slot::{SharedObject, SlotValue};
use crate::store::PresetStore;
use crate::view::{CellValue, ColumnKind, View};

/// A column binding with its slot name already resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncColumn {
    pub slot: String,
    pub column: usize,
    pub kind: ColumnKind,
}

/// What a reconciliation pass did to the view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub inserted: usize,
    pub updated: usize,
    pub deleted: usize,
}

impl SyncReport {
    pub fn is_noop(&self) -> bool {
        self.inserted == 0 && self.updated == 0 && self.deleted == 0
    }
}

/// A cell as last written. Images are held weakly, so the cache never keeps
/// an object alive after its slot lets go of it.
#[derive(Debug)]
enum WrittenCell {
    Text(String),
    Numeric(u64),
    Image(Option<Weak<dyn Any>>),
}

impl WrittenCell {
    fn of(cell: &CellValue) -> Self {
        match cell {
            CellValue::Text(text) => WrittenCell::Text(text.clone()),
            CellValue::Numeric(value) => WrittenCell::Numeric(value.to_bits()),
            CellValue::Image(image) => {
                WrittenCell::Image(image.as_ref().map(SharedObject::downgrade))
            }
        }
    }

    fn matches(&self, cell: &CellValue) -> bool {
        match (self, cell) {
            (WrittenCell::Text(a), CellValue::Text(b)) => a == b,
            (WrittenCell::Numeric(a), CellValue::Numeric(b)) => *a == b.to_bits(),
            (WrittenCell::Image(None), CellValue::Image(None)) => true,
            (WrittenCell::Image(Some(weak)), CellValue::Image(Some(image))) => image.is(weak),
            _ => false,
        }
    }
}

#[derive(Debug)]
pub struct RowSynchronizer {
    id_column: usize,
    columns: Vec<SyncColumn>,
    pending: BTreeSet<PresetId>,
    armed: bool,
    /// Cells last written per preset row, parallel to `columns`.
    written: HashMap<PresetId, Vec<WrittenCell>>,
}

impl RowSynchronizer {
    pub fn new(id_column: usize, columns: Vec<SyncColumn>) -> Self {
        RowSynchronizer {
            id_column,
            columns,
            pending: BTreeSet::new(),
            armed: false,
            written: HashMap::new(),
        }
    }

    pub fn from_config(config: &SelectorConfig) -> Self {
        let columns = config
            .columns
            .iter()
            .map(|binding| SyncColumn {
                slot: config.slot_names.resolve(&binding.slot).to_string(),
                column: binding.column,
                kind: binding.kind,
            })
            .collect();
        Self::new(config.id_column, columns)
    }

    pub fn columns(&self) -> &[SyncColumn] {
        &self.columns
    }

    /// Queue `id` for the next deferred pass.
    ///
    /// Returns true exactly when the caller must schedule the deferred callback:
    /// the id was newly queued and no callback is armed yet.
    pub fn request_row_update(&mut self, id: PresetId) -> bool {
        if !self.pending.insert(id) {
            return false;
        }
        if self.armed {
            return false;
        }
        self.armed = true;
        trace!(preset = %id, "deferred row sync armed");
        true
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    pub fn is_pending(&self, id: PresetId) -> bool {
        self.pending.contains(&id)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// The deferred pass: reconcile every pending id, then clear the set and disarm.
    pub fn run_deferred(
        &mut self,
        store: &PresetStore,
        filter: &PresetFilter,
        view: &mut dyn View,
    ) -> SyncReport {
        self.armed = false;
        let pending = std::mem::take(&mut self.pending);
        let mut report = SyncReport::default();
        for id in &pending {
            self.reconcile(*id, store, filter, view, &mut report);
        }
        debug!(
            ids = pending.len(),
            inserted = report.inserted,
            updated = report.updated,
            deleted = report.deleted,
            "deferred row sync"
        );
        report
    }

    /// Reconcile every preset in creation order, then drop rows with no backing preset.
    pub fn full_resync(
        &mut self,
        store: &PresetStore,
        filter: &PresetFilter,
        view: &mut dyn View,
    ) -> SyncReport {
        let mut report = SyncReport::default();
        for id in store.ids() {
            self.reconcile(id, store, filter, view, &mut report);
        }

        for id in view.row_ids() {
            if store.has(id) {
                continue;
            }
            if let Some(row) = view.find_row_by_hidden_id(id) {
                view.delete_row(row);
                report.deleted += 1;
            }
        }
        self.written.retain(|id, _| store.has(*id));

        debug!(
            presets = store.count(),
            inserted = report.inserted,
            updated = report.updated,
            deleted = report.deleted,
            "full resync"
        );
        report
    }

    /// Forget pending work and cached cells. Used on teardown.
    pub fn reset(&mut self) {
        self.pending.clear();
        self.armed = false;
        self.written.clear();
    }

    fn reconcile(
        &mut self,
        id: PresetId,
        store: &PresetStore,
        filter: &PresetFilter,
        view: &mut dyn View,
        report: &mut SyncReport,
    ) {
        let row = view.find_row_by_hidden_id(id);
        let visible = store.get(id).filter(|preset| filter.is_visible(preset));

        match (row, visible) {
            (None, Some(preset)) => {
                let row = view.insert_row();
                view.set_cell_text(row, self.id_column, &id.to_string());
                let cells = self.cells_for(preset);
                for (column, cell) in self.columns.iter().zip(&cells) {
                    cell.write_to(view, row, column.column);
                }
                self.written.insert(id, cells.iter().map(WrittenCell::of).collect());
                report.inserted += 1;
            }
            (Some(row), None) => {
                view.delete_row(row);
                self.written.remove(&id);
                report.deleted += 1;
            }
            (Some(row), Some(preset)) => {
                let cells = self.cells_for(preset);
                let previous = self.written.get(&id);
                let mut changed = false;
                for (index, (column, cell)) in self.columns.iter().zip(&cells).enumerate() {
                    if previous
                        .and_then(|p| p.get(index))
                        .is_some_and(|written| written.matches(cell))
                    {
                        continue;
                    }
                    cell.write_to(view, row, column.column);
                    changed = true;
                }
                if changed {
                    report.updated += 1;
                }
                self.written.insert(id, cells.iter().map(WrittenCell::of).collect());
            }
            (None, None) => {
                self.written.remove(&id);
            }
        }
    }

    fn cells_for(&self, preset: &Preset) -> Vec<CellValue> {
        self.columns
            .iter()
            .map(|column| cell_value(preset.slot(&column.slot), column.kind))
            .collect()
    }
}

/// Render a slot for a column of the given kind.
pub fn cell_value(slot: Option<&SlotValue>, kind: ColumnKind) -> CellValue {
    match kind {
        ColumnKind::Text => CellValue::Text(match slot {
            Some(SlotValue::String(text)) => text.clone(),
            Some(SlotValue::Int(v)) => v.to_string(),
            Some(SlotValue::Double(v)) => v.to_string(),
            _ => String::new(),
        }),
        ColumnKind::Numeric => CellValue::Numeric(match slot {
            Some(SlotValue::Int(v)) => *v as f64,
            Some(SlotValue::Double(v)) => *v,
            Some(SlotValue::String(text)) => text.trim().parse().unwrap_or(0.0),
            _ => 0.0,
        }),
        ColumnKind::Image => CellValue::Image(slot.and_then(SlotValue::as_object).cloned()),
    }
}
