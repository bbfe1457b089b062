//! InMemoryView - headless table backing for tests and toolkit-less hosts.

use std::collections::{BTreeMap, BTreeSet};

use super::{CellValue, RowHandle, View};
use crate::preset::PresetId;
use crate::slot::SharedObject;

/// Counts of view operations, used to observe churn.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ViewStats {
    pub inserts: usize,
    pub deletes: usize,
    pub cell_writes: usize,
}

impl ViewStats {
    pub fn total(&self) -> usize {
        self.inserts + self.deletes + self.cell_writes
    }
}

#[derive(Debug)]
struct MemoryRow {
    handle: RowHandle,
    cells: BTreeMap<usize, CellValue>,
}

/// A table kept entirely in memory.
///
/// Rows keep insertion order. The hidden id column holds the preset id as text,
/// exactly as a toolkit table would.
#[derive(Debug)]
pub struct InMemoryView {
    rows: Vec<MemoryRow>,
    id_column: usize,
    next_handle: u64,
    selection: BTreeSet<RowHandle>,
    stats: ViewStats,
}

impl Default for InMemoryView {
    fn default() -> Self {
        Self::new(0)
    }
}

impl InMemoryView {
    pub fn new(id_column: usize) -> Self {
        InMemoryView {
            rows: Vec::new(),
            id_column,
            next_handle: 1,
            selection: BTreeSet::new(),
            stats: ViewStats::default(),
        }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Row handles in display order.
    pub fn rows(&self) -> Vec<RowHandle> {
        self.rows.iter().map(|r| r.handle).collect()
    }

    pub fn cell(&self, row: RowHandle, column: usize) -> Option<&CellValue> {
        self.row(row).and_then(|r| r.cells.get(&column))
    }

    /// Text of a cell, or `None` if the cell is empty or not text.
    pub fn text(&self, row: RowHandle, column: usize) -> Option<&str> {
        self.cell(row, column).and_then(CellValue::as_text)
    }

    pub fn numeric(&self, row: RowHandle, column: usize) -> Option<f64> {
        self.cell(row, column).and_then(CellValue::as_numeric)
    }

    /// Select the row showing `id`. Returns false if no such row exists.
    pub fn select(&mut self, id: PresetId) -> bool {
        match self.find_row_by_hidden_id(id) {
            Some(row) => {
                self.selection.insert(row);
                true
            }
            None => false,
        }
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    pub fn stats(&self) -> ViewStats {
        self.stats
    }

    pub fn reset_stats(&mut self) {
        self.stats = ViewStats::default();
    }

    fn row(&self, handle: RowHandle) -> Option<&MemoryRow> {
        self.rows.iter().find(|r| r.handle == handle)
    }

    fn row_mut(&mut self, handle: RowHandle) -> Option<&mut MemoryRow> {
        self.rows.iter_mut().find(|r| r.handle == handle)
    }

    fn hidden_id(&self, row: &MemoryRow) -> Option<PresetId> {
        row.cells
            .get(&self.id_column)
            .and_then(CellValue::as_text)
            .and_then(|text| text.parse::<u64>().ok())
            .map(PresetId::new)
    }

    fn write(&mut self, row: RowHandle, column: usize, value: CellValue) {
        if let Some(r) = self.row_mut(row) {
            r.cells.insert(column, value);
            self.stats.cell_writes += 1;
        }
    }
}

impl View for InMemoryView {
    fn insert_row(&mut self) -> RowHandle {
        let handle = RowHandle::new(self.next_handle);
        self.next_handle += 1;
        self.rows.push(MemoryRow {
            handle,
            cells: BTreeMap::new(),
        });
        self.stats.inserts += 1;
        handle
    }

    fn delete_row(&mut self, row: RowHandle) {
        let before = self.rows.len();
        self.rows.retain(|r| r.handle != row);
        if self.rows.len() != before {
            self.selection.remove(&row);
            self.stats.deletes += 1;
        }
    }

    fn set_cell_text(&mut self, row: RowHandle, column: usize, text: &str) {
        self.write(row, column, CellValue::Text(text.to_string()));
    }

    fn set_cell_numeric(&mut self, row: RowHandle, column: usize, value: f64) {
        self.write(row, column, CellValue::Numeric(value));
    }

    fn set_cell_image(&mut self, row: RowHandle, column: usize, image: Option<&SharedObject>) {
        self.write(row, column, CellValue::Image(image.cloned()));
    }

    fn find_row_by_hidden_id(&self, id: PresetId) -> Option<RowHandle> {
        self.rows
            .iter()
            .find(|r| self.hidden_id(r) == Some(id))
            .map(|r| r.handle)
    }

    fn row_ids(&self) -> Vec<PresetId> {
        self.rows.iter().filter_map(|r| self.hidden_id(r)).collect()
    }

    fn selected_ids(&self) -> BTreeSet<PresetId> {
        self.rows
            .iter()
            .filter(|r| self.selection.contains(&r.handle))
            .filter_map(|r| self.hidden_id(r))
            .collect()
    }
}
