//! View - the row-oriented table the selector keeps in step with the store.
//!
//! The toolkit widget itself lives outside this crate. The core only needs row
//! CRUD, cell writes, a lookup by the hidden id column, and the current
//! selection. [`InMemoryView`] is a headless table for tests and for hosts
//! that render rows themselves.

mod in_memory;

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::preset::PresetId;
use crate::slot::SharedObject;

pub use in_memory::{InMemoryView, ViewStats};

/// Opaque row handle issued by a [`View`]. Stable for the row's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RowHandle(u64);

impl RowHandle {
    pub const fn new(raw: u64) -> Self {
        RowHandle(raw)
    }

    pub const fn get(self) -> u64 {
        self.0
    }
}

/// Table collaborator driven by the synchronizer.
pub trait View {
    /// Append a new empty row.
    fn insert_row(&mut self) -> RowHandle;

    fn delete_row(&mut self, row: RowHandle);

    fn set_cell_text(&mut self, row: RowHandle, column: usize, text: &str);

    fn set_cell_numeric(&mut self, row: RowHandle, column: usize, value: f64);

    /// Attach an image to a cell for lazy rendering. Views without image cells ignore it.
    fn set_cell_image(&mut self, _row: RowHandle, _column: usize, _image: Option<&SharedObject>) {}

    /// Find the row whose hidden id column holds `id`.
    fn find_row_by_hidden_id(&self, id: PresetId) -> Option<RowHandle>;

    /// Ids of every row currently in the view.
    fn row_ids(&self) -> Vec<PresetId>;

    fn selected_ids(&self) -> BTreeSet<PresetId>;
}

/// How a bound slot is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    #[default]
    Text,
    Numeric,
    Image,
}

/// Content of one cell as last written by the synchronizer.
#[derive(Debug, Clone)]
pub enum CellValue {
    Text(String),
    Numeric(f64),
    Image(Option<SharedObject>),
}

impl CellValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_numeric(&self) -> Option<f64> {
        match self {
            CellValue::Numeric(value) => Some(*value),
            _ => None,
        }
    }

    /// Push this value into `view`.
    pub fn write_to(&self, view: &mut dyn View, row: RowHandle, column: usize) {
        match self {
            CellValue::Text(text) => view.set_cell_text(row, column, text),
            CellValue::Numeric(value) => view.set_cell_numeric(row, column, *value),
            CellValue::Image(image) => view.set_cell_image(row, column, image.as_ref()),
        }
    }
}

impl PartialEq for CellValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (CellValue::Text(a), CellValue::Text(b)) => a == b,
            (CellValue::Numeric(a), CellValue::Numeric(b)) => a.to_bits() == b.to_bits(),
            (CellValue::Image(a), CellValue::Image(b)) => match (a, b) {
                (Some(a), Some(b)) => a.ptr_eq(b),
                (None, None) => true,
                _ => false,
            },
            _ => false,
        }
    }
}
