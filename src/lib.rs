mod config;
mod error;
mod filter;
mod image;
mod preset;
mod scheduler;
mod selector;
mod slot;
mod snapshot;
mod store;
mod sync;
mod view;

pub use config::{ColumnBinding, ConfigError, SelectorConfig, SlotNames, SlotRef, SlotRole};
pub use error::RegistryError;
pub use filter::{FilterConstraint, PresetFilter};
pub use image::{ImagePipeline, PresetImages, RawBitmap};
pub use preset::{Preset, PresetId};
pub use scheduler::{IdleQueue, IdleTask, Scheduler};
pub use selector::{AddHandler, PresetHandler, PresetSelector, RemoveHandler};
pub use slot::{ExternalHandle, SharedObject, SlotKind, SlotValue};
pub use snapshot::{PlainValue, PresetRecord, PresetSnapshot, SnapshotError};
pub use store::{IdCounterPolicy, PresetStore, SlotWrite};
pub use sync::{cell_value, RowSynchronizer, SyncColumn, SyncReport};
pub use view::{CellValue, ColumnKind, InMemoryView, RowHandle, View, ViewStats};
