use std::fmt;

use crate::preset::PresetId;
use crate::slot::SlotKind;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// The preset id is not (or no longer) present in the store.
    UnknownPreset(PresetId),
    /// A typed accessor was used on a slot holding another variant.
    InvalidSlotType {
        slot: String,
        expected: SlotKind,
        actual: SlotKind,
    },
    /// A regex constraint could not be compiled.
    FilterEvaluation {
        slot: String,
        pattern: String,
        message: String,
    },
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryError::UnknownPreset(id) => write!(f, "unknown preset {}", id),
            RegistryError::InvalidSlotType {
                slot,
                expected,
                actual,
            } => write!(
                f,
                "slot {} holds {} (expected {})",
                slot, actual, expected
            ),
            RegistryError::FilterEvaluation {
                slot,
                pattern,
                message,
            } => write!(
                f,
                "invalid filter pattern {:?} on slot {}: {}",
                pattern, slot, message
            ),
        }
    }
}

impl std::error::Error for RegistryError {}
