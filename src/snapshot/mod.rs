//! Snapshots - plain-data export of the registry for host-side persistence.
//!
//! Only `Int`, `Double` and `String` slots are captured. `Pointer` and `Object`
//! slots refer to process-local things and are skipped. Restoring creates fresh
//! presets, so restored ids follow the store's counter rather than the snapshot's.
//!
//! ## Example
//!
//! ```
//! use preset_registry::{PresetSnapshot, PresetStore};
//!
//! let mut store = PresetStore::new();
//! let id = store.create();
//! store.set_slot(id, "comment", "warm").unwrap();
//!
//! let json = PresetSnapshot::capture(&store).to_json().unwrap();
//! let mut other = PresetStore::new();
//! let ids = PresetSnapshot::from_json(&json).unwrap().restore_into(&mut other);
//! assert_eq!(other.string_slot(ids[0], "comment"), "warm");
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::preset::PresetId;
use crate::slot::SlotValue;
use crate::store::PresetStore;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlainValue {
    Int(i64),
    Double(#[serde(with = "double")] f64),
    String(String),
}

impl PlainValue {
    fn from_slot(value: &SlotValue) -> Option<Self> {
        match value {
            SlotValue::Int(v) => Some(PlainValue::Int(*v)),
            SlotValue::Double(v) => Some(PlainValue::Double(*v)),
            SlotValue::String(v) => Some(PlainValue::String(v.clone())),
            SlotValue::Pointer(_) | SlotValue::Object(_) => None,
        }
    }

    fn into_slot(self) -> SlotValue {
        match self {
            PlainValue::Int(v) => SlotValue::Int(v),
            PlainValue::Double(v) => SlotValue::Double(v),
            PlainValue::String(v) => SlotValue::String(v),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresetRecord {
    /// Id at capture time. Informational only.
    pub id: PresetId,
    pub slots: BTreeMap<String, PlainValue>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PresetSnapshot {
    pub presets: Vec<PresetRecord>,
}

impl PresetSnapshot {
    /// Capture every preset in creation order.
    pub fn capture(store: &PresetStore) -> Self {
        let presets = store
            .iter()
            .map(|preset| PresetRecord {
                id: preset.id(),
                slots: preset
                    .slots()
                    .filter_map(|(name, value)| {
                        PlainValue::from_slot(value).map(|v| (name.to_string(), v))
                    })
                    .collect(),
            })
            .collect();
        PresetSnapshot { presets }
    }

    /// Create one preset per record. Returns the new ids in record order.
    pub fn restore_into(self, store: &mut PresetStore) -> Vec<PresetId> {
        let mut ids = Vec::with_capacity(self.presets.len());
        for record in self.presets {
            let id = store.create();
            for (name, value) in record.slots {
                // `id` was just created, so the write cannot miss.
                let _ = store.set_slot(id, &name, value.into_slot());
            }
            ids.push(id);
        }
        ids
    }

    pub fn len(&self) -> usize {
        self.presets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.presets.is_empty()
    }

    pub fn to_json(&self) -> Result<String, SnapshotError> {
        serde_json::to_string(self).map_err(|e| SnapshotError::Json(e.to_string()))
    }

    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        serde_json::from_str(json).map_err(|e| SnapshotError::Json(e.to_string()))
    }

    #[cfg(feature = "snapshot")]
    pub fn to_bytes(&self) -> Result<Vec<u8>, SnapshotError> {
        bitcode::serialize(self).map_err(|e| SnapshotError::Binary(e.to_string()))
    }

    #[cfg(feature = "snapshot")]
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SnapshotError> {
        bitcode::deserialize(bytes).map_err(|e| SnapshotError::Binary(e.to_string()))
    }
}

/// JSON has no literal for NaN or the infinities, so text formats carry those
/// as the strings `"NaN"`, `"inf"` and `"-inf"`. Binary formats keep the raw `f64`.
mod double {
    use serde::de::{self, Unexpected, Visitor};
    use serde::{Deserializer, Serializer};
    use std::fmt;

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if value.is_finite() || !serializer.is_human_readable() {
            return serializer.serialize_f64(*value);
        }
        let text = if value.is_nan() {
            "NaN"
        } else if value.is_sign_positive() {
            "inf"
        } else {
            "-inf"
        };
        serializer.serialize_str(text)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        if deserializer.is_human_readable() {
            deserializer.deserialize_any(DoubleVisitor)
        } else {
            deserializer.deserialize_f64(DoubleVisitor)
        }
    }

    struct DoubleVisitor;

    impl<'de> Visitor<'de> for DoubleVisitor {
        type Value = f64;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a number, \"NaN\", \"inf\" or \"-inf\"")
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<f64, E> {
            Ok(v)
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<f64, E> {
            Ok(v as f64)
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<f64, E> {
            Ok(v as f64)
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<f64, E> {
            match v {
                "NaN" => Ok(f64::NAN),
                "inf" => Ok(f64::INFINITY),
                "-inf" => Ok(f64::NEG_INFINITY),
                _ => Err(E::invalid_value(Unexpected::Str(v), &self)),
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotError {
    Json(String),
    Binary(String),
}

impl fmt::Display for SnapshotError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SnapshotError::Json(msg) => write!(f, "snapshot json error: {}", msg),
            SnapshotError::Binary(msg) => write!(f, "snapshot binary error: {}", msg),
        }
    }
}

impl std::error::Error for SnapshotError {}
