//! Slots - dynamically typed named attributes of a preset.
//!
//! A slot holds exactly one [`SlotValue`] variant at a time. The `Object` arm is a
//! co-owner of a shared external object: storing it takes one strong reference,
//! and overwriting or removing the slot gives that reference back.
//!
//! ## Example
//!
//! ```
//! use preset_registry::{SharedObject, SlotValue};
//!
//! let image = SharedObject::new(vec![0u8; 16]);
//! let slot = SlotValue::from(image.clone());
//! assert_eq!(image.strong_count(), 2);
//! drop(slot);
//! assert_eq!(image.strong_count(), 1);
//! ```

mod object;

use serde::{Deserialize, Serialize};
use std::fmt;

pub use object::{ExternalHandle, SharedObject};

/// The variant tag of a [`SlotValue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotKind {
    Int,
    Double,
    String,
    Pointer,
    Object,
}

impl fmt::Display for SlotKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SlotKind::Int => "int",
            SlotKind::Double => "double",
            SlotKind::String => "string",
            SlotKind::Pointer => "pointer",
            SlotKind::Object => "object",
        };
        f.write_str(name)
    }
}

/// A typed slot value.
///
/// There is deliberately no `Default`: an `Object` slot can only be built from a
/// [`SharedObject`] the caller already holds.
#[derive(Debug, Clone)]
pub enum SlotValue {
    Int(i64),
    Double(f64),
    String(String),
    /// Untyped handle to something the store never owns or dereferences.
    Pointer(ExternalHandle),
    /// One strong reference to a shared external object.
    Object(SharedObject),
}

impl SlotValue {
    pub fn kind(&self) -> SlotKind {
        match self {
            SlotValue::Int(_) => SlotKind::Int,
            SlotValue::Double(_) => SlotKind::Double,
            SlotValue::String(_) => SlotKind::String,
            SlotValue::Pointer(_) => SlotKind::Pointer,
            SlotValue::Object(_) => SlotKind::Object,
        }
    }

    /// True when both values have the same variant and the same content.
    ///
    /// Doubles compare bitwise so re-storing `NaN` is still a no-op. Objects
    /// compare by identity.
    pub fn same_as(&self, other: &SlotValue) -> bool {
        match (self, other) {
            (SlotValue::Int(a), SlotValue::Int(b)) => a == b,
            (SlotValue::Double(a), SlotValue::Double(b)) => a.to_bits() == b.to_bits(),
            (SlotValue::String(a), SlotValue::String(b)) => a == b,
            (SlotValue::Pointer(a), SlotValue::Pointer(b)) => a == b,
            (SlotValue::Object(a), SlotValue::Object(b)) => a.ptr_eq(b),
            _ => false,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            SlotValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_double(&self) -> Option<f64> {
        match self {
            SlotValue::Double(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            SlotValue::String(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_pointer(&self) -> Option<ExternalHandle> {
        match self {
            SlotValue::Pointer(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&SharedObject> {
        match self {
            SlotValue::Object(v) => Some(v),
            _ => None,
        }
    }
}

impl PartialEq for SlotValue {
    fn eq(&self, other: &Self) -> bool {
        self.same_as(other)
    }
}

impl From<i64> for SlotValue {
    fn from(value: i64) -> Self {
        SlotValue::Int(value)
    }
}

impl From<i32> for SlotValue {
    fn from(value: i32) -> Self {
        SlotValue::Int(value as i64)
    }
}

impl From<f64> for SlotValue {
    fn from(value: f64) -> Self {
        SlotValue::Double(value)
    }
}

impl From<&str> for SlotValue {
    fn from(value: &str) -> Self {
        SlotValue::String(value.to_string())
    }
}

impl From<String> for SlotValue {
    fn from(value: String) -> Self {
        SlotValue::String(value)
    }
}

impl From<ExternalHandle> for SlotValue {
    fn from(value: ExternalHandle) -> Self {
        SlotValue::Pointer(value)
    }
}

impl From<SharedObject> for SlotValue {
    fn from(value: SharedObject) -> Self {
        SlotValue::Object(value)
    }
}
