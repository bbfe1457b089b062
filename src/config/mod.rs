//! Selector configuration: well-known slot names, column layout, id policy.
//!
//! Code never hard-codes the name of a role slot. It asks [`SlotNames`] which
//! attribute currently plays the role, so hosts can remap e.g. the group role
//! onto their own attribute.
//!
//! ## Example
//!
//! ```
//! use preset_registry::{SelectorConfig, SlotRole};
//!
//! let config = SelectorConfig::from_json(r#"{ "slot_names": { "group": "bank" } }"#).unwrap();
//! assert_eq!(config.slot_names.name(SlotRole::Group), "bank");
//! assert_eq!(config.slot_names.name(SlotRole::Comment), "comment");
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::store::IdCounterPolicy;
use crate::view::ColumnKind;

/// Slots the selector treats specially.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotRole {
    Group,
    Comment,
    CreationTime,
    Filename,
    Thumbnail,
    Screenshot,
}

/// Which slot name plays each role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlotNames {
    pub group: String,
    pub comment: String,
    pub creation_time: String,
    pub filename: String,
    pub thumbnail: String,
    pub screenshot: String,
}

impl Default for SlotNames {
    fn default() -> Self {
        SlotNames {
            group: "group".into(),
            comment: "comment".into(),
            creation_time: "creation_time".into(),
            filename: "filename".into(),
            thumbnail: "thumbnail".into(),
            screenshot: "screenshot".into(),
        }
    }
}

impl SlotNames {
    pub fn name(&self, role: SlotRole) -> &str {
        match role {
            SlotRole::Group => &self.group,
            SlotRole::Comment => &self.comment,
            SlotRole::CreationTime => &self.creation_time,
            SlotRole::Filename => &self.filename,
            SlotRole::Thumbnail => &self.thumbnail,
            SlotRole::Screenshot => &self.screenshot,
        }
    }

    pub fn set_name(&mut self, role: SlotRole, name: impl Into<String>) {
        let name = name.into();
        match role {
            SlotRole::Group => self.group = name,
            SlotRole::Comment => self.comment = name,
            SlotRole::CreationTime => self.creation_time = name,
            SlotRole::Filename => self.filename = name,
            SlotRole::Thumbnail => self.thumbnail = name,
            SlotRole::Screenshot => self.screenshot = name,
        }
    }

    pub fn resolve<'a>(&'a self, slot: &'a SlotRef) -> &'a str {
        match slot {
            SlotRef::Role(role) => self.name(*role),
            SlotRef::Name(name) => name,
        }
    }
}

/// A column's source slot: either a role (resolved through [`SlotNames`]) or a literal name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotRef {
    Role(SlotRole),
    Name(String),
}

/// Binds a slot to a view column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnBinding {
    pub slot: SlotRef,
    pub column: usize,
    #[serde(default)]
    pub kind: ColumnKind,
    #[serde(default)]
    pub editable: bool,
}

impl ColumnBinding {
    pub fn role(role: SlotRole, column: usize, kind: ColumnKind) -> Self {
        ColumnBinding {
            slot: SlotRef::Role(role),
            column,
            kind,
            editable: false,
        }
    }

    pub fn named(name: impl Into<String>, column: usize, kind: ColumnKind) -> Self {
        ColumnBinding {
            slot: SlotRef::Name(name.into()),
            column,
            kind,
            editable: false,
        }
    }

    pub fn editable(mut self) -> Self {
        self.editable = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    pub slot_names: SlotNames,
    /// Column holding the preset id. Never bound to a slot.
    pub id_column: usize,
    pub columns: Vec<ColumnBinding>,
    pub id_policy: IdCounterPolicy,
    /// Write the creation time into the creation-time role on `create`.
    pub stamp_creation_time: bool,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        SelectorConfig {
            slot_names: SlotNames::default(),
            id_column: 0,
            columns: vec![
                ColumnBinding::role(SlotRole::Comment, 1, ColumnKind::Text).editable(),
                ColumnBinding::role(SlotRole::CreationTime, 2, ColumnKind::Numeric),
                ColumnBinding::role(SlotRole::Thumbnail, 3, ColumnKind::Image),
            ],
            id_policy: IdCounterPolicy::Monotonic,
            stamp_creation_time: true,
        }
    }
}

impl SelectorConfig {
    /// Parse and validate a JSON configuration. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: SelectorConfig =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        serde_json::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = BTreeSet::new();
        for binding in &self.columns {
            if binding.column == self.id_column {
                return Err(ConfigError::Invalid(format!(
                    "column {} is the hidden id column",
                    binding.column
                )));
            }
            if !seen.insert(binding.column) {
                return Err(ConfigError::Invalid(format!(
                    "column {} is bound twice",
                    binding.column
                )));
            }
        }
        Ok(())
    }

    /// The binding for a view column, if any.
    pub fn binding(&self, column: usize) -> Option<&ColumnBinding> {
        self.columns.iter().find(|b| b.column == column)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    Parse(String),
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Parse(msg) => write!(f, "config parse error: {}", msg),
            ConfigError::Invalid(msg) => write!(f, "invalid config: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}
