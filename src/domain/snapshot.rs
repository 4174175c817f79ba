//! Isolated copies of parsed configuration handed to readers.
//!
//! Readers never receive the registry's own `serde_yaml::Mapping`. [`deep_copy`]
//! rebuilds every level into owned [`ConfigValue`]s and refuses anything it cannot
//! represent instead of falling back to a shared reference.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_yaml::{Mapping, Number, Value};

use crate::domain::AppError;

/// Owned configuration mapping returned to readers.
pub type ConfigMap = BTreeMap<String, ConfigValue>;

/// A reader's isolated view of one entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub name: String,
    pub category: String,
    pub values: ConfigMap,
}

impl Snapshot {
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// A configuration value independent of registry state.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ConfigValue {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Sequence(Vec<ConfigValue>),
    Mapping(ConfigMap),
}

impl ConfigValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ConfigValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_mapping(&self) -> Option<&ConfigMap> {
        match self {
            ConfigValue::Mapping(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_mapping_mut(&mut self) -> Option<&mut ConfigMap> {
        match self {
            ConfigValue::Mapping(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_sequence_mut(&mut self) -> Option<&mut Vec<ConfigValue>> {
        match self {
            ConfigValue::Sequence(items) => Some(items),
            _ => None,
        }
    }
}

/// Deep-copies a parsed mapping for the entry named `entry`.
///
/// Fails with `SnapshotFailed` on tagged values and on keys that are not scalars.
pub fn deep_copy(entry: &str, mapping: &Mapping) -> Result<ConfigMap, AppError> {
    copy_mapping(mapping).map_err(|details| AppError::SnapshotFailed {
        entry: entry.to_string(),
        details,
    })
}

fn copy_mapping(mapping: &Mapping) -> Result<ConfigMap, String> {
    let mut copy = ConfigMap::new();
    for (key, value) in mapping {
        let key = copy_key(key)?;
        if copy.contains_key(&key) {
            return Err(format!("duplicate key '{}' after conversion to string", key));
        }
        copy.insert(key, copy_value(value)?);
    }
    Ok(copy)
}

fn copy_key(key: &Value) -> Result<String, String> {
    match key {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Null => Ok("null".to_string()),
        Value::Sequence(_) | Value::Mapping(_) => {
            Err("mapping keys must be scalars".to_string())
        }
        Value::Tagged(tagged) => Err(format!("unsupported tagged key {}", tagged.tag)),
    }
}

fn copy_value(value: &Value) -> Result<ConfigValue, String> {
    Ok(match value {
        Value::Null => ConfigValue::Null,
        Value::Bool(b) => ConfigValue::Bool(*b),
        Value::Number(n) => ConfigValue::Number(n.clone()),
        Value::String(s) => ConfigValue::String(s.clone()),
        Value::Sequence(items) => {
            ConfigValue::Sequence(items.iter().map(copy_value).collect::<Result<_, _>>()?)
        }
        Value::Mapping(map) => ConfigValue::Mapping(copy_mapping(map)?),
        Value::Tagged(tagged) => {
            return Err(format!("unsupported tagged value {}", tagged.tag));
        }
    })
}
