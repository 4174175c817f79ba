//! Persisted shape of the whole registry.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::{AppError, EntryRecord};

pub const SCHEMA_VERSION: u32 = 1;
pub const DEFAULT_REFRESH_INTERVAL_MINUTES: i64 = 60;
pub const MAX_REFRESH_INTERVAL_MINUTES: i64 = u32::MAX as i64;

/// The registry as written to durable storage, always as one unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegistryRecord {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    /// Incremented by every save; a handle whose copy is older reloads before writing.
    #[serde(default)]
    pub revision: u64,
    /// Values `<= 0` disable scheduled refresh.
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_minutes: i64,
    #[serde(default)]
    pub entries: Vec<EntryRecord>,
}

impl Default for RegistryRecord {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            revision: 0,
            refresh_interval_minutes: DEFAULT_REFRESH_INTERVAL_MINUTES,
            entries: Vec::new(),
        }
    }
}

impl RegistryRecord {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.schema_version != SCHEMA_VERSION {
            return Err(AppError::State(format!(
                "unsupported schema_version {} (expected {})",
                self.schema_version, SCHEMA_VERSION
            )));
        }
        Ok(())
    }
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

fn default_refresh_interval() -> i64 {
    DEFAULT_REFRESH_INTERVAL_MINUTES
}

/// Period between refresh passes, or `None` when scheduling is disabled.
///
/// Intervals beyond [`MAX_REFRESH_INTERVAL_MINUTES`] are clamped to it.
pub fn refresh_period(minutes: i64, unit: Duration) -> Option<Duration> {
    if minutes <= 0 {
        return None;
    }
    let minutes = u32::try_from(minutes).unwrap_or(u32::MAX);
    Some(unit * minutes)
}
