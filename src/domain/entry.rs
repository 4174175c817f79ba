//! A named, categorized configuration and its parsed mapping.

use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};

use crate::domain::snapshot::{Snapshot, deep_copy};
use crate::domain::{AppError, ConfigSource};
use crate::ports::{CredentialProvider, RemoteRepository};

/// Serialized form of an entry: everything except derived state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EntryRecord {
    pub name: String,
    #[serde(default)]
    pub category: String,
    pub source: ConfigSource,
}

/// Freshly fetched text that already parsed cleanly.
#[derive(Debug, Clone)]
pub struct FetchedText {
    pub text: String,
    pub parsed: Mapping,
}

/// One registry entry. `raw_text` and `parsed` only ever change together.
#[derive(Debug, Clone)]
pub struct ConfigEntry {
    name: String,
    category: String,
    source: ConfigSource,
    raw_text: String,
    parsed: Mapping,
}

impl ConfigEntry {
    /// Build an entry from its source's current text.
    pub fn new(
        name: impl Into<String>,
        category: impl Into<String>,
        source: ConfigSource,
    ) -> Result<Self, AppError> {
        let name = name.into();
        let raw_text = source.current_text().to_string();
        let parsed = parse_mapping(&name, &raw_text)?;
        Ok(Self { name, category: category.into(), source, raw_text, parsed })
    }

    pub fn from_record(record: EntryRecord) -> Result<Self, AppError> {
        Self::new(record.name, record.category, record.source)
    }

    pub fn to_record(&self) -> EntryRecord {
        EntryRecord {
            name: self.name.clone(),
            category: self.category.clone(),
            source: self.source.clone(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Empty string means uncategorized.
    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn source(&self) -> &ConfigSource {
        &self.source
    }

    pub fn raw_text(&self) -> &str {
        &self.raw_text
    }

    pub fn is_empty(&self) -> bool {
        self.parsed.is_empty()
    }

    pub(crate) fn parsed(&self) -> &Mapping {
        &self.parsed
    }

    /// Isolated deep copy of the parsed mapping.
    pub fn snapshot(&self) -> Result<Snapshot, AppError> {
        Ok(Snapshot {
            name: self.name.clone(),
            category: self.category.clone(),
            values: deep_copy(&self.name, &self.parsed)?,
        })
    }

    /// Fetch and parse new text for a remote-backed entry without mutating it.
    ///
    /// Returns `Ok(None)` for inline entries, whose text only changes on write.
    pub fn fetch_update(
        &self,
        repository: &dyn RemoteRepository,
        credentials: &dyn CredentialProvider,
    ) -> Result<Option<FetchedText>, AppError> {
        if !self.source.is_remote() {
            return Ok(None);
        }
        let text = self.source.produce_text(repository, credentials)?;
        let parsed = parse_mapping(&self.name, &text)?;
        Ok(Some(FetchedText { text, parsed }))
    }

    /// Install fetched text, its parse result, and the source cache in one step.
    pub fn apply(&mut self, fetched: FetchedText) {
        if let ConfigSource::Remote(remote) = &mut self.source {
            remote.cached_text = Some(fetched.text.clone());
        }
        self.raw_text = fetched.text;
        self.parsed = fetched.parsed;
    }

    /// Refresh in place: fetch, parse, apply. On failure nothing changes.
    pub fn refresh(
        &mut self,
        repository: &dyn RemoteRepository,
        credentials: &dyn CredentialProvider,
    ) -> Result<bool, AppError> {
        match self.fetch_update(repository, credentials)? {
            Some(fetched) => {
                self.apply(fetched);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

/// Parse `text` into a mapping; blank text is an empty mapping.
pub fn parse_mapping(entry: &str, text: &str) -> Result<Mapping, AppError> {
    if text.trim().is_empty() {
        return Ok(Mapping::new());
    }
    let root: Value = serde_yaml::from_str(text)
        .map_err(|e| AppError::Parse { entry: entry.to_string(), details: e.to_string() })?;
    match root {
        Value::Mapping(mapping) => Ok(mapping),
        _ => Err(AppError::Parse {
            entry: entry.to_string(),
            details: "root element is not a mapping".to_string(),
        }),
    }
}
