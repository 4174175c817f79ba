//! The process-wide configuration registry.
//!
//! One instance is constructed at startup with [`ConfigRegistry::open`] and shared
//! by handle. Readers take the read side of an `RwLock` and always leave with owned
//! data. Every write goes through one writer mutex, persists first, and only then
//! swaps the in-memory state, so a failed save leaves the previous state in place.
//!
//! Several handles (or processes) may share one store. Each save bumps the stored
//! revision; a handle that finds a newer revision reloads before it writes.

use std::collections::BTreeSet;

use parking_lot::{Mutex, RwLock};
use tracing::{debug, info};

use crate::domain::{
    AppError, ConfigEntry, ConfigSource, EntryRecord, FetchedText, RegistryRecord, Snapshot,
    validate_refresh_interval,
};
use crate::ports::RegistryStore;

#[derive(Debug)]
struct RegistryState {
    /// Bumped whenever the entry list is replaced.
    generation: u64,
    /// Revision of the stored record this state matches.
    revision: u64,
    refresh_interval_minutes: i64,
    entries: Vec<ConfigEntry>,
}

impl RegistryState {
    fn to_record(&self) -> RegistryRecord {
        RegistryRecord {
            revision: self.revision,
            refresh_interval_minutes: self.refresh_interval_minutes,
            entries: self.entries.iter().map(ConfigEntry::to_record).collect(),
            ..RegistryRecord::default()
        }
    }

    fn find(&self, name: &str) -> Result<(usize, &ConfigEntry), AppError> {
        self.entries
            .iter()
            .enumerate()
            .find(|(_, entry)| entry.name() == name)
            .ok_or_else(|| AppError::ConfigNotFound(name.to_string()))
    }

    fn first(&self) -> Result<&ConfigEntry, AppError> {
        self.entries.first().ok_or(AppError::EmptyRegistry)
    }
}

fn entries_from_records(records: Vec<EntryRecord>) -> Result<Vec<ConfigEntry>, AppError> {
    records
        .into_iter()
        .map(|record| {
            let name = record.name.clone();
            ConfigEntry::from_record(record).map_err(|e| {
                AppError::State(format!("persisted config '{}' is unusable: {}", name, e))
            })
        })
        .collect()
}

/// Copy cached text of `refreshed` entries onto stored remote entries with the same
/// name and file.
fn merge_cached_text(stored: &mut RegistryRecord, current: &[ConfigEntry], refreshed: &[String]) {
    for record in &mut stored.entries {
        if !refreshed.contains(&record.name) {
            continue;
        }
        let ConfigSource::Remote(target) = &mut record.source else {
            continue;
        };
        let fresh = current.iter().find(|entry| entry.name() == record.name).and_then(|entry| {
            match entry.source() {
                ConfigSource::Remote(source) if source.same_location(target) => {
                    source.cached_text.clone()
                }
                _ => None,
            }
        });
        if let Some(text) = fresh {
            target.cached_text = Some(text);
        }
    }
}

/// Position of an entry at the time it was read, used to apply late results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct EntrySlot {
    pub generation: u64,
    pub index: usize,
}

/// Outcome of applying fetched text to a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ApplyOutcome {
    Applied,
    /// The entry list was replaced after the slot was read.
    Stale,
}

/// Ordered, named configuration entries with whole-unit persistence.
pub struct ConfigRegistry {
    store: Box<dyn RegistryStore>,
    state: RwLock<RegistryState>,
    writer: Mutex<()>,
    pass: Mutex<()>,
}

impl std::fmt::Debug for ConfigRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.read();
        f.debug_struct("ConfigRegistry")
            .field("entries", &state.entries.len())
            .field("refresh_interval_minutes", &state.refresh_interval_minutes)
            .field("generation", &state.generation)
            .field("revision", &state.revision)
            .finish()
    }
}

impl ConfigRegistry {
    /// Load persisted state from `store`, or start empty when nothing was saved.
    pub fn open(store: impl RegistryStore + 'static) -> Result<Self, AppError> {
        let record = store.load()?.unwrap_or_default();
        record.validate()?;
        let revision = record.revision;
        let refresh_interval_minutes = record.refresh_interval_minutes;
        let entries = entries_from_records(record.entries)?;

        info!(
            entries = entries.len(),
            refresh_interval_minutes,
            revision,
            "registry loaded"
        );

        Ok(Self {
            store: Box::new(store),
            state: RwLock::new(RegistryState {
                generation: 0,
                revision,
                refresh_interval_minutes,
                entries,
            }),
            writer: Mutex::new(()),
            pass: Mutex::new(()),
        })
    }

    // =========================================================================
    // Write path
    // =========================================================================

    /// Replace every entry at once and persist the registry.
    ///
    /// Performs no validation; callers validate before handing entries over.
    pub fn set_entries(&self, entries: Vec<ConfigEntry>) -> Result<(), AppError> {
        self.commit(move |_| Ok(Some(entries)), None)
    }

    /// Change the refresh period and persist the registry.
    pub fn set_refresh_interval(&self, minutes: i64) -> Result<(), AppError> {
        validate_refresh_interval(minutes)?;
        self.commit(|_| Ok(None), Some(minutes))
    }

    /// Replace entries and, optionally, the refresh period in a single persist.
    pub fn replace(
        &self,
        entries: Vec<ConfigEntry>,
        refresh_interval_minutes: Option<i64>,
    ) -> Result<(), AppError> {
        self.replace_with(move |_| Ok(entries), refresh_interval_minutes)
    }

    /// Like [`replace`](Self::replace), but the new entries are built from the current
    /// ones while the writer lock is held, so nothing can change in between.
    pub fn replace_with<F>(
        &self,
        build: F,
        refresh_interval_minutes: Option<i64>,
    ) -> Result<(), AppError>
    where
        F: FnOnce(&[ConfigEntry]) -> Result<Vec<ConfigEntry>, AppError>,
    {
        if let Some(minutes) = refresh_interval_minutes {
            validate_refresh_interval(minutes)?;
        }
        self.commit(|current| build(current).map(Some), refresh_interval_minutes)
    }

    /// Pick up state saved by another handle on the same store.
    ///
    /// Returns `true` when the stored copy was newer and replaced the in-memory one.
    pub fn reload(&self) -> Result<bool, AppError> {
        let _writer = self.writer.lock();
        self.reload_locked()
    }

    /// Caller holds the writer lock.
    fn reload_locked(&self) -> Result<bool, AppError> {
        let Some(record) = self.store.load()? else {
            return Ok(false);
        };
        if record.revision == self.state.read().revision {
            return Ok(false);
        }
        self.adopt(record)?;
        Ok(true)
    }

    /// Replace the in-memory state with a stored record. Caller holds the writer lock.
    fn adopt(&self, record: RegistryRecord) -> Result<(), AppError> {
        record.validate()?;
        let entries = entries_from_records(record.entries)?;

        let mut state = self.state.write();
        state.entries = entries;
        state.refresh_interval_minutes = record.refresh_interval_minutes;
        state.revision = record.revision;
        state.generation += 1;
        info!(
            entries = state.entries.len(),
            refresh_interval_minutes = state.refresh_interval_minutes,
            revision = state.revision,
            "registry reloaded from store"
        );
        Ok(())
    }

    fn commit<F>(&self, build: F, refresh_interval_minutes: Option<i64>) -> Result<(), AppError>
    where
        F: FnOnce(&[ConfigEntry]) -> Result<Option<Vec<ConfigEntry>>, AppError>,
    {
        let _writer = self.writer.lock();
        self.reload_locked()?;

        let (entries, record) = {
            let state = self.state.read();
            let entries = build(state.entries.as_slice())?;
            let record = RegistryRecord {
                revision: state.revision + 1,
                refresh_interval_minutes: refresh_interval_minutes
                    .unwrap_or(state.refresh_interval_minutes),
                entries: entries
                    .as_deref()
                    .unwrap_or(state.entries.as_slice())
                    .iter()
                    .map(ConfigEntry::to_record)
                    .collect(),
                ..RegistryRecord::default()
            };
            (entries, record)
        };
        self.store.save(&record)?;

        let mut state = self.state.write();
        state.revision = record.revision;
        state.refresh_interval_minutes = record.refresh_interval_minutes;
        if let Some(entries) = entries {
            state.entries = entries;
            state.generation += 1;
        }
        info!(
            entries = state.entries.len(),
            refresh_interval_minutes = state.refresh_interval_minutes,
            revision = state.revision,
            "registry saved"
        );
        Ok(())
    }

    /// Persist cached text of the named entries after a refresh.
    ///
    /// When another handle saved in the meantime, only the refreshed text is written
    /// into the stored record, for entries that still point at the same file, and the
    /// result is adopted. Everything else the other handle wrote is kept.
    pub(crate) fn persist_refreshed(&self, refreshed: &[String]) -> Result<(), AppError> {
        let _writer = self.writer.lock();

        let stored = self.store.load()?;
        let known_revision = self.state.read().revision;
        match stored {
            Some(mut stored) if stored.revision != known_revision => {
                let merged = {
                    let state = self.state.read();
                    merge_cached_text(&mut stored, &state.entries, refreshed);
                    stored.revision += 1;
                    stored
                };
                self.store.save(&merged)?;
                debug!(revision = merged.revision, "merged refreshed text into newer stored state");
                self.adopt(merged)
            }
            _ => {
                let mut record = self.state.read().to_record();
                record.revision = known_revision + 1;
                self.store.save(&record)?;
                self.state.write().revision = record.revision;
                Ok(())
            }
        }
    }

    /// Install fetched text into the slot it was read from, unless the list moved on.
    pub(crate) fn apply_fetched(&self, slot: EntrySlot, fetched: FetchedText) -> ApplyOutcome {
        let _writer = self.writer.lock();
        let mut state = self.state.write();
        if state.generation != slot.generation {
            return ApplyOutcome::Stale;
        }
        match state.entries.get_mut(slot.index) {
            Some(entry) => {
                entry.apply(fetched);
                debug!(entry = %entry.name(), "applied refreshed text");
                ApplyOutcome::Applied
            }
            None => ApplyOutcome::Stale,
        }
    }

    /// Guard held for the duration of a refresh; `None` when one is already running.
    pub(crate) fn try_begin_pass(&self) -> Option<parking_lot::MutexGuard<'_, ()>> {
        self.pass.try_lock()
    }

    /// Copies of all entries with their slots, for work done outside the lock.
    pub(crate) fn slots(&self) -> Vec<(EntrySlot, ConfigEntry)> {
        let state = self.state.read();
        state
            .entries
            .iter()
            .enumerate()
            .map(|(index, entry)| (EntrySlot { generation: state.generation, index }, entry.clone()))
            .collect()
    }

    pub(crate) fn slot_of(&self, name: &str) -> Result<(EntrySlot, ConfigEntry), AppError> {
        let state = self.state.read();
        let (index, entry) = state.find(name)?;
        Ok((EntrySlot { generation: state.generation, index }, entry.clone()))
    }

    // =========================================================================
    // Read path
    // =========================================================================

    /// First entry whose name matches exactly.
    pub fn get_by_name(&self, name: &str) -> Result<ConfigEntry, AppError> {
        self.state.read().find(name).map(|(_, entry)| entry.clone())
    }

    /// The first entry in insertion order.
    pub fn get_default(&self) -> Result<ConfigEntry, AppError> {
        self.state.read().first().cloned()
    }

    /// Isolated snapshot of the named entry, or of the default entry for `None`.
    pub fn snapshot(&self, name: Option<&str>) -> Result<Snapshot, AppError> {
        let state = self.state.read();
        let entry = match name {
            Some(name) => state.find(name)?.1,
            None => state.first()?,
        };
        entry.snapshot()
    }

    pub fn entries(&self) -> Vec<ConfigEntry> {
        self.state.read().entries.clone()
    }

    pub fn names(&self) -> Vec<String> {
        self.state.read().entries.iter().map(|e| e.name().to_string()).collect()
    }

    /// Distinct non-empty categories.
    pub fn categories(&self) -> BTreeSet<String> {
        self.state
            .read()
            .entries
            .iter()
            .filter(|e| !e.category().is_empty())
            .map(|e| e.category().to_string())
            .collect()
    }

    pub fn by_category(&self, category: &str) -> Vec<ConfigEntry> {
        self.state.read().entries.iter().filter(|e| e.category() == category).cloned().collect()
    }

    pub fn names_by_category(&self, category: &str) -> Vec<String> {
        self.state
            .read()
            .entries
            .iter()
            .filter(|e| e.category() == category)
            .map(|e| e.name().to_string())
            .collect()
    }

    pub fn refresh_interval_minutes(&self) -> i64 {
        self.state.read().refresh_interval_minutes
    }

    pub fn len(&self) -> usize {
        self.state.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.read().entries.is_empty()
    }
}
