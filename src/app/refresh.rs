//! Refresh passes over remote-backed entries.
//!
//! Fetching and parsing happen with no registry lock held. Each result is applied
//! on its own, so one slow or failing entry never holds back the others.

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tracing::{error, info, warn};

use crate::app::registry::{ApplyOutcome, ConfigRegistry};
use crate::domain::AppError;
use crate::ports::{CredentialProvider, RemoteRepository};

/// One entry that could not be refreshed during a pass.
#[derive(Debug)]
pub struct RefreshFailure {
    pub entry: String,
    pub error: AppError,
}

/// Summary of a refresh pass.
#[derive(Debug)]
pub struct RefreshReport {
    pub started_at: DateTime<Utc>,
    pub duration: Duration,
    /// Remote entries whose text was replaced.
    pub refreshed: Vec<String>,
    /// Inline entries, which have nothing to fetch.
    pub skipped: Vec<String>,
    /// Remote entries whose results arrived after the entry list was replaced.
    pub discarded: Vec<String>,
    pub failures: Vec<RefreshFailure>,
    /// Error persisting refreshed cache text, if any.
    pub persist_error: Option<AppError>,
}

impl RefreshReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty() && self.persist_error.is_none()
    }
}

impl ConfigRegistry {
    /// Refresh every entry in order, collecting failures without stopping.
    ///
    /// Fails with `RefreshInProgress` when another pass is running.
    pub fn refresh_all(
        &self,
        repository: &dyn RemoteRepository,
        credentials: &dyn CredentialProvider,
    ) -> Result<RefreshReport, AppError> {
        let _pass = self.try_begin_pass().ok_or(AppError::RefreshInProgress)?;
        self.reload()?;

        let started_at = Utc::now();
        let clock = Instant::now();
        let mut report = RefreshReport {
            started_at,
            duration: Duration::ZERO,
            refreshed: Vec::new(),
            skipped: Vec::new(),
            discarded: Vec::new(),
            failures: Vec::new(),
            persist_error: None,
        };

        for (slot, entry) in self.slots() {
            let name = entry.name().to_string();
            info!(entry = %name, "processing");

            match entry.fetch_update(repository, credentials) {
                Ok(Some(fetched)) => match self.apply_fetched(slot, fetched) {
                    ApplyOutcome::Applied => report.refreshed.push(name),
                    ApplyOutcome::Stale => {
                        warn!(entry = %name, "entry list replaced during refresh; result discarded");
                        report.discarded.push(name);
                    }
                },
                Ok(None) => report.skipped.push(name),
                Err(err) => {
                    error!(entry = %name, error = %err, "refresh failed; keeping previous config");
                    report.failures.push(RefreshFailure { entry: name, error: err });
                }
            }
        }

        if !report.refreshed.is_empty()
            && let Err(err) = self.persist_refreshed(&report.refreshed)
        {
            error!(error = %err, "failed to persist refreshed configs");
            report.persist_error = Some(err);
        }

        report.duration = clock.elapsed();
        info!(
            refreshed = report.refreshed.len(),
            failed = report.failures.len(),
            duration_ms = report.duration.as_millis() as u64,
            "refresh completed"
        );
        Ok(report)
    }

    /// Refresh a single entry on request; its failure is returned to the caller.
    ///
    /// Returns `true` when new text was applied.
    pub fn refresh_entry(
        &self,
        name: &str,
        repository: &dyn RemoteRepository,
        credentials: &dyn CredentialProvider,
    ) -> Result<bool, AppError> {
        let _pass = self.try_begin_pass().ok_or(AppError::RefreshInProgress)?;
        self.reload()?;

        let (slot, entry) = self.slot_of(name)?;
        let Some(fetched) = entry.fetch_update(repository, credentials)? else {
            return Ok(false);
        };

        match self.apply_fetched(slot, fetched) {
            ApplyOutcome::Applied => {
                self.persist_refreshed(&[name.to_string()])?;
                info!(entry = %name, "refreshed on request");
                Ok(true)
            }
            ApplyOutcome::Stale => Err(AppError::State(format!(
                "config '{}' was replaced while it was being refreshed",
                name
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ConfigEntry, ConfigSource, RemoteSource};
    use crate::testing::{FakeRepository, MemoryRegistryStore, StaticCredentials};
    use std::sync::Arc;
    use std::thread;

    fn remote(name: &str, path: &str, cached: &str) -> ConfigEntry {
        let mut source = RemoteSource::new("acme", "ops", "main", path, "gh");
        source.cached_text = Some(cached.to_string());
        ConfigEntry::new(name, "", ConfigSource::Remote(source)).unwrap()
    }

    fn location(path: &str) -> String {
        format!("acme/ops@main:{path}")
    }

    fn registry(entries: Vec<ConfigEntry>) -> (ConfigRegistry, MemoryRegistryStore) {
        let store = MemoryRegistryStore::default();
        let registry = ConfigRegistry::open(store.clone()).unwrap();
        registry.set_entries(entries).unwrap();
        (registry, store)
    }

    fn value(registry: &ConfigRegistry, name: &str) -> Option<String> {
        registry.snapshot(Some(name)).unwrap().values.get("v").and_then(|v| v.as_str()).map(String::from)
    }

    #[test]
    fn failing_middle_entry_does_not_block_others() {
        let (registry, _) = registry(vec![
            remote("one", "1.yml", "v: old1"),
            remote("two", "2.yml", "v: old2"),
            remote("three", "3.yml", "v: old3"),
        ]);
        let repository = FakeRepository::default();
        repository.serve(&location("1.yml"), "v: new1");
        repository.fail(&location("2.yml"), "connection reset");
        repository.serve(&location("3.yml"), "v: new3");

        let report = registry.refresh_all(&repository, &StaticCredentials::with("gh", "t")).unwrap();

        assert_eq!(report.refreshed, vec!["one", "three"]);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].entry, "two");
        assert!(report.failures[0].error.is_fetch_error());
        assert_eq!(value(&registry, "one").as_deref(), Some("new1"));
        assert_eq!(value(&registry, "two").as_deref(), Some("old2"));
        assert_eq!(value(&registry, "three").as_deref(), Some("new3"));
    }

    #[test]
    fn entries_are_processed_in_registry_order() {
        let (registry, _) = registry(vec![
            remote("b", "b.yml", ""),
            remote("a", "a.yml", ""),
        ]);
        let repository = FakeRepository::default();

        registry.refresh_all(&repository, &StaticCredentials::with("gh", "t")).unwrap();

        assert_eq!(repository.calls(), vec![location("b.yml"), location("a.yml")]);
    }

    #[test]
    fn unparsable_remote_text_keeps_previous_mapping() {
        let (registry, _) = registry(vec![remote("one", "1.yml", "v: old")]);
        let repository = FakeRepository::default();
        repository.serve(&location("1.yml"), "v: [broken");

        let report = registry.refresh_all(&repository, &StaticCredentials::with("gh", "t")).unwrap();

        assert!(matches!(report.failures[0].error, AppError::Parse { .. }));
        assert_eq!(value(&registry, "one").as_deref(), Some("old"));
    }

    #[test]
    fn missing_credential_is_a_per_entry_failure() {
        let (registry, _) = registry(vec![remote("one", "1.yml", "v: old")]);

        let report =
            registry.refresh_all(&FakeRepository::default(), &StaticCredentials::default()).unwrap();

        assert!(matches!(report.failures[0].error, AppError::CredentialNotFound(_)));
    }

    #[test]
    fn refreshed_cache_is_persisted() {
        let (registry, store) = registry(vec![
            ConfigEntry::new("inline", "", ConfigSource::inline("v: x")).unwrap(),
            remote("one", "1.yml", "v: old"),
        ]);
        let repository = FakeRepository::default();
        repository.serve(&location("1.yml"), "v: new");

        let report = registry.refresh_all(&repository, &StaticCredentials::with("gh", "t")).unwrap();

        assert!(report.is_clean());
        assert_eq!(report.skipped, vec!["inline"]);
        let record = store.record().unwrap();
        match &record.entries[1].source {
            ConfigSource::Remote(remote) => assert_eq!(remote.cached_text.as_deref(), Some("v: new")),
            other => panic!("unexpected source {other:?}"),
        }
    }

    #[test]
    fn pass_without_changes_does_not_persist() {
        let (registry, store) = registry(vec![remote("one", "1.yml", "v: old")]);
        let saves = store.save_count();

        registry.refresh_all(&FakeRepository::default(), &StaticCredentials::default()).unwrap();

        assert_eq!(store.save_count(), saves);
    }

    #[test]
    fn persist_failure_is_reported_but_memory_is_updated() {
        let (registry, store) = registry(vec![remote("one", "1.yml", "v: old")]);
        let repository = FakeRepository::default();
        repository.serve(&location("1.yml"), "v: new");
        store.fail_saves(true);

        let report = registry.refresh_all(&repository, &StaticCredentials::with("gh", "t")).unwrap();

        assert!(report.persist_error.is_some());
        assert!(!report.is_clean());
        assert_eq!(value(&registry, "one").as_deref(), Some("new"));
    }

    #[test]
    fn refresh_entry_propagates_failure() {
        let (registry, _) = registry(vec![remote("one", "1.yml", "v: old")]);

        let err = registry
            .refresh_entry("one", &FakeRepository::default(), &StaticCredentials::with("gh", "t"))
            .unwrap_err();

        assert!(err.is_fetch_error());
        assert_eq!(value(&registry, "one").as_deref(), Some("old"));
    }

    #[test]
    fn refresh_entry_unknown_name_is_lookup_error() {
        let (registry, _) = registry(vec![]);
        let err = registry
            .refresh_entry("nope", &FakeRepository::default(), &StaticCredentials::default())
            .unwrap_err();
        assert!(err.is_lookup_error());
    }

    #[test]
    fn overlapping_pass_is_refused_and_reads_stay_available() {
        let (registry, _) = registry(vec![
            remote("slow", "slow.yml", "v: old"),
            ConfigEntry::new("other", "", ConfigSource::inline("v: here")).unwrap(),
        ]);
        let registry = Arc::new(registry);
        let repository = FakeRepository::default();
        repository.serve(&location("slow.yml"), "v: new");
        let gate = repository.hold(&location("slow.yml"));
        let credentials = StaticCredentials::with("gh", "t");

        let background = {
            let registry = Arc::clone(&registry);
            let repository = repository.clone();
            let credentials = credentials.clone();
            thread::spawn(move || registry.refresh_all(&repository, &credentials).map(|r| r.refreshed))
        };

        assert!(gate.wait_entered());
        assert_eq!(value(&registry, "other").as_deref(), Some("here"));
        assert_eq!(value(&registry, "slow").as_deref(), Some("old"));
        assert!(matches!(
            registry.refresh_all(&repository, &credentials),
            Err(AppError::RefreshInProgress)
        ));

        gate.open();
        let refreshed = background.join().unwrap().unwrap();
        assert_eq!(refreshed, vec!["slow"]);
        assert_eq!(value(&registry, "slow").as_deref(), Some("new"));
    }

    #[test]
    fn results_for_replaced_entries_are_discarded() {
        let (registry, _) = registry(vec![remote("one", "1.yml", "v: old")]);
        let registry = Arc::new(registry);
        let repository = FakeRepository::default();
        repository.serve(&location("1.yml"), "v: fetched");
        let gate = repository.hold(&location("1.yml"));

        let background = {
            let registry = Arc::clone(&registry);
            let repository = repository.clone();
            thread::spawn(move || {
                registry.refresh_all(&repository, &StaticCredentials::with("gh", "t")).unwrap()
            })
        };

        assert!(gate.wait_entered());
        registry.set_entries(vec![remote("one", "1.yml", "v: admin")]).unwrap();
        gate.open();

        let report = background.join().unwrap();
        assert_eq!(report.discarded, vec!["one"]);
        assert_eq!(value(&registry, "one").as_deref(), Some("admin"));
    }

    fn cached_text(record: &crate::domain::RegistryRecord, name: &str) -> Option<String> {
        record.entries.iter().find(|e| e.name == name).and_then(|e| match &e.source {
            ConfigSource::Remote(remote) => remote.cached_text.clone(),
            ConfigSource::Inline(_) => None,
        })
    }

    #[test]
    fn pass_keeps_writes_made_through_another_handle() {
        let (watcher, store) = registry(vec![remote("shared", "s.yml", "v: old")]);
        let admin = ConfigRegistry::open(store.clone()).unwrap();
        admin
            .replace(
                vec![
                    remote("shared", "s.yml", "v: old"),
                    ConfigEntry::new("added", "", ConfigSource::inline("v: admin")).unwrap(),
                ],
                Some(5),
            )
            .unwrap();
        let repository = FakeRepository::default();
        repository.serve(&location("s.yml"), "v: new");

        let report = watcher.refresh_all(&repository, &StaticCredentials::with("gh", "t")).unwrap();

        assert!(report.is_clean());
        assert_eq!(watcher.names(), vec!["shared", "added"]);
        let reopened = ConfigRegistry::open(store.clone()).unwrap();
        assert_eq!(reopened.names(), vec!["shared", "added"]);
        assert_eq!(reopened.refresh_interval_minutes(), 5);
        assert_eq!(cached_text(&store.record().unwrap(), "shared").as_deref(), Some("v: new"));
    }

    #[test]
    fn write_during_a_pass_is_merged_with_refreshed_text() {
        let (watcher, store) = registry(vec![remote("shared", "s.yml", "v: old")]);
        let watcher = Arc::new(watcher);
        let admin = ConfigRegistry::open(store.clone()).unwrap();
        let repository = FakeRepository::default();
        repository.serve(&location("s.yml"), "v: new");
        let gate = repository.hold(&location("s.yml"));

        let background = {
            let watcher = Arc::clone(&watcher);
            let repository = repository.clone();
            thread::spawn(move || {
                watcher.refresh_all(&repository, &StaticCredentials::with("gh", "t")).unwrap()
            })
        };

        assert!(gate.wait_entered());
        admin
            .replace(
                vec![
                    remote("shared", "s.yml", "v: old"),
                    ConfigEntry::new("added", "", ConfigSource::inline("v: admin")).unwrap(),
                ],
                Some(5),
            )
            .unwrap();
        gate.open();

        let report = background.join().unwrap();
        assert!(report.is_clean());
        let record = store.record().unwrap();
        assert_eq!(record.refresh_interval_minutes, 5);
        assert_eq!(record.entries.len(), 2);
        assert_eq!(cached_text(&record, "shared").as_deref(), Some("v: new"));
        assert_eq!(watcher.names(), vec!["shared", "added"]);
        assert_eq!(watcher.refresh_interval_minutes(), 5);
        assert_eq!(value(&watcher, "shared").as_deref(), Some("new"));
    }

    #[test]
    fn refreshed_text_is_not_merged_into_a_moved_entry() {
        let (watcher, store) = registry(vec![remote("shared", "s.yml", "v: old")]);
        let watcher = Arc::new(watcher);
        let admin = ConfigRegistry::open(store.clone()).unwrap();
        let repository = FakeRepository::default();
        repository.serve(&location("s.yml"), "v: new");
        let gate = repository.hold(&location("s.yml"));

        let background = {
            let watcher = Arc::clone(&watcher);
            let repository = repository.clone();
            thread::spawn(move || {
                watcher.refresh_all(&repository, &StaticCredentials::with("gh", "t")).unwrap()
            })
        };

        assert!(gate.wait_entered());
        admin.set_entries(vec![remote("shared", "moved.yml", "")]).unwrap();
        gate.open();

        background.join().unwrap();
        assert_eq!(cached_text(&store.record().unwrap(), "shared").as_deref(), Some(""));
        assert_eq!(value(&watcher, "shared"), None);
    }
}
