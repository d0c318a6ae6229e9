use std::collections::HashMap;
use std::fs;
use std::future::Future;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::error::{RadiatorError, Result};
use crate::model::{Build, BuildStatus, Timestamp};

/// Build outcome tallies for one job since a cutoff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildHistoryRecord {
    pub pipeline_name: String,
    pub job_name: String,
    pub status_counts: IndexMap<BuildStatus, usize>,
    /// Identifier of the newest build when the tally was taken
    pub most_recent_build_id: String,
    pub since: Timestamp,
}

impl BuildHistoryRecord {
    pub fn status_count(&self, status: BuildStatus) -> usize {
        self.status_counts.get(&status).copied().unwrap_or(0)
    }

    fn is_valid_for(&self, most_recent_build_id: &str, since: Timestamp) -> bool {
        self.most_recent_build_id == most_recent_build_id && self.since == since
    }
}

/// Composite storage key for a (pipeline, job) pair.
pub fn history_key(pipeline_name: &str, job_name: &str) -> String {
    format!("{pipeline_name}:{job_name}")
}

/// Counts build outcomes from newest to oldest until a build ended before `since`.
///
/// Builds without an end time are still running and are skipped. The scan
/// stops at the first build older than the cutoff, so `builds` must be sorted
/// newest first.
pub fn tally_builds(builds: &[Build], since: Timestamp) -> IndexMap<BuildStatus, usize> {
    let mut counts = IndexMap::new();

    for build in builds {
        let Some(end_time) = build.end_time else {
            continue;
        };
        if end_time < since {
            break;
        }
        *counts.entry(build.status).or_insert(0) += 1;
    }

    counts
}

/// Persistence for history records across runs.
///
/// Stores are best-effort: a missing record only means the tally is recomputed.
pub trait HistoryStore {
    fn load(&self, key: &str) -> Option<BuildHistoryRecord>;

    fn save(&mut self, key: &str, record: &BuildHistoryRecord) -> Result<()>;
}

impl<S: HistoryStore + ?Sized> HistoryStore for Box<S> {
    fn load(&self, key: &str) -> Option<BuildHistoryRecord> {
        (**self).load(key)
    }

    fn save(&mut self, key: &str, record: &BuildHistoryRecord) -> Result<()> {
        (**self).save(key, record)
    }
}

/// Store that lives only as long as the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: HashMap<String, BuildHistoryRecord>,
}

impl HistoryStore for MemoryStore {
    fn load(&self, key: &str) -> Option<BuildHistoryRecord> {
        self.records.get(key).cloned()
    }

    fn save(&mut self, key: &str, record: &BuildHistoryRecord) -> Result<()> {
        self.records.insert(key.to_owned(), record.clone());
        Ok(())
    }
}

/// JSON file store, one file per backend.
///
/// Lives in the platform cache directory:
/// - Linux: `~/.cache/ciradiator/{backend-slug}.json`
/// - macOS: `~/Library/Caches/ciradiator/{backend-slug}.json`
///
/// The file is read once on open and rewritten in full on every save.
pub struct FileStore {
    path: PathBuf,
    records: HashMap<String, BuildHistoryRecord>,
}

impl FileStore {
    /// Opens the store for a backend, creating the cache directory if needed.
    ///
    /// # Errors
    ///
    /// Returns error if the cache directory cannot be determined or created.
    pub fn open(backend_slug: &str) -> Result<Self> {
        let path = Self::default_path(backend_slug)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(Self::open_at(path))
    }

    /// Opens a store backed by an explicit file. Unreadable files start empty.
    pub fn open_at(path: PathBuf) -> Self {
        let records = if path.exists() {
            fs::read_to_string(&path)
                .ok()
                .and_then(|content| serde_json::from_str(&content).ok())
                .inspect(|_| debug!("Loaded build history from: {}", path.display()))
                .unwrap_or_else(|| {
                    warn!("Failed to load build history, starting with empty cache");
                    HashMap::new()
                })
        } else {
            HashMap::new()
        };

        Self { path, records }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Removes the cache file for a backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the cache file cannot be removed.
    pub fn clear(backend_slug: &str) -> Result<()> {
        let path = Self::default_path(backend_slug)?;

        if path.exists() {
            fs::remove_file(&path)?;
            info!("Cache cleared: {}", path.display());
        } else {
            info!("No cache file found for: {backend_slug}");
        }

        Ok(())
    }

    fn default_path(backend_slug: &str) -> Result<PathBuf> {
        let file_name = backend_slug.replace(['/', ':'], "-") + ".json";
        Ok(dirs::cache_dir()
            .ok_or_else(|| RadiatorError::Cache("No cache directory found".into()))?
            .join("ciradiator")
            .join(file_name))
    }
}

impl HistoryStore for FileStore {
    fn load(&self, key: &str) -> Option<BuildHistoryRecord> {
        self.records.get(key).cloned()
    }

    fn save(&mut self, key: &str, record: &BuildHistoryRecord) -> Result<()> {
        self.records.insert(key.to_owned(), record.clone());

        let content = serde_json::to_string(&self.records)?;
        fs::write(&self.path, content)?;

        debug!(
            "Saved {} history records to: {}",
            self.records.len(),
            self.path.display()
        );

        Ok(())
    }
}

/// Memoized build-outcome tallies keyed by (pipeline, job).
///
/// A record is reused only while both the newest build identifier and the
/// cutoff match the request exactly. Anything else recomputes the tally from
/// a fresh build list and replaces the record wholesale. There is no
/// time-based expiry.
pub struct BuildHistoryCache<S> {
    records: HashMap<String, BuildHistoryRecord>,
    store: S,
}

impl<S: HistoryStore> BuildHistoryCache<S> {
    pub fn new(store: S) -> Self {
        Self {
            records: HashMap::new(),
            store,
        }
    }

    /// Returns the valid record for a key, consulting the store when nothing is held in memory.
    fn lookup(
        &mut self,
        key: &str,
        most_recent_build_id: &str,
        since: Timestamp,
    ) -> Option<BuildHistoryRecord> {
        if let Some(record) = self.records.get(key) {
            return record
                .is_valid_for(most_recent_build_id, since)
                .then(|| record.clone());
        }

        let record = self
            .store
            .load(key)
            .filter(|r| r.is_valid_for(most_recent_build_id, since))?;
        debug!("Build history for {key} restored from store");
        self.records.insert(key.to_owned(), record.clone());
        Some(record)
    }

    fn record(
        &mut self,
        key: String,
        pipeline_name: &str,
        job_name: &str,
        most_recent_build_id: &str,
        since: Timestamp,
        builds: &[Build],
    ) -> BuildHistoryRecord {
        let record = BuildHistoryRecord {
            pipeline_name: pipeline_name.to_owned(),
            job_name: job_name.to_owned(),
            status_counts: tally_builds(builds, since),
            most_recent_build_id: most_recent_build_id.to_owned(),
            since,
        };

        if let Err(e) = self.store.save(&key, &record) {
            warn!("Failed to persist build history for {key}: {e}");
        }
        self.records.insert(key, record.clone());
        record
    }

    /// Returns the tally for a job, awaiting `fetch` for its build list only when
    /// the held record is missing or stale.
    ///
    /// # Errors
    ///
    /// Propagates the error returned by `fetch`. The previous record is kept in that case.
    pub async fn get_history<F, Fut, E>(
        &mut self,
        pipeline_name: &str,
        job_name: &str,
        most_recent_build_id: &str,
        since: Timestamp,
        fetch: F,
    ) -> std::result::Result<BuildHistoryRecord, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = std::result::Result<Vec<Build>, E>>,
    {
        let key = history_key(pipeline_name, job_name);
        if let Some(record) = self.lookup(&key, most_recent_build_id, since) {
            return Ok(record);
        }

        debug!("Recomputing build history for {key}");
        let builds = fetch().await?;
        Ok(self.record(key, pipeline_name, job_name, most_recent_build_id, since, &builds))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use tempfile::TempDir;
    use tokio_test::block_on;

    fn ended(status: BuildStatus, end: Timestamp) -> Build {
        Build::finished(None, status, end - 5, end)
    }

    type Fetched = std::future::Ready<std::result::Result<Vec<Build>, RadiatorError>>;

    fn fetch_counting<'a>(
        calls: &'a Cell<usize>,
        builds: Vec<Build>,
    ) -> impl FnOnce() -> Fetched + 'a {
        move || {
            calls.set(calls.get() + 1);
            std::future::ready(Ok(builds))
        }
    }

    fn sample_builds() -> Vec<Build> {
        vec![
            Build::running(Some("8".into()), 3000),
            ended(BuildStatus::Succeeded, 2500),
            ended(BuildStatus::Failed, 2200),
            ended(BuildStatus::Succeeded, 1500),
            ended(BuildStatus::Succeeded, 900),
        ]
    }

    #[test]
    fn tally_stops_at_first_build_before_cutoff() {
        let builds = vec![
            ended(BuildStatus::Succeeded, 2000),
            ended(BuildStatus::Failed, 500),
        ];
        let counts = tally_builds(&builds, 1000);
        assert_eq!(counts.get(&BuildStatus::Succeeded), Some(&1));
        assert_eq!(counts.get(&BuildStatus::Failed), None);
    }

    #[test]
    fn tally_skips_running_builds() {
        let counts = tally_builds(&sample_builds(), 1000);
        assert_eq!(counts[&BuildStatus::Succeeded], 2);
        assert_eq!(counts[&BuildStatus::Failed], 1);
        assert!(!counts.contains_key(&BuildStatus::Started));
    }

    #[test]
    fn tally_is_a_short_circuit_not_a_filter() {
        // An out-of-order newer build after an old one is never reached.
        let builds = vec![
            ended(BuildStatus::Failed, 500),
            ended(BuildStatus::Succeeded, 5000),
        ];
        assert!(tally_builds(&builds, 1000).is_empty());
    }

    #[test]
    fn status_count_defaults_to_zero() {
        let mut cache = BuildHistoryCache::new(MemoryStore::default());
        let calls = Cell::new(0);
        let record = block_on(cache.get_history("p", "j", "build-7", 1000, fetch_counting(&calls, vec![]))).unwrap();
        assert_eq!(record.status_count(BuildStatus::Succeeded), 0);
        assert_eq!(record.status_count(BuildStatus::Errored), 0);
    }

    #[test]
    fn identical_requests_fetch_once() {
        let mut cache = BuildHistoryCache::new(MemoryStore::default());
        let calls = Cell::new(0);

        let first = block_on(cache.get_history("p", "j", "build-7", 1000, fetch_counting(&calls, sample_builds()))).unwrap();
        let second = block_on(cache.get_history("p", "j", "build-7", 1000, fetch_counting(&calls, sample_builds()))).unwrap();

        assert_eq!(calls.get(), 1);
        assert_eq!(first, second);
        assert_eq!(second.status_count(BuildStatus::Succeeded), 2);
    }

    #[test]
    fn changed_cutoff_triggers_recomputation() {
        let mut cache = BuildHistoryCache::new(MemoryStore::default());
        let calls = Cell::new(0);

        for _ in 0..2 {
            block_on(cache.get_history("p", "j", "build-7", 1000, fetch_counting(&calls, sample_builds()))).unwrap();
        }
        let record = block_on(cache.get_history("p", "j", "build-7", 2000, fetch_counting(&calls, sample_builds()))).unwrap();

        assert_eq!(calls.get(), 2);
        assert_eq!(record.since, 2000);
        assert_eq!(record.status_count(BuildStatus::Succeeded), 1);
        assert_eq!(record.status_count(BuildStatus::Failed), 1);
    }

    #[test]
    fn new_build_identifier_triggers_recomputation() {
        let mut cache = BuildHistoryCache::new(MemoryStore::default());
        let calls = Cell::new(0);

        block_on(cache.get_history("p", "j", "build-7", 1000, fetch_counting(&calls, sample_builds()))).unwrap();
        let record = block_on(cache.get_history("p", "j", "build-8", 1000, fetch_counting(&calls, vec![]))).unwrap();

        assert_eq!(calls.get(), 2);
        assert_eq!(record.most_recent_build_id, "build-8");
        assert!(record.status_counts.is_empty());
    }

    #[test]
    fn keys_are_independent_per_job() {
        let mut cache = BuildHistoryCache::new(MemoryStore::default());
        let calls = Cell::new(0);

        block_on(cache.get_history("p", "a", "1", 0, fetch_counting(&calls, sample_builds()))).unwrap();
        block_on(cache.get_history("p", "b", "1", 0, fetch_counting(&calls, sample_builds()))).unwrap();

        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn failed_fetch_propagates() {
        let mut cache = BuildHistoryCache::new(MemoryStore::default());
        let result = block_on(cache.get_history("p", "j", "1", 0, || async {
            Err::<Vec<Build>, _>(RadiatorError::Authentication("Authorization Error".into()))
        }));
        assert!(matches!(result, Err(RadiatorError::Authentication(_))));
    }

    #[test]
    fn awaited_fetch_runs_once_per_record() {
        let mut cache = BuildHistoryCache::new(MemoryStore::default());
        let calls = Cell::new(0);

        block_on(async {
            for _ in 0..3 {
                cache
                    .get_history("p", "j", "build-7", 1000, || async {
                        calls.set(calls.get() + 1);
                        Ok::<_, RadiatorError>(sample_builds())
                    })
                    .await
                    .unwrap();
            }
        });

        assert_eq!(calls.get(), 1);
        let record = block_on(cache.get_history("p", "j", "build-7", 1000, fetch_counting(&calls, vec![]))).unwrap();
        assert_eq!(calls.get(), 1);
        assert_eq!(record.status_count(BuildStatus::Succeeded), 2);
    }

    #[test]
    fn file_store_survives_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("concourse-ci.example.com.json");
        let calls = Cell::new(0);

        {
            let mut cache = BuildHistoryCache::new(FileStore::open_at(path.clone()));
            block_on(cache.get_history("p", "j", "build-7", 1000, fetch_counting(&calls, sample_builds()))).unwrap();
        }
        assert!(path.exists());

        let mut cache = BuildHistoryCache::new(FileStore::open_at(path.clone()));
        let record = block_on(cache.get_history("p", "j", "build-7", 1000, fetch_counting(&calls, vec![]))).unwrap();

        assert_eq!(calls.get(), 1);
        assert_eq!(record.status_count(BuildStatus::Succeeded), 2);
    }

    #[test]
    fn stale_stored_record_is_recomputed() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("history.json");
        let calls = Cell::new(0);

        let mut cache = BuildHistoryCache::new(FileStore::open_at(path.clone()));
        block_on(cache.get_history("p", "j", "build-7", 1000, fetch_counting(&calls, sample_builds()))).unwrap();

        let mut reopened = BuildHistoryCache::new(FileStore::open_at(path));
        block_on(reopened.get_history("p", "j", "build-9", 1000, fetch_counting(&calls, vec![]))).unwrap();

        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn corrupt_file_starts_empty() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("history.json");
        fs::write(&path, "not json").unwrap();

        let store = FileStore::open_at(path);
        assert!(store.load("p:j").is_none());
    }

    #[test]
    fn history_key_joins_pipeline_and_job() {
        assert_eq!(history_key("web", "health-check"), "web:health-check");
    }
}
