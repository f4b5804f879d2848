//! Per-counterpart concession histories.
//!
//! A history is the ordered list of [`ConcessionRecord`]s collected over every
//! finished session with one counterpart. It is the only agent state that
//! outlives a session: loaded when the counterpart is recognised, appended to
//! when the session ends.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use parking_lot::{Mutex, RwLock};
use parley_core::ConcessionRecord;
use tracing::{debug, info};

use crate::error::{PersistError, Result};
use crate::json_store::JsonStore;

/// Keyed store of concession histories.
///
/// Implementations must treat each key as a single-writer resource: two
/// concurrent `append` calls for the same counterpart must both land.
pub trait HistoryStore: Send + Sync {
    /// Loads the history of `counterpart`, oldest record first.
    ///
    /// Never fails: an unknown counterpart or unreadable store yields an
    /// empty history.
    fn load(&self, counterpart: &str) -> Vec<ConcessionRecord>;

    /// Replaces the whole history of `counterpart`.
    ///
    /// # Errors
    ///
    /// Returns an error if the history cannot be written.
    fn store(&self, counterpart: &str, history: &[ConcessionRecord]) -> Result<()>;

    /// Appends one record and returns the resulting history.
    ///
    /// # Errors
    ///
    /// Returns an error if the history cannot be written.
    fn append(&self, counterpart: &str, record: ConcessionRecord) -> Result<Vec<ConcessionRecord>>;
}

/// Turns a counterpart identity into a file-name-safe key.
///
/// ASCII letters, digits, `-` and `_` pass through, as does `.` anywhere but
/// the first position. Every other byte is written as `%XX`, so distinct
/// identities never share a file.
///
/// # Errors
///
/// Returns [`PersistError::InvalidKey`] for an empty or blank identity.
pub fn sanitize_key(counterpart: &str) -> Result<String> {
    if counterpart.trim().is_empty() {
        return Err(PersistError::InvalidKey(counterpart.to_string()));
    }
    let mut key = String::with_capacity(counterpart.len());
    for (i, byte) in counterpart.bytes().enumerate() {
        let safe = byte.is_ascii_alphanumeric()
            || byte == b'-'
            || byte == b'_'
            || (byte == b'.' && i > 0);
        if safe {
            key.push(char::from(byte));
        } else {
            key.push_str(&format!("%{byte:02X}"));
        }
    }
    Ok(key)
}

/// Serialises every read-modify-write on history files in this process, so
/// two stores opened on the same directory cannot lose an append.
static WRITE_LOCK: Mutex<()> = Mutex::new(());

/// File-backed history store: one JSON file per counterpart in a directory.
#[derive(Debug, Clone)]
pub struct FileHistoryStore {
    dir: PathBuf,
}

impl FileHistoryStore {
    /// Creates a store rooted at `dir`. The directory is created lazily on
    /// the first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Root directory of the store.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn json_store(&self, counterpart: &str) -> Result<JsonStore> {
        let key = sanitize_key(counterpart)?;
        Ok(JsonStore::new(&self.dir, &format!("{key}_history")))
    }
}

impl HistoryStore for FileHistoryStore {
    fn load(&self, counterpart: &str) -> Vec<ConcessionRecord> {
        match self.json_store(counterpart) {
            Ok(store) => {
                let history: Vec<ConcessionRecord> = store.load();
                debug!(counterpart, records = history.len(), "history loaded");
                history
            }
            Err(e) => {
                debug!(counterpart, error = %e, "no history for invalid key");
                Vec::new()
            }
        }
    }

    fn store(&self, counterpart: &str, history: &[ConcessionRecord]) -> Result<()> {
        let store = self.json_store(counterpart)?;
        let _guard = WRITE_LOCK.lock();
        store.save(&history)
    }

    fn append(&self, counterpart: &str, record: ConcessionRecord) -> Result<Vec<ConcessionRecord>> {
        let store = self.json_store(counterpart)?;
        let _guard = WRITE_LOCK.lock();
        let mut history: Vec<ConcessionRecord> = store.load();
        history.push(record);
        store.save(&history)?;
        info!(counterpart, records = history.len(), "history appended");
        Ok(history)
    }
}

/// In-memory history store, for tests and embedding hosts.
#[derive(Debug, Default)]
pub struct MemoryHistoryStore {
    histories: RwLock<HashMap<String, Vec<ConcessionRecord>>>,
}

impl MemoryHistoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of counterparts with a history.
    #[must_use]
    pub fn counterpart_count(&self) -> usize {
        self.histories.read().len()
    }
}

impl HistoryStore for MemoryHistoryStore {
    fn load(&self, counterpart: &str) -> Vec<ConcessionRecord> {
        self.histories
            .read()
            .get(counterpart)
            .cloned()
            .unwrap_or_default()
    }

    fn store(&self, counterpart: &str, history: &[ConcessionRecord]) -> Result<()> {
        sanitize_key(counterpart)?;
        self.histories
            .write()
            .insert(counterpart.to_string(), history.to_vec());
        Ok(())
    }

    fn append(&self, counterpart: &str, record: ConcessionRecord) -> Result<Vec<ConcessionRecord>> {
        sanitize_key(counterpart)?;
        let mut histories = self.histories.write();
        let history = histories.entry(counterpart.to_string()).or_default();
        history.push(record);
        Ok(history.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    fn record(p1: f64) -> ConcessionRecord {
        ConcessionRecord {
            p0: 0.9,
            p1,
            p2: 0.3,
            domain_size: 9,
            opponent_acceptance_time: None,
        }
    }

    // ==========================================================================
    // Key sanitising
    // ==========================================================================

    #[test]
    fn sanitize_escapes_path_characters() {
        assert_eq!(sanitize_key("boulware").unwrap(), "boulware");
        assert_eq!(sanitize_key("team_a.v2").unwrap(), "team_a.v2");
        assert_eq!(sanitize_key("a/b\\c d").unwrap(), "a%2Fb%5Cc%20d");
        assert_eq!(sanitize_key("../etc").unwrap(), "%2E.%2Fetc");
        assert_eq!(sanitize_key(".").unwrap(), "%2E");
        assert_eq!(sanitize_key("50%").unwrap(), "50%25");
        assert!(sanitize_key("   ").is_err());
    }

    #[test]
    fn sanitize_keeps_distinct_identities_apart() {
        let keys = ["team/a", "team_a", "team%2Fa", "agent é", "agent ü", " a", "a"];
        let sanitized: std::collections::HashSet<_> =
            keys.iter().map(|k| sanitize_key(k).unwrap()).collect();
        assert_eq!(sanitized.len(), keys.len());
    }

    // ==========================================================================
    // FileHistoryStore
    // ==========================================================================

    #[test]
    fn file_store_roundtrip_preserves_order() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileHistoryStore::new(dir.path());
        let history = vec![record(0.5), record(0.6), record(0.7)];

        store.store("hardliner", &history).expect("store");
        assert_eq!(store.load("hardliner"), history);
    }

    #[test]
    fn file_store_unknown_key_is_empty() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileHistoryStore::new(dir.path());
        assert!(store.load("stranger").is_empty());
        assert!(store.load("").is_empty());
    }

    #[test]
    fn file_store_survives_reopen() {
        let dir = tempfile::tempdir().expect("tempdir");
        {
            let store = FileHistoryStore::new(dir.path());
            store.append("conceder", record(0.4)).expect("append");
            store.append("conceder", record(0.45)).expect("append");
        }
        let store = FileHistoryStore::new(dir.path());
        let history = store.load("conceder");
        assert_eq!(history, vec![record(0.4), record(0.45)]);
    }

    #[test]
    fn file_store_keeps_similar_counterparts_separate() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileHistoryStore::new(dir.path());

        store.append("team/a", record(0.6)).expect("append");
        store.append("agent ü", record(0.7)).expect("append");

        assert!(store.load("team_a").is_empty());
        assert!(store.load("agent é").is_empty());
        assert_eq!(store.load("team/a"), vec![record(0.6)]);
        assert_eq!(store.load("agent ü"), vec![record(0.7)]);
    }

    #[test]
    fn file_store_dot_key_stays_inside_directory() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileHistoryStore::new(dir.path());
        store.append(".", record(0.5)).expect("append");
        assert!(dir.path().join("%2E_history.json").is_file());
        assert!(store.load("_").is_empty());
    }

    #[test]
    fn file_store_missing_directory_loads_empty_and_creates_on_write() {
        let dir = tempfile::tempdir().expect("tempdir");
        let root = dir.path().join("not").join("yet");
        let store = FileHistoryStore::new(&root);
        assert!(store.load("x").is_empty());
        store.append("x", record(0.5)).expect("append");
        assert!(root.is_dir());
    }

    #[test]
    fn file_store_rejects_blank_key_on_write() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileHistoryStore::new(dir.path());
        assert!(matches!(
            store.append(" ", record(0.5)),
            Err(PersistError::InvalidKey(_))
        ));
    }

    #[test]
    fn file_store_concurrent_appends_do_not_lose_updates() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = Arc::new(FileHistoryStore::new(dir.path()));

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    store
                        .append("shared", record(f64::from(i) / 10.0))
                        .expect("append");
                })
            })
            .collect();
        for h in handles {
            h.join().expect("join");
        }

        assert_eq!(store.load("shared").len(), 8);
    }

    #[test]
    fn file_store_separate_instances_share_the_lock() {
        let dir = tempfile::tempdir().expect("tempdir");
        let root = dir.path().to_path_buf();

        thread::scope(|s| {
            for i in 0..4 {
                let root = root.clone();
                s.spawn(move || {
                    let store = FileHistoryStore::new(root);
                    store
                        .append("shared", record(f64::from(i) / 10.0))
                        .expect("append");
                });
            }
        });

        assert_eq!(FileHistoryStore::new(&root).load("shared").len(), 4);
    }

    // ==========================================================================
    // MemoryHistoryStore
    // ==========================================================================

    #[test]
    fn memory_store_roundtrip() {
        let store = MemoryHistoryStore::new();
        assert!(store.load("anyone").is_empty());

        store.store("a", &[record(0.1)]).expect("store");
        let history = store.append("a", record(0.2)).expect("append");
        assert_eq!(history, vec![record(0.1), record(0.2)]);
        assert_eq!(store.load("a"), history);
        assert_eq!(store.counterpart_count(), 1);
    }
}
