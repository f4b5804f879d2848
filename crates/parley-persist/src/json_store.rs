//! Single-file JSON snapshots.
//!
//! A [`JsonStore`] owns one file, `<dir>/<name>.json`. Loads are forgiving: a
//! missing or unreadable file yields the type's default and a warning. Saves
//! write a sibling temporary file and rename it over the target, so a reader
//! never observes a half-written snapshot.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::Result;

/// A JSON snapshot file.
#[derive(Debug, Clone)]
pub struct JsonStore {
    path: PathBuf,
}

impl JsonStore {
    /// Creates a store for `<dir>/<name>.json`. Nothing touches the disk yet.
    pub fn new(dir: &Path, name: &str) -> Self {
        Self {
            path: dir.join(format!("{name}.json")),
        }
    }

    /// Path of the snapshot file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns true if a snapshot has been written.
    #[must_use]
    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Loads the snapshot, falling back to `T::default()` when the file is
    /// missing or cannot be parsed.
    pub fn load<T: DeserializeOwned + Default>(&self) -> T {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no snapshot on disk");
                return T::default();
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "failed to read snapshot");
                return T::default();
            }
        };
        match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "failed to parse snapshot");
                T::default()
            }
        }
    }

    /// Writes the snapshot atomically (temporary file, then rename).
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created, or the value
    /// cannot be serialized or written.
    pub fn save<T: Serialize>(&self, value: &T) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)?;
        }
        let json = serde_json::to_vec_pretty(value)?;
        let tmp = self.path.with_extension("json.tmp");
        {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(&json)?;
            file.sync_all()?;
        }
        fs::rename(&tmp, &self.path)?;
        debug!(path = %self.path.display(), bytes = json.len(), "snapshot written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn missing_file_loads_default() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = JsonStore::new(dir.path(), "nothing");
        let loaded: Vec<u32> = store.load();
        assert!(loaded.is_empty());
        assert!(!store.exists());
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = JsonStore::new(dir.path(), "numbers");
        let mut map = HashMap::new();
        map.insert("a".to_string(), 1u32);
        store.save(&map).expect("save");

        let loaded: HashMap<String, u32> = store.load();
        assert_eq!(loaded, map);
        assert!(store.exists());
        assert!(!store.path().with_extension("json.tmp").exists());
    }

    #[test]
    fn save_creates_missing_directory() {
        let dir = tempfile::tempdir().expect("tempdir");
        let nested = dir.path().join("a").join("b");
        let store = JsonStore::new(&nested, "deep");
        store.save(&vec![1, 2, 3]).expect("save");
        let loaded: Vec<i32> = store.load();
        assert_eq!(loaded, vec![1, 2, 3]);
    }

    #[test]
    fn corrupt_file_loads_default() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = JsonStore::new(dir.path(), "broken");
        fs::write(store.path(), "{not json").expect("write");
        let loaded: Vec<u32> = store.load();
        assert!(loaded.is_empty());
    }
}
