//! Key-value persistence backing routine completion state.
//!
//! The completion store only needs booleans, doubles and key removal, the same
//! surface a platform preferences store offers. Two implementations ship here:
//! [`MemoryKeyValueStore`] for tests and ephemeral use, and
//! [`JsonKeyValueStore`] which writes through to a JSON file.
//!
//! # File Format
//!
//! ```json
//! {
//!   "version": 1,
//!   "values": {
//!     "routine_r1_action_0_completed": true,
//!     "routine_r1_action_0_timestamp": 1767225600.0
//!   }
//! }
//! ```
//!
//! Loading is defensive: a missing file, empty file, corrupt JSON or an
//! unsupported version all yield an empty store rather than an error.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::error::{NestError, Result};

const PREFS_FILE_VERSION: u32 = 1;

/// Boolean/double key-value storage with removal.
///
/// Implementations use interior mutability so a single store can be shared
/// behind `Arc<dyn KeyValueStore>`.
pub trait KeyValueStore: Send + Sync {
    fn get_bool(&self, key: &str) -> Option<bool>;
    fn get_double(&self, key: &str) -> Option<f64>;
    fn set_bool(&self, key: &str, value: bool) -> Result<()>;
    fn set_double(&self, key: &str, value: f64) -> Result<()>;
    fn remove_key(&self, key: &str) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
enum PrefValue {
    Bool(bool),
    Double(f64),
}

impl PrefValue {
    fn as_bool(self) -> Option<bool> {
        match self {
            PrefValue::Bool(value) => Some(value),
            PrefValue::Double(_) => None,
        }
    }

    fn as_double(self) -> Option<f64> {
        match self {
            PrefValue::Double(value) => Some(value),
            PrefValue::Bool(_) => None,
        }
    }
}

fn lock_values(
    values: &Mutex<BTreeMap<String, PrefValue>>,
) -> MutexGuard<'_, BTreeMap<String, PrefValue>> {
    // A poisoned map is still a consistent snapshot of the last completed write.
    values.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

// ═══════════════════════════════════════════════════════════════════════════════
// In-memory store
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Default)]
pub struct MemoryKeyValueStore {
    values: Mutex<BTreeMap<String, PrefValue>>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        lock_values(&self.values).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains_key(&self, key: &str) -> bool {
        lock_values(&self.values).contains_key(key)
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get_bool(&self, key: &str) -> Option<bool> {
        lock_values(&self.values).get(key).and_then(|v| v.as_bool())
    }

    fn get_double(&self, key: &str) -> Option<f64> {
        lock_values(&self.values).get(key).and_then(|v| v.as_double())
    }

    fn set_bool(&self, key: &str, value: bool) -> Result<()> {
        lock_values(&self.values).insert(key.to_string(), PrefValue::Bool(value));
        Ok(())
    }

    fn set_double(&self, key: &str, value: f64) -> Result<()> {
        lock_values(&self.values).insert(key.to_string(), PrefValue::Double(value));
        Ok(())
    }

    fn remove_key(&self, key: &str) -> Result<()> {
        lock_values(&self.values).remove(key);
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// JSON file store
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Serialize, Deserialize)]
struct PrefsFile {
    version: u32,
    #[serde(default)]
    values: BTreeMap<String, PrefValue>,
}

/// File-backed store. Every mutation is written through with temp file + rename;
/// a failed write leaves the in-memory values unchanged.
#[derive(Debug)]
pub struct JsonKeyValueStore {
    values: Mutex<BTreeMap<String, PrefValue>>,
    file_path: PathBuf,
}

impl JsonKeyValueStore {
    pub fn load(file_path: &Path) -> Self {
        Self {
            values: Mutex::new(read_prefs_file(file_path)),
            file_path: file_path.to_path_buf(),
        }
    }

    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    fn mutate<F>(&self, apply: F) -> Result<()>
    where
        F: FnOnce(&mut BTreeMap<String, PrefValue>),
    {
        let mut values = lock_values(&self.values);
        let mut staged = values.clone();
        apply(&mut staged);
        write_prefs_file(&self.file_path, &staged)?;
        *values = staged;
        Ok(())
    }
}

impl KeyValueStore for JsonKeyValueStore {
    fn get_bool(&self, key: &str) -> Option<bool> {
        lock_values(&self.values).get(key).and_then(|v| v.as_bool())
    }

    fn get_double(&self, key: &str) -> Option<f64> {
        lock_values(&self.values).get(key).and_then(|v| v.as_double())
    }

    fn set_bool(&self, key: &str, value: bool) -> Result<()> {
        self.mutate(|values| {
            values.insert(key.to_string(), PrefValue::Bool(value));
        })
    }

    fn set_double(&self, key: &str, value: f64) -> Result<()> {
        self.mutate(|values| {
            values.insert(key.to_string(), PrefValue::Double(value));
        })
    }

    fn remove_key(&self, key: &str) -> Result<()> {
        self.mutate(|values| {
            values.remove(key);
        })
    }
}

fn read_prefs_file(file_path: &Path) -> BTreeMap<String, PrefValue> {
    let content = match fs_err::read_to_string(file_path) {
        Ok(content) => content,
        Err(_) => return BTreeMap::new(),
    };

    if content.trim().is_empty() {
        tracing::warn!(path = %file_path.display(), "Empty preferences file, starting empty");
        return BTreeMap::new();
    }

    match serde_json::from_str::<PrefsFile>(&content) {
        Ok(file) if file.version == PREFS_FILE_VERSION => file.values,
        Ok(file) => {
            tracing::warn!(
                version = file.version,
                expected = PREFS_FILE_VERSION,
                "Unsupported preferences file version, starting empty"
            );
            BTreeMap::new()
        }
        Err(err) => {
            tracing::warn!(error = %err, "Failed to parse preferences file, starting empty");
            BTreeMap::new()
        }
    }
}

fn write_prefs_file(file_path: &Path, values: &BTreeMap<String, PrefValue>) -> Result<()> {
    let file = PrefsFile {
        version: PREFS_FILE_VERSION,
        values: values.clone(),
    };
    let content = serde_json::to_string_pretty(&file).map_err(|source| NestError::Json {
        context: "serializing preferences".to_string(),
        source,
    })?;
    write_atomic(file_path, content.as_bytes())
}

/// Writes `bytes` to `file_path` via a temp file in the same directory.
pub(crate) fn write_atomic(file_path: &Path, bytes: &[u8]) -> Result<()> {
    let parent_dir = file_path.parent().ok_or_else(|| {
        NestError::StoreUnavailable(format!("{} has no parent directory", file_path.display()))
    })?;
    fs_err::create_dir_all(parent_dir).map_err(|source| NestError::Io {
        context: format!("creating {}", parent_dir.display()),
        source,
    })?;

    let io_err = |context: &str, source: std::io::Error| NestError::Io {
        context: format!("{}: {}", context, file_path.display()),
        source,
    };
    let mut temp_file =
        NamedTempFile::new_in(parent_dir).map_err(|e| io_err("creating temp file for", e))?;
    temp_file
        .write_all(bytes)
        .map_err(|e| io_err("writing temp file for", e))?;
    temp_file
        .flush()
        .map_err(|e| io_err("flushing temp file for", e))?;
    temp_file
        .persist(file_path)
        .map_err(|e| io_err("persisting", e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_memory_store_types_are_distinct() {
        let store = MemoryKeyValueStore::new();
        store.set_bool("flag", true).unwrap();
        store.set_double("ts", 12.5).unwrap();

        assert_eq!(store.get_bool("flag"), Some(true));
        assert_eq!(store.get_double("ts"), Some(12.5));
        assert_eq!(store.get_double("flag"), None);
        assert_eq!(store.get_bool("ts"), None);
        assert_eq!(store.get_bool("missing"), None);
    }

    #[test]
    fn test_memory_store_remove() {
        let store = MemoryKeyValueStore::new();
        store.set_bool("flag", true).unwrap();
        store.remove_key("flag").unwrap();
        assert!(store.is_empty());
        // Removing an absent key is not an error.
        store.remove_key("flag").unwrap();
    }

    #[test]
    fn test_json_store_persists_across_loads() {
        let temp = tempdir().unwrap();
        let file = temp.path().join("prefs.json");

        {
            let store = JsonKeyValueStore::load(&file);
            store.set_bool("a", true).unwrap();
            store.set_double("b", 1767225600.0).unwrap();
            store.set_bool("c", false).unwrap();
            store.remove_key("c").unwrap();
        }

        let store = JsonKeyValueStore::load(&file);
        assert_eq!(store.get_bool("a"), Some(true));
        assert_eq!(store.get_double("b"), Some(1767225600.0));
        assert_eq!(store.get_bool("c"), None);
    }

    #[test]
    fn test_json_store_failed_write_keeps_previous_values() {
        let temp = tempdir().unwrap();
        let file = temp.path().join("prefs.json");
        let store = JsonKeyValueStore::load(&file);
        store.set_double("ts", 1767225600.0).unwrap();

        // A directory at the file path makes the rename fail.
        std::fs::remove_file(&file).unwrap();
        std::fs::create_dir(&file).unwrap();

        assert!(store.set_bool("flag", true).is_err());
        assert_eq!(store.get_bool("flag"), None);
        assert!(store.remove_key("ts").is_err());
        assert_eq!(store.get_double("ts"), Some(1767225600.0));
    }

    #[test]
    fn test_json_store_unwritable_parent_changes_nothing() {
        let temp = tempdir().unwrap();
        let blocker = temp.path().join("blocker");
        std::fs::write(&blocker, "regular file").unwrap();
        let store = JsonKeyValueStore::load(&blocker.join("prefs.json"));

        assert!(store.set_bool("flag", true).is_err());
        assert_eq!(store.get_bool("flag"), None);
    }

    #[test]
    fn test_json_store_creates_missing_parent() {
        let temp = tempdir().unwrap();
        let file = temp.path().join("deep").join("prefs.json");
        let store = JsonKeyValueStore::load(&file);
        store.set_bool("a", true).unwrap();
        assert!(file.exists());
    }

    #[test]
    fn test_json_store_empty_file_loads_empty() {
        let temp = tempdir().unwrap();
        let file = temp.path().join("prefs.json");
        std::fs::write(&file, "").unwrap();
        let store = JsonKeyValueStore::load(&file);
        assert_eq!(store.get_bool("a"), None);
    }

    #[test]
    fn test_json_store_corrupt_file_loads_empty() {
        let temp = tempdir().unwrap();
        let file = temp.path().join("prefs.json");
        std::fs::write(&file, "{oops").unwrap();
        let store = JsonKeyValueStore::load(&file);
        assert_eq!(store.get_bool("a"), None);
    }

    #[test]
    fn test_json_store_unknown_version_loads_empty() {
        let temp = tempdir().unwrap();
        let file = temp.path().join("prefs.json");
        std::fs::write(&file, r#"{"version":9,"values":{"a":true}}"#).unwrap();
        let store = JsonKeyValueStore::load(&file);
        assert_eq!(store.get_bool("a"), None);
    }
}
