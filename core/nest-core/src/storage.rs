//! Storage configuration and path management for NestNote.
//!
//! All on-disk locations are decided here so tests can inject a temp root via
//! [`StorageConfig::with_root`] and production code uses `~/.nestnote/`.

use std::path::{Path, PathBuf};

/// Central configuration for all NestNote storage paths.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Root directory for all NestNote data (default: ~/.nestnote)
    root: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        let root = dirs::home_dir()
            .map(|home| home.join(".nestnote"))
            .unwrap_or_else(|| std::env::temp_dir().join(".nestnote"));
        Self { root }
    }
}

impl StorageConfig {
    /// Creates a StorageConfig with a custom root directory.
    pub fn with_root(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Files
    // ─────────────────────────────────────────────────────────────────────────────

    /// Path to preferences.json (key-value store backing routine completion).
    pub fn preferences_file(&self) -> PathBuf {
        self.root.join("preferences.json")
    }

    /// Path to sessions.json (live and archived sessions).
    pub fn sessions_file(&self) -> PathBuf {
        self.root.join("sessions.json")
    }

    /// Path to config.json (app preferences).
    pub fn config_file(&self) -> PathBuf {
        self.root.join("config.json")
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Directories
    // ─────────────────────────────────────────────────────────────────────────────

    pub fn logs_dir(&self) -> PathBuf {
        self.root.join("logs")
    }

    /// Creates the root directory if missing.
    pub fn ensure_root(&self) -> crate::Result<()> {
        fs_err::create_dir_all(&self.root).map_err(|source| crate::NestError::Io {
            context: format!("creating {}", self.root.display()),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_root_paths() {
        let storage = StorageConfig::with_root(PathBuf::from("/tmp/nest"));
        assert_eq!(
            storage.preferences_file(),
            PathBuf::from("/tmp/nest/preferences.json")
        );
        assert_eq!(
            storage.sessions_file(),
            PathBuf::from("/tmp/nest/sessions.json")
        );
        assert_eq!(storage.config_file(), PathBuf::from("/tmp/nest/config.json"));
        assert_eq!(storage.logs_dir(), PathBuf::from("/tmp/nest/logs"));
    }

    #[test]
    fn test_ensure_root_creates_directory() {
        let temp = tempfile::tempdir().unwrap();
        let storage = StorageConfig::with_root(temp.path().join("nested").join("root"));
        storage.ensure_root().unwrap();
        assert!(storage.root().is_dir());
    }
}
