//! Session persistence.
//!
//! [`SessionRepository`] is the seam to whatever document store holds
//! sessions. The API is synchronous; clients that talk to a remote backend
//! wrap it in their own async layer.
//!
//! # File Format (`JsonSessionRepository`)
//!
//! ```json
//! {
//!   "version": 1,
//!   "sessions": [ { "id": "...", "title": "...", "startDate": "...", ... } ],
//!   "archived": [ { "id": "...", "archivedAt": "...", ... } ]
//! }
//! ```
//!
//! Same defensive loading as the preferences file: missing, empty, corrupt or
//! unsupported-version files load as an empty repository.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{NestError, Result};
use crate::prefs::write_atomic;

use super::types::{ArchivedSession, Session, SessionEntry};

const SESSIONS_FILE_VERSION: u32 = 1;

pub trait SessionRepository: Send + Sync {
    fn all_sessions(&self) -> Vec<Session>;
    fn archived_sessions(&self) -> Vec<ArchivedSession>;

    /// Looks up a live or archived session.
    fn get(&self, id: &str) -> Option<SessionEntry>;

    /// Fails with `SessionAlreadyExists` if the id is taken (live or archived).
    fn insert(&self, session: Session) -> Result<()>;

    /// Replaces a live session. Archived sessions are immutable.
    fn update(&self, session: Session) -> Result<()>;

    /// Moves a live session to the archive.
    fn archive(&self, id: &str, archived_at: DateTime<Utc>) -> Result<ArchivedSession>;

    /// Removes a live or archived session permanently.
    fn delete(&self, id: &str) -> Result<()>;
}

#[derive(Debug, Default, Clone)]
struct SessionTables {
    sessions: BTreeMap<String, Session>,
    archived: BTreeMap<String, ArchivedSession>,
}

impl SessionTables {
    fn get(&self, id: &str) -> Option<SessionEntry> {
        if let Some(session) = self.sessions.get(id) {
            return Some(SessionEntry::Live(session.clone()));
        }
        self.archived
            .get(id)
            .map(|archived| SessionEntry::Archived(archived.clone()))
    }

    fn insert(&mut self, session: Session) -> Result<()> {
        if self.sessions.contains_key(&session.id) || self.archived.contains_key(&session.id) {
            return Err(NestError::SessionAlreadyExists(session.id));
        }
        self.sessions.insert(session.id.clone(), session);
        Ok(())
    }

    fn update(&mut self, session: Session) -> Result<()> {
        if self.archived.contains_key(&session.id) {
            return Err(NestError::ArchivedSessionImmutable(session.id));
        }
        match self.sessions.get_mut(&session.id) {
            Some(slot) => {
                *slot = session;
                Ok(())
            }
            None => Err(NestError::SessionNotFound(session.id)),
        }
    }

    fn archive(&mut self, id: &str, archived_at: DateTime<Utc>) -> Result<ArchivedSession> {
        if self.archived.contains_key(id) {
            return Err(NestError::ArchivedSessionImmutable(id.to_string()));
        }
        let session = self
            .sessions
            .remove(id)
            .ok_or_else(|| NestError::SessionNotFound(id.to_string()))?;
        let archived = session.archive(archived_at);
        self.archived.insert(archived.id.clone(), archived.clone());
        Ok(archived)
    }

    fn delete(&mut self, id: &str) -> Result<()> {
        let removed = self.sessions.remove(id).is_some() || self.archived.remove(id).is_some();
        if removed {
            Ok(())
        } else {
            Err(NestError::SessionNotFound(id.to_string()))
        }
    }
}

fn lock_tables(tables: &Mutex<SessionTables>) -> MutexGuard<'_, SessionTables> {
    tables.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

// ═══════════════════════════════════════════════════════════════════════════════
// In-memory repository
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Default)]
pub struct MemorySessionRepository {
    tables: Mutex<SessionTables>,
}

impl MemorySessionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sessions(sessions: impl IntoIterator<Item = Session>) -> Self {
        let mut tables = SessionTables::default();
        for session in sessions {
            tables.sessions.insert(session.id.clone(), session);
        }
        Self {
            tables: Mutex::new(tables),
        }
    }
}

impl SessionRepository for MemorySessionRepository {
    fn all_sessions(&self) -> Vec<Session> {
        lock_tables(&self.tables).sessions.values().cloned().collect()
    }

    fn archived_sessions(&self) -> Vec<ArchivedSession> {
        lock_tables(&self.tables).archived.values().cloned().collect()
    }

    fn get(&self, id: &str) -> Option<SessionEntry> {
        lock_tables(&self.tables).get(id)
    }

    fn insert(&self, session: Session) -> Result<()> {
        lock_tables(&self.tables).insert(session)
    }

    fn update(&self, session: Session) -> Result<()> {
        lock_tables(&self.tables).update(session)
    }

    fn archive(&self, id: &str, archived_at: DateTime<Utc>) -> Result<ArchivedSession> {
        lock_tables(&self.tables).archive(id, archived_at)
    }

    fn delete(&self, id: &str) -> Result<()> {
        lock_tables(&self.tables).delete(id)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// JSON file repository
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Serialize, Deserialize)]
struct SessionsFile {
    version: u32,
    #[serde(default)]
    sessions: Vec<Session>,
    #[serde(default)]
    archived: Vec<ArchivedSession>,
}

/// File-backed repository. Mutations are written through atomically; a failed
/// write leaves the in-memory tables unchanged.
#[derive(Debug)]
pub struct JsonSessionRepository {
    tables: Mutex<SessionTables>,
    file_path: PathBuf,
}

impl JsonSessionRepository {
    pub fn load(file_path: &Path) -> Self {
        Self {
            tables: Mutex::new(read_sessions_file(file_path)),
            file_path: file_path.to_path_buf(),
        }
    }

    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    fn mutate<T, F>(&self, apply: F) -> Result<T>
    where
        F: FnOnce(&mut SessionTables) -> Result<T>,
    {
        let mut tables = lock_tables(&self.tables);
        let mut staged = tables.clone();
        let value = apply(&mut staged)?;
        write_sessions_file(&self.file_path, &staged)?;
        *tables = staged;
        Ok(value)
    }
}

impl SessionRepository for JsonSessionRepository {
    fn all_sessions(&self) -> Vec<Session> {
        lock_tables(&self.tables).sessions.values().cloned().collect()
    }

    fn archived_sessions(&self) -> Vec<ArchivedSession> {
        lock_tables(&self.tables).archived.values().cloned().collect()
    }

    fn get(&self, id: &str) -> Option<SessionEntry> {
        lock_tables(&self.tables).get(id)
    }

    fn insert(&self, session: Session) -> Result<()> {
        self.mutate(|tables| tables.insert(session))
    }

    fn update(&self, session: Session) -> Result<()> {
        self.mutate(|tables| tables.update(session))
    }

    fn archive(&self, id: &str, archived_at: DateTime<Utc>) -> Result<ArchivedSession> {
        self.mutate(|tables| tables.archive(id, archived_at))
    }

    fn delete(&self, id: &str) -> Result<()> {
        self.mutate(|tables| tables.delete(id))
    }
}

fn read_sessions_file(file_path: &Path) -> SessionTables {
    let content = match fs_err::read_to_string(file_path) {
        Ok(content) => content,
        Err(_) => return SessionTables::default(),
    };

    if content.trim().is_empty() {
        tracing::warn!(path = %file_path.display(), "Empty sessions file, starting empty");
        return SessionTables::default();
    }

    match serde_json::from_str::<SessionsFile>(&content) {
        Ok(file) if file.version == SESSIONS_FILE_VERSION => SessionTables {
            sessions: file
                .sessions
                .into_iter()
                .map(|s| (s.id.clone(), s))
                .collect(),
            archived: file
                .archived
                .into_iter()
                .map(|s| (s.id.clone(), s))
                .collect(),
        },
        Ok(file) => {
            tracing::warn!(
                version = file.version,
                expected = SESSIONS_FILE_VERSION,
                "Unsupported sessions file version, starting empty"
            );
            SessionTables::default()
        }
        Err(err) => {
            tracing::warn!(error = %err, "Failed to parse sessions file, starting empty");
            SessionTables::default()
        }
    }
}

fn write_sessions_file(file_path: &Path, tables: &SessionTables) -> Result<()> {
    let file = SessionsFile {
        version: SESSIONS_FILE_VERSION,
        sessions: tables.sessions.values().cloned().collect(),
        archived: tables.archived.values().cloned().collect(),
    };
    let content = serde_json::to_string_pretty(&file).map_err(|source| NestError::Json {
        context: "serializing sessions".to_string(),
        source,
    })?;
    write_atomic(file_path, content.as_bytes())
}
