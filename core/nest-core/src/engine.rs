//! NestEngine - the entry point for NestNote clients.
//!
//! Bundles the completion store and session manager behind one object with a
//! UniFFI surface for the Swift app. Rust callers can reach the underlying
//! components directly through [`NestEngine::completions`] and
//! [`NestEngine::sessions`].
//!
//! ```rust,ignore
//! use nest_core::NestEngine;
//!
//! let engine = NestEngine::new()?;
//! engine.toggle_action_completed("bedtime".into(), 0)?;
//! let progress = engine.routine_progress(routine);
//! ```

use std::sync::Arc;

use crate::clock::{Clock, SystemClock};
use crate::config::{load_config_with_storage, ExpiryPolicy};
use crate::error::NestFfiError;
use crate::events::{EventBus, EventFilter, Subscription};
use crate::prefs::{JsonKeyValueStore, KeyValueStore};
use crate::routine::{CompletionStore, RoutineItem};
use crate::session::{
    Confirmation, JsonSessionRepository, SessionManager, SessionRepository, SessionStatus,
};
use crate::storage::StorageConfig;

/// Completion counts for FFI clients.
#[derive(Debug, Clone, Copy, PartialEq, uniffi::Record)]
pub struct RoutineProgressFfi {
    pub completed: u32,
    pub total: u32,
    pub percentage: f64,
    pub is_complete: bool,
}

/// Session ids per bucket, in display order.
#[derive(Debug, Clone, PartialEq, Eq, Default, uniffi::Record)]
pub struct SessionBucketIds {
    pub past: Vec<String>,
    pub in_progress: Vec<String>,
    pub upcoming: Vec<String>,
}

#[derive(uniffi::Object)]
pub struct NestEngine {
    storage: StorageConfig,
    bus: EventBus,
    completions: CompletionStore,
    sessions: SessionManager,
}

impl NestEngine {
    /// Creates an engine over file-backed stores under `storage`.
    ///
    /// Not exposed to FFI - use `new()` from external clients.
    pub fn with_storage(storage: StorageConfig) -> Result<Self, NestFfiError> {
        storage.ensure_root()?;
        let policy = load_config_with_storage(&storage).expiry_policy();
        let prefs = Arc::new(JsonKeyValueStore::load(&storage.preferences_file()));
        let repository = Arc::new(JsonSessionRepository::load(&storage.sessions_file()));
        tracing::debug!(root = %storage.root().display(), mode = ?policy.mode, "NestEngine initialized");
        Ok(Self::with_parts(
            storage,
            prefs,
            repository,
            Arc::new(SystemClock),
            policy,
        ))
    }

    /// Assembles an engine from explicit collaborators.
    pub fn with_parts(
        storage: StorageConfig,
        prefs: Arc<dyn KeyValueStore>,
        repository: Arc<dyn SessionRepository>,
        clock: Arc<dyn Clock>,
        policy: ExpiryPolicy,
    ) -> Self {
        let bus = EventBus::new();
        Self {
            storage,
            completions: CompletionStore::new(prefs, Arc::clone(&clock), policy, bus.clone()),
            sessions: SessionManager::new(repository, clock, bus.clone()),
            bus,
        }
    }

    pub fn storage(&self) -> &StorageConfig {
        &self.storage
    }

    pub fn completions(&self) -> &CompletionStore {
        &self.completions
    }

    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    pub fn subscribe(&self, filter: EventFilter) -> Subscription {
        self.bus.subscribe(filter)
    }
}

#[uniffi::export]
impl NestEngine {
    /// Creates an engine using `~/.nestnote/`.
    #[uniffi::constructor]
    pub fn new() -> Result<Self, NestFfiError> {
        Self::with_storage(StorageConfig::default())
    }

    pub fn data_dir(&self) -> String {
        self.storage.root().to_string_lossy().to_string()
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Expiry settings
    // ─────────────────────────────────────────────────────────────────────────────

    pub fn set_testing_mode(&self, interval_minutes: u32) {
        self.completions
            .set_policy(ExpiryPolicy::testing(interval_minutes));
    }

    pub fn set_production_mode(&self) {
        self.completions.set_policy(ExpiryPolicy::production());
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Routines API
    // ─────────────────────────────────────────────────────────────────────────────

    pub fn is_action_completed(&self, routine_id: String, action_index: u32) -> bool {
        self.completions.is_completed(&routine_id, action_index as usize)
    }

    pub fn set_action_completed(
        &self,
        routine_id: String,
        action_index: u32,
        completed: bool,
    ) -> Result<(), NestFfiError> {
        self.completions
            .set_completed(&routine_id, action_index as usize, completed)
            .map_err(NestFfiError::from)
    }

    /// Returns the new state.
    pub fn toggle_action_completed(
        &self,
        routine_id: String,
        action_index: u32,
    ) -> Result<bool, NestFfiError> {
        self.completions
            .toggle_completed(&routine_id, action_index as usize)
            .map_err(NestFfiError::from)
    }

    pub fn routine_progress(&self, routine: RoutineItem) -> RoutineProgressFfi {
        let progress = self.completions.routine_progress(&routine);
        RoutineProgressFfi {
            completed: u32::try_from(progress.completed).unwrap_or(u32::MAX),
            total: u32::try_from(progress.total).unwrap_or(u32::MAX),
            percentage: progress.percentage(),
            is_complete: progress.is_complete(),
        }
    }

    pub fn reset_routine(&self, routine: RoutineItem) -> Result<(), NestFfiError> {
        self.completions
            .reset_routine(&routine)
            .map_err(NestFfiError::from)
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Sessions API
    // ─────────────────────────────────────────────────────────────────────────────

    pub fn session_status(&self, session_id: String) -> Result<SessionStatus, NestFfiError> {
        self.sessions.status(&session_id).map_err(NestFfiError::from)
    }

    /// Completing a session fails unless `confirmed` is true.
    pub fn set_session_status(
        &self,
        session_id: String,
        status: SessionStatus,
        confirmed: bool,
    ) -> Result<(), NestFfiError> {
        self.sessions
            .set_status(&session_id, status, Confirmation::from(confirmed))
            .map(|_| ())
            .map_err(NestFfiError::from)
    }

    pub fn can_access_nest(&self, session_id: String) -> Result<bool, NestFfiError> {
        self.sessions
            .can_access_nest(&session_id)
            .map_err(NestFfiError::from)
    }

    pub fn archive_session(&self, session_id: String) -> Result<(), NestFfiError> {
        self.sessions
            .archive(&session_id)
            .map(|_| ())
            .map_err(NestFfiError::from)
    }

    pub fn session_bucket_ids(&self) -> SessionBucketIds {
        let buckets = self.sessions.buckets();
        SessionBucketIds {
            past: buckets.past.iter().map(|e| e.id().to_string()).collect(),
            in_progress: buckets.in_progress.iter().map(|s| s.id.clone()).collect(),
            upcoming: buckets.upcoming.iter().map(|s| s.id.clone()).collect(),
        }
    }
}
