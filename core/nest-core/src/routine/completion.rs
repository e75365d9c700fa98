//! Per-action completion flags with time-based expiry.
//!
//! Each action is stored as two keys:
//!
//! ```text
//! routine_{id}_action_{index}_completed  -> bool
//! routine_{id}_action_{index}_timestamp  -> f64 (epoch seconds)
//! ```
//!
//! Reads repair the store as they go: a flag without a positive timestamp is
//! corrupt and is dropped, and an expired completion loses both keys. Neither
//! case is reported as an error.
//!
//! All reads and writes go through one store-wide lock, so `toggle_completed`
//! is atomic even with concurrent callers.

use std::sync::{Arc, Mutex, MutexGuard, RwLock};

use chrono::{DateTime, Utc};

use crate::clock::Clock;
use crate::config::ExpiryPolicy;
use crate::error::Result;
use crate::events::{EventBus, NestEvent};
use crate::prefs::KeyValueStore;

use super::RoutineItem;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RoutineProgress {
    pub completed: usize,
    pub total: usize,
}

impl RoutineProgress {
    /// `completed / total`, or exactly 0.0 for an empty routine.
    pub fn percentage(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.completed as f64 / self.total as f64
        }
    }

    pub fn is_complete(&self) -> bool {
        self.total > 0 && self.completed == self.total
    }
}

fn completed_key(routine_id: &str, action_index: usize) -> String {
    format!("routine_{}_action_{}_completed", routine_id, action_index)
}

fn timestamp_key(routine_id: &str, action_index: usize) -> String {
    format!("routine_{}_action_{}_timestamp", routine_id, action_index)
}

fn to_epoch_seconds(at: DateTime<Utc>) -> f64 {
    at.timestamp_millis() as f64 / 1000.0
}

fn from_epoch_seconds(seconds: f64) -> Option<DateTime<Utc>> {
    if !seconds.is_finite() || seconds <= 0.0 {
        return None;
    }
    DateTime::from_timestamp_millis((seconds * 1000.0).round() as i64)
}

pub struct CompletionStore {
    prefs: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    policy: RwLock<ExpiryPolicy>,
    bus: EventBus,
    write_lock: Mutex<()>,
}

impl CompletionStore {
    pub fn new(
        prefs: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
        policy: ExpiryPolicy,
        bus: EventBus,
    ) -> Self {
        Self {
            prefs,
            clock,
            policy: RwLock::new(policy),
            bus,
            write_lock: Mutex::new(()),
        }
    }

    pub fn policy(&self) -> ExpiryPolicy {
        *self.policy.read().unwrap_or_else(|p| p.into_inner())
    }

    /// Swaps the expiry policy. Applies to every subsequent read.
    pub fn set_policy(&self, policy: ExpiryPolicy) {
        tracing::debug!(mode = ?policy.mode, "Completion expiry policy changed");
        *self.policy.write().unwrap_or_else(|p| p.into_inner()) = policy;
    }

    /// Returns true if the action is completed and not yet expired.
    pub fn is_completed(&self, routine_id: &str, action_index: usize) -> bool {
        let _guard = self.lock();
        self.read_locked(routine_id, action_index)
    }

    /// Marks an action completed as of now, or clears it.
    pub fn set_completed(
        &self,
        routine_id: &str,
        action_index: usize,
        completed: bool,
    ) -> Result<()> {
        {
            let _guard = self.lock();
            self.write_locked(routine_id, action_index, completed)?;
        }
        self.notify(routine_id, action_index, completed);
        Ok(())
    }

    /// Flips the action's state and returns the new state.
    pub fn toggle_completed(&self, routine_id: &str, action_index: usize) -> Result<bool> {
        let completed = {
            let _guard = self.lock();
            let completed = !self.read_locked(routine_id, action_index);
            self.write_locked(routine_id, action_index, completed)?;
            completed
        };
        self.notify(routine_id, action_index, completed);
        Ok(completed)
    }

    pub fn routine_progress(&self, routine: &RoutineItem) -> RoutineProgress {
        let _guard = self.lock();
        let total = routine.action_count();
        let completed = (0..total)
            .filter(|&index| self.read_locked(&routine.id, index))
            .count();
        RoutineProgress { completed, total }
    }

    pub fn is_routine_completed(&self, routine: &RoutineItem) -> bool {
        self.routine_progress(routine).is_complete()
    }

    pub fn completion_percentage(&self, routine: &RoutineItem) -> f64 {
        self.routine_progress(routine).percentage()
    }

    /// Clears every action of the routine.
    pub fn reset_routine(&self, routine: &RoutineItem) -> Result<()> {
        for index in 0..routine.action_count() {
            self.set_completed(&routine.id, index, false)?;
        }
        tracing::debug!(
            routine_id = %routine.id,
            actions = routine.action_count(),
            "Routine reset"
        );
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, ()> {
        self.write_lock.lock().unwrap_or_else(|p| p.into_inner())
    }

    fn read_locked(&self, routine_id: &str, action_index: usize) -> bool {
        let flag_key = completed_key(routine_id, action_index);
        match self.prefs.get_bool(&flag_key) {
            Some(true) => {}
            Some(false) | None => return false,
        }

        let ts_key = timestamp_key(routine_id, action_index);
        let completed_at = match self.prefs.get_double(&ts_key).and_then(from_epoch_seconds) {
            Some(at) => at,
            None => {
                tracing::debug!(
                    routine_id,
                    action_index,
                    "Completion flag without valid timestamp, clearing"
                );
                self.remove_quietly(&flag_key);
                return false;
            }
        };

        let now = self.clock.now();
        if self.policy().is_expired(completed_at, now, self.clock.as_ref()) {
            tracing::debug!(
                routine_id,
                action_index,
                completed_at = %completed_at.to_rfc3339(),
                "Completion expired, clearing"
            );
            self.remove_quietly(&flag_key);
            self.remove_quietly(&ts_key);
            return false;
        }

        true
    }

    fn write_locked(&self, routine_id: &str, action_index: usize, completed: bool) -> Result<()> {
        let flag_key = completed_key(routine_id, action_index);
        let ts_key = timestamp_key(routine_id, action_index);
        if completed {
            // Timestamp first so a crash between writes never leaves a bare flag.
            self.prefs.set_double(&ts_key, to_epoch_seconds(self.clock.now()))?;
            self.prefs.set_bool(&flag_key, true)?;
        } else {
            self.prefs.remove_key(&flag_key)?;
            self.prefs.remove_key(&ts_key)?;
        }
        Ok(())
    }

    // Cleanup during reads is best effort; the next read retries it.
    fn remove_quietly(&self, key: &str) {
        if let Err(err) = self.prefs.remove_key(key) {
            tracing::warn!(key, error = %err, "Failed to clear completion key");
        }
    }

    fn notify(&self, routine_id: &str, action_index: usize, completed: bool) {
        self.bus.publish(NestEvent::CompletionChanged {
            routine_id: routine_id.to_string(),
            action_index,
            completed,
        });
    }
}
