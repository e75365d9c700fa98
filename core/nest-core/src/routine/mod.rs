//! Routines and their per-action completion tracking.
//!
//! Completion is not stored on the routine itself. It lives in a key-value
//! store keyed by `(routine id, action index)` and expires per the configured
//! [`ExpiryPolicy`](crate::config::ExpiryPolicy), so daily routines reset.

mod completion;

pub use completion::{CompletionStore, RoutineProgress};

use serde::{Deserialize, Serialize};

/// An ordered checklist a sitter works through during a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, uniffi::Record)]
pub struct RoutineItem {
    pub id: String,
    pub title: String,
    pub category: String,
    pub actions: Vec<String>,
}

impl RoutineItem {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        category: impl Into<String>,
        actions: Vec<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            category: category.into(),
            actions,
        }
    }

    pub fn action_count(&self) -> usize {
        self.actions.len()
    }
}
