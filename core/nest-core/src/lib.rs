//! # nest-core
//!
//! Core library for NestNote: the session lifecycle state machine and local
//! routine completion tracking shared by every client.
//!
//! ## Design Principles
//!
//! - **Synchronous**: No async runtime dependency. Clients wrap with async if needed.
//! - **Injected time**: Every time-dependent decision reads a [`Clock`], never the wall clock.
//! - **Graceful degradation**: Missing or corrupt files load as empty state; corrupt
//!   completion records are repaired on read.
//! - **Owner in control**: Time only moves sessions through inferred states; extending
//!   and completing are explicit, and completing needs confirmation.
//! - **FFI-ready**: UniFFI annotations expose [`NestEngine`] to the Swift app.
//!   Prefer additive public API changes; removing or renaming breaks FFI clients.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use nest_core::NestEngine;
//!
//! let engine = NestEngine::new()?;
//! let done = engine.toggle_action_completed("bedtime".into(), 0)?;
//! let buckets = engine.sessions().buckets();
//! ```

// UniFFI scaffolding for Swift/Kotlin bindings
uniffi::setup_scaffolding!();

pub mod clock;
pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod prefs;
pub mod routine;
pub mod session;
pub mod storage;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ExpiryMode, ExpiryPolicy, NestConfig};
pub use engine::{NestEngine, RoutineProgressFfi, SessionBucketIds};
pub use error::{NestError, NestFfiError, Result};
pub use events::{EventBus, EventFilter, EventKind, NestEvent, Subscription};
pub use prefs::{JsonKeyValueStore, KeyValueStore, MemoryKeyValueStore};
pub use routine::{CompletionStore, RoutineItem, RoutineProgress};
pub use session::{
    ArchivedSession, AssignedSitter, Confirmation, EarlyAccessDuration, InviteStatus, Session,
    SessionBuckets, SessionEntry, SessionManager, SessionStatus, VisibilityLevel,
};
pub use storage::StorageConfig;
