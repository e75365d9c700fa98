//! Session lifecycle.
//!
//! A session is a window during which a sitter has scoped access to a nest.
//! Its status is either inferred from the clock or pinned by the owner:
//!
//! ```text
//! now < start          → upcoming   (earlyAccess once the lead window opens)
//! start <= now < end   → inProgress
//! now >= end           → completed
//! ```
//!
//! An owner-pinned status always wins over inference.
//!
//! # Module Structure
//!
//! - [`types`]: session, archived session and the enums they carry
//! - [`transition`]: owner-driven status changes and the completion confirmation gate
//! - [`access`]: whether a sitter may see the nest right now
//! - [`buckets`]: past / in-progress / upcoming partition
//! - [`validation`]: creation-time date checks
//! - [`repository`]: persistence seam
//! - [`manager`]: ties the above together and emits change events

pub mod access;
pub mod buckets;
pub mod manager;
pub mod repository;
pub mod transition;
pub mod types;
pub mod validation;

pub use access::can_access_nest;
pub use buckets::{bucket_sessions, Bucket, SessionBuckets};
pub use manager::SessionManager;
pub use repository::{JsonSessionRepository, MemorySessionRepository, SessionRepository};
pub use transition::{apply_transition, plan_transition, Confirmation, StatusChange, TransitionPlan};
pub use types::{
    ArchivedSession, AssignedSitter, EarlyAccessDuration, InviteStatus, Session, SessionEntry,
    SessionStatus, VisibilityLevel,
};
pub use validation::{validate_session, validate_session_dates};
