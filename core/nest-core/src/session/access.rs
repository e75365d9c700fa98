//! Nest-access gate for sitters.
//!
//! Pure predicate over session state and time. Callers re-evaluate on every
//! access attempt; results must not be cached across status changes.

use chrono::{DateTime, Utc};

use super::types::{Session, SessionStatus};

/// Returns true if the sitter may see nest information at `now`.
///
/// Granted when the effective status is `InProgress` or `Extended`, when it
/// is `EarlyAccess` and `now` is inside the early-access window, or when it is
/// `Upcoming` with early access configured and `now >= start - duration`.
pub fn can_access_nest(session: &Session, now: DateTime<Utc>) -> bool {
    match session.effective_status(now) {
        SessionStatus::InProgress | SessionStatus::Extended => true,
        SessionStatus::EarlyAccess => session.is_within_early_access_window(now),
        SessionStatus::Upcoming => session
            .early_access_start()
            .map(|opens| now >= opens)
            .unwrap_or(false),
        SessionStatus::Completed => false,
    }
}
