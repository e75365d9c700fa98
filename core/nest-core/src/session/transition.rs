//! Owner-driven session status transitions.
//!
//! Time alone only ever moves a session through the inferred states
//! (upcoming → inProgress → completed). Everything else is an explicit owner
//! choice from the status menu:
//!
//! ```text
//! upcoming ──start──▶ inProgress ──extend──▶ extended
//!     │                   │                     │
//!     └───────────────────┴──── complete* ──────┴──▶ completed
//!
//! * requires confirmation: completing revokes sitter access
//! ```
//!
//! Moving `inProgress` to `extended` is never automatic, even when a session
//! runs past its end date.

use chrono::{DateTime, Utc};

use crate::error::{NestError, Result};

use super::types::{Session, SessionStatus};

/// Whether the owner confirmed a destructive transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    Confirmed,
    Unconfirmed,
}

impl From<bool> for Confirmation {
    fn from(confirmed: bool) -> Self {
        if confirmed {
            Confirmation::Confirmed
        } else {
            Confirmation::Unconfirmed
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionPlan {
    /// Target equals the current status.
    NoOp,
    Apply,
    /// Target is `Completed`; the caller must confirm first.
    RequiresConfirmation,
}

/// Decides how a transition from `from` to `to` must be handled.
pub fn plan_transition(from: SessionStatus, to: SessionStatus) -> TransitionPlan {
    if from == to {
        TransitionPlan::NoOp
    } else if to == SessionStatus::Completed {
        TransitionPlan::RequiresConfirmation
    } else {
        TransitionPlan::Apply
    }
}

/// A status change that actually happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusChange {
    pub from: SessionStatus,
    pub to: SessionStatus,
}

impl StatusChange {
    /// Leaving `Completed` again is allowed but unusual; the sitter must be re-invited.
    pub fn is_reversion(&self) -> bool {
        self.from == SessionStatus::Completed && self.to != SessionStatus::Completed
    }
}

/// Applies an owner-chosen status to `session`.
///
/// The current status is the session's effective status at `now`. On success
/// the status is pinned as explicit, even for a no-op, and the change (if any)
/// is returned. Completing without confirmation leaves the session untouched.
pub fn apply_transition(
    session: &mut Session,
    to: SessionStatus,
    confirmation: Confirmation,
    now: DateTime<Utc>,
) -> Result<Option<StatusChange>> {
    let from = session.effective_status(now);

    match plan_transition(from, to) {
        TransitionPlan::RequiresConfirmation if confirmation != Confirmation::Confirmed => {
            return Err(NestError::ConfirmationRequired {
                id: session.id.clone(),
                from,
                to,
            });
        }
        TransitionPlan::NoOp => {
            session.status = to;
            session.status_is_explicit = true;
            return Ok(None);
        }
        TransitionPlan::Apply | TransitionPlan::RequiresConfirmation => {}
    }

    session.status = to;
    session.status_is_explicit = true;

    let change = StatusChange { from, to };
    if change.is_reversion() {
        tracing::debug!(session_id = %session.id, to = %to, "Reverting completed session");
    }
    Ok(Some(change))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 7, 4, hour, 0, 0).unwrap()
    }

    fn session() -> Session {
        Session::draft("Date night", "nest", "owner", ts(18), ts(23))
    }

    #[test]
    fn test_plan_transition() {
        use SessionStatus::*;
        assert_eq!(plan_transition(Upcoming, Upcoming), TransitionPlan::NoOp);
        assert_eq!(plan_transition(Upcoming, InProgress), TransitionPlan::Apply);
        assert_eq!(plan_transition(InProgress, Extended), TransitionPlan::Apply);
        assert_eq!(
            plan_transition(InProgress, Completed),
            TransitionPlan::RequiresConfirmation
        );
        assert_eq!(
            plan_transition(Extended, Completed),
            TransitionPlan::RequiresConfirmation
        );
        assert_eq!(plan_transition(Completed, Upcoming), TransitionPlan::Apply);
    }

    #[test]
    fn test_start_early_by_owner() {
        let mut s = session();
        let change = apply_transition(
            &mut s,
            SessionStatus::InProgress,
            Confirmation::Unconfirmed,
            ts(17),
        )
        .unwrap();
        assert_eq!(
            change,
            Some(StatusChange {
                from: SessionStatus::Upcoming,
                to: SessionStatus::InProgress
            })
        );
        assert!(s.status_is_explicit);
        assert_eq!(s.effective_status(ts(17)), SessionStatus::InProgress);
    }

    #[test]
    fn test_complete_requires_confirmation() {
        let mut s = session().with_status(SessionStatus::InProgress);
        let err = apply_transition(
            &mut s,
            SessionStatus::Completed,
            Confirmation::Unconfirmed,
            ts(20),
        )
        .unwrap_err();
        assert!(matches!(err, NestError::ConfirmationRequired { .. }));
        assert_eq!(s.status, SessionStatus::InProgress);

        let change = apply_transition(
            &mut s,
            SessionStatus::Completed,
            Confirmation::Confirmed,
            ts(20),
        )
        .unwrap();
        assert_eq!(change.map(|c| c.to), Some(SessionStatus::Completed));
        assert_eq!(s.status, SessionStatus::Completed);
    }

    #[test]
    fn test_inferred_completed_target_is_noop() {
        // Past end date with no override: already completed, nothing to confirm.
        let mut s = session();
        let change = apply_transition(
            &mut s,
            SessionStatus::Completed,
            Confirmation::Unconfirmed,
            ts(23),
        )
        .unwrap();
        assert_eq!(change, None);
        assert!(s.status_is_explicit);
    }

    #[test]
    fn test_extend_is_owner_only() {
        let s = session();
        // Past the end without owner action: inferred completed, never extended.
        assert_eq!(s.effective_status(ts(23)), SessionStatus::Completed);

        let mut s = s.with_status(SessionStatus::InProgress);
        apply_transition(
            &mut s,
            SessionStatus::Extended,
            Confirmation::Unconfirmed,
            ts(23),
        )
        .unwrap();
        assert_eq!(s.effective_status(ts(23)), SessionStatus::Extended);
    }

    #[test]
    fn test_reverting_out_of_completed_is_allowed() {
        let mut s = session().with_status(SessionStatus::Completed);
        let change = apply_transition(
            &mut s,
            SessionStatus::InProgress,
            Confirmation::Unconfirmed,
            ts(20),
        )
        .unwrap()
        .unwrap();
        assert!(change.is_reversion());
    }
}
