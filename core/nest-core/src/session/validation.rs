//! Creation-time validation of session dates.
//!
//! The state machine assumes well-formed sessions; this is where malformed
//! ones are turned away.

use chrono::{DateTime, Duration, Utc};

use crate::clock::Clock;
use crate::error::{NestError, Result};

use super::types::Session;

/// Checks `start < end` and that `is_multi_day` matches the local calendar span.
///
/// A single-day session starts and ends on the same local date; ending exactly
/// at the following local midnight still counts as single-day.
pub fn validate_session_dates(
    id: &str,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    is_multi_day: bool,
    clock: &dyn Clock,
) -> Result<()> {
    let invalid = |reason: String| NestError::InvalidSessionDates {
        id: id.to_string(),
        reason,
    };

    if start >= end {
        return Err(invalid(format!(
            "start {} is not before end {}",
            start.to_rfc3339(),
            end.to_rfc3339()
        )));
    }

    let start_day = clock.local_date(start);
    // The last instant covered by the session decides which day it ends on.
    let last_day = clock.local_date(end - Duration::nanoseconds(1));
    let spans_days = last_day > start_day;

    match (is_multi_day, spans_days) {
        (false, true) => Err(invalid(format!(
            "single-day session spans {} to {}",
            start_day, last_day
        ))),
        (true, false) => Err(invalid(format!(
            "multi-day session stays within {}",
            start_day
        ))),
        _ => Ok(()),
    }
}

pub fn validate_session(session: &Session, clock: &dyn Clock) -> Result<()> {
    validate_session_dates(
        &session.id,
        session.start_date,
        session.end_date,
        session.is_multi_day,
        clock,
    )
}
