//! Partitions sessions into past / in-progress / upcoming lists.
//!
//! Every session lands in exactly one bucket, chosen by its effective status:
//!
//! | Bucket      | Statuses                         | Order                  |
//! |-------------|----------------------------------|------------------------|
//! | past        | completed, plus every archived   | end date, newest first |
//! | in progress | inProgress, extended             | end date, soonest first|
//! | upcoming    | upcoming, earlyAccess            | start date, soonest    |
//!
//! Equal sort keys are broken by session id so output never depends on input order.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};

use super::types::{ArchivedSession, Session, SessionEntry, SessionStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bucket {
    Past,
    InProgress,
    Upcoming,
}

impl Bucket {
    pub fn for_status(status: SessionStatus) -> Self {
        match status {
            SessionStatus::Completed => Bucket::Past,
            SessionStatus::InProgress | SessionStatus::Extended => Bucket::InProgress,
            SessionStatus::Upcoming | SessionStatus::EarlyAccess => Bucket::Upcoming,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionBuckets {
    pub past: Vec<SessionEntry>,
    pub in_progress: Vec<Session>,
    pub upcoming: Vec<Session>,
}

impl SessionBuckets {
    pub fn len(&self) -> usize {
        self.past.len() + self.in_progress.len() + self.upcoming.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Buckets live and archived sessions as of `now`.
pub fn bucket_sessions(
    live: &[Session],
    archived: &[ArchivedSession],
    now: DateTime<Utc>,
) -> SessionBuckets {
    let mut buckets = SessionBuckets::default();

    for session in live {
        match Bucket::for_status(session.effective_status(now)) {
            Bucket::Past => buckets.past.push(SessionEntry::Live(session.clone())),
            Bucket::InProgress => buckets.in_progress.push(session.clone()),
            Bucket::Upcoming => buckets.upcoming.push(session.clone()),
        }
    }
    buckets
        .past
        .extend(archived.iter().cloned().map(SessionEntry::Archived));

    buckets.past.sort_by(|a, b| {
        b.end_date()
            .cmp(&a.end_date())
            .then_with(|| a.id().cmp(b.id()))
    });
    buckets
        .in_progress
        .sort_by(|a, b| by_key_then_id(a.end_date, b.end_date, a, b));
    buckets
        .upcoming
        .sort_by(|a, b| by_key_then_id(a.start_date, b.start_date, a, b));

    buckets
}

fn by_key_then_id(
    key_a: DateTime<Utc>,
    key_b: DateTime<Utc>,
    a: &Session,
    b: &Session,
) -> Ordering {
    key_a.cmp(&key_b).then_with(|| a.id.cmp(&b.id))
}
