//! `nestctl session ...` handlers.

use chrono::{DateTime, Utc};
use nest_core::{
    Confirmation, NestEngine, Result, Session, SessionBuckets, SessionEntry, SessionStatus,
};
use serde_json::{json, Value};

/// clap value parser for status arguments.
pub fn parse_status(value: &str) -> std::result::Result<SessionStatus, String> {
    SessionStatus::parse(value).ok_or_else(|| {
        format!(
            "unknown status '{}' (expected upcoming, earlyAccess, inProgress, extended or completed)",
            value
        )
    })
}

fn live_row(session: &Session, now: DateTime<Utc>) -> Value {
    json!({
        "id": session.id,
        "title": session.title,
        "nestId": session.nest_id,
        "status": session.display_status(now).as_str(),
        "startDate": session.start_date.to_rfc3339(),
        "endDate": session.end_date.to_rfc3339(),
    })
}

fn entry_row(entry: &SessionEntry, now: DateTime<Utc>) -> Value {
    match entry {
        SessionEntry::Live(session) => live_row(session, now),
        SessionEntry::Archived(archived) => json!({
            "id": archived.id,
            "title": archived.title,
            "nestId": archived.nest_id,
            "status": archived.status().as_str(),
            "startDate": archived.start_date.to_rfc3339(),
            "endDate": archived.end_date.to_rfc3339(),
            "archivedAt": archived.archived_at.to_rfc3339(),
        }),
    }
}

fn buckets_json(buckets: &SessionBuckets, now: DateTime<Utc>) -> Value {
    json!({
        "past": buckets.past.iter().map(|e| entry_row(e, now)).collect::<Vec<_>>(),
        "inProgress": buckets.in_progress.iter().map(|s| live_row(s, now)).collect::<Vec<_>>(),
        "upcoming": buckets.upcoming.iter().map(|s| live_row(s, now)).collect::<Vec<_>>(),
    })
}

pub fn list(engine: &NestEngine, nest_id: Option<&str>) -> Value {
    let sessions = engine.sessions();
    let buckets = match nest_id {
        Some(nest_id) => sessions.buckets_for_nest(nest_id),
        None => sessions.buckets(),
    };
    buckets_json(&buckets, sessions.now())
}

/// Returns the resulting status.
pub fn set_status(
    engine: &NestEngine,
    id: &str,
    status: SessionStatus,
    confirm: bool,
) -> Result<SessionStatus> {
    let sessions = engine.sessions();
    sessions.set_status(id, status, Confirmation::from(confirm))?;
    sessions.status(id)
}

pub fn access(engine: &NestEngine, id: &str) -> Result<bool> {
    engine.sessions().can_access_nest(id)
}

pub fn archive(engine: &NestEngine, id: &str) -> Result<()> {
    engine.sessions().archive(id).map(|_| ())
}

pub fn delete(engine: &NestEngine, id: &str) -> Result<()> {
    engine.sessions().delete(id)
}
