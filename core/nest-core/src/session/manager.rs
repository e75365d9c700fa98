//! Coordinates session persistence, lifecycle rules and change notifications.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::clock::Clock;
use crate::error::{NestError, Result};
use crate::events::{EventBus, NestEvent};

use super::access::can_access_nest;
use super::buckets::{bucket_sessions, SessionBuckets};
use super::repository::SessionRepository;
use super::transition::{apply_transition, Confirmation, StatusChange};
use super::types::{
    ArchivedSession, AssignedSitter, EarlyAccessDuration, InviteStatus, Session, SessionEntry,
    SessionStatus, VisibilityLevel,
};
use super::validation::{validate_session, validate_session_dates};

pub struct SessionManager {
    repository: Arc<dyn SessionRepository>,
    clock: Arc<dyn Clock>,
    bus: EventBus,
}

impl SessionManager {
    pub fn new(
        repository: Arc<dyn SessionRepository>,
        clock: Arc<dyn Clock>,
        bus: EventBus,
    ) -> Self {
        Self {
            repository,
            clock,
            bus,
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Validates and persists a new session.
    pub fn create_session(&self, session: Session) -> Result<Session> {
        validate_session(&session, self.clock.as_ref())?;
        self.repository.insert(session.clone())?;
        tracing::info!(session_id = %session.id, nest_id = %session.nest_id, "Session created");
        self.bus.publish(NestEvent::SessionUpdated {
            session_id: session.id.clone(),
        });
        Ok(session)
    }

    pub fn session(&self, id: &str) -> Result<SessionEntry> {
        self.repository
            .get(id)
            .ok_or_else(|| NestError::SessionNotFound(id.to_string()))
    }

    /// Effective status of a live or archived session right now.
    pub fn status(&self, id: &str) -> Result<SessionStatus> {
        Ok(self.session(id)?.status(self.now()))
    }

    pub fn update_dates(
        &self,
        id: &str,
        start_date: DateTime<Utc>,
        end_date: DateTime<Utc>,
        is_multi_day: bool,
    ) -> Result<Session> {
        validate_session_dates(id, start_date, end_date, is_multi_day, self.clock.as_ref())?;
        self.mutate_live(id, |session| {
            session.start_date = start_date;
            session.end_date = end_date;
            session.is_multi_day = is_multi_day;
        })
    }

    pub fn set_visibility(&self, id: &str, level: VisibilityLevel) -> Result<Session> {
        self.mutate_live(id, |session| session.visibility_level = level)
    }

    pub fn set_early_access(&self, id: &str, duration: EarlyAccessDuration) -> Result<Session> {
        self.mutate_live(id, |session| session.early_access_duration = duration)
    }

    pub fn assign_sitter(&self, id: &str, sitter: AssignedSitter) -> Result<Session> {
        self.mutate_live(id, |session| session.assigned_sitter = Some(sitter))
    }

    pub fn remove_sitter(&self, id: &str) -> Result<Session> {
        self.mutate_live(id, |session| session.assigned_sitter = None)
    }

    /// Updates the invite status of the assigned sitter; no-op without one.
    pub fn update_invite_status(&self, id: &str, status: InviteStatus) -> Result<Session> {
        self.mutate_live(id, |session| {
            if let Some(sitter) = session.assigned_sitter.as_mut() {
                sitter.invite_status = status;
            }
        })
    }

    /// Applies an owner-chosen status. Completing requires `Confirmation::Confirmed`.
    pub fn set_status(
        &self,
        id: &str,
        to: SessionStatus,
        confirmation: Confirmation,
    ) -> Result<Option<StatusChange>> {
        let mut session = self.live_session(id)?;
        let change = apply_transition(&mut session, to, confirmation, self.now())?;
        self.repository.update(session)?;

        if let Some(change) = change {
            tracing::info!(
                session_id = %id,
                from = %change.from,
                to = %change.to,
                "Session status changed"
            );
            self.bus.publish(NestEvent::SessionStatusChanged {
                session_id: id.to_string(),
                from: change.from,
                to: change.to,
            });
        }
        Ok(change)
    }

    /// Archives a live session. The snapshot is always `Completed`.
    pub fn archive(&self, id: &str) -> Result<ArchivedSession> {
        let archived = self.repository.archive(id, self.now())?;
        tracing::info!(session_id = %id, "Session archived");
        self.bus.publish(NestEvent::SessionArchived {
            session_id: id.to_string(),
        });
        Ok(archived)
    }

    /// Permanently removes a session. Only ever called on explicit user action.
    pub fn delete(&self, id: &str) -> Result<()> {
        self.repository.delete(id)?;
        tracing::info!(session_id = %id, "Session deleted");
        self.bus.publish(NestEvent::SessionDeleted {
            session_id: id.to_string(),
        });
        Ok(())
    }

    /// Evaluated fresh on every call. Archived sessions never grant access.
    pub fn can_access_nest(&self, id: &str) -> Result<bool> {
        match self.session(id)? {
            SessionEntry::Live(session) => Ok(can_access_nest(&session, self.now())),
            SessionEntry::Archived(_) => Ok(false),
        }
    }

    pub fn buckets(&self) -> SessionBuckets {
        bucket_sessions(
            &self.repository.all_sessions(),
            &self.repository.archived_sessions(),
            self.now(),
        )
    }

    /// Sessions of one nest, bucketed.
    pub fn buckets_for_nest(&self, nest_id: &str) -> SessionBuckets {
        let live: Vec<_> = self
            .repository
            .all_sessions()
            .into_iter()
            .filter(|s| s.nest_id == nest_id)
            .collect();
        let archived: Vec<_> = self
            .repository
            .archived_sessions()
            .into_iter()
            .filter(|s| s.nest_id == nest_id)
            .collect();
        bucket_sessions(&live, &archived, self.now())
    }

    fn live_session(&self, id: &str) -> Result<Session> {
        match self.session(id)? {
            SessionEntry::Live(session) => Ok(session),
            SessionEntry::Archived(_) => Err(NestError::ArchivedSessionImmutable(id.to_string())),
        }
    }

    fn mutate_live<F>(&self, id: &str, apply: F) -> Result<Session>
    where
        F: FnOnce(&mut Session),
    {
        let mut session = self.live_session(id)?;
        apply(&mut session);
        self.repository.update(session.clone())?;
        self.bus.publish(NestEvent::SessionUpdated {
            session_id: id.to_string(),
        });
        Ok(session)
    }
}
