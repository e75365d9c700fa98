//! Session data model shared by the state machine, bucketing and persistence.
//!
//! Serialized field names are camelCase to match the documents the clients
//! already exchange with the backend.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle state of a care session.
///
/// `EarlyAccess` is a pre-state that overlaps `Upcoming`: the session has not
/// started yet but the sitter can already see the nest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, uniffi::Enum)]
#[serde(rename_all = "camelCase")]
pub enum SessionStatus {
    Upcoming,
    EarlyAccess,
    InProgress,
    Extended,
    Completed,
}

impl SessionStatus {
    /// Status implied by the clock alone, ignoring any explicit override.
    pub fn inferred(now: DateTime<Utc>, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        if now < start {
            SessionStatus::Upcoming
        } else if now < end {
            SessionStatus::InProgress
        } else {
            SessionStatus::Completed
        }
    }

    /// True for states in which the session is underway.
    pub fn is_active(&self) -> bool {
        matches!(self, SessionStatus::InProgress | SessionStatus::Extended)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Upcoming => "upcoming",
            SessionStatus::EarlyAccess => "earlyAccess",
            SessionStatus::InProgress => "inProgress",
            SessionStatus::Extended => "extended",
            SessionStatus::Completed => "completed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "upcoming" => Some(SessionStatus::Upcoming),
            "earlyAccess" | "early-access" => Some(SessionStatus::EarlyAccess),
            "inProgress" | "in-progress" => Some(SessionStatus::InProgress),
            "extended" => Some(SessionStatus::Extended),
            "completed" => Some(SessionStatus::Completed),
            _ => None,
        }
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How much household information a sitter sees, from least to most.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Default,
    Serialize,
    Deserialize,
    uniffi::Enum,
)]
#[serde(rename_all = "camelCase")]
pub enum VisibilityLevel {
    Essential,
    #[default]
    Standard,
    Extended,
    Comprehensive,
}

impl VisibilityLevel {
    /// Returns true if an item tagged `required` is visible at this level.
    pub fn includes(&self, required: VisibilityLevel) -> bool {
        *self >= required
    }
}

/// How long before the start a sitter may see the nest.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, uniffi::Enum,
)]
#[serde(rename_all = "camelCase")]
pub enum EarlyAccessDuration {
    #[default]
    None,
    OneHour,
    TwoHours,
    FourHours,
    HalfDay,
    OneDay,
    TwoDays,
}

impl EarlyAccessDuration {
    pub fn duration(&self) -> Option<Duration> {
        match self {
            EarlyAccessDuration::None => None,
            EarlyAccessDuration::OneHour => Some(Duration::hours(1)),
            EarlyAccessDuration::TwoHours => Some(Duration::hours(2)),
            EarlyAccessDuration::FourHours => Some(Duration::hours(4)),
            EarlyAccessDuration::HalfDay => Some(Duration::hours(12)),
            EarlyAccessDuration::OneDay => Some(Duration::days(1)),
            EarlyAccessDuration::TwoDays => Some(Duration::days(2)),
        }
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, uniffi::Enum,
)]
#[serde(rename_all = "camelCase")]
pub enum InviteStatus {
    #[default]
    None,
    Invited,
    Accepted,
    Declined,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, uniffi::Record)]
#[serde(rename_all = "camelCase")]
pub struct AssignedSitter {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub invite_status: InviteStatus,
}

/// A live care session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: String,
    pub title: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    #[serde(default)]
    pub is_multi_day: bool,
    #[serde(default)]
    pub visibility_level: VisibilityLevel,
    pub status: SessionStatus,
    /// Set once the owner picks a status; from then on `status` wins over inference.
    #[serde(default)]
    pub status_is_explicit: bool,
    #[serde(default)]
    pub assigned_sitter: Option<AssignedSitter>,
    pub nest_id: String,
    pub owner_id: String,
    #[serde(default)]
    pub early_access_duration: EarlyAccessDuration,
}

impl Session {
    /// Creates an unsaved draft with a fresh identifier.
    pub fn draft(
        title: impl Into<String>,
        nest_id: impl Into<String>,
        owner_id: impl Into<String>,
        start_date: DateTime<Utc>,
        end_date: DateTime<Utc>,
    ) -> Self {
        Self {
            id: ulid::Ulid::new().to_string(),
            title: title.into(),
            start_date,
            end_date,
            is_multi_day: false,
            visibility_level: VisibilityLevel::default(),
            status: SessionStatus::Upcoming,
            status_is_explicit: false,
            assigned_sitter: None,
            nest_id: nest_id.into(),
            owner_id: owner_id.into(),
            early_access_duration: EarlyAccessDuration::None,
        }
    }

    pub fn multi_day(mut self, is_multi_day: bool) -> Self {
        self.is_multi_day = is_multi_day;
        self
    }

    pub fn with_visibility(mut self, level: VisibilityLevel) -> Self {
        self.visibility_level = level;
        self
    }

    pub fn with_early_access(mut self, duration: EarlyAccessDuration) -> Self {
        self.early_access_duration = duration;
        self
    }

    /// Pins `status` as an owner-chosen status.
    pub fn with_status(mut self, status: SessionStatus) -> Self {
        self.status = status;
        self.status_is_explicit = true;
        self
    }

    /// Status used for display, bucketing and access decisions.
    pub fn effective_status(&self, now: DateTime<Utc>) -> SessionStatus {
        if self.status_is_explicit {
            self.status
        } else {
            SessionStatus::inferred(now, self.start_date, self.end_date)
        }
    }

    /// Like [`Session::effective_status`], but reports `EarlyAccess` for an
    /// upcoming session whose early-access window has opened.
    pub fn display_status(&self, now: DateTime<Utc>) -> SessionStatus {
        match self.effective_status(now) {
            SessionStatus::Upcoming if self.is_within_early_access_window(now) => {
                SessionStatus::EarlyAccess
            }
            status => status,
        }
    }

    /// Instant the early-access window opens, if early access is configured.
    pub fn early_access_start(&self) -> Option<DateTime<Utc>> {
        self.early_access_duration
            .duration()
            .map(|lead| self.start_date - lead)
    }

    /// `[start - earlyAccessDuration, end)`; empty when early access is off.
    pub fn is_within_early_access_window(&self, now: DateTime<Utc>) -> bool {
        match self.early_access_start() {
            Some(opens) => now >= opens && now < self.end_date,
            None => false,
        }
    }

    /// Converts this session into its immutable archived form.
    pub fn archive(self, archived_at: DateTime<Utc>) -> ArchivedSession {
        ArchivedSession {
            id: self.id,
            title: self.title,
            start_date: self.start_date,
            end_date: self.end_date,
            is_multi_day: self.is_multi_day,
            visibility_level: self.visibility_level,
            assigned_sitter: self.assigned_sitter,
            nest_id: self.nest_id,
            owner_id: self.owner_id,
            archived_at,
        }
    }
}

/// Read-only snapshot of a session retained for history.
///
/// Has no status field: an archived session is always `Completed`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchivedSession {
    pub id: String,
    pub title: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    #[serde(default)]
    pub is_multi_day: bool,
    #[serde(default)]
    pub visibility_level: VisibilityLevel,
    #[serde(default)]
    pub assigned_sitter: Option<AssignedSitter>,
    pub nest_id: String,
    pub owner_id: String,
    pub archived_at: DateTime<Utc>,
}

impl ArchivedSession {
    pub fn status(&self) -> SessionStatus {
        SessionStatus::Completed
    }
}

/// Either kind of session, for lists that mix them.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEntry {
    Live(Session),
    Archived(ArchivedSession),
}

impl SessionEntry {
    pub fn id(&self) -> &str {
        match self {
            SessionEntry::Live(s) => &s.id,
            SessionEntry::Archived(s) => &s.id,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            SessionEntry::Live(s) => &s.title,
            SessionEntry::Archived(s) => &s.title,
        }
    }

    pub fn start_date(&self) -> DateTime<Utc> {
        match self {
            SessionEntry::Live(s) => s.start_date,
            SessionEntry::Archived(s) => s.start_date,
        }
    }

    pub fn end_date(&self) -> DateTime<Utc> {
        match self {
            SessionEntry::Live(s) => s.end_date,
            SessionEntry::Archived(s) => s.end_date,
        }
    }

    pub fn nest_id(&self) -> &str {
        match self {
            SessionEntry::Live(s) => &s.nest_id,
            SessionEntry::Archived(s) => &s.nest_id,
        }
    }

    pub fn status(&self, now: DateTime<Utc>) -> SessionStatus {
        match self {
            SessionEntry::Live(s) => s.effective_status(now),
            SessionEntry::Archived(s) => s.status(),
        }
    }

    pub fn is_archived(&self) -> bool {
        matches!(self, SessionEntry::Archived(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 6, day, hour, 0, 0).unwrap()
    }

    fn session() -> Session {
        Session::draft("Evening", "nest-1", "owner-1", ts(1, 18), ts(1, 23))
    }

    #[test]
    fn test_inferred_status_boundaries() {
        let (start, end) = (ts(1, 18), ts(1, 23));
        assert_eq!(
            SessionStatus::inferred(ts(1, 17), start, end),
            SessionStatus::Upcoming
        );
        assert_eq!(
            SessionStatus::inferred(start, start, end),
            SessionStatus::InProgress
        );
        assert_eq!(
            SessionStatus::inferred(end, start, end),
            SessionStatus::Completed
        );
    }

    #[test]
    fn test_explicit_status_wins() {
        let s = session().with_status(SessionStatus::Extended);
        assert_eq!(s.effective_status(ts(1, 17)), SessionStatus::Extended);
        assert_eq!(s.effective_status(ts(2, 9)), SessionStatus::Extended);
    }

    #[test]
    fn test_display_status_reports_early_access() {
        let s = session().with_early_access(EarlyAccessDuration::TwoHours);
        assert_eq!(s.display_status(ts(1, 15)), SessionStatus::Upcoming);
        assert_eq!(s.display_status(ts(1, 17)), SessionStatus::EarlyAccess);
        assert_eq!(s.display_status(ts(1, 19)), SessionStatus::InProgress);
    }

    #[test]
    fn test_visibility_ordering() {
        assert!(VisibilityLevel::Comprehensive.includes(VisibilityLevel::Essential));
        assert!(VisibilityLevel::Standard.includes(VisibilityLevel::Standard));
        assert!(!VisibilityLevel::Essential.includes(VisibilityLevel::Extended));
    }

    #[test]
    fn test_status_parse_round_trip() {
        for status in [
            SessionStatus::Upcoming,
            SessionStatus::EarlyAccess,
            SessionStatus::InProgress,
            SessionStatus::Extended,
            SessionStatus::Completed,
        ] {
            assert_eq!(SessionStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(SessionStatus::parse("paused"), None);
    }

    #[test]
    fn test_status_serializes_camel_case() {
        let json = serde_json::to_string(&SessionStatus::InProgress).unwrap();
        assert_eq!(json, "\"inProgress\"");
    }

    #[test]
    fn test_archive_keeps_identity_and_is_completed() {
        let s = session().with_status(SessionStatus::InProgress);
        let id = s.id.clone();
        let archived = s.archive(ts(2, 9));
        assert_eq!(archived.id, id);
        assert_eq!(archived.status(), SessionStatus::Completed);
        assert_eq!(archived.archived_at, ts(2, 9));
    }

    #[test]
    fn test_draft_ids_are_unique() {
        assert_ne!(session().id, session().id);
    }
}
