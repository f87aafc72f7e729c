//! Event records exchanged over the bridge.
//!
//! Field names serialize to the camelCase keys the cross-platform caller
//! expects (`eventId`, `emailAddress`, ...). Closed enumerations travel as
//! the integers (or strings, for availability) the platform calendar API uses,
//! and anything outside the known set is rejected at decode time.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::recurrence::{self, RecurrenceRule};
use crate::timestamp::Timestamp;

/// A calendar event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub event_id: String,
    pub calendar_id: String,
    pub title: String,
    pub description: String,
    pub start: Timestamp,
    pub end: Timestamp,
    pub all_day: bool,
    /// IANA zone the event was scheduled in. Timestamps are UTC regardless.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time_zone: Option<String>,
    /// Order carries no meaning.
    pub attendees: Vec<Attendee>,
    pub location: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurrence_rule: Option<RecurrenceRule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organizer: Option<Attendee>,
    pub reminders: Vec<Reminder>,
    pub url: String,
    pub availability: Availability,
}

impl Event {
    /// A new, not yet saved event. The id is assigned by the store.
    pub fn new(calendar_id: &str, title: &str, start: Timestamp, end: Timestamp) -> Self {
        Event {
            event_id: String::new(),
            calendar_id: calendar_id.to_string(),
            title: title.to_string(),
            description: String::new(),
            start,
            end,
            all_day: false,
            start_time_zone: None,
            attendees: Vec::new(),
            location: String::new(),
            recurrence_rule: None,
            organizer: None,
            reminders: Vec::new(),
            url: String::new(),
            availability: Availability::Busy,
        }
    }

    pub fn is_recurring(&self) -> bool {
        self.recurrence_rule.is_some()
    }

    pub fn duration(&self) -> Duration {
        self.end.since(self.start)
    }

    /// True if the event intersects the closed range `[from, to]`.
    pub fn overlaps(&self, from: Timestamp, to: Timestamp) -> bool {
        self.start <= to && self.end >= from
    }

    /// Copy of this event moved to another occurrence start, keeping its duration.
    pub fn occurrence_at(&self, start: Timestamp) -> Event {
        let mut instance = self.clone();
        instance.start = start;
        instance.end = start.saturating_add(self.duration());
        instance
    }

    /// Attendee with the given email, compared case-insensitively.
    pub fn attendee(&self, email: &str) -> Option<&Attendee> {
        self.attendees
            .iter()
            .find(|a| a.email_address.eq_ignore_ascii_case(email))
    }

    /// Checks that must pass before the event is written: reminders that fit
    /// a duration and a recurrence rule that can be expanded.
    pub fn validate(&self) -> CoreResult<()> {
        for reminder in &self.reminders {
            reminder.offset()?;
        }
        recurrence::validate_series(self)
    }
}

/// An event attendee (also used for organizer).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attendee {
    pub name: String,
    pub email_address: String,
    pub role: AttendeeRole,
    pub attendance_status: AttendanceStatus,
}

/// A reminder/alarm for an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reminder {
    /// Minutes before the event to trigger
    pub minutes: i64,
}

impl Reminder {
    pub fn offset(&self) -> CoreResult<Duration> {
        Duration::try_minutes(self.minutes).ok_or_else(|| {
            CoreError::InvalidArgument(format!(
                "Reminder of {} minutes is out of range",
                self.minutes
            ))
        })
    }
}

/// Participant role, numbered as the platform calendar API numbers it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum AttendeeRole {
    Unknown,
    Required,
    Optional,
    Chair,
    NonParticipant,
}

impl AttendeeRole {
    /// ROLE parameter value (RFC 5545 section 3.2.16). Unknown has none.
    pub fn as_ics_str(self) -> Option<&'static str> {
        match self {
            AttendeeRole::Unknown => None,
            AttendeeRole::Required => Some("REQ-PARTICIPANT"),
            AttendeeRole::Optional => Some("OPT-PARTICIPANT"),
            AttendeeRole::Chair => Some("CHAIR"),
            AttendeeRole::NonParticipant => Some("NON-PARTICIPANT"),
        }
    }

    pub fn from_ics_str(s: &str) -> Self {
        match s.to_ascii_uppercase().as_str() {
            "REQ-PARTICIPANT" => AttendeeRole::Required,
            "OPT-PARTICIPANT" => AttendeeRole::Optional,
            "CHAIR" => AttendeeRole::Chair,
            "NON-PARTICIPANT" => AttendeeRole::NonParticipant,
            _ => AttendeeRole::Unknown,
        }
    }
}

impl TryFrom<i64> for AttendeeRole {
    type Error = String;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(AttendeeRole::Unknown),
            1 => Ok(AttendeeRole::Required),
            2 => Ok(AttendeeRole::Optional),
            3 => Ok(AttendeeRole::Chair),
            4 => Ok(AttendeeRole::NonParticipant),
            other => Err(format!("unknown attendee role {other}, expected 0..=4")),
        }
    }
}

impl From<AttendeeRole> for i64 {
    fn from(role: AttendeeRole) -> Self {
        match role {
            AttendeeRole::Unknown => 0,
            AttendeeRole::Required => 1,
            AttendeeRole::Optional => 2,
            AttendeeRole::Chair => 3,
            AttendeeRole::NonParticipant => 4,
        }
    }
}

/// Participation status, numbered as the platform calendar API numbers it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum AttendanceStatus {
    Unknown,
    Pending,
    Accepted,
    Declined,
    Tentative,
    Delegated,
    Completed,
    InProcess,
}

impl AttendanceStatus {
    /// PARTSTAT parameter value (RFC 5545 section 3.2.12). Unknown has none.
    pub fn as_ics_str(self) -> Option<&'static str> {
        match self {
            AttendanceStatus::Unknown => None,
            AttendanceStatus::Pending => Some("NEEDS-ACTION"),
            AttendanceStatus::Accepted => Some("ACCEPTED"),
            AttendanceStatus::Declined => Some("DECLINED"),
            AttendanceStatus::Tentative => Some("TENTATIVE"),
            AttendanceStatus::Delegated => Some("DELEGATED"),
            AttendanceStatus::Completed => Some("COMPLETED"),
            AttendanceStatus::InProcess => Some("IN-PROCESS"),
        }
    }

    pub fn from_ics_str(s: &str) -> Self {
        match s.to_ascii_uppercase().as_str() {
            "NEEDS-ACTION" => AttendanceStatus::Pending,
            "ACCEPTED" => AttendanceStatus::Accepted,
            "DECLINED" => AttendanceStatus::Declined,
            "TENTATIVE" => AttendanceStatus::Tentative,
            "DELEGATED" => AttendanceStatus::Delegated,
            "COMPLETED" => AttendanceStatus::Completed,
            "IN-PROCESS" => AttendanceStatus::InProcess,
            _ => AttendanceStatus::Unknown,
        }
    }
}

impl TryFrom<i64> for AttendanceStatus {
    type Error = String;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(AttendanceStatus::Unknown),
            1 => Ok(AttendanceStatus::Pending),
            2 => Ok(AttendanceStatus::Accepted),
            3 => Ok(AttendanceStatus::Declined),
            4 => Ok(AttendanceStatus::Tentative),
            5 => Ok(AttendanceStatus::Delegated),
            6 => Ok(AttendanceStatus::Completed),
            7 => Ok(AttendanceStatus::InProcess),
            other => Err(format!("unknown attendance status {other}, expected 0..=7")),
        }
    }
}

impl From<AttendanceStatus> for i64 {
    fn from(status: AttendanceStatus) -> Self {
        match status {
            AttendanceStatus::Unknown => 0,
            AttendanceStatus::Pending => 1,
            AttendanceStatus::Accepted => 2,
            AttendanceStatus::Declined => 3,
            AttendanceStatus::Tentative => 4,
            AttendanceStatus::Delegated => 5,
            AttendanceStatus::Completed => 6,
            AttendanceStatus::InProcess => 7,
        }
    }
}

/// How an event shows on a free/busy view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "&'static str")]
pub enum Availability {
    Busy,
    Free,
    Tentative,
    Unavailable,
}

impl Availability {
    pub fn as_str(self) -> &'static str {
        match self {
            Availability::Busy => "BUSY",
            Availability::Free => "FREE",
            Availability::Tentative => "TENTATIVE",
            Availability::Unavailable => "UNAVAILABLE",
        }
    }
}

impl TryFrom<String> for Availability {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.to_ascii_uppercase().as_str() {
            "BUSY" => Ok(Availability::Busy),
            "FREE" => Ok(Availability::Free),
            "TENTATIVE" => Ok(Availability::Tentative),
            "UNAVAILABLE" => Ok(Availability::Unavailable),
            _ => Err(format!(
                "unknown availability '{value}', expected BUSY, FREE, TENTATIVE or UNAVAILABLE"
            )),
        }
    }
}

impl From<Availability> for &'static str {
    fn from(availability: Availability) -> Self {
        availability.as_str()
    }
}
