//! Trigger definitions — the data model for scheduled one-shot work.
//!
//! A trigger is addressed by its key: a structured group plus a name. Groups
//! carry real ids instead of concatenated strings, so batch cancellation is
//! an indexed lookup rather than prefix matching.

use chrono::{DateTime, Utc};
use coursebell_core::types::{DraftId, EventId, StudentId};
use serde::{Deserialize, Serialize};

/// The durable job a trigger fires into. Each kind maps to exactly one
/// registered handler, shared by every trigger of that kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    DraftExpiry,
    DeletedEventExpiry,
    EventReminder,
    EventCompletion,
}

impl JobKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DraftExpiry => "draft_expiry",
            Self::DeletedEventExpiry => "deleted_event_expiry",
            Self::EventReminder => "event_reminder",
            Self::EventCompletion => "event_completion",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "draft_expiry" => Some(Self::DraftExpiry),
            "deleted_event_expiry" => Some(Self::DeletedEventExpiry),
            "event_reminder" => Some(Self::EventReminder),
            "event_completion" => Some(Self::EventCompletion),
            _ => None,
        }
    }
}

/// Structured group component of a trigger key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerGroup {
    /// Draft lifecycle triggers, keyed by draft.
    Draft(DraftId),
    /// Event-wide triggers (completion, deleted-event cleanup).
    Event(EventId),
    /// Per-student reminder triggers for one event.
    Reminder { event: EventId, student: StudentId },
}

impl TriggerGroup {
    pub fn event_id(&self) -> Option<EventId> {
        match self {
            Self::Event(event) => Some(*event),
            Self::Reminder { event, .. } => Some(*event),
            Self::Draft(_) => None,
        }
    }

    pub fn student_id(&self) -> Option<StudentId> {
        match self {
            Self::Reminder { student, .. } => Some(*student),
            _ => None,
        }
    }
}

/// Batch-cancellation scope over trigger groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupSelector {
    /// Exactly one group.
    Exact(TriggerGroup),
    /// Every group belonging to an event: its reminders for all students
    /// plus the event-keyed triggers themselves.
    ForEvent(EventId),
    /// Every reminder group belonging to a student, across all events.
    ForStudent(StudentId),
}

impl GroupSelector {
    pub fn matches(&self, group: &TriggerGroup) -> bool {
        match self {
            Self::Exact(wanted) => group == wanted,
            Self::ForEvent(event) => group.event_id() == Some(*event),
            Self::ForStudent(student) => group.student_id() == Some(*student),
        }
    }
}

/// Addressable identity of one trigger.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TriggerKey {
    pub group: TriggerGroup,
    pub name: String,
}

impl TriggerKey {
    pub fn draft_expiry(draft: DraftId) -> Self {
        Self {
            group: TriggerGroup::Draft(draft),
            name: "expiry".into(),
        }
    }

    pub fn deleted_event_expiry(event: EventId) -> Self {
        Self {
            group: TriggerGroup::Event(event),
            name: "deleted_expiry".into(),
        }
    }

    pub fn event_completion(event: EventId) -> Self {
        Self {
            group: TriggerGroup::Event(event),
            name: "completion".into(),
        }
    }

    /// Reminder triggers are named by their offset, one per
    /// (event, student, offset) triple.
    pub fn reminder(event: EventId, student: StudentId, offset_hours: i64) -> Self {
        Self {
            group: TriggerGroup::Reminder { event, student },
            name: offset_hours.to_string(),
        }
    }
}

impl std::fmt::Display for TriggerKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.group {
            TriggerGroup::Draft(draft) => write!(f, "draft:{draft}:{}", self.name),
            TriggerGroup::Event(event) => write!(f, "event:{event}:{}", self.name),
            TriggerGroup::Reminder { event, student } => {
                write!(f, "reminder:{event}:{student}:{}", self.name)
            }
        }
    }
}

/// A scheduled one-shot trigger. Fires once (at-least-once physically) or is
/// cancelled before firing; never reused afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trigger {
    pub key: TriggerKey,
    pub kind: JobKind,
    /// When to fire. A trigger whose time passed while the scheduler was
    /// down fires once immediately on recovery.
    pub fire_at: DateTime<Utc>,
    /// Upper bound of usefulness (reminders end at the event itself).
    pub end_at: Option<DateTime<Utc>>,
    /// Small id bag handed to the job handler.
    pub payload: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl Trigger {
    pub fn draft_expiry(draft: DraftId, fire_at: DateTime<Utc>) -> Self {
        Self {
            key: TriggerKey::draft_expiry(draft),
            kind: JobKind::DraftExpiry,
            fire_at,
            end_at: None,
            payload: serde_json::json!({ "draft_id": draft }),
            created_at: Utc::now(),
        }
    }

    pub fn deleted_event_expiry(event: EventId, fire_at: DateTime<Utc>) -> Self {
        Self {
            key: TriggerKey::deleted_event_expiry(event),
            kind: JobKind::DeletedEventExpiry,
            fire_at,
            end_at: None,
            payload: serde_json::json!({ "event_id": event }),
            created_at: Utc::now(),
        }
    }

    pub fn event_completion(event: EventId, fire_at: DateTime<Utc>) -> Self {
        Self {
            key: TriggerKey::event_completion(event),
            kind: JobKind::EventCompletion,
            fire_at,
            end_at: None,
            payload: serde_json::json!({ "event_id": event }),
            created_at: Utc::now(),
        }
    }

    pub fn event_reminder(
        event: EventId,
        student: StudentId,
        offset_hours: i64,
        fire_at: DateTime<Utc>,
        end_at: DateTime<Utc>,
    ) -> Self {
        Self {
            key: TriggerKey::reminder(event, student, offset_hours),
            kind: JobKind::EventReminder,
            fire_at,
            end_at: Some(end_at),
            payload: serde_json::json!({
                "event_id": event,
                "student_id": student,
                "offset_hours": offset_hours,
            }),
            created_at: Utc::now(),
        }
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.fire_at <= now
    }
}
