//! Domain model — courses, students, events, and drafts.
//!
//! Identifiers are plain `i64`: chat-platform snowflakes for users and
//! channels, database rowids for everything else.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type CourseId = i64;
pub type StudentId = i64;
pub type EventId = i64;
pub type DraftId = i64;
pub type ChannelId = i64;
pub type UserId = i64;

/// A course students can subscribe to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Course {
    pub id: CourseId,
    /// Short code shown in lists, e.g. "CS101".
    pub code: String,
    pub name: String,
}

/// A student with their subscriptions and reminder preferences.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Student {
    /// Chat-platform user id.
    pub id: StudentId,
    /// Courses the student is subscribed to.
    pub courses: Vec<CourseId>,
    /// Reminder offsets in hours before the event, e.g. [24, 48].
    pub offset_hours: Vec<i64>,
}

impl Student {
    pub fn new(id: StudentId) -> Self {
        Self {
            id,
            courses: Vec::new(),
            offset_hours: Vec::new(),
        }
    }

    pub fn is_subscribed(&self, course: CourseId) -> bool {
        self.courses.contains(&course)
    }
}

/// What kind of course event this is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Assignment,
    Exam,
    Lecture,
    Other,
}

impl EventKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Assignment => "assignment",
            Self::Exam => "exam",
            Self::Lecture => "lecture",
            Self::Other => "event",
        }
    }
}

/// Terminal-transition status of an event. Orthogonal to soft deletion:
/// `deleted` gates reminder eligibility, `Completed` is the end of life.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    Active,
    Completed,
}

/// A published course event students get reminded about.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseEvent {
    pub id: EventId,
    pub title: String,
    pub kind: EventKind,
    /// Courses this event belongs to; reminders go to their subscribers.
    pub courses: Vec<CourseId>,
    /// When the event takes place.
    pub event_time: DateTime<Utc>,
    pub status: EventStatus,
    /// Soft-delete flag. A deleted event stops notifying but can be undone
    /// until its cleanup trigger fires.
    pub deleted: bool,
    pub created_at: DateTime<Utc>,
}

impl CourseEvent {
    pub fn new(
        id: EventId,
        title: &str,
        kind: EventKind,
        courses: Vec<CourseId>,
        event_time: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            title: title.to_string(),
            kind,
            courses,
            event_time,
            status: EventStatus::Active,
            deleted: false,
            created_at: Utc::now(),
        }
    }

    /// Whether this event still owes its subscribers reminders.
    pub fn notifies(&self) -> bool {
        !self.deleted && self.status == EventStatus::Active
    }
}

/// A staff-authored draft of an event, not yet published. Drafts expire if
/// left unconfirmed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventDraft {
    pub id: DraftId,
    /// Staff member editing the draft.
    pub author_id: UserId,
    pub title: String,
    pub kind: EventKind,
    pub courses: Vec<CourseId>,
    pub event_time: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_notifies() {
        let mut event = CourseEvent::new(1, "Midterm", EventKind::Exam, vec![10], Utc::now());
        assert!(event.notifies());

        event.deleted = true;
        assert!(!event.notifies());

        event.deleted = false;
        event.status = EventStatus::Completed;
        assert!(!event.notifies());
    }

    #[test]
    fn test_student_subscription() {
        let mut student = Student::new(42);
        assert!(!student.is_subscribed(10));
        student.courses.push(10);
        assert!(student.is_subscribed(10));
    }
}
