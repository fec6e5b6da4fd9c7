//! Collaborator traits — the seams between the core logic and the hosting
//! layer. Repositories are synchronous (SQLite underneath); the notifier is
//! async because it talks to the chat platform.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::types::{
    Course, CourseEvent, CourseId, DraftId, EventDraft, EventId, EventStatus, Student, StudentId,
    UserId,
};

/// Read/write access to published events.
pub trait EventRepository: Send + Sync {
    fn exists(&self, id: EventId) -> Result<bool>;
    /// Returns `CourseBellError::NotFound` when the row is missing.
    fn get(&self, id: EventId) -> Result<CourseEvent>;
    fn save(&self, event: &CourseEvent) -> Result<()>;
    /// Events attached to a course with `event_time > after`, soft-deleted
    /// rows excluded.
    fn upcoming_for_course(&self, course: CourseId, after: DateTime<Utc>)
    -> Result<Vec<CourseEvent>>;
    /// Terminal transition, e.g. `Active -> Completed`.
    fn transition(&self, id: EventId, status: EventStatus) -> Result<()>;
    /// Permanently remove a soft-deleted event.
    fn purge(&self, id: EventId) -> Result<()>;
}

/// Read/write access to students and their subscriptions.
pub trait StudentRepository: Send + Sync {
    fn exists(&self, id: StudentId) -> Result<bool>;
    fn get(&self, id: StudentId) -> Result<Student>;
    fn save(&self, student: &Student) -> Result<()>;
    /// All students subscribed to the given course.
    fn subscribed_to(&self, course: CourseId) -> Result<Vec<Student>>;
}

/// Read/write access to unpublished event drafts.
pub trait DraftRepository: Send + Sync {
    fn get(&self, id: DraftId) -> Result<EventDraft>;
    fn save(&self, draft: &EventDraft) -> Result<()>;
    /// Returns whether a row was actually removed.
    fn delete(&self, id: DraftId) -> Result<bool>;
}

/// Course catalog lookups.
pub trait CourseRepository: Send + Sync {
    fn get(&self, id: CourseId) -> Result<Course>;
    fn all(&self) -> Result<Vec<Course>>;
}

/// Outbound notification seam. Fired reminder jobs deliver through this;
/// failures are caught and logged by the job, never propagated.
#[async_trait]
pub trait Notifier: Send + Sync {
    fn name(&self) -> &str;
    /// Deliver a direct message to a user.
    async fn notify(&self, user_id: UserId, message: &str) -> Result<()>;
}
