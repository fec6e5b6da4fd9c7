//! Lifecycle reconciliation — computes the trigger set each domain state
//! demands and applies it through the scheduler.
//!
//! Idempotence rule: every schedule step cancels its exact key (or group)
//! right before re-adding, and cancel on an absent key is a no-op, so
//! re-running a step never creates duplicates. Multi-step sequences are not
//! one transaction; a crash between cancel and add is healed by the next
//! reconciliation of the same entity.
//!
//! Error policy: failing to *add* a trigger is surfaced to the caller, which
//! decides whether the domain operation aborts. Cleanup cancellations are
//! best-effort — they log and continue.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Duration, Utc};
use coursebell_core::config::SchedulerConfig;
use coursebell_core::error::Result;
use coursebell_core::traits::{EventRepository, StudentRepository};
use coursebell_core::types::{
    CourseEvent, CourseId, DraftId, EventDraft, EventId, Student, StudentId,
};
use coursebell_scheduler::{GroupSelector, Trigger, TriggerGroup, TriggerKey, TriggerScheduler};

/// Reconciles the live trigger set on every event/draft transition. Holds no
/// timers; all mutation goes through the scheduler.
pub struct LifecycleCoordinator {
    scheduler: Arc<TriggerScheduler>,
    events: Arc<dyn EventRepository>,
    students: Arc<dyn StudentRepository>,
    config: SchedulerConfig,
}

impl LifecycleCoordinator {
    pub fn new(
        scheduler: Arc<TriggerScheduler>,
        events: Arc<dyn EventRepository>,
        students: Arc<dyn StudentRepository>,
        config: SchedulerConfig,
    ) -> Self {
        Self {
            scheduler,
            events,
            students,
            config,
        }
    }

    // ─── Draft lifecycle ──────────────────────────────────────

    /// A staff member opened a new draft: schedule its expiry.
    pub fn draft_created(&self, draft: &EventDraft) -> Result<()> {
        let fire_at = draft.created_at + self.config.draft_cleanup_delay();
        self.cancel_quiet(&TriggerKey::draft_expiry(draft.id));
        self.scheduler
            .add_trigger(Trigger::draft_expiry(draft.id, fire_at))
    }

    /// The draft was confirmed (published) or discarded: its expiry trigger
    /// must not fire.
    pub fn draft_resolved(&self, draft: DraftId) {
        self.cancel_quiet(&TriggerKey::draft_expiry(draft));
    }

    // ─── Event lifecycle ──────────────────────────────────────

    /// A draft became a published, active event: schedule reminders for every
    /// subscriber and the completion transition.
    pub fn event_published(&self, event: &CourseEvent) -> Result<()> {
        self.schedule_event_triggers(event)
    }

    /// The event's date changed: drop everything scheduled for it and
    /// rebuild against the new date.
    pub fn event_rescheduled(&self, event: &CourseEvent) -> Result<()> {
        self.cancel_group_quiet(&GroupSelector::ForEvent(event.id));
        self.schedule_event_triggers(event)
    }

    /// The event was soft-deleted: it stops notifying, and a cleanup trigger
    /// starts the undo window.
    pub fn event_soft_deleted(&self, event: EventId) -> Result<()> {
        let removed = self.cancel_group_quiet(&GroupSelector::ForEvent(event));
        tracing::info!(event, removed, "event deleted, reminders stripped");
        let fire_at = Utc::now() + self.config.deleted_event_cleanup_delay();
        self.cancel_quiet(&TriggerKey::deleted_event_expiry(event));
        self.scheduler
            .add_trigger(Trigger::deleted_event_expiry(event, fire_at))
    }

    /// The soft deletion was undone inside the cleanup window: cancel the
    /// purge and reschedule as if freshly published.
    pub fn event_restored(&self, event: &CourseEvent) -> Result<()> {
        self.cancel_quiet(&TriggerKey::deleted_event_expiry(event.id));
        self.schedule_event_triggers(event)
    }

    // ─── Student lifecycle ──────────────────────────────────────

    /// The student's course set changed. `student` carries the *new* course
    /// set; reminders for events no longer covered by any subscribed course
    /// are dropped, events under newly added courses are scheduled.
    pub fn student_courses_changed(
        &self,
        student: &Student,
        added: &[CourseId],
        removed: &[CourseId],
    ) -> Result<()> {
        let now = Utc::now();

        for &course in removed {
            for event in self.events.upcoming_for_course(course, now)? {
                // Still reachable through another subscription? Keep it.
                if event.courses.iter().any(|c| student.is_subscribed(*c)) {
                    continue;
                }
                self.cancel_group_quiet(&GroupSelector::Exact(TriggerGroup::Reminder {
                    event: event.id,
                    student: student.id,
                }));
            }
        }

        for &course in added {
            for event in self.events.upcoming_for_course(course, now)? {
                self.schedule_student_reminders(&event, student)?;
            }
        }
        Ok(())
    }

    /// The student changed their reminder offsets. Applies the delta to
    /// every upcoming event under their current courses.
    pub fn student_offsets_changed(
        &self,
        student: &Student,
        added: &[i64],
        removed: &[i64],
    ) -> Result<()> {
        for event in self.upcoming_events_for_student(student)? {
            for &offset in removed {
                self.cancel_quiet(&TriggerKey::reminder(event.id, student.id, offset));
            }
            for &offset in added {
                self.schedule_one_reminder(&event, student.id, offset)?;
            }
        }
        Ok(())
    }

    /// The student unsubscribed entirely: strip their reminders across all
    /// events.
    pub fn student_left(&self, student: StudentId) -> usize {
        let removed = self.cancel_group_quiet(&GroupSelector::ForStudent(student));
        tracing::info!(student, removed, "student left, reminders stripped");
        removed
    }

    // ─── Scheduling steps ──────────────────────────────────────

    /// Full trigger set for one active event: per-student reminders plus the
    /// completion transition at event time.
    fn schedule_event_triggers(&self, event: &CourseEvent) -> Result<()> {
        self.cancel_quiet(&TriggerKey::event_completion(event.id));
        self.scheduler
            .add_trigger(Trigger::event_completion(event.id, event.event_time))?;

        for student in self.subscribers_of(event)?.values() {
            self.schedule_student_reminders(event, student)?;
        }
        Ok(())
    }

    /// One student's reminders for one event, one trigger per configured
    /// offset whose fire time is still in the future.
    fn schedule_student_reminders(&self, event: &CourseEvent, student: &Student) -> Result<()> {
        for &offset in &student.offset_hours {
            self.schedule_one_reminder(event, student.id, offset)?;
        }
        Ok(())
    }

    fn schedule_one_reminder(
        &self,
        event: &CourseEvent,
        student: StudentId,
        offset_hours: i64,
    ) -> Result<()> {
        let fire_at = event.event_time - Duration::hours(offset_hours);
        if fire_at <= Utc::now() {
            // Offset already passed — no reminder owed.
            tracing::debug!(
                event = event.id,
                student,
                offset_hours,
                "reminder offset in the past, skipping"
            );
            return Ok(());
        }
        self.cancel_quiet(&TriggerKey::reminder(event.id, student, offset_hours));
        self.scheduler.add_trigger(Trigger::event_reminder(
            event.id,
            student,
            offset_hours,
            fire_at,
            event.event_time,
        ))
    }

    /// Subscribers across all of the event's courses, deduplicated.
    fn subscribers_of(&self, event: &CourseEvent) -> Result<HashMap<StudentId, Student>> {
        let mut subscribers = HashMap::new();
        for &course in &event.courses {
            for student in self.students.subscribed_to(course)? {
                subscribers.insert(student.id, student);
            }
        }
        Ok(subscribers)
    }

    /// Upcoming events under the student's current courses, deduplicated.
    fn upcoming_events_for_student(&self, student: &Student) -> Result<Vec<CourseEvent>> {
        let now = Utc::now();
        let mut events: HashMap<EventId, CourseEvent> = HashMap::new();
        for &course in &student.courses {
            for event in self.events.upcoming_for_course(course, now)? {
                events.insert(event.id, event);
            }
        }
        Ok(events.into_values().collect())
    }

    // ─── Best-effort cancellation ──────────────────────────────────────

    fn cancel_quiet(&self, key: &TriggerKey) {
        if let Err(err) = self.scheduler.cancel_exact(key) {
            tracing::warn!(%key, %err, "⚠️ cleanup cancellation failed");
        }
    }

    fn cancel_group_quiet(&self, selector: &GroupSelector) -> usize {
        match self.scheduler.cancel_group(selector) {
            Ok(removed) => removed,
            Err(err) => {
                tracing::warn!(?selector, %err, "⚠️ cleanup cancellation failed");
                0
            }
        }
    }
}
