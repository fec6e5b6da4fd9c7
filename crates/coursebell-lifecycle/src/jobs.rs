//! Job bodies for fired triggers.
//!
//! A fired trigger runs to completion on its own task. A job that finds its
//! target entity missing or in a state the trigger should never have
//! survived (reminder for a deleted event, purge for a restored one) fails
//! loudly — that is a reconciliation bug, not a condition to paper over.
//! Outbound notification failures are the one exception: they are caught and
//! logged here, because a missed DM must never poison the scheduler.

use std::sync::Arc;

use async_trait::async_trait;
use coursebell_core::error::{CourseBellError, Result};
use coursebell_core::traits::{DraftRepository, EventRepository, Notifier, StudentRepository};
use coursebell_core::types::{CourseEvent, EventStatus};
use coursebell_scheduler::{JobHandler, JobKind, Trigger, TriggerGroup, TriggerScheduler};

/// Register all four job definitions on the scheduler. Idempotent, like the
/// underlying `ensure_job`.
pub fn register_jobs(
    scheduler: &TriggerScheduler,
    events: Arc<dyn EventRepository>,
    students: Arc<dyn StudentRepository>,
    drafts: Arc<dyn DraftRepository>,
    notifier: Arc<dyn Notifier>,
) {
    scheduler.ensure_job(
        JobKind::EventReminder,
        Arc::new(EventReminderJob {
            events: events.clone(),
            students,
            notifier,
        }),
    );
    scheduler.ensure_job(
        JobKind::EventCompletion,
        Arc::new(EventCompletionJob {
            events: events.clone(),
        }),
    );
    scheduler.ensure_job(JobKind::DraftExpiry, Arc::new(DraftExpiryJob { drafts }));
    scheduler.ensure_job(
        JobKind::DeletedEventExpiry,
        Arc::new(DeletedEventExpiryJob { events }),
    );
}

/// The message a student receives. Phrasing follows the remaining time, not
/// the configured offset, so late-fired catch-up reminders stay honest.
pub fn render_reminder(event: &CourseEvent, hours_left: i64) -> String {
    let when = if hours_left <= 1 {
        "in less than an hour".to_string()
    } else if hours_left < 48 {
        format!("in {hours_left} hours")
    } else {
        format!("in {} days", hours_left / 24)
    };
    format!(
        "🔔 Reminder: {} \"{}\" is {} ({}).",
        event.kind.label(),
        event.title,
        when,
        event.event_time.format("%Y-%m-%d %H:%M UTC")
    )
}

/// Delivers one reminder to one student.
pub struct EventReminderJob {
    pub events: Arc<dyn EventRepository>,
    pub students: Arc<dyn StudentRepository>,
    pub notifier: Arc<dyn Notifier>,
}

#[async_trait]
impl JobHandler for EventReminderJob {
    async fn run(&self, trigger: &Trigger) -> Result<()> {
        let TriggerGroup::Reminder { event, student } = trigger.key.group else {
            return Err(CourseBellError::InvalidState(format!(
                "reminder trigger with non-reminder group: {}",
                trigger.key
            )));
        };

        let event = self.events.get(event)?;
        if !event.notifies() {
            return Err(CourseBellError::InvalidState(format!(
                "reminder fired for event {} which no longer notifies",
                event.id
            )));
        }
        let student = self.students.get(student)?;

        let hours_left = (event.event_time - chrono::Utc::now()).num_hours().max(0);
        let message = render_reminder(&event, hours_left);

        if let Err(err) = self.notifier.notify(student.id, &message).await {
            // at-least-once, not exactly-once: a lost reminder is logged,
            // never fatal
            tracing::error!(
                event = event.id,
                student = student.id,
                channel = self.notifier.name(),
                %err,
                "⚠️ reminder delivery failed"
            );
            return Ok(());
        }
        tracing::info!(event = event.id, student = student.id, "📣 Reminder sent");
        Ok(())
    }
}

/// Transitions an event to Completed at its scheduled time.
pub struct EventCompletionJob {
    pub events: Arc<dyn EventRepository>,
}

#[async_trait]
impl JobHandler for EventCompletionJob {
    async fn run(&self, trigger: &Trigger) -> Result<()> {
        let TriggerGroup::Event(event_id) = trigger.key.group else {
            return Err(CourseBellError::InvalidState(format!(
                "completion trigger with non-event group: {}",
                trigger.key
            )));
        };

        let event = self.events.get(event_id)?;
        if event.deleted {
            // deletion cancels the completion trigger; firing anyway means
            // reconciliation drifted
            return Err(CourseBellError::InvalidState(format!(
                "completion fired for deleted event {event_id}"
            )));
        }
        self.events.transition(event_id, EventStatus::Completed)?;
        tracing::info!(event = event_id, "✅ Event completed");
        Ok(())
    }
}

/// Removes a draft nobody confirmed within the cleanup window.
pub struct DraftExpiryJob {
    pub drafts: Arc<dyn DraftRepository>,
}

#[async_trait]
impl JobHandler for DraftExpiryJob {
    async fn run(&self, trigger: &Trigger) -> Result<()> {
        let TriggerGroup::Draft(draft_id) = trigger.key.group else {
            return Err(CourseBellError::InvalidState(format!(
                "draft expiry trigger with non-draft group: {}",
                trigger.key
            )));
        };

        if !self.drafts.delete(draft_id)? {
            return Err(CourseBellError::NotFound(format!(
                "expired draft {draft_id} was already gone"
            )));
        }
        tracing::info!(draft = draft_id, "🗑️ Stale draft expired");
        Ok(())
    }
}

/// Permanently purges a soft-deleted event once its undo window closes.
pub struct DeletedEventExpiryJob {
    pub events: Arc<dyn EventRepository>,
}

#[async_trait]
impl JobHandler for DeletedEventExpiryJob {
    async fn run(&self, trigger: &Trigger) -> Result<()> {
        let TriggerGroup::Event(event_id) = trigger.key.group else {
            return Err(CourseBellError::InvalidState(format!(
                "cleanup trigger with non-event group: {}",
                trigger.key
            )));
        };

        let event = self.events.get(event_id)?;
        if !event.deleted {
            // undo should have cancelled this trigger
            return Err(CourseBellError::InvalidState(format!(
                "cleanup fired for event {event_id} which is not deleted"
            )));
        }
        self.events.purge(event_id)?;
        tracing::info!(event = event_id, "🗑️ Deleted event purged");
        Ok(())
    }
}
