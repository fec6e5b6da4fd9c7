//! # CourseBell Lifecycle
//!
//! The domain side of scheduling: on every event/draft state transition the
//! `LifecycleCoordinator` recomputes which triggers should exist and
//! reconciles the trigger store through `TriggerScheduler` calls. The job
//! bodies that run when those triggers fire live in `jobs`.
//!
//! The coordinator holds no timers of its own — the scheduler exclusively
//! owns the live trigger set, so "what should exist" and "what the timer
//! store holds" cannot drift apart.

pub mod coordinator;
pub mod jobs;

pub use coordinator::LifecycleCoordinator;
pub use jobs::{
    DeletedEventExpiryJob, DraftExpiryJob, EventCompletionJob, EventReminderJob, register_jobs,
};
