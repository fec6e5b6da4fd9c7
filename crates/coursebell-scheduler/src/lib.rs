//! # CourseBell Scheduler
//!
//! Durable one-shot trigger store + firing engine.
//!
//! ```text
//! TriggerScheduler (tokio interval)
//!   ├── Trigger {group, name} @ fire_at  → claim_due() on tick
//!   ├── JobKind registry (register-if-absent, one handler per kind)
//!   └── on fire → tokio::spawn(handler.run(trigger))
//!                   ├── EventReminder  → notify student
//!                   ├── EventCompletion → transition event
//!                   ├── DraftExpiry     → delete stale draft
//!                   └── DeletedEventExpiry → purge event
//! ```
//!
//! Triggers are addressable: the structured group key supports cancel by
//! exact key, by event, or by student, so lifecycle reconciliation can strip
//! exactly the set it owns. SQLite persistence survives restarts; anything
//! that came due while the process was down fires once on the next tick.

pub mod engine;
pub mod persistence;
pub mod store;
pub mod triggers;

pub use engine::{JobHandler, TriggerScheduler, spawn_scheduler};
pub use persistence::SqliteTriggerStore;
pub use store::{MemoryTriggerStore, TriggerStore};
pub use triggers::{GroupSelector, JobKind, Trigger, TriggerGroup, TriggerKey};
