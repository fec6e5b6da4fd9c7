//! Trigger scheduler engine — job registry, add/cancel, and the tick loop.
//!
//! One handler per `JobKind`, registered at most once and shared by every
//! trigger of that kind. The tick claims due triggers from the store (the
//! logical firing) and runs each job body on its own task; a job that has
//! started is never cancelled.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use coursebell_core::error::{CourseBellError, Result};

use crate::store::TriggerStore;
use crate::triggers::{GroupSelector, JobKind, Trigger, TriggerKey};

/// Durable job definition: what runs when any trigger of a kind fires.
#[async_trait]
pub trait JobHandler: Send + Sync {
    async fn run(&self, trigger: &Trigger) -> Result<()>;
}

/// The scheduler — owns the set of live triggers through its store and the
/// registry of job handlers. All operations are safe to call concurrently
/// from multiple in-flight interaction handlers.
pub struct TriggerScheduler {
    store: Arc<dyn TriggerStore>,
    jobs: RwLock<HashMap<JobKind, Arc<dyn JobHandler>>>,
}

impl TriggerScheduler {
    pub fn new(store: Arc<dyn TriggerStore>) -> Self {
        Self {
            store,
            jobs: RwLock::new(HashMap::new()),
        }
    }

    /// Register the job definition for a kind, exactly once. Subsequent
    /// calls are no-ops that keep the first handler. Returns whether this
    /// call did the registration.
    pub fn ensure_job(&self, kind: JobKind, handler: Arc<dyn JobHandler>) -> bool {
        let mut jobs = self.jobs.write().unwrap();
        if jobs.contains_key(&kind) {
            return false;
        }
        jobs.insert(kind, handler);
        tracing::debug!(kind = kind.as_str(), "job registered");
        true
    }

    pub fn has_job(&self, kind: JobKind) -> bool {
        self.jobs.read().unwrap().contains_key(&kind)
    }

    /// Schedule a one-shot trigger. The job for its kind must already be
    /// registered; a key collision in the store is a `Scheduling` error the
    /// caller decides how to handle.
    pub fn add_trigger(&self, trigger: Trigger) -> Result<()> {
        if !self.has_job(trigger.kind) {
            return Err(CourseBellError::Scheduling(format!(
                "no job registered for kind '{}'",
                trigger.kind.as_str()
            )));
        }
        self.store.insert(&trigger)?;
        tracing::info!(
            key = %trigger.key,
            kind = trigger.kind.as_str(),
            fire_at = %trigger.fire_at,
            "📅 Trigger scheduled"
        );
        Ok(())
    }

    /// Cancel one trigger by exact key. Cancelling a trigger that does not
    /// exist (already fired, already cancelled) is a no-op.
    pub fn cancel_exact(&self, key: &TriggerKey) -> Result<bool> {
        let removed = self.store.remove(key)?;
        if removed {
            tracing::info!(%key, "🗑️ Trigger cancelled");
        } else {
            tracing::debug!(%key, "cancel on absent trigger, ignoring");
        }
        Ok(removed)
    }

    /// Cancel every trigger matching the selector; returns the count so
    /// callers can tell "nothing to remove" from "removed N".
    pub fn cancel_group(&self, selector: &GroupSelector) -> Result<usize> {
        let removed = self.store.remove_matching(selector)?;
        if removed > 0 {
            tracing::info!(?selector, removed, "🗑️ Trigger group cancelled");
        }
        Ok(removed)
    }

    pub fn trigger_count(&self) -> Result<usize> {
        self.store.count()
    }

    pub fn store(&self) -> &Arc<dyn TriggerStore> {
        &self.store
    }

    /// Claim and fire everything due at `now`. Each claimed trigger runs its
    /// job body on its own task; job errors are logged with full context and
    /// never propagate. Misfires (triggers overdue after downtime) are
    /// simply due on the first tick and fire once. Returns the claimed
    /// triggers. No relative order is defined for equal fire times.
    pub fn tick(&self, now: DateTime<Utc>) -> Result<Vec<Trigger>> {
        let due = self.store.claim_due(now)?;
        for trigger in &due {
            tracing::info!(key = %trigger.key, kind = trigger.kind.as_str(), "🔔 Trigger fired");
            let handler = self.jobs.read().unwrap().get(&trigger.kind).cloned();
            match handler {
                Some(handler) => {
                    let trigger = trigger.clone();
                    tokio::spawn(async move {
                        if let Err(err) = handler.run(&trigger).await {
                            tracing::error!(
                                key = %trigger.key,
                                kind = trigger.kind.as_str(),
                                payload = %trigger.payload,
                                %err,
                                "trigger job failed"
                            );
                        }
                    });
                }
                None => {
                    // A trigger for an unregistered kind indicates a wiring
                    // bug; the trigger is already consumed, so fail loudly.
                    tracing::error!(
                        key = %trigger.key,
                        kind = trigger.kind.as_str(),
                        "no job registered for fired trigger"
                    );
                }
            }
        }
        Ok(due)
    }
}

/// Spawn the scheduler loop as a background tokio task.
pub async fn spawn_scheduler(scheduler: Arc<TriggerScheduler>, check_interval_secs: u64) {
    tracing::info!("⏰ Trigger loop started (check every {check_interval_secs}s)");

    let mut interval = tokio::time::interval(std::time::Duration::from_secs(check_interval_secs));
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        interval.tick().await;
        match scheduler.tick(Utc::now()) {
            Ok(fired) => {
                if !fired.is_empty() {
                    tracing::debug!(count = fired.len(), "tick fired triggers");
                }
            }
            Err(err) => {
                tracing::warn!(%err, "⚠️ scheduler tick failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryTriggerStore;
    use chrono::Duration;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingJob {
        runs: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl JobHandler for CountingJob {
        async fn run(&self, _trigger: &Trigger) -> Result<()> {
            self.runs.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn scheduler_with_job(kind: JobKind) -> (Arc<TriggerScheduler>, Arc<AtomicUsize>) {
        let scheduler = Arc::new(TriggerScheduler::new(Arc::new(MemoryTriggerStore::new())));
        let runs = Arc::new(AtomicUsize::new(0));
        scheduler.ensure_job(kind, Arc::new(CountingJob { runs: runs.clone() }));
        (scheduler, runs)
    }

    #[test]
    fn test_ensure_job_registers_once() {
        let scheduler = TriggerScheduler::new(Arc::new(MemoryTriggerStore::new()));
        let runs = Arc::new(AtomicUsize::new(0));
        assert!(scheduler.ensure_job(
            JobKind::DraftExpiry,
            Arc::new(CountingJob { runs: runs.clone() })
        ));
        // second registration is a no-op
        assert!(!scheduler.ensure_job(
            JobKind::DraftExpiry,
            Arc::new(CountingJob { runs: runs.clone() })
        ));
        assert!(scheduler.has_job(JobKind::DraftExpiry));
    }

    #[test]
    fn test_add_trigger_requires_registered_job() {
        let scheduler = TriggerScheduler::new(Arc::new(MemoryTriggerStore::new()));
        let err = scheduler
            .add_trigger(Trigger::event_completion(1, Utc::now()))
            .unwrap_err();
        assert!(matches!(err, CourseBellError::Scheduling(_)));
    }

    #[test]
    fn test_add_trigger_surfaces_collision() {
        let (scheduler, _) = scheduler_with_job(JobKind::EventCompletion);
        let fire_at = Utc::now() + Duration::hours(1);
        scheduler
            .add_trigger(Trigger::event_completion(1, fire_at))
            .unwrap();
        let err = scheduler
            .add_trigger(Trigger::event_completion(1, fire_at))
            .unwrap_err();
        assert!(matches!(err, CourseBellError::Scheduling(_)));
        // the first trigger is untouched
        assert_eq!(scheduler.trigger_count().unwrap(), 1);
    }

    #[test]
    fn test_cancel_exact_is_idempotent() {
        let (scheduler, _) = scheduler_with_job(JobKind::DraftExpiry);
        let key = TriggerKey::draft_expiry(42);
        assert!(!scheduler.cancel_exact(&key).unwrap());

        scheduler
            .add_trigger(Trigger::draft_expiry(42, Utc::now() + Duration::hours(24)))
            .unwrap();
        assert!(scheduler.cancel_exact(&key).unwrap());
        assert!(!scheduler.cancel_exact(&key).unwrap());
    }

    #[tokio::test]
    async fn test_tick_fires_due_triggers_once() {
        let (scheduler, runs) = scheduler_with_job(JobKind::EventCompletion);
        let now = Utc::now();
        scheduler
            .add_trigger(Trigger::event_completion(1, now - Duration::minutes(1)))
            .unwrap();
        scheduler
            .add_trigger(Trigger::event_completion(2, now + Duration::hours(1)))
            .unwrap();

        let fired = scheduler.tick(now).unwrap();
        assert_eq!(fired.len(), 1);
        // let the spawned job body run
        tokio::task::yield_now().await;
        assert_eq!(runs.load(Ordering::SeqCst), 1);

        // the claimed trigger is consumed; a second tick fires nothing
        assert!(scheduler.tick(now).unwrap().is_empty());
        assert_eq!(scheduler.trigger_count().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_overdue_trigger_fires_on_recovery_tick() {
        let (scheduler, _) = scheduler_with_job(JobKind::EventReminder);
        let now = Utc::now();
        // scheduled long ago, process was down
        scheduler
            .add_trigger(Trigger::event_reminder(
                7,
                1001,
                24,
                now - Duration::days(3),
                now - Duration::days(2),
            ))
            .unwrap();

        let fired = scheduler.tick(now).unwrap();
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].key, TriggerKey::reminder(7, 1001, 24));
        // once, not repeated
        assert!(scheduler.tick(now).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_job_error_does_not_propagate() {
        struct FailingJob;

        #[async_trait]
        impl JobHandler for FailingJob {
            async fn run(&self, _trigger: &Trigger) -> Result<()> {
                Err(CourseBellError::NotFound("event 1".into()))
            }
        }

        let scheduler = Arc::new(TriggerScheduler::new(Arc::new(MemoryTriggerStore::new())));
        scheduler.ensure_job(JobKind::EventCompletion, Arc::new(FailingJob));
        scheduler
            .add_trigger(Trigger::event_completion(1, Utc::now()))
            .unwrap();

        // tick succeeds even though the job body fails
        let fired = scheduler.tick(Utc::now()).unwrap();
        assert_eq!(fired.len(), 1);
        tokio::task::yield_now().await;
    }
}
