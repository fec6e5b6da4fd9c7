//! Trigger store seam + in-memory implementation.
//!
//! The engine and the lifecycle coordinator only ever talk to `TriggerStore`,
//! so the core logic runs against the map-backed store in tests and against
//! SQLite in production.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use coursebell_core::error::{CourseBellError, Result};

use crate::triggers::{GroupSelector, Trigger, TriggerKey};

/// Durable set of live triggers. Every operation is atomic with respect to
/// the backing store; concurrent add/cancel from multiple handlers is safe.
pub trait TriggerStore: Send + Sync {
    /// Add a trigger. A key collision is an error — the caller decides
    /// whether that aborts its domain operation.
    fn insert(&self, trigger: &Trigger) -> Result<()>;

    /// Remove one trigger by exact key. Absence is not an error; the return
    /// value says whether anything was removed.
    fn remove(&self, key: &TriggerKey) -> Result<bool>;

    /// Remove every trigger whose group matches the selector; returns the
    /// count removed (0 is valid).
    fn remove_matching(&self, selector: &GroupSelector) -> Result<usize>;

    /// Atomically remove and return all triggers due at `now`. The claim is
    /// the logical firing: a claimed trigger is gone from the store before
    /// its job runs, so it can fire at most once per claim. No relative
    /// order is defined between triggers sharing a fire time.
    fn claim_due(&self, now: DateTime<Utc>) -> Result<Vec<Trigger>>;

    /// Snapshot of all live triggers.
    fn all(&self) -> Result<Vec<Trigger>>;

    fn count(&self) -> Result<usize> {
        Ok(self.all()?.len())
    }

    fn get(&self, key: &TriggerKey) -> Result<Option<Trigger>> {
        Ok(self.all()?.into_iter().find(|t| &t.key == key))
    }
}

/// Map-backed store for tests and single-run tools. Not durable.
#[derive(Default)]
pub struct MemoryTriggerStore {
    triggers: Mutex<HashMap<TriggerKey, Trigger>>,
}

impl MemoryTriggerStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TriggerStore for MemoryTriggerStore {
    fn insert(&self, trigger: &Trigger) -> Result<()> {
        let mut triggers = self.triggers.lock().unwrap();
        if triggers.contains_key(&trigger.key) {
            return Err(CourseBellError::Scheduling(format!(
                "trigger already scheduled: {}",
                trigger.key
            )));
        }
        triggers.insert(trigger.key.clone(), trigger.clone());
        Ok(())
    }

    fn remove(&self, key: &TriggerKey) -> Result<bool> {
        Ok(self.triggers.lock().unwrap().remove(key).is_some())
    }

    fn remove_matching(&self, selector: &GroupSelector) -> Result<usize> {
        let mut triggers = self.triggers.lock().unwrap();
        let before = triggers.len();
        triggers.retain(|key, _| !selector.matches(&key.group));
        Ok(before - triggers.len())
    }

    fn claim_due(&self, now: DateTime<Utc>) -> Result<Vec<Trigger>> {
        let mut triggers = self.triggers.lock().unwrap();
        let due_keys: Vec<TriggerKey> = triggers
            .values()
            .filter(|t| t.is_due(now))
            .map(|t| t.key.clone())
            .collect();
        let mut due = Vec::with_capacity(due_keys.len());
        for key in due_keys {
            if let Some(trigger) = triggers.remove(&key) {
                due.push(trigger);
            }
        }
        Ok(due)
    }

    fn all(&self) -> Result<Vec<Trigger>> {
        Ok(self.triggers.lock().unwrap().values().cloned().collect())
    }

    fn count(&self) -> Result<usize> {
        Ok(self.triggers.lock().unwrap().len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::triggers::TriggerGroup;
    use chrono::Duration;

    fn future() -> DateTime<Utc> {
        Utc::now() + Duration::hours(1)
    }

    #[test]
    fn test_insert_rejects_duplicate_key() {
        let store = MemoryTriggerStore::new();
        store
            .insert(&Trigger::event_completion(1, future()))
            .unwrap();
        let err = store
            .insert(&Trigger::event_completion(1, future()))
            .unwrap_err();
        assert!(matches!(err, CourseBellError::Scheduling(_)));
        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn test_remove_is_idempotent() {
        let store = MemoryTriggerStore::new();
        let key = TriggerKey::event_completion(1);
        assert!(!store.remove(&key).unwrap());

        store
            .insert(&Trigger::event_completion(1, future()))
            .unwrap();
        assert!(store.remove(&key).unwrap());
        assert!(!store.remove(&key).unwrap());
    }

    #[test]
    fn test_remove_matching_scopes() {
        let store = MemoryTriggerStore::new();
        let end = future();
        // groups: reminder(5,10), reminder(5,11), reminder(6,10)
        store
            .insert(&Trigger::event_reminder(5, 10, 24, future(), end))
            .unwrap();
        store
            .insert(&Trigger::event_reminder(5, 11, 24, future(), end))
            .unwrap();
        store
            .insert(&Trigger::event_reminder(6, 10, 24, future(), end))
            .unwrap();

        let removed = store
            .remove_matching(&GroupSelector::ForEvent(5))
            .unwrap();
        assert_eq!(removed, 2);
        assert_eq!(store.count().unwrap(), 1);

        let removed = store
            .remove_matching(&GroupSelector::ForStudent(10))
            .unwrap();
        assert_eq!(removed, 1);
        assert_eq!(store.count().unwrap(), 0);

        // nothing left: zero count, not an error
        let removed = store
            .remove_matching(&GroupSelector::Exact(TriggerGroup::Reminder {
                event: 5,
                student: 10,
            }))
            .unwrap();
        assert_eq!(removed, 0);
    }

    #[test]
    fn test_claim_due_removes_and_returns() {
        let store = MemoryTriggerStore::new();
        let now = Utc::now();
        store
            .insert(&Trigger::event_completion(1, now - Duration::minutes(5)))
            .unwrap();
        store
            .insert(&Trigger::event_completion(2, now + Duration::minutes(5)))
            .unwrap();

        let due = store.claim_due(now).unwrap();
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].key, TriggerKey::event_completion(1));
        assert_eq!(store.count().unwrap(), 1);

        // second claim finds nothing — the first claim consumed it
        assert!(store.claim_due(now).unwrap().is_empty());
    }
}
