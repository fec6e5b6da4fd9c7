//! SQLite-backed trigger store — survives restarts, supports concurrent
//! access from in-flight interaction handlers.
//!
//! The structured group key is persisted as discrete indexed columns
//! (`event_id`, `student_id`, `draft_id`), so cancel-by-event and
//! cancel-by-student are indexed lookups instead of string matching.

use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, SecondsFormat, Utc};
use coursebell_core::error::{CourseBellError, Result};
use rusqlite::params;

use crate::store::TriggerStore;
use crate::triggers::{GroupSelector, JobKind, Trigger, TriggerGroup, TriggerKey};

/// Durable trigger store on SQLite.
pub struct SqliteTriggerStore {
    conn: Mutex<rusqlite::Connection>,
}

/// Uniform-width RFC3339 so string comparison in SQL equals chronological
/// comparison.
fn ts(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_ts(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| CourseBellError::Storage(format!("Bad timestamp '{raw}': {e}")))
}

impl SqliteTriggerStore {
    /// Open or create the trigger database.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).ok();
        }
        let conn = rusqlite::Connection::open(path)
            .map_err(|e| CourseBellError::Storage(format!("DB open: {e}")))?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.migrate()?;
        Ok(store)
    }

    /// In-memory SQLite database, used by tests.
    pub fn open_in_memory() -> Result<Self> {
        let conn = rusqlite::Connection::open_in_memory()
            .map_err(|e| CourseBellError::Storage(format!("DB open: {e}")))?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.migrate()?;
        Ok(store)
    }

    fn migrate(&self) -> Result<()> {
        self.conn
            .lock()
            .unwrap()
            .execute_batch(
                "
            CREATE TABLE IF NOT EXISTS triggers (
                key TEXT PRIMARY KEY,            -- display form, e.g. 'reminder:7:1001:24'
                group_kind TEXT NOT NULL,        -- 'draft', 'event', 'reminder'
                draft_id INTEGER,
                event_id INTEGER,
                student_id INTEGER,
                name TEXT NOT NULL,
                job_kind TEXT NOT NULL,
                fire_at TEXT NOT NULL,
                end_at TEXT,
                payload TEXT NOT NULL DEFAULT '{}',
                created_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_triggers_event ON triggers(event_id);
            CREATE INDEX IF NOT EXISTS idx_triggers_student ON triggers(student_id);
            CREATE INDEX IF NOT EXISTS idx_triggers_fire_at ON triggers(fire_at);
         ",
            )
            .map_err(|e| CourseBellError::Storage(format!("Migration: {e}")))?;
        Ok(())
    }

    fn row_to_trigger(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawRow> {
        Ok(RawRow {
            group_kind: row.get("group_kind")?,
            draft_id: row.get("draft_id")?,
            event_id: row.get("event_id")?,
            student_id: row.get("student_id")?,
            name: row.get("name")?,
            job_kind: row.get("job_kind")?,
            fire_at: row.get("fire_at")?,
            end_at: row.get("end_at")?,
            payload: row.get("payload")?,
            created_at: row.get("created_at")?,
        })
    }
}

/// Intermediate row shape; converted to `Trigger` outside the rusqlite
/// callback so conversion errors surface as `Storage` errors.
struct RawRow {
    group_kind: String,
    draft_id: Option<i64>,
    event_id: Option<i64>,
    student_id: Option<i64>,
    name: String,
    job_kind: String,
    fire_at: String,
    end_at: Option<String>,
    payload: String,
    created_at: String,
}

impl RawRow {
    fn into_trigger(self) -> Result<Trigger> {
        let group = match self.group_kind.as_str() {
            "draft" => TriggerGroup::Draft(self.draft_id.ok_or_else(|| {
                CourseBellError::Storage("draft trigger without draft_id".into())
            })?),
            "event" => TriggerGroup::Event(self.event_id.ok_or_else(|| {
                CourseBellError::Storage("event trigger without event_id".into())
            })?),
            "reminder" => TriggerGroup::Reminder {
                event: self.event_id.ok_or_else(|| {
                    CourseBellError::Storage("reminder trigger without event_id".into())
                })?,
                student: self.student_id.ok_or_else(|| {
                    CourseBellError::Storage("reminder trigger without student_id".into())
                })?,
            },
            other => {
                return Err(CourseBellError::Storage(format!(
                    "unknown group kind '{other}'"
                )));
            }
        };
        let kind = JobKind::parse(&self.job_kind)
            .ok_or_else(|| CourseBellError::Storage(format!("unknown job kind '{}'", self.job_kind)))?;
        let end_at = match self.end_at {
            Some(raw) => Some(parse_ts(&raw)?),
            None => None,
        };
        Ok(Trigger {
            key: TriggerKey {
                group,
                name: self.name,
            },
            kind,
            fire_at: parse_ts(&self.fire_at)?,
            end_at,
            payload: serde_json::from_str(&self.payload).unwrap_or_default(),
            created_at: parse_ts(&self.created_at)?,
        })
    }
}

fn group_columns(group: &TriggerGroup) -> (&'static str, Option<i64>, Option<i64>, Option<i64>) {
    match group {
        TriggerGroup::Draft(draft) => ("draft", Some(*draft), None, None),
        TriggerGroup::Event(event) => ("event", None, Some(*event), None),
        TriggerGroup::Reminder { event, student } => {
            ("reminder", None, Some(*event), Some(*student))
        }
    }
}

impl TriggerStore for SqliteTriggerStore {
    fn insert(&self, trigger: &Trigger) -> Result<()> {
        let (group_kind, draft_id, event_id, student_id) = group_columns(&trigger.key.group);
        let result = self.conn.lock().unwrap().execute(
            "INSERT INTO triggers
             (key, group_kind, draft_id, event_id, student_id, name, job_kind,
              fire_at, end_at, payload, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                trigger.key.to_string(),
                group_kind,
                draft_id,
                event_id,
                student_id,
                trigger.key.name,
                trigger.kind.as_str(),
                ts(trigger.fire_at),
                trigger.end_at.map(ts),
                trigger.payload.to_string(),
                ts(trigger.created_at),
            ],
        );
        match result {
            Ok(_) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Err(CourseBellError::Scheduling(format!(
                    "trigger already scheduled: {}",
                    trigger.key
                )))
            }
            Err(e) => Err(CourseBellError::Storage(format!("Insert trigger: {e}"))),
        }
    }

    fn remove(&self, key: &TriggerKey) -> Result<bool> {
        let removed = self
            .conn
            .lock()
            .unwrap()
            .execute("DELETE FROM triggers WHERE key = ?1", [key.to_string()])
            .map_err(|e| CourseBellError::Storage(format!("Delete trigger: {e}")))?;
        Ok(removed > 0)
    }

    fn remove_matching(&self, selector: &GroupSelector) -> Result<usize> {
        let conn = self.conn.lock().unwrap();
        let removed = match selector {
            GroupSelector::ForEvent(event) => conn
                .execute("DELETE FROM triggers WHERE event_id = ?1", [event])
                .map_err(|e| CourseBellError::Storage(format!("Delete by event: {e}")))?,
            GroupSelector::ForStudent(student) => conn
                .execute("DELETE FROM triggers WHERE student_id = ?1", [student])
                .map_err(|e| CourseBellError::Storage(format!("Delete by student: {e}")))?,
            GroupSelector::Exact(group) => {
                let (group_kind, draft_id, event_id, student_id) = group_columns(group);
                conn.execute(
                    "DELETE FROM triggers WHERE group_kind = ?1
                     AND draft_id IS ?2 AND event_id IS ?3 AND student_id IS ?4",
                    params![group_kind, draft_id, event_id, student_id],
                )
                .map_err(|e| CourseBellError::Storage(format!("Delete by group: {e}")))?
            }
        };
        Ok(removed)
    }

    fn claim_due(&self, now: DateTime<Utc>) -> Result<Vec<Trigger>> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn
            .transaction()
            .map_err(|e| CourseBellError::Storage(format!("Claim tx: {e}")))?;
        let cutoff = ts(now);

        let raw_rows = {
            let mut stmt = tx
                .prepare(
                    "SELECT group_kind, draft_id, event_id, student_id, name, job_kind,
                            fire_at, end_at, payload, created_at
                     FROM triggers WHERE fire_at <= ?1",
                )
                .map_err(|e| CourseBellError::Storage(format!("Claim select: {e}")))?;
            let rows = stmt
                .query_map([&cutoff], Self::row_to_trigger)
                .map_err(|e| CourseBellError::Storage(format!("Claim query: {e}")))?;
            rows.collect::<rusqlite::Result<Vec<RawRow>>>()
                .map_err(|e| CourseBellError::Storage(format!("Claim rows: {e}")))?
        };

        tx.execute("DELETE FROM triggers WHERE fire_at <= ?1", [&cutoff])
            .map_err(|e| CourseBellError::Storage(format!("Claim delete: {e}")))?;
        tx.commit()
            .map_err(|e| CourseBellError::Storage(format!("Claim commit: {e}")))?;

        raw_rows.into_iter().map(RawRow::into_trigger).collect()
    }

    fn all(&self) -> Result<Vec<Trigger>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn
            .prepare(
                "SELECT group_kind, draft_id, event_id, student_id, name, job_kind,
                        fire_at, end_at, payload, created_at
                 FROM triggers ORDER BY fire_at",
            )
            .map_err(|e| CourseBellError::Storage(format!("Select triggers: {e}")))?;
        let rows = stmt
            .query_map([], Self::row_to_trigger)
            .map_err(|e| CourseBellError::Storage(format!("Query triggers: {e}")))?
            .collect::<rusqlite::Result<Vec<RawRow>>>()
            .map_err(|e| CourseBellError::Storage(format!("Read triggers: {e}")))?;
        rows.into_iter().map(RawRow::into_trigger).collect()
    }

    fn count(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .lock()
            .unwrap()
            .query_row("SELECT COUNT(*) FROM triggers", [], |row| row.get(0))
            .map_err(|e| CourseBellError::Storage(format!("Count triggers: {e}")))?;
        Ok(count as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn future() -> DateTime<Utc> {
        Utc::now() + Duration::hours(1)
    }

    #[test]
    fn test_open_and_migrate() {
        let store = SqliteTriggerStore::open_in_memory().unwrap();
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn test_insert_load_round_trip() {
        let store = SqliteTriggerStore::open_in_memory().unwrap();
        let end = future() + Duration::hours(2);
        let trigger = Trigger::event_reminder(7, 1001, 24, future(), end);
        store.insert(&trigger).unwrap();

        let all = store.all().unwrap();
        assert_eq!(all.len(), 1);
        let loaded = &all[0];
        assert_eq!(loaded.key, trigger.key);
        assert_eq!(loaded.kind, JobKind::EventReminder);
        assert_eq!(loaded.payload["student_id"], 1001);
        // micros precision survives the round trip
        assert_eq!(ts(loaded.end_at.unwrap()), ts(end));
        assert_eq!(ts(loaded.fire_at), ts(trigger.fire_at));
    }

    #[test]
    fn test_duplicate_key_is_scheduling_failure() {
        let store = SqliteTriggerStore::open_in_memory().unwrap();
        store
            .insert(&Trigger::draft_expiry(42, future()))
            .unwrap();
        let err = store
            .insert(&Trigger::draft_expiry(42, future()))
            .unwrap_err();
        assert!(matches!(err, CourseBellError::Scheduling(_)));
    }

    #[test]
    fn test_remove_matching_by_event_and_student() {
        let store = SqliteTriggerStore::open_in_memory().unwrap();
        let end = future();
        store
            .insert(&Trigger::event_reminder(5, 10, 24, future(), end))
            .unwrap();
        store
            .insert(&Trigger::event_reminder(5, 11, 24, future(), end))
            .unwrap();
        store
            .insert(&Trigger::event_reminder(6, 10, 24, future(), end))
            .unwrap();
        // event-keyed trigger also belongs to event 5
        store
            .insert(&Trigger::event_completion(5, future()))
            .unwrap();

        assert_eq!(
            store.remove_matching(&GroupSelector::ForEvent(5)).unwrap(),
            3
        );
        assert_eq!(
            store
                .remove_matching(&GroupSelector::ForStudent(10))
                .unwrap(),
            1
        );
        assert_eq!(store.count().unwrap(), 0);
        // empty store: zero count, no error
        assert_eq!(
            store.remove_matching(&GroupSelector::ForEvent(5)).unwrap(),
            0
        );
    }

    #[test]
    fn test_remove_matching_exact_group_spares_other_names() {
        let store = SqliteTriggerStore::open_in_memory().unwrap();
        let end = future();
        store
            .insert(&Trigger::event_reminder(5, 10, 24, future(), end))
            .unwrap();
        store
            .insert(&Trigger::event_reminder(5, 10, 48, future(), end))
            .unwrap();
        store
            .insert(&Trigger::event_reminder(5, 11, 24, future(), end))
            .unwrap();

        let removed = store
            .remove_matching(&GroupSelector::Exact(TriggerGroup::Reminder {
                event: 5,
                student: 10,
            }))
            .unwrap();
        assert_eq!(removed, 2);
        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn test_claim_due_consumes_overdue_rows() {
        let store = SqliteTriggerStore::open_in_memory().unwrap();
        let now = Utc::now();
        store
            .insert(&Trigger::event_completion(1, now - Duration::days(2)))
            .unwrap();
        store
            .insert(&Trigger::event_completion(2, now - Duration::seconds(1)))
            .unwrap();
        store
            .insert(&Trigger::event_completion(3, now + Duration::hours(1)))
            .unwrap();

        // both overdue triggers fire on the same claim, exactly once
        let due = store.claim_due(now).unwrap();
        assert_eq!(due.len(), 2);
        assert!(store.claim_due(now).unwrap().is_empty());
        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn test_durability_across_reopen() {
        let dir = std::env::temp_dir().join("coursebell-trigger-store-test");
        std::fs::create_dir_all(&dir).ok();
        let path = dir.join("triggers.db");
        std::fs::remove_file(&path).ok();

        {
            let store = SqliteTriggerStore::open(&path).unwrap();
            store
                .insert(&Trigger::draft_expiry(42, future()))
                .unwrap();
        }

        let store = SqliteTriggerStore::open(&path).unwrap();
        let all = store.all().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].key, TriggerKey::draft_expiry(42));

        std::fs::remove_dir_all(&dir).ok();
    }
}
