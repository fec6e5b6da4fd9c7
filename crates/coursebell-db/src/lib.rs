//! # CourseBell DB
//!
//! SQLite-backed domain repositories: courses, students (subscriptions and
//! reminder offsets), events, and drafts. One database file, hand-written
//! migrations, RFC3339 timestamp columns.

use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, SecondsFormat, Utc};
use coursebell_core::error::{CourseBellError, Result};
use coursebell_core::traits::{CourseRepository, DraftRepository, EventRepository, StudentRepository};
use coursebell_core::types::{
    Course, CourseEvent, CourseId, DraftId, EventDraft, EventId, EventKind, EventStatus, Student,
    StudentId, UserId,
};
use rusqlite::params;

/// All domain repositories over one SQLite connection.
pub struct CourseBellDb {
    conn: Mutex<rusqlite::Connection>,
}

fn ts(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_ts(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| CourseBellError::Storage(format!("Bad timestamp '{raw}': {e}")))
}

fn kind_str(kind: EventKind) -> &'static str {
    match kind {
        EventKind::Assignment => "assignment",
        EventKind::Exam => "exam",
        EventKind::Lecture => "lecture",
        EventKind::Other => "other",
    }
}

fn parse_kind(raw: &str) -> EventKind {
    match raw {
        "assignment" => EventKind::Assignment,
        "exam" => EventKind::Exam,
        "lecture" => EventKind::Lecture,
        _ => EventKind::Other,
    }
}

fn status_str(status: EventStatus) -> &'static str {
    match status {
        EventStatus::Active => "active",
        EventStatus::Completed => "completed",
    }
}

fn parse_status(raw: &str) -> EventStatus {
    match raw {
        "completed" => EventStatus::Completed,
        _ => EventStatus::Active,
    }
}

impl CourseBellDb {
    /// Open or create the domain database.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).ok();
        }
        let conn = rusqlite::Connection::open(path)
            .map_err(|e| CourseBellError::Storage(format!("DB open: {e}")))?;
        let db = Self {
            conn: Mutex::new(conn),
        };
        db.migrate()?;
        Ok(db)
    }

    /// In-memory database, used by tests.
    pub fn open_in_memory() -> Result<Self> {
        let conn = rusqlite::Connection::open_in_memory()
            .map_err(|e| CourseBellError::Storage(format!("DB open: {e}")))?;
        let db = Self {
            conn: Mutex::new(conn),
        };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<()> {
        self.conn
            .lock()
            .unwrap()
            .execute_batch(
                "
            CREATE TABLE IF NOT EXISTS courses (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                code TEXT NOT NULL UNIQUE,
                name TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS students (
                id INTEGER PRIMARY KEY            -- chat-platform user id
            );

            CREATE TABLE IF NOT EXISTS student_courses (
                student_id INTEGER NOT NULL,
                course_id INTEGER NOT NULL,
                PRIMARY KEY (student_id, course_id)
            );

            CREATE TABLE IF NOT EXISTS student_offsets (
                student_id INTEGER NOT NULL,
                offset_hours INTEGER NOT NULL,
                PRIMARY KEY (student_id, offset_hours)
            );

            CREATE TABLE IF NOT EXISTS events (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                kind TEXT NOT NULL DEFAULT 'other',
                event_time TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'active',
                deleted INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS event_courses (
                event_id INTEGER NOT NULL,
                course_id INTEGER NOT NULL,
                PRIMARY KEY (event_id, course_id)
            );

            CREATE TABLE IF NOT EXISTS drafts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                author_id INTEGER NOT NULL,
                title TEXT NOT NULL,
                kind TEXT NOT NULL DEFAULT 'other',
                courses TEXT NOT NULL DEFAULT '[]',   -- JSON array of course ids
                event_time TEXT NOT NULL,
                created_at TEXT NOT NULL
            );
         ",
            )
            .map_err(|e| CourseBellError::Storage(format!("Migration: {e}")))?;
        Ok(())
    }

    // ─── Creation helpers ──────────────────────────────────────

    /// Insert a course; returns it with its assigned id.
    pub fn add_course(&self, code: &str, name: &str) -> Result<Course> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO courses (code, name) VALUES (?1, ?2)",
            params![code, name],
        )
        .map_err(|e| CourseBellError::Storage(format!("Add course: {e}")))?;
        Ok(Course {
            id: conn.last_insert_rowid(),
            code: code.to_string(),
            name: name.to_string(),
        })
    }

    /// Insert a draft; returns its assigned id.
    pub fn create_draft(
        &self,
        author_id: UserId,
        title: &str,
        kind: EventKind,
        courses: &[CourseId],
        event_time: DateTime<Utc>,
    ) -> Result<EventDraft> {
        let created_at = Utc::now();
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO drafts (author_id, title, kind, courses, event_time, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                author_id,
                title,
                kind_str(kind),
                serde_json::to_string(courses).unwrap_or_else(|_| "[]".into()),
                ts(event_time),
                ts(created_at),
            ],
        )
        .map_err(|e| CourseBellError::Storage(format!("Create draft: {e}")))?;
        Ok(EventDraft {
            id: conn.last_insert_rowid(),
            author_id,
            title: title.to_string(),
            kind,
            courses: courses.to_vec(),
            event_time,
            created_at,
        })
    }

    /// Publish an event (usually from a confirmed draft); returns it with
    /// its assigned id.
    pub fn create_event(
        &self,
        title: &str,
        kind: EventKind,
        courses: &[CourseId],
        event_time: DateTime<Utc>,
    ) -> Result<CourseEvent> {
        let created_at = Utc::now();
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO events (title, kind, event_time, status, deleted, created_at)
             VALUES (?1, ?2, ?3, 'active', 0, ?4)",
            params![title, kind_str(kind), ts(event_time), ts(created_at)],
        )
        .map_err(|e| CourseBellError::Storage(format!("Create event: {e}")))?;
        let id = conn.last_insert_rowid();
        for course in courses {
            conn.execute(
                "INSERT OR IGNORE INTO event_courses (event_id, course_id) VALUES (?1, ?2)",
                params![id, course],
            )
            .map_err(|e| CourseBellError::Storage(format!("Link event course: {e}")))?;
        }
        Ok(CourseEvent {
            id,
            title: title.to_string(),
            kind,
            courses: courses.to_vec(),
            event_time,
            status: EventStatus::Active,
            deleted: false,
            created_at,
        })
    }

    fn event_courses(conn: &rusqlite::Connection, event: EventId) -> Result<Vec<CourseId>> {
        let mut stmt = conn
            .prepare("SELECT course_id FROM event_courses WHERE event_id = ?1 ORDER BY course_id")
            .map_err(|e| CourseBellError::Storage(format!("Event courses: {e}")))?;
        let rows = stmt
            .query_map([event], |row| row.get::<_, i64>(0))
            .map_err(|e| CourseBellError::Storage(format!("Event courses: {e}")))?;
        rows.collect::<rusqlite::Result<Vec<i64>>>()
            .map_err(|e| CourseBellError::Storage(format!("Event courses: {e}")))
    }

    fn load_event(conn: &rusqlite::Connection, id: EventId) -> Result<Option<CourseEvent>> {
        let row = conn
            .query_row(
                "SELECT title, kind, event_time, status, deleted, created_at
                 FROM events WHERE id = ?1",
                [id],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, i64>(4)?,
                        row.get::<_, String>(5)?,
                    ))
                },
            )
            .map(Some)
            .or_else(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => Ok(None),
                other => Err(CourseBellError::Storage(format!("Load event: {other}"))),
            })?;

        let Some((title, kind, event_time, status, deleted, created_at)) = row else {
            return Ok(None);
        };
        Ok(Some(CourseEvent {
            id,
            title,
            kind: parse_kind(&kind),
            courses: Self::event_courses(conn, id)?,
            event_time: parse_ts(&event_time)?,
            status: parse_status(&status),
            deleted: deleted != 0,
            created_at: parse_ts(&created_at)?,
        }))
    }

    fn load_student(conn: &rusqlite::Connection, id: StudentId) -> Result<Option<Student>> {
        let exists: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM students WHERE id = ?1",
                [id],
                |row| row.get(0),
            )
            .map_err(|e| CourseBellError::Storage(format!("Load student: {e}")))?;
        if exists == 0 {
            return Ok(None);
        }

        let mut stmt = conn
            .prepare("SELECT course_id FROM student_courses WHERE student_id = ?1 ORDER BY course_id")
            .map_err(|e| CourseBellError::Storage(format!("Student courses: {e}")))?;
        let courses = stmt
            .query_map([id], |row| row.get::<_, i64>(0))
            .map_err(|e| CourseBellError::Storage(format!("Student courses: {e}")))?
            .collect::<rusqlite::Result<Vec<i64>>>()
            .map_err(|e| CourseBellError::Storage(format!("Student courses: {e}")))?;

        let mut stmt = conn
            .prepare(
                "SELECT offset_hours FROM student_offsets WHERE student_id = ?1 ORDER BY offset_hours",
            )
            .map_err(|e| CourseBellError::Storage(format!("Student offsets: {e}")))?;
        let offsets = stmt
            .query_map([id], |row| row.get::<_, i64>(0))
            .map_err(|e| CourseBellError::Storage(format!("Student offsets: {e}")))?
            .collect::<rusqlite::Result<Vec<i64>>>()
            .map_err(|e| CourseBellError::Storage(format!("Student offsets: {e}")))?;

        Ok(Some(Student {
            id,
            courses,
            offset_hours: offsets,
        }))
    }
}

impl EventRepository for CourseBellDb {
    fn exists(&self, id: EventId) -> Result<bool> {
        let count: i64 = self
            .conn
            .lock()
            .unwrap()
            .query_row("SELECT COUNT(*) FROM events WHERE id = ?1", [id], |row| {
                row.get(0)
            })
            .map_err(|e| CourseBellError::Storage(format!("Event exists: {e}")))?;
        Ok(count > 0)
    }

    fn get(&self, id: EventId) -> Result<CourseEvent> {
        let conn = self.conn.lock().unwrap();
        Self::load_event(&conn, id)?
            .ok_or_else(|| CourseBellError::NotFound(format!("event {id}")))
    }

    fn save(&self, event: &CourseEvent) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT OR REPLACE INTO events (id, title, kind, event_time, status, deleted, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                event.id,
                event.title,
                kind_str(event.kind),
                ts(event.event_time),
                status_str(event.status),
                event.deleted as i64,
                ts(event.created_at),
            ],
        )
        .map_err(|e| CourseBellError::Storage(format!("Save event: {e}")))?;

        conn.execute("DELETE FROM event_courses WHERE event_id = ?1", [event.id])
            .map_err(|e| CourseBellError::Storage(format!("Save event courses: {e}")))?;
        for course in &event.courses {
            conn.execute(
                "INSERT INTO event_courses (event_id, course_id) VALUES (?1, ?2)",
                params![event.id, course],
            )
            .map_err(|e| CourseBellError::Storage(format!("Save event courses: {e}")))?;
        }
        Ok(())
    }

    fn upcoming_for_course(
        &self,
        course: CourseId,
        after: DateTime<Utc>,
    ) -> Result<Vec<CourseEvent>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn
            .prepare(
                "SELECT e.id FROM events e
                 JOIN event_courses ec ON ec.event_id = e.id
                 WHERE ec.course_id = ?1 AND e.deleted = 0 AND e.event_time > ?2
                 ORDER BY e.event_time",
            )
            .map_err(|e| CourseBellError::Storage(format!("Upcoming events: {e}")))?;
        let ids = stmt
            .query_map(params![course, ts(after)], |row| row.get::<_, i64>(0))
            .map_err(|e| CourseBellError::Storage(format!("Upcoming events: {e}")))?
            .collect::<rusqlite::Result<Vec<i64>>>()
            .map_err(|e| CourseBellError::Storage(format!("Upcoming events: {e}")))?;

        let mut events = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(event) = Self::load_event(&conn, id)? {
                events.push(event);
            }
        }
        Ok(events)
    }

    fn transition(&self, id: EventId, status: EventStatus) -> Result<()> {
        let updated = self
            .conn
            .lock()
            .unwrap()
            .execute(
                "UPDATE events SET status = ?1 WHERE id = ?2",
                params![status_str(status), id],
            )
            .map_err(|e| CourseBellError::Storage(format!("Transition event: {e}")))?;
        if updated == 0 {
            return Err(CourseBellError::NotFound(format!("event {id}")));
        }
        Ok(())
    }

    fn purge(&self, id: EventId) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let removed = conn
            .execute("DELETE FROM events WHERE id = ?1", [id])
            .map_err(|e| CourseBellError::Storage(format!("Purge event: {e}")))?;
        if removed == 0 {
            return Err(CourseBellError::NotFound(format!("event {id}")));
        }
        conn.execute("DELETE FROM event_courses WHERE event_id = ?1", [id])
            .map_err(|e| CourseBellError::Storage(format!("Purge event courses: {e}")))?;
        Ok(())
    }
}

impl StudentRepository for CourseBellDb {
    fn exists(&self, id: StudentId) -> Result<bool> {
        let count: i64 = self
            .conn
            .lock()
            .unwrap()
            .query_row("SELECT COUNT(*) FROM students WHERE id = ?1", [id], |row| {
                row.get(0)
            })
            .map_err(|e| CourseBellError::Storage(format!("Student exists: {e}")))?;
        Ok(count > 0)
    }

    fn get(&self, id: StudentId) -> Result<Student> {
        let conn = self.conn.lock().unwrap();
        Self::load_student(&conn, id)?
            .ok_or_else(|| CourseBellError::NotFound(format!("student {id}")))
    }

    fn save(&self, student: &Student) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT OR REPLACE INTO students (id) VALUES (?1)",
            [student.id],
        )
        .map_err(|e| CourseBellError::Storage(format!("Save student: {e}")))?;

        conn.execute(
            "DELETE FROM student_courses WHERE student_id = ?1",
            [student.id],
        )
        .map_err(|e| CourseBellError::Storage(format!("Save subscriptions: {e}")))?;
        for course in &student.courses {
            conn.execute(
                "INSERT INTO student_courses (student_id, course_id) VALUES (?1, ?2)",
                params![student.id, course],
            )
            .map_err(|e| CourseBellError::Storage(format!("Save subscriptions: {e}")))?;
        }

        conn.execute(
            "DELETE FROM student_offsets WHERE student_id = ?1",
            [student.id],
        )
        .map_err(|e| CourseBellError::Storage(format!("Save offsets: {e}")))?;
        for offset in &student.offset_hours {
            conn.execute(
                "INSERT INTO student_offsets (student_id, offset_hours) VALUES (?1, ?2)",
                params![student.id, offset],
            )
            .map_err(|e| CourseBellError::Storage(format!("Save offsets: {e}")))?;
        }
        Ok(())
    }

    fn subscribed_to(&self, course: CourseId) -> Result<Vec<Student>> {
        let ids = {
            let conn = self.conn.lock().unwrap();
            let mut stmt = conn
                .prepare("SELECT student_id FROM student_courses WHERE course_id = ?1")
                .map_err(|e| CourseBellError::Storage(format!("Subscribers: {e}")))?;
            stmt.query_map([course], |row| row.get::<_, i64>(0))
                .map_err(|e| CourseBellError::Storage(format!("Subscribers: {e}")))?
                .collect::<rusqlite::Result<Vec<i64>>>()
                .map_err(|e| CourseBellError::Storage(format!("Subscribers: {e}")))?
        };

        let conn = self.conn.lock().unwrap();
        let mut students = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(student) = Self::load_student(&conn, id)? {
                students.push(student);
            }
        }
        Ok(students)
    }
}

impl DraftRepository for CourseBellDb {
    fn get(&self, id: DraftId) -> Result<EventDraft> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT author_id, title, kind, courses, event_time, created_at
             FROM drafts WHERE id = ?1",
            [id],
            |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, String>(5)?,
                ))
            },
        )
        .or_else(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => {
                Err(CourseBellError::NotFound(format!("draft {id}")))
            }
            other => Err(CourseBellError::Storage(format!("Load draft: {other}"))),
        })
        .and_then(|(author_id, title, kind, courses, event_time, created_at)| {
            Ok(EventDraft {
                id,
                author_id,
                title,
                kind: parse_kind(&kind),
                courses: serde_json::from_str(&courses).unwrap_or_default(),
                event_time: parse_ts(&event_time)?,
                created_at: parse_ts(&created_at)?,
            })
        })
    }

    fn save(&self, draft: &EventDraft) -> Result<()> {
        self.conn
            .lock()
            .unwrap()
            .execute(
                "INSERT OR REPLACE INTO drafts (id, author_id, title, kind, courses, event_time, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    draft.id,
                    draft.author_id,
                    draft.title,
                    kind_str(draft.kind),
                    serde_json::to_string(&draft.courses).unwrap_or_else(|_| "[]".into()),
                    ts(draft.event_time),
                    ts(draft.created_at),
                ],
            )
            .map_err(|e| CourseBellError::Storage(format!("Save draft: {e}")))?;
        Ok(())
    }

    fn delete(&self, id: DraftId) -> Result<bool> {
        let removed = self
            .conn
            .lock()
            .unwrap()
            .execute("DELETE FROM drafts WHERE id = ?1", [id])
            .map_err(|e| CourseBellError::Storage(format!("Delete draft: {e}")))?;
        Ok(removed > 0)
    }
}

impl CourseRepository for CourseBellDb {
    fn get(&self, id: CourseId) -> Result<Course> {
        self.conn
            .lock()
            .unwrap()
            .query_row(
                "SELECT code, name FROM courses WHERE id = ?1",
                [id],
                |row| {
                    Ok(Course {
                        id,
                        code: row.get(0)?,
                        name: row.get(1)?,
                    })
                },
            )
            .or_else(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => {
                    Err(CourseBellError::NotFound(format!("course {id}")))
                }
                other => Err(CourseBellError::Storage(format!("Load course: {other}"))),
            })
    }

    fn all(&self) -> Result<Vec<Course>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn
            .prepare("SELECT id, code, name FROM courses ORDER BY code")
            .map_err(|e| CourseBellError::Storage(format!("List courses: {e}")))?;
        stmt.query_map([], |row| {
            Ok(Course {
                id: row.get(0)?,
                code: row.get(1)?,
                name: row.get(2)?,
            })
        })
        .map_err(|e| CourseBellError::Storage(format!("List courses: {e}")))?
        .collect::<rusqlite::Result<Vec<Course>>>()
        .map_err(|e| CourseBellError::Storage(format!("List courses: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_open_and_migrate() {
        let db = CourseBellDb::open_in_memory().unwrap();
        assert!(CourseRepository::all(&db).unwrap().is_empty());
    }

    #[test]
    fn test_course_round_trip() {
        let db = CourseBellDb::open_in_memory().unwrap();
        let course = db.add_course("CS101", "Intro to Computer Science").unwrap();
        let loaded = CourseRepository::get(&db, course.id).unwrap();
        assert_eq!(loaded.code, "CS101");
    }

    #[test]
    fn test_student_save_and_reload() {
        let db = CourseBellDb::open_in_memory().unwrap();
        let student = Student {
            id: 1001,
            courses: vec![1, 2],
            offset_hours: vec![24, 48],
        };
        StudentRepository::save(&db, &student).unwrap();

        let loaded = StudentRepository::get(&db, 1001).unwrap();
        assert_eq!(loaded.courses, vec![1, 2]);
        assert_eq!(loaded.offset_hours, vec![24, 48]);

        // replacing the course set drops the old junction rows
        let updated = Student {
            id: 1001,
            courses: vec![2],
            offset_hours: vec![24],
        };
        StudentRepository::save(&db, &updated).unwrap();
        let loaded = StudentRepository::get(&db, 1001).unwrap();
        assert_eq!(loaded.courses, vec![2]);
        assert_eq!(loaded.offset_hours, vec![24]);
    }

    #[test]
    fn test_subscribed_to() {
        let db = CourseBellDb::open_in_memory().unwrap();
        StudentRepository::save(
            &db,
            &Student {
                id: 1,
                courses: vec![10],
                offset_hours: vec![24],
            },
        )
        .unwrap();
        StudentRepository::save(
            &db,
            &Student {
                id: 2,
                courses: vec![11],
                offset_hours: vec![],
            },
        )
        .unwrap();

        let subscribers = db.subscribed_to(10).unwrap();
        assert_eq!(subscribers.len(), 1);
        assert_eq!(subscribers[0].id, 1);
    }

    #[test]
    fn test_event_lifecycle() {
        let db = CourseBellDb::open_in_memory().unwrap();
        let event = db
            .create_event(
                "Midterm",
                EventKind::Exam,
                &[10],
                Utc::now() + Duration::days(7),
            )
            .unwrap();

        assert!(EventRepository::exists(&db, event.id).unwrap());
        let upcoming = db.upcoming_for_course(10, Utc::now()).unwrap();
        assert_eq!(upcoming.len(), 1);
        assert_eq!(upcoming[0].title, "Midterm");

        // soft-deleted events leave the upcoming list
        let mut deleted = event.clone();
        deleted.deleted = true;
        EventRepository::save(&db, &deleted).unwrap();
        assert!(db.upcoming_for_course(10, Utc::now()).unwrap().is_empty());
        // but the courses survive the save round trip
        assert_eq!(EventRepository::get(&db, event.id).unwrap().courses, vec![10]);

        db.transition(event.id, EventStatus::Completed).unwrap();
        assert_eq!(
            EventRepository::get(&db, event.id).unwrap().status,
            EventStatus::Completed
        );

        db.purge(event.id).unwrap();
        assert!(!EventRepository::exists(&db, event.id).unwrap());
        assert!(matches!(
            EventRepository::get(&db, event.id).unwrap_err(),
            CourseBellError::NotFound(_)
        ));
    }

    #[test]
    fn test_draft_round_trip_and_delete() {
        let db = CourseBellDb::open_in_memory().unwrap();
        let draft = db
            .create_draft(
                7,
                "Pop quiz",
                EventKind::Assignment,
                &[10, 11],
                Utc::now() + Duration::days(2),
            )
            .unwrap();

        let loaded = DraftRepository::get(&db, draft.id).unwrap();
        assert_eq!(loaded.title, "Pop quiz");
        assert_eq!(loaded.courses, vec![10, 11]);

        assert!(db.delete(draft.id).unwrap());
        assert!(!db.delete(draft.id).unwrap());
    }
}
