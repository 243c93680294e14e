//! SQLite-backed `ScheduleStore`.
//!
//! WAL mode for throughput, `CREATE TABLE IF NOT EXISTS` run once at
//! `open`, and a single transaction per write.

use std::path::Path;

use rusqlite::{params, Connection};
use tracing::debug;

use scheduler_core::{
    parse_list, CalendarEntry, Job, PersistError, Resource, ResourceGroup, ResourceKind,
    ScheduleInput, ScheduleStore, ScheduledEntry, StoreError, Task,
};

use crate::schema::CREATE_SCHEMA;
use crate::time::minutes_to_hms;

/// SQLite-backed implementation of the Loader/Writer contract.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open (or create) the database at `path` and ensure the schema exists.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let conn = Connection::open(path).map_err(|e| StoreError::Read(e.to_string()))?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;\n             PRAGMA synchronous = NORMAL;\n             PRAGMA foreign_keys = ON;",
        )
        .map_err(|e| StoreError::Read(e.to_string()))?;
        conn.execute_batch(CREATE_SCHEMA).map_err(|e| StoreError::Read(e.to_string()))?;
        debug!("schema ensured");
        Ok(Self { conn })
    }

    fn load_resources(&self) -> Result<Vec<Resource>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, kind FROM resource")
            .map_err(|e| StoreError::Read(e.to_string()))?;
        let rows = stmt
            .query_map([], |row| {
                let kind_code: String = row.get(2)?;
                Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?, kind_code))
            })
            .map_err(|e| StoreError::Read(e.to_string()))?;

        let mut resources = Vec::new();
        for row in rows {
            let (id, name, kind_code) = row.map_err(|e| StoreError::Read(e.to_string()))?;
            let kind = ResourceKind::from_code(&kind_code)
                .ok_or_else(|| StoreError::Read(format!("resource {id} has unknown kind '{kind_code}'")))?;
            resources.push(Resource { id, name, kind });
        }
        Ok(resources)
    }

    fn load_groups(&self) -> Result<Vec<ResourceGroup>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name FROM resource_group")
            .map_err(|e| StoreError::Read(e.to_string()))?;
        let groups = stmt
            .query_map([], |row| Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?)))
            .map_err(|e| StoreError::Read(e.to_string()))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| StoreError::Read(e.to_string()))?;

        let mut member_stmt = self
            .conn
            .prepare("SELECT resource_id FROM resource_group_association WHERE group_id = ?1")
            .map_err(|e| StoreError::Read(e.to_string()))?;

        let mut out = Vec::with_capacity(groups.len());
        for (id, name) in groups {
            let members = member_stmt
                .query_map(params![id], |row| row.get::<_, i64>(0))
                .map_err(|e| StoreError::Read(e.to_string()))?
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| StoreError::Read(e.to_string()))?;
            out.push(ResourceGroup { id, name, members });
        }
        Ok(out)
    }

    fn load_calendar(&self) -> Result<Vec<CalendarEntry>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT weekday, start_time, end_time FROM calendar")
            .map_err(|e| StoreError::Read(e.to_string()))?;
        let rows = stmt
            .query_map([], |row| {
                Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?, row.get::<_, String>(2)?))
            })
            .map_err(|e| StoreError::Read(e.to_string()))?;

        let mut entries = Vec::new();
        for row in rows {
            let (weekday, start, end) = row.map_err(|e| StoreError::Read(e.to_string()))?;
            entries.push(CalendarEntry {
                weekday: weekday as u8,
                open_minute: minutes_to_hms(&start).map_err(StoreError::Read)?,
                close_minute: minutes_to_hms(&end).map_err(StoreError::Read)?,
            });
        }
        Ok(entries)
    }

    fn load_eligible_jobs(&self) -> Result<Vec<Job>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, job_number, quantity, completed, blocked FROM job WHERE completed = 0 AND blocked = 0")
            .map_err(|e| StoreError::Read(e.to_string()))?;
        let rows = stmt
            .query_map([], |row| {
                Ok(Job {
                    id: row.get(0)?,
                    job_number: row.get(1)?,
                    quantity: row.get(2)?,
                    completed: row.get::<_, i64>(3)? != 0,
                    blocked: row.get::<_, i64>(4)? != 0,
                })
            })
            .map_err(|e| StoreError::Read(e.to_string()))?;
        rows.collect::<Result<_, _>>().map_err(|e| StoreError::Read(e.to_string()))
    }

    fn load_eligible_tasks(&self, jobs: &[Job]) -> Result<Vec<Task>, StoreError> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT id, job_number, task_number, setup_time, time_each, predecessors, resources, completed \
                 FROM task WHERE completed = 0",
            )
            .map_err(|e| StoreError::Read(e.to_string()))?;
        let eligible_job_numbers: std::collections::HashSet<&str> =
            jobs.iter().map(|j| j.job_number.as_str()).collect();

        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, i64>(3)?,
                    row.get::<_, i64>(4)?,
                    row.get::<_, String>(5)?,
                    row.get::<_, String>(6)?,
                ))
            })
            .map_err(|e| StoreError::Read(e.to_string()))?;

        let mut tasks = Vec::new();
        for row in rows {
            let (id, job_number, task_number, setup_time, time_each, predecessors, resources) =
                row.map_err(|e| StoreError::Read(e.to_string()))?;
            if !eligible_job_numbers.contains(job_number.as_str()) {
                continue;
            }
            tasks.push(Task {
                id,
                job_number,
                task_number,
                setup_time,
                time_each,
                predecessors: parse_list(&predecessors),
                resources: parse_list(&resources),
                completed: false,
            });
        }
        Ok(tasks)
    }
}

impl ScheduleStore for SqliteStore {
    fn load(&self) -> Result<ScheduleInput, StoreError> {
        let resources = self.load_resources()?;
        let groups = self.load_groups()?;
        let calendar = self.load_calendar()?;
        let jobs = self.load_eligible_jobs()?;
        let tasks = self.load_eligible_tasks(&jobs)?;

        Ok(ScheduleInput { resources, groups, calendar, jobs, tasks })
    }

    fn persist_schedule(&self, entries: &[ScheduledEntry]) -> Result<(), PersistError> {
        let tx = self
            .conn
            .unchecked_transaction()
            .map_err(|e| PersistError::Write(e.to_string()))?;

        tx.execute("DELETE FROM schedule", [])
            .map_err(|e| PersistError::Write(e.to_string()))?;

        {
            let mut stmt = tx
                .prepare(
                    "INSERT INTO schedule (task_number, start_time, end_time, resources_used) \
                     VALUES (?1, ?2, ?3, ?4)",
                )
                .map_err(|e| PersistError::Write(e.to_string()))?;

            for entry in entries {
                stmt.execute(params![
                    entry.task_number,
                    entry.start_time.format("%Y-%m-%d %H:%M:%S").to_string(),
                    entry.end_time.format("%Y-%m-%d %H:%M:%S").to_string(),
                    entry.resources_used,
                ])
                .map_err(|e| PersistError::Write(e.to_string()))?;
            }
        }

        tx.commit().map_err(|e| PersistError::Write(e.to_string()))?;
        debug!(rows = entries.len(), "schedule table replaced");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn seed(conn: &Connection) {
        conn.execute_batch(
            r#"
            INSERT INTO resource (id, name, kind) VALUES (1, 'R1', 'H');
            INSERT INTO calendar (weekday, start_time, end_time) VALUES
                (1, '08:00:00', '17:00:00'),
                (2, '08:00:00', '17:00:00'),
                (3, '08:00:00', '17:00:00'),
                (4, '08:00:00', '17:00:00'),
                (5, '08:00:00', '17:00:00');
            INSERT INTO job (id, job_number, quantity, completed, blocked) VALUES
                (1, 'J1', 1, 0, 0),
                (2, 'J2', 1, 1, 0);
            INSERT INTO task (id, job_number, task_number, setup_time, time_each, predecessors, resources, completed)
            VALUES
                (1, 'J1', 'T1', 0, 120, '', 'R1', 0),
                (2, 'J2', 'T1', 0, 60, '', 'R1', 0);
            "#,
        )
        .unwrap();
    }

    #[test]
    fn load_filters_out_jobs_from_blocked_or_completed_parents() {
        let store = SqliteStore::open(":memory:").unwrap();
        seed(&store.conn);

        let input = store.load().unwrap();
        assert_eq!(input.jobs.len(), 1);
        assert_eq!(input.jobs[0].job_number, "J1");
        assert_eq!(input.tasks.len(), 1);
        assert_eq!(input.tasks[0].job_number, "J1");
    }

    #[test]
    fn persist_schedule_replaces_prior_contents() {
        let store = SqliteStore::open(":memory:").unwrap();
        seed(&store.conn);

        let day = NaiveDate::from_ymd_opt(2025, 1, 6).unwrap();
        let entries = vec![ScheduledEntry {
            task_number: "T1".into(),
            start_time: day.and_hms_opt(8, 0, 0).unwrap(),
            end_time: day.and_hms_opt(10, 0, 0).unwrap(),
            resources_used: "R1".into(),
        }];
        store.persist_schedule(&entries).unwrap();

        let count: i64 = store.conn.query_row("SELECT COUNT(*) FROM schedule", [], |r| r.get(0)).unwrap();
        assert_eq!(count, 1);

        store.persist_schedule(&[]).unwrap();
        let count: i64 = store.conn.query_row("SELECT COUNT(*) FROM schedule", [], |r| r.get(0)).unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn persisted_schedule_survives_reopening_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("schedule.sqlite3");

        let day = NaiveDate::from_ymd_opt(2025, 1, 6).unwrap();
        let entries = vec![ScheduledEntry {
            task_number: "T1".into(),
            start_time: day.and_hms_opt(8, 0, 0).unwrap(),
            end_time: day.and_hms_opt(10, 0, 0).unwrap(),
            resources_used: "R1".into(),
        }];

        {
            let store = SqliteStore::open(&path).unwrap();
            seed(&store.conn);
            store.persist_schedule(&entries).unwrap();
        }

        let reopened = SqliteStore::open(&path).unwrap();
        let count: i64 = reopened.conn.query_row("SELECT COUNT(*) FROM schedule", [], |r| r.get(0)).unwrap();
        assert_eq!(count, 1);
    }
}
