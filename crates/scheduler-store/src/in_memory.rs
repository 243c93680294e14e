//! In-memory `ScheduleStore` test double: fast, non-persistent, for tests
//! and prototyping.

use std::sync::Mutex;

use scheduler_core::{PersistError, ScheduleInput, ScheduleStore, ScheduledEntry, StoreError};

/// Holds a fixed `ScheduleInput` and records whatever is persisted to it,
/// for tests that exercise the orchestrator without a real database.
pub struct InMemoryStore {
    input: ScheduleInput,
    persisted: Mutex<Vec<ScheduledEntry>>,
}

impl InMemoryStore {
    pub fn new(input: ScheduleInput) -> Self {
        Self { input, persisted: Mutex::new(Vec::new()) }
    }

    /// Snapshot of whatever the last `persist_schedule` call wrote.
    pub fn persisted(&self) -> Vec<ScheduledEntry> {
        self.persisted.lock().expect("persisted mutex poisoned").clone()
    }
}

impl ScheduleStore for InMemoryStore {
    fn load(&self) -> Result<ScheduleInput, StoreError> {
        Ok(self.input.clone())
    }

    fn persist_schedule(&self, entries: &[ScheduledEntry]) -> Result<(), PersistError> {
        let mut persisted = self.persisted.lock().map_err(|e| PersistError::Write(e.to_string()))?;
        *persisted = entries.to_vec();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn persist_replaces_prior_contents() {
        let store = InMemoryStore::new(ScheduleInput::default());
        assert!(store.persisted().is_empty());

        let day = chrono::NaiveDate::from_ymd_opt(2025, 1, 6).unwrap();
        let entries = vec![ScheduledEntry {
            task_number: "T1".into(),
            start_time: day.and_hms_opt(8, 0, 0).unwrap(),
            end_time: day.and_hms_opt(10, 0, 0).unwrap(),
            resources_used: "R1".into(),
        }];
        store.persist_schedule(&entries).unwrap();
        assert_eq!(store.persisted().len(), 1);

        store.persist_schedule(&[]).unwrap();
        assert!(store.persisted().is_empty());
    }
}
