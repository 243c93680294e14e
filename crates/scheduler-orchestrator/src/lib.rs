//! # scheduler-orchestrator
//!
//! The top-level `run` entry point, chaining Loader → Validator →
//! Model builder → Solver driver → Writer and emitting a `tracing` event
//! at each phase boundary.

use chrono::NaiveDate;
use thiserror::Error;
use tracing::{info, info_span};

use scheduler_core::{PersistError, ScheduleStore, ScheduledEntry, StoreError};
use scheduler_solver::{build, resolve_resource_names, solve, validate, Calendar, CalendarError, SolverError, ValidationError};

/// Everything that can go wrong across one full scheduling run, composed
/// from every phase's own error type.
#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Calendar(#[from] CalendarError),
    #[error(transparent)]
    Solver(#[from] SolverError),
    #[error(transparent)]
    Persist(#[from] PersistError),
}

/// The outcome of one scheduling run: the schedule rows that were written,
/// and the proven-or-best makespan in working minutes.
#[derive(Clone, Debug)]
pub struct Schedule {
    pub entries: Vec<ScheduledEntry>,
    pub makespan_minutes: i64,
    pub proven_optimal: bool,
}

/// Run one full scheduling pass: load the current inventory, validate it,
/// build and solve the CP model, map the solution to real datetimes, and
/// atomically replace the store's schedule table.
pub fn run(store: &dyn ScheduleStore, start_date: NaiveDate, budget_seconds: u64) -> Result<Schedule, SchedulerError> {
    let input = {
        let _span = info_span!("load").entered();
        let input = store.load()?;
        info!(jobs = input.jobs.len(), tasks = input.tasks.len(), "loaded eligible jobs and tasks");
        input
    };

    let validated = {
        let _span = info_span!("validate").entered();
        let validated = validate(&input)?;
        info!(
            tasks = validated.tasks.len(),
            precedence_edges = validated.precedence_edges.len(),
            "validated model"
        );
        validated
    };

    let anchor = validated.calendar.first_working_day_on_or_after(start_date)?;

    let model = {
        let _span = info_span!("build_model").entered();
        let model = build(&validated, scheduler_solver::DEFAULT_HORIZON_MULTIPLIER);
        info!("model built");
        model
    };

    let outcome = {
        let _span = info_span!("solve", budget_seconds).entered();
        info!("solve starting");
        let outcome = solve(model, budget_seconds)?;
        info!(makespan = outcome.makespan, proven_optimal = outcome.proven_optimal, "solve finished");
        outcome
    };

    let resolved = resolve_resource_names(&validated, &outcome, &input.resources);

    let calendar: Calendar = validated.calendar.clone();
    let entries = {
        let _span = info_span!("write").entered();
        let mut entries = Vec::with_capacity(resolved.len());
        for task in &resolved {
            let start_time = calendar.to_datetime(task.start_minutes, anchor)?;
            let end_time = calendar.to_datetime(task.end_minutes, anchor)?;
            entries.push(ScheduledEntry {
                task_number: task.task_number.clone(),
                start_time,
                end_time,
                resources_used: task.resource_names.join(","),
            });
        }
        store.persist_schedule(&entries)?;
        info!(rows = entries.len(), "schedule table replaced");
        entries
    };

    Ok(Schedule { entries, makespan_minutes: outcome.makespan, proven_optimal: outcome.proven_optimal })
}

#[cfg(test)]
mod tests {
    use super::*;
    use scheduler_core::{CalendarEntry, Job, Resource, ResourceKind, ScheduleInput, Task};
    use scheduler_store::InMemoryStore;

    #[test]
    fn run_produces_and_persists_a_schedule() {
        let input = ScheduleInput {
            resources: vec![Resource { id: 1, name: "R1".into(), kind: ResourceKind::Human }],
            groups: vec![],
            calendar: (1..=5)
                .map(|d| CalendarEntry { weekday: d, open_minute: 8 * 60, close_minute: 17 * 60 })
                .collect(),
            jobs: vec![Job { id: 1, job_number: "J1".into(), quantity: 1, completed: false, blocked: false }],
            tasks: vec![Task {
                id: 1,
                job_number: "J1".into(),
                task_number: "T1".into(),
                setup_time: 0,
                time_each: 120,
                predecessors: vec![],
                resources: vec!["R1".into()],
                completed: false,
            }],
        };
        let store = InMemoryStore::new(input);
        let monday = NaiveDate::from_ymd_opt(2025, 1, 6).unwrap();

        let schedule = run(&store, monday, 10).unwrap();
        assert_eq!(schedule.makespan_minutes, 120);
        assert_eq!(schedule.entries.len(), 1);
        assert_eq!(schedule.entries[0].resources_used, "R1");

        let persisted = store.persisted();
        assert_eq!(persisted.len(), 1);
        assert_eq!(persisted[0].task_number, "T1");
    }
}
