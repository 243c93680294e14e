//! # scheduler-solver
//!
//! The scheduling engine's hard subsystem:
//!
//! - [`calendar`]: elapsed-working-minutes ↔ real-datetime bijection
//! - [`validate`]: predecessor-graph cycle detection and resource resolution
//! - [`model`]: CP-SAT decision variables and constraints
//! - [`solve`]: the wall-clock-budgeted solver invocation
//!
//! ## Example
//!
//! ```no_run
//! use scheduler_core::ScheduleInput;
//! use scheduler_solver::{build, resolve_resource_names, solve, validate, DEFAULT_HORIZON_MULTIPLIER};
//!
//! # fn example(input: &ScheduleInput) -> anyhow::Result<()> {
//! let validated = validate(input)?;
//! let model = build(&validated, DEFAULT_HORIZON_MULTIPLIER);
//! let outcome = solve(model, 60)?;
//! let resolved = resolve_resource_names(&validated, &outcome, &input.resources);
//! # Ok(())
//! # }
//! ```

pub mod calendar;
pub mod model;
pub mod solve;
pub mod validate;

pub use calendar::{Calendar, CalendarError};
pub use model::{build, Model, DEFAULT_HORIZON_MULTIPLIER};
pub use solve::{solve, SolveOutcome, SolverError, TaskSolution, DEFAULT_BUDGET_SECONDS};
pub use validate::{validate, PrecedenceEdge, Requirement, ValidatedModel, ValidatedTask, ValidationError};

use std::collections::HashMap;

use scheduler_core::Resource;

/// A task's solved window together with the resource *names* actually
/// charged, in original requirement order — the last step before the
/// writer maps minutes to real datetimes and joins the names with `,`.
#[derive(Clone, Debug)]
pub struct ResolvedTask {
    pub job_number: String,
    pub task_number: String,
    pub start_minutes: i64,
    pub end_minutes: i64,
    pub resource_names: Vec<String>,
}

/// Resolve the solver's per-task resource-id selections into resource
/// names, in the order the task originally listed its requirements.
pub fn resolve_resource_names(
    validated: &ValidatedModel,
    outcome: &SolveOutcome,
    resources: &[Resource],
) -> Vec<ResolvedTask> {
    let name_of: HashMap<_, _> = resources.iter().map(|r| (r.id, r.name.as_str())).collect();

    validated
        .tasks
        .iter()
        .zip(&outcome.tasks)
        .map(|(task, solution)| {
            let resource_names = solution
                .resource_selections
                .iter()
                .filter_map(|(_, id)| name_of.get(id).map(|s| s.to_string()))
                .collect();

            ResolvedTask {
                job_number: task.job_number.clone(),
                task_number: task.task_number.clone(),
                start_minutes: solution.start,
                end_minutes: solution.end,
                resource_names,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use scheduler_core::{CalendarEntry, Job, ResourceGroup, ResourceKind, ScheduleInput, Task};

    fn calendar_mon_fri() -> Vec<CalendarEntry> {
        (1..=5).map(|d| CalendarEntry { weekday: d, open_minute: 8 * 60, close_minute: 17 * 60 }).collect()
    }

    #[test]
    fn end_to_end_fixed_resource_precedence() {
        // Scenario S1: single job, two tasks, fixed resource.
        let input = ScheduleInput {
            resources: vec![Resource { id: 1, name: "R1".into(), kind: ResourceKind::Human }],
            groups: vec![],
            calendar: calendar_mon_fri(),
            jobs: vec![Job { id: 1, job_number: "J1".into(), quantity: 1, completed: false, blocked: false }],
            tasks: vec![
                Task {
                    id: 1,
                    job_number: "J1".into(),
                    task_number: "T1".into(),
                    setup_time: 0,
                    time_each: 120,
                    predecessors: vec![],
                    resources: vec!["R1".into()],
                    completed: false,
                },
                Task {
                    id: 2,
                    job_number: "J1".into(),
                    task_number: "T2".into(),
                    setup_time: 0,
                    time_each: 60,
                    predecessors: vec!["T1".into()],
                    resources: vec!["R1".into()],
                    completed: false,
                },
            ],
        };

        let validated = validate(&input).unwrap();
        let model = build(&validated, DEFAULT_HORIZON_MULTIPLIER);
        let outcome = solve(model, 10).unwrap();

        assert_eq!(outcome.tasks[0].start, 0);
        assert_eq!(outcome.tasks[0].end, 120);
        assert_eq!(outcome.tasks[1].start, 120);
        assert_eq!(outcome.tasks[1].end, 180);
        assert_eq!(outcome.makespan, 180);

        let resolved = resolve_resource_names(&validated, &outcome, &input.resources);
        assert_eq!(resolved[0].resource_names, vec!["R1".to_string()]);
        assert_eq!(resolved[1].resource_names, vec!["R1".to_string()]);
    }

    #[test]
    fn group_selection_picks_exactly_one_member() {
        // Scenario S3: single task, group GX = {R1, R2}.
        let input = ScheduleInput {
            resources: vec![
                Resource { id: 1, name: "R1".into(), kind: ResourceKind::Human },
                Resource { id: 2, name: "R2".into(), kind: ResourceKind::Human },
            ],
            groups: vec![ResourceGroup { id: 1, name: "GX".into(), members: vec![1, 2] }],
            calendar: calendar_mon_fri(),
            jobs: vec![Job { id: 1, job_number: "J1".into(), quantity: 1, completed: false, blocked: false }],
            tasks: vec![Task {
                id: 1,
                job_number: "J1".into(),
                task_number: "T1".into(),
                setup_time: 0,
                time_each: 60,
                predecessors: vec![],
                resources: vec!["GX".into()],
                completed: false,
            }],
        };

        let validated = validate(&input).unwrap();
        let model = build(&validated, DEFAULT_HORIZON_MULTIPLIER);
        let outcome = solve(model, 10).unwrap();
        let resolved = resolve_resource_names(&validated, &outcome, &input.resources);

        assert_eq!(resolved[0].resource_names.len(), 1);
        assert!(["R1", "R2"].contains(&resolved[0].resource_names[0].as_str()));
    }

    #[test]
    fn resource_contention_serializes_two_jobs() {
        // Scenario S2: two independent jobs competing for one resource.
        let input = ScheduleInput {
            resources: vec![Resource { id: 1, name: "R1".into(), kind: ResourceKind::Machine }],
            groups: vec![],
            calendar: calendar_mon_fri(),
            jobs: vec![
                Job { id: 1, job_number: "J1".into(), quantity: 1, completed: false, blocked: false },
                Job { id: 2, job_number: "J2".into(), quantity: 1, completed: false, blocked: false },
            ],
            tasks: vec![
                Task {
                    id: 1,
                    job_number: "J1".into(),
                    task_number: "T1".into(),
                    setup_time: 0,
                    time_each: 120,
                    predecessors: vec![],
                    resources: vec!["R1".into()],
                    completed: false,
                },
                Task {
                    id: 2,
                    job_number: "J2".into(),
                    task_number: "T1".into(),
                    setup_time: 0,
                    time_each: 120,
                    predecessors: vec![],
                    resources: vec!["R1".into()],
                    completed: false,
                },
            ],
        };

        let validated = validate(&input).unwrap();
        let model = build(&validated, DEFAULT_HORIZON_MULTIPLIER);
        let outcome = solve(model, 10).unwrap();

        assert_eq!(outcome.makespan, 240);
        let (a_start, a_end) = (outcome.tasks[0].start, outcome.tasks[0].end);
        let (b_start, b_end) = (outcome.tasks[1].start, outcome.tasks[1].end);
        assert!(a_end <= b_start || b_end <= a_start, "R1 intervals must not overlap");
    }
}
