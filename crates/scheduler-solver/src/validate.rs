//! Validator
//!
//! Converts a `ScheduleInput` into a `ValidatedModel`: assigns dense task
//! indices, computes durations, resolves resource requirements, drops
//! unresolved predecessor edges (with a warning), and rejects precedence
//! cycles.

use std::collections::HashMap;

use thiserror::Error;
use tracing::warn;

use scheduler_core::{CalendarEntry, ResourceRowId, ScheduleInput, TaskNumber};

use crate::calendar::Calendar;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A task references a resource group with no members.
    #[error("task {task_id} requires empty resource group '{group}'")]
    EmptyGroup { task_id: usize, group: String },

    /// A resource requirement name resolves to neither a `Resource` nor a
    /// `ResourceGroup`.
    #[error("task {task_id} requires unknown resource '{name}'")]
    UnknownResource { task_id: usize, name: String },

    /// A back edge was found while walking the precedence graph: scheduling
    /// `task_id` transitively depends on itself through `predecessor_id`.
    #[error("precedence cycle: task {task_id} <- predecessor {predecessor_id}")]
    Cycle { task_id: usize, predecessor_id: usize },

    /// Two calendar entries claim the same weekday.
    #[error("duplicate calendar entry for weekday {weekday}")]
    DuplicateWeekday { weekday: u8 },

    /// A name appears in both the `Resource` and `ResourceGroup` namespaces.
    #[error("name '{name}' is used by both a resource and a resource group")]
    DuplicateResourceName { name: String },
}

/// A task's resolved resource requirement: either a single fixed resource,
/// or a pool of candidates from which the solver selects exactly one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Requirement {
    Fixed(ResourceRowId),
    Group(Vec<ResourceRowId>),
}

/// A validated, index-addressed task ready for model building.
#[derive(Clone, Debug)]
pub struct ValidatedTask {
    pub index: usize,
    pub task_number: TaskNumber,
    pub job_number: String,
    pub duration_minutes: i64,
    pub requirements: Vec<Requirement>,
}

/// A same-job precedence edge: `predecessor` must finish before `task`
/// starts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PrecedenceEdge {
    pub predecessor: usize,
    pub task: usize,
}

/// The fully validated model handed to the model builder.
#[derive(Clone, Debug)]
pub struct ValidatedModel {
    pub tasks: Vec<ValidatedTask>,
    pub precedence_edges: Vec<PrecedenceEdge>,
    pub calendar: Calendar,
}

/// Validate a loaded `ScheduleInput`, producing a `ValidatedModel` or the
/// first fatal error encountered.
pub fn validate(input: &ScheduleInput) -> Result<ValidatedModel, ValidationError> {
    check_calendar_duplicates(&input.calendar)?;
    let calendar = Calendar::from_entries(&input.calendar);

    check_resource_namespace(&input.resources, &input.groups)?;

    // Step 1: dense index per eligible task, keyed by (job_number, task_number).
    let index_of: HashMap<(&str, &str), usize> = input
        .tasks
        .iter()
        .enumerate()
        .map(|(i, t)| ((t.job_number.as_str(), t.task_number.as_str()), i))
        .collect();

    let quantity_of: HashMap<&str, i64> = input
        .jobs
        .iter()
        .map(|j| (j.job_number.as_str(), j.quantity))
        .collect();

    let resource_by_name: HashMap<&str, ResourceRowId> = input
        .resources
        .iter()
        .map(|r| (r.name.as_str(), r.id))
        .collect();
    let group_by_name: HashMap<&str, &[ResourceRowId]> = input
        .groups
        .iter()
        .map(|g| (g.name.as_str(), g.members.as_slice()))
        .collect();

    // Step 2/3: durations and resolved requirements.
    let mut tasks = Vec::with_capacity(input.tasks.len());
    for (i, task) in input.tasks.iter().enumerate() {
        let quantity = quantity_of.get(task.job_number.as_str()).copied().unwrap_or(1);
        let duration_minutes = task.duration_minutes(quantity);

        let mut requirements = Vec::with_capacity(task.resources.len());
        for name in &task.resources {
            if let Some(&id) = resource_by_name.get(name.as_str()) {
                requirements.push(Requirement::Fixed(id));
            } else if let Some(&members) = group_by_name.get(name.as_str()) {
                if members.is_empty() {
                    return Err(ValidationError::EmptyGroup { task_id: i, group: name.clone() });
                }
                requirements.push(Requirement::Group(members.to_vec()));
            } else {
                return Err(ValidationError::UnknownResource { task_id: i, name: name.clone() });
            }
        }

        tasks.push(ValidatedTask {
            index: i,
            task_number: task.task_number.clone(),
            job_number: task.job_number.clone(),
            duration_minutes,
            requirements,
        });
    }

    // Step 4: same-job precedence edges; unresolved predecessors are
    // dropped with a warning (the only locally-recovered error).
    let mut precedence_edges = Vec::new();
    for (i, task) in input.tasks.iter().enumerate() {
        for pred_number in &task.predecessors {
            match index_of.get(&(task.job_number.as_str(), pred_number.as_str())) {
                Some(&pred_index) => precedence_edges.push(PrecedenceEdge { predecessor: pred_index, task: i }),
                None => warn!(
                    job_number = %task.job_number,
                    task_number = %task.task_number,
                    predecessor = %pred_number,
                    "unresolved predecessor dropped"
                ),
            }
        }
    }

    // Step 5: DFS-based cycle detection over the resolved edges.
    detect_cycle(tasks.len(), &precedence_edges)?;

    Ok(ValidatedModel { tasks, precedence_edges, calendar })
}

/// The `Resource` and `ResourceGroup` namespaces must be disjoint: a name
/// collision would make resolution order-dependent on which map is checked
/// first.
fn check_resource_namespace(
    resources: &[scheduler_core::Resource],
    groups: &[scheduler_core::ResourceGroup],
) -> Result<(), ValidationError> {
    let resource_names: std::collections::HashSet<&str> = resources.iter().map(|r| r.name.as_str()).collect();
    for group in groups {
        if resource_names.contains(group.name.as_str()) {
            return Err(ValidationError::DuplicateResourceName { name: group.name.clone() });
        }
    }
    Ok(())
}

fn check_calendar_duplicates(entries: &[CalendarEntry]) -> Result<(), ValidationError> {
    let mut seen = [false; 8];
    for entry in entries {
        let idx = entry.weekday as usize;
        if idx == 0 || idx > 7 {
            continue;
        }
        if seen[idx] {
            return Err(ValidationError::DuplicateWeekday { weekday: entry.weekday });
        }
        seen[idx] = true;
    }
    Ok(())
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    White,
    Gray,
    Black,
}

/// Standard white/gray/black DFS cycle detection. Returns the specific back
/// edge `(task_id, predecessor_id)` on the first cycle found, so the caller
/// can report it via `ValidationError::Cycle`.
fn detect_cycle(task_count: usize, edges: &[PrecedenceEdge]) -> Result<(), ValidationError> {
    let mut successors: Vec<Vec<usize>> = vec![Vec::new(); task_count];
    for edge in edges {
        successors[edge.predecessor].push(edge.task);
    }

    let mut mark = vec![Mark::White; task_count];

    for start in 0..task_count {
        if mark[start] == Mark::White {
            dfs(start, &successors, &mut mark)?;
        }
    }
    Ok(())
}

fn dfs(node: usize, successors: &[Vec<usize>], mark: &mut [Mark]) -> Result<(), ValidationError> {
    mark[node] = Mark::Gray;
    for &next in &successors[node] {
        match mark[next] {
            Mark::White => dfs(next, successors, mark)?,
            Mark::Gray => {
                return Err(ValidationError::Cycle { task_id: next, predecessor_id: node });
            }
            Mark::Black => {}
        }
    }
    mark[node] = Mark::Black;
    Ok(())
}
