//! # scheduler-core
//!
//! Domain model, stable error taxonomy, and the store trait boundary for the
//! manufacturing job scheduling engine.
//!
//! This crate provides:
//! - Domain types: `Job`, `Task`, `Resource`, `ResourceGroup`, `CalendarEntry`,
//!   `ScheduleInput`, `ScheduledEntry`
//! - The `ScheduleStore` trait separating the engine from its persistence
//!   layer (SQL schema, transport) per the read/write contract
//! - The stable error enums surfaced through `run` (`StoreError`, `PersistError`)
//!
//! ## Example
//!
//! ```rust
//! use scheduler_core::{parse_list, Job};
//!
//! let preds = parse_list("24356-120, 24356-270, nan");
//! assert_eq!(preds, vec!["24356-120", "24356-270"]);
//!
//! let job = Job { id: 1, job_number: "J1".into(), quantity: 10, completed: false, blocked: false };
//! assert!(job.is_eligible());
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// Type aliases
// ============================================================================

/// Stable integer identity for a resource row.
pub type ResourceRowId = i64;
/// Stable integer identity for a resource-group row.
pub type GroupRowId = i64;
/// Stable integer identity for a job row.
pub type JobRowId = i64;
/// Stable integer identity for a task row.
pub type TaskRowId = i64;
/// Opaque, caller-facing job identifier (unique across the run).
pub type JobNumber = String;
/// Opaque, caller-facing task identifier (unique within its job).
pub type TaskNumber = String;

// ============================================================================
// Resources and groups
// ============================================================================

/// Kind of a resource: a person or a machine. Purely informational — the
/// scheduling engine treats both uniformly as exclusive, single-capacity
/// resources.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResourceKind {
    Human,
    Machine,
}

impl ResourceKind {
    /// Parse the store's single-character encoding (`'H'` / `'M'`).
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "H" | "h" => Some(Self::Human),
            "M" | "m" => Some(Self::Machine),
            _ => None,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Self::Human => "H",
            Self::Machine => "M",
        }
    }
}

/// A single named, exclusive resource (a person or a machine).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    pub id: ResourceRowId,
    pub name: String,
    pub kind: ResourceKind,
}

/// A named, ordered pool of interchangeable resources. A task requiring a
/// group has exactly one member selected for it by the solver.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceGroup {
    pub id: GroupRowId,
    pub name: String,
    /// Member resource ids, in declaration order.
    pub members: Vec<ResourceRowId>,
}

// ============================================================================
// Calendar
// ============================================================================

/// One weekday's working window, in minutes-of-day (`0..1440`).
///
/// `open == close` means the weekday is non-working. Windows that cross
/// midnight (`close <= open` with both nonzero) are not supported.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEntry {
    /// ISO weekday: 1 = Monday .. 7 = Sunday.
    pub weekday: u8,
    pub open_minute: u32,
    pub close_minute: u32,
}

// ============================================================================
// Jobs and tasks
// ============================================================================

/// A manufacturing job: an ordered batch of `quantity` units moving through
/// its tasks.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobRowId,
    pub job_number: JobNumber,
    pub quantity: i64,
    pub completed: bool,
    pub blocked: bool,
}

impl Job {
    /// A job is eligible for scheduling iff it is neither completed nor
    /// blocked.
    pub fn is_eligible(&self) -> bool {
        !self.completed && !self.blocked
    }
}

/// A single schedulable unit of work within a job, as loaded from the store
/// (predecessor/resource name lists already split, but not yet resolved).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskRowId,
    pub job_number: JobNumber,
    pub task_number: TaskNumber,
    pub setup_time: i64,
    pub time_each: i64,
    /// Task numbers of same-job predecessors, as parsed from the store.
    pub predecessors: Vec<TaskNumber>,
    /// Resource or resource-group names this task requires, in requirement
    /// order (resolution to `Fixed`/`Group` happens in the validator).
    pub resources: Vec<String>,
    pub completed: bool,
}

impl Task {
    /// A task is eligible iff it is not itself completed (job eligibility is
    /// checked separately, since it is a property of the owning job).
    pub fn is_eligible(&self) -> bool {
        !self.completed
    }

    /// Effective duration in working minutes: `max(1, setup_time + time_each * quantity)`.
    pub fn duration_minutes(&self, quantity: i64) -> i64 {
        let raw = self.setup_time + self.time_each * quantity;
        raw.max(1)
    }
}

// ============================================================================
// Parsing helpers shared by every store implementation
// ============================================================================

/// Split a comma-joined field, trim whitespace, and drop empty elements and
/// the literal sentinel `"nan"` (case-insensitive) — a database-serialization
/// artifact from the upstream producer that both `predecessors` and
/// `resources` fields may carry.
pub fn parse_list(field: &str) -> Vec<String> {
    field
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty() && !s.eq_ignore_ascii_case("nan"))
        .map(str::to_owned)
        .collect()
}

// ============================================================================
// Input / output aggregates
// ============================================================================

/// Everything the engine needs to compute one schedule, already filtered to
/// eligible jobs/tasks by the loader.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ScheduleInput {
    pub resources: Vec<Resource>,
    pub groups: Vec<ResourceGroup>,
    pub calendar: Vec<CalendarEntry>,
    pub jobs: Vec<Job>,
    pub tasks: Vec<Task>,
}

/// One row of the output schedule table: a task's assigned window and the
/// resources actually used, in original requirement order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledEntry {
    pub task_number: TaskNumber,
    pub start_time: chrono::NaiveDateTime,
    pub end_time: chrono::NaiveDateTime,
    pub resources_used: String,
}

// ============================================================================
// Errors
// ============================================================================

/// Failure reading the input model from the store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store read failed: {0}")]
    Read(String),
}

/// Failure persisting the schedule table.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("schedule write failed: {0}")]
    Write(String),
}

// ============================================================================
// Store trait boundary
// ============================================================================

/// Read/write contract the engine consumes and produces. Implementors
/// own the concrete transport (SQL, in-memory, ...); the engine only ever
/// sees `ScheduleInput` in and `ScheduledEntry` slices out.
pub trait ScheduleStore {
    /// Load the current inventory of jobs/tasks/resources/calendar, already
    /// filtered to eligible jobs and tasks.
    fn load(&self) -> Result<ScheduleInput, StoreError>;

    /// Atomically replace the schedule table with `entries`: the post-state
    /// is a complete replacement, never a partial merge.
    fn persist_schedule(&self, entries: &[ScheduledEntry]) -> Result<(), PersistError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_list_drops_nan_and_blanks() {
        assert_eq!(
            parse_list("24356-120, 24356-270, NaN, , nan"),
            vec!["24356-120", "24356-270"]
        );
    }

    #[test]
    fn parse_list_empty_field_is_empty() {
        assert!(parse_list("").is_empty());
        assert!(parse_list("nan").is_empty());
    }

    #[test]
    fn job_eligibility() {
        let job = Job {
            id: 1,
            job_number: "J1".into(),
            quantity: 5,
            completed: false,
            blocked: false,
        };
        assert!(job.is_eligible());

        let blocked = Job { blocked: true, ..job.clone() };
        assert!(!blocked.is_eligible());

        let completed = Job { completed: true, ..job };
        assert!(!completed.is_eligible());
    }

    #[test]
    fn task_duration_is_at_least_one_minute() {
        let task = Task {
            id: 1,
            job_number: "J1".into(),
            task_number: "T1".into(),
            setup_time: 0,
            time_each: 0,
            predecessors: vec![],
            resources: vec![],
            completed: false,
        };
        assert_eq!(task.duration_minutes(1), 1);

        let task = Task { setup_time: 0, time_each: 120, ..task };
        assert_eq!(task.duration_minutes(1), 120);
    }

    #[test]
    fn resource_kind_round_trip() {
        assert_eq!(ResourceKind::from_code("H"), Some(ResourceKind::Human));
        assert_eq!(ResourceKind::from_code("M"), Some(ResourceKind::Machine));
        assert_eq!(ResourceKind::from_code("x"), None);
        assert_eq!(ResourceKind::Human.code(), "H");
    }
}
