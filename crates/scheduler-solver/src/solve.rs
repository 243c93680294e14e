//! Solver driver
//!
//! Invokes the CP-SAT solver against a built `Model` with a wall-clock
//! budget, interprets the resulting status, and extracts variable values
//! into a `SolveOutcome`.

use std::time::Duration;

use pumpkin_solver::optimisation::linear_sat_unsat::LinearSatUnsat;
use pumpkin_solver::optimisation::OptimisationDirection;
use pumpkin_solver::results::{OptimisationResult, ProblemSolution};
use pumpkin_solver::termination::TimeBudget;
use thiserror::Error;

use scheduler_core::ResourceRowId;

use crate::model::Model;

/// Default wall-clock solve budget.
pub const DEFAULT_BUDGET_SECONDS: u64 = 60;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SolverError {
    #[error("no feasible schedule exists for this input")]
    Infeasible,
    #[error("solve budget exhausted without proving feasibility or infeasibility")]
    TimedOut,
}

/// Extracted values for one task: its window and, for every resource
/// requirement (fixed or group, in original requirement order), the
/// resource id actually charged.
#[derive(Clone, Debug)]
pub struct TaskSolution {
    pub start: i64,
    pub end: i64,
    /// `(requirement_index, resource_id)` pairs, ordered by requirement
    /// index, covering both fixed and group requirements.
    pub resource_selections: Vec<(usize, ResourceRowId)>,
}

/// A solved model: per-task windows/selections plus the makespan.
#[derive(Clone, Debug)]
pub struct SolveOutcome {
    pub tasks: Vec<TaskSolution>,
    pub makespan: i64,
    /// `true` if the solver proved optimality; `false` if the budget was
    /// exhausted with only a feasible solution in hand.
    pub proven_optimal: bool,
}

fn noop_callback<B>(_: &pumpkin_solver::Solver, _: pumpkin_solver::results::SolutionReference, _: &B) {}

/// Solve `model` within `budget_seconds` of wall-clock time, minimizing
/// makespan.
pub fn solve(mut model: Model, budget_seconds: u64) -> Result<SolveOutcome, SolverError> {
    let mut brancher = model.solver.default_brancher();
    let mut termination = TimeBudget::starting_now(Duration::from_secs(budget_seconds));

    let result = model.solver.optimise(
        &mut brancher,
        &mut termination,
        LinearSatUnsat::new(OptimisationDirection::Minimise, model.makespan, noop_callback),
    );

    let (solution, proven_optimal) = match result {
        OptimisationResult::Optimal(solution) => (solution, true),
        OptimisationResult::Satisfiable(solution) => (solution, false),
        OptimisationResult::Unsatisfiable => return Err(SolverError::Infeasible),
        OptimisationResult::Unknown => return Err(SolverError::TimedOut),
    };

    let makespan = solution.get_integer_value(model.makespan) as i64;

    let tasks = (0..model.starts.len())
        .map(|i| {
            let start = solution.get_integer_value(model.starts[i]) as i64;
            let end = solution.get_integer_value(model.ends[i]) as i64;

            let mut resource_selections = model.fixed_requirements[i].clone();
            for (req_idx, candidates) in &model.group_choices[i] {
                for candidate in candidates {
                    if solution.get_integer_value(candidate.presence) == 1 {
                        resource_selections.push((*req_idx, candidate.resource_id));
                        break;
                    }
                }
            }
            resource_selections.sort_by_key(|(idx, _)| *idx);

            TaskSolution { start, end, resource_selections }
        })
        .collect();

    Ok(SolveOutcome { tasks, makespan, proven_optimal })
}
