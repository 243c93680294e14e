//! Model builder
//!
//! Translates a `ValidatedModel` into CP-SAT decision variables and
//! constraints: start/end integer variables, precedence linear constraints,
//! resource no-overlap, exactly-one selection per group, and the makespan
//! objective.
//!
//! # Optional intervals over `pumpkin-solver`
//!
//! `pumpkin-solver` here offers only bounded integers, linear inequality
//! constraints (`constraints::greater_than_or_equals`), and the cumulative
//! constraint — there is no reified "optional interval" constructor.
//! Group selection is therefore encoded with the same primitives, using the
//! standard big-M technique: each candidate resource gets a 0/1 presence
//! variable, the candidates for one requirement sum to exactly one, and each
//! candidate's interval is pinned to the task's real window when selected or
//! parked beyond the horizon (where it can never overlap real work) when
//! not. See DESIGN.md for the full rationale.

use std::collections::HashMap;

use pumpkin_solver::constraints as cp;
use pumpkin_solver::variables::{AffineView, TransformableVariable};
use pumpkin_solver::Solver;

use scheduler_core::ResourceRowId;

use crate::validate::{PrecedenceEdge, Requirement, ValidatedModel};

/// Default horizon multiplier: the horizon is
/// `multiplier * sum(duration)`.
pub const DEFAULT_HORIZON_MULTIPLIER: i64 = 2;

/// One candidate assignment of a group requirement: the resource id, its
/// presence indicator, and the (possibly parked) interval variables.
pub(crate) struct Candidate {
    pub(crate) resource_id: ResourceRowId,
    pub(crate) presence: pumpkin_solver::variables::DomainId,
    #[allow(dead_code)]
    pub(crate) start: pumpkin_solver::variables::DomainId,
}

/// A built CP-SAT model, ready to hand to the solver driver.
pub struct Model {
    pub(crate) solver: Solver,
    pub(crate) starts: Vec<pumpkin_solver::variables::DomainId>,
    pub(crate) ends: Vec<pumpkin_solver::variables::DomainId>,
    pub(crate) makespan: pumpkin_solver::variables::DomainId,
    pub(crate) durations: Vec<i64>,
    /// For each task, for each group requirement (in requirement order), the
    /// candidates considered for it.
    pub(crate) group_choices: Vec<Vec<(usize, Vec<Candidate>)>>,
    /// For each task, the fixed resource ids charged directly (in
    /// requirement order, interleaved with group choices by index).
    pub(crate) fixed_requirements: Vec<Vec<(usize, ResourceRowId)>>,
}

/// Build the CP-SAT model for a validated schedule, using
/// `horizon_multiplier * sum(duration)` as the variable horizon.
pub fn build(validated: &ValidatedModel, horizon_multiplier: i64) -> Model {
    let mut solver = Solver::default();
    let tag = solver.new_constraint_tag();

    let total_duration: i64 = validated.tasks.iter().map(|t| t.duration_minutes).sum();
    let horizon = (total_duration * horizon_multiplier).max(1);
    // Parked (unselected) candidate intervals live beyond the horizon so they
    // can never overlap real work; give them enough headroom for any duration.
    let park_at = horizon;
    let park_horizon = horizon + total_duration.max(1);

    let starts: Vec<_> = validated
        .tasks
        .iter()
        .map(|_| solver.new_bounded_integer(0, horizon as i32))
        .collect();
    let ends: Vec<_> = validated
        .tasks
        .iter()
        .map(|_| solver.new_bounded_integer(0, horizon as i32))
        .collect();

    for (i, task) in validated.tasks.iter().enumerate() {
        // end_i == start_i + duration_i, as start_i - end_i >= -duration_i
        // and end_i - start_i >= duration_i combined.
        post_eq_offset(&mut solver, ends[i], starts[i], task.duration_minutes, tag);
    }

    // Precedence: start_i >= end_p for each edge (p -> i).
    for PrecedenceEdge { predecessor, task } in &validated.precedence_edges {
        post_ge(&mut solver, starts[*task], ends[*predecessor], 0, tag);
    }

    // Resource interval lists for the no-overlap / cumulative pass.
    let mut resource_starts: HashMap<ResourceRowId, Vec<pumpkin_solver::variables::DomainId>> = HashMap::new();
    let mut resource_durations: HashMap<ResourceRowId, Vec<i64>> = HashMap::new();

    let mut group_choices = vec![Vec::new(); validated.tasks.len()];
    let mut fixed_requirements = vec![Vec::new(); validated.tasks.len()];

    for (i, task) in validated.tasks.iter().enumerate() {
        for (req_idx, requirement) in task.requirements.iter().enumerate() {
            match requirement {
                Requirement::Fixed(resource_id) => {
                    resource_starts.entry(*resource_id).or_default().push(starts[i]);
                    resource_durations.entry(*resource_id).or_default().push(task.duration_minutes);
                    fixed_requirements[i].push((req_idx, *resource_id));
                }
                Requirement::Group(members) => {
                    let mut candidates = Vec::with_capacity(members.len());
                    let mut presences = Vec::with_capacity(members.len());

                    for &resource_id in members {
                        let presence = solver.new_bounded_integer(0, 1);
                        presences.push(presence);

                        // candidate_start: equals starts[i] when presence=1,
                        // parked at `park_at` when presence=0.
                        let candidate_start = solver.new_bounded_integer(0, park_horizon as i32);
                        post_presence_link(&mut solver, candidate_start, starts[i], presence, park_at, horizon, tag);

                        resource_starts.entry(resource_id).or_default().push(candidate_start);
                        resource_durations.entry(resource_id).or_default().push(task.duration_minutes);

                        candidates.push(Candidate { resource_id, presence, start: candidate_start });
                    }

                    // Exactly one candidate selected: sum(presence) == 1.
                    post_sum_eq(&mut solver, &presences, 1, tag);

                    group_choices[i].push((req_idx, candidates));
                }
            }
        }
    }

    // No-overlap per resource via cumulative with unit capacity/demand.
    for (resource_id, starts_for_resource) in &resource_starts {
        let durations_for_resource = &resource_durations[resource_id];
        let demands = vec![1i32; starts_for_resource.len()];
        let durations_i32: Vec<i32> = durations_for_resource.iter().map(|&d| d as i32).collect();
        let _ = solver
            .add_constraint(cp::cumulative(
                starts_for_resource.clone(),
                durations_i32,
                demands,
                1,
                tag,
            ))
            .post();
    }

    // Makespan: makespan >= end_i for all i, objective is to minimize it.
    let makespan = solver.new_bounded_integer(0, horizon as i32);
    for &end in &ends {
        post_ge(&mut solver, makespan, end, 0, tag);
    }

    let durations = validated.tasks.iter().map(|t| t.duration_minutes).collect();

    Model {
        solver,
        starts,
        ends,
        makespan,
        durations,
        group_choices,
        fixed_requirements,
    }
}

/// Post `lhs - rhs >= constant`.
fn post_ge(
    solver: &mut Solver,
    lhs: pumpkin_solver::variables::DomainId,
    rhs: pumpkin_solver::variables::DomainId,
    constant: i64,
    tag: pumpkin_solver::ConstraintTag,
) {
    let vars = vec![lhs.scaled(1), rhs.scaled(-1)];
    let _ = solver.add_constraint(cp::greater_than_or_equals(vars, constant as i32, tag)).post();
}

/// Post `lhs - rhs <= constant`, i.e. `rhs - lhs >= -constant`.
fn post_le(
    solver: &mut Solver,
    lhs: pumpkin_solver::variables::DomainId,
    rhs: pumpkin_solver::variables::DomainId,
    constant: i64,
    tag: pumpkin_solver::ConstraintTag,
) {
    post_ge(solver, rhs, lhs, -constant, tag);
}

/// Post `lhs == rhs + offset` as a pair of inequalities.
fn post_eq_offset(
    solver: &mut Solver,
    lhs: pumpkin_solver::variables::DomainId,
    rhs: pumpkin_solver::variables::DomainId,
    offset: i64,
    tag: pumpkin_solver::ConstraintTag,
) {
    post_ge(solver, lhs, rhs, offset, tag);
    post_le(solver, lhs, rhs, offset, tag);
}

/// Post `sum(vars) == constant` as a pair of inequalities over unscaled
/// (1-weighted) integer variables.
fn post_sum_eq(solver: &mut Solver, vars: &[pumpkin_solver::variables::DomainId], constant: i32, tag: pumpkin_solver::ConstraintTag) {
    let scaled: Vec<AffineView<_>> = vars.iter().map(|v| v.scaled(1)).collect();
    let _ = solver.add_constraint(cp::greater_than_or_equals(scaled.clone(), constant, tag)).post();
    let negated: Vec<AffineView<_>> = vars.iter().map(|v| v.scaled(-1)).collect();
    let _ = solver.add_constraint(cp::greater_than_or_equals(negated, -constant, tag)).post();
}

/// Big-M link between a candidate's parked start variable and the task's
/// real start: when `presence == 1`, `candidate_start == real_start`; when
/// `presence == 0`, `candidate_start` is free to park at `park_at`.
///
/// `candidate_start >= real_start - M*(1-presence)`
/// `candidate_start <= real_start + M*(1-presence)`
/// `candidate_start >= park_at*(1-presence)`  (pins it near `park_at` when unselected)
fn post_presence_link(
    solver: &mut Solver,
    candidate_start: pumpkin_solver::variables::DomainId,
    real_start: pumpkin_solver::variables::DomainId,
    presence: pumpkin_solver::variables::DomainId,
    park_at: i64,
    big_m: i64,
    tag: pumpkin_solver::ConstraintTag,
) {
    // candidate_start - real_start - M*presence >= -M  <=>  candidate_start - real_start >= -M*(1-presence)
    let lower = vec![candidate_start.scaled(1), real_start.scaled(-1), presence.scaled(-(big_m as i32))];
    let _ = solver.add_constraint(cp::greater_than_or_equals(lower, -(big_m as i32), tag)).post();

    // real_start - candidate_start - M*presence >= -M  <=>  candidate_start - real_start <= M*(1-presence)
    let upper = vec![real_start.scaled(1), candidate_start.scaled(-1), presence.scaled(-(big_m as i32))];
    let _ = solver.add_constraint(cp::greater_than_or_equals(upper, -(big_m as i32), tag)).post();

    // candidate_start + M*presence >= park_at  <=>  when presence=0, candidate_start >= park_at
    let park = vec![candidate_start.scaled(1), presence.scaled(big_m as i32)];
    let _ = solver.add_constraint(cp::greater_than_or_equals(park, park_at as i32, tag)).post();
}
