//! Plan replay: ordered module evaluation with Newton-resolved groups.

use std::collections::HashMap;

use mdo_core::{Real, VarId, ensure_finite};
use mdo_graph::{CouplingGroup, EvalPlan, PlanStep};
use mdo_model::{Model, ModelError, ModuleEntry};
use nalgebra::{DMatrix, DVector};
use tracing::debug;

use crate::error::{SolverError, SolverResult};
use crate::newton::{NewtonConfig, newton_solve};
use crate::partials::local_jacobian;

/// Configuration for one full graph evaluation.
#[derive(Debug, Clone, Default)]
pub struct SolveConfig {
    /// Newton settings applied to every coupling group.
    pub newton: NewtonConfig,
}

/// Per-group convergence record, in plan order.
#[derive(Debug, Clone, Copy)]
pub struct GroupStats {
    pub iterations: usize,
    pub residual_norm: Real,
}

/// A converged state of the whole variable set.
#[derive(Debug)]
pub struct Evaluation {
    values: Vec<Real>,
    group_stats: Vec<GroupStats>,
}

impl Evaluation {
    pub fn value(&self, id: VarId) -> Real {
        self.values[id.index() as usize]
    }

    /// All variable values, indexed by `VarId`.
    pub fn values(&self) -> &[Real] {
        &self.values
    }

    pub fn group_stats(&self) -> &[GroupStats] {
        &self.group_stats
    }
}

/// Evaluate the plan starting from the model's stored variable values.
pub fn evaluate(model: &Model, plan: &EvalPlan, config: &SolveConfig) -> SolverResult<Evaluation> {
    evaluate_from(model, plan, model.initial_values(), config)
}

/// Evaluate the plan starting from an explicit value snapshot.
///
/// Roots keep their snapshot values; every produced variable is overwritten
/// in dependency order. Coupling-group states use their snapshot values as
/// the Newton initial guess, so a caller re-evaluating near a previous
/// solution converges in a handful of iterations.
pub fn evaluate_from(
    model: &Model,
    plan: &EvalPlan,
    initial: Vec<Real>,
    config: &SolveConfig,
) -> SolverResult<Evaluation> {
    if initial.len() != model.n_vars() {
        return Err(SolverError::Numeric {
            what: format!(
                "initial snapshot has {} values for a model with {} variables",
                initial.len(),
                model.n_vars()
            ),
        });
    }

    let mut values = initial;
    let mut group_stats = Vec::with_capacity(plan.n_groups());

    for step in &plan.steps {
        match step {
            PlanStep::Single(id) => {
                let entry = model.module(*id);
                let outputs = eval_module(entry, &values)?;
                for (&vid, out) in entry.output_ids().iter().zip(outputs) {
                    values[vid.index() as usize] = out;
                }
            }
            PlanStep::Group(group) => {
                let stats = solve_group(model, group, &mut values, &config.newton)?;
                debug!(
                    states = group.states.len(),
                    iterations = stats.iterations,
                    residual = stats.residual_norm,
                    "coupling group converged"
                );
                group_stats.push(stats);
            }
        }
    }

    Ok(Evaluation {
        values,
        group_stats,
    })
}

/// Run one module against the current values, rejecting non-finite outputs.
fn eval_module(entry: &ModuleEntry, values: &[Real]) -> SolverResult<Vec<Real>> {
    let inputs: Vec<Real> = entry
        .input_ids()
        .iter()
        .map(|id| values[id.index() as usize])
        .collect();
    let mut outputs = vec![0.0; entry.output_ids().len()];
    entry.module().evaluate(&inputs, &mut outputs)?;
    for (spec, &out) in entry.spec().outputs.iter().zip(&outputs) {
        if let Err(e) = ensure_finite(out, "module output") {
            return Err(SolverError::Model(ModelError::Domain {
                module: entry.name().to_string(),
                what: format!("output '{}': {e}", spec.name),
            }));
        }
    }
    Ok(outputs)
}

/// Drive a coupling group's states to mutual consistency.
///
/// The residual is `r(y) = y - G(y)` where `G` re-evaluates every member
/// module with the states pinned to `y` (Jacobi form: members read the
/// pinned states, not each other's fresh outputs). The group Jacobian is
/// then exactly `I - dG/dy`, assembled from the members' local Jacobians.
fn solve_group(
    model: &Model,
    group: &CouplingGroup,
    values: &mut [Real],
    config: &NewtonConfig,
) -> SolverResult<GroupStats> {
    let state_pos: HashMap<usize, usize> = group
        .states
        .iter()
        .enumerate()
        .map(|(pos, id)| (id.index() as usize, pos))
        .collect();

    let x0 = DVector::from_iterator(
        group.states.len(),
        group.states.iter().map(|id| values[id.index() as usize]),
    );

    let vals: &[Real] = values;
    let residual = |y: &DVector<Real>| -> SolverResult<DVector<Real>> {
        let mut scratch = vals.to_vec();
        pin_states(&mut scratch, group, y);
        let mut r = y.clone();
        for &mid in &group.modules {
            let entry = model.module(mid);
            let outputs = eval_module(entry, &scratch)?;
            for (&vid, out) in entry.output_ids().iter().zip(outputs) {
                let pos = state_pos[&(vid.index() as usize)];
                r[pos] = y[pos] - out;
            }
        }
        Ok(r)
    };

    let jacobian = |y: &DVector<Real>| -> SolverResult<DMatrix<Real>> {
        let mut scratch = vals.to_vec();
        pin_states(&mut scratch, group, y);
        let n = group.states.len();
        let mut jac = DMatrix::identity(n, n);
        for &mid in &group.modules {
            let entry = model.module(mid);
            let inputs: Vec<Real> = entry
                .input_ids()
                .iter()
                .map(|id| scratch[id.index() as usize])
                .collect();
            let ljac = local_jacobian(entry, &inputs)?;
            for (oi, &out_id) in entry.output_ids().iter().enumerate() {
                let row = state_pos[&(out_id.index() as usize)];
                for (ii, &in_id) in entry.input_ids().iter().enumerate() {
                    if let Some(&col) = state_pos.get(&(in_id.index() as usize)) {
                        jac[(row, col)] -= ljac[(oi, ii)];
                    }
                }
            }
        }
        Ok(jac)
    };

    let result = newton_solve(x0, residual, jacobian, config)?;

    for (&vid, &v) in group.states.iter().zip(result.x.iter()) {
        values[vid.index() as usize] = v;
    }
    Ok(GroupStats {
        iterations: result.iterations,
        residual_norm: result.residual_norm,
    })
}

fn pin_states(scratch: &mut [Real], group: &CouplingGroup, y: &DVector<Real>) {
    for (&vid, &v) in group.states.iter().zip(y.iter()) {
        scratch[vid.index() as usize] = v;
    }
}
