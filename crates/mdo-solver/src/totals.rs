//! Total derivatives of converged outputs with respect to root variables.

use std::collections::HashMap;

use mdo_core::{Real, VarId};
use mdo_graph::{EvalPlan, PlanStep};
use mdo_model::Model;
use nalgebra::DMatrix;

use crate::error::{SolverError, SolverResult};
use crate::partials::local_jacobian;

/// Totals `d(of)/d(wrt)` at a converged state, one forward sweep over the
/// plan with one seed column per `wrt` entry.
///
/// Acyclic steps apply the chain rule through the module's local Jacobian.
/// A coupling group with states `y`, `y = G(y, x)`, contributes its
/// sensitivities through the implicit function theorem:
///
/// ```text
/// (I - dG/dy) · dy/dx = dG/dx
/// ```
///
/// solved directly by LU, which reuses the same group Jacobian the Newton
/// iteration converged with. `values` must come from a converged
/// [`crate::evaluate`] of the same plan.
///
/// The returned matrix has one row per `of` entry and one column per `wrt`
/// entry.
pub fn total_derivatives(
    model: &Model,
    plan: &EvalPlan,
    values: &[Real],
    of: &[VarId],
    wrt: &[VarId],
) -> SolverResult<DMatrix<Real>> {
    let n_seeds = wrt.len();
    // Seed matrix: d(var)/d(wrt) for every variable, built up in plan order.
    let mut d = DMatrix::<Real>::zeros(model.n_vars(), n_seeds);
    for (j, id) in wrt.iter().enumerate() {
        d[(id.index() as usize, j)] = 1.0;
    }

    for step in &plan.steps {
        match step {
            PlanStep::Single(id) => {
                let entry = model.module(*id);
                let inputs: Vec<Real> = entry
                    .input_ids()
                    .iter()
                    .map(|v| values[v.index() as usize])
                    .collect();
                let ljac = local_jacobian(entry, &inputs)?;
                for (oi, &out_id) in entry.output_ids().iter().enumerate() {
                    for s in 0..n_seeds {
                        let mut acc = 0.0;
                        for (ii, &in_id) in entry.input_ids().iter().enumerate() {
                            acc += ljac[(oi, ii)] * d[(in_id.index() as usize, s)];
                        }
                        d[(out_id.index() as usize, s)] = acc;
                    }
                }
            }
            PlanStep::Group(group) => {
                let n = group.states.len();
                let state_pos: HashMap<usize, usize> = group
                    .states
                    .iter()
                    .enumerate()
                    .map(|(pos, id)| (id.index() as usize, pos))
                    .collect();

                // A = I - dG/dy, B = dG/dx · dx/d(wrt), both from the same
                // local Jacobians.
                let mut a = DMatrix::identity(n, n);
                let mut b = DMatrix::<Real>::zeros(n, n_seeds);
                for &mid in &group.modules {
                    let entry = model.module(mid);
                    let inputs: Vec<Real> = entry
                        .input_ids()
                        .iter()
                        .map(|v| values[v.index() as usize])
                        .collect();
                    let ljac = local_jacobian(entry, &inputs)?;
                    for (oi, &out_id) in entry.output_ids().iter().enumerate() {
                        let row = state_pos[&(out_id.index() as usize)];
                        for (ii, &in_id) in entry.input_ids().iter().enumerate() {
                            let in_idx = in_id.index() as usize;
                            if let Some(&col) = state_pos.get(&in_idx) {
                                a[(row, col)] -= ljac[(oi, ii)];
                            } else {
                                for s in 0..n_seeds {
                                    b[(row, s)] += ljac[(oi, ii)] * d[(in_idx, s)];
                                }
                            }
                        }
                    }
                }

                let x = a.lu().solve(&b).ok_or_else(|| SolverError::Numeric {
                    what: "singular coupling-group Jacobian in total derivatives".to_string(),
                })?;
                for (pos, &state_id) in group.states.iter().enumerate() {
                    for s in 0..n_seeds {
                        d[(state_id.index() as usize, s)] = x[(pos, s)];
                    }
                }
            }
        }
    }

    let mut out = DMatrix::zeros(of.len(), n_seeds);
    for (i, id) in of.iter().enumerate() {
        for s in 0..n_seeds {
            out[(i, s)] = d[(id.index() as usize, s)];
        }
    }
    Ok(out)
}
