//! Local partial-derivative matrices for single modules.

use mdo_core::Real;
use mdo_model::{CReal, ModelError, ModuleEntry, PartialMethod, PartialSet};
use nalgebra::DMatrix;

use crate::error::{SolverError, SolverResult};

/// Imaginary perturbation for complex-step differentiation. Far below
/// f64 precision, so the imaginary part carries the derivative with no
/// subtractive cancellation.
pub const COMPLEX_STEP: Real = 1e-30;

/// Relative perturbation for central differences.
pub const FD_STEP: Real = 1e-6;

/// Assemble a module's local Jacobian d(outputs)/d(inputs) at `inputs`.
///
/// Entries follow the module's declared sparsity: analytic pairs come from
/// the module itself, complex-step pairs from one imaginary-perturbed
/// evaluation per input column, and the rest from central differences.
/// A module that declares complex-step pairs but declines complex
/// evaluation silently falls back to central differences for those pairs.
/// Undeclared pairs stay structurally zero.
pub fn local_jacobian(entry: &ModuleEntry, inputs: &[Real]) -> SolverResult<DMatrix<Real>> {
    let spec = entry.spec();
    let n_in = spec.inputs.len();
    let n_out = spec.outputs.len();
    let mut jac = DMatrix::zeros(n_out, n_in);

    let mut has_analytic = false;
    let mut cs_rows: Vec<Vec<usize>> = vec![Vec::new(); n_in];
    let mut fd_rows: Vec<Vec<usize>> = vec![Vec::new(); n_in];
    for p in entry.resolved_partials() {
        match p.method {
            PartialMethod::Analytic => has_analytic = true,
            PartialMethod::ComplexStep => cs_rows[p.input].push(p.output),
            PartialMethod::FiniteDifference => fd_rows[p.input].push(p.output),
        }
    }

    if has_analytic {
        let mut set = PartialSet::new(spec);
        entry.module().partials(inputs, &mut set)?;
        for &(i, j, v) in set.entries() {
            jac[(i, j)] = v;
        }
    }

    for j in 0..n_in {
        let mut numeric_rows = std::mem::take(&mut fd_rows[j]);
        if !cs_rows[j].is_empty() {
            match complex_step_column(entry, inputs, j) {
                Ok(col) => {
                    for &i in &cs_rows[j] {
                        jac[(i, j)] = col[i];
                    }
                }
                Err(SolverError::Model(ModelError::NotSupported { .. })) => {
                    numeric_rows.extend_from_slice(&cs_rows[j]);
                }
                Err(e) => return Err(e),
            }
        }
        if !numeric_rows.is_empty() {
            let col = central_difference_column(entry, inputs, j)?;
            for &i in &numeric_rows {
                jac[(i, j)] = col[i];
            }
        }
    }

    Ok(jac)
}

/// One column of the Jacobian via an imaginary perturbation of input `j`.
fn complex_step_column(
    entry: &ModuleEntry,
    inputs: &[Real],
    j: usize,
) -> SolverResult<Vec<Real>> {
    let mut z: Vec<CReal> = inputs.iter().map(|&v| CReal::new(v, 0.0)).collect();
    z[j].im = COMPLEX_STEP;
    let mut out = vec![CReal::new(0.0, 0.0); entry.output_ids().len()];
    entry.module().evaluate_complex(&z, &mut out)?;
    Ok(out.iter().map(|c| c.im / COMPLEX_STEP).collect())
}

/// One column of the Jacobian via central differences on input `j`.
/// The step scales with the input's magnitude, as in any well-behaved
/// finite-difference scheme.
fn central_difference_column(
    entry: &ModuleEntry,
    inputs: &[Real],
    j: usize,
) -> SolverResult<Vec<Real>> {
    let n_out = entry.output_ids().len();
    let dx = FD_STEP * inputs[j].abs().max(1.0);

    let mut x_plus = inputs.to_vec();
    x_plus[j] += dx;
    let mut f_plus = vec![0.0; n_out];
    entry.module().evaluate(&x_plus, &mut f_plus)?;

    let mut x_minus = inputs.to_vec();
    x_minus[j] -= dx;
    let mut f_minus = vec![0.0; n_out];
    entry.module().evaluate(&x_minus, &mut f_minus)?;

    Ok(f_plus
        .iter()
        .zip(&f_minus)
        .map(|(p, m)| (p - m) / (2.0 * dx))
        .collect())
}
