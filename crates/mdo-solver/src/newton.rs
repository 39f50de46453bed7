//! Damped Newton-Raphson with a backtracking line search.

use mdo_core::{Real, Tolerances};
use nalgebra::{DMatrix, DVector};
use tracing::{debug, trace};

use crate::error::{SolverError, SolverResult};

/// Newton solver configuration.
#[derive(Debug, Clone)]
pub struct NewtonConfig {
    /// Maximum Newton iterations before the solve is abandoned.
    pub max_iterations: usize,
    /// Residual-norm tolerances: absolute, or relative to the initial norm.
    pub tolerances: Tolerances,
    /// Line search backtracking factor (step halving by default).
    pub line_search_beta: Real,
    /// Maximum line search attempts per Newton step.
    pub max_line_search_iters: usize,
}

impl Default for NewtonConfig {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            tolerances: Tolerances::default(),
            line_search_beta: 0.5,
            max_line_search_iters: 12,
        }
    }
}

/// Converged Newton iteration result.
#[derive(Debug)]
pub struct NewtonResult {
    /// Solution vector
    pub x: DVector<Real>,
    /// Final residual norm
    pub residual_norm: Real,
    /// Number of iterations
    pub iterations: usize,
}

/// Solve `residual(x) = 0` by damped Newton iteration.
///
/// Each step solves `J · dx = -r` by LU factorization. If the full step
/// does not reduce the residual norm, the step is halved up to
/// `max_line_search_iters` times; exhausting the line search or the
/// iteration budget is a [`SolverError::ConvergenceFailure`], never a
/// silently accepted state.
pub fn newton_solve<F, J>(
    x0: DVector<Real>,
    residual_fn: F,
    jacobian_fn: J,
    config: &NewtonConfig,
) -> SolverResult<NewtonResult>
where
    F: Fn(&DVector<Real>) -> SolverResult<DVector<Real>>,
    J: Fn(&DVector<Real>) -> SolverResult<DMatrix<Real>>,
{
    let mut x = x0;
    let mut r = residual_fn(&x)?;
    let mut r_norm = r.norm();
    let r0_norm = r_norm;
    let tol = config.tolerances;

    for iter in 0..config.max_iterations {
        if r_norm < tol.abs || r_norm < tol.rel * r0_norm {
            debug!(iterations = iter, residual = r_norm, "newton converged");
            return Ok(NewtonResult {
                x,
                residual_norm: r_norm,
                iterations: iter,
            });
        }

        let jac = jacobian_fn(&x)?;
        let dx = jac
            .lu()
            .solve(&(-&r))
            .ok_or_else(|| SolverError::Numeric {
                what: "singular Jacobian in Newton step".to_string(),
            })?;

        // Full step first; halve until the residual norm decreases.
        let mut alpha = 1.0;
        let mut accepted = false;
        for _ in 0..=config.max_line_search_iters {
            let x_trial = &x + alpha * &dx;
            let r_trial = residual_fn(&x_trial)?;
            let r_trial_norm = r_trial.norm();
            if r_trial_norm < r_norm {
                x = x_trial;
                r = r_trial;
                r_norm = r_trial_norm;
                accepted = true;
                break;
            }
            alpha *= config.line_search_beta;
        }

        if !accepted {
            return Err(SolverError::ConvergenceFailure {
                what: format!(
                    "line search exhausted at iteration {iter}, residual = {r_norm:.3e}"
                ),
            });
        }

        trace!(iter, residual = r_norm, alpha, "newton iteration");
    }

    Err(SolverError::ConvergenceFailure {
        what: format!(
            "maximum iterations {} reached, residual = {:.3e}",
            config.max_iterations, r_norm
        ),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_quadratic() {
        // Solve x^2 - 4 = 0 from x0 = 3
        let residual = |x: &DVector<Real>| -> SolverResult<DVector<Real>> {
            Ok(DVector::from_element(1, x[0] * x[0] - 4.0))
        };
        let jacobian = |x: &DVector<Real>| -> SolverResult<DMatrix<Real>> {
            Ok(DMatrix::from_element(1, 1, 2.0 * x[0]))
        };

        let x0 = DVector::from_element(1, 3.0);
        let result = newton_solve(x0, residual, jacobian, &NewtonConfig::default()).unwrap();

        assert!((result.x[0] - 2.0).abs() < 1e-8);
        assert!(result.iterations < 20);
    }

    #[test]
    fn rootless_residual_fails_not_stalls() {
        // x^2 + 1 has no real root; the solve must report failure.
        let residual = |x: &DVector<Real>| -> SolverResult<DVector<Real>> {
            Ok(DVector::from_element(1, x[0] * x[0] + 1.0))
        };
        let jacobian = |x: &DVector<Real>| -> SolverResult<DMatrix<Real>> {
            Ok(DMatrix::from_element(1, 1, 2.0 * x[0]))
        };

        let x0 = DVector::from_element(1, 3.0);
        let err = newton_solve(x0, residual, jacobian, &NewtonConfig::default()).unwrap_err();
        assert!(matches!(err, SolverError::ConvergenceFailure { .. }));
    }

    #[test]
    fn already_converged_takes_zero_iterations() {
        let residual =
            |x: &DVector<Real>| -> SolverResult<DVector<Real>> { Ok(x.clone() * 0.0) };
        let jacobian = |_: &DVector<Real>| -> SolverResult<DMatrix<Real>> {
            Ok(DMatrix::identity(1, 1))
        };
        let result = newton_solve(
            DVector::from_element(1, 1.0),
            residual,
            jacobian,
            &NewtonConfig::default(),
        )
        .unwrap();
        assert_eq!(result.iterations, 0);
    }
}
