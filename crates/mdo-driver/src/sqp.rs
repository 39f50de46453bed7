//! SQP-style constrained minimization over bounded design variables.
//!
//! Each iteration evaluates the graph and its total derivatives at the
//! current design, linearizes the active constraints, and solves the
//! equality-constrained quadratic subproblem through its KKT system with a
//! damped-BFGS Hessian approximation. Steps are projected into the design
//! bounds and accepted through a backtracking line search on an l1 merit
//! function. A trial design whose evaluation fails (solver divergence or a
//! formula domain error) is rejected by the line search instead of aborting
//! the run.

use mdo_core::Real;
use mdo_model::ModelError;
use mdo_solver::{SolveConfig, SolverError, evaluate_from, total_derivatives};
use nalgebra::{DMatrix, DVector};
use tracing::{debug, trace};

use crate::error::{DriverError, DriverResult};
use crate::problem::{ConstraintKind, OptProblem};

/// Driver configuration.
#[derive(Debug, Clone)]
pub struct DriverConfig {
    /// Iteration budget before the run is reported [`Termination::Incomplete`].
    pub max_iterations: usize,
    /// Convergence threshold on step norm and constraint violation.
    pub tol: Real,
    /// Maximum merit line-search backtracks per iteration.
    pub max_backtracks: usize,
    /// Settings for the inner graph evaluations.
    pub solve: SolveConfig,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            tol: 1e-5,
            max_backtracks: 20,
            solve: SolveConfig::default(),
        }
    }
}

/// How the optimization run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// Step norm and maximum constraint violation both below `tol`.
    Converged,
    /// Iteration budget or line search exhausted; the best point found is
    /// reported, never an implicit success.
    Incomplete,
}

/// Result of an optimization run: the best design visited.
#[derive(Debug, Clone)]
pub struct OptReport {
    pub termination: Termination,
    pub iterations: usize,
    /// Design values, aligned with [`OptProblem::design_vars`].
    pub design: Vec<Real>,
    pub objective: Real,
    pub max_violation: Real,
}

/// One evaluated design point.
struct Point {
    values: Vec<Real>,
    objective: Real,
    /// Signed residual per constraint: value minus target/bound.
    c: Vec<Real>,
    viol_l1: Real,
    max_viol: Real,
}

/// Carried between iterations for the BFGS update.
struct Pending {
    s: DVector<Real>,
    grad_old: DVector<Real>,
    a_old: DMatrix<Real>,
    lambda: DVector<Real>,
    active: Vec<usize>,
}

/// Minimize the problem's objective subject to its constraints and bounds.
pub fn minimize(problem: &OptProblem, config: &DriverConfig) -> DriverResult<OptReport> {
    let n = problem.design_vars().len();
    if n == 0 {
        return Err(DriverError::BadProblem {
            what: "no design variables".to_string(),
        });
    }

    let model = problem.model();
    let mut x = DVector::from_iterator(
        n,
        problem.design_vars().iter().map(|d| model.var(d.var).value),
    );
    clamp_to_bounds(&mut x, problem);

    let mut point = try_point(problem, &x, &config.solve)?.ok_or_else(|| DriverError::Numeric {
        what: "initial design point failed to evaluate".to_string(),
    })?;

    let mut hessian = DMatrix::<Real>::identity(n, n);
    let mut mu: Real = 1.0;
    let mut pending: Option<Pending> = None;

    let mut best_x = x.clone();
    let mut best_obj = point.objective;
    let mut best_viol = point.max_viol;
    let mut termination = Termination::Incomplete;
    let mut iterations = 0;

    for iter in 0..config.max_iterations {
        iterations = iter + 1;
        let (grad, jac_c) = point_derivatives(problem, &point)?;
        let active = active_set(problem, &point, config.tol);
        let m = active.len();

        let a = select_rows(&jac_c, &active);
        if let Some(p) = pending.take() {
            if p.active == active {
                update_hessian(&mut hessian, &p, &grad, &a);
            }
        }

        // KKT system of the equality-constrained quadratic subproblem.
        let mut kkt = DMatrix::<Real>::zeros(n + m, n + m);
        kkt.view_mut((0, 0), (n, n)).copy_from(&hessian);
        if m > 0 {
            kkt.view_mut((n, 0), (m, n)).copy_from(&a);
            kkt.view_mut((0, n), (n, m)).copy_from(&a.transpose());
        }
        let mut rhs = DVector::<Real>::zeros(n + m);
        rhs.rows_mut(0, n).copy_from(&(-&grad));
        for (row, &ci) in active.iter().enumerate() {
            rhs[n + row] = -point.c[ci];
        }

        let sol = kkt.lu().solve(&rhs).ok_or_else(|| DriverError::Numeric {
            what: "singular KKT system".to_string(),
        })?;
        let step = sol.rows(0, n).into_owned();
        let lambda = sol.rows(n, m).into_owned();
        if m > 0 {
            mu = mu.max(2.0 * lambda.amax());
        }

        let phi0 = point.objective + mu * point.viol_l1;

        // Backtracking on the l1 merit, projecting each trial into bounds.
        let mut alpha = 1.0;
        let mut accepted = false;
        let mut projected_out = false;
        for _ in 0..=config.max_backtracks {
            let mut x_trial = &x + alpha * &step;
            clamp_to_bounds(&mut x_trial, problem);
            let d_norm = (&x_trial - &x).norm();
            if d_norm == 0.0 {
                // The whole direction points out of the bounds; the point
                // is stationary for the bound-constrained subproblem.
                projected_out = true;
                break;
            }
            if let Some(trial) = try_point(problem, &x_trial, &config.solve)? {
                let phi = trial.objective + mu * trial.viol_l1;
                if phi < phi0 {
                    let s = &x_trial - &x;
                    pending = Some(Pending {
                        s,
                        grad_old: grad.clone(),
                        a_old: a.clone(),
                        lambda: lambda.clone(),
                        active: active.clone(),
                    });
                    trace!(iter, alpha, merit = phi, "step accepted");
                    x = x_trial;
                    point = trial;
                    accepted = true;

                    if better(point.max_viol, point.objective, best_viol, best_obj, config.tol) {
                        best_x = x.clone();
                        best_obj = point.objective;
                        best_viol = point.max_viol;
                    }
                    if d_norm < config.tol && point.max_viol < config.tol {
                        termination = Termination::Converged;
                    }
                    break;
                }
            }
            alpha *= 0.5;
        }

        debug!(
            iter,
            objective = point.objective,
            violation = point.max_viol,
            accepted,
            "driver iteration"
        );

        if !accepted {
            // The subproblem direction no longer improves the merit; if the
            // point is feasible and cannot move, that is convergence at a
            // (possibly bound-constrained) stationary point.
            if (step.norm() < config.tol || projected_out) && point.max_viol < config.tol {
                termination = Termination::Converged;
            }
            break;
        }
        if termination == Termination::Converged {
            break;
        }
    }

    Ok(OptReport {
        termination,
        iterations,
        design: best_x.iter().copied().collect(),
        objective: best_obj,
        max_violation: best_viol,
    })
}

fn better(viol: Real, obj: Real, best_viol: Real, best_obj: Real, tol: Real) -> bool {
    if best_viol >= tol {
        return viol < best_viol;
    }
    viol < tol && obj < best_obj
}

fn clamp_to_bounds(x: &mut DVector<Real>, problem: &OptProblem) {
    for (xi, d) in x.iter_mut().zip(problem.design_vars()) {
        *xi = xi.clamp(d.lower, d.upper);
    }
}

/// Evaluate the graph at a trial design. A solver divergence or formula
/// domain error is a rejected trial (`None`); anything else propagates.
fn try_point(
    problem: &OptProblem,
    x: &DVector<Real>,
    solve: &SolveConfig,
) -> DriverResult<Option<Point>> {
    let model = problem.model();
    let mut values = model.initial_values();
    for (d, &xi) in problem.design_vars().iter().zip(x.iter()) {
        values[d.var.index() as usize] = xi;
    }

    let eval = match evaluate_from(model, problem.plan(), values, solve) {
        Ok(eval) => eval,
        Err(SolverError::ConvergenceFailure { .. })
        | Err(SolverError::Model(ModelError::Domain { .. })) => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    let mut c = Vec::with_capacity(problem.constraints().len());
    let mut viol_l1 = 0.0;
    let mut max_viol: Real = 0.0;
    for con in problem.constraints() {
        let v = eval.value(con.var);
        let (residual, viol) = match con.kind {
            ConstraintKind::Equals(t) => (v - t, (v - t).abs()),
            ConstraintKind::LowerBound(b) => (v - b, (b - v).max(0.0)),
            ConstraintKind::UpperBound(b) => (v - b, (v - b).max(0.0)),
        };
        c.push(residual);
        viol_l1 += viol;
        max_viol = max_viol.max(viol);
    }

    Ok(Some(Point {
        objective: eval.value(problem.objective()),
        values: eval.values().to_vec(),
        c,
        viol_l1,
        max_viol,
    }))
}

/// Objective gradient and the full constraint Jacobian at a point.
fn point_derivatives(
    problem: &OptProblem,
    point: &Point,
) -> DriverResult<(DVector<Real>, DMatrix<Real>)> {
    let mut of = Vec::with_capacity(1 + problem.constraints().len());
    of.push(problem.objective());
    of.extend(problem.constraints().iter().map(|c| c.var));
    let wrt: Vec<_> = problem.design_vars().iter().map(|d| d.var).collect();

    let totals = total_derivatives(problem.model(), problem.plan(), &point.values, &of, &wrt)?;
    let grad = totals.row(0).transpose();
    let jac_c = totals.rows(1, problem.constraints().len()).into_owned();
    Ok((grad, jac_c))
}

/// Equalities always; inequalities when violated or held at their bound.
fn active_set(problem: &OptProblem, point: &Point, tol: Real) -> Vec<usize> {
    problem
        .constraints()
        .iter()
        .enumerate()
        .filter(|(i, con)| match con.kind {
            ConstraintKind::Equals(_) => true,
            ConstraintKind::LowerBound(_) => point.c[*i] <= tol,
            ConstraintKind::UpperBound(_) => point.c[*i] >= -tol,
        })
        .map(|(i, _)| i)
        .collect()
}

fn select_rows(jac: &DMatrix<Real>, rows: &[usize]) -> DMatrix<Real> {
    let n = jac.ncols();
    let mut out = DMatrix::zeros(rows.len(), n);
    for (r, &i) in rows.iter().enumerate() {
        out.row_mut(r).copy_from(&jac.row(i));
    }
    out
}

/// Damped BFGS on the Lagrangian gradient (Powell's modification keeps the
/// approximation positive definite when curvature is weak).
fn update_hessian(
    hessian: &mut DMatrix<Real>,
    pending: &Pending,
    grad_new: &DVector<Real>,
    a_new: &DMatrix<Real>,
) {
    let s = &pending.s;
    let grad_l_new = grad_new + a_new.transpose() * &pending.lambda;
    let grad_l_old = &pending.grad_old + pending.a_old.transpose() * &pending.lambda;
    let mut y = grad_l_new - grad_l_old;

    let bs = &*hessian * s;
    let sbs = s.dot(&bs);
    if sbs <= 0.0 {
        return;
    }
    let mut sy = s.dot(&y);
    if sy < 0.2 * sbs {
        let theta = 0.8 * sbs / (sbs - sy);
        y = theta * y + (1.0 - theta) * &bs;
        sy = s.dot(&y);
    }
    if sy <= 1e-12 {
        return;
    }
    *hessian -= (&bs * bs.transpose()) / sbs;
    *hessian += (&y * y.transpose()) / sy;
}
