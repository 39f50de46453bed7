//! mdo-solver: coupled evaluation and derivative propagation.
//!
//! This crate replays an [`mdo_graph::EvalPlan`] over a registered model:
//! acyclic modules are evaluated once in order, and each coupling group is
//! resolved to mutual consistency with a damped Newton iteration (direct LU
//! solve of the group Jacobian plus a backtracking line search).
//!
//! It also houses the derivative engine: local module Jacobians from
//! analytic, complex-step, or central-difference partials, and total
//! derivatives of any output with respect to any root variable, propagated
//! through coupling groups with the implicit function theorem.

pub mod error;
pub mod evaluate;
pub mod newton;
pub mod partials;
pub mod totals;

pub use error::{SolverError, SolverResult};
pub use evaluate::{Evaluation, GroupStats, SolveConfig, evaluate, evaluate_from};
pub use newton::{NewtonConfig, NewtonResult, newton_solve};
pub use partials::local_jacobian;
pub use totals::total_derivatives;
