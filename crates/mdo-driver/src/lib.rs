//! mdo-driver: gradient-based constrained optimization over a built model.
//!
//! [`OptProblem`] freezes a model, its evaluation plan, an objective output,
//! bounded design variables, and constraints. [`minimize`] runs an SQP-style
//! iteration against the solver's total derivatives and reports either
//! [`Termination::Converged`] or [`Termination::Incomplete`] with the best
//! design visited; an incomplete run is never dressed up as a success.

pub mod error;
pub mod problem;
pub mod sqp;

pub use error::{DriverError, DriverResult};
pub use problem::{Constraint, ConstraintKind, DesignVariable, OptProblem};
pub use sqp::{DriverConfig, OptReport, Termination, minimize};
