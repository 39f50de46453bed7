//! Error types for evaluation and derivative propagation.

use mdo_graph::GraphError;
use mdo_model::ModelError;
use thiserror::Error;

pub type SolverResult<T> = Result<T, SolverError>;

/// Errors raised during a single graph evaluation.
///
/// `ConvergenceFailure` and the wrapped `Domain` variant of [`ModelError`]
/// are per-evaluation conditions: an enclosing optimizer may react to them
/// (reject the step, retreat) instead of aborting the run.
#[derive(Error, Debug)]
pub enum SolverError {
    #[error("Convergence failure: {what}")]
    ConvergenceFailure { what: String },

    #[error("Numeric error: {what}")]
    Numeric { what: String },

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Graph(#[from] GraphError),
}
