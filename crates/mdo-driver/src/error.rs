//! Error types for problem setup and the optimization loop.

use mdo_graph::GraphError;
use mdo_model::ModelError;
use mdo_solver::SolverError;
use thiserror::Error;

pub type DriverResult<T> = Result<T, DriverError>;

#[derive(Error, Debug)]
pub enum DriverError {
    /// The problem statement is inconsistent (unknown names, inverted
    /// bounds, non-root design variables). Fatal at setup.
    #[error("Bad problem: {what}")]
    BadProblem { what: String },

    #[error("Numeric error: {what}")]
    Numeric { what: String },

    #[error(transparent)]
    Solver(#[from] SolverError),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Graph(#[from] GraphError),
}
