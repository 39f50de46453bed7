//! Graph-specific error types.

use thiserror::Error;

pub type GraphResult<T> = Result<T, GraphError>;

/// Errors surfaced while building the dependency graph. All of these are
/// configuration errors: they abort problem setup and are never retried.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error(
        "Unresolved dependency: input '{variable}' of module '{module}' \
         has no producer and is not a root"
    )]
    UnresolvedDependency { variable: String, module: String },
}
