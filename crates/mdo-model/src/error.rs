//! Model-layer error types.

use thiserror::Error;

pub type ModelResult<T> = Result<T, ModelError>;

/// Errors raised by the registry and by analysis modules.
///
/// `NameConflict` and `BadSpec` are setup errors and abort problem
/// construction. `Domain` is a per-evaluation error: it flags a design point
/// outside the model's validity and is surfaced to the caller, not retried.
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Name conflict: variable '{name}' already has a producer")]
    NameConflict { name: String },

    #[error("Unknown variable name '{name}'")]
    UnknownName { name: String },

    #[error("Bad module declaration for '{module}': {what}")]
    BadSpec { module: String, what: String },

    #[error("Module '{module}' evaluated outside its domain: {what}")]
    Domain { module: String, what: String },

    #[error("Not supported: {what}")]
    NotSupported { what: &'static str },
}
