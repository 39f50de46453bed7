//! mdo-model: variable registry and analysis-module contract.
//!
//! Provides:
//! - `AnalysisModule`, the capability trait every physics or constraint
//!   formula implements (declared inputs/outputs, evaluation, partials)
//! - `Model`, the flat variable registry that binds module-declared names
//!   into a single namespace and tracks producers and consumers
//! - `AliasMap`, eager promotion rules applied at registration
//!
//! # Example
//!
//! ```
//! use mdo_model::Model;
//!
//! let mut model = Model::new();
//! let x = model.add_root("x", 2.0, Some("m")).unwrap();
//! assert_eq!(model.var(x).name, "x");
//! assert_eq!(model.value("x").unwrap(), 2.0);
//! ```

pub mod error;
pub mod model;
pub mod module;
pub mod variable;

// Re-exports for ergonomics
pub use error::{ModelError, ModelResult};
pub use model::{AliasMap, Model, ModuleEntry, ResolvedPartial};
pub use module::{AnalysisModule, CReal, ModuleSpec, PartialMethod, PartialSet};
pub use variable::{VarSpec, Variable};
