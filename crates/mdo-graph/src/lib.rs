//! mdo-graph: dependency-graph layer for the mdo workspace.
//!
//! Provides:
//! - `DepGraph`, the producer→consumer module graph derived from the registry
//! - Strongly-connected-component decomposition (coupling-group detection)
//! - `EvalPlan`, the frozen evaluation order replayed by the solver
//!
//! # Example
//!
//! ```
//! use mdo_graph::{PlanStep, build_plan};
//! use mdo_model::{AnalysisModule, Model, ModelResult, ModuleSpec, VarSpec};
//!
//! struct Sum;
//! impl AnalysisModule for Sum {
//!     fn spec(&self) -> ModuleSpec {
//!         ModuleSpec::new("sum")
//!             .input(VarSpec::new("a"))
//!             .output(VarSpec::new("b"))
//!     }
//!     fn evaluate(&self, inputs: &[f64], outputs: &mut [f64]) -> ModelResult<()> {
//!         outputs[0] = inputs[0] + 1.0;
//!         Ok(())
//!     }
//! }
//!
//! let mut model = Model::new();
//! model.add_root("a", 0.0, None).unwrap();
//! model.register(Box::new(Sum)).unwrap();
//! let plan = build_plan(&model).unwrap();
//! assert!(matches!(plan.steps[0], PlanStep::Single(_)));
//! ```

pub mod builder;
pub mod error;
pub mod graph;
pub mod plan;
pub(crate) mod scc;
pub(crate) mod validate;

// Re-exports for ergonomics
pub use builder::build_plan;
pub use error::{GraphError, GraphResult};
pub use graph::DepGraph;
pub use plan::{CouplingGroup, EvalPlan, PlanStep};
