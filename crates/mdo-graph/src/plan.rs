//! The frozen evaluation plan replayed on every graph evaluation.

use mdo_core::{ModuleId, VarId};

/// A maximal set of mutually dependent modules, solved iteratively as one
/// block. `states` are the group's internal output variables in module
/// registration order, then module-local declaration order; they form the
/// state vector of the coupled solve.
#[derive(Debug, Clone)]
pub struct CouplingGroup {
    pub modules: Vec<ModuleId>,
    pub states: Vec<VarId>,
}

/// One step of the evaluation order.
#[derive(Debug, Clone)]
pub enum PlanStep {
    /// An acyclic module: evaluate once, outputs flow forward.
    Single(ModuleId),
    /// A coupling group: resolve to mutual consistency before moving on.
    Group(CouplingGroup),
}

/// Topologically ordered steps over the condensation of the module graph.
/// Immutable once built; re-used for every evaluation of the problem.
#[derive(Debug, Clone)]
pub struct EvalPlan {
    pub steps: Vec<PlanStep>,
}

impl EvalPlan {
    /// Modules in replay order, flattening groups.
    pub fn module_order(&self) -> impl Iterator<Item = ModuleId> + '_ {
        self.steps.iter().flat_map(|step| match step {
            PlanStep::Single(m) => std::slice::from_ref(m).iter().copied(),
            PlanStep::Group(g) => g.modules.iter().copied(),
        })
    }

    pub fn n_groups(&self) -> usize {
        self.steps
            .iter()
            .filter(|s| matches!(s, PlanStep::Group(_)))
            .count()
    }
}
