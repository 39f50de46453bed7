//! Plan construction: SCC condensation plus stable topological ordering.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use mdo_core::ModuleId;
use mdo_model::Model;

use crate::error::GraphResult;
use crate::graph::DepGraph;
use crate::plan::{CouplingGroup, EvalPlan, PlanStep};
use crate::scc::tarjan_scc;
use crate::validate;

/// Build the evaluation plan for a fully registered model.
///
/// Steps:
/// 1. validate that every input has a producer or root flag,
/// 2. decompose the module graph into strongly connected components
///    (coupling groups),
/// 3. topologically order the condensation, breaking ties between
///    independent branches by module registration order so runs are
///    reproducible.
pub fn build_plan(model: &Model) -> GraphResult<EvalPlan> {
    validate::check_resolved(model)?;

    let graph = DepGraph::from_model(model);
    let components = tarjan_scc(graph.adjacency());

    let mut comp_of = vec![0_usize; graph.n_modules()];
    for (ci, comp) in components.iter().enumerate() {
        for &m in comp {
            comp_of[m] = ci;
        }
    }

    // Condensation edges and in-degrees.
    let n_comps = components.len();
    let mut comp_succ = vec![Vec::new(); n_comps];
    let mut in_degree = vec![0_usize; n_comps];
    for m in 0..graph.n_modules() {
        for &w in graph.successors(m) {
            let (a, b) = (comp_of[m], comp_of[w]);
            if a != b && !comp_succ[a].contains(&b) {
                comp_succ[a].push(b);
                in_degree[b] += 1;
            }
        }
    }

    // Kahn's algorithm with a min-heap keyed by the component's earliest
    // registered module, giving the stable tie-break.
    let mut ready = BinaryHeap::new();
    for (ci, comp) in components.iter().enumerate() {
        if in_degree[ci] == 0 {
            ready.push(Reverse((comp[0], ci)));
        }
    }

    let mut steps = Vec::with_capacity(n_comps);
    while let Some(Reverse((_, ci))) = ready.pop() {
        steps.push(make_step(model, &graph, &components[ci]));
        for &next in &comp_succ[ci] {
            in_degree[next] -= 1;
            if in_degree[next] == 0 {
                ready.push(Reverse((components[next][0], next)));
            }
        }
    }

    // Tarjan already guarantees the condensation is acyclic, so every
    // component is emitted.
    debug_assert_eq!(steps.len(), n_comps);

    Ok(EvalPlan { steps })
}

fn make_step(model: &Model, graph: &DepGraph, comp: &[usize]) -> PlanStep {
    if comp.len() == 1 && !graph.has_self_loop(comp[0]) {
        return PlanStep::Single(ModuleId::from_index(comp[0] as u32));
    }
    let modules: Vec<ModuleId> = comp
        .iter()
        .map(|&m| ModuleId::from_index(m as u32))
        .collect();
    let states = modules
        .iter()
        .flat_map(|&m| model.module(m).output_ids().iter().copied())
        .collect();
    PlanStep::Group(CouplingGroup { modules, states })
}

#[cfg(test)]
mod tests {
    use super::*;
    use mdo_model::{AnalysisModule, ModelResult, ModuleSpec, VarSpec};

    struct Stage {
        name: &'static str,
        inputs: Vec<&'static str>,
        outputs: Vec<&'static str>,
    }

    impl Stage {
        fn boxed(
            name: &'static str,
            inputs: &[&'static str],
            outputs: &[&'static str],
        ) -> Box<Self> {
            Box::new(Self {
                name,
                inputs: inputs.to_vec(),
                outputs: outputs.to_vec(),
            })
        }
    }

    impl AnalysisModule for Stage {
        fn spec(&self) -> ModuleSpec {
            let mut spec = ModuleSpec::new(self.name);
            for i in &self.inputs {
                spec = spec.input(VarSpec::new(*i));
            }
            for o in &self.outputs {
                spec = spec.output(VarSpec::new(*o));
            }
            spec
        }

        fn evaluate(&self, _: &[f64], _: &mut [f64]) -> ModelResult<()> {
            Ok(())
        }
    }

    #[test]
    fn chain_is_ordered_singles() {
        let mut model = Model::new();
        model.add_root("x", 0.0, None).unwrap();
        // Register out of dependency order on purpose.
        model.register(Stage::boxed("b", &["y"], &["z"])).unwrap();
        model.register(Stage::boxed("a", &["x"], &["y"])).unwrap();

        let plan = build_plan(&model).unwrap();
        let order: Vec<u32> = plan.module_order().map(|m| m.index()).collect();
        assert_eq!(order, vec![1, 0], "producer must precede consumer");
        assert_eq!(plan.n_groups(), 0);
    }

    #[test]
    fn independent_branches_keep_registration_order() {
        let mut model = Model::new();
        model.add_root("x", 0.0, None).unwrap();
        model.register(Stage::boxed("a", &["x"], &["p"])).unwrap();
        model.register(Stage::boxed("b", &["x"], &["q"])).unwrap();
        model.register(Stage::boxed("c", &["x"], &["r"])).unwrap();

        let plan = build_plan(&model).unwrap();
        let order: Vec<u32> = plan.module_order().map(|m| m.index()).collect();
        assert_eq!(order, vec![0, 1, 2]);
    }

    #[test]
    fn mutual_dependency_becomes_group() {
        let mut model = Model::new();
        model.add_root("k", 0.5, None).unwrap();
        model
            .register(Stage::boxed("f", &["k", "y2"], &["y1"]))
            .unwrap();
        model
            .register(Stage::boxed("g", &["k", "y1"], &["y2"]))
            .unwrap();
        model
            .register(Stage::boxed("post", &["y1", "y2"], &["sum"]))
            .unwrap();

        let plan = build_plan(&model).unwrap();
        assert_eq!(plan.steps.len(), 2);
        match &plan.steps[0] {
            PlanStep::Group(group) => {
                assert_eq!(group.modules.len(), 2);
                let states: Vec<&str> = group
                    .states
                    .iter()
                    .map(|&v| model.var(v).name.as_str())
                    .collect();
                assert_eq!(states, vec!["y1", "y2"]);
            }
            other => panic!("expected group, got {other:?}"),
        }
        assert!(matches!(plan.steps[1], PlanStep::Single(m) if m.index() == 2));
    }

    #[test]
    fn self_loop_becomes_singleton_group() {
        let mut model = Model::new();
        model.add_root("c", 1.0, None).unwrap();
        model
            .register(Stage::boxed("fix", &["c", "y"], &["y"]))
            .unwrap();

        let plan = build_plan(&model).unwrap();
        match &plan.steps[0] {
            PlanStep::Group(group) => assert_eq!(group.modules.len(), 1),
            other => panic!("expected group, got {other:?}"),
        }
    }

    #[test]
    fn unresolved_input_fails_build() {
        let mut model = Model::new();
        model
            .register(Stage::boxed("a", &["ghost"], &["y"]))
            .unwrap();
        assert!(build_plan(&model).is_err());
    }
}
