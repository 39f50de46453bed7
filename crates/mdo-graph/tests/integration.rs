//! Integration tests for plan building over registry-backed models.

use proptest::prelude::*;

use mdo_graph::{PlanStep, build_plan};
use mdo_model::{AnalysisModule, Model, ModelResult, ModuleSpec, VarSpec};

/// A pass-through stage consuming `in_vars` and producing `out_var`.
struct Stage {
    name: String,
    in_vars: Vec<String>,
    out_var: String,
}

impl AnalysisModule for Stage {
    fn spec(&self) -> ModuleSpec {
        let mut spec = ModuleSpec::new(self.name.clone());
        for v in &self.in_vars {
            spec = spec.input(VarSpec::new(v.clone()));
        }
        spec.output(VarSpec::new(self.out_var.clone()))
    }

    fn evaluate(&self, inputs: &[f64], outputs: &mut [f64]) -> ModelResult<()> {
        outputs[0] = inputs.iter().sum();
        Ok(())
    }
}

#[test]
fn diamond_orders_producers_first() {
    // root -> a -> {b, c} -> d
    let mut model = Model::new();
    model.add_root("root", 1.0, None).unwrap();
    let a = model
        .register(Box::new(Stage {
            name: "a".into(),
            in_vars: vec!["root".into()],
            out_var: "va".into(),
        }))
        .unwrap();
    let b = model
        .register(Box::new(Stage {
            name: "b".into(),
            in_vars: vec!["va".into()],
            out_var: "vb".into(),
        }))
        .unwrap();
    let c = model
        .register(Box::new(Stage {
            name: "c".into(),
            in_vars: vec!["va".into()],
            out_var: "vc".into(),
        }))
        .unwrap();
    let d = model
        .register(Box::new(Stage {
            name: "d".into(),
            in_vars: vec!["vb".into(), "vc".into()],
            out_var: "vd".into(),
        }))
        .unwrap();

    let plan = build_plan(&model).unwrap();
    let order: Vec<_> = plan.module_order().collect();
    assert_eq!(order, vec![a, b, c, d]);
    assert!(plan.steps.iter().all(|s| matches!(s, PlanStep::Single(_))));
}

#[test]
fn group_boundary_inputs_are_well_defined() {
    // upstream -> cycle {f, g} -> downstream; the group's external input set
    // is exactly the upstream output plus roots.
    let mut model = Model::new();
    model.add_root("x", 2.0, None).unwrap();
    model
        .register(Box::new(Stage {
            name: "up".into(),
            in_vars: vec!["x".into()],
            out_var: "u".into(),
        }))
        .unwrap();
    model
        .register(Box::new(Stage {
            name: "f".into(),
            in_vars: vec!["u".into(), "y2".into()],
            out_var: "y1".into(),
        }))
        .unwrap();
    model
        .register(Box::new(Stage {
            name: "g".into(),
            in_vars: vec!["y1".into()],
            out_var: "y2".into(),
        }))
        .unwrap();

    let plan = build_plan(&model).unwrap();
    assert_eq!(plan.steps.len(), 2);
    let PlanStep::Group(group) = &plan.steps[1] else {
        panic!("cycle must be planned as a group");
    };
    let state_names: Vec<&str> = group
        .states
        .iter()
        .map(|&v| model.var(v).name.as_str())
        .collect();
    assert_eq!(state_names, vec!["y1", "y2"]);
}

proptest! {
    /// Whatever order a chain's stages are registered in, the plan replays
    /// them source-to-sink.
    #[test]
    fn chain_plan_respects_dependencies(perm in Just((0..8u32).collect::<Vec<_>>()).prop_shuffle()) {
        let mut model = Model::new();
        model.add_root("v0", 0.0, None).unwrap();
        for &k in &perm {
            model
                .register(Box::new(Stage {
                    name: format!("stage{k}"),
                    in_vars: vec![format!("v{k}")],
                    out_var: format!("v{}", k + 1),
                }))
                .unwrap();
        }
        let plan = build_plan(&model).unwrap();
        let positions: Vec<u32> = plan
            .module_order()
            .map(|m| perm[m.index() as usize])
            .collect();
        for w in positions.windows(2) {
            prop_assert!(w[0] < w[1], "stage {} replayed before stage {}", w[1], w[0]);
        }
    }
}
