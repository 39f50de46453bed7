//! Pre-build validation of the registry's producer/consumer index.

use mdo_model::Model;

use crate::error::{GraphError, GraphResult};

/// Every module input must be produced by exactly one upstream module or be
/// flagged as a root. Placeholders that never gained a producer or root
/// flag are configuration errors and abort setup.
pub(crate) fn check_resolved(model: &Model) -> GraphResult<()> {
    for entry in model.modules() {
        for &input in entry.input_ids() {
            let var = model.var(input);
            if var.producer.is_none() && !var.root {
                return Err(GraphError::UnresolvedDependency {
                    variable: var.name.clone(),
                    module: entry.name().to_string(),
                });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mdo_model::{AnalysisModule, ModelResult, ModuleSpec, VarSpec};

    struct Needs(&'static str);

    impl AnalysisModule for Needs {
        fn spec(&self) -> ModuleSpec {
            ModuleSpec::new("needs")
                .input(VarSpec::new(self.0))
                .output(VarSpec::new("out"))
        }
        fn evaluate(&self, _: &[f64], _: &mut [f64]) -> ModelResult<()> {
            Ok(())
        }
    }

    #[test]
    fn missing_producer_is_unresolved() {
        let mut model = Model::new();
        model.register(Box::new(Needs("ghost"))).unwrap();
        let err = check_resolved(&model).unwrap_err();
        assert_eq!(
            err,
            GraphError::UnresolvedDependency {
                variable: "ghost".into(),
                module: "needs".into(),
            }
        );
    }

    #[test]
    fn root_satisfies_dependency() {
        let mut model = Model::new();
        model.register(Box::new(Needs("x"))).unwrap();
        model.add_root("x", 1.0, None).unwrap();
        assert!(check_resolved(&model).is_ok());
    }
}
