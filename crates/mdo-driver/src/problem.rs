//! Optimization problem statement: objective, bounded design variables,
//! and constraints over a built model.

use mdo_core::{Real, VarId};
use mdo_graph::{EvalPlan, build_plan};
use mdo_model::Model;

use crate::error::{DriverError, DriverResult};

/// A bounded root variable the optimizer may move.
#[derive(Debug, Clone)]
pub struct DesignVariable {
    pub var: VarId,
    pub name: String,
    pub lower: Real,
    pub upper: Real,
}

/// Constraint sense on a model output.
#[derive(Debug, Clone, Copy)]
pub enum ConstraintKind {
    Equals(Real),
    LowerBound(Real),
    UpperBound(Real),
}

#[derive(Debug, Clone)]
pub struct Constraint {
    pub var: VarId,
    pub name: String,
    pub kind: ConstraintKind,
}

/// A frozen problem statement. Built once through the chained constructors,
/// then read-only during the optimization loop.
pub struct OptProblem {
    model: Model,
    plan: EvalPlan,
    objective: VarId,
    design_vars: Vec<DesignVariable>,
    constraints: Vec<Constraint>,
}

impl std::fmt::Debug for OptProblem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OptProblem")
            .field("plan", &self.plan)
            .field("objective", &self.objective)
            .field("design_vars", &self.design_vars)
            .field("constraints", &self.constraints)
            .finish_non_exhaustive()
    }
}

impl OptProblem {
    /// Freeze the model's evaluation plan and name the objective output.
    pub fn new(model: Model, objective: &str) -> DriverResult<Self> {
        let plan = build_plan(&model)?;
        let objective = Self::lookup(&model, objective)?;
        Ok(Self {
            model,
            plan,
            objective,
            design_vars: Vec::new(),
            constraints: Vec::new(),
        })
    }

    /// Add a bounded design variable. Must be a root of the model.
    pub fn design_var(mut self, name: &str, lower: Real, upper: Real) -> DriverResult<Self> {
        let var = Self::lookup(&self.model, name)?;
        if !self.model.var(var).root {
            return Err(DriverError::BadProblem {
                what: format!("design variable '{name}' is not a root variable"),
            });
        }
        if lower > upper {
            return Err(DriverError::BadProblem {
                what: format!("design variable '{name}' has inverted bounds"),
            });
        }
        if self.design_vars.iter().any(|d| d.var == var) {
            return Err(DriverError::BadProblem {
                what: format!("design variable '{name}' added twice"),
            });
        }
        self.design_vars.push(DesignVariable {
            var,
            name: name.to_string(),
            lower,
            upper,
        });
        Ok(self)
    }

    /// Constrain a model output.
    pub fn constrain(mut self, name: &str, kind: ConstraintKind) -> DriverResult<Self> {
        let var = Self::lookup(&self.model, name)?;
        self.constraints.push(Constraint {
            var,
            name: name.to_string(),
            kind,
        });
        Ok(self)
    }

    fn lookup(model: &Model, name: &str) -> DriverResult<VarId> {
        model.lookup(name).ok_or_else(|| DriverError::BadProblem {
            what: format!("unknown variable '{name}'"),
        })
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    pub fn plan(&self) -> &EvalPlan {
        &self.plan
    }

    pub fn objective(&self) -> VarId {
        self.objective
    }

    pub fn design_vars(&self) -> &[DesignVariable] {
        &self.design_vars
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }
}
