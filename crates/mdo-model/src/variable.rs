//! Variable declarations and registry entries.

use mdo_core::{ModuleId, Real, VarId};

/// A variable as declared by a module or root definition: a name plus an
/// optional unit string. Units are bookkeeping only; no conversion happens
/// anywhere in the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VarSpec {
    pub name: String,
    pub unit: Option<&'static str>,
}

impl VarSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            unit: None,
        }
    }

    pub fn with_unit(name: impl Into<String>, unit: &'static str) -> Self {
        Self {
            name: name.into(),
            unit: Some(unit),
        }
    }
}

/// A registered variable in the flattened namespace.
///
/// Invariant: at most one producer. A variable with no producer must be a
/// root (design variable or constant) by the time the dependency graph is
/// built; the graph builder rejects anything else.
#[derive(Debug, Clone)]
pub struct Variable {
    pub id: VarId,
    pub name: String,
    pub unit: Option<&'static str>,
    pub value: Real,
    pub producer: Option<ModuleId>,
    pub consumers: Vec<ModuleId>,
    pub root: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn var_spec_unit_bookkeeping() {
        let a = VarSpec::new("alpha");
        assert_eq!(a.unit, None);
        let b = VarSpec::with_unit("tailSpan", "m");
        assert_eq!(b.unit, Some("m"));
        assert_eq!(b.name, "tailSpan");
    }
}
