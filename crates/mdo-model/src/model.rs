//! The variable registry: a flat namespace binding module declarations.

use std::collections::HashMap;

use mdo_core::{ModuleId, Real, VarId};

use crate::error::{ModelError, ModelResult};
use crate::module::{AnalysisModule, ModuleSpec, PartialMethod};
use crate::variable::Variable;

/// Promotion rules: module-local name -> global name, applied eagerly when a
/// module is registered. Names absent from the map pass through unchanged.
#[derive(Debug, Default, Clone)]
pub struct AliasMap {
    map: HashMap<String, String>,
}

impl AliasMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, local: impl Into<String>, global: impl Into<String>) -> Self {
        self.map.insert(local.into(), global.into());
        self
    }

    pub fn resolve<'a>(&'a self, name: &'a str) -> &'a str {
        self.map.get(name).map_or(name, String::as_str)
    }
}

/// A partial declaration resolved to the module's local slice indices.
#[derive(Debug, Clone, Copy)]
pub struct ResolvedPartial {
    pub output: usize,
    pub input: usize,
    pub method: PartialMethod,
}

/// A registered module with its cached spec and bound variable IDs.
pub struct ModuleEntry {
    module: Box<dyn AnalysisModule>,
    spec: ModuleSpec,
    input_ids: Vec<VarId>,
    output_ids: Vec<VarId>,
    partials: Vec<ResolvedPartial>,
}

impl ModuleEntry {
    pub fn name(&self) -> &str {
        &self.spec.name
    }

    pub fn spec(&self) -> &ModuleSpec {
        &self.spec
    }

    pub fn module(&self) -> &dyn AnalysisModule {
        self.module.as_ref()
    }

    /// Global IDs of the inputs, in declaration order.
    pub fn input_ids(&self) -> &[VarId] {
        &self.input_ids
    }

    /// Global IDs of the outputs, in declaration order.
    pub fn output_ids(&self) -> &[VarId] {
        &self.output_ids
    }

    pub fn resolved_partials(&self) -> &[ResolvedPartial] {
        &self.partials
    }
}

/// The variable registry and module set for one problem instance.
///
/// All module-declared names live in a single flat namespace. Each variable
/// has at most one producer; a variable with none must be added as a root
/// (design variable or constant) before the dependency graph is built.
///
/// Registration is atomic: a rejected module leaves the model untouched.
#[derive(Default)]
pub struct Model {
    vars: Vec<Variable>,
    names: HashMap<String, VarId>,
    modules: Vec<ModuleEntry>,
}

impl Model {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a root variable (no producer): a design variable or constant.
    ///
    /// The name may already exist as a consumer-created placeholder, in
    /// which case it gains the root flag and value. A name that is already
    /// a root or has a producer is a `NameConflict`.
    pub fn add_root(
        &mut self,
        name: impl Into<String>,
        value: Real,
        unit: Option<&'static str>,
    ) -> ModelResult<VarId> {
        let name = name.into();
        if let Some(&id) = self.names.get(&name) {
            let var = &mut self.vars[id.index() as usize];
            if var.root || var.producer.is_some() {
                return Err(ModelError::NameConflict { name });
            }
            var.root = true;
            var.value = value;
            if var.unit.is_none() {
                var.unit = unit;
            }
            return Ok(id);
        }
        let id = VarId::from_index(self.vars.len() as u32);
        self.vars.push(Variable {
            id,
            name: name.clone(),
            unit,
            value,
            producer: None,
            consumers: Vec::new(),
            root: true,
        });
        self.names.insert(name, id);
        Ok(id)
    }

    /// Register a module under its declared names.
    pub fn register(&mut self, module: Box<dyn AnalysisModule>) -> ModelResult<ModuleId> {
        self.register_aliased(module, &AliasMap::new())
    }

    /// Register a module with promotion rules mapping its local names into
    /// the shared namespace.
    pub fn register_aliased(
        &mut self,
        module: Box<dyn AnalysisModule>,
        aliases: &AliasMap,
    ) -> ModelResult<ModuleId> {
        let spec = module.spec();

        // Phase 1: validate everything before touching any state, so a
        // failed registration leaves no partial graph behind.
        let out_names: Vec<String> = spec
            .outputs
            .iter()
            .map(|v| aliases.resolve(&v.name).to_string())
            .collect();
        let in_names: Vec<String> = spec
            .inputs
            .iter()
            .map(|v| aliases.resolve(&v.name).to_string())
            .collect();

        if out_names.is_empty() {
            return Err(ModelError::BadSpec {
                module: spec.name.clone(),
                what: "module declares no outputs".into(),
            });
        }
        for (i, name) in out_names.iter().enumerate() {
            if out_names[..i].contains(name) {
                return Err(ModelError::NameConflict { name: name.clone() });
            }
            if let Some(&id) = self.names.get(name) {
                let var = &self.vars[id.index() as usize];
                if var.producer.is_some() || var.root {
                    return Err(ModelError::NameConflict { name: name.clone() });
                }
            }
        }

        let partials = resolve_partials(&spec)?;

        // Phase 2: allocate. Nothing below can fail.
        let module_id = ModuleId::from_index(self.modules.len() as u32);

        let output_ids: Vec<VarId> = spec
            .outputs
            .iter()
            .zip(&out_names)
            .map(|(v, name)| {
                let id = self.intern(name, v.unit);
                self.vars[id.index() as usize].producer = Some(module_id);
                id
            })
            .collect();

        let input_ids: Vec<VarId> = spec
            .inputs
            .iter()
            .zip(&in_names)
            .map(|(v, name)| {
                let id = self.intern(name, v.unit);
                let consumers = &mut self.vars[id.index() as usize].consumers;
                if !consumers.contains(&module_id) {
                    consumers.push(module_id);
                }
                id
            })
            .collect();

        self.modules.push(ModuleEntry {
            module,
            spec,
            input_ids,
            output_ids,
            partials,
        });
        Ok(module_id)
    }

    /// Look up or create a variable for `name`.
    fn intern(&mut self, name: &str, unit: Option<&'static str>) -> VarId {
        if let Some(&id) = self.names.get(name) {
            let var = &mut self.vars[id.index() as usize];
            if var.unit.is_none() {
                var.unit = unit;
            }
            return id;
        }
        let id = VarId::from_index(self.vars.len() as u32);
        self.vars.push(Variable {
            id,
            name: name.to_string(),
            unit,
            value: 0.0,
            producer: None,
            consumers: Vec::new(),
            root: false,
        });
        self.names.insert(name.to_string(), id);
        id
    }

    pub fn lookup(&self, name: &str) -> Option<VarId> {
        self.names.get(name).copied()
    }

    pub fn var(&self, id: VarId) -> &Variable {
        &self.vars[id.index() as usize]
    }

    pub fn vars(&self) -> &[Variable] {
        &self.vars
    }

    pub fn modules(&self) -> &[ModuleEntry] {
        &self.modules
    }

    pub fn module(&self, id: ModuleId) -> &ModuleEntry {
        &self.modules[id.index() as usize]
    }

    pub fn n_vars(&self) -> usize {
        self.vars.len()
    }

    pub fn n_modules(&self) -> usize {
        self.modules.len()
    }

    /// Current value of a variable by name.
    pub fn value(&self, name: &str) -> ModelResult<Real> {
        let id = self
            .lookup(name)
            .ok_or_else(|| ModelError::UnknownName { name: name.into() })?;
        Ok(self.vars[id.index() as usize].value)
    }

    /// Set the current value of a variable by name.
    pub fn set_value(&mut self, name: &str, value: Real) -> ModelResult<()> {
        let id = self
            .lookup(name)
            .ok_or_else(|| ModelError::UnknownName { name: name.into() })?;
        self.vars[id.index() as usize].value = value;
        Ok(())
    }

    /// Snapshot of all variable values, indexed by `VarId`.
    pub fn initial_values(&self) -> Vec<Real> {
        self.vars.iter().map(|v| v.value).collect()
    }
}

fn resolve_partials(spec: &ModuleSpec) -> ModelResult<Vec<ResolvedPartial>> {
    spec.partials
        .iter()
        .map(|p| {
            let output = spec
                .outputs
                .iter()
                .position(|v| v.name == p.output)
                .ok_or_else(|| ModelError::BadSpec {
                    module: spec.name.clone(),
                    what: format!("partial declared for unknown output '{}'", p.output),
                })?;
            let input = spec
                .inputs
                .iter()
                .position(|v| v.name == p.input)
                .ok_or_else(|| ModelError::BadSpec {
                    module: spec.name.clone(),
                    what: format!("partial declared for unknown input '{}'", p.input),
                })?;
            Ok(ResolvedPartial {
                output,
                input,
                method: p.method,
            })
        })
        .collect()
}
