//! The analysis-module capability contract.

use mdo_core::Real;
use nalgebra::Complex;

use crate::error::{ModelError, ModelResult};
use crate::variable::VarSpec;

/// Complex scalar used for complex-step differentiation.
pub type CReal = Complex<Real>;

/// How a declared (output, input) partial derivative is obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartialMethod {
    /// The module supplies the derivative through [`AnalysisModule::partials`].
    Analytic,
    /// Imaginary perturbation through [`AnalysisModule::evaluate_complex`];
    /// accurate to machine precision. Falls back to central difference if
    /// the module declines complex evaluation.
    ComplexStep,
    /// Central finite difference of [`AnalysisModule::evaluate`].
    FiniteDifference,
}

/// A declared nonzero partial, by module-local variable names.
#[derive(Debug, Clone)]
pub struct PartialDecl {
    pub output: String,
    pub input: String,
    pub method: PartialMethod,
}

/// Static description of a module: ordered inputs, ordered outputs, and the
/// sparsity pattern of its partial derivatives.
///
/// Built once per module via the chained constructors:
///
/// ```
/// use mdo_model::{ModuleSpec, PartialMethod, VarSpec};
///
/// let spec = ModuleSpec::new("tailAR")
///     .input(VarSpec::with_unit("tailSpan", "m"))
///     .input(VarSpec::with_unit("tailChord", "m"))
///     .output(VarSpec::new("tailAR"))
///     .all_partials(PartialMethod::ComplexStep);
/// assert_eq!(spec.partials.len(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct ModuleSpec {
    pub name: String,
    pub inputs: Vec<VarSpec>,
    pub outputs: Vec<VarSpec>,
    pub partials: Vec<PartialDecl>,
}

impl ModuleSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            partials: Vec::new(),
        }
    }

    pub fn input(mut self, spec: VarSpec) -> Self {
        self.inputs.push(spec);
        self
    }

    pub fn output(mut self, spec: VarSpec) -> Self {
        self.outputs.push(spec);
        self
    }

    /// Declare a single nonzero partial by local names.
    pub fn partial(mut self, output: &str, input: &str, method: PartialMethod) -> Self {
        self.partials.push(PartialDecl {
            output: output.into(),
            input: input.into(),
            method,
        });
        self
    }

    /// Declare every (output, input) pair with one method. Call after all
    /// inputs and outputs have been declared.
    pub fn all_partials(mut self, method: PartialMethod) -> Self {
        for out in &self.outputs {
            for inp in &self.inputs {
                self.partials.push(PartialDecl {
                    output: out.name.clone(),
                    input: inp.name.clone(),
                    method,
                });
            }
        }
        self
    }
}

/// Sink for analytic partials, filled by [`AnalysisModule::partials`].
///
/// Entries are addressed by the module's local names and stored as
/// (output index, input index, value) triples for the derivative engine.
pub struct PartialSet<'a> {
    spec: &'a ModuleSpec,
    entries: Vec<(usize, usize, Real)>,
}

impl<'a> PartialSet<'a> {
    pub fn new(spec: &'a ModuleSpec) -> Self {
        Self {
            spec,
            entries: Vec::new(),
        }
    }

    /// Record d(output)/d(input) = value.
    ///
    /// The pair must appear in the module's declared sparsity pattern; an
    /// undeclared pair is a structural zero the derivative engine never
    /// reads, so setting one is a declaration bug.
    pub fn set(&mut self, output: &str, input: &str, value: Real) -> ModelResult<()> {
        let i = self
            .spec
            .outputs
            .iter()
            .position(|v| v.name == output)
            .ok_or_else(|| ModelError::UnknownName {
                name: output.into(),
            })?;
        let j = self
            .spec
            .inputs
            .iter()
            .position(|v| v.name == input)
            .ok_or_else(|| ModelError::UnknownName { name: input.into() })?;
        if !self
            .spec
            .partials
            .iter()
            .any(|p| p.output == output && p.input == input)
        {
            return Err(ModelError::BadSpec {
                module: self.spec.name.clone(),
                what: format!("partial d({output})/d({input}) was not declared"),
            });
        }
        self.entries.push((i, j, value));
        Ok(())
    }

    pub fn entries(&self) -> &[(usize, usize, Real)] {
        &self.entries
    }
}

/// Trait for analysis modules: pure formulas over named scalar variables.
///
/// A module is constructed once per problem instance and must be stateless
/// between evaluations; `evaluate` is a deterministic function of its inputs.
/// Input and output slices follow the order declared in [`ModuleSpec`].
pub trait AnalysisModule: Send + Sync {
    /// Static declaration. Called once at registration and cached.
    fn spec(&self) -> ModuleSpec;

    /// Compute outputs from the given inputs.
    ///
    /// Returns [`ModelError::Domain`] when the inputs fall outside the
    /// formula's validity; the evaluation layer also rejects non-finite
    /// outputs on the module's behalf.
    fn evaluate(&self, inputs: &[Real], outputs: &mut [Real]) -> ModelResult<()>;

    /// Complex-valued evaluation for complex-step differentiation.
    ///
    /// Only meaningful for formulas that are smooth in their inputs (no
    /// branching on values). Default implementation declines, which makes
    /// the derivative engine fall back to central differences.
    fn evaluate_complex(&self, _inputs: &[CReal], _outputs: &mut [CReal]) -> ModelResult<()> {
        Err(ModelError::NotSupported {
            what: "complex-step evaluation",
        })
    }

    /// Supply the partials declared [`PartialMethod::Analytic`].
    ///
    /// Default implementation supplies nothing, matching modules that
    /// declare no analytic pairs.
    fn partials(&self, _inputs: &[Real], _out: &mut PartialSet<'_>) -> ModelResult<()> {
        Ok(())
    }
}
