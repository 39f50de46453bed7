//! Tail aerodynamics.
//!
//! `TailLiftCoefficient` and `TailEffectiveAngle` feed each other: the tail
//! lift coefficient depends on the effective angle, which in turn corrects
//! for the tail's own induced downwash. The graph layer detects them as one
//! coupling group and the solver drives the pair to a fixed point.

use std::f64::consts::PI;

use mdo_core::Real;
use mdo_model::{AnalysisModule, CReal, ModelResult, ModuleSpec, PartialMethod, VarSpec};

use crate::{Field, c, dynamic_pressure};

/// AR_t = b_t / c_t
pub struct TailAspectRatio;

fn tail_ar<T: Field>(x: &[T], out: &mut [T]) {
    out[0] = x[0] / x[1];
}

impl AnalysisModule for TailAspectRatio {
    fn spec(&self) -> ModuleSpec {
        ModuleSpec::new("tailAspectRatio")
            .input(VarSpec::with_unit("tailSpan", "m"))
            .input(VarSpec::with_unit("tailChord", "m"))
            .output(VarSpec::new("tailAR"))
            .all_partials(PartialMethod::ComplexStep)
    }

    fn evaluate(&self, inputs: &[Real], outputs: &mut [Real]) -> ModelResult<()> {
        tail_ar(inputs, outputs);
        Ok(())
    }

    fn evaluate_complex(&self, inputs: &[CReal], outputs: &mut [CReal]) -> ModelResult<()> {
        tail_ar(inputs, outputs);
        Ok(())
    }
}

/// Finite-wing lift curve for the tail:
/// CL_t = 2 pi (AR e / (AR e + 2)) alphaT, and the slope
/// dCL_t/dAlpha = 2 pi AR / (AR + 2) used by the static-margin measure.
pub struct TailLiftCoefficient;

fn tail_cl<T: Field>(x: &[T], out: &mut [T]) {
    let (alpha_t, ar, e) = (x[0], x[1], x[2]);
    let two_pi = c::<T>(2.0 * PI);
    let are = ar * e;
    out[0] = two_pi * (are / (are + c::<T>(2.0))) * alpha_t;
    out[1] = two_pi * (ar / (ar + c::<T>(2.0)));
}

impl AnalysisModule for TailLiftCoefficient {
    fn spec(&self) -> ModuleSpec {
        ModuleSpec::new("tailLiftCoefficient")
            .input(VarSpec::with_unit("alphaT", "rad"))
            .input(VarSpec::new("tailAR"))
            .input(VarSpec::new("tailSpanwiseEfficiency"))
            .output(VarSpec::new("tailCL"))
            .output(VarSpec::with_unit("taildCLdAlpha", "1/rad"))
            .all_partials(PartialMethod::ComplexStep)
    }

    fn evaluate(&self, inputs: &[Real], outputs: &mut [Real]) -> ModelResult<()> {
        tail_cl(inputs, outputs);
        Ok(())
    }

    fn evaluate_complex(&self, inputs: &[CReal], outputs: &mut [CReal]) -> ModelResult<()> {
        tail_cl(inputs, outputs);
        Ok(())
    }
}

/// Effective tail angle of attack: freestream angle reduced by the wing
/// downwash, plus the tail setting angle, minus the tail's own induced
/// correction. Closes the loop with [`TailLiftCoefficient`].
pub struct TailEffectiveAngle;

fn tail_alpha<T: Field>(x: &[T], out: &mut [T]) {
    let (eps_a, alpha, alpha_0, alpha_s, cl_t, ar, e) =
        (x[0], x[1], x[2], x[3], x[4], x[5], x[6]);
    out[0] = (c::<T>(1.0) - eps_a) * alpha + eps_a * alpha_0 + alpha_s
        - cl_t / (c::<T>(PI) * ar * e);
}

impl AnalysisModule for TailEffectiveAngle {
    fn spec(&self) -> ModuleSpec {
        ModuleSpec::new("tailEffectiveAngle")
            .input(VarSpec::with_unit("dEpsilonDAlpha", "1/rad"))
            .input(VarSpec::with_unit("alpha", "rad"))
            .input(VarSpec::with_unit("alphaZeroLift", "rad"))
            .input(VarSpec::with_unit("tailAngle", "rad"))
            .input(VarSpec::new("tailCL"))
            .input(VarSpec::new("tailAR"))
            .input(VarSpec::new("tailSpanwiseEfficiency"))
            .output(VarSpec::with_unit("alphaT", "rad"))
            .all_partials(PartialMethod::ComplexStep)
    }

    fn evaluate(&self, inputs: &[Real], outputs: &mut [Real]) -> ModelResult<()> {
        tail_alpha(inputs, outputs);
        Ok(())
    }

    fn evaluate_complex(&self, inputs: &[CReal], outputs: &mut [CReal]) -> ModelResult<()> {
        tail_alpha(inputs, outputs);
        Ok(())
    }
}

/// CDi_t = CL_t^2 / (pi AR e)
pub struct TailInducedDragCoefficient;

fn tail_cdi<T: Field>(x: &[T], out: &mut [T]) {
    let (cl_t, ar, e) = (x[0], x[1], x[2]);
    out[0] = cl_t.powi(2) / (c::<T>(PI) * ar * e);
}

impl AnalysisModule for TailInducedDragCoefficient {
    fn spec(&self) -> ModuleSpec {
        ModuleSpec::new("tailInducedDragCoefficient")
            .input(VarSpec::new("tailCL"))
            .input(VarSpec::new("tailAR"))
            .input(VarSpec::new("tailSpanwiseEfficiency"))
            .output(VarSpec::new("tailCDi"))
            .all_partials(PartialMethod::ComplexStep)
    }

    fn evaluate(&self, inputs: &[Real], outputs: &mut [Real]) -> ModelResult<()> {
        tail_cdi(inputs, outputs);
        Ok(())
    }

    fn evaluate_complex(&self, inputs: &[CReal], outputs: &mut [CReal]) -> ModelResult<()> {
        tail_cdi(inputs, outputs);
        Ok(())
    }
}

/// L_t = q b_t c_t CL_t
pub struct TailLift;

fn tail_lift<T: Field>(x: &[T], out: &mut [T]) {
    let (cl_t, v, rho, b_t, c_t) = (x[0], x[1], x[2], x[3], x[4]);
    out[0] = dynamic_pressure(rho, v) * b_t * c_t * cl_t;
}

impl AnalysisModule for TailLift {
    fn spec(&self) -> ModuleSpec {
        ModuleSpec::new("tailLift")
            .input(VarSpec::new("tailCL"))
            .input(VarSpec::with_unit("airspeed", "m/s"))
            .input(VarSpec::with_unit("airDensity", "kg/m^3"))
            .input(VarSpec::with_unit("tailSpan", "m"))
            .input(VarSpec::with_unit("tailChord", "m"))
            .output(VarSpec::with_unit("tailLift", "N"))
            .all_partials(PartialMethod::ComplexStep)
    }

    fn evaluate(&self, inputs: &[Real], outputs: &mut [Real]) -> ModelResult<()> {
        tail_lift(inputs, outputs);
        Ok(())
    }

    fn evaluate_complex(&self, inputs: &[CReal], outputs: &mut [CReal]) -> ModelResult<()> {
        tail_lift(inputs, outputs);
        Ok(())
    }
}

/// Di_t = q b_t c_t CDi_t
pub struct TailInducedDrag;

fn tail_induced_drag<T: Field>(x: &[T], out: &mut [T]) {
    let (cdi_t, v, rho, b_t, c_t) = (x[0], x[1], x[2], x[3], x[4]);
    out[0] = dynamic_pressure(rho, v) * b_t * c_t * cdi_t;
}

impl AnalysisModule for TailInducedDrag {
    fn spec(&self) -> ModuleSpec {
        ModuleSpec::new("tailInducedDrag")
            .input(VarSpec::new("tailCDi"))
            .input(VarSpec::with_unit("airspeed", "m/s"))
            .input(VarSpec::with_unit("airDensity", "kg/m^3"))
            .input(VarSpec::with_unit("tailSpan", "m"))
            .input(VarSpec::with_unit("tailChord", "m"))
            .output(VarSpec::with_unit("tailInducedDrag", "N"))
            .all_partials(PartialMethod::ComplexStep)
    }

    fn evaluate(&self, inputs: &[Real], outputs: &mut [Real]) -> ModelResult<()> {
        tail_induced_drag(inputs, outputs);
        Ok(())
    }

    fn evaluate_complex(&self, inputs: &[CReal], outputs: &mut [CReal]) -> ModelResult<()> {
        tail_induced_drag(inputs, outputs);
        Ok(())
    }
}

/// Turbulent flat-plate skin friction over both sides of the tail planform.
pub struct TailSkinDrag;

fn tail_skin_drag<T: Field>(x: &[T], out: &mut [T]) {
    let (c_t, b_t, v, rho, mu) = (x[0], x[1], x[2], x[3], x[4]);
    let per_span = c::<T>(63.0 / 4000.0)
        * c_t.powf(6.0 / 7.0)
        * rho.powf(6.0 / 7.0)
        * mu.powf(1.0 / 7.0)
        * v.powf(13.0 / 7.0);
    out[0] = c::<T>(2.0) * per_span * b_t;
}

impl AnalysisModule for TailSkinDrag {
    fn spec(&self) -> ModuleSpec {
        ModuleSpec::new("tailSkinDrag")
            .input(VarSpec::with_unit("tailChord", "m"))
            .input(VarSpec::with_unit("tailSpan", "m"))
            .input(VarSpec::with_unit("airspeed", "m/s"))
            .input(VarSpec::with_unit("airDensity", "kg/m^3"))
            .input(VarSpec::with_unit("airViscosity", "kg/(m*s)"))
            .output(VarSpec::with_unit("tailSkinDrag", "N"))
            .all_partials(PartialMethod::ComplexStep)
    }

    fn evaluate(&self, inputs: &[Real], outputs: &mut [Real]) -> ModelResult<()> {
        tail_skin_drag(inputs, outputs);
        Ok(())
    }

    fn evaluate_complex(&self, inputs: &[CReal], outputs: &mut [CReal]) -> ModelResult<()> {
        tail_skin_drag(inputs, outputs);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defaults;
    use approx::assert_relative_eq;

    #[test]
    fn lift_curve_slope_at_default_planform() {
        // AR_t = 3 / 0.42, slope = 2 pi AR / (AR + 2)
        let ar = defaults::TAIL_SPAN / defaults::TAIL_CHORD;
        let mut out = [0.0, 0.0];
        tail_cl(&[0.0, ar, defaults::TAIL_SPANWISE_EFFICIENCY], &mut out);
        assert_relative_eq!(out[1], 4.90874, max_relative = 1e-4);
        assert_eq!(out[0], 0.0, "no lift at zero effective angle");
    }

    #[test]
    fn effective_angle_fixed_point_is_consistent() {
        // Closed form for the coupled pair at the default design point:
        // alphaT = n / (1 + k d) with k the lift-curve factor and
        // d = 1 / (pi AR_t e_t).
        let ar = defaults::TAIL_SPAN / defaults::TAIL_CHORD;
        let e_t = defaults::TAIL_SPANWISE_EFFICIENCY;
        let are = ar * e_t;
        let k = 2.0 * PI * are / (are + 2.0);
        let d = 1.0 / (PI * ar * e_t);
        let eps_a = 0.06792;
        let n = (1.0 - eps_a) * defaults::ALPHA
            + eps_a * defaults::ALPHA_ZERO_LIFT
            + defaults::TAIL_ANGLE;
        let alpha_t = n / (1.0 + k * d);
        let cl_t = k * alpha_t;

        // Both modules must reproduce the fixed point exactly.
        let mut cl_out = [0.0, 0.0];
        tail_cl(&[alpha_t, ar, e_t], &mut cl_out);
        assert_relative_eq!(cl_out[0], cl_t, max_relative = 1e-12);

        let mut alpha_out = [0.0];
        tail_alpha(
            &[
                eps_a,
                defaults::ALPHA,
                defaults::ALPHA_ZERO_LIFT,
                defaults::TAIL_ANGLE,
                cl_t,
                ar,
                e_t,
            ],
            &mut alpha_out,
        );
        assert_relative_eq!(alpha_out[0], alpha_t, max_relative = 1e-12);
    }

    #[test]
    fn skin_drag_scales_linearly_with_span() {
        let base = [0.42, 3.0, 8.25, 1.225, 1.802e-5];
        let mut d1 = [0.0];
        tail_skin_drag(&base, &mut d1);
        let mut doubled = base;
        doubled[1] *= 2.0;
        let mut d2 = [0.0];
        tail_skin_drag(&doubled, &mut d2);
        assert_relative_eq!(d2[0], 2.0 * d1[0], max_relative = 1e-12);
        assert!(d1[0] > 0.0);
    }
}
