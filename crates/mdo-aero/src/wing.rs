//! Wing aerodynamics: downwash gradient, coefficients, and forces.
//!
//! Thin-airfoil relations for a high-aspect-ratio wing. All formulas are
//! smooth, so every module is scalar-generic and supports complex-step
//! differentiation.

use std::f64::consts::PI;

use mdo_core::Real;
use mdo_model::{AnalysisModule, CReal, ModelResult, ModuleSpec, PartialMethod, VarSpec};

use crate::{Field, c, dynamic_pressure};

/// Downwash gradient behind the wing: dEpsilon/dAlpha = CL_a / (pi AR e).
pub struct WingDownwash;

fn downwash<T: Field>(x: &[T], out: &mut [T]) {
    let (cl_a, ar, e) = (x[0], x[1], x[2]);
    out[0] = cl_a / (c::<T>(PI) * ar * e);
}

impl AnalysisModule for WingDownwash {
    fn spec(&self) -> ModuleSpec {
        ModuleSpec::new("wingDownwash")
            .input(VarSpec::with_unit("dCLdAlpha", "1/rad"))
            .input(VarSpec::new("wingAR"))
            .input(VarSpec::new("wingSpanwiseEfficiency"))
            .output(VarSpec::with_unit("dEpsilonDAlpha", "1/rad"))
            .all_partials(PartialMethod::ComplexStep)
    }

    fn evaluate(&self, inputs: &[Real], outputs: &mut [Real]) -> ModelResult<()> {
        downwash(inputs, outputs);
        Ok(())
    }

    fn evaluate_complex(&self, inputs: &[CReal], outputs: &mut [CReal]) -> ModelResult<()> {
        downwash(inputs, outputs);
        Ok(())
    }
}

/// Linear lift curve: CL = CL_a (alpha - alpha_w - alpha_0).
pub struct WingLiftCoefficient;

fn wing_cl<T: Field>(x: &[T], out: &mut [T]) {
    let (cl_a, alpha, alpha_w, alpha_0) = (x[0], x[1], x[2], x[3]);
    out[0] = cl_a * (alpha - alpha_w - alpha_0);
}

impl AnalysisModule for WingLiftCoefficient {
    fn spec(&self) -> ModuleSpec {
        ModuleSpec::new("wingLiftCoefficient")
            .input(VarSpec::with_unit("dCLdAlpha", "1/rad"))
            .input(VarSpec::with_unit("alpha", "rad"))
            .input(VarSpec::with_unit("wingSettingAngle", "rad"))
            .input(VarSpec::with_unit("alphaZeroLift", "rad"))
            .output(VarSpec::new("wingCL"))
            .all_partials(PartialMethod::ComplexStep)
    }

    fn evaluate(&self, inputs: &[Real], outputs: &mut [Real]) -> ModelResult<()> {
        wing_cl(inputs, outputs);
        Ok(())
    }

    fn evaluate_complex(&self, inputs: &[CReal], outputs: &mut [CReal]) -> ModelResult<()> {
        wing_cl(inputs, outputs);
        Ok(())
    }
}

/// Parabolic drag polar: CD = CD_min + (CL - CL_Dmin)^2 / (pi AR e).
pub struct WingDragCoefficient;

fn wing_cd<T: Field>(x: &[T], out: &mut [T]) {
    let (cl, ar, e, cd_min, cl_dmin) = (x[0], x[1], x[2], x[3], x[4]);
    let k = c::<T>(1.0) / (c::<T>(PI) * ar * e);
    out[0] = cd_min + k * (cl - cl_dmin).powi(2);
}

impl AnalysisModule for WingDragCoefficient {
    fn spec(&self) -> ModuleSpec {
        ModuleSpec::new("wingDragCoefficient")
            .input(VarSpec::new("wingCL"))
            .input(VarSpec::new("wingAR"))
            .input(VarSpec::new("wingSpanwiseEfficiency"))
            .input(VarSpec::new("wingCDMin"))
            .input(VarSpec::new("wingCLDMin"))
            .output(VarSpec::new("wingCD"))
            .all_partials(PartialMethod::ComplexStep)
    }

    fn evaluate(&self, inputs: &[Real], outputs: &mut [Real]) -> ModelResult<()> {
        wing_cd(inputs, outputs);
        Ok(())
    }

    fn evaluate_complex(&self, inputs: &[CReal], outputs: &mut [CReal]) -> ModelResult<()> {
        wing_cd(inputs, outputs);
        Ok(())
    }
}

/// L = q S CL
pub struct WingLift;

fn wing_lift<T: Field>(x: &[T], out: &mut [T]) {
    let (cl, v, rho, s) = (x[0], x[1], x[2], x[3]);
    out[0] = dynamic_pressure(rho, v) * s * cl;
}

impl AnalysisModule for WingLift {
    fn spec(&self) -> ModuleSpec {
        ModuleSpec::new("wingLift")
            .input(VarSpec::new("wingCL"))
            .input(VarSpec::with_unit("airspeed", "m/s"))
            .input(VarSpec::with_unit("airDensity", "kg/m^3"))
            .input(VarSpec::with_unit("wingArea", "m^2"))
            .output(VarSpec::with_unit("wingLift", "N"))
            .all_partials(PartialMethod::ComplexStep)
    }

    fn evaluate(&self, inputs: &[Real], outputs: &mut [Real]) -> ModelResult<()> {
        wing_lift(inputs, outputs);
        Ok(())
    }

    fn evaluate_complex(&self, inputs: &[CReal], outputs: &mut [CReal]) -> ModelResult<()> {
        wing_lift(inputs, outputs);
        Ok(())
    }
}

/// D = q S CD
pub struct WingDrag;

fn wing_drag<T: Field>(x: &[T], out: &mut [T]) {
    let (cd, v, rho, s) = (x[0], x[1], x[2], x[3]);
    out[0] = dynamic_pressure(rho, v) * s * cd;
}

impl AnalysisModule for WingDrag {
    fn spec(&self) -> ModuleSpec {
        ModuleSpec::new("wingDrag")
            .input(VarSpec::new("wingCD"))
            .input(VarSpec::with_unit("airspeed", "m/s"))
            .input(VarSpec::with_unit("airDensity", "kg/m^3"))
            .input(VarSpec::with_unit("wingArea", "m^2"))
            .output(VarSpec::with_unit("wingDrag", "N"))
            .all_partials(PartialMethod::ComplexStep)
    }

    fn evaluate(&self, inputs: &[Real], outputs: &mut [Real]) -> ModelResult<()> {
        wing_drag(inputs, outputs);
        Ok(())
    }

    fn evaluate_complex(&self, inputs: &[CReal], outputs: &mut [CReal]) -> ModelResult<()> {
        wing_drag(inputs, outputs);
        Ok(())
    }
}

/// Pitching moment about the aerodynamic center: M = q S c CM.
pub struct WingMoment;

fn wing_moment<T: Field>(x: &[T], out: &mut [T]) {
    let (cm, v, rho, s, mac) = (x[0], x[1], x[2], x[3], x[4]);
    out[0] = dynamic_pressure(rho, v) * s * mac * cm;
}

impl AnalysisModule for WingMoment {
    fn spec(&self) -> ModuleSpec {
        ModuleSpec::new("wingMoment")
            .input(VarSpec::new("wingCM"))
            .input(VarSpec::with_unit("airspeed", "m/s"))
            .input(VarSpec::with_unit("airDensity", "kg/m^3"))
            .input(VarSpec::with_unit("wingArea", "m^2"))
            .input(VarSpec::with_unit("wingMAC", "m"))
            .output(VarSpec::with_unit("wingMoment", "N*m"))
            .all_partials(PartialMethod::ComplexStep)
    }

    fn evaluate(&self, inputs: &[Real], outputs: &mut [Real]) -> ModelResult<()> {
        wing_moment(inputs, outputs);
        Ok(())
    }

    fn evaluate_complex(&self, inputs: &[CReal], outputs: &mut [CReal]) -> ModelResult<()> {
        wing_moment(inputs, outputs);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defaults;
    use approx::assert_relative_eq;

    #[test]
    fn lift_coefficient_at_default_design_point() {
        let inputs = [
            defaults::D_CL_D_ALPHA,
            defaults::ALPHA,
            defaults::WING_SETTING_ANGLE,
            defaults::ALPHA_ZERO_LIFT,
        ];
        let mut out = [0.0];
        WingLiftCoefficient.evaluate(&inputs, &mut out).unwrap();
        // 5.8442/rad over a 10.48 deg effective angle of attack
        assert_relative_eq!(out[0], 1.0690, max_relative = 1e-3);
    }

    #[test]
    fn downwash_gradient_is_small_for_high_aspect_ratio() {
        let inputs = [
            defaults::D_CL_D_ALPHA,
            defaults::WING_AR,
            defaults::WING_SPANWISE_EFFICIENCY,
        ];
        let mut out = [0.0];
        WingDownwash.evaluate(&inputs, &mut out).unwrap();
        assert_relative_eq!(out[0], 0.06792, max_relative = 1e-3);
    }

    #[test]
    fn drag_polar_minimum_sits_at_cl_dmin() {
        let at = |cl: Real| -> Real {
            let mut out = [0.0];
            wing_cd(
                &[cl, defaults::WING_AR, defaults::WING_SPANWISE_EFFICIENCY, 0.018, 0.55],
                &mut out,
            );
            out[0]
        };
        assert_relative_eq!(at(0.55), 0.018, max_relative = 1e-12);
        assert!(at(0.2) > at(0.55));
        assert!(at(0.9) > at(0.55));
    }

    #[test]
    fn complex_step_matches_real_evaluation() {
        let inputs = [1.069, 8.25, 1.225, 20.4];
        let mut real_out = [0.0];
        WingLift.evaluate(&inputs, &mut real_out).unwrap();

        let z: Vec<CReal> = inputs.iter().map(|&v| CReal::new(v, 0.0)).collect();
        let mut z_out = [CReal::new(0.0, 0.0)];
        WingLift.evaluate_complex(&z, &mut z_out).unwrap();
        assert_relative_eq!(z_out[0].re, real_out[0], max_relative = 1e-14);
        assert_eq!(z_out[0].im, 0.0);
    }
}
