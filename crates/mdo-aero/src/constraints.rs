//! Sizing measures: the force/moment balances, drag total, and stability
//! margins the optimizer constrains or minimizes.

use mdo_core::Real;
use mdo_model::{AnalysisModule, CReal, ModelResult, ModuleSpec, PartialMethod, VarSpec};

use crate::{Field, c};

/// Net vertical force: lift from wing and tail minus all weights. Zero in
/// trimmed level flight.
pub struct VerticalForce;

fn vertical_force<T: Field>(x: &[T], out: &mut [T]) {
    let (lift_w, lift_t, w_t, w_b, m_ac, m_w, g) = (x[0], x[1], x[2], x[3], x[4], x[5], x[6]);
    let weight = m_ac * g + m_w * g + w_t + w_b;
    out[0] = lift_w + lift_t - weight;
}

impl AnalysisModule for VerticalForce {
    fn spec(&self) -> ModuleSpec {
        ModuleSpec::new("verticalForce")
            .input(VarSpec::with_unit("wingLift", "N"))
            .input(VarSpec::with_unit("tailLift", "N"))
            .input(VarSpec::with_unit("tailWeight", "N"))
            .input(VarSpec::with_unit("boomWeight", "N"))
            .input(VarSpec::with_unit("restOfAircraftMass", "kg"))
            .input(VarSpec::with_unit("wingMass", "kg"))
            .input(VarSpec::with_unit("g", "m/s^2"))
            .output(VarSpec::with_unit("verticalForce", "N"))
            .all_partials(PartialMethod::ComplexStep)
    }

    fn evaluate(&self, inputs: &[Real], outputs: &mut [Real]) -> ModelResult<()> {
        vertical_force(inputs, outputs);
        Ok(())
    }

    fn evaluate_complex(&self, inputs: &[CReal], outputs: &mut [CReal]) -> ModelResult<()> {
        vertical_force(inputs, outputs);
        Ok(())
    }
}

/// Drag budget: wing profile+induced drag plus tail induced and skin drag.
pub struct TotalDrag;

fn total_drag<T: Field>(x: &[T], out: &mut [T]) {
    out[0] = x[0] + x[1] + x[2];
}

impl AnalysisModule for TotalDrag {
    fn spec(&self) -> ModuleSpec {
        ModuleSpec::new("totalDrag")
            .input(VarSpec::with_unit("wingDrag", "N"))
            .input(VarSpec::with_unit("tailInducedDrag", "N"))
            .input(VarSpec::with_unit("tailSkinDrag", "N"))
            .output(VarSpec::with_unit("totalDrag", "N"))
            .all_partials(PartialMethod::ComplexStep)
    }

    fn evaluate(&self, inputs: &[Real], outputs: &mut [Real]) -> ModelResult<()> {
        total_drag(inputs, outputs);
        Ok(())
    }

    fn evaluate_complex(&self, inputs: &[CReal], outputs: &mut [CReal]) -> ModelResult<()> {
        total_drag(inputs, outputs);
        Ok(())
    }
}

/// Pitching moment about the total CG: wing moment, wing lift acting at the
/// aerodynamic center, tail lift acting at quarter-chord behind its mount.
pub struct MomentAboutCg;

fn moment_about_cg<T: Field>(x: &[T], out: &mut [T]) {
    let (x_cg, x_w, x_t, lift_w, lift_t, m_0, ho_c, c_t) =
        (x[0], x[1], x[2], x[3], x[4], x[5], x[6], x[7]);
    out[0] = m_0 + (x_cg - (x_w + ho_c)) * lift_w
        - ((x_t + c::<T>(0.25) * c_t) - x_cg) * lift_t;
}

impl AnalysisModule for MomentAboutCg {
    fn spec(&self) -> ModuleSpec {
        ModuleSpec::new("momentAboutCg")
            .input(VarSpec::with_unit("totalCGDistance", "m"))
            .input(VarSpec::with_unit("wingDistance", "m"))
            .input(VarSpec::with_unit("tailDistance", "m"))
            .input(VarSpec::with_unit("wingLift", "N"))
            .input(VarSpec::with_unit("tailLift", "N"))
            .input(VarSpec::with_unit("wingMoment", "N*m"))
            .input(VarSpec::with_unit("wingACDistance", "m"))
            .input(VarSpec::with_unit("tailChord", "m"))
            .output(VarSpec::with_unit("momentAboutCG", "N*m"))
            .all_partials(PartialMethod::ComplexStep)
    }

    fn evaluate(&self, inputs: &[Real], outputs: &mut [Real]) -> ModelResult<()> {
        moment_about_cg(inputs, outputs);
        Ok(())
    }

    fn evaluate_complex(&self, inputs: &[CReal], outputs: &mut [CReal]) -> ModelResult<()> {
        moment_about_cg(inputs, outputs);
        Ok(())
    }
}

/// Horizontal tail volume coefficient: S_t l_t / (S c).
pub struct TailVolume;

fn tail_volume<T: Field>(x: &[T], out: &mut [T]) {
    let (c_t, b_t, l_t, s, mac) = (x[0], x[1], x[2], x[3], x[4]);
    out[0] = (b_t * c_t * l_t) / (s * mac);
}

impl AnalysisModule for TailVolume {
    fn spec(&self) -> ModuleSpec {
        ModuleSpec::new("tailVolume")
            .input(VarSpec::with_unit("tailChord", "m"))
            .input(VarSpec::with_unit("tailSpan", "m"))
            .input(VarSpec::with_unit("tailDistance", "m"))
            .input(VarSpec::with_unit("wingArea", "m^2"))
            .input(VarSpec::with_unit("wingMAC", "m"))
            .output(VarSpec::new("tailVolume"))
            .all_partials(PartialMethod::ComplexStep)
    }

    fn evaluate(&self, inputs: &[Real], outputs: &mut [Real]) -> ModelResult<()> {
        tail_volume(inputs, outputs);
        Ok(())
    }

    fn evaluate_complex(&self, inputs: &[CReal], outputs: &mut [CReal]) -> ModelResult<()> {
        tail_volume(inputs, outputs);
        Ok(())
    }
}

/// Static margin in percent MAC: distance between the neutral point and the
/// CG, with the neutral point shifted aft by the tail's contribution.
pub struct StaticMargin;

fn static_margin<T: Field>(x: &[T], out: &mut [T]) {
    let (b_t, c_t, vol, mac, ho_c, cl_a, cl_at, s, x_cg, x_w) =
        (x[0], x[1], x[2], x[3], x[4], x[5], x[6], x[7], x[8], x[9]);
    let s_t = b_t * c_t;
    let cl_a_star = cl_a + cl_at * (s_t / s);
    let h = (x_cg - x_w) / mac;
    let ho = ho_c / mac;
    out[0] = (ho - h + vol * (cl_at / cl_a_star)) * c::<T>(100.0);
}

impl AnalysisModule for StaticMargin {
    fn spec(&self) -> ModuleSpec {
        ModuleSpec::new("staticMargin")
            .input(VarSpec::with_unit("tailSpan", "m"))
            .input(VarSpec::with_unit("tailChord", "m"))
            .input(VarSpec::new("tailVolume"))
            .input(VarSpec::with_unit("wingMAC", "m"))
            .input(VarSpec::with_unit("wingACDistance", "m"))
            .input(VarSpec::with_unit("dCLdAlpha", "1/rad"))
            .input(VarSpec::with_unit("taildCLdAlpha", "1/rad"))
            .input(VarSpec::with_unit("wingArea", "m^2"))
            .input(VarSpec::with_unit("totalCGDistance", "m"))
            .input(VarSpec::with_unit("wingDistance", "m"))
            .output(VarSpec::new("staticMargin"))
            .all_partials(PartialMethod::ComplexStep)
    }

    fn evaluate(&self, inputs: &[Real], outputs: &mut [Real]) -> ModelResult<()> {
        static_margin(inputs, outputs);
        Ok(())
    }

    fn evaluate_complex(&self, inputs: &[CReal], outputs: &mut [CReal]) -> ModelResult<()> {
        static_margin(inputs, outputs);
        Ok(())
    }
}
