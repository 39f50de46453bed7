//! Mass, weight, and center-of-gravity bookkeeping.
//!
//! The mass/weight modules are plain products, so they carry hand-derived
//! analytic partials; the CG module is smooth but rational and uses
//! complex-step like the aerodynamics.

use mdo_core::Real;
use mdo_model::{
    AnalysisModule, CReal, ModelResult, ModuleSpec, PartialMethod, PartialSet, VarSpec,
};

use crate::Field;

/// Chordwise offset of the wing's mass centroid from the wing datum, m.
const WING_CG_OFFSET: Real = 0.408;

/// m_t = b_t c_t rho_t, W_t = m_t g
pub struct TailMassAndWeight;

impl AnalysisModule for TailMassAndWeight {
    fn spec(&self) -> ModuleSpec {
        ModuleSpec::new("tailMassAndWeight")
            .input(VarSpec::with_unit("tailSpan", "m"))
            .input(VarSpec::with_unit("tailChord", "m"))
            .input(VarSpec::with_unit("tailMassPerArea", "kg/m^2"))
            .input(VarSpec::with_unit("g", "m/s^2"))
            .output(VarSpec::with_unit("tailMass", "kg"))
            .output(VarSpec::with_unit("tailWeight", "N"))
            .partial("tailMass", "tailSpan", PartialMethod::Analytic)
            .partial("tailMass", "tailChord", PartialMethod::Analytic)
            .partial("tailMass", "tailMassPerArea", PartialMethod::Analytic)
            .partial("tailWeight", "tailSpan", PartialMethod::Analytic)
            .partial("tailWeight", "tailChord", PartialMethod::Analytic)
            .partial("tailWeight", "tailMassPerArea", PartialMethod::Analytic)
    }

    fn evaluate(&self, inputs: &[Real], outputs: &mut [Real]) -> ModelResult<()> {
        let (b_t, c_t, rho_t, g) = (inputs[0], inputs[1], inputs[2], inputs[3]);
        let m_t = b_t * c_t * rho_t;
        outputs[0] = m_t;
        outputs[1] = m_t * g;
        Ok(())
    }

    fn partials(&self, inputs: &[Real], out: &mut PartialSet<'_>) -> ModelResult<()> {
        let (b_t, c_t, rho_t, g) = (inputs[0], inputs[1], inputs[2], inputs[3]);
        out.set("tailMass", "tailSpan", c_t * rho_t)?;
        out.set("tailMass", "tailChord", b_t * rho_t)?;
        out.set("tailMass", "tailMassPerArea", b_t * c_t)?;
        out.set("tailWeight", "tailSpan", c_t * rho_t * g)?;
        out.set("tailWeight", "tailChord", b_t * rho_t * g)?;
        out.set("tailWeight", "tailMassPerArea", b_t * c_t * g)?;
        Ok(())
    }
}

/// m_b = l_t rho_boom, W_b = m_b g
pub struct BoomMassAndWeight;

impl AnalysisModule for BoomMassAndWeight {
    fn spec(&self) -> ModuleSpec {
        ModuleSpec::new("boomMassAndWeight")
            .input(VarSpec::with_unit("tailDistance", "m"))
            .input(VarSpec::with_unit("boomMassPerLength", "kg/m"))
            .input(VarSpec::with_unit("g", "m/s^2"))
            .output(VarSpec::with_unit("boomMass", "kg"))
            .output(VarSpec::with_unit("boomWeight", "N"))
            .partial("boomMass", "tailDistance", PartialMethod::Analytic)
            .partial("boomWeight", "tailDistance", PartialMethod::Analytic)
    }

    fn evaluate(&self, inputs: &[Real], outputs: &mut [Real]) -> ModelResult<()> {
        let (l_t, rho_boom, g) = (inputs[0], inputs[1], inputs[2]);
        let m_b = l_t * rho_boom;
        outputs[0] = m_b;
        outputs[1] = m_b * g;
        Ok(())
    }

    fn partials(&self, inputs: &[Real], out: &mut PartialSet<'_>) -> ModelResult<()> {
        let (rho_boom, g) = (inputs[1], inputs[2]);
        out.set("boomMass", "tailDistance", rho_boom)?;
        out.set("boomWeight", "tailDistance", rho_boom * g)?;
        Ok(())
    }
}

/// Mass-weighted CG position along the fuselage datum. The tail's CG sits
/// at quarter-chord behind its mounting point and the boom's at half the
/// tail distance.
pub struct TotalCg;

fn total_cg<T: Field>(x: &[T], out: &mut [T]) {
    let (c_t, cg_ac, x_t, x_w, m_ac, m_w, m_t, m_b) =
        (x[0], x[1], x[2], x[3], x[4], x[5], x[6], x[7]);
    let cg_b = x_t * crate::c::<T>(0.5);
    let cg_t = x_t + crate::c::<T>(0.25) * c_t;
    let cg_w = x_w + crate::c::<T>(WING_CG_OFFSET);
    out[0] = (m_ac * cg_ac + m_w * cg_w + m_t * cg_t + m_b * cg_b) / (m_ac + m_w + m_t + m_b);
}

impl AnalysisModule for TotalCg {
    fn spec(&self) -> ModuleSpec {
        ModuleSpec::new("totalCg")
            .input(VarSpec::with_unit("tailChord", "m"))
            .input(VarSpec::with_unit("restOfAircraftCGDistance", "m"))
            .input(VarSpec::with_unit("tailDistance", "m"))
            .input(VarSpec::with_unit("wingDistance", "m"))
            .input(VarSpec::with_unit("restOfAircraftMass", "kg"))
            .input(VarSpec::with_unit("wingMass", "kg"))
            .input(VarSpec::with_unit("tailMass", "kg"))
            .input(VarSpec::with_unit("boomMass", "kg"))
            .output(VarSpec::with_unit("totalCGDistance", "m"))
            .all_partials(PartialMethod::ComplexStep)
    }

    fn evaluate(&self, inputs: &[Real], outputs: &mut [Real]) -> ModelResult<()> {
        total_cg(inputs, outputs);
        Ok(())
    }

    fn evaluate_complex(&self, inputs: &[CReal], outputs: &mut [CReal]) -> ModelResult<()> {
        total_cg(inputs, outputs);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn tail_mass_and_weight_products() {
        let mut out = [0.0, 0.0];
        TailMassAndWeight
            .evaluate(&[3.0, 0.42, 0.6, 9.80665], &mut out)
            .unwrap();
        assert_relative_eq!(out[0], 0.756, max_relative = 1e-12);
        assert_relative_eq!(out[1], 0.756 * 9.80665, max_relative = 1e-12);
    }

    #[test]
    fn analytic_partials_match_central_difference() {
        let module = TailMassAndWeight;
        let spec = module.spec();
        let x = [3.0, 0.42, 0.6, 9.80665];
        let mut set = PartialSet::new(&spec);
        module.partials(&x, &mut set).unwrap();

        let h = 1e-7;
        for &(i, j, v) in set.entries() {
            let mut xp = x;
            xp[j] += h;
            let mut xm = x;
            xm[j] -= h;
            let mut fp = [0.0, 0.0];
            let mut fm = [0.0, 0.0];
            module.evaluate(&xp, &mut fp).unwrap();
            module.evaluate(&xm, &mut fm).unwrap();
            assert_relative_eq!(v, (fp[i] - fm[i]) / (2.0 * h), max_relative = 1e-5);
        }
    }

    #[test]
    fn cg_of_equal_point_masses_is_midpoint() {
        // Two equal masses at the wing and tail stations, zero chord and
        // zero boom/aircraft mass contributions.
        let mut out = [0.0];
        total_cg(&[0.0, 0.0, 4.0, 1.0 - WING_CG_OFFSET, 0.0, 10.0, 10.0, 0.0], &mut out);
        assert_relative_eq!(out[0], 2.5, max_relative = 1e-12);
    }
}
