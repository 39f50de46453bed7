//! The prebuilt elevator-sizing model: default design point, parameters,
//! and all analysis modules wired into one registry.

use std::f64::consts::PI;

use mdo_model::{Model, ModelResult};

use crate::constraints::{MomentAboutCg, StaticMargin, TailVolume, TotalDrag, VerticalForce};
use crate::tail::{
    TailAspectRatio, TailEffectiveAngle, TailInducedDrag, TailInducedDragCoefficient, TailLift,
    TailLiftCoefficient, TailSkinDrag,
};
use crate::weights::{BoomMassAndWeight, TailMassAndWeight, TotalCg};
use crate::wing::{
    WingDownwash, WingDrag, WingDragCoefficient, WingLift, WingLiftCoefficient, WingMoment,
};

/// Default design point and aircraft parameters, SI units and radians.
/// Per-degree quantities from the source data are converted here, once.
pub mod defaults {
    use super::PI;
    use mdo_core::Real;

    pub const RAD_PER_DEG: Real = PI / 180.0;

    // Design variables
    pub const ALPHA: Real = 3.0 * RAD_PER_DEG;
    pub const TAIL_ANGLE: Real = -3.0 * RAD_PER_DEG;
    pub const TAIL_CHORD: Real = 0.42;
    pub const TAIL_SPAN: Real = 3.0;
    pub const TAIL_DISTANCE: Real = 3.5;
    pub const WING_DISTANCE: Real = 0.2;

    // Wing parameters
    pub const WING_AREA: Real = 20.4;
    pub const WING_SPAN: Real = 24.0;
    pub const WING_AR: Real = 28.235;
    pub const WING_SPANWISE_EFFICIENCY: Real = 0.97;
    pub const WING_MAC: Real = 0.894;
    /// Wing lift-curve slope, 0.102 per degree expressed per radian.
    pub const D_CL_D_ALPHA: Real = 0.102 / RAD_PER_DEG;
    pub const WING_CM: Real = -0.222;
    pub const WING_AC_DISTANCE: Real = 0.255;
    pub const WING_MASS: Real = 14.0;
    pub const ALPHA_ZERO_LIFT: Real = -7.48 * RAD_PER_DEG;
    pub const WING_CD_MIN: Real = 0.018;
    pub const WING_CL_D_MIN: Real = 0.55;
    /// Wing mounted at zero incidence relative to the fuselage datum.
    pub const WING_SETTING_ANGLE: Real = 0.0;

    // Tail parameters
    pub const TAIL_SPANWISE_EFFICIENCY: Real = 0.8;
    pub const TAIL_MASS_PER_AREA: Real = 0.6;

    // Aircraft parameters
    pub const REST_OF_AIRCRAFT_CG_DISTANCE: Real = 0.711;
    pub const REST_OF_AIRCRAFT_MASS: Real = 82.7;
    pub const BOOM_MASS_PER_LENGTH: Real = 1.0;

    // Environment
    pub const STANDARD_GRAVITY: Real = 9.80665;
    pub const AIRSPEED: Real = 8.25;
    pub const AIR_DENSITY: Real = 1.225;
    pub const AIR_VISCOSITY: Real = 1.802e-5;
}

/// Build the full elevator-sizing model at the default design point.
///
/// Registers six wing modules, seven tail modules (two of which form the
/// lift/effective-angle coupling loop), three weight modules, and the five
/// sizing measures, against the root set below.
pub fn elevator_model() -> ModelResult<Model> {
    let mut model = Model::new();

    // Design variables
    model.add_root("alpha", defaults::ALPHA, Some("rad"))?;
    model.add_root("tailAngle", defaults::TAIL_ANGLE, Some("rad"))?;
    model.add_root("tailChord", defaults::TAIL_CHORD, Some("m"))?;
    model.add_root("tailSpan", defaults::TAIL_SPAN, Some("m"))?;
    model.add_root("tailDistance", defaults::TAIL_DISTANCE, Some("m"))?;
    model.add_root("wingDistance", defaults::WING_DISTANCE, Some("m"))?;

    // Wing parameters
    model.add_root("wingArea", defaults::WING_AREA, Some("m^2"))?;
    model.add_root("wingSpan", defaults::WING_SPAN, Some("m"))?;
    model.add_root("wingAR", defaults::WING_AR, None)?;
    model.add_root(
        "wingSpanwiseEfficiency",
        defaults::WING_SPANWISE_EFFICIENCY,
        None,
    )?;
    model.add_root("wingMAC", defaults::WING_MAC, Some("m"))?;
    model.add_root("dCLdAlpha", defaults::D_CL_D_ALPHA, Some("1/rad"))?;
    model.add_root("wingCM", defaults::WING_CM, None)?;
    model.add_root("wingACDistance", defaults::WING_AC_DISTANCE, Some("m"))?;
    model.add_root("wingMass", defaults::WING_MASS, Some("kg"))?;
    model.add_root("alphaZeroLift", defaults::ALPHA_ZERO_LIFT, Some("rad"))?;
    model.add_root("wingCDMin", defaults::WING_CD_MIN, None)?;
    model.add_root("wingCLDMin", defaults::WING_CL_D_MIN, None)?;
    model.add_root("wingSettingAngle", defaults::WING_SETTING_ANGLE, Some("rad"))?;

    // Tail parameters
    model.add_root(
        "tailSpanwiseEfficiency",
        defaults::TAIL_SPANWISE_EFFICIENCY,
        None,
    )?;
    model.add_root("tailMassPerArea", defaults::TAIL_MASS_PER_AREA, Some("kg/m^2"))?;

    // Aircraft parameters
    model.add_root(
        "restOfAircraftCGDistance",
        defaults::REST_OF_AIRCRAFT_CG_DISTANCE,
        Some("m"),
    )?;
    model.add_root(
        "restOfAircraftMass",
        defaults::REST_OF_AIRCRAFT_MASS,
        Some("kg"),
    )?;
    model.add_root(
        "boomMassPerLength",
        defaults::BOOM_MASS_PER_LENGTH,
        Some("kg/m"),
    )?;

    // Environment
    model.add_root("g", defaults::STANDARD_GRAVITY, Some("m/s^2"))?;
    model.add_root("airspeed", defaults::AIRSPEED, Some("m/s"))?;
    model.add_root("airDensity", defaults::AIR_DENSITY, Some("kg/m^3"))?;
    model.add_root("airViscosity", defaults::AIR_VISCOSITY, Some("kg/(m*s)"))?;

    // Wing aerodynamics
    model.register(Box::new(WingLiftCoefficient))?;
    model.register(Box::new(WingDragCoefficient))?;
    model.register(Box::new(WingDownwash))?;
    model.register(Box::new(WingLift))?;
    model.register(Box::new(WingDrag))?;
    model.register(Box::new(WingMoment))?;

    // Tail aerodynamics
    model.register(Box::new(TailAspectRatio))?;
    model.register(Box::new(TailLiftCoefficient))?;
    model.register(Box::new(TailEffectiveAngle))?;
    model.register(Box::new(TailInducedDragCoefficient))?;
    model.register(Box::new(TailLift))?;
    model.register(Box::new(TailInducedDrag))?;
    model.register(Box::new(TailSkinDrag))?;

    // Weights
    model.register(Box::new(TailMassAndWeight))?;
    model.register(Box::new(BoomMassAndWeight))?;
    model.register(Box::new(TotalCg))?;

    // Sizing measures
    model.register(Box::new(VerticalForce))?;
    model.register(Box::new(TotalDrag))?;
    model.register(Box::new(MomentAboutCg))?;
    model.register(Box::new(TailVolume))?;
    model.register(Box::new(StaticMargin))?;

    Ok(model)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mdo_graph::{PlanStep, build_plan};

    #[test]
    fn model_wires_completely() {
        let model = elevator_model().unwrap();
        assert_eq!(model.n_modules(), 21);
        for name in ["totalDrag", "verticalForce", "momentAboutCG", "staticMargin"] {
            assert!(model.lookup(name).is_some(), "missing {name}");
        }
        // Every variable either has a producer or is a root.
        build_plan(&model).unwrap();
    }

    #[test]
    fn tail_loop_is_the_only_coupling_group() {
        let model = elevator_model().unwrap();
        let plan = build_plan(&model).unwrap();
        assert_eq!(plan.n_groups(), 1);

        let group = plan
            .steps
            .iter()
            .find_map(|s| match s {
                PlanStep::Group(g) => Some(g),
                PlanStep::Single(_) => None,
            })
            .unwrap();
        assert_eq!(group.modules.len(), 2);

        let state_names: Vec<&str> = group
            .states
            .iter()
            .map(|&id| model.var(id).name.as_str())
            .collect();
        assert_eq!(state_names, ["tailCL", "taildCLdAlpha", "alphaT"]);
    }

    #[test]
    fn lift_curve_slope_converted_to_per_radian() {
        // 0.102 per degree
        assert!((defaults::D_CL_D_ALPHA - 5.8442).abs() < 1e-3);
    }
}
