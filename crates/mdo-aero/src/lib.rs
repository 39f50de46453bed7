//! mdo-aero: analysis modules for tail/elevator sizing of a light aircraft.
//!
//! Four families of modules against the `mdo-model` contract:
//! - wing aerodynamics: downwash gradient, lift/drag coefficients, forces
//! - tail aerodynamics: the tail-lift / effective-angle coupling loop,
//!   induced and skin drag
//! - weights: tail and boom mass/weight, total center of gravity
//! - sizing measures: vertical force balance, total drag, pitching moment
//!   about the CG, tail volume coefficient, static margin
//!
//! [`elevator_model`] wires all of them plus the default design point into a
//! ready-to-solve model. Angles are stored in radians throughout; per-degree
//! lift-curve slopes are converted once at definition in [`defaults`].

pub mod constraints;
pub mod model;
pub mod tail;
pub mod weights;
pub mod wing;

pub use model::{defaults, elevator_model};

use mdo_core::Real;
use nalgebra::ComplexField;

/// Scalar abstraction shared by the real and complex-step evaluation paths.
/// Every formula is written once against this and instantiated at `f64` and
/// `Complex<f64>`.
pub(crate) trait Field: ComplexField<RealField = Real> + Copy {}
impl<T: ComplexField<RealField = Real> + Copy> Field for T {}

pub(crate) fn c<T: Field>(v: Real) -> T {
    T::from_real(v)
}

/// q = rho V^2 / 2
pub(crate) fn dynamic_pressure<T: Field>(rho: T, v: T) -> T {
    c::<T>(0.5) * rho * v * v
}
