use crate::{CoreError, CoreResult};

/// Floating point type used throughout the system
pub type Real = f64;

/// Absolute/relative tolerance pair used by the iterative solvers.
///
/// Convergence is declared when either criterion holds; which one matters
/// is up to the caller (the coupled solver checks the residual norm against
/// `abs` and against `rel` times the initial residual norm).
#[derive(Clone, Copy, Debug)]
pub struct Tolerances {
    pub abs: Real,
    pub rel: Real,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            abs: 1e-10,
            rel: 1e-6,
        }
    }
}

pub fn ensure_finite(v: Real, what: &'static str) -> CoreResult<Real> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(CoreError::NonFinite { what, value: v })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ensure_finite_detects_nan() {
        let err = ensure_finite(Real::NAN, "test").unwrap_err();
        let msg = format!("{err}");
        assert!(msg.contains("Non-finite"));
    }

    #[test]
    fn ensure_finite_passes_values_through() {
        assert_eq!(ensure_finite(2.5, "test").unwrap(), 2.5);
    }
}
