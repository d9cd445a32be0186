use crate::CoreError;

/// Floating point type used throughout system
pub type Real = f64;

/// One tolerance for everything
#[derive(Clone, Copy, Debug)]
pub struct Tolerances {
    pub abs: Real,
    pub rel: Real,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            abs: 1e-12,
            rel: 1e-9,
        }
    }
}

pub fn nearly_equal(a: Real, b: Real, tol: Tolerances) -> bool {
    let diff = (a - b).abs();
    if diff <= tol.abs {
        return true;
    }
    diff <= tol.rel * a.abs().max(b.abs())
}

pub fn ensure_finite(v: Real, what: &'static str) -> Result<Real, CoreError> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(CoreError::NonFinite { what, value: v })
    }
}

/// Number of samples a run of `length` seconds produces at `resolution`
/// seconds per sample. `None` when either input is not a positive finite
/// number.
pub fn expected_sample_count(length: Real, resolution: Real) -> Option<usize> {
    if !(length.is_finite() && resolution.is_finite()) || length <= 0.0 || resolution <= 0.0 {
        return None;
    }
    let ratio = length / resolution;
    // 3600 / 300 must give 12, not 13 after rounding noise
    let rounded = ratio.round();
    if nearly_equal(ratio, rounded, Tolerances::default()) {
        Some(rounded as usize)
    } else {
        Some(ratio.ceil() as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nearly_equal_basic() {
        let tol = Tolerances {
            abs: 1e-12,
            rel: 1e-9,
        };
        assert!(nearly_equal(1.0, 1.0 + 1e-12, tol));
        assert!(nearly_equal(0.0, 1e-13, tol));
        assert!(!nearly_equal(1.0, 1.0 + 1e-6, tol));
    }

    #[test]
    fn ensure_finite_detects_nan() {
        let err = ensure_finite(Real::NAN, "test").unwrap_err();
        let msg = format!("{err}");
        assert!(msg.contains("Non-finite"));
    }

    #[test]
    fn expected_sample_count_divides_and_rounds_up() {
        assert_eq!(expected_sample_count(3600.0, 300.0), Some(12));
        assert_eq!(expected_sample_count(1000.0, 300.0), Some(4));
        assert_eq!(expected_sample_count(0.0, 300.0), None);
        assert_eq!(expected_sample_count(3600.0, -1.0), None);
        assert_eq!(expected_sample_count(Real::NAN, 1.0), None);
    }
}
