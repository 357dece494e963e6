//! Numeric guards for estimation arithmetic.
//!
//! Estimation formulas divide by quantities that can be zero and multiply
//! quantities that can be missing. Every public helper here upholds the same
//! contract: never return NaN, never return a negative count.

/// NaN-safe maximum. A NaN operand loses against any number.
#[must_use]
pub fn max_non_nan(a: f64, b: f64) -> f64 {
    if a.is_nan() {
        return b;
    }
    if b.is_nan() {
        return a;
    }
    a.max(b)
}

/// Clamps a row or value count to `[0, +inf)`, scrubbing NaN to zero.
#[must_use]
pub fn clamp_count(v: f64) -> f64 {
    if v.is_nan() {
        return 0.0;
    }
    v.max(0.0)
}

/// Clamps a selectivity to `[0, 1]`, scrubbing NaN to zero.
#[must_use]
pub fn clamp_selectivity(s: f64) -> f64 {
    if s.is_nan() {
        return 0.0;
    }
    s.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_max_non_nan() {
        assert!((max_non_nan(1.0, 2.0) - 2.0).abs() < f64::EPSILON);
        assert!((max_non_nan(f64::NAN, 2.0) - 2.0).abs() < f64::EPSILON);
        assert!((max_non_nan(1.0, f64::NAN) - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_clamp_count() {
        assert!((clamp_count(-5.0)).abs() < f64::EPSILON);
        assert!((clamp_count(f64::NAN)).abs() < f64::EPSILON);
        assert!((clamp_count(3.5) - 3.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_clamp_selectivity() {
        assert!((clamp_selectivity(2.0) - 1.0).abs() < f64::EPSILON);
        assert!((clamp_selectivity(-0.5)).abs() < f64::EPSILON);
        assert!((clamp_selectivity(f64::NAN)).abs() < f64::EPSILON);
    }
}
