//! Shared rounding helpers.
//!
//! Synthetic weather values must match data generated elsewhere with
//! round-half-up semantics (`-2.5 → -2`, `2.5 → 3`). `f64::round` rounds half
//! away from zero and would disagree on negative ties, so these helpers are
//! used instead wherever a weather value is rounded.
//!
//! Popup figures follow fixed-point display rounding instead: ties go away
//! from zero on both sides (`0.125 → 0.13`, `-0.375 → -0.38`).

/// Round to the nearest integer, ties toward positive infinity.
pub(crate) fn round_half_up(v: f64) -> f64 {
    if !v.is_finite() {
        return v;
    }
    let floor = v.floor();
    if v - floor >= 0.5 {
        floor + 1.0
    } else {
        floor
    }
}

/// Round to 1 decimal place using [`round_half_up`].
pub(crate) fn round_1dp(v: f64) -> f64 {
    round_half_up(v * 10.0) / 10.0
}

/// Round to `decimals` places, ties away from zero.
///
/// The sign is restored after rounding the magnitude, so `-0.001` at two
/// places stays `-0.0`.
pub(crate) fn round_fixed(v: f64, decimals: i32) -> f64 {
    if !v.is_finite() {
        return v;
    }
    let scale = 10f64.powi(decimals);
    (round_half_up(v.abs() * scale) / scale).copysign(v)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_half_up_positive_tie() {
        assert_eq!(round_half_up(2.5), 3.0);
    }

    #[test]
    fn test_round_half_up_negative_tie() {
        // f64::round would give -3.0 here
        assert_eq!(round_half_up(-2.5), -2.0);
    }

    #[test]
    fn test_round_half_up_non_tie() {
        assert_eq!(round_half_up(2.4), 2.0);
        assert_eq!(round_half_up(-2.6), -3.0);
    }

    #[test]
    fn test_round_half_up_nan_passthrough() {
        assert!(round_half_up(f64::NAN).is_nan());
    }

    #[test]
    fn test_round_1dp() {
        assert_eq!(round_1dp(3.14), 3.1);
        assert_eq!(round_1dp(3.16), 3.2);
        assert_eq!(round_1dp(-5.75), -5.7);
    }

    #[test]
    fn test_round_fixed_ties_away_from_zero() {
        assert_eq!(round_fixed(0.125, 2), 0.13);
        assert_eq!(round_fixed(-0.375, 2), -0.38);
        assert_eq!(round_fixed(12.25, 1), 12.3);
        assert_eq!(round_fixed(-12.25, 1), -12.3);
    }

    #[test]
    fn test_round_fixed_non_tie() {
        assert_eq!(round_fixed(10.456, 2), 10.46);
        assert_eq!(round_fixed(5.24, 1), 5.2);
        assert!(round_fixed(f64::INFINITY, 2).is_infinite());
    }
}
