//! Deterministic fixed-point mathematics.
//!
//! Search costs are kept in fixed point so that tie-breaks in the priority
//! queue come out identically on every platform. Two runs of the same match
//! must issue the same commands in the same order.

use fixed::types::I48F16;

/// Fixed-point number type used for search costs.
///
/// Uses I48F16 format: 48 bits for the integer part, 16 bits for the fractional part.
/// This provides a range of approximately ±140 trillion with a precision of ~0.000015.
pub type FixedNum = I48F16;

/// √2 rounded to the nearest representable I48F16 value (92682 / 65536).
pub const SQRT2: FixedNum = FixedNum::from_bits(92_682);

/// Octile distance for an 8-connected grid with unit orthogonal and √2 diagonal steps.
pub fn octile(dx: i32, dy: i32) -> FixedNum {
    let dx = dx.abs();
    let dy = dy.abs();
    let diagonal = dx.min(dy);
    let straight = dx.max(dy) - diagonal;
    SQRT2 * FixedNum::from_num(diagonal) + FixedNum::from_num(straight)
}

/// Cost of a single step, orthogonal or diagonal.
pub fn step_cost(diagonal: bool) -> FixedNum {
    if diagonal {
        SQRT2
    } else {
        FixedNum::from_num(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_octile_matches_step_costs() {
        assert_eq!(octile(0, 0), FixedNum::ZERO);
        assert_eq!(octile(3, 0), FixedNum::from_num(3));
        assert_eq!(octile(0, -4), FixedNum::from_num(4));
        assert_eq!(octile(2, 2), SQRT2 * FixedNum::from_num(2));
        assert_eq!(octile(-5, 2), SQRT2 * FixedNum::from_num(2) + FixedNum::from_num(3));
    }

    #[test]
    fn test_sqrt2_precision() {
        let error = (SQRT2.to_num::<f64>() - std::f64::consts::SQRT_2).abs();
        assert!(error < 1e-4, "SQRT2 off by {}", error);
    }
}
