//! Piecewise-linear fee curves
//!
//! Mint/burn fees and hedging-agent entry/exit fees are all shaped by
//! breakpoint arrays mapping a RATE-scaled ratio to a RATE-scaled fee or
//! weight. Monotonicity and length checks run once in the governance
//! setters; the hot-path interpolation assumes a valid curve.

use {
    crate::{math, state::core::StableController},
    anchor_lang::prelude::*,
};

/// Ordered breakpoint arrays for one curve
///
/// `x` thresholds are strictly non-decreasing; `y` values are arbitrary
/// within [0, RATE_POWER]. Both are RATE-scaled.
#[derive(Clone, PartialEq, AnchorSerialize, AnchorDeserialize, Default, Debug)]
pub struct PiecewiseCurve {
    pub x: Vec<u64>,
    pub y: Vec<u64>,
}

impl PiecewiseCurve {
    /// Maximum number of breakpoints a governance setter accepts; bounds
    /// the account size reserved for curves.
    pub const MAX_POINTS: usize = 10;

    /// Serialized size reserved for one curve at MAX_POINTS breakpoints.
    pub const LEN: usize = 2 * (4 + Self::MAX_POINTS * 8);

    /// Checked at the governance-setter boundary only.
    pub fn validate(&self) -> bool {
        if self.x.is_empty() || self.x.len() != self.y.len() || self.x.len() > Self::MAX_POINTS {
            return false;
        }
        for i in 1..self.x.len() {
            if self.x[i] < self.x[i - 1] {
                return false;
            }
        }
        self.y
            .iter()
            .all(|&v| v as u128 <= StableController::RATE_POWER)
    }

    /// Linearly interpolate the curve at `ratio`.
    ///
    /// Clamps to the first/last value outside the breakpoint range and
    /// returns exact values at breakpoints. Rounds down.
    pub fn interpolate(&self, ratio: u64) -> Result<u64> {
        if ratio >= self.x[self.x.len() - 1] {
            return Ok(self.y[self.y.len() - 1]);
        }
        if ratio <= self.x[0] {
            return Ok(self.y[0]);
        }
        // find the bracketing segment; x[lower] <= ratio < x[upper]
        let mut upper = 1;
        while self.x[upper] <= ratio {
            upper += 1;
        }
        let lower = upper - 1;
        if self.x[upper] == self.x[lower] {
            return Ok(self.y[lower]);
        }

        let run = math::checked_sub(self.x[upper], self.x[lower])? as u128;
        let dx = math::checked_sub(ratio, self.x[lower])? as u128;
        if self.y[upper] >= self.y[lower] {
            let rise = math::checked_sub(self.y[upper], self.y[lower])? as u128;
            math::checked_as_u64(math::checked_add(
                self.y[lower] as u128,
                math::checked_div(math::checked_mul(rise, dx)?, run)?,
            )?)
        } else {
            let fall = math::checked_sub(self.y[lower], self.y[upper])? as u128;
            math::checked_as_u64(math::checked_sub(
                self.y[lower] as u128,
                math::checked_div(math::checked_mul(fall, dx)?, run)?,
            )?)
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const RATE: u64 = 1_000_000_000;

    fn curve() -> PiecewiseCurve {
        PiecewiseCurve {
            x: vec![0, RATE / 2, RATE],
            y: vec![8_000_000, 2_000_000, 4_000_000],
        }
    }

    #[test]
    fn test_clamps_outside_range() {
        let c = curve();
        assert_eq!(c.interpolate(0).unwrap(), 8_000_000);
        assert_eq!(c.interpolate(2 * RATE).unwrap(), 4_000_000);
    }

    #[test]
    fn test_exact_at_breakpoints() {
        let c = curve();
        assert_eq!(c.interpolate(RATE / 2).unwrap(), 2_000_000);
        assert_eq!(c.interpolate(RATE).unwrap(), 4_000_000);
    }

    #[test]
    fn test_interpolates_between_breakpoints() {
        let c = curve();
        // halfway down the falling segment
        assert_eq!(c.interpolate(RATE / 4).unwrap(), 5_000_000);
        // halfway up the rising segment
        assert_eq!(c.interpolate(3 * RATE / 4).unwrap(), 3_000_000);
    }

    #[test]
    fn test_single_point_curve() {
        let c = PiecewiseCurve {
            x: vec![RATE / 2],
            y: vec![1_000_000],
        };
        assert!(c.validate());
        assert_eq!(c.interpolate(0).unwrap(), 1_000_000);
        assert_eq!(c.interpolate(RATE).unwrap(), 1_000_000);
    }

    #[test]
    fn test_validate_rejects_malformed() {
        assert!(!PiecewiseCurve {
            x: vec![],
            y: vec![],
        }
        .validate());
        assert!(!PiecewiseCurve {
            x: vec![0, 1],
            y: vec![0],
        }
        .validate());
        assert!(!PiecewiseCurve {
            x: vec![5, 1],
            y: vec![0, 0],
        }
        .validate());
        assert!(!PiecewiseCurve {
            x: vec![0],
            y: vec![RATE + 1],
        }
        .validate());
        assert!(curve().validate());
    }

    #[test]
    fn test_repeated_threshold() {
        // duplicate x is allowed (non-decreasing); left value wins below,
        // right value at and above
        let c = PiecewiseCurve {
            x: vec![0, RATE / 2, RATE / 2, RATE],
            y: vec![0, 1_000, 5_000, 5_000],
        };
        assert!(c.validate());
        assert_eq!(c.interpolate(RATE / 2).unwrap(), 5_000);
        assert_eq!(c.interpolate(RATE / 2 - 1).unwrap(), 999);
    }
}
