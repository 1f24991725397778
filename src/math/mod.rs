// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Trigonometry for the imaging kernel.
//!
//! Two backends implement [`Trig`]: [`StdTrig`] (library precision) and
//! [`FastTrig`] (polynomial approximations). Which one the imaging engine uses
//! is decided when the crate is compiled; [`ActiveTrig`] is [`FastTrig`] when
//! the "fast-math" feature is enabled. Both are always compiled so they can be
//! compared against each other.


use std::f32::consts::{FRAC_2_PI, FRAC_PI_2, PI};

use num_complex::Complex32;

/// Single-precision trigonometric primitives used by the imaging kernel.
pub trait Trig {
    /// A short name to report in logs.
    const NAME: &'static str;

    /// Returns `(sin(x), cos(x))`.
    fn sin_cos(x: f32) -> (f32, f32);

    /// Inverse tangent. y comes before x, like the C function.
    fn atan2(y: f32, x: f32) -> f32;

    #[inline]
    fn sin(x: f32) -> f32 {
        Self::sin_cos(x).0
    }

    #[inline]
    fn cos(x: f32) -> f32 {
        Self::sin_cos(x).1
    }

    /// Complex exponential of a purely imaginary argument, e^{ix}.
    #[inline]
    fn cexp(x: f32) -> Complex32 {
        let (im, re) = Self::sin_cos(x);
        Complex32::new(re, im)
    }
}

/// Trigonometry straight from the standard library.
#[derive(Debug, Clone, Copy)]
pub struct StdTrig;

impl Trig for StdTrig {
    const NAME: &'static str = "standard";

    #[inline]
    fn sin_cos(x: f32) -> (f32, f32) {
        x.sin_cos()
    }

    #[inline]
    fn atan2(y: f32, x: f32) -> f32 {
        y.atan2(x)
    }
}

/// Minimax polynomial trigonometry. Arguments are reduced to [-π/4, π/4] with
/// a two-part π/2 and the quadrant selects the sign and function. Absolute
/// error is below 1e-5 for |x| <= 100; NaN and infinite inputs produce NaN.
#[derive(Debug, Clone, Copy)]
pub struct FastTrig;

// π/2 split into its f32 value and the remainder.
const PIO2_HI: f32 = 1.570_796_4;
const PIO2_LO: f32 = -4.371_139e-8;

// sin(x) ≈ x + x³(S1 + x²(S2 + x²S3)) on [-π/4, π/4].
const S1: f32 = -1.666_665_5e-1;
const S2: f32 = 8.332_161e-3;
const S3: f32 = -1.951_529_6e-4;

// cos(x) ≈ 1 - x²/2 + x⁴(C1 + x²(C2 + x²C3)) on [-π/4, π/4].
const C1: f32 = 4.166_664_6e-2;
const C2: f32 = -1.388_731_6e-3;
const C3: f32 = 2.443_315_7e-5;

// atan(t) ≈ t(A1 + t²(A3 + t²(A5 + t²(A7 + t²A9)))) on [0, 1].
const A1: f32 = 0.999_866;
const A3: f32 = -0.330_299_5;
const A5: f32 = 0.180_141;
const A7: f32 = -0.085_133;
const A9: f32 = 0.020_835_1;

#[inline(always)]
fn sin_poly(r: f32) -> f32 {
    let r2 = r * r;
    r + r * r2 * (S1 + r2 * (S2 + r2 * S3))
}

#[inline(always)]
fn cos_poly(r: f32) -> f32 {
    let r2 = r * r;
    1.0 - 0.5 * r2 + r2 * r2 * (C1 + r2 * (C2 + r2 * C3))
}

impl Trig for FastTrig {
    const NAME: &'static str = "fast";

    #[inline]
    fn sin_cos(x: f32) -> (f32, f32) {
        let q = (x * FRAC_2_PI).round();
        let r = (x - q * PIO2_HI) - q * PIO2_LO;
        let s = sin_poly(r);
        let c = cos_poly(r);
        // Negative quadrants wrap correctly in two's complement.
        match (q as i32) & 3 {
            0 => (s, c),
            1 => (c, -s),
            2 => (-s, -c),
            _ => (-c, s),
        }
    }

    #[inline]
    fn atan2(y: f32, x: f32) -> f32 {
        let ax = x.abs();
        let ay = y.abs();
        let (big, small) = if ax > ay { (ax, ay) } else { (ay, ax) };
        if big == 0.0 {
            return if x < 0.0 {
                PI.copysign(y)
            } else {
                0.0_f32.copysign(y)
            };
        }

        let t = small / big;
        let t2 = t * t;
        let mut r = t * (A1 + t2 * (A3 + t2 * (A5 + t2 * (A7 + t2 * A9))));
        if ay > ax {
            r = FRAC_PI_2 - r;
        }
        if x < 0.0 {
            r = PI - r;
        }
        r.copysign(y)
    }
}

cfg_if::cfg_if! {
    if #[cfg(feature = "fast-math")] {
        /// The trigonometry backend used by the imaging engine in this build.
        pub type ActiveTrig = FastTrig;
    } else {
        /// The trigonometry backend used by the imaging engine in this build.
        pub type ActiveTrig = StdTrig;
    }
}

/// The median of a slice, or `None` if it is empty. The two central values
/// are averaged for even lengths. The slice is reordered. NaNs sort last, as
/// per [`f32::total_cmp`].
pub(crate) fn median_mut(values: &mut [f32]) -> Option<f32> {
    let n = values.len();
    if n == 0 {
        return None;
    }
    let mid = n / 2;
    let (lower, upper, _) = values.select_nth_unstable_by(mid, f32::total_cmp);
    let upper = *upper;
    if n % 2 == 1 {
        Some(upper)
    } else {
        let lower = lower
            .iter()
            .copied()
            .max_by(f32::total_cmp)
            .unwrap_or(upper);
        Some((lower + upper) / 2.0)
    }
}
