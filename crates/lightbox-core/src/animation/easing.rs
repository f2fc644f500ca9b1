#![forbid(unsafe_code)]

//! Easing curves for camera movements.
//!
//! Every curve maps `t ∈ [0, 1]` to a progress value with `ease(0) == 0` and
//! `ease(1) == 1` exactly. Inputs outside `[0, 1]` (and NaN) are clamped
//! first, so curves are total.

use std::f64::consts::PI;

/// Newton iterations before falling back to bisection in the bezier solver.
const NEWTON_ITERATIONS: usize = 8;
/// Bisection iterations for the bezier solver fallback.
const BISECTION_ITERATIONS: usize = 32;
/// Solver tolerance on the x axis.
const SOLVE_EPSILON: f64 = 1e-7;

/// Identifier of a timing curve.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Easing {
    /// Constant velocity.
    Linear,
    /// Quadratic acceleration.
    EaseIn,
    /// Quadratic deceleration.
    EaseOut,
    /// Quadratic acceleration then deceleration.
    EaseInOut,
    /// Cubic acceleration.
    EaseInCubic,
    /// Cubic deceleration.
    EaseOutCubic,
    /// Cubic acceleration then deceleration.
    EaseInOutCubic,
    /// Exponential deceleration.
    EaseOutExpo,
    /// Sinusoidal acceleration then deceleration.
    EaseInOutSine,
    /// CSS-style `cubic-bezier(x1, y1, x2, y2)`; x control points are clamped to `[0, 1]`.
    CubicBezier(f64, f64, f64, f64),
}

impl Easing {
    /// The "cinematic" dolly curve used for primary pans.
    pub const CINEMATIC: Self = Self::CubicBezier(0.25, 0.46, 0.45, 0.94);
    /// Slow-in, slow-out curve used for dramatic moves.
    pub const DRAMATIC: Self = Self::CubicBezier(0.7, 0.0, 0.3, 1.0);

    /// Evaluate the curve at `t`.
    #[must_use]
    pub fn apply(self, t: f64) -> f64 {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        if t <= 0.0 {
            return 0.0;
        }
        if t >= 1.0 {
            return 1.0;
        }
        match self {
            Self::Linear => t,
            Self::EaseIn => t * t,
            Self::EaseOut => t * (2.0 - t),
            Self::EaseInOut => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    -1.0 + (4.0 - 2.0 * t) * t
                }
            }
            Self::EaseInCubic => t * t * t,
            Self::EaseOutCubic => {
                let inv = 1.0 - t;
                1.0 - inv * inv * inv
            }
            Self::EaseInOutCubic => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    let k = -2.0 * t + 2.0;
                    1.0 - k * k * k / 2.0
                }
            }
            Self::EaseOutExpo => 1.0 - 2f64.powf(-10.0 * t),
            Self::EaseInOutSine => -((PI * t).cos() - 1.0) / 2.0,
            Self::CubicBezier(x1, y1, x2, y2) => {
                CubicBezier::new(x1, y1, x2, y2).solve(t)
            }
        }
    }

    /// Stable name for logs.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Linear => "linear",
            Self::EaseIn => "ease_in",
            Self::EaseOut => "ease_out",
            Self::EaseInOut => "ease_in_out",
            Self::EaseInCubic => "ease_in_cubic",
            Self::EaseOutCubic => "ease_out_cubic",
            Self::EaseInOutCubic => "ease_in_out_cubic",
            Self::EaseOutExpo => "ease_out_expo",
            Self::EaseInOutSine => "ease_in_out_sine",
            Self::CubicBezier(..) => "cubic_bezier",
        }
    }

    /// Whether all parameters are finite.
    #[must_use]
    pub fn is_valid(self) -> bool {
        match self {
            Self::CubicBezier(x1, y1, x2, y2) => {
                x1.is_finite() && y1.is_finite() && x2.is_finite() && y2.is_finite()
            }
            _ => true,
        }
    }
}

/// Unit cubic bezier with endpoints `(0,0)` and `(1,1)`.
#[derive(Debug, Clone, Copy)]
struct CubicBezier {
    cx: f64,
    bx: f64,
    ax: f64,
    cy: f64,
    by: f64,
    ay: f64,
}

impl CubicBezier {
    fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        let x1 = x1.clamp(0.0, 1.0);
        let x2 = x2.clamp(0.0, 1.0);
        let cx = 3.0 * x1;
        let bx = 3.0 * (x2 - x1) - cx;
        let ax = 1.0 - cx - bx;
        let cy = 3.0 * y1;
        let by = 3.0 * (y2 - y1) - cy;
        let ay = 1.0 - cy - by;
        Self { cx, bx, ax, cy, by, ay }
    }

    fn sample_x(&self, s: f64) -> f64 {
        ((self.ax * s + self.bx) * s + self.cx) * s
    }

    fn sample_y(&self, s: f64) -> f64 {
        ((self.ay * s + self.by) * s + self.cy) * s
    }

    fn sample_dx(&self, s: f64) -> f64 {
        (3.0 * self.ax * s + 2.0 * self.bx) * s + self.cx
    }

    /// Find the curve parameter whose x equals `x`, then return its y.
    fn solve(&self, x: f64) -> f64 {
        let mut s = x;
        for _ in 0..NEWTON_ITERATIONS {
            let err = self.sample_x(s) - x;
            if err.abs() < SOLVE_EPSILON {
                return self.sample_y(s);
            }
            let d = self.sample_dx(s);
            if d.abs() < 1e-6 {
                break;
            }
            s = (s - err / d).clamp(0.0, 1.0);
        }

        let (mut lo, mut hi) = (0.0, 1.0);
        s = x;
        for _ in 0..BISECTION_ITERATIONS {
            let v = self.sample_x(s);
            if (v - x).abs() < SOLVE_EPSILON {
                break;
            }
            if v < x {
                lo = s;
            } else {
                hi = s;
            }
            s = (lo + hi) / 2.0;
        }
        self.sample_y(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [Easing; 11] = [
        Easing::Linear,
        Easing::EaseIn,
        Easing::EaseOut,
        Easing::EaseInOut,
        Easing::EaseInCubic,
        Easing::EaseOutCubic,
        Easing::EaseInOutCubic,
        Easing::EaseOutExpo,
        Easing::EaseInOutSine,
        Easing::CINEMATIC,
        Easing::DRAMATIC,
    ];

    #[test]
    fn endpoints_are_exact() {
        for easing in ALL {
            assert_eq!(easing.apply(0.0), 0.0, "{} at 0", easing.name());
            assert_eq!(easing.apply(1.0), 1.0, "{} at 1", easing.name());
        }
    }

    #[test]
    fn out_of_range_input_is_clamped() {
        for easing in ALL {
            assert_eq!(easing.apply(-3.0), 0.0);
            assert_eq!(easing.apply(7.5), 1.0);
            assert_eq!(easing.apply(f64::NAN), 0.0);
        }
    }

    #[test]
    fn curves_are_monotonic() {
        for easing in ALL {
            let mut prev = 0.0;
            for i in 0..=200 {
                let t = f64::from(i) / 200.0;
                let v = easing.apply(t);
                assert!(v >= prev - 1e-6, "{} not monotonic at t={t}", easing.name());
                prev = v;
            }
        }
    }

    #[test]
    fn linear_bezier_is_identity() {
        let linear = Easing::CubicBezier(0.0, 0.0, 1.0, 1.0);
        for i in 1..10 {
            let t = f64::from(i) / 10.0;
            assert!((linear.apply(t) - t).abs() < 1e-5);
        }
    }

    #[test]
    fn ease_in_out_is_symmetric() {
        let v = Easing::EaseInOut.apply(0.5);
        assert!((v - 0.5).abs() < 1e-9);
        let v = Easing::EaseInOutCubic.apply(0.5);
        assert!((v - 0.5).abs() < 1e-9);
    }

    #[test]
    fn non_finite_bezier_is_invalid() {
        assert!(!Easing::CubicBezier(f64::NAN, 0.0, 1.0, 1.0).is_valid());
        assert!(Easing::CINEMATIC.is_valid());
    }
}
