#![forbid(unsafe_code)]

//! Coordinate transforms between scroll offsets, sections, and canvas positions.
//!
//! Every function here is pure and total: identical inputs always produce
//! identical outputs and no input panics. The animator samples its frames
//! through [`interpolate_at`], which is what makes animation output
//! deterministic under a controlled clock.
//!
//! # Invariants
//!
//! 1. `interpolate_path(from, to, ..)` starts exactly at `from` and ends
//!    exactly at `to`, for every movement kind and sample count.
//! 2. `clamp_to_bounds` output always satisfies the constraints, and
//!    `was_clamped` is false only when the input already did.
//! 3. `canvas_to_scroll` never returns a negative offset.

use std::f64::consts::PI;

use crate::animation::MovementKind;
use crate::geometry::{BoundsConstraints, CanvasPosition, SECTION_SPAN};
use crate::section::{GridCoord, GridLayout, SectionId, SectionTable};

/// Fraction by which a dolly zoom pulls back at mid-flight.
pub const DOLLY_DIP: f64 = 0.15;

/// Smallest sample count `interpolate_path` will produce.
pub const MIN_PATH_SAMPLES: usize = 2;

/// Map a document scroll offset onto the vertical section stack.
///
/// One `section_height` of scrolling advances the camera by one section span.
#[must_use]
pub fn scroll_to_canvas(scroll_offset: f64, section_height: f64) -> CanvasPosition {
    if !scroll_offset.is_finite() || !section_height.is_finite() || section_height <= 0.0 {
        return CanvasPosition::ORIGIN;
    }
    let offset = scroll_offset.max(0.0);
    CanvasPosition::new(0.0, offset / section_height * SECTION_SPAN, 1.0)
}

/// Inverse of [`scroll_to_canvas`]: the document offset showing `position`.
#[must_use]
pub fn canvas_to_scroll(position: &CanvasPosition, section_height: f64) -> f64 {
    if !position.y.is_finite() || !section_height.is_finite() || section_height <= 0.0 {
        return 0.0;
    }
    (position.y / SECTION_SPAN * section_height).max(0.0)
}

/// Grid cell of `section` under `layout`.
#[must_use]
pub fn section_grid_coordinates(section: SectionId, layout: GridLayout) -> GridCoord {
    let i = section.index() as u32;
    let cols = layout.columns();
    GridCoord::new(i % cols, i / cols)
}

/// Canonical camera position of `section` under `layout` at baseline zoom.
#[must_use]
pub fn section_canvas_position(section: SectionId, layout: GridLayout) -> CanvasPosition {
    section_grid_coordinates(section, layout).canvas_origin()
}

/// Single interpolated sample between `from` and `to`.
///
/// `eased_t` is progress after easing; it is clamped to `[0, 1]`. x and y
/// move linearly in eased time while scale moves geometrically, so equal
/// time steps feel like equal zoom steps. A dolly zoom additionally pulls
/// the scale back by up to [`DOLLY_DIP`] mid-flight.
#[must_use]
pub fn interpolate_at(
    from: &CanvasPosition,
    to: &CanvasPosition,
    kind: MovementKind,
    eased_t: f64,
) -> CanvasPosition {
    let t = if eased_t.is_nan() { 0.0 } else { eased_t.clamp(0.0, 1.0) };
    if t <= 0.0 {
        return *from;
    }
    if t >= 1.0 {
        return *to;
    }

    let x = lerp(from.x, to.x, t);
    let y = lerp(from.y, to.y, t);
    let mut scale = if from.scale > 0.0 && to.scale > 0.0 {
        from.scale * (to.scale / from.scale).powf(t)
    } else {
        lerp(from.scale, to.scale, t)
    };
    if kind == MovementKind::DollyZoom {
        scale *= 1.0 - DOLLY_DIP * (PI * t).sin();
    }
    CanvasPosition::new(x, y, scale)
}

/// Sample the path of a `kind` movement from `from` to `to`.
///
/// Produces `max(sample_count, 2)` positions at evenly spaced times, eased
/// with the kind's default curve. The first sample is `from` and the last is
/// `to`.
#[must_use]
pub fn interpolate_path(
    from: &CanvasPosition,
    to: &CanvasPosition,
    kind: MovementKind,
    sample_count: usize,
) -> Vec<CanvasPosition> {
    let n = sample_count.max(MIN_PATH_SAMPLES);
    let easing = kind.default_easing();
    let last = (n - 1) as f64;
    (0..n)
        .map(|i| {
            if i == 0 {
                *from
            } else if i == n - 1 {
                *to
            } else {
                interpolate_at(from, to, kind, easing.apply(i as f64 / last))
            }
        })
        .collect()
}

/// Outcome of [`clamp_to_bounds`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClampResult {
    /// The position, moved inside the constraints.
    pub position: CanvasPosition,
    /// Whether any component had to change.
    pub was_clamped: bool,
}

/// Clamp `position` into `constraints`.
///
/// NaN components are replaced with the lower limit of their range and
/// infinities with the nearest limit; both count as clamping.
#[must_use]
pub fn clamp_to_bounds(position: &CanvasPosition, constraints: &BoundsConstraints) -> ClampResult {
    let x = clamp_component(position.x, constraints.x_floor(), constraints.x_ceil());
    let y = clamp_component(position.y, constraints.y_floor(), constraints.y_ceil());
    let scale = clamp_component(position.scale, constraints.scale.min, constraints.scale.max);
    let clamped = CanvasPosition::new(x, y, scale);
    let was_clamped = !(position.x == x && position.y == y && position.scale == scale);
    ClampResult {
        position: clamped,
        was_clamped,
    }
}

/// Closest section to `position` on the x/y plane, with its distance.
#[must_use]
pub fn nearest_section(position: &CanvasPosition, table: &SectionTable) -> (SectionId, f64) {
    let mut best = (SectionId::Capture, f64::INFINITY);
    for entry in table.iter() {
        let d = entry.position.planar_distance(position);
        if d < best.1 {
            best = (entry.id, d);
        }
    }
    best
}

#[inline]
fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

#[inline]
fn clamp_component(v: f64, lo: f64, hi: f64) -> f64 {
    // f64::clamp panics on inverted or NaN limits.
    if !(lo <= hi) {
        return if lo.is_nan() { v } else { lo };
    }
    if v.is_nan() { lo } else { v.clamp(lo, hi) }
}
