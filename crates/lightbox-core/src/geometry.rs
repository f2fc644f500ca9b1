#![forbid(unsafe_code)]

//! Geometric primitives for the canvas.
//!
//! Canvas space is measured in *section spans*: a section sitting at grid
//! cell `(gx, gy)` is centred on `(gx * SECTION_SPAN, gy * SECTION_SPAN)`.
//! Screen space (pointer coordinates, viewport size) is measured in CSS
//! pixels.

/// Canvas units covered by one section along either axis.
pub const SECTION_SPAN: f64 = 100.0;

/// Tolerance used when comparing canvas positions for equality.
pub const POSITION_EPSILON: f64 = 1e-6;

/// The `{x, y, scale}` coordinate describing what part of the canvas is in view.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CanvasPosition {
    /// Horizontal offset from the canvas origin.
    pub x: f64,
    /// Vertical offset from the canvas origin.
    pub y: f64,
    /// Zoom multiplier (1.0 = baseline).
    pub scale: f64,
}

impl CanvasPosition {
    /// The canvas origin at baseline zoom.
    pub const ORIGIN: Self = Self::new(0.0, 0.0, 1.0);

    /// Create a new position.
    #[inline]
    #[must_use]
    pub const fn new(x: f64, y: f64, scale: f64) -> Self {
        Self { x, y, scale }
    }

    /// Whether every component is a finite number.
    #[inline]
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.scale.is_finite()
    }

    /// Component-wise comparison within [`POSITION_EPSILON`].
    #[must_use]
    pub fn approx_eq(&self, other: &Self) -> bool {
        (self.x - other.x).abs() <= POSITION_EPSILON
            && (self.y - other.y).abs() <= POSITION_EPSILON
            && (self.scale - other.scale).abs() <= POSITION_EPSILON
    }

    /// Planar (x/y) distance to another position, ignoring scale.
    #[inline]
    #[must_use]
    pub fn planar_distance(&self, other: &Self) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// Translate by a canvas-space delta, keeping scale.
    #[inline]
    #[must_use]
    pub fn offset(&self, dx: f64, dy: f64) -> Self {
        Self::new(self.x + dx, self.y + dy, self.scale)
    }

    /// Replace the scale, keeping x/y.
    #[inline]
    #[must_use]
    pub fn with_scale(&self, scale: f64) -> Self {
        Self::new(self.x, self.y, scale)
    }
}

impl Default for CanvasPosition {
    fn default() -> Self {
        Self::ORIGIN
    }
}

/// A point in screen space (pixels).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Point {
    /// Horizontal pixel coordinate.
    pub x: f64,
    /// Vertical pixel coordinate.
    pub y: f64,
}

impl Point {
    /// Create a new point.
    #[inline]
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    #[inline]
    #[must_use]
    pub fn distance(&self, other: Self) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// Midpoint between two points.
    #[inline]
    #[must_use]
    pub fn midpoint(&self, other: Self) -> Self {
        Self::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }
}

/// Allowed zoom range.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScaleLimits {
    /// Smallest permitted scale (must be positive).
    pub min: f64,
    /// Largest permitted scale.
    pub max: f64,
}

impl ScaleLimits {
    /// Create a new range.
    #[must_use]
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Whether `scale` lies inside the range.
    #[inline]
    #[must_use]
    pub fn contains(&self, scale: f64) -> bool {
        scale >= self.min && scale <= self.max
    }
}

impl Default for ScaleLimits {
    fn default() -> Self {
        Self::new(0.25, 4.0)
    }
}

/// Viewport bounds, padding, and scale limits used to clamp positions.
///
/// A position is valid when `x ∈ [min_x - padding, max_x + padding]`,
/// `y ∈ [min_y - padding, max_y + padding]` and its scale is inside `scale`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BoundsConstraints {
    /// Left edge of the navigable region.
    pub min_x: f64,
    /// Right edge of the navigable region.
    pub max_x: f64,
    /// Top edge of the navigable region.
    pub min_y: f64,
    /// Bottom edge of the navigable region.
    pub max_y: f64,
    /// Extra slack allowed past each edge.
    pub padding: f64,
    /// Zoom range.
    pub scale: ScaleLimits,
}

impl BoundsConstraints {
    /// Lowest permitted x, padding included.
    #[inline]
    #[must_use]
    pub fn x_floor(&self) -> f64 {
        self.min_x - self.padding
    }

    /// Highest permitted x, padding included.
    #[inline]
    #[must_use]
    pub fn x_ceil(&self) -> f64 {
        self.max_x + self.padding
    }

    /// Lowest permitted y, padding included.
    #[inline]
    #[must_use]
    pub fn y_floor(&self) -> f64 {
        self.min_y - self.padding
    }

    /// Highest permitted y, padding included.
    #[inline]
    #[must_use]
    pub fn y_ceil(&self) -> f64 {
        self.max_y + self.padding
    }

    /// Whether the position already satisfies every constraint.
    #[must_use]
    pub fn contains(&self, position: &CanvasPosition) -> bool {
        position.is_finite()
            && position.x >= self.x_floor()
            && position.x <= self.x_ceil()
            && position.y >= self.y_floor()
            && position.y <= self.y_ceil()
            && self.scale.contains(position.scale)
    }
}

impl Default for BoundsConstraints {
    fn default() -> Self {
        Self {
            min_x: 0.0,
            max_x: 5.0 * SECTION_SPAN,
            min_y: 0.0,
            max_y: 5.0 * SECTION_SPAN,
            padding: 25.0,
            scale: ScaleLimits::default(),
        }
    }
}

/// Size of the host viewport in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ViewportSize {
    /// Width in pixels.
    pub width: f64,
    /// Height in pixels.
    pub height: f64,
}

impl ViewportSize {
    /// Create a new viewport size.
    #[must_use]
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Whether both dimensions are finite and positive.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }

    /// Convert a screen-space drag delta into a canvas-space camera delta.
    ///
    /// Dragging content right moves the camera left, so the sign flips.
    /// Larger scales make the same drag cover less canvas.
    #[must_use]
    pub fn screen_delta_to_canvas(&self, dx: f64, dy: f64, scale: f64) -> (f64, f64) {
        if !self.is_valid() || !scale.is_finite() || scale <= 0.0 {
            return (0.0, 0.0);
        }
        (
            -dx / self.width * SECTION_SPAN / scale,
            -dy / self.height * SECTION_SPAN / scale,
        )
    }
}

impl Default for ViewportSize {
    fn default() -> Self {
        Self::new(1280.0, 720.0)
    }
}
