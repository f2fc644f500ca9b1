#![forbid(unsafe_code)]

//! Engine configuration.
//!
//! [`EngineConfig::default()`] describes the standard lightbox: six
//! photography-themed sections on a 3×2 grid, bounds `[0, 500]²` with
//! 25 units of padding, scale `[0.25, 4.0]`, a 1280×720 viewport, and the
//! default movement, performance, gesture, and key tables.
//!
//! # Loading
//!
//! With the `config-file` feature a [`ConfigFile`] overlay can be read from
//! TOML or JSON and applied on top of the defaults. Durations are written in
//! milliseconds.
//!
//! ```toml
//! layout = "row"
//! initial_section = "focus"
//!
//! [perf]
//! degrade_after = 20
//!
//! [navigation]
//! snap_radius = 40.0
//!
//! [[movements]]
//! kind = "pan_tilt"
//! duration_ms = 650
//! ```
//!
//! ```rust,ignore
//! let config = ConfigFile::from_toml_file("lightbox.toml")?.apply(EngineConfig::default())?;
//! ```

use std::fmt;
use std::rc::Rc;
use std::time::Duration;

use lightbox_core::animation::{AnimatorConfig, MovementTable};
use lightbox_core::geometry::{BoundsConstraints, CanvasPosition, ViewportSize};
use lightbox_core::gesture::GestureConfig;
use lightbox_core::navigator::KeyMap;
use lightbox_core::section::{GridLayout, SectionId, SectionTable};
use lightbox_core::transform::{MIN_PATH_SAMPLES, section_grid_coordinates};

use crate::arbiter::LayoutMode;
use crate::error::{ConfigError, Result};
use crate::history::DEFAULT_HISTORY_CAPACITY;
use crate::perf::PerfConfig;

// ---------------------------------------------------------------------------
// Reduced motion
// ---------------------------------------------------------------------------

/// Where the host's reduced-motion preference comes from.
pub trait ReducedMotionSource {
    /// Whether the user prefers reduced motion right now.
    fn prefers_reduced_motion(&self) -> bool;
}

impl ReducedMotionSource for bool {
    fn prefers_reduced_motion(&self) -> bool {
        *self
    }
}

impl<F: Fn() -> bool> ReducedMotionSource for F {
    fn prefers_reduced_motion(&self) -> bool {
        self()
    }
}

// ---------------------------------------------------------------------------
// EngineConfig
// ---------------------------------------------------------------------------

/// Everything a [`CanvasEngine`](crate::CanvasEngine) needs at construction.
#[derive(Clone)]
pub struct EngineConfig {
    /// Section entries, placed for `layout`.
    pub sections: SectionTable,
    /// Grid arrangement.
    pub layout: GridLayout,
    /// Initial presentation mode.
    pub layout_mode: LayoutMode,
    /// Position and scale limits.
    pub bounds: BoundsConstraints,
    /// Host viewport size in pixels.
    pub viewport: ViewportSize,
    /// Camera movement profiles.
    pub movements: MovementTable,
    /// Late tolerance and retarget limit.
    pub animator: AnimatorConfig,
    /// Tier thresholds.
    pub perf: PerfConfig,
    /// Gesture thresholds.
    pub gesture: GestureConfig,
    /// Keyboard bindings.
    pub keymap: KeyMap,
    /// Transitions kept in the history ring (default: 64).
    pub history_capacity: usize,
    /// Release speed (px/s) above which a pan coasts (default: 400).
    pub inertia_min_velocity: f64,
    /// How far ahead a coasting pan is projected (default: 250ms).
    pub inertia_time: Duration,
    /// Distance (canvas units) within which a released pan snaps to a
    /// section (default: 60).
    pub snap_radius: f64,
    /// Samples in a nominal-tier path preview (default: 60).
    pub path_samples: usize,
    /// Section the camera starts on.
    pub initial_section: SectionId,
    /// Start position; the initial section's position when `None`.
    pub initial_position: Option<CanvasPosition>,
    /// Host reduced-motion preference, read at construction.
    pub reduced_motion: Rc<dyn ReducedMotionSource>,
}

impl fmt::Debug for EngineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineConfig")
            .field("layout", &self.layout)
            .field("layout_mode", &self.layout_mode)
            .field("bounds", &self.bounds)
            .field("viewport", &self.viewport)
            .field("animator", &self.animator)
            .field("perf", &self.perf)
            .field("gesture", &self.gesture)
            .field("history_capacity", &self.history_capacity)
            .field("inertia_min_velocity", &self.inertia_min_velocity)
            .field("inertia_time", &self.inertia_time)
            .field("snap_radius", &self.snap_radius)
            .field("path_samples", &self.path_samples)
            .field("initial_section", &self.initial_section)
            .field("initial_position", &self.initial_position)
            .field(
                "reduced_motion",
                &self.reduced_motion.prefers_reduced_motion(),
            )
            .finish_non_exhaustive()
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sections: SectionTable::standard(),
            layout: GridLayout::default(),
            layout_mode: LayoutMode::default(),
            bounds: BoundsConstraints::default(),
            viewport: ViewportSize::default(),
            movements: MovementTable::default(),
            animator: AnimatorConfig::default(),
            perf: PerfConfig::default(),
            gesture: GestureConfig::default(),
            keymap: KeyMap::default(),
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            inertia_min_velocity: 400.0,
            inertia_time: Duration::from_millis(250),
            snap_radius: 60.0,
            path_samples: 60,
            initial_section: SectionId::Capture,
            initial_position: None,
            reduced_motion: Rc::new(false),
        }
    }
}

impl EngineConfig {
    /// Use `layout`, re-placing the sections on its cells.
    #[must_use]
    pub fn with_layout(mut self, layout: GridLayout) -> Self {
        self.sections = self.sections.relayout(layout);
        self.layout = layout;
        self
    }

    /// Start in `mode`.
    #[must_use]
    pub fn with_layout_mode(mut self, mode: LayoutMode) -> Self {
        self.layout_mode = mode;
        self
    }

    /// Start on `section`.
    #[must_use]
    pub fn with_initial_section(mut self, section: SectionId) -> Self {
        self.initial_section = section;
        self
    }

    /// Use a viewport of `width`×`height` pixels.
    #[must_use]
    pub fn with_viewport(mut self, width: f64, height: f64) -> Self {
        self.viewport = ViewportSize::new(width, height);
        self
    }

    /// Read reduced motion from `source`.
    #[must_use]
    pub fn with_reduced_motion(mut self, source: impl ReducedMotionSource + 'static) -> Self {
        self.reduced_motion = Rc::new(source);
        self
    }

    /// Where the camera starts.
    #[must_use]
    pub fn start_position(&self) -> CanvasPosition {
        self.initial_position
            .unwrap_or_else(|| self.sections.get(self.initial_section).position)
    }

    /// Check every parameter, failing on the first problem.
    pub fn validate(&self) -> Result<()> {
        if !self.viewport.is_valid() {
            return Err(ConfigError::Viewport {
                width: self.viewport.width,
                height: self.viewport.height,
            });
        }

        let b = &self.bounds;
        if ![b.min_x, b.max_x, b.min_y, b.max_y, b.padding]
            .iter()
            .all(|v| v.is_finite())
        {
            return Err(ConfigError::Bounds("bounds must be finite".into()));
        }
        if b.min_x > b.max_x || b.min_y > b.max_y {
            return Err(ConfigError::Bounds(format!(
                "x [{}, {}] and y [{}, {}] must be ordered",
                b.min_x, b.max_x, b.min_y, b.max_y
            )));
        }
        if b.padding < 0.0 {
            return Err(ConfigError::Bounds(format!(
                "padding must be >= 0, got {}",
                b.padding
            )));
        }
        let s = &b.scale;
        if !(s.min.is_finite() && s.max.is_finite() && s.min > 0.0 && s.min <= s.max) {
            return Err(ConfigError::ScaleLimits {
                min: s.min,
                max: s.max,
            });
        }

        for entry in self.sections.iter() {
            if entry.grid != section_grid_coordinates(entry.id, self.layout) {
                return Err(ConfigError::parameter(
                    "sections",
                    format!("{} is not placed on its {} cell", entry.id, self.layout.as_str()),
                ));
            }
            if !b.contains(&entry.position) {
                return Err(ConfigError::parameter(
                    "sections",
                    format!("{} lies outside the bounds", entry.id),
                ));
            }
        }

        let start = self.start_position();
        if !start.is_finite() || !b.contains(&start) {
            return Err(ConfigError::InitialPosition {
                x: start.x,
                y: start.y,
                scale: start.scale,
            });
        }

        let perf_errors = self.perf.validate();
        if !perf_errors.is_empty() {
            return Err(ConfigError::Perf(perf_errors.join("; ")));
        }

        let g = &self.gesture;
        if !(g.drag_threshold.is_finite() && g.drag_threshold >= 0.0) {
            return Err(ConfigError::parameter(
                "gesture.drag_threshold",
                format!("must be >= 0, got {}", g.drag_threshold),
            ));
        }
        if !(g.wheel_zoom_factor.is_finite() && g.wheel_zoom_factor > 0.0) {
            return Err(ConfigError::parameter(
                "gesture.wheel_zoom_factor",
                format!("must be > 0, got {}", g.wheel_zoom_factor),
            ));
        }
        if !(g.velocity_smoothing > 0.0 && g.velocity_smoothing <= 1.0) {
            return Err(ConfigError::parameter(
                "gesture.velocity_smoothing",
                format!("must be in (0, 1], got {}", g.velocity_smoothing),
            ));
        }
        if g.stall_timeout.is_zero() {
            return Err(ConfigError::parameter("gesture.stall_timeout", "must be > 0"));
        }

        if !self.keymap.is_valid() {
            return Err(ConfigError::parameter(
                "keymap",
                format!(
                    "step must be > 0 and zoom_factor > 1, got {} and {}",
                    self.keymap.step, self.keymap.zoom_factor
                ),
            ));
        }

        if !(self.inertia_min_velocity.is_finite() && self.inertia_min_velocity >= 0.0) {
            return Err(ConfigError::parameter(
                "inertia_min_velocity",
                format!("must be >= 0, got {}", self.inertia_min_velocity),
            ));
        }
        if !(self.snap_radius.is_finite() && self.snap_radius >= 0.0) {
            return Err(ConfigError::parameter(
                "snap_radius",
                format!("must be >= 0, got {}", self.snap_radius),
            ));
        }
        if self.path_samples < MIN_PATH_SAMPLES {
            return Err(ConfigError::parameter(
                "path_samples",
                format!("must be >= {MIN_PATH_SAMPLES}, got {}", self.path_samples),
            ));
        }
        if self.history_capacity == 0 {
            return Err(ConfigError::parameter("history_capacity", "must be > 0"));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// File overlay
// ---------------------------------------------------------------------------

#[cfg(feature = "config-file")]
pub use file::{
    CameraFileConfig, ConfigFile, GestureFileConfig, MovementOverride, NavigationFileConfig,
    PerfFileConfig,
};

#[cfg(feature = "config-file")]
mod file {
    use std::path::Path;
    use std::rc::Rc;
    use std::time::Duration;

    use lightbox_core::animation::{CameraMovementProfile, MovementKind, MovementTable};
    use lightbox_core::geometry::{BoundsConstraints, CanvasPosition, ViewportSize};
    use lightbox_core::section::{GridLayout, SectionId};
    use serde::{Deserialize, Serialize};

    use super::EngineConfig;
    use crate::arbiter::LayoutMode;
    use crate::error::Result;

    fn ms(value: f64) -> Duration {
        Duration::from_secs_f64(value.max(0.0) / 1_000.0)
    }

    /// Partial configuration read from disk. Absent fields keep the value
    /// of the config the overlay is applied to.
    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    #[serde(default)]
    pub struct ConfigFile {
        /// Grid arrangement.
        pub layout: Option<GridLayout>,
        /// Presentation mode.
        pub layout_mode: Option<LayoutMode>,
        /// Section the camera starts on.
        pub initial_section: Option<SectionId>,
        /// Explicit start position.
        pub initial_position: Option<CanvasPosition>,
        /// Position and scale limits.
        pub bounds: Option<BoundsConstraints>,
        /// Viewport size.
        pub viewport: Option<ViewportSize>,
        /// Fixed reduced-motion preference.
        pub reduced_motion: Option<bool>,
        /// History ring capacity.
        pub history_capacity: Option<usize>,
        /// Path preview samples.
        pub path_samples: Option<usize>,
        /// Animator tolerances.
        pub camera: CameraFileConfig,
        /// Tier thresholds.
        pub perf: PerfFileConfig,
        /// Gesture thresholds.
        pub gesture: GestureFileConfig,
        /// Keyboard and release behaviour.
        pub navigation: NavigationFileConfig,
        /// Per-kind movement overrides.
        pub movements: Vec<MovementOverride>,
    }

    /// Animator overrides.
    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    #[serde(default)]
    pub struct CameraFileConfig {
        /// Late tolerance in milliseconds.
        pub late_tolerance_ms: Option<f64>,
        /// Retarget limit under reduced fidelity.
        pub max_retargets: Option<u32>,
    }

    /// Performance monitor overrides.
    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    #[serde(default)]
    pub struct PerfFileConfig {
        /// Rolling window size.
        pub window: Option<usize>,
        /// Slow streak before degrading.
        pub degrade_after: Option<u32>,
        /// Fast streak before recovering.
        pub recover_after: Option<u32>,
        /// Degraded threshold in milliseconds.
        pub degraded_frame_time_ms: Option<f64>,
        /// Severe threshold in milliseconds.
        pub severe_frame_time_ms: Option<f64>,
        /// Recovery threshold in milliseconds.
        pub recovered_frame_time_ms: Option<f64>,
        /// Idle gap in milliseconds.
        pub idle_gap_ms: Option<f64>,
    }

    /// Gesture recognizer overrides.
    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    #[serde(default)]
    pub struct GestureFileConfig {
        /// Drag threshold in pixels.
        pub drag_threshold: Option<f64>,
        /// Stall timeout in milliseconds.
        pub stall_timeout_ms: Option<f64>,
        /// Zoom per wheel pixel.
        pub wheel_zoom_factor: Option<f64>,
        /// Velocity smoothing weight.
        pub velocity_smoothing: Option<f64>,
        /// Momentum window in milliseconds.
        pub momentum_window_ms: Option<f64>,
    }

    /// Keyboard step and gesture release overrides.
    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    #[serde(default)]
    pub struct NavigationFileConfig {
        /// Canvas units per arrow key press.
        pub step: Option<f64>,
        /// Zoom multiplier per zoom key press.
        pub zoom_factor: Option<f64>,
        /// Coasting threshold in px/s.
        pub inertia_min_velocity: Option<f64>,
        /// Coasting projection in milliseconds.
        pub inertia_time_ms: Option<f64>,
        /// Snap radius in canvas units.
        pub snap_radius: Option<f64>,
    }

    /// Replacement timing for one movement kind.
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct MovementOverride {
        /// Kind to override.
        pub kind: MovementKind,
        /// New duration in milliseconds.
        pub duration_ms: Option<f64>,
        /// New GPU hint.
        pub gpu_accelerated: Option<bool>,
    }

    impl ConfigFile {
        /// Load from a TOML string.
        pub fn from_toml_str(s: &str) -> Result<Self> {
            Ok(toml::from_str(s)?)
        }

        /// Load from a TOML file on disk.
        pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
            let content = std::fs::read_to_string(path.as_ref())?;
            Self::from_toml_str(&content)
        }

        /// Load from a JSON string.
        pub fn from_json_str(s: &str) -> Result<Self> {
            Ok(serde_json::from_str(s)?)
        }

        /// Load from a JSON file on disk.
        pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
            let content = std::fs::read_to_string(path.as_ref())?;
            Self::from_json_str(&content)
        }

        /// Apply this overlay to `base` and validate the result.
        pub fn apply(self, base: EngineConfig) -> Result<EngineConfig> {
            let mut config = base;
            if let Some(layout) = self.layout {
                config = config.with_layout(layout);
            }
            if let Some(mode) = self.layout_mode {
                config.layout_mode = mode;
            }
            if let Some(section) = self.initial_section {
                config.initial_section = section;
            }
            if self.initial_position.is_some() {
                config.initial_position = self.initial_position;
            }
            if let Some(bounds) = self.bounds {
                config.bounds = bounds;
            }
            if let Some(viewport) = self.viewport {
                config.viewport = viewport;
            }
            if let Some(reduced) = self.reduced_motion {
                config.reduced_motion = Rc::new(reduced);
            }
            if let Some(capacity) = self.history_capacity {
                config.history_capacity = capacity;
            }
            if let Some(samples) = self.path_samples {
                config.path_samples = samples;
            }

            let cam = self.camera;
            if let Some(v) = cam.late_tolerance_ms {
                config.animator.late_tolerance = ms(v);
            }
            if let Some(v) = cam.max_retargets {
                config.animator.max_retargets = v;
            }

            let perf = self.perf;
            if let Some(v) = perf.window {
                config.perf.window = v;
            }
            if let Some(v) = perf.degrade_after {
                config.perf.degrade_after = v;
            }
            if let Some(v) = perf.recover_after {
                config.perf.recover_after = v;
            }
            if let Some(v) = perf.degraded_frame_time_ms {
                config.perf.degraded_frame_time = ms(v);
            }
            if let Some(v) = perf.severe_frame_time_ms {
                config.perf.severe_frame_time = ms(v);
            }
            if let Some(v) = perf.recovered_frame_time_ms {
                config.perf.recovered_frame_time = ms(v);
            }
            if let Some(v) = perf.idle_gap_ms {
                config.perf.idle_gap = ms(v);
            }

            let g = self.gesture;
            if let Some(v) = g.drag_threshold {
                config.gesture.drag_threshold = v;
            }
            if let Some(v) = g.stall_timeout_ms {
                config.gesture.stall_timeout = ms(v);
            }
            if let Some(v) = g.wheel_zoom_factor {
                config.gesture.wheel_zoom_factor = v;
            }
            if let Some(v) = g.velocity_smoothing {
                config.gesture.velocity_smoothing = v;
            }
            if let Some(v) = g.momentum_window_ms {
                config.gesture.momentum_window = ms(v);
            }

            let nav = self.navigation;
            if let Some(v) = nav.step {
                config.keymap.step = v;
            }
            if let Some(v) = nav.zoom_factor {
                config.keymap.zoom_factor = v;
            }
            if let Some(v) = nav.inertia_min_velocity {
                config.inertia_min_velocity = v;
            }
            if let Some(v) = nav.inertia_time_ms {
                config.inertia_time = ms(v);
            }
            if let Some(v) = nav.snap_radius {
                config.snap_radius = v;
            }

            if !self.movements.is_empty() {
                let profiles: Vec<CameraMovementProfile> = config
                    .movements
                    .iter()
                    .map(|profile| {
                        let mut profile = *profile;
                        for o in self.movements.iter().filter(|o| o.kind == profile.kind) {
                            if let Some(v) = o.duration_ms {
                                profile.duration = ms(v);
                            }
                            if let Some(v) = o.gpu_accelerated {
                                profile.gpu_accelerated = v;
                            }
                        }
                        profile
                    })
                    .collect();
                config.movements = MovementTable::new(profiles)?;
            }

            config.validate()?;
            Ok(config)
        }
    }
}
