#![forbid(unsafe_code)]

//! Gesture recognition: turns raw pointer, touch, and wheel records into
//! pan and pinch gestures.
//!
//! [`GestureRecognizer`] is a stateful processor. Feed every [`InputEvent`]
//! to [`process`](GestureRecognizer::process) and call
//! [`check_stall`](GestureRecognizer::check_stall) once per tick.
//!
//! # State Machine
//!
//! - **Pointer pan**: mouse/pen down arms a pan; it starts once the pointer
//!   travels `drag_threshold` pixels and ends on pointer up.
//! - **Touch pan**: the same for a single finger.
//! - **Pinch**: two fingers. `scale_ratio` is the current finger distance over
//!   the distance when the pinch began. Deltas track the finger midpoint.
//! - **Wheel**: plain wheel pans, Ctrl/Super + wheel zooms. Wheel sessions
//!   have no explicit end and close through the stall timeout.
//!
//! # Invariants
//!
//! 1. Every `Start` is followed by exactly one `End` of the same kind before
//!    the next `Start`.
//! 2. A second finger during a touch pan ends the pan, then starts a pinch.
//! 3. Only the first two fingers count; later fingers are ignored.
//! 4. Lifting one pinch finger ends the pinch. The remaining finger does not
//!    start a pan until every finger has lifted.
//! 5. A disabled recognizer emits nothing.
//!
//! # Failure Modes
//!
//! - Records with non-finite coordinates or deltas are dropped.
//! - A gesture with no input for `stall_timeout` ends with zero velocity.
//!   Contacts still held re-arm, so further movement starts a fresh gesture.

use std::time::Duration;

use web_time::Instant;

use crate::event::{
    InputEvent, KeyCode, KeyEventKind, PointerEvent, PointerPhase, PointerType, Touch, TouchEvent,
    TouchPhase, WheelEvent,
};
use crate::geometry::Point;

/// Pinch distances are floored to this many pixels so the ratio stays finite.
const MIN_PINCH_DISTANCE: f64 = 1.0;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Thresholds and timeouts for gesture recognition.
#[derive(Debug, Clone, PartialEq)]
pub struct GestureConfig {
    /// Distance (px) a contact must travel before a pan starts (default: 3).
    pub drag_threshold: f64,
    /// Idle time after which an active gesture is ended (default: 300ms).
    pub stall_timeout: Duration,
    /// Minimum interval between emitted updates; zero disables (default: 0).
    pub input_throttle: Duration,
    /// Zoom per wheel pixel: `ratio = exp(-dy * factor)` (default: 0.002).
    pub wheel_zoom_factor: f64,
    /// Weight of the newest sample in the velocity average (default: 0.3).
    pub velocity_smoothing: f64,
    /// A release later than this after the last movement carries no
    /// velocity (default: 100ms).
    pub momentum_window: Duration,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            drag_threshold: 3.0,
            stall_timeout: Duration::from_millis(300),
            input_throttle: Duration::ZERO,
            wheel_zoom_factor: 0.002,
            velocity_smoothing: 0.3,
            momentum_window: Duration::from_millis(100),
        }
    }
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// What kind of gesture is in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GestureKind {
    /// Translation (drag, single finger, plain wheel).
    Pan,
    /// Scaling (two fingers, Ctrl/Super + wheel).
    Pinch,
}

impl GestureKind {
    /// Stable name for logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pan => "pan",
            Self::Pinch => "pinch",
        }
    }
}

/// Screen-space velocity in pixels per second.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Velocity {
    /// Horizontal component.
    pub x: f64,
    /// Vertical component.
    pub y: f64,
}

impl Velocity {
    /// At rest.
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    /// Create a velocity.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Magnitude in px/s.
    #[must_use]
    pub fn speed(&self) -> f64 {
        self.x.hypot(self.y)
    }
}

/// A recognized gesture phase.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GestureEvent {
    /// A gesture began at `position` (screen px).
    Start {
        /// Gesture kind.
        kind: GestureKind,
        /// Where it began.
        position: Point,
    },
    /// The gesture moved.
    Update {
        /// Gesture kind.
        kind: GestureKind,
        /// Horizontal content movement since the previous update (px).
        delta_x: f64,
        /// Vertical content movement since the previous update (px).
        delta_y: f64,
        /// Cumulative scale since `Start` (1.0 for pans).
        scale_ratio: f64,
        /// Smoothed velocity.
        velocity: Velocity,
    },
    /// The gesture finished.
    End {
        /// Gesture kind.
        kind: GestureKind,
        /// Velocity at release (zero for cancellations and stalls).
        final_velocity: Velocity,
    },
}

// ---------------------------------------------------------------------------
// Internal state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
enum PanSource {
    Pointer,
    Touch(u64),
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Tracking {
    Idle,
    PointerArmed {
        origin: Point,
    },
    TouchArmed {
        id: u64,
        origin: Point,
    },
    Pan {
        source: PanSource,
        last: Point,
    },
    PinchArmed {
        ids: [u64; 2],
    },
    Pinch {
        ids: [u64; 2],
        initial_distance: f64,
        last_mid: Point,
    },
    /// Fingers remain after a pinch or cancellation.
    AwaitingRelease,
    WheelPan,
    WheelZoom {
        accumulated_dy: f64,
    },
}

impl Tracking {
    fn active_kind(&self) -> Option<GestureKind> {
        match self {
            Self::Pan { .. } | Self::WheelPan => Some(GestureKind::Pan),
            Self::Pinch { .. } | Self::WheelZoom { .. } => Some(GestureKind::Pinch),
            _ => None,
        }
    }

    fn uses_touch(&self) -> bool {
        matches!(
            self,
            Self::TouchArmed { .. }
                | Self::Pan {
                    source: PanSource::Touch(_),
                    ..
                }
                | Self::PinchArmed { .. }
                | Self::Pinch { .. }
                | Self::AwaitingRelease
        )
    }
}

/// Updates held back by the input throttle.
#[derive(Debug, Clone, Copy)]
struct Coalesced {
    kind: GestureKind,
    delta_x: f64,
    delta_y: f64,
    scale_ratio: f64,
    velocity: Velocity,
}

// ---------------------------------------------------------------------------
// GestureRecognizer
// ---------------------------------------------------------------------------

/// Stateful recognizer producing [`GestureEvent`]s.
#[derive(Debug, Clone)]
pub struct GestureRecognizer {
    config: GestureConfig,
    enabled: bool,
    tracking: Tracking,
    velocity: Velocity,
    last_sample: Option<Instant>,
    last_input: Option<Instant>,
    last_emit: Option<Instant>,
    coalesced: Option<Coalesced>,
}

impl GestureRecognizer {
    /// Create an enabled recognizer.
    #[must_use]
    pub fn new(config: GestureConfig) -> Self {
        Self {
            config,
            enabled: true,
            tracking: Tracking::Idle,
            velocity: Velocity::ZERO,
            last_sample: None,
            last_input: None,
            last_emit: None,
            coalesced: None,
        }
    }

    /// Process a raw record, returning any gesture events produced.
    pub fn process(&mut self, event: &InputEvent) -> Vec<GestureEvent> {
        let mut out = Vec::with_capacity(2);
        if !self.enabled {
            return out;
        }
        match event {
            InputEvent::Pointer(pointer) => self.on_pointer(pointer, &mut out),
            InputEvent::Touch(touch) => self.on_touch(touch, &mut out),
            InputEvent::Wheel(wheel) => self.on_wheel(wheel, &mut out),
            InputEvent::Key(key) => {
                if key.code == KeyCode::Escape && key.kind == KeyEventKind::Press {
                    self.abort(&mut out);
                }
            }
            InputEvent::Focus { gained: false, .. } => self.abort(&mut out),
            InputEvent::Focus { gained: true, .. } => {}
        }
        out
    }

    /// End a gesture that has seen no input for `stall_timeout`.
    pub fn check_stall(&mut self, now: Instant) -> Vec<GestureEvent> {
        let mut out = Vec::new();
        let Some(last) = self.last_input else {
            return out;
        };
        if now.saturating_duration_since(last) < self.config.stall_timeout {
            return out;
        }
        let Some(kind) = self.tracking.active_kind() else {
            return out;
        };

        tracing::debug!(kind = kind.as_str(), "gesture stalled");
        let rearmed = match self.tracking {
            Tracking::Pan {
                source: PanSource::Pointer,
                last,
            } => Tracking::PointerArmed { origin: last },
            Tracking::Pan {
                source: PanSource::Touch(id),
                last,
            } => Tracking::TouchArmed { id, origin: last },
            Tracking::Pinch { ids, .. } => Tracking::PinchArmed { ids },
            _ => Tracking::Idle,
        };
        self.finish(kind, now, false, &mut out);
        self.tracking = rearmed;
        out
    }

    /// Cancel any active gesture (as Escape does).
    pub fn cancel(&mut self) -> Vec<GestureEvent> {
        let mut out = Vec::new();
        self.abort(&mut out);
        out
    }

    /// Enable or disable recognition. Disabling ends any active gesture.
    pub fn set_enabled(&mut self, enabled: bool) -> Vec<GestureEvent> {
        let mut out = Vec::new();
        if !enabled {
            self.abort(&mut out);
            self.tracking = Tracking::Idle;
        }
        self.enabled = enabled;
        out
    }

    /// Whether recognition is enabled.
    #[inline]
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Kind of the gesture in progress, if any.
    #[must_use]
    pub fn active_kind(&self) -> Option<GestureKind> {
        self.tracking.active_kind()
    }

    /// Whether a gesture is in progress.
    #[inline]
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.tracking.active_kind().is_some()
    }

    /// Number of fingers the recognizer is following (0, 1, or 2).
    #[must_use]
    pub fn tracked_touches(&self) -> usize {
        match self.tracking {
            Tracking::TouchArmed { .. }
            | Tracking::Pan {
                source: PanSource::Touch(_),
                ..
            } => 1,
            Tracking::PinchArmed { .. } | Tracking::Pinch { .. } => 2,
            _ => 0,
        }
    }

    /// Change the update throttle interval.
    pub fn set_input_throttle(&mut self, throttle: Duration) {
        self.config.input_throttle = throttle;
    }

    /// Drop all state without emitting anything.
    pub fn reset(&mut self) {
        self.tracking = Tracking::Idle;
        self.velocity = Velocity::ZERO;
        self.last_sample = None;
        self.last_input = None;
        self.last_emit = None;
        self.coalesced = None;
    }

    /// Get a reference to the current configuration.
    #[inline]
    #[must_use]
    pub fn config(&self) -> &GestureConfig {
        &self.config
    }

    /// Update the configuration.
    pub fn set_config(&mut self, config: GestureConfig) {
        self.config = config;
    }
}

impl Default for GestureRecognizer {
    fn default() -> Self {
        Self::new(GestureConfig::default())
    }
}

// ---------------------------------------------------------------------------
// Internal event handlers
// ---------------------------------------------------------------------------

impl GestureRecognizer {
    fn on_pointer(&mut self, e: &PointerEvent, out: &mut Vec<GestureEvent>) {
        if e.pointer_type == PointerType::Touch || !is_finite_point(e.position) {
            return;
        }
        let pos = e.position;
        let now = e.at;
        match (e.phase, self.tracking) {
            (PointerPhase::Down, Tracking::Idle) => {
                self.tracking = Tracking::PointerArmed { origin: pos };
                self.last_input = Some(now);
            }
            (PointerPhase::Move, Tracking::PointerArmed { origin }) => {
                self.last_input = Some(now);
                if pos.distance(origin) >= self.config.drag_threshold {
                    self.begin(GestureKind::Pan, origin, now, out);
                    self.update(GestureKind::Pan, pos.x - origin.x, pos.y - origin.y, 1.0, now, out);
                    self.tracking = Tracking::Pan {
                        source: PanSource::Pointer,
                        last: pos,
                    };
                }
            }
            (
                PointerPhase::Move,
                Tracking::Pan {
                    source: PanSource::Pointer,
                    last,
                },
            ) => {
                self.last_input = Some(now);
                self.update(GestureKind::Pan, pos.x - last.x, pos.y - last.y, 1.0, now, out);
                self.tracking = Tracking::Pan {
                    source: PanSource::Pointer,
                    last: pos,
                };
            }
            (PointerPhase::Up | PointerPhase::Cancel, Tracking::PointerArmed { .. }) => {
                self.tracking = Tracking::Idle;
            }
            (
                phase @ (PointerPhase::Up | PointerPhase::Cancel),
                Tracking::Pan {
                    source: PanSource::Pointer,
                    ..
                },
            ) => {
                self.finish(GestureKind::Pan, now, phase == PointerPhase::Up, out);
                self.tracking = Tracking::Idle;
            }
            _ => {}
        }
    }

    fn on_touch(&mut self, e: &TouchEvent, out: &mut Vec<GestureEvent>) {
        if e.touches.iter().any(|t| !is_finite_point(t.position)) {
            return;
        }
        let now = e.at;
        if e.phase == TouchPhase::Cancel {
            if self.tracking.uses_touch() {
                self.abort(out);
                self.tracking = Tracking::Idle;
            }
            return;
        }
        let find = |id: u64| e.touches.iter().find(|t| t.id == id).copied();

        match self.tracking {
            Tracking::Idle => {
                if e.phase != TouchPhase::Start {
                    return;
                }
                self.last_input = Some(now);
                match e.touches.as_slice() {
                    [] => {}
                    [only] => {
                        self.tracking = Tracking::TouchArmed {
                            id: only.id,
                            origin: only.position,
                        };
                    }
                    [a, b, ..] => self.begin_pinch(*a, *b, now, out),
                }
            }
            Tracking::TouchArmed { id, origin } => {
                self.last_input = Some(now);
                let Some(primary) = find(id) else {
                    self.tracking = self.after_release(e);
                    return;
                };
                if let Some(second) = e.touches.iter().find(|t| t.id != id) {
                    self.begin_pinch(primary, *second, now, out);
                } else if primary.position.distance(origin) >= self.config.drag_threshold {
                    let pos = primary.position;
                    self.begin(GestureKind::Pan, origin, now, out);
                    self.update(GestureKind::Pan, pos.x - origin.x, pos.y - origin.y, 1.0, now, out);
                    self.tracking = Tracking::Pan {
                        source: PanSource::Touch(id),
                        last: pos,
                    };
                }
            }
            Tracking::Pan {
                source: PanSource::Touch(id),
                last,
            } => {
                self.last_input = Some(now);
                match find(id) {
                    None => {
                        self.finish(GestureKind::Pan, now, true, out);
                        self.tracking = self.after_release(e);
                    }
                    Some(primary) => {
                        if let Some(second) = e.touches.iter().find(|t| t.id != id) {
                            self.finish(GestureKind::Pan, now, false, out);
                            self.begin_pinch(primary, *second, now, out);
                        } else {
                            let pos = primary.position;
                            self.update(GestureKind::Pan, pos.x - last.x, pos.y - last.y, 1.0, now, out);
                            self.tracking = Tracking::Pan {
                                source: PanSource::Touch(id),
                                last: pos,
                            };
                        }
                    }
                }
            }
            Tracking::PinchArmed { ids } => {
                self.last_input = Some(now);
                match (find(ids[0]), find(ids[1])) {
                    (Some(a), Some(b)) => {
                        if e.phase == TouchPhase::Move {
                            self.begin_pinch(a, b, now, out);
                        }
                    }
                    _ => self.tracking = self.after_release(e),
                }
            }
            Tracking::Pinch {
                ids,
                initial_distance,
                last_mid,
            } => {
                self.last_input = Some(now);
                match (find(ids[0]), find(ids[1])) {
                    (Some(a), Some(b)) => {
                        if e.phase != TouchPhase::Move {
                            return;
                        }
                        let mid = a.position.midpoint(b.position);
                        let distance = a.position.distance(b.position).max(MIN_PINCH_DISTANCE);
                        let ratio = distance / initial_distance;
                        self.update(GestureKind::Pinch, mid.x - last_mid.x, mid.y - last_mid.y, ratio, now, out);
                        self.tracking = Tracking::Pinch {
                            ids,
                            initial_distance,
                            last_mid: mid,
                        };
                    }
                    _ => {
                        self.finish(GestureKind::Pinch, now, true, out);
                        self.tracking = self.after_release(e);
                    }
                }
            }
            Tracking::AwaitingRelease => {
                if e.touches.is_empty() {
                    self.tracking = Tracking::Idle;
                }
            }
            Tracking::PointerArmed { .. }
            | Tracking::Pan {
                source: PanSource::Pointer,
                ..
            }
            | Tracking::WheelPan
            | Tracking::WheelZoom { .. } => {}
        }
    }

    fn on_wheel(&mut self, e: &WheelEvent, out: &mut Vec<GestureEvent>) {
        if !e.delta_x.is_finite() || !e.delta_y.is_finite() || !is_finite_point(e.position) {
            return;
        }
        let now = e.at;
        if e.is_zoom() {
            let accumulated = match self.tracking {
                Tracking::WheelZoom { accumulated_dy } => accumulated_dy,
                Tracking::WheelPan => {
                    self.finish(GestureKind::Pan, now, false, out);
                    self.begin(GestureKind::Pinch, e.position, now, out);
                    0.0
                }
                Tracking::Idle => {
                    self.begin(GestureKind::Pinch, e.position, now, out);
                    0.0
                }
                _ => return,
            };
            self.last_input = Some(now);
            let accumulated_dy = accumulated + e.delta_y;
            let ratio = (-accumulated_dy * self.config.wheel_zoom_factor).exp();
            self.tracking = Tracking::WheelZoom { accumulated_dy };
            self.update(GestureKind::Pinch, 0.0, 0.0, ratio, now, out);
        } else {
            match self.tracking {
                Tracking::WheelPan => {}
                Tracking::WheelZoom { .. } => {
                    self.finish(GestureKind::Pinch, now, false, out);
                    self.begin(GestureKind::Pan, e.position, now, out);
                }
                Tracking::Idle => self.begin(GestureKind::Pan, e.position, now, out),
                _ => return,
            }
            self.last_input = Some(now);
            self.tracking = Tracking::WheelPan;
            // Scrolling down reveals content below, i.e. drags content up.
            self.update(GestureKind::Pan, -e.delta_x, -e.delta_y, 1.0, now, out);
        }
    }

    fn begin_pinch(&mut self, a: Touch, b: Touch, now: Instant, out: &mut Vec<GestureEvent>) {
        let mid = a.position.midpoint(b.position);
        let distance = a.position.distance(b.position).max(MIN_PINCH_DISTANCE);
        self.begin(GestureKind::Pinch, mid, now, out);
        self.tracking = Tracking::Pinch {
            ids: [a.id, b.id],
            initial_distance: distance,
            last_mid: mid,
        };
    }

    fn after_release(&self, e: &TouchEvent) -> Tracking {
        if e.touches.is_empty() {
            Tracking::Idle
        } else {
            Tracking::AwaitingRelease
        }
    }

    fn begin(&mut self, kind: GestureKind, position: Point, now: Instant, out: &mut Vec<GestureEvent>) {
        tracing::debug!(kind = kind.as_str(), x = position.x, y = position.y, "gesture start");
        self.velocity = Velocity::ZERO;
        self.last_sample = Some(now);
        self.last_emit = None;
        self.coalesced = None;
        out.push(GestureEvent::Start { kind, position });
    }

    fn update(
        &mut self,
        kind: GestureKind,
        delta_x: f64,
        delta_y: f64,
        scale_ratio: f64,
        now: Instant,
        out: &mut Vec<GestureEvent>,
    ) {
        if let Some(prev) = self.last_sample {
            let dt = now.saturating_duration_since(prev).as_secs_f64();
            if dt > 0.0 {
                let alpha = self.config.velocity_smoothing.clamp(0.0, 1.0);
                self.velocity = Velocity::new(
                    alpha * (delta_x / dt) + (1.0 - alpha) * self.velocity.x,
                    alpha * (delta_y / dt) + (1.0 - alpha) * self.velocity.y,
                );
                self.last_sample = Some(now);
            }
        } else {
            self.last_sample = Some(now);
        }

        let merged = match self.coalesced.take() {
            Some(held) => Coalesced {
                kind,
                delta_x: held.delta_x + delta_x,
                delta_y: held.delta_y + delta_y,
                scale_ratio,
                velocity: self.velocity,
            },
            None => Coalesced {
                kind,
                delta_x,
                delta_y,
                scale_ratio,
                velocity: self.velocity,
            },
        };

        let throttle = self.config.input_throttle;
        let throttled = !throttle.is_zero()
            && self
                .last_emit
                .is_some_and(|t| now.saturating_duration_since(t) < throttle);
        if throttled {
            self.coalesced = Some(merged);
            return;
        }
        self.last_emit = Some(now);
        out.push(emit(merged));
    }

    fn finish(&mut self, kind: GestureKind, now: Instant, momentum: bool, out: &mut Vec<GestureEvent>) {
        if let Some(held) = self.coalesced.take() {
            out.push(emit(held));
        }
        let recent = self
            .last_sample
            .is_some_and(|t| now.saturating_duration_since(t) <= self.config.momentum_window);
        let final_velocity = if momentum && recent {
            self.velocity
        } else {
            Velocity::ZERO
        };
        tracing::debug!(
            kind = kind.as_str(),
            speed = final_velocity.speed(),
            "gesture end"
        );
        out.push(GestureEvent::End {
            kind,
            final_velocity,
        });
        self.velocity = Velocity::ZERO;
        self.last_sample = None;
        self.last_emit = None;
    }

    /// Cancellation: held updates are dropped and the gesture ends at rest.
    fn abort(&mut self, out: &mut Vec<GestureEvent>) {
        let touch = self.tracking.uses_touch();
        if let Some(kind) = self.tracking.active_kind() {
            self.coalesced = None;
            out.push(GestureEvent::End {
                kind,
                final_velocity: Velocity::ZERO,
            });
            tracing::debug!(kind = kind.as_str(), "gesture cancelled");
        }
        self.velocity = Velocity::ZERO;
        self.last_sample = None;
        self.last_emit = None;
        self.tracking = if touch {
            Tracking::AwaitingRelease
        } else {
            Tracking::Idle
        };
    }
}

fn emit(c: Coalesced) -> GestureEvent {
    GestureEvent::Update {
        kind: c.kind,
        delta_x: c.delta_x,
        delta_y: c.delta_y,
        scale_ratio: c.scale_ratio,
        velocity: c.velocity,
    }
}

#[inline]
fn is_finite_point(p: Point) -> bool {
    p.x.is_finite() && p.y.is_finite()
}
