#![forbid(unsafe_code)]

//! The canvas engine: the single writer of [`CanvasState`].
//!
//! Every command funnels into [`CanvasEngine::dispatch`]. The host drives
//! time by calling [`CanvasEngine::tick`] once per display refresh while
//! [`CanvasEngine::needs_frame`] is true and forwards raw input through
//! [`CanvasEngine::handle_input`].
//!
//! ```text
//!   InputEvent ──▶ GestureRecognizer ─┐
//!              └─▶ SpatialNavigator ──┼─▶ dispatch(Intent) ──▶ CameraAnimator
//!   request_*  ───────────────────────┘            │                 │
//!                                                  ▼                 ▼
//!                                             CanvasState ◀──── tick(now)
//!                                                  │                 │
//!                               subscribers ◀── snapshot     PerformanceMonitor
//!                                                                    │
//!                                  animator stride / input throttle ◀┘
//! ```
//!
//! # Invariants
//!
//! 1. Subscribers hear at most one snapshot per tick, and only when state
//!    changed since the last one.
//! 2. Every position written to state satisfies the configured bounds.
//! 3. A rejected intent leaves state untouched.
//! 4. A request made while a transition is in flight retargets it; nothing
//!    is queued.
//!
//! # Failure Modes
//!
//! | Condition | Behavior |
//! |-----------|----------|
//! | Invalid intent | `Err(IntentError)`, logged at `warn`, sent to diagnostic listeners |
//! | Transition late or diverged | Snapped to target, recorded with `success: false` |
//! | Gesture stalls | Ended with zero velocity on the next tick |
//! | Any call after `dispose()` | `Err(IntentError::Disposed)` |

use std::fmt;

use lightbox_core::animation::{AnimatorStep, CameraAnimator, CameraFrame, Completion, MovementKind};
use lightbox_core::clock::{Clock, SystemClock};
use lightbox_core::event::InputEvent;
use lightbox_core::geometry::{CanvasPosition, ViewportSize};
use lightbox_core::gesture::{GestureEvent, GestureKind, GestureRecognizer};
use lightbox_core::navigator::{NavIntent, SpatialNavigator, mode_announcement, position_announcement};
use lightbox_core::section::{GridLayout, SectionId, SectionTable};
use lightbox_core::transform::{clamp_to_bounds, interpolate_path, nearest_section};
use web_time::Instant;

use crate::arbiter::{LayoutMode, NoopScrollHost, ScrollArbiter, ScrollHost};
use crate::config::EngineConfig;
use crate::error::{IntentError, Result, StateViolation};
use crate::history::{TransitionHistory, TransitionRecord};
use crate::perf::{Fidelity, PerformanceMonitor, TierChange};
use crate::state::{CameraState, CanvasSnapshot, CanvasState, TouchState};

/// Relative scale change above which a default movement zooms.
const ZOOM_MOVEMENT_THRESHOLD: f64 = 0.05;

// ---------------------------------------------------------------------------
// Intents
// ---------------------------------------------------------------------------

/// A command for the engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Intent {
    /// Move the camera to a section.
    GoToSection {
        /// Destination.
        section: SectionId,
        /// Movement; chosen from the scale change when `None`.
        movement: Option<MovementKind>,
    },
    /// Move the camera to an arbitrary position.
    GoToPosition {
        /// Destination, clamped to bounds.
        position: CanvasPosition,
        /// Movement; chosen from the scale change when `None`.
        movement: Option<MovementKind>,
    },
    /// A recognized gesture phase.
    Gesture(GestureEvent),
    /// A keyboard navigation request.
    Navigation(NavIntent),
    /// Switch presentation mode.
    SetLayoutMode(LayoutMode),
    /// Rearrange the sections.
    SetLayout(GridLayout),
    /// The host viewport was resized.
    ResizeViewport {
        /// New width in pixels.
        width: f64,
        /// New height in pixels.
        height: f64,
    },
    /// Turn reduced motion on or off.
    SetReducedMotion(bool),
}

impl Intent {
    /// Stable name for logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::GoToSection { .. } => "go_to_section",
            Self::GoToPosition { .. } => "go_to_position",
            Self::Gesture(_) => "gesture",
            Self::Navigation(_) => "navigation",
            Self::SetLayoutMode(_) => "set_layout_mode",
            Self::SetLayout(_) => "set_layout",
            Self::ResizeViewport { .. } => "resize_viewport",
            Self::SetReducedMotion(_) => "set_reduced_motion",
        }
    }
}

/// Opaque handle returned by [`CanvasEngine::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    /// Return the numeric id value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

type SnapshotListener = Box<dyn FnMut(&CanvasSnapshot)>;
type AnnouncementListener = Box<dyn FnMut(&str)>;
type DiagnosticListener = Box<dyn FnMut(&IntentError)>;

/// Bookkeeping for the transition in flight.
#[derive(Debug, Clone, Copy)]
struct InFlight {
    from_section: Option<SectionId>,
    origin: CanvasPosition,
    started_at: Instant,
    retargets: u32,
}

// ---------------------------------------------------------------------------
// CanvasEngine
// ---------------------------------------------------------------------------

/// Owns canvas state and every component that acts on it.
pub struct CanvasEngine<C: Clock = SystemClock> {
    clock: C,
    config: EngineConfig,
    sections: SectionTable,
    state: CanvasState,
    animator: CameraAnimator,
    recognizer: GestureRecognizer,
    navigator: SpatialNavigator,
    arbiter: ScrollArbiter,
    monitor: PerformanceMonitor,
    in_flight: Option<InFlight>,
    gesture_base_scale: f64,
    announce_on_settle: bool,
    /// Last value read from the reduced-motion source.
    reduced_motion_source: bool,
    subscribers: Vec<(SubscriptionId, SnapshotListener)>,
    announcement_listeners: Vec<AnnouncementListener>,
    diagnostic_listeners: Vec<DiagnosticListener>,
    next_subscription: u64,
    dirty: bool,
    disposed: bool,
}

impl<C: Clock> fmt::Debug for CanvasEngine<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CanvasEngine")
            .field("state", &self.state)
            .field("animator", &self.animator)
            .field("arbiter", &self.arbiter)
            .field("tier", &self.monitor.tier())
            .field("subscribers", &self.subscribers.len())
            .field("dirty", &self.dirty)
            .field("disposed", &self.disposed)
            .finish_non_exhaustive()
    }
}

impl CanvasEngine<SystemClock> {
    /// Build an engine on the system clock with no scroll host.
    pub fn new(config: EngineConfig) -> Result<Self> {
        Self::with_host(config, SystemClock, Box::new(NoopScrollHost))
    }
}

impl<C: Clock> CanvasEngine<C> {
    /// Build an engine reading time from `clock`.
    pub fn with_clock(config: EngineConfig, clock: C) -> Result<Self> {
        Self::with_host(config, clock, Box::new(NoopScrollHost))
    }

    /// Build an engine reading time from `clock` and driving `host`'s
    /// document scroll suppression.
    pub fn with_host(config: EngineConfig, clock: C, host: Box<dyn ScrollHost>) -> Result<Self> {
        config.validate()?;

        let start = clamp_to_bounds(&config.start_position(), &config.bounds).position;
        let sections = config.sections.clone();
        let active = sections
            .section_at(&start)
            .unwrap_or(config.initial_section);
        let mut state = CanvasState::new(
            start,
            active,
            config.layout,
            config.layout_mode,
            config.viewport,
            config.history_capacity,
        );
        let reduced_motion_source = config.reduced_motion.prefers_reduced_motion();
        state.accessibility.reduced_motion = reduced_motion_source;
        state.accessibility.spatial_focus = Some(active);

        let arbiter = ScrollArbiter::new(host, config.layout_mode);
        let mut recognizer = GestureRecognizer::new(config.gesture.clone());
        // A fresh recognizer has no gesture in progress, so nothing is ended.
        let ended = recognizer.set_enabled(arbiter.recognizer_enabled());
        debug_assert!(ended.is_empty());

        tracing::info!(
            layout = config.layout.as_str(),
            layout_mode = config.layout_mode.as_str(),
            section = %active,
            reduced_motion = state.accessibility.reduced_motion,
            "canvas engine created"
        );

        Ok(Self {
            clock,
            animator: CameraAnimator::new(config.animator),
            navigator: SpatialNavigator::new(config.keymap.clone()),
            monitor: PerformanceMonitor::new(config.perf.clone()),
            recognizer,
            arbiter,
            sections,
            state,
            config,
            in_flight: None,
            gesture_base_scale: start.scale,
            announce_on_settle: false,
            reduced_motion_source,
            subscribers: Vec::new(),
            announcement_listeners: Vec::new(),
            diagnostic_listeners: Vec::new(),
            next_subscription: 1,
            dirty: true,
            disposed: false,
        })
    }

    // -----------------------------------------------------------------------
    // Commands
    // -----------------------------------------------------------------------

    /// Apply one intent at the clock's current time. The single mutation
    /// point for canvas state.
    pub fn dispatch(&mut self, intent: Intent) -> std::result::Result<(), IntentError> {
        let now = self.clock.now();
        self.dispatch_at(intent, now)
    }

    /// Apply one intent as of `now`.
    pub fn dispatch_at(&mut self, intent: Intent, now: Instant) -> std::result::Result<(), IntentError> {
        if self.disposed {
            return Err(self.reject(intent.name(), IntentError::Disposed));
        }
        self.poll_reduced_motion(now);
        let outcome = match intent {
            Intent::GoToSection { section, movement } => {
                let target = self.sections.get(section).position;
                self.go_to(target, movement, now);
                Ok(())
            }
            Intent::GoToPosition { position, movement } => {
                check_position(&position).map(|()| self.go_to(position, movement, now))
            }
            Intent::Gesture(event) => self.apply_gesture(event, now),
            Intent::Navigation(nav) => self.apply_navigation(nav, now),
            Intent::SetLayoutMode(mode) => {
                self.change_layout_mode(mode, now);
                Ok(())
            }
            Intent::SetLayout(layout) => {
                self.change_layout(layout, now);
                Ok(())
            }
            Intent::ResizeViewport { width, height } => {
                let viewport = ViewportSize::new(width, height);
                if viewport.is_valid() {
                    if viewport != self.state.viewport {
                        self.state.viewport = viewport;
                        self.dirty = true;
                    }
                    Ok(())
                } else {
                    Err(IntentError::InvalidViewport { width, height })
                }
            }
            Intent::SetReducedMotion(enabled) => {
                self.change_reduced_motion(enabled, now);
                Ok(())
            }
        };
        match outcome {
            Ok(()) => {
                self.state.performance.counters.intents_applied += 1;
                Ok(())
            }
            Err(err) => Err(self.reject(intent.name(), err)),
        }
    }

    /// Move the camera to `section`.
    pub fn request_section(
        &mut self,
        section: SectionId,
        movement: Option<MovementKind>,
    ) -> std::result::Result<(), IntentError> {
        self.dispatch(Intent::GoToSection { section, movement })
    }

    /// Move the camera to the section called `name`.
    pub fn request_section_named(
        &mut self,
        name: &str,
        movement: Option<MovementKind>,
    ) -> std::result::Result<(), IntentError> {
        if self.disposed {
            return Err(self.reject("go_to_section", IntentError::Disposed));
        }
        match name.parse::<SectionId>() {
            Ok(section) => self.request_section(section, movement),
            Err(err) => Err(self.reject("go_to_section", err.into())),
        }
    }

    /// Move the camera to `position`.
    pub fn request_position(
        &mut self,
        position: CanvasPosition,
        movement: Option<MovementKind>,
    ) -> std::result::Result<(), IntentError> {
        self.dispatch(Intent::GoToPosition { position, movement })
    }

    /// Apply a recognized gesture phase.
    pub fn apply_gesture_intent(&mut self, event: GestureEvent) -> std::result::Result<(), IntentError> {
        self.dispatch(Intent::Gesture(event))
    }

    /// Apply a keyboard navigation request.
    pub fn apply_accessibility_intent(&mut self, intent: NavIntent) -> std::result::Result<(), IntentError> {
        self.dispatch(Intent::Navigation(intent))
    }

    /// Route a raw input event through the recognizer and navigator.
    pub fn handle_input(&mut self, event: &InputEvent) -> std::result::Result<(), IntentError> {
        if self.disposed {
            return Err(self.reject("input", IntentError::Disposed));
        }
        let mut result = Ok(());
        for gesture in self.recognizer.process(event) {
            if let Err(err) = self.dispatch(Intent::Gesture(gesture)) {
                result = Err(err);
            }
        }
        if let InputEvent::Key(key) = event {
            let spatial = self.state.accessibility.keyboard_spatial_nav_enabled;
            if let Some(nav) = self.navigator.handle_key(key, spatial) {
                if let Err(err) = self.dispatch(Intent::Navigation(nav)) {
                    result = Err(err);
                }
            }
        }
        self.sync_touch_state();
        result
    }

    /// Switch presentation mode.
    pub fn set_layout_mode(&mut self, mode: LayoutMode) -> std::result::Result<(), IntentError> {
        self.dispatch(Intent::SetLayoutMode(mode))
    }

    /// Rearrange the sections; the camera follows with a match cut.
    pub fn set_layout(&mut self, layout: GridLayout) -> std::result::Result<(), IntentError> {
        self.dispatch(Intent::SetLayout(layout))
    }

    /// Record a new viewport size.
    pub fn set_viewport_size(&mut self, width: f64, height: f64) -> std::result::Result<(), IntentError> {
        self.dispatch(Intent::ResizeViewport { width, height })
    }

    /// Turn reduced motion on or off.
    pub fn set_reduced_motion(&mut self, enabled: bool) -> std::result::Result<(), IntentError> {
        self.dispatch(Intent::SetReducedMotion(enabled))
    }

    // -----------------------------------------------------------------------
    // Frame loop
    // -----------------------------------------------------------------------

    /// Advance animation, gesture stall detection, and performance sampling
    /// to `now`, then publish if anything changed.
    pub fn tick(&mut self, now: Instant) {
        if self.disposed {
            return;
        }
        self.poll_reduced_motion(now);

        if let Some(change) = self.monitor.observe_tick(now) {
            self.apply_tier_change(&change);
        }
        self.state.performance.tier = self.monitor.tier();
        self.state.performance.fps = self.monitor.fps();
        self.state.performance.average_frame_time = self.monitor.average_frame_time();

        for gesture in self.recognizer.check_stall(now) {
            tracing::debug!(kind = gesture_kind(&gesture).as_str(), "gesture stalled");
            // Rejections are already logged and reported by dispatch.
            let _ = self.dispatch_at(Intent::Gesture(gesture), now);
        }
        self.sync_touch_state();

        match self.animator.tick(now) {
            AnimatorStep::Idle => {}
            AnimatorStep::Frame(frame) => self.apply_frame(frame),
            AnimatorStep::Skipped { progress } => {
                self.state.camera.progress = progress;
                self.state.performance.counters.frames_skipped += 1;
            }
            AnimatorStep::Complete(completion) => self.finish_transition(completion, now),
        }

        if self.dirty {
            self.publish();
        }
    }

    /// Whether the host should keep calling [`tick`](Self::tick).
    #[must_use]
    pub fn needs_frame(&self) -> bool {
        !self.disposed && (self.dirty || self.animator.is_running() || self.recognizer.is_active())
    }

    // -----------------------------------------------------------------------
    // Observation
    // -----------------------------------------------------------------------

    /// Call `listener` with each published snapshot.
    pub fn subscribe(&mut self, listener: impl FnMut(&CanvasSnapshot) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.subscribers.push((id, Box::new(listener)));
        id
    }

    /// Remove a subscription. Returns `false` if it was not registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sid, _)| *sid != id);
        self.subscribers.len() != before
    }

    /// Call `listener` with each screen-reader announcement.
    pub fn on_announcement(&mut self, listener: impl FnMut(&str) + 'static) {
        self.announcement_listeners.push(Box::new(listener));
    }

    /// Call `listener` with each rejected intent.
    pub fn on_diagnostic(&mut self, listener: impl FnMut(&IntentError) + 'static) {
        self.diagnostic_listeners.push(Box::new(listener));
    }

    /// Current state as a snapshot.
    #[must_use]
    pub fn snapshot(&self) -> CanvasSnapshot {
        self.state.snapshot()
    }

    /// Check every state invariant.
    pub fn validate_state(&self) -> std::result::Result<(), StateViolation> {
        self.state.validate(&self.config.bounds)
    }

    /// Sample the path from the current position to `to`, with as many
    /// samples as the current performance tier allows.
    pub fn plan_path(
        &self,
        to: CanvasPosition,
        kind: MovementKind,
    ) -> std::result::Result<Vec<CanvasPosition>, IntentError> {
        if self.disposed {
            return Err(IntentError::Disposed);
        }
        check_position(&to)?;
        let target = clamp_to_bounds(&to, &self.config.bounds).position;
        let samples = self.monitor.fidelity().path_samples(self.config.path_samples);
        Ok(interpolate_path(&self.state.current_position, &target, kind, samples))
    }

    /// Section table for the current layout.
    #[must_use]
    pub fn sections(&self) -> &SectionTable {
        &self.sections
    }

    /// Completed transitions.
    #[must_use]
    pub fn history(&self) -> &TransitionHistory {
        &self.state.history
    }

    /// Fidelity currently in force.
    #[must_use]
    pub fn fidelity(&self) -> Fidelity {
        self.monitor.fidelity()
    }

    /// Scroll arbiter.
    #[must_use]
    pub fn arbiter(&self) -> &ScrollArbiter {
        &self.arbiter
    }

    /// Configuration the engine was built with.
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The engine's clock.
    #[must_use]
    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Whether [`dispose`](Self::dispose) has run.
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Cancel everything in flight, restore document scrolling, and drop
    /// all listeners. Later calls are rejected with
    /// [`IntentError::Disposed`].
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        if let Some(position) = self.animator.cancel() {
            self.state.current_position = clamp_to_bounds(&position, &self.config.bounds).position;
        }
        self.clear_transition();
        // The interaction flags are reset below, which is all an End would do.
        let ended = self.recognizer.cancel();
        tracing::debug!(ended = ended.len(), "gestures cancelled on dispose");
        self.state.interaction = Default::default();
        self.arbiter.teardown();
        self.subscribers.clear();
        self.announcement_listeners.clear();
        self.diagnostic_listeners.clear();
        self.disposed = true;
        self.dirty = false;
        tracing::info!(
            transitions = self.state.history.total_recorded(),
            "canvas engine disposed"
        );
    }

    // -----------------------------------------------------------------------
    // Transitions
    // -----------------------------------------------------------------------

    fn go_to(&mut self, requested: CanvasPosition, movement: Option<MovementKind>, now: Instant) {
        let target = clamp_to_bounds(&requested, &self.config.bounds).position;

        if let Some(in_flight_target) = self.animator.target() {
            if in_flight_target.approx_eq(&target) {
                return;
            }
            let origin = self
                .animator
                .position_at(now)
                .unwrap_or(self.state.current_position);
            let kind = movement.unwrap_or_else(|| default_movement(&origin, &target));
            if self.state.accessibility.reduced_motion {
                self.settle_immediately(target, kind, now);
                return;
            }
            self.animator.retarget(target, self.config.movements.get(kind), now);
            if let Some(flight) = self.in_flight.as_mut() {
                flight.retargets += 1;
            }
            self.state.performance.counters.retargets += 1;
            self.state.target_position = Some(target);
            self.state.camera = CameraState {
                active_movement: Some(kind),
                movement_start: Some(now),
                progress: 0.0,
                effects: self.state.camera.effects,
            };
            self.dirty = true;
            return;
        }

        let from = self.state.current_position;
        if from.approx_eq(&target) {
            return;
        }
        let kind = movement.unwrap_or_else(|| default_movement(&from, &target));
        if self.state.accessibility.reduced_motion {
            self.settle_immediately(target, kind, now);
            return;
        }

        let profile = self.config.movements.get(kind);
        self.animator.start(from, target, profile, now);
        self.begin_flight(now);
        self.state.target_position = Some(target);
        self.state.camera = CameraState {
            active_movement: Some(kind),
            movement_start: Some(now),
            progress: 0.0,
            effects: Default::default(),
        };
        self.dirty = true;
    }

    fn begin_flight(&mut self, now: Instant) -> InFlight {
        let from = self.state.current_position;
        let flight = InFlight {
            from_section: self.sections.section_at(&from),
            origin: from,
            started_at: now,
            retargets: 0,
        };
        self.in_flight = Some(flight);
        self.state.performance.counters.transitions_started += 1;
        flight
    }

    /// Jump straight to `target` without animating. A transition in flight
    /// ends at `target` as well.
    fn settle_immediately(&mut self, target: CanvasPosition, kind: MovementKind, now: Instant) {
        let resumed = self.animator.cancel().and(self.in_flight);
        let flight = match resumed {
            Some(flight) => flight,
            None => self.begin_flight(now),
        };
        self.finish_transition(
            Completion {
                origin: flight.origin,
                position: target,
                movement: kind,
                elapsed: now.saturating_duration_since(flight.started_at),
                retargets: flight.retargets,
                success: true,
            },
            now,
        );
    }

    fn apply_frame(&mut self, frame: CameraFrame) {
        self.state.current_position = clamp_to_bounds(&frame.position, &self.config.bounds).position;
        self.state.camera.progress = frame.progress.clamp(0.0, 1.0);
        self.state.camera.effects = frame.effects;
        self.dirty = true;
    }

    fn finish_transition(&mut self, completion: Completion, now: Instant) {
        let position = clamp_to_bounds(&completion.position, &self.config.bounds).position;
        let from_section = self.in_flight.and_then(|f| f.from_section);
        self.state.current_position = position;
        self.clear_transition();

        let to_section = self.sections.section_at(&position);
        self.settle_on(to_section);

        let counters = &mut self.state.performance.counters;
        if completion.success {
            counters.transitions_completed += 1;
        } else {
            counters.transitions_failed += 1;
            tracing::debug!(
                movement = completion.movement.as_str(),
                retargets = completion.retargets,
                "transition failed; snapped to target"
            );
        }
        self.state.history.record(TransitionRecord {
            seq: 0,
            from_section,
            to_section,
            from: completion.origin,
            to: position,
            movement: completion.movement,
            duration: completion.elapsed,
            success: completion.success,
            retargets: completion.retargets,
            completed_at: now,
        });
        self.dirty = true;
    }

    fn clear_transition(&mut self) {
        self.in_flight = None;
        self.state.target_position = None;
        self.state.camera = CameraState::default();
    }

    /// Update the active section and pending announcement after the camera
    /// comes to rest.
    fn settle_on(&mut self, section: Option<SectionId>) {
        if let Some(section) = section {
            if section != self.state.active_section {
                self.state.previous_section = Some(self.state.active_section);
                self.state.active_section = section;
            }
        }
        if self.announce_on_settle {
            self.announce_on_settle = false;
            let position = self.state.current_position;
            let (focus, _) = nearest_section(&position, &self.sections);
            self.state.accessibility.spatial_focus = Some(focus);
            let title = self.sections.get(focus).title.clone();
            self.announce(position_announcement(&title, focus, position.scale));
        }
    }

    // -----------------------------------------------------------------------
    // Gestures
    // -----------------------------------------------------------------------

    fn apply_gesture(&mut self, event: GestureEvent, now: Instant) -> std::result::Result<(), IntentError> {
        match event {
            GestureEvent::Start { kind, .. } => {
                self.interrupt_transition();
                self.gesture_base_scale = self.state.current_position.scale;
                self.state.interaction.is_panning = kind == GestureKind::Pan;
                self.state.interaction.is_zooming = kind == GestureKind::Pinch;
                tracing::debug!(kind = kind.as_str(), "gesture start");
                self.dirty = true;
            }
            GestureEvent::Update {
                kind,
                delta_x,
                delta_y,
                scale_ratio,
                ..
            } => {
                if !(delta_x.is_finite() && delta_y.is_finite() && scale_ratio.is_finite()) {
                    return Err(IntentError::NonFinitePosition {
                        x: delta_x,
                        y: delta_y,
                        scale: scale_ratio,
                    });
                }
                if scale_ratio <= 0.0 {
                    return Err(IntentError::NonPositiveScale(scale_ratio));
                }
                self.interrupt_transition();
                let current = self.state.current_position;
                let (dx, dy) = self
                    .state
                    .viewport
                    .screen_delta_to_canvas(delta_x, delta_y, current.scale);
                let mut next = current.offset(dx, dy);
                if kind == GestureKind::Pinch {
                    next = next.with_scale(self.gesture_base_scale * scale_ratio);
                }
                let next = clamp_to_bounds(&next, &self.config.bounds).position;
                if !next.approx_eq(&current) {
                    self.state.current_position = next;
                    self.dirty = true;
                }
            }
            GestureEvent::End { kind, final_velocity } => {
                self.state.interaction.is_panning = false;
                self.state.interaction.is_zooming = false;
                self.dirty = true;
                tracing::debug!(
                    kind = kind.as_str(),
                    speed = final_velocity.speed(),
                    "gesture end"
                );
                if kind != GestureKind::Pan {
                    let here = self.sections.section_at(&self.state.current_position);
                    self.settle_on(here);
                    return Ok(());
                }
                let current = self.state.current_position;
                if final_velocity.speed() > self.config.inertia_min_velocity {
                    let t = self.config.inertia_time.as_secs_f64();
                    let (dx, dy) = self.state.viewport.screen_delta_to_canvas(
                        final_velocity.x * t,
                        final_velocity.y * t,
                        current.scale,
                    );
                    self.go_to(current.offset(dx, dy), Some(MovementKind::PanTilt), now);
                } else {
                    let (nearest, distance) = nearest_section(&current, &self.sections);
                    let snap = self.sections.get(nearest).position;
                    if distance <= self.config.snap_radius && !snap.approx_eq(&current) {
                        self.go_to(snap, Some(MovementKind::PanTilt), now);
                    } else {
                        let here = self.sections.section_at(&current);
                        self.settle_on(here);
                    }
                }
            }
        }
        Ok(())
    }

    /// Stop an in-flight transition so direct manipulation takes over.
    fn interrupt_transition(&mut self) {
        if let Some(position) = self.animator.cancel() {
            tracing::debug!("transition interrupted by gesture");
            self.state.current_position = clamp_to_bounds(&position, &self.config.bounds).position;
            self.clear_transition();
            self.dirty = true;
        }
    }

    fn sync_touch_state(&mut self) {
        let touch = TouchState::from_count(self.recognizer.tracked_touches());
        if touch != self.state.interaction.touch_state {
            self.state.interaction.touch_state = touch;
            self.dirty = true;
        }
    }

    // -----------------------------------------------------------------------
    // Accessibility
    // -----------------------------------------------------------------------

    fn apply_navigation(&mut self, nav: NavIntent, now: Instant) -> std::result::Result<(), IntentError> {
        let base = self.animator.target().unwrap_or(self.state.current_position);
        match nav {
            NavIntent::MoveBy { dx, dy } => {
                let target = base.offset(dx, dy);
                check_position(&target)?;
                self.announce_on_settle = true;
                self.go_to(target, None, now);
                self.announce_if_idle();
            }
            NavIntent::ZoomBy { factor } => {
                if !factor.is_finite() {
                    return Err(IntentError::NonFinitePosition {
                        x: base.x,
                        y: base.y,
                        scale: factor,
                    });
                }
                if factor <= 0.0 {
                    return Err(IntentError::NonPositiveScale(factor));
                }
                self.announce_on_settle = true;
                self.go_to(base.with_scale(base.scale * factor), None, now);
                self.announce_if_idle();
            }
            NavIntent::GoToSection(section) => {
                self.announce_on_settle = true;
                self.go_to(self.sections.get(section).position, None, now);
                self.announce_if_idle();
            }
            NavIntent::ToggleSpatialNavigation => {
                let enabled = !self.state.accessibility.keyboard_spatial_nav_enabled;
                self.state.accessibility.keyboard_spatial_nav_enabled = enabled;
                self.announce(mode_announcement(enabled).to_string());
            }
        }
        Ok(())
    }

    /// Announce right away when a navigation request left the camera where
    /// it was (already there, or pinned against the bounds).
    fn announce_if_idle(&mut self) {
        if self.announce_on_settle && !self.animator.is_running() {
            let here = self.sections.section_at(&self.state.current_position);
            self.settle_on(here);
        }
    }

    fn announce(&mut self, text: String) {
        for listener in &mut self.announcement_listeners {
            listener(&text);
        }
        self.state.accessibility.last_announcement = Some(text);
        self.dirty = true;
    }

    // -----------------------------------------------------------------------
    // Layout and preferences
    // -----------------------------------------------------------------------

    fn change_layout_mode(&mut self, mode: LayoutMode, now: Instant) {
        let change = self.arbiter.set_mode(mode);
        if change.previous == change.current {
            return;
        }
        for gesture in self.recognizer.set_enabled(change.strategy.recognizer_enabled()) {
            // Rejections are already logged and reported by dispatch.
            let _ = self.dispatch_at(Intent::Gesture(gesture), now);
        }
        self.sync_touch_state();
        self.state.layout_mode = mode;
        self.dirty = true;
    }

    fn change_layout(&mut self, layout: GridLayout, now: Instant) {
        if layout == self.state.layout {
            return;
        }
        let destination = self
            .animator
            .target()
            .and_then(|t| self.sections.section_at(&t))
            .unwrap_or(self.state.active_section);
        self.sections = self.sections.relayout(layout);
        self.state.layout = layout;
        self.dirty = true;
        tracing::debug!(layout = layout.as_str(), section = %destination, "layout change");
        let target = self.sections.get(destination).position;
        self.go_to(target, Some(MovementKind::MatchCut), now);
        if !self.animator.is_running() {
            let here = self.sections.section_at(&self.state.current_position);
            self.settle_on(here);
        }
    }

    /// Follow changes of the configured reduced-motion source. An explicit
    /// `SetReducedMotion` stays in force until the source itself changes.
    fn poll_reduced_motion(&mut self, now: Instant) {
        let preferred = self.config.reduced_motion.prefers_reduced_motion();
        if preferred != self.reduced_motion_source {
            self.reduced_motion_source = preferred;
            tracing::debug!(reduced_motion = preferred, "reduced-motion preference changed");
            self.change_reduced_motion(preferred, now);
        }
    }

    fn change_reduced_motion(&mut self, enabled: bool, now: Instant) {
        if enabled == self.state.accessibility.reduced_motion {
            return;
        }
        self.state.accessibility.reduced_motion = enabled;
        self.dirty = true;
        if enabled {
            if let (Some(target), Some(kind)) = (self.animator.target(), self.animator.movement()) {
                self.settle_immediately(target, kind, now);
            }
        }
    }

    // -----------------------------------------------------------------------
    // Performance and publication
    // -----------------------------------------------------------------------

    fn apply_tier_change(&mut self, change: &TierChange) {
        let fidelity = Fidelity::for_tier(change.tier_after);
        self.animator.set_fidelity(fidelity.animator);
        self.recognizer.set_input_throttle(fidelity.input_throttle);
        if !fidelity.animator.secondary_effects {
            self.state.camera.effects = Default::default();
        }
        tracing::debug!(
            from = change.tier_before.as_str(),
            to = change.tier_after.as_str(),
            stride = fidelity.animator.sample_stride,
            throttle_ms = fidelity.input_throttle.as_millis() as u64,
            "fidelity change"
        );
        self.dirty = true;
    }

    fn publish(&mut self) {
        self.state.version += 1;
        if !self.subscribers.is_empty() {
            self.state.performance.counters.frames_published += 1;
            let snapshot = self.state.snapshot();
            for (_, listener) in &mut self.subscribers {
                listener(&snapshot);
            }
        }
        self.dirty = false;
    }

    fn reject(&mut self, intent: &'static str, err: IntentError) -> IntentError {
        self.state.performance.counters.intents_rejected += 1;
        tracing::warn!(intent, kind = err.kind(), error = %err, "intent rejected");
        for listener in &mut self.diagnostic_listeners {
            listener(&err);
        }
        err
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn check_position(position: &CanvasPosition) -> std::result::Result<(), IntentError> {
    if !position.is_finite() {
        return Err(IntentError::NonFinitePosition {
            x: position.x,
            y: position.y,
            scale: position.scale,
        });
    }
    if position.scale <= 0.0 {
        return Err(IntentError::NonPositiveScale(position.scale));
    }
    Ok(())
}

/// `ZoomIn` for a scale more than 5% larger, `ZoomOut` for more than 5%
/// smaller, `PanTilt` otherwise.
#[must_use]
pub fn default_movement(from: &CanvasPosition, to: &CanvasPosition) -> MovementKind {
    let ratio = to.scale / from.scale;
    if ratio > 1.0 + ZOOM_MOVEMENT_THRESHOLD {
        MovementKind::ZoomIn
    } else if ratio < 1.0 - ZOOM_MOVEMENT_THRESHOLD {
        MovementKind::ZoomOut
    } else {
        MovementKind::PanTilt
    }
}

fn gesture_kind(event: &GestureEvent) -> GestureKind {
    match event {
        GestureEvent::Start { kind, .. }
        | GestureEvent::Update { kind, .. }
        | GestureEvent::End { kind, .. } => *kind,
    }
}
