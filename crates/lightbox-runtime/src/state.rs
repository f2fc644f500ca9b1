#![forbid(unsafe_code)]

//! Canvas state and its published snapshot.
//!
//! [`CanvasState`] is owned exclusively by the engine and mutated only from
//! its dispatch path. Subscribers receive immutable [`CanvasSnapshot`]s.
//!
//! # Invariants
//!
//! 1. `target_position.is_some() == camera.active_movement.is_some()`.
//! 2. An idle camera reports zero progress and no movement start.
//! 3. `interaction.is_panning && interaction.is_zooming` is never true.
//! 4. `current_position` satisfies the configured bounds.
//! 5. The history never exceeds its capacity.

use std::time::Duration;

use lightbox_core::animation::{CameraEffects, MovementKind};
use lightbox_core::geometry::{BoundsConstraints, CanvasPosition, ViewportSize};
use lightbox_core::section::{GridLayout, SectionId};
use web_time::Instant;

use crate::arbiter::LayoutMode;
use crate::error::StateViolation;
use crate::history::{TransitionHistory, TransitionRecord};
use crate::perf::PerformanceTier;

/// Camera animation status.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CameraState {
    /// Movement in flight, if any.
    pub active_movement: Option<MovementKind>,
    /// When the current leg started.
    pub movement_start: Option<Instant>,
    /// Raw time progress of the current leg in `[0, 1]`.
    pub progress: f64,
    /// Secondary effect parameters for the renderer.
    pub effects: CameraEffects,
}

impl CameraState {
    /// Whether a movement is in flight.
    #[inline]
    #[must_use]
    pub fn is_moving(&self) -> bool {
        self.active_movement.is_some()
    }
}

/// Fingers the recognizer is following.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TouchState {
    /// No tracked touches.
    #[default]
    None,
    /// One finger down.
    Single,
    /// Two fingers down.
    Pinch,
}

impl TouchState {
    /// From a tracked-touch count.
    #[must_use]
    pub fn from_count(count: usize) -> Self {
        match count {
            0 => Self::None,
            1 => Self::Single,
            _ => Self::Pinch,
        }
    }
}

/// Direct-manipulation status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InteractionState {
    /// A pan gesture is in progress.
    pub is_panning: bool,
    /// A pinch or wheel-zoom gesture is in progress.
    pub is_zooming: bool,
    /// Tracked touches.
    pub touch_state: TouchState,
}

/// Accessibility status.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AccessibilityState {
    /// Keyboard spatial navigation is on.
    pub keyboard_spatial_nav_enabled: bool,
    /// Section that keyboard focus rests on.
    pub spatial_focus: Option<SectionId>,
    /// Positions are applied without animation.
    pub reduced_motion: bool,
    /// The most recent screen-reader announcement.
    pub last_announcement: Option<String>,
}

/// Per-operation counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PerformanceCounters {
    /// Intents that changed or validly left state.
    pub intents_applied: u64,
    /// Intents rejected with an error.
    pub intents_rejected: u64,
    /// Snapshots delivered to subscribers.
    pub frames_published: u64,
    /// Animator ticks skipped under reduced fidelity.
    pub frames_skipped: u64,
    /// Transitions started.
    pub transitions_started: u64,
    /// Transitions completed on time.
    pub transitions_completed: u64,
    /// Transitions completed late or forced.
    pub transitions_failed: u64,
    /// Retargets of in-flight transitions.
    pub retargets: u64,
}

/// Frame-rate status.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PerformanceState {
    /// Current tier.
    pub tier: PerformanceTier,
    /// Frames per second over the rolling window.
    pub fps: f64,
    /// Rolling average tick interval.
    pub average_frame_time: Duration,
    /// Operation counters.
    pub counters: PerformanceCounters,
}

/// The engine's mutable state.
#[derive(Debug, Clone)]
pub struct CanvasState {
    /// Where the camera is.
    pub current_position: CanvasPosition,
    /// Where the camera is heading; `Some` exactly while a transition runs.
    pub target_position: Option<CanvasPosition>,
    /// Section the camera last settled on.
    pub active_section: SectionId,
    /// Section before `active_section`.
    pub previous_section: Option<SectionId>,
    /// Grid arrangement.
    pub layout: GridLayout,
    /// Presentation mode.
    pub layout_mode: LayoutMode,
    /// Host viewport size.
    pub viewport: ViewportSize,
    /// Camera status.
    pub camera: CameraState,
    /// Direct manipulation status.
    pub interaction: InteractionState,
    /// Accessibility status.
    pub accessibility: AccessibilityState,
    /// Frame-rate status.
    pub performance: PerformanceState,
    /// Completed transitions.
    pub history: TransitionHistory,
    /// Incremented on every change.
    pub version: u64,
}

impl CanvasState {
    /// Fresh state resting on `section` at `position`.
    #[must_use]
    pub fn new(
        position: CanvasPosition,
        section: SectionId,
        layout: GridLayout,
        layout_mode: LayoutMode,
        viewport: ViewportSize,
        history_capacity: usize,
    ) -> Self {
        Self {
            current_position: position,
            target_position: None,
            active_section: section,
            previous_section: None,
            layout,
            layout_mode,
            viewport,
            camera: CameraState::default(),
            interaction: InteractionState::default(),
            accessibility: AccessibilityState::default(),
            performance: PerformanceState::default(),
            history: TransitionHistory::with_capacity(history_capacity),
            version: 0,
        }
    }

    /// Immutable copy for subscribers.
    #[must_use]
    pub fn snapshot(&self) -> CanvasSnapshot {
        CanvasSnapshot {
            version: self.version,
            current_position: self.current_position,
            target_position: self.target_position,
            active_section: self.active_section,
            previous_section: self.previous_section,
            layout: self.layout,
            layout_mode: self.layout_mode,
            viewport: self.viewport,
            camera: self.camera,
            interaction: self.interaction,
            accessibility: self.accessibility.clone(),
            performance: self.performance,
            transition_history: self.history.to_vec(),
            history_capacity: self.history.capacity(),
        }
    }

    /// Check every invariant.
    pub fn validate(&self, bounds: &BoundsConstraints) -> Result<(), StateViolation> {
        check(
            bounds,
            &self.current_position,
            self.target_position.as_ref(),
            &self.camera,
            &self.interaction,
            self.history.len(),
            self.history.capacity(),
        )
    }
}

/// Immutable view of [`CanvasState`] delivered to subscribers.
#[derive(Debug, Clone, PartialEq)]
pub struct CanvasSnapshot {
    /// State version this snapshot was taken at.
    pub version: u64,
    /// Where the camera is.
    pub current_position: CanvasPosition,
    /// Where the camera is heading.
    pub target_position: Option<CanvasPosition>,
    /// Section the camera last settled on.
    pub active_section: SectionId,
    /// Section before `active_section`.
    pub previous_section: Option<SectionId>,
    /// Grid arrangement.
    pub layout: GridLayout,
    /// Presentation mode.
    pub layout_mode: LayoutMode,
    /// Host viewport size.
    pub viewport: ViewportSize,
    /// Camera status.
    pub camera: CameraState,
    /// Direct manipulation status.
    pub interaction: InteractionState,
    /// Accessibility status.
    pub accessibility: AccessibilityState,
    /// Frame-rate status.
    pub performance: PerformanceState,
    /// Completed transitions, oldest first.
    pub transition_history: Vec<TransitionRecord>,
    /// Capacity of the history ring.
    pub history_capacity: usize,
}

impl CanvasSnapshot {
    /// Check every invariant against `bounds`.
    pub fn validate(&self, bounds: &BoundsConstraints) -> Result<(), StateViolation> {
        check(
            bounds,
            &self.current_position,
            self.target_position.as_ref(),
            &self.camera,
            &self.interaction,
            self.transition_history.len(),
            self.history_capacity,
        )
    }

    /// Whether a transition is in flight.
    #[must_use]
    pub fn is_transitioning(&self) -> bool {
        self.target_position.is_some()
    }
}

fn check(
    bounds: &BoundsConstraints,
    position: &CanvasPosition,
    target: Option<&CanvasPosition>,
    camera: &CameraState,
    interaction: &InteractionState,
    history_len: usize,
    history_capacity: usize,
) -> Result<(), StateViolation> {
    if !bounds.contains(position) {
        return Err(StateViolation::PositionOutOfBounds);
    }
    if target.is_some() != camera.active_movement.is_some() {
        return Err(StateViolation::TargetMovementMismatch);
    }
    if !(0.0..=1.0).contains(&camera.progress) {
        return Err(StateViolation::ProgressOutOfRange(camera.progress));
    }
    if camera.active_movement.is_none() && (camera.progress != 0.0 || camera.movement_start.is_some()) {
        return Err(StateViolation::IdleProgress(camera.progress));
    }
    if interaction.is_panning && interaction.is_zooming {
        return Err(StateViolation::ConflictingInteraction);
    }
    if history_len > history_capacity {
        return Err(StateViolation::HistoryOverflow {
            len: history_len,
            capacity: history_capacity,
        });
    }
    Ok(())
}
