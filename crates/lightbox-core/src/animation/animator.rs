#![forbid(unsafe_code)]

//! Camera animator: a resumable `start → tick* → complete` state machine.
//!
//! The animator never reads a clock. Callers pass the current [`Instant`] to
//! every operation, so tests drive it with synthetic time steps and get the
//! same frames every run.
//!
//! # Invariants
//!
//! 1. A completed transition always reports the exact target position.
//! 2. Retargeting restarts interpolation from the position the camera occupies
//!    at the moment of the retarget, so there is no discontinuous jump.
//! 3. Progress is derived from elapsed wall-clock time, never from tick
//!    counts. Skipping frames under reduced fidelity does not move the
//!    completion time.
//! 4. After `cancel()` or completion the animator is idle and `tick()` returns
//!    [`AnimatorStep::Idle`].
//!
//! # Failure Modes
//!
//! - Completion observed later than `deadline + late_tolerance` reports
//!   `success: false` (the target is still reported).
//! - Under reduced fidelity, more than `max_retargets` retargets of one
//!   transition make the next tick complete immediately with
//!   `success: false`.

use std::f64::consts::PI;
use std::time::Duration;

use web_time::Instant;

use super::profile::{CameraMovementProfile, MovementKind};
use crate::geometry::CanvasPosition;
use crate::transform::interpolate_at;

/// Peak rack-focus blur, in renderer-defined blur units.
pub const MAX_FOCUS_BLUR: f64 = 8.0;

/// Animator tuning.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimatorConfig {
    /// How late past the deadline a completion may be observed and still count
    /// as successful (default: 250ms).
    pub late_tolerance: Duration,
    /// Retargets allowed per transition while fidelity is reduced (default: 8).
    pub max_retargets: u32,
}

impl Default for AnimatorConfig {
    fn default() -> Self {
        Self {
            late_tolerance: Duration::from_millis(250),
            max_retargets: 8,
        }
    }
}

/// Sampling fidelity, set by the performance monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnimatorFidelity {
    /// Publish one frame every `sample_stride` ticks (1 = every tick).
    pub sample_stride: u32,
    /// Whether blur/perspective effects are computed.
    pub secondary_effects: bool,
}

impl AnimatorFidelity {
    /// Full fidelity.
    pub const FULL: Self = Self {
        sample_stride: 1,
        secondary_effects: true,
    };

    /// Whether any fidelity has been given up.
    #[must_use]
    pub fn is_reduced(&self) -> bool {
        self.sample_stride > 1 || !self.secondary_effects
    }
}

impl Default for AnimatorFidelity {
    fn default() -> Self {
        Self::FULL
    }
}

/// Numeric secondary-effect parameters for the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CameraEffects {
    /// Focus blur amount (0 = sharp).
    pub blur: f64,
    /// Perspective warp amount in `[0, 1]`.
    pub perspective: f64,
}

impl CameraEffects {
    /// No effects.
    pub const NONE: Self = Self {
        blur: 0.0,
        perspective: 0.0,
    };

    /// Effects for a movement at eased progress `t`.
    #[must_use]
    pub fn for_movement(kind: MovementKind, t: f64) -> Self {
        let envelope = (PI * t.clamp(0.0, 1.0)).sin();
        match kind {
            MovementKind::RackFocus => Self {
                blur: MAX_FOCUS_BLUR * envelope,
                perspective: 0.0,
            },
            MovementKind::DollyZoom => Self {
                blur: 0.0,
                perspective: envelope,
            },
            _ => Self::NONE,
        }
    }
}

/// One published animation frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraFrame {
    /// Interpolated camera position.
    pub position: CanvasPosition,
    /// Raw time progress in `[0, 1)`.
    pub progress: f64,
    /// Secondary effects (zeroed when disabled).
    pub effects: CameraEffects,
}

/// Final report of a transition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Completion {
    /// Where the transition started (before any retargets).
    pub origin: CanvasPosition,
    /// Final position (always the last target).
    pub position: CanvasPosition,
    /// Movement of the final leg.
    pub movement: MovementKind,
    /// Time from the original start to completion.
    pub elapsed: Duration,
    /// Number of retargets absorbed.
    pub retargets: u32,
    /// Whether the move finished on time.
    pub success: bool,
}

/// Result of one [`CameraAnimator::tick`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AnimatorStep {
    /// Nothing in flight.
    Idle,
    /// A new frame to publish.
    Frame(CameraFrame),
    /// In flight, but this tick is skipped under reduced fidelity.
    Skipped {
        /// Raw time progress at this tick.
        progress: f64,
    },
    /// The transition finished on this tick.
    Complete(Completion),
}

#[derive(Debug, Clone, Copy)]
struct Flight {
    origin: CanvasPosition,
    from: CanvasPosition,
    to: CanvasPosition,
    profile: CameraMovementProfile,
    leg_start: Instant,
    transition_start: Instant,
    retargets: u32,
    ticks: u64,
    last_published: CanvasPosition,
    last_progress: f64,
    diverged: bool,
}

impl Flight {
    fn raw_progress(&self, now: Instant) -> f64 {
        let duration = self.profile.duration;
        if duration.is_zero() {
            return 1.0;
        }
        let elapsed = now.saturating_duration_since(self.leg_start);
        (elapsed.as_secs_f64() / duration.as_secs_f64()).min(1.0)
    }

    fn sample(&self, raw: f64) -> (CanvasPosition, f64) {
        let eased = self.profile.easing.apply(raw);
        (
            interpolate_at(&self.from, &self.to, self.profile.kind, eased),
            eased,
        )
    }

    fn deadline(&self) -> Instant {
        self.leg_start + self.profile.duration
    }
}

/// Drives one camera transition at a time.
#[derive(Debug, Clone, Default)]
pub struct CameraAnimator {
    config: AnimatorConfig,
    fidelity: AnimatorFidelity,
    flight: Option<Flight>,
}

impl CameraAnimator {
    /// Create an idle animator.
    #[must_use]
    pub fn new(config: AnimatorConfig) -> Self {
        Self {
            config,
            fidelity: AnimatorFidelity::FULL,
            flight: None,
        }
    }

    /// Begin a transition, replacing anything in flight.
    pub fn start(
        &mut self,
        from: CanvasPosition,
        to: CanvasPosition,
        profile: CameraMovementProfile,
        now: Instant,
    ) {
        tracing::debug!(
            movement = profile.kind.as_str(),
            duration_ms = profile.duration.as_millis() as u64,
            from_x = from.x,
            from_y = from.y,
            to_x = to.x,
            to_y = to.y,
            "camera transition start"
        );
        self.flight = Some(Flight {
            origin: from,
            from,
            to,
            profile,
            leg_start: now,
            transition_start: now,
            retargets: 0,
            ticks: 0,
            last_published: from,
            last_progress: 0.0,
            diverged: false,
        });
    }

    /// Redirect the transition in flight towards `to`.
    ///
    /// The new leg starts at the camera's position at `now`. Returns `false`
    /// (and does nothing) when idle.
    pub fn retarget(
        &mut self,
        to: CanvasPosition,
        profile: CameraMovementProfile,
        now: Instant,
    ) -> bool {
        let max_retargets = self.config.max_retargets;
        let reduced = self.fidelity.is_reduced();
        let Some(flight) = self.flight.as_mut() else {
            return false;
        };
        let (current, _) = flight.sample(flight.raw_progress(now));
        flight.from = current;
        flight.to = to;
        flight.profile = profile;
        flight.leg_start = now;
        flight.retargets += 1;
        if reduced && flight.retargets > max_retargets {
            flight.diverged = true;
        }
        tracing::debug!(
            movement = profile.kind.as_str(),
            retargets = flight.retargets,
            diverged = flight.diverged,
            "camera transition retarget"
        );
        true
    }

    /// Advance to `now`.
    pub fn tick(&mut self, now: Instant) -> AnimatorStep {
        let Some(flight) = self.flight.as_mut() else {
            return AnimatorStep::Idle;
        };

        let raw = flight.raw_progress(now);
        if flight.diverged || raw >= 1.0 {
            let late = now.saturating_duration_since(flight.deadline());
            let success = !flight.diverged && late <= self.config.late_tolerance;
            let completion = Completion {
                origin: flight.origin,
                position: flight.to,
                movement: flight.profile.kind,
                elapsed: now.saturating_duration_since(flight.transition_start),
                retargets: flight.retargets,
                success,
            };
            tracing::debug!(
                movement = completion.movement.as_str(),
                success,
                elapsed_ms = completion.elapsed.as_millis() as u64,
                retargets = completion.retargets,
                "camera transition complete"
            );
            self.flight = None;
            return AnimatorStep::Complete(completion);
        }

        flight.ticks += 1;
        flight.last_progress = raw;
        let stride = u64::from(self.fidelity.sample_stride.max(1));
        if (flight.ticks - 1) % stride != 0 {
            return AnimatorStep::Skipped { progress: raw };
        }

        let (position, eased) = flight.sample(raw);
        flight.last_published = position;
        let effects = if self.fidelity.secondary_effects {
            CameraEffects::for_movement(flight.profile.kind, eased)
        } else {
            CameraEffects::NONE
        };
        AnimatorStep::Frame(CameraFrame {
            position,
            progress: raw,
            effects,
        })
    }

    /// Stop the transition, returning the last published position.
    pub fn cancel(&mut self) -> Option<CanvasPosition> {
        let flight = self.flight.take()?;
        tracing::debug!(
            movement = flight.profile.kind.as_str(),
            progress = flight.last_progress,
            "camera transition cancelled"
        );
        Some(flight.last_published)
    }

    /// Camera position at `now` without advancing state.
    #[must_use]
    pub fn position_at(&self, now: Instant) -> Option<CanvasPosition> {
        self.flight.as_ref().map(|f| f.sample(f.raw_progress(now)).0)
    }

    /// Whether a transition is in flight.
    #[inline]
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.flight.is_some()
    }

    /// Target of the transition in flight.
    #[must_use]
    pub fn target(&self) -> Option<CanvasPosition> {
        self.flight.as_ref().map(|f| f.to)
    }

    /// Movement of the current leg.
    #[must_use]
    pub fn movement(&self) -> Option<MovementKind> {
        self.flight.as_ref().map(|f| f.profile.kind)
    }

    /// When the current leg started.
    #[must_use]
    pub fn leg_start(&self) -> Option<Instant> {
        self.flight.as_ref().map(|f| f.leg_start)
    }

    /// Raw progress observed at the last tick.
    #[must_use]
    pub fn progress(&self) -> f64 {
        self.flight.as_ref().map_or(0.0, |f| f.last_progress)
    }

    /// Last published position of the transition in flight.
    #[must_use]
    pub fn last_published(&self) -> Option<CanvasPosition> {
        self.flight.as_ref().map(|f| f.last_published)
    }

    /// Current fidelity.
    #[must_use]
    pub fn fidelity(&self) -> AnimatorFidelity {
        self.fidelity
    }

    /// Change fidelity; takes effect on the next tick.
    pub fn set_fidelity(&mut self, fidelity: AnimatorFidelity) {
        self.fidelity = fidelity;
    }

    /// Current configuration.
    #[must_use]
    pub fn config(&self) -> &AnimatorConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::Easing;

    const FRAME: Duration = Duration::from_millis(16);

    fn linear_profile(kind: MovementKind, ms: u64) -> CameraMovementProfile {
        CameraMovementProfile {
            kind,
            duration: Duration::from_millis(ms),
            easing: Easing::Linear,
            gpu_accelerated: true,
            priority: Default::default(),
        }
    }

    fn run_to_completion(anim: &mut CameraAnimator, mut now: Instant) -> (Completion, Vec<CameraFrame>) {
        let mut frames = Vec::new();
        for _ in 0..10_000 {
            now += FRAME;
            match anim.tick(now) {
                AnimatorStep::Frame(f) => frames.push(f),
                AnimatorStep::Complete(c) => return (c, frames),
                AnimatorStep::Skipped { .. } => {}
                AnimatorStep::Idle => panic!("animator went idle without completing"),
            }
        }
        panic!("animator never completed");
    }

    #[test]
    fn idle_tick_is_idle() {
        let mut anim = CameraAnimator::default();
        assert_eq!(anim.tick(Instant::now()), AnimatorStep::Idle);
        assert!(anim.cancel().is_none());
    }

    #[test]
    fn reaches_target_with_success() {
        let mut anim = CameraAnimator::default();
        let t0 = Instant::now();
        let to = CanvasPosition::new(200.0, 100.0, 1.0);
        anim.start(CanvasPosition::ORIGIN, to, linear_profile(MovementKind::PanTilt, 160), t0);

        let (done, frames) = run_to_completion(&mut anim, t0);
        assert_eq!(done.position, to);
        assert!(done.success);
        assert!(!frames.is_empty());
        assert!(!anim.is_running());
    }

    #[test]
    fn frames_progress_monotonically_toward_target() {
        let mut anim = CameraAnimator::default();
        let t0 = Instant::now();
        anim.start(
            CanvasPosition::ORIGIN,
            CanvasPosition::new(100.0, 0.0, 1.0),
            linear_profile(MovementKind::PanTilt, 320),
            t0,
        );
        let (_, frames) = run_to_completion(&mut anim, t0);
        for pair in frames.windows(2) {
            assert!(pair[1].position.x >= pair[0].position.x);
        }
    }

    #[test]
    fn midpoint_frame_is_interpolated() {
        let mut anim = CameraAnimator::default();
        let t0 = Instant::now();
        anim.start(
            CanvasPosition::ORIGIN,
            CanvasPosition::new(100.0, 0.0, 1.0),
            linear_profile(MovementKind::PanTilt, 100),
            t0,
        );
        match anim.tick(t0 + Duration::from_millis(50)) {
            AnimatorStep::Frame(f) => {
                assert!((f.position.x - 50.0).abs() < 1e-9);
                assert!((f.progress - 0.5).abs() < 1e-9);
            }
            other => panic!("expected frame, got {other:?}"),
        }
    }

    #[test]
    fn retarget_continues_from_current_position() {
        let mut anim = CameraAnimator::default();
        let t0 = Instant::now();
        anim.start(
            CanvasPosition::ORIGIN,
            CanvasPosition::new(100.0, 0.0, 1.0),
            linear_profile(MovementKind::PanTilt, 100),
            t0,
        );
        let t_mid = t0 + Duration::from_millis(50);
        anim.tick(t_mid);
        assert!(anim.retarget(
            CanvasPosition::new(0.0, 100.0, 1.0),
            linear_profile(MovementKind::PanTilt, 100),
            t_mid,
        ));

        // Immediately after the retarget the camera has not jumped.
        let here = anim.position_at(t_mid).expect("running");
        assert!((here.x - 50.0).abs() < 1e-9);
        assert!(here.y.abs() < 1e-9);

        let (done, _) = run_to_completion(&mut anim, t_mid);
        assert_eq!(done.position, CanvasPosition::new(0.0, 100.0, 1.0));
        assert_eq!(done.origin, CanvasPosition::ORIGIN);
        assert_eq!(done.retargets, 1);
        assert!(done.success);
    }

    #[test]
    fn retarget_when_idle_is_rejected() {
        let mut anim = CameraAnimator::default();
        assert!(!anim.retarget(
            CanvasPosition::ORIGIN,
            linear_profile(MovementKind::PanTilt, 100),
            Instant::now(),
        ));
    }

    #[test]
    fn cancel_returns_last_published() {
        let mut anim = CameraAnimator::default();
        let t0 = Instant::now();
        anim.start(
            CanvasPosition::ORIGIN,
            CanvasPosition::new(100.0, 0.0, 1.0),
            linear_profile(MovementKind::PanTilt, 100),
            t0,
        );
        anim.tick(t0 + Duration::from_millis(25));
        let last = anim.cancel().expect("was running");
        assert!((last.x - 25.0).abs() < 1e-9);
        assert_eq!(anim.tick(t0 + Duration::from_millis(50)), AnimatorStep::Idle);
    }

    #[test]
    fn stride_skips_frames_but_keeps_deadline() {
        let profile = linear_profile(MovementKind::PanTilt, 160);
        let to = CanvasPosition::new(100.0, 0.0, 1.0);
        let t0 = Instant::now();

        let mut full = CameraAnimator::default();
        full.start(CanvasPosition::ORIGIN, to, profile, t0);
        let (full_done, full_frames) = run_to_completion(&mut full, t0);

        let mut reduced = CameraAnimator::default();
        reduced.set_fidelity(AnimatorFidelity {
            sample_stride: 2,
            secondary_effects: false,
        });
        reduced.start(CanvasPosition::ORIGIN, to, profile, t0);
        let (reduced_done, reduced_frames) = run_to_completion(&mut reduced, t0);

        assert!(reduced_frames.len() < full_frames.len());
        assert_eq!(reduced_done.position, full_done.position);
        assert_eq!(reduced_done.elapsed, full_done.elapsed);
        assert!(reduced_done.success);
    }

    #[test]
    fn late_completion_reports_failure() {
        let mut anim = CameraAnimator::default();
        let t0 = Instant::now();
        let to = CanvasPosition::new(100.0, 0.0, 1.0);
        anim.start(CanvasPosition::ORIGIN, to, linear_profile(MovementKind::PanTilt, 100), t0);
        match anim.tick(t0 + Duration::from_secs(2)) {
            AnimatorStep::Complete(c) => {
                assert!(!c.success);
                assert_eq!(c.position, to);
            }
            other => panic!("expected completion, got {other:?}"),
        }
    }

    #[test]
    fn excessive_retargets_under_degradation_diverge() {
        let mut anim = CameraAnimator::new(AnimatorConfig {
            max_retargets: 2,
            ..AnimatorConfig::default()
        });
        anim.set_fidelity(AnimatorFidelity {
            sample_stride: 3,
            secondary_effects: false,
        });
        let t0 = Instant::now();
        let profile = linear_profile(MovementKind::PanTilt, 500);
        anim.start(CanvasPosition::ORIGIN, CanvasPosition::new(100.0, 0.0, 1.0), profile, t0);
        for i in 1..=3 {
            anim.retarget(CanvasPosition::new(0.0, 50.0 * f64::from(i), 1.0), profile, t0);
        }
        match anim.tick(t0 + FRAME) {
            AnimatorStep::Complete(c) => {
                assert!(!c.success);
                assert_eq!(c.position, CanvasPosition::new(0.0, 150.0, 1.0));
            }
            other => panic!("expected forced completion, got {other:?}"),
        }
    }

    #[test]
    fn retargets_are_unbounded_at_full_fidelity() {
        let mut anim = CameraAnimator::new(AnimatorConfig {
            max_retargets: 1,
            ..AnimatorConfig::default()
        });
        let t0 = Instant::now();
        let profile = linear_profile(MovementKind::PanTilt, 100);
        anim.start(CanvasPosition::ORIGIN, CanvasPosition::new(100.0, 0.0, 1.0), profile, t0);
        for _ in 0..5 {
            anim.retarget(CanvasPosition::new(0.0, 100.0, 1.0), profile, t0);
        }
        let (done, _) = run_to_completion(&mut anim, t0);
        assert!(done.success);
    }

    #[test]
    fn zero_duration_completes_on_first_tick() {
        let mut anim = CameraAnimator::default();
        let t0 = Instant::now();
        let to = CanvasPosition::new(10.0, 10.0, 2.0);
        anim.start(
            CanvasPosition::ORIGIN,
            to,
            linear_profile(MovementKind::ZoomIn, 100).instant(),
            t0,
        );
        match anim.tick(t0) {
            AnimatorStep::Complete(c) => {
                assert_eq!(c.position, to);
                assert!(c.success);
            }
            other => panic!("expected completion, got {other:?}"),
        }
    }

    #[test]
    fn rack_focus_blurs_mid_flight_only_with_effects() {
        let t0 = Instant::now();
        let profile = linear_profile(MovementKind::RackFocus, 100);
        let mut anim = CameraAnimator::default();
        anim.start(CanvasPosition::ORIGIN, CanvasPosition::new(0.0, 0.0, 1.5), profile, t0);
        let AnimatorStep::Frame(frame) = anim.tick(t0 + Duration::from_millis(50)) else {
            panic!("expected frame");
        };
        assert!((frame.effects.blur - MAX_FOCUS_BLUR).abs() < 1e-9);

        anim.set_fidelity(AnimatorFidelity {
            sample_stride: 1,
            secondary_effects: false,
        });
        let AnimatorStep::Frame(frame) = anim.tick(t0 + Duration::from_millis(60)) else {
            panic!("expected frame");
        };
        assert_eq!(frame.effects, CameraEffects::NONE);
    }
}
