#![forbid(unsafe_code)]

//! Performance monitor: frame-time tiers with hysteresis.
//!
//! Samples the interval between engine ticks, keeps a rolling average, and
//! moves between three tiers. Each tier maps to a [`Fidelity`] that the
//! engine pushes into the animator, the gesture recognizer, and path
//! previews.
//!
//! ```text
//!            N slow samples            N very slow samples
//!  Nominal ─────────────────▶ Degraded ─────────────────────▶ Severe
//!     ▲                         │  ▲                            │
//!     └──── N fast samples ─────┘  └────── N fast samples ──────┘
//! ```
//!
//! # Evidence
//!
//! Every tier change produces a [`TierChange`] whose JSONL line records the
//! sample that triggered it, the streak, and the rolling average.
//!
//! # Invariants
//!
//! 1. The tier changes by at most one step on recovery.
//! 2. Streaks reset whenever the tier changes, so no two changes happen
//!    closer than `min(degrade_after, recover_after)` samples apart.
//! 3. Gaps longer than `idle_gap` are not samples.

use std::collections::VecDeque;
use std::time::Duration;

use lightbox_core::animation::AnimatorFidelity;
use lightbox_core::transform::MIN_PATH_SAMPLES;
use web_time::Instant;

/// Frame-rate tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "config-file", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "config-file", serde(rename_all = "snake_case"))]
pub enum PerformanceTier {
    /// Full fidelity.
    #[default]
    Nominal,
    /// Below 30 fps.
    Degraded,
    /// Below 15 fps.
    Severe,
}

impl PerformanceTier {
    /// Stable string for JSONL logging.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Nominal => "nominal",
            Self::Degraded => "degraded",
            Self::Severe => "severe",
        }
    }

    /// One tier better, saturating at `Nominal`.
    #[must_use]
    pub const fn prev(self) -> Self {
        match self {
            Self::Nominal | Self::Degraded => Self::Nominal,
            Self::Severe => Self::Degraded,
        }
    }
}

/// Tunables for tier selection.
#[derive(Debug, Clone, PartialEq)]
pub struct PerfConfig {
    /// Samples in the rolling average (default: 30).
    pub window: usize,
    /// Consecutive slow samples before degrading (default: 30).
    pub degrade_after: u32,
    /// Consecutive fast samples before recovering one tier (default: 30).
    pub recover_after: u32,
    /// Samples slower than this count towards `Degraded` (default: 33.3ms).
    pub degraded_frame_time: Duration,
    /// Samples slower than this count towards `Severe` (default: 66.7ms).
    pub severe_frame_time: Duration,
    /// Samples faster than this count towards recovery (default: 17ms).
    pub recovered_frame_time: Duration,
    /// Tick gaps longer than this are idle periods, not samples (default: 1s).
    pub idle_gap: Duration,
}

impl Default for PerfConfig {
    fn default() -> Self {
        Self {
            window: 30,
            degrade_after: 30,
            recover_after: 30,
            degraded_frame_time: Duration::from_micros(33_333),
            severe_frame_time: Duration::from_micros(66_667),
            recovered_frame_time: Duration::from_millis(17),
            idle_gap: Duration::from_secs(1),
        }
    }
}

impl PerfConfig {
    /// Validate ranges. Returns a list of problems; empty means valid.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.window == 0 {
            errors.push("perf.window must be > 0".into());
        }
        if self.degrade_after == 0 {
            errors.push("perf.degrade_after must be > 0".into());
        }
        if self.recover_after == 0 {
            errors.push("perf.recover_after must be > 0".into());
        }
        if self.recovered_frame_time >= self.degraded_frame_time {
            errors.push("perf.recovered_frame_time must be below perf.degraded_frame_time".into());
        }
        if self.degraded_frame_time >= self.severe_frame_time {
            errors.push("perf.degraded_frame_time must be below perf.severe_frame_time".into());
        }
        errors
    }
}

/// What the engine should give up at a tier.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fidelity {
    /// Tier this fidelity belongs to.
    pub tier: PerformanceTier,
    /// Animator stride and effects.
    pub animator: AnimatorFidelity,
    /// Gesture update throttle.
    pub input_throttle: Duration,
    /// Multiplier applied to path preview sample counts.
    pub path_sample_scale: f64,
}

impl Fidelity {
    /// Fidelity for a tier.
    #[must_use]
    pub const fn for_tier(tier: PerformanceTier) -> Self {
        match tier {
            PerformanceTier::Nominal => Self {
                tier,
                animator: AnimatorFidelity::FULL,
                input_throttle: Duration::ZERO,
                path_sample_scale: 1.0,
            },
            PerformanceTier::Degraded => Self {
                tier,
                animator: AnimatorFidelity {
                    sample_stride: 2,
                    secondary_effects: false,
                },
                input_throttle: Duration::from_millis(16),
                path_sample_scale: 0.5,
            },
            PerformanceTier::Severe => Self {
                tier,
                animator: AnimatorFidelity {
                    sample_stride: 3,
                    secondary_effects: false,
                },
                input_throttle: Duration::from_millis(33),
                path_sample_scale: 0.25,
            },
        }
    }

    /// Scale a nominal sample count, keeping at least two samples.
    #[must_use]
    pub fn path_samples(&self, nominal: usize) -> usize {
        ((nominal as f64 * self.path_sample_scale).round() as usize).max(MIN_PATH_SAMPLES)
    }
}

/// Decision taken for one sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TierDecision {
    /// Tier unchanged.
    Hold,
    /// Moved to a worse tier.
    Degrade,
    /// Moved one tier better.
    Recover,
}

impl TierDecision {
    /// Stable string for JSONL logging.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Hold => "hold",
            Self::Degrade => "degrade",
            Self::Recover => "recover",
        }
    }
}

/// Evidence for a tier change.
#[derive(Debug, Clone, PartialEq)]
pub struct TierChange {
    /// Sample index within the run.
    pub sample_idx: u64,
    /// Degrade or recover.
    pub decision: TierDecision,
    /// Tier before.
    pub tier_before: PerformanceTier,
    /// Tier after.
    pub tier_after: PerformanceTier,
    /// The triggering sample.
    pub frame_time: Duration,
    /// Rolling average at the time of the change.
    pub average_frame_time: Duration,
    /// Streak length that triggered the change.
    pub streak: u32,
    /// Streak required.
    pub threshold: u32,
}

impl TierChange {
    /// Format as a JSONL line.
    #[must_use]
    pub fn to_jsonl(&self) -> String {
        format!(
            r#"{{"schema":"lightbox-perf-tier-v1","sample_idx":{},"decision":"{}","tier_before":"{}","tier_after":"{}","frame_time_ms":{:.2},"average_frame_time_ms":{:.2},"streak":{},"threshold":{}}}"#,
            self.sample_idx,
            self.decision.as_str(),
            self.tier_before.as_str(),
            self.tier_after.as_str(),
            self.frame_time.as_secs_f64() * 1_000.0,
            self.average_frame_time.as_secs_f64() * 1_000.0,
            self.streak,
            self.threshold,
        )
    }
}

/// Rolling frame-time monitor.
#[derive(Debug, Clone)]
pub struct PerformanceMonitor {
    config: PerfConfig,
    tier: PerformanceTier,
    window: VecDeque<Duration>,
    window_sum: Duration,
    slow_streak: u32,
    severe_streak: u32,
    fast_streak: u32,
    last_tick: Option<Instant>,
    sample_idx: u64,
    total_degrades: u64,
    total_recoveries: u64,
    last_change: Option<TierChange>,
}

impl PerformanceMonitor {
    /// Create a monitor at `Nominal`.
    #[must_use]
    pub fn new(config: PerfConfig) -> Self {
        let window = VecDeque::with_capacity(config.window.max(1));
        Self {
            config,
            tier: PerformanceTier::Nominal,
            window,
            window_sum: Duration::ZERO,
            slow_streak: 0,
            severe_streak: 0,
            fast_streak: 0,
            last_tick: None,
            sample_idx: 0,
            total_degrades: 0,
            total_recoveries: 0,
            last_change: None,
        }
    }

    /// Record a tick at `now`; the gap since the previous tick is a sample.
    pub fn observe_tick(&mut self, now: Instant) -> Option<TierChange> {
        let previous = self.last_tick.replace(now)?;
        let gap = now.saturating_duration_since(previous);
        if gap.is_zero() || gap > self.config.idle_gap {
            return None;
        }
        self.observe_frame_time(gap)
    }

    /// Feed one frame-time sample directly.
    pub fn observe_frame_time(&mut self, frame_time: Duration) -> Option<TierChange> {
        self.sample_idx += 1;
        self.window.push_back(frame_time);
        self.window_sum += frame_time;
        while self.window.len() > self.config.window.max(1) {
            if let Some(old) = self.window.pop_front() {
                self.window_sum = self.window_sum.saturating_sub(old);
            }
        }

        self.severe_streak = streak(self.severe_streak, frame_time > self.config.severe_frame_time);
        self.slow_streak = streak(self.slow_streak, frame_time > self.config.degraded_frame_time);
        self.fast_streak = streak(self.fast_streak, frame_time < self.config.recovered_frame_time);

        let degrade_after = self.config.degrade_after;
        let target = if self.severe_streak >= degrade_after {
            PerformanceTier::Severe
        } else if self.slow_streak >= degrade_after {
            PerformanceTier::Degraded
        } else {
            self.tier
        };

        let (decision, streak_len, threshold) = if target > self.tier {
            let s = if target == PerformanceTier::Severe {
                self.severe_streak
            } else {
                self.slow_streak
            };
            self.total_degrades += 1;
            (TierDecision::Degrade, s, degrade_after)
        } else if self.fast_streak >= self.config.recover_after && self.tier > PerformanceTier::Nominal {
            self.total_recoveries += 1;
            (TierDecision::Recover, self.fast_streak, self.config.recover_after)
        } else {
            return None;
        };

        let before = self.tier;
        self.tier = match decision {
            TierDecision::Degrade => target,
            _ => before.prev(),
        };
        self.slow_streak = 0;
        self.severe_streak = 0;
        self.fast_streak = 0;

        let change = TierChange {
            sample_idx: self.sample_idx,
            decision,
            tier_before: before,
            tier_after: self.tier,
            frame_time,
            average_frame_time: self.average_frame_time(),
            streak: streak_len,
            threshold,
        };
        tracing::debug!(evidence = %change.to_jsonl(), "performance tier change");
        self.last_change = Some(change.clone());
        Some(change)
    }

    /// Current tier.
    #[inline]
    #[must_use]
    pub fn tier(&self) -> PerformanceTier {
        self.tier
    }

    /// Fidelity for the current tier.
    #[must_use]
    pub fn fidelity(&self) -> Fidelity {
        Fidelity::for_tier(self.tier)
    }

    /// Mean of the rolling window (zero before the first sample).
    #[must_use]
    pub fn average_frame_time(&self) -> Duration {
        match u32::try_from(self.window.len()) {
            Ok(0) | Err(_) => Duration::ZERO,
            Ok(n) => self.window_sum / n,
        }
    }

    /// Frames per second implied by the rolling average (zero before the
    /// first sample).
    #[must_use]
    pub fn fps(&self) -> f64 {
        let avg = self.average_frame_time().as_secs_f64();
        if avg > 0.0 { 1.0 / avg } else { 0.0 }
    }

    /// Samples observed.
    #[inline]
    #[must_use]
    pub fn samples(&self) -> u64 {
        self.sample_idx
    }

    /// Total degrade events.
    #[inline]
    #[must_use]
    pub fn total_degrades(&self) -> u64 {
        self.total_degrades
    }

    /// Total recovery events.
    #[inline]
    #[must_use]
    pub fn total_recoveries(&self) -> u64 {
        self.total_recoveries
    }

    /// The most recent tier change.
    #[must_use]
    pub fn last_change(&self) -> Option<&TierChange> {
        self.last_change.as_ref()
    }

    /// Access the configuration.
    #[must_use]
    pub fn config(&self) -> &PerfConfig {
        &self.config
    }

    /// Return to `Nominal` and clear all samples. Aggregate counts survive.
    pub fn reset(&mut self) {
        self.tier = PerformanceTier::Nominal;
        self.window.clear();
        self.window_sum = Duration::ZERO;
        self.slow_streak = 0;
        self.severe_streak = 0;
        self.fast_streak = 0;
        self.last_tick = None;
        self.sample_idx = 0;
        self.last_change = None;
    }
}

impl Default for PerformanceMonitor {
    fn default() -> Self {
        Self::new(PerfConfig::default())
    }
}

#[inline]
fn streak(current: u32, hit: bool) -> u32 {
    if hit { current.saturating_add(1) } else { 0 }
}
