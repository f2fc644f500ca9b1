#![forbid(unsafe_code)]

//! Camera animation: easing curves, movement profiles, and the animator.
//!
//! Nothing in this module reads a clock. Every time-dependent call takes an
//! explicit [`web_time::Instant`], which keeps frame output reproducible.

pub mod animator;
pub mod easing;
pub mod profile;

pub use animator::{
    AnimatorConfig, AnimatorFidelity, AnimatorStep, CameraAnimator, CameraEffects, CameraFrame,
    Completion, MAX_FOCUS_BLUR,
};
pub use easing::Easing;
pub use profile::{
    CameraMovementProfile, MovementKind, MovementPriority, MovementTable, MovementTableError,
};
