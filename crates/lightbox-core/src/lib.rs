#![forbid(unsafe_code)]

//! Core: canvas geometry, input records, gestures, keyboard navigation, and
//! camera animation.
//!
//! # Role in the lightbox engine
//! `lightbox-core` is the pure layer. It owns the coordinate model that maps
//! the six fixed sections onto canvas positions, the recognizers that turn
//! raw input into pan/zoom intents, and the animator that moves the camera
//! between positions. Nothing here owns mutable engine state or reads a clock
//! implicitly.
//!
//! # How it fits in the system
//! `lightbox-runtime` owns the single mutable `CanvasState`, feeds
//! [`event::InputEvent`]s through [`gesture::GestureRecognizer`] and
//! [`navigator::SpatialNavigator`], and drives
//! [`animation::CameraAnimator`] once per tick.

pub mod animation;
pub mod clock;
pub mod event;
pub mod geometry;
pub mod gesture;
pub mod navigator;
pub mod section;
pub mod transform;

pub use animation::{CameraMovementProfile, Easing, MovementKind, MovementTable};
pub use clock::{Clock, ManualClock, SystemClock};
pub use geometry::{BoundsConstraints, CanvasPosition, Point, ScaleLimits, ViewportSize};
pub use section::{GridLayout, SectionEntry, SectionId, SectionTable};
