#![forbid(unsafe_code)]

//! Spatial lightbox engine public facade.
//!
//! Re-exports the types a host needs to drive the canvas: configuration,
//! the engine, input records, and published snapshots. The [`prelude`]
//! covers day-to-day use.
//!
//! ```ignore
//! use lightbox::prelude::*;
//!
//! let mut engine = CanvasEngine::new(EngineConfig::default())?;
//! engine.subscribe(|snap| render(snap.current_position));
//! engine.request_section(SectionId::Portfolio, None)?;
//! // once per display refresh:
//! engine.tick(web_time::Instant::now());
//! ```

use std::fmt;

// --- Core re-exports -------------------------------------------------------

pub use lightbox_core::animation::{
    CameraEffects, CameraMovementProfile, Easing, MovementKind, MovementPriority, MovementTable,
};
pub use lightbox_core::clock::{Clock, ManualClock, SystemClock};
pub use lightbox_core::event::{
    InputEvent, KeyCode, KeyEvent, Modifiers, PointerEvent, PointerPhase, PointerType, Touch,
    TouchEvent, TouchPhase, WheelEvent,
};
pub use lightbox_core::geometry::{
    BoundsConstraints, CanvasPosition, Point, SECTION_SPAN, ScaleLimits, ViewportSize,
};
pub use lightbox_core::gesture::{GestureConfig, GestureEvent, GestureKind, Velocity};
pub use lightbox_core::navigator::{KeyMap, NavIntent};
pub use lightbox_core::section::{GridLayout, SectionEntry, SectionId, SectionTable};

// --- Runtime re-exports ----------------------------------------------------

#[cfg(feature = "config-file")]
pub use lightbox_runtime::ConfigFile;
pub use lightbox_runtime::{
    CanvasEngine, CanvasSnapshot, ConfigError, EngineConfig, Intent, IntentError, LayoutMode,
    PerfConfig, PerformanceTier, ReducedMotionSource, ScrollHost, StateViolation, SubscriptionId,
    TransitionRecord,
};

// --- Errors ---------------------------------------------------------------

/// Top-level error type for lightbox hosts.
#[derive(Debug)]
pub enum Error {
    /// The engine could not be constructed.
    Config(ConfigError),
    /// A command was rejected.
    Intent(IntentError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(err) => write!(f, "{err}"),
            Self::Intent(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Config(err) => Some(err),
            Self::Intent(err) => Some(err),
        }
    }
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Self::Config(err)
    }
}

impl From<IntentError> for Error {
    fn from(err: IntentError) -> Self {
        Self::Intent(err)
    }
}

/// Standard result type for lightbox hosts.
pub type Result<T> = std::result::Result<T, Error>;

// --- Prelude --------------------------------------------------------------

pub mod prelude {
    pub use crate::{
        CanvasEngine, CanvasPosition, CanvasSnapshot, EngineConfig, Error, GridLayout, InputEvent,
        LayoutMode, MovementKind, Result, SectionId,
    };

    pub use crate::{core, runtime};
}

pub use lightbox_core as core;
pub use lightbox_runtime as runtime;
