#![forbid(unsafe_code)]

//! Lightbox Runtime
//!
//! This crate owns the mutable side of the spatial lightbox engine: the
//! single-writer canvas state, the components that feed it, and the
//! snapshots it publishes.
//!
//! # Key Components
//!
//! - [`CanvasEngine`] - Canvas state orchestrator; every command funnels into
//!   [`CanvasEngine::dispatch`]
//! - [`CanvasSnapshot`] - Immutable state delivered to subscribers
//! - [`ScrollArbiter`] - Decides who owns scrolling in each [`LayoutMode`]
//! - [`PerformanceMonitor`] - Frame-rate tiers with hysteresis
//! - [`TransitionHistory`] - Ring buffer of finished camera transitions
//! - [`EngineConfig`] - Construction-time configuration
//!
//! # Role in the lightbox engine
//! `lightbox-runtime` is the orchestrator. It consumes input events and
//! geometry from `lightbox-core`, drives the camera animator once per host
//! tick, and hands snapshots to whatever renders the canvas.
//!
//! # Feature flags
//!
//! - `config-file`: load [`ConfigFile`] overlays from TOML or JSON
//! - `tracing-json`: [`logging::init_json_logging`] for JSON log output

pub mod arbiter;
pub mod config;
pub mod error;
pub mod history;
#[cfg(feature = "tracing-json")]
pub mod logging;
pub mod orchestrator;
pub mod perf;
pub mod state;

pub use arbiter::{LayoutMode, NoopScrollHost, ScrollArbiter, ScrollHost, ScrollOwner, ScrollStrategy};
#[cfg(feature = "config-file")]
pub use config::ConfigFile;
pub use config::{EngineConfig, ReducedMotionSource};
pub use error::{ConfigError, IntentError, StateViolation};
pub use history::{TransitionHistory, TransitionRecord};
pub use orchestrator::{CanvasEngine, Intent, SubscriptionId, default_movement};
pub use perf::{Fidelity, PerfConfig, PerformanceMonitor, PerformanceTier, TierChange};
pub use state::{
    AccessibilityState, CameraState, CanvasSnapshot, CanvasState, InteractionState,
    PerformanceCounters, PerformanceState, TouchState,
};
