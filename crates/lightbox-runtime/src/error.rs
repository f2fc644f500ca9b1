#![forbid(unsafe_code)]

//! Error taxonomy for the runtime.
//!
//! - [`ConfigError`]: construction fails fast.
//! - [`IntentError`]: a command was rejected; state is unchanged.
//! - [`StateViolation`]: an invariant breach found by validation.
//!
//! Animation failures are not errors. They are recorded as
//! `TransitionRecord { success: false, .. }`.

use lightbox_core::animation::MovementTableError;
use lightbox_core::section::{SectionTableError, UnknownSection};

/// Result alias for engine construction.
pub type Result<T, E = ConfigError> = std::result::Result<T, E>;

/// Invalid engine configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The section table is incomplete or malformed.
    #[error("invalid section table: {0}")]
    Sections(#[from] SectionTableError),

    /// The movement table is incomplete or malformed.
    #[error("invalid movement table: {0}")]
    Movements(#[from] MovementTableError),

    /// Bounds are inverted or non-finite.
    #[error("invalid bounds: {0}")]
    Bounds(String),

    /// Scale limits are not a positive, ordered range.
    #[error("invalid scale limits: min {min}, max {max}")]
    ScaleLimits {
        /// Configured minimum.
        min: f64,
        /// Configured maximum.
        max: f64,
    },

    /// The initial position is outside the configured constraints.
    #[error("initial position ({x}, {y}, {scale}) is outside the configured bounds")]
    InitialPosition {
        /// Configured x.
        x: f64,
        /// Configured y.
        y: f64,
        /// Configured scale.
        scale: f64,
    },

    /// Viewport dimensions are not positive and finite.
    #[error("invalid viewport size {width}x{height}")]
    Viewport {
        /// Configured width.
        width: f64,
        /// Configured height.
        height: f64,
    },

    /// Performance thresholds are inconsistent.
    #[error("invalid performance thresholds: {0}")]
    Perf(String),

    /// A tunable parameter is out of range.
    #[error("{field} {reason}")]
    Parameter {
        /// Dotted name of the offending field.
        field: &'static str,
        /// What is wrong with it.
        reason: String,
    },

    /// Reading a configuration file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parse error.
    #[cfg(feature = "config-file")]
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// JSON parse error.
    #[cfg(feature = "config-file")]
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ConfigError {
    pub(crate) fn parameter(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Parameter {
            field,
            reason: reason.into(),
        }
    }
}

/// A rejected command.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum IntentError {
    /// A section name did not match any section.
    #[error(transparent)]
    UnknownSection(#[from] UnknownSection),

    /// A requested position had a NaN or infinite component.
    #[error("position ({x}, {y}, {scale}) is not finite")]
    NonFinitePosition {
        /// Requested x.
        x: f64,
        /// Requested y.
        y: f64,
        /// Requested scale.
        scale: f64,
    },

    /// A requested scale or zoom factor was zero or negative.
    #[error("scale {0} must be positive")]
    NonPositiveScale(f64),

    /// A viewport resize had non-positive or non-finite dimensions.
    #[error("viewport size {width}x{height} must be positive and finite")]
    InvalidViewport {
        /// Requested width.
        width: f64,
        /// Requested height.
        height: f64,
    },

    /// The engine has been disposed.
    #[error("engine has been disposed")]
    Disposed,
}

impl IntentError {
    /// Stable name for logs and counters.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UnknownSection(_) => "unknown_section",
            Self::NonFinitePosition { .. } => "non_finite_position",
            Self::NonPositiveScale(_) => "non_positive_scale",
            Self::InvalidViewport { .. } => "invalid_viewport",
            Self::Disposed => "disposed",
        }
    }
}

/// An invariant breach in canvas state.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StateViolation {
    /// The current position lies outside the configured constraints.
    #[error("current position is outside the configured bounds")]
    PositionOutOfBounds,

    /// `target_position` and `camera.active_movement` disagree on whether a
    /// transition is in flight.
    #[error("target position and active movement disagree")]
    TargetMovementMismatch,

    /// The camera is idle but progress is not zero.
    #[error("idle camera reports progress {0}")]
    IdleProgress(f64),

    /// Progress left `[0, 1]`.
    #[error("camera progress {0} is outside [0, 1]")]
    ProgressOutOfRange(f64),

    /// Both panning and zooming flags are set.
    #[error("panning and zooming are both active")]
    ConflictingInteraction,

    /// Transition history exceeds its capacity.
    #[error("transition history holds {len} records, capacity {capacity}")]
    HistoryOverflow {
        /// Records held.
        len: usize,
        /// Configured capacity.
        capacity: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use lightbox_core::section::SectionId;

    #[test]
    fn unknown_section_message_names_input() {
        let err = IntentError::from("gallery".parse::<SectionId>().unwrap_err());
        assert_eq!(err.to_string(), "unknown section: \"gallery\"");
        assert_eq!(err.kind(), "unknown_section");
    }

    #[test]
    fn config_error_wraps_table_errors() {
        let err = ConfigError::from(SectionTableError::Missing(SectionId::Focus));
        assert!(err.to_string().contains("focus"));
    }

    #[test]
    fn parameter_error_formats_field() {
        let err = ConfigError::parameter("perf.window", "must be > 0");
        assert_eq!(err.to_string(), "perf.window must be > 0");
    }
}
