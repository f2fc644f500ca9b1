#![forbid(unsafe_code)]

//! Camera movement kinds and their timing profiles.
//!
//! A [`MovementTable`] holds exactly one [`CameraMovementProfile`] per
//! [`MovementKind`]. Tables are configured once and never mutated while the
//! engine runs.

use std::fmt;
use std::time::Duration;

use super::easing::Easing;

/// Named camera transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum MovementKind {
    /// Primary pan/tilt between neighbouring positions.
    PanTilt,
    /// Push in towards a larger scale.
    ZoomIn,
    /// Pull back towards a smaller scale.
    ZoomOut,
    /// The single dramatic combined zoom/perspective move.
    DollyZoom,
    /// Focus-shift effect with a blur pulse.
    RackFocus,
    /// Shared-element match transition.
    MatchCut,
}

impl MovementKind {
    /// All kinds in declaration order.
    pub const ALL: [Self; 6] = [
        Self::PanTilt,
        Self::ZoomIn,
        Self::ZoomOut,
        Self::DollyZoom,
        Self::RackFocus,
        Self::MatchCut,
    ];

    #[inline]
    const fn index(self) -> usize {
        match self {
            Self::PanTilt => 0,
            Self::ZoomIn => 1,
            Self::ZoomOut => 2,
            Self::DollyZoom => 3,
            Self::RackFocus => 4,
            Self::MatchCut => 5,
        }
    }

    /// Easing used when no profile table is at hand (path previews).
    #[must_use]
    pub const fn default_easing(self) -> Easing {
        match self {
            Self::PanTilt => Easing::CINEMATIC,
            Self::ZoomIn => Easing::EaseOutCubic,
            Self::ZoomOut => Easing::EaseInOut,
            Self::DollyZoom => Easing::DRAMATIC,
            Self::RackFocus => Easing::EaseInOut,
            Self::MatchCut => Easing::EaseOutExpo,
        }
    }

    /// Stable name for logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PanTilt => "pan_tilt",
            Self::ZoomIn => "zoom_in",
            Self::ZoomOut => "zoom_out",
            Self::DollyZoom => "dolly_zoom",
            Self::RackFocus => "rack_focus",
            Self::MatchCut => "match_cut",
        }
    }
}

impl fmt::Display for MovementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scheduling priority of a movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum MovementPriority {
    /// Cosmetic; first to lose fidelity.
    Low,
    /// Regular navigation.
    #[default]
    Normal,
    /// Signature moves.
    High,
}

/// Timing profile for one movement kind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraMovementProfile {
    /// Which movement this profile times.
    pub kind: MovementKind,
    /// Wall-clock duration of the transition.
    pub duration: Duration,
    /// Progress curve.
    pub easing: Easing,
    /// Hint to the renderer that the move should be composited on the GPU.
    pub gpu_accelerated: bool,
    /// Scheduling priority.
    pub priority: MovementPriority,
}

impl CameraMovementProfile {
    /// Default profile for a kind.
    #[must_use]
    pub fn standard(kind: MovementKind) -> Self {
        let (ms, priority) = match kind {
            MovementKind::PanTilt => (800, MovementPriority::Normal),
            MovementKind::ZoomIn => (600, MovementPriority::Normal),
            MovementKind::ZoomOut => (600, MovementPriority::Normal),
            MovementKind::DollyZoom => (1200, MovementPriority::High),
            MovementKind::RackFocus => (400, MovementPriority::Low),
            MovementKind::MatchCut => (500, MovementPriority::High),
        };
        Self {
            kind,
            duration: Duration::from_millis(ms),
            easing: kind.default_easing(),
            gpu_accelerated: true,
            priority,
        }
    }

    /// Same profile with a zero duration (reduced motion).
    #[must_use]
    pub fn instant(self) -> Self {
        Self {
            duration: Duration::ZERO,
            ..self
        }
    }
}

/// Reasons a list of profiles cannot form a [`MovementTable`].
#[derive(Debug, Clone, PartialEq)]
pub enum MovementTableError {
    /// No profile for this kind.
    Missing(MovementKind),
    /// More than one profile for this kind.
    Duplicate(MovementKind),
    /// The profile's easing has non-finite parameters.
    InvalidEasing(MovementKind),
}

impl fmt::Display for MovementTableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing(kind) => write!(f, "movement table has no profile for {kind}"),
            Self::Duplicate(kind) => write!(f, "movement table has more than one profile for {kind}"),
            Self::InvalidEasing(kind) => write!(f, "movement profile {kind} has an invalid easing"),
        }
    }
}

impl std::error::Error for MovementTableError {}

/// One profile per movement kind.
#[derive(Debug, Clone, PartialEq)]
pub struct MovementTable {
    profiles: [CameraMovementProfile; 6],
}

impl MovementTable {
    /// Build a table from a list containing each kind exactly once.
    pub fn new(profiles: Vec<CameraMovementProfile>) -> Result<Self, MovementTableError> {
        let mut slots: [Option<CameraMovementProfile>; 6] = [None; 6];
        for profile in profiles {
            let slot = &mut slots[profile.kind.index()];
            if slot.is_some() {
                return Err(MovementTableError::Duplicate(profile.kind));
            }
            if !profile.easing.is_valid() {
                return Err(MovementTableError::InvalidEasing(profile.kind));
            }
            *slot = Some(profile);
        }
        for kind in MovementKind::ALL {
            if slots[kind.index()].is_none() {
                return Err(MovementTableError::Missing(kind));
            }
        }
        Ok(Self {
            profiles: MovementKind::ALL
                .map(|kind| slots[kind.index()].unwrap_or_else(|| CameraMovementProfile::standard(kind))),
        })
    }

    /// Profile for a kind.
    #[inline]
    #[must_use]
    pub fn get(&self, kind: MovementKind) -> CameraMovementProfile {
        self.profiles[kind.index()]
    }

    /// Iterate profiles in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &CameraMovementProfile> {
        self.profiles.iter()
    }
}

impl Default for MovementTable {
    fn default() -> Self {
        Self {
            profiles: MovementKind::ALL.map(CameraMovementProfile::standard),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_table_covers_every_kind() {
        let table = MovementTable::default();
        for kind in MovementKind::ALL {
            assert_eq!(table.get(kind).kind, kind);
        }
        assert_eq!(table.get(MovementKind::PanTilt).duration, Duration::from_millis(800));
        assert_eq!(table.get(MovementKind::DollyZoom).priority, MovementPriority::High);
    }

    #[test]
    fn missing_profile_is_rejected() {
        let profiles: Vec<_> = MovementTable::default()
            .iter()
            .copied()
            .filter(|p| p.kind != MovementKind::MatchCut)
            .collect();
        assert_eq!(
            MovementTable::new(profiles),
            Err(MovementTableError::Missing(MovementKind::MatchCut))
        );
    }

    #[test]
    fn duplicate_profile_is_rejected() {
        let mut profiles: Vec<_> = MovementTable::default().iter().copied().collect();
        profiles.push(CameraMovementProfile::standard(MovementKind::ZoomIn));
        assert_eq!(
            MovementTable::new(profiles),
            Err(MovementTableError::Duplicate(MovementKind::ZoomIn))
        );
    }

    #[test]
    fn custom_durations_survive_validation() {
        let profiles: Vec<_> = MovementKind::ALL
            .iter()
            .map(|&kind| CameraMovementProfile {
                duration: Duration::from_millis(100),
                ..CameraMovementProfile::standard(kind)
            })
            .collect();
        let table = MovementTable::new(profiles).expect("complete table");
        assert!(table.iter().all(|p| p.duration == Duration::from_millis(100)));
    }

    #[test]
    fn instant_zeroes_duration_only() {
        let profile = CameraMovementProfile::standard(MovementKind::ZoomIn).instant();
        assert_eq!(profile.duration, Duration::ZERO);
        assert_eq!(profile.easing, Easing::EaseOutCubic);
    }
}
