#![forbid(unsafe_code)]

//! Scroll ownership arbiter.
//!
//! Decides who owns scrolling in each [`LayoutMode`] and keeps the host's
//! document scroll suppression balanced.
//!
//! | Mode         | Owner     | native | touch | wheel |
//! |--------------|-----------|--------|-------|-------|
//! | `FreeScroll` | Document  | yes    | yes   | yes   |
//! | `Canvas`     | None      | no     | no    | no    |
//! | `Timeline`   | Container | no     | yes   | yes   |
//!
//! # Invariants
//!
//! 1. The suppression depth is never negative. A `restore()` at depth zero
//!    is logged and ignored.
//! 2. The host hears "suppressed" only on the 0→1 depth transition and
//!    "restored" only on the 1→0 transition.
//! 3. `teardown()` always leaves the host restored.
//! 4. The gesture recognizer is enabled exactly when the owner is
//!    [`ScrollOwner::None`].

use std::fmt;

/// How the canvas is presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "config-file", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "config-file", serde(rename_all = "snake_case"))]
pub enum LayoutMode {
    /// Sections stacked in the normal document flow.
    FreeScroll,
    /// The pannable/zoomable canvas.
    #[default]
    Canvas,
    /// Sections in a horizontally scrolling container.
    Timeline,
}

impl LayoutMode {
    /// Scroll strategy for this mode.
    #[must_use]
    pub const fn strategy(self) -> ScrollStrategy {
        match self {
            Self::FreeScroll => ScrollStrategy {
                owner: ScrollOwner::Document,
                allow_native_scroll: true,
                allow_touch: true,
                allow_wheel: true,
            },
            Self::Canvas => ScrollStrategy {
                owner: ScrollOwner::None,
                allow_native_scroll: false,
                allow_touch: false,
                allow_wheel: false,
            },
            Self::Timeline => ScrollStrategy {
                owner: ScrollOwner::Container,
                allow_native_scroll: false,
                allow_touch: true,
                allow_wheel: true,
            },
        }
    }

    /// Stable name for logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FreeScroll => "free_scroll",
            Self::Canvas => "canvas",
            Self::Timeline => "timeline",
        }
    }
}

impl fmt::Display for LayoutMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who scrolls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScrollOwner {
    /// The host document scrolls natively.
    Document,
    /// Nobody scrolls; the engine pans the canvas.
    None,
    /// A dedicated container scrolls.
    Container,
}

/// Scroll policy for a mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollStrategy {
    /// Who owns scrolling.
    pub owner: ScrollOwner,
    /// Whether the document may scroll natively.
    pub allow_native_scroll: bool,
    /// Whether touch scrolling reaches the owner.
    pub allow_touch: bool,
    /// Whether wheel scrolling reaches the owner.
    pub allow_wheel: bool,
}

impl ScrollStrategy {
    /// Whether the engine's gesture recognizer should run.
    #[inline]
    #[must_use]
    pub const fn recognizer_enabled(&self) -> bool {
        matches!(self.owner, ScrollOwner::None)
    }
}

/// The host's document scrolling switch.
pub trait ScrollHost {
    /// Suppress (`true`) or restore (`false`) native document scrolling.
    fn set_document_scroll_suppressed(&mut self, suppressed: bool);
}

impl<F: FnMut(bool)> ScrollHost for F {
    fn set_document_scroll_suppressed(&mut self, suppressed: bool) {
        self(suppressed)
    }
}

/// Host that ignores suppression requests.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopScrollHost;

impl ScrollHost for NoopScrollHost {
    fn set_document_scroll_suppressed(&mut self, _suppressed: bool) {}
}

/// Result of a mode switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeChange {
    /// Mode before the switch.
    pub previous: LayoutMode,
    /// Mode after the switch.
    pub current: LayoutMode,
    /// Strategy now in force.
    pub strategy: ScrollStrategy,
}

/// Owns the scroll strategy and the suppression counter.
pub struct ScrollArbiter {
    host: Box<dyn ScrollHost>,
    mode: LayoutMode,
    depth: u32,
    mode_hold: bool,
    unbalanced_restores: u64,
}

impl fmt::Debug for ScrollArbiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScrollArbiter")
            .field("mode", &self.mode)
            .field("depth", &self.depth)
            .field("unbalanced_restores", &self.unbalanced_restores)
            .finish()
    }
}

impl ScrollArbiter {
    /// Create an arbiter and apply `mode` to the host.
    pub fn new(host: Box<dyn ScrollHost>, mode: LayoutMode) -> Self {
        let mut arbiter = Self {
            host,
            mode,
            depth: 0,
            mode_hold: false,
            unbalanced_restores: 0,
        };
        if mode.strategy().owner == ScrollOwner::None {
            arbiter.mode_hold = true;
            arbiter.suppress();
        }
        arbiter
    }

    /// Switch modes, suppressing or restoring document scroll as needed.
    pub fn set_mode(&mut self, mode: LayoutMode) -> ModeChange {
        let previous = self.mode;
        if mode != previous {
            let needs_hold = mode.strategy().owner == ScrollOwner::None;
            if self.mode_hold && !needs_hold {
                self.mode_hold = false;
                self.restore();
            } else if !self.mode_hold && needs_hold {
                self.mode_hold = true;
                self.suppress();
            }
            self.mode = mode;
            tracing::debug!(from = previous.as_str(), to = mode.as_str(), "layout mode change");
        }
        ModeChange {
            previous,
            current: mode,
            strategy: mode.strategy(),
        }
    }

    /// Increase the suppression depth.
    pub fn suppress(&mut self) {
        self.depth = self.depth.saturating_add(1);
        if self.depth == 1 {
            self.host.set_document_scroll_suppressed(true);
        }
    }

    /// Decrease the suppression depth. Returns `false` when already at zero.
    pub fn restore(&mut self) -> bool {
        if self.depth == 0 {
            self.unbalanced_restores += 1;
            tracing::warn!(
                unbalanced_restores = self.unbalanced_restores,
                "scroll restore without matching suppress"
            );
            return false;
        }
        self.depth -= 1;
        if self.depth == 0 {
            self.mode_hold = false;
            self.host.set_document_scroll_suppressed(false);
        }
        true
    }

    /// Restore document scrolling unconditionally.
    pub fn teardown(&mut self) {
        if self.depth > 0 {
            self.host.set_document_scroll_suppressed(false);
        }
        self.depth = 0;
        self.mode_hold = false;
    }

    /// Current mode.
    #[inline]
    #[must_use]
    pub fn mode(&self) -> LayoutMode {
        self.mode
    }

    /// Strategy in force.
    #[must_use]
    pub fn strategy(&self) -> ScrollStrategy {
        self.mode.strategy()
    }

    /// Whether the gesture recognizer should run.
    #[must_use]
    pub fn recognizer_enabled(&self) -> bool {
        self.mode.strategy().recognizer_enabled()
    }

    /// Current suppression depth.
    #[inline]
    #[must_use]
    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// Whether document scrolling is currently suppressed.
    #[must_use]
    pub fn is_suppressed(&self) -> bool {
        self.depth > 0
    }

    /// Restores that arrived with nothing to restore.
    #[must_use]
    pub fn unbalanced_restores(&self) -> u64 {
        self.unbalanced_restores
    }
}
