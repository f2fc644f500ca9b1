#![forbid(unsafe_code)]

//! Canonical input records consumed by the recognizer and navigator.
//!
//! Host adapters translate platform events (DOM pointer/touch/wheel/key
//! events, native window events) into these plain records. Every record
//! carries the [`Instant`] at which the host observed it.
//!
//! # Design Notes
//!
//! - Pointer coordinates are screen pixels relative to the canvas element.
//! - Touch records carry the full list of touches currently on the surface,
//!   not only the ones that changed.
//! - `Modifiers` use bitflags for easy combination.

use bitflags::bitflags;
use web_time::Instant;

use crate::geometry::Point;

/// Canonical input event.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    /// Mouse or pen pointer activity.
    Pointer(PointerEvent),
    /// Touch surface activity.
    Touch(TouchEvent),
    /// Wheel or trackpad scroll.
    Wheel(WheelEvent),
    /// Keyboard activity.
    Key(KeyEvent),
    /// Canvas focus gained (`true`) or lost (`false`).
    Focus {
        /// Whether focus was gained.
        gained: bool,
        /// Observation time.
        at: Instant,
    },
}

impl InputEvent {
    /// When the host observed this event.
    #[must_use]
    pub fn timestamp(&self) -> Instant {
        match self {
            Self::Pointer(e) => e.at,
            Self::Touch(e) => e.at,
            Self::Wheel(e) => e.at,
            Self::Key(e) => e.at,
            Self::Focus { at, .. } => *at,
        }
    }
}

/// Kind of device behind a pointer event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PointerType {
    /// Mouse.
    #[default]
    Mouse,
    /// Stylus.
    Pen,
    /// Finger; the recognizer tracks fingers through [`TouchEvent`]s instead.
    Touch,
}

/// Pointer lifecycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerPhase {
    /// Button pressed / contact made.
    Down,
    /// Pointer moved.
    Move,
    /// Button released / contact lifted.
    Up,
    /// The platform aborted the pointer sequence.
    Cancel,
}

/// A mouse or pen event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    /// Lifecycle phase.
    pub phase: PointerPhase,
    /// Device type.
    pub pointer_type: PointerType,
    /// Position in screen pixels.
    pub position: Point,
    /// Modifier keys held.
    pub modifiers: Modifiers,
    /// Observation time.
    pub at: Instant,
}

impl PointerEvent {
    /// Mouse event with no modifiers.
    #[must_use]
    pub const fn mouse(phase: PointerPhase, x: f64, y: f64, at: Instant) -> Self {
        Self {
            phase,
            pointer_type: PointerType::Mouse,
            position: Point::new(x, y),
            modifiers: Modifiers::NONE,
            at,
        }
    }
}

/// One contact point on a touch surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Touch {
    /// Platform identifier, stable for the lifetime of the contact.
    pub id: u64,
    /// Position in screen pixels.
    pub position: Point,
}

impl Touch {
    /// Create a touch point.
    #[must_use]
    pub const fn new(id: u64, x: f64, y: f64) -> Self {
        Self {
            id,
            position: Point::new(x, y),
        }
    }
}

/// Touch lifecycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TouchPhase {
    /// One or more contacts started.
    Start,
    /// One or more contacts moved.
    Move,
    /// One or more contacts lifted.
    End,
    /// The platform aborted the touch sequence.
    Cancel,
}

/// A touch surface event.
#[derive(Debug, Clone, PartialEq)]
pub struct TouchEvent {
    /// Lifecycle phase.
    pub phase: TouchPhase,
    /// Every contact still on the surface after this event.
    pub touches: Vec<Touch>,
    /// Observation time.
    pub at: Instant,
}

impl TouchEvent {
    /// Create a touch event.
    #[must_use]
    pub fn new(phase: TouchPhase, touches: Vec<Touch>, at: Instant) -> Self {
        Self { phase, touches, at }
    }
}

/// A wheel or trackpad scroll event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WheelEvent {
    /// Horizontal delta in pixels.
    pub delta_x: f64,
    /// Vertical delta in pixels (positive scrolls down).
    pub delta_y: f64,
    /// Pointer position in screen pixels.
    pub position: Point,
    /// Modifier keys held. Ctrl or Super turns the wheel into zoom.
    pub modifiers: Modifiers,
    /// Observation time.
    pub at: Instant,
}

impl WheelEvent {
    /// Whether this wheel event should zoom rather than pan.
    #[must_use]
    pub fn is_zoom(&self) -> bool {
        self.modifiers.intersects(Modifiers::CTRL | Modifiers::SUPER)
    }
}

/// A keyboard event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KeyEvent {
    /// The key code.
    pub code: KeyCode,
    /// Modifier keys held.
    pub modifiers: Modifiers,
    /// Press, repeat, or release.
    pub kind: KeyEventKind,
    /// Observation time.
    pub at: Instant,
}

impl KeyEvent {
    /// Key press with no modifiers.
    #[must_use]
    pub const fn new(code: KeyCode, at: Instant) -> Self {
        Self {
            code,
            modifiers: Modifiers::NONE,
            kind: KeyEventKind::Press,
            at,
        }
    }

    /// Same event with modifiers.
    #[must_use]
    pub const fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    /// Same event with a specific kind.
    #[must_use]
    pub const fn with_kind(mut self, kind: KeyEventKind) -> Self {
        self.kind = kind;
        self
    }

    /// Check if this is a specific character key.
    #[must_use]
    pub fn is_char(&self, c: char) -> bool {
        matches!(self.code, KeyCode::Char(ch) if ch == c)
    }

    /// Check if Alt modifier is held.
    #[must_use]
    pub const fn alt(&self) -> bool {
        self.modifiers.contains(Modifiers::ALT)
    }
}

/// Key codes the engine distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    /// A character key, after layout mapping.
    Char(char),
    /// Escape key.
    Escape,
    /// Enter/Return key.
    Enter,
    /// Tab key.
    Tab,
    /// Home key.
    Home,
    /// End key.
    End,
    /// Up arrow key.
    Up,
    /// Down arrow key.
    Down,
    /// Left arrow key.
    Left,
    /// Right arrow key.
    Right,
}

/// The type of key event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum KeyEventKind {
    /// Key was pressed (default when not distinguishable).
    #[default]
    Press,
    /// Key is being held (repeat event).
    Repeat,
    /// Key was released.
    Release,
}

bitflags! {
    /// Modifier keys held during an event.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Modifiers: u8 {
        /// No modifiers.
        const NONE  = 0b0000;
        /// Shift key.
        const SHIFT = 0b0001;
        /// Alt/Option key.
        const ALT   = 0b0010;
        /// Control key.
        const CTRL  = 0b0100;
        /// Super/Meta/Command key.
        const SUPER = 0b1000;
    }
}

impl Default for Modifiers {
    fn default() -> Self {
        Self::NONE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ctrl_or_super_wheel_zooms() {
        let at = Instant::now();
        let mut wheel = WheelEvent {
            delta_x: 0.0,
            delta_y: 10.0,
            position: Point::default(),
            modifiers: Modifiers::NONE,
            at,
        };
        assert!(!wheel.is_zoom());
        wheel.modifiers = Modifiers::CTRL;
        assert!(wheel.is_zoom());
        wheel.modifiers = Modifiers::SUPER | Modifiers::SHIFT;
        assert!(wheel.is_zoom());
    }

    #[test]
    fn key_builders_compose() {
        let at = Instant::now();
        let key = KeyEvent::new(KeyCode::Char('g'), at)
            .with_modifiers(Modifiers::ALT)
            .with_kind(KeyEventKind::Repeat);
        assert!(key.alt());
        assert!(key.is_char('g'));
        assert_eq!(key.kind, KeyEventKind::Repeat);
    }

    #[test]
    fn timestamp_is_carried_through() {
        let at = Instant::now();
        let event = InputEvent::Focus { gained: false, at };
        assert_eq!(event.timestamp(), at);
        let event = InputEvent::Pointer(PointerEvent::mouse(PointerPhase::Down, 1.0, 2.0, at));
        assert_eq!(event.timestamp(), at);
    }
}
