#![forbid(unsafe_code)]

//! Keyboard spatial navigation and screen-reader announcements.
//!
//! [`SpatialNavigator`] maps key presses to [`NavIntent`]s through a
//! configurable [`KeyMap`]. It holds no navigation state of its own: whether
//! spatial navigation is on is owned by the canvas state and passed in.
//!
//! # Invariants
//!
//! 1. While spatial navigation is off, only the toggle binding produces an
//!    intent.
//! 2. Key releases never produce intents. Auto-repeat produces intents for
//!    movement and zoom only.

use crate::event::{KeyCode, KeyEvent, KeyEventKind, Modifiers};
use crate::geometry::SECTION_SPAN;
use crate::section::SectionId;

/// Navigation request derived from a key press.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NavIntent {
    /// Move the camera by a canvas-space delta.
    MoveBy {
        /// Horizontal delta.
        dx: f64,
        /// Vertical delta.
        dy: f64,
    },
    /// Multiply the camera scale.
    ZoomBy {
        /// Scale multiplier.
        factor: f64,
    },
    /// Jump to a section.
    GoToSection(SectionId),
    /// Flip spatial keyboard navigation on or off.
    ToggleSpatialNavigation,
}

/// Action a key binding triggers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NavAction {
    /// One step left.
    MoveLeft,
    /// One step right.
    MoveRight,
    /// One step up.
    MoveUp,
    /// One step down.
    MoveDown,
    /// Zoom in by the map's factor.
    ZoomIn,
    /// Zoom out by the map's factor.
    ZoomOut,
    /// Jump to the first section.
    FirstSection,
    /// Jump to a specific section.
    Section(SectionId),
    /// Toggle spatial navigation.
    ToggleSpatialNavigation,
}

impl NavAction {
    fn repeats(self) -> bool {
        matches!(
            self,
            Self::MoveLeft | Self::MoveRight | Self::MoveUp | Self::MoveDown | Self::ZoomIn | Self::ZoomOut
        )
    }
}

/// One key binding.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KeyBinding {
    /// Key that triggers the action.
    pub code: KeyCode,
    /// Modifiers that must be held. Shift is ignored for character keys.
    pub modifiers: Modifiers,
    /// What the key does.
    pub action: NavAction,
}

impl KeyBinding {
    /// Binding with no modifiers.
    #[must_use]
    pub const fn new(code: KeyCode, action: NavAction) -> Self {
        Self {
            code,
            modifiers: Modifiers::NONE,
            action,
        }
    }

    /// Same binding requiring `modifiers`.
    #[must_use]
    pub const fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    fn matches(&self, key: &KeyEvent) -> bool {
        if self.code != key.code {
            return false;
        }
        let held = if matches!(key.code, KeyCode::Char(_)) {
            key.modifiers - Modifiers::SHIFT
        } else {
            key.modifiers
        };
        held == self.modifiers
    }
}

/// Key bindings plus step sizes.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyMap {
    /// Bindings, first match wins.
    pub bindings: Vec<KeyBinding>,
    /// Canvas units per movement step (default: one section span).
    pub step: f64,
    /// Zoom multiplier per zoom step (default: 1.25).
    pub zoom_factor: f64,
}

impl KeyMap {
    /// Action bound to `key`, if any.
    #[must_use]
    pub fn resolve(&self, key: &KeyEvent) -> Option<NavAction> {
        self.bindings.iter().find(|b| b.matches(key)).map(|b| b.action)
    }

    /// Whether the step sizes are usable.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.step.is_finite() && self.step > 0.0 && self.zoom_factor.is_finite() && self.zoom_factor > 1.0
    }
}

impl Default for KeyMap {
    fn default() -> Self {
        let mut bindings = vec![
            KeyBinding::new(KeyCode::Left, NavAction::MoveLeft),
            KeyBinding::new(KeyCode::Right, NavAction::MoveRight),
            KeyBinding::new(KeyCode::Up, NavAction::MoveUp),
            KeyBinding::new(KeyCode::Down, NavAction::MoveDown),
            KeyBinding::new(KeyCode::Char('+'), NavAction::ZoomIn),
            KeyBinding::new(KeyCode::Char('='), NavAction::ZoomIn),
            KeyBinding::new(KeyCode::Char('-'), NavAction::ZoomOut),
            KeyBinding::new(KeyCode::Char('g'), NavAction::ToggleSpatialNavigation)
                .with_modifiers(Modifiers::ALT),
            KeyBinding::new(KeyCode::Char('G'), NavAction::ToggleSpatialNavigation)
                .with_modifiers(Modifiers::ALT),
            KeyBinding::new(KeyCode::Home, NavAction::FirstSection),
        ];
        for (digit, id) in ('1'..='6').zip(SectionId::ALL) {
            bindings.push(KeyBinding::new(KeyCode::Char(digit), NavAction::Section(id)));
        }
        Self {
            bindings,
            step: SECTION_SPAN,
            zoom_factor: 1.25,
        }
    }
}

/// Maps key events to navigation intents.
#[derive(Debug, Clone, Default)]
pub struct SpatialNavigator {
    keymap: KeyMap,
}

impl SpatialNavigator {
    /// Create a navigator with the given bindings.
    #[must_use]
    pub fn new(keymap: KeyMap) -> Self {
        Self { keymap }
    }

    /// Intent for `key`, given whether spatial navigation is on.
    #[must_use]
    pub fn handle_key(&self, key: &KeyEvent, spatial_enabled: bool) -> Option<NavIntent> {
        if key.kind == KeyEventKind::Release {
            return None;
        }
        let action = self.keymap.resolve(key)?;
        if key.kind == KeyEventKind::Repeat && !action.repeats() {
            return None;
        }
        if !spatial_enabled && action != NavAction::ToggleSpatialNavigation {
            return None;
        }
        let step = self.keymap.step;
        let zoom = self.keymap.zoom_factor;
        Some(match action {
            NavAction::MoveLeft => NavIntent::MoveBy { dx: -step, dy: 0.0 },
            NavAction::MoveRight => NavIntent::MoveBy { dx: step, dy: 0.0 },
            NavAction::MoveUp => NavIntent::MoveBy { dx: 0.0, dy: -step },
            NavAction::MoveDown => NavIntent::MoveBy { dx: 0.0, dy: step },
            NavAction::ZoomIn => NavIntent::ZoomBy { factor: zoom },
            NavAction::ZoomOut => NavIntent::ZoomBy { factor: 1.0 / zoom },
            NavAction::FirstSection => NavIntent::GoToSection(SectionId::ALL[0]),
            NavAction::Section(id) => NavIntent::GoToSection(id),
            NavAction::ToggleSpatialNavigation => NavIntent::ToggleSpatialNavigation,
        })
    }

    /// Current bindings.
    #[must_use]
    pub fn keymap(&self) -> &KeyMap {
        &self.keymap
    }
}

/// Announcement for the camera resting on `section` at `scale`.
///
/// Example: `"Focus section, 2 of 6. Zoom 125%."`
#[must_use]
pub fn position_announcement(title: &str, section: SectionId, scale: f64) -> String {
    let pct = if scale.is_finite() {
        (scale * 100.0).round() as i64
    } else {
        100
    };
    format!(
        "{title} section, {} of {}. Zoom {pct}%.",
        section.index() + 1,
        SectionId::COUNT
    )
}

/// Announcement for toggling spatial navigation.
#[must_use]
pub fn mode_announcement(enabled: bool) -> &'static str {
    if enabled {
        "Spatial navigation on."
    } else {
        "Spatial navigation off."
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use web_time::Instant;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, Instant::now())
    }

    #[test]
    fn arrows_move_one_section() {
        let nav = SpatialNavigator::default();
        assert_eq!(
            nav.handle_key(&press(KeyCode::Right), true),
            Some(NavIntent::MoveBy { dx: 100.0, dy: 0.0 })
        );
        assert_eq!(
            nav.handle_key(&press(KeyCode::Up), true),
            Some(NavIntent::MoveBy { dx: 0.0, dy: -100.0 })
        );
    }

    #[test]
    fn zoom_keys_are_reciprocal() {
        let nav = SpatialNavigator::default();
        let Some(NavIntent::ZoomBy { factor: zin }) = nav.handle_key(&press(KeyCode::Char('=')), true)
        else {
            panic!("expected zoom in");
        };
        let Some(NavIntent::ZoomBy { factor: zout }) = nav.handle_key(&press(KeyCode::Char('-')), true)
        else {
            panic!("expected zoom out");
        };
        assert!((zin * zout - 1.0).abs() < 1e-12);
    }

    #[test]
    fn shifted_plus_still_zooms() {
        let nav = SpatialNavigator::default();
        let key = press(KeyCode::Char('+')).with_modifiers(Modifiers::SHIFT);
        assert_eq!(nav.handle_key(&key, true), Some(NavIntent::ZoomBy { factor: 1.25 }));
    }

    #[test]
    fn disabled_mode_only_accepts_toggle() {
        let nav = SpatialNavigator::default();
        assert_eq!(nav.handle_key(&press(KeyCode::Right), false), None);
        assert_eq!(nav.handle_key(&press(KeyCode::Char('3')), false), None);
        let toggle = press(KeyCode::Char('g')).with_modifiers(Modifiers::ALT);
        assert_eq!(
            nav.handle_key(&toggle, false),
            Some(NavIntent::ToggleSpatialNavigation)
        );
        assert_eq!(nav.handle_key(&press(KeyCode::Char('g')), true), None);
    }

    #[test]
    fn digits_and_home_jump_to_sections() {
        let nav = SpatialNavigator::default();
        assert_eq!(
            nav.handle_key(&press(KeyCode::Char('6')), true),
            Some(NavIntent::GoToSection(SectionId::Portfolio))
        );
        assert_eq!(
            nav.handle_key(&press(KeyCode::Home), true),
            Some(NavIntent::GoToSection(SectionId::Capture))
        );
        assert_eq!(nav.handle_key(&press(KeyCode::Char('7')), true), None);
    }

    #[test]
    fn release_and_toggle_repeat_are_ignored() {
        let nav = SpatialNavigator::default();
        let release = press(KeyCode::Right).with_kind(KeyEventKind::Release);
        assert_eq!(nav.handle_key(&release, true), None);
        let repeat = press(KeyCode::Right).with_kind(KeyEventKind::Repeat);
        assert!(nav.handle_key(&repeat, true).is_some());
        let toggle_repeat = press(KeyCode::Char('g'))
            .with_modifiers(Modifiers::ALT)
            .with_kind(KeyEventKind::Repeat);
        assert_eq!(nav.handle_key(&toggle_repeat, true), None);
    }

    #[test]
    fn announcements_are_formatted() {
        assert_eq!(
            position_announcement("Focus", SectionId::Focus, 1.25),
            "Focus section, 2 of 6. Zoom 125%."
        );
        assert_eq!(mode_announcement(true), "Spatial navigation on.");
        assert_eq!(mode_announcement(false), "Spatial navigation off.");
    }

    #[test]
    fn default_keymap_is_valid() {
        assert!(KeyMap::default().is_valid());
        let bad = KeyMap {
            zoom_factor: 0.5,
            ..KeyMap::default()
        };
        assert!(!bad.is_valid());
    }
}
