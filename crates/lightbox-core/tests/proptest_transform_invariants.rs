//! Property-based invariant tests for the coordinate transforms.
//!
//! 1. Sampled paths start exactly at `from` and end exactly at `to`
//! 2. Path samples are finite and have positive scale
//! 3. Clamped positions satisfy the constraints
//! 4. `was_clamped` is false exactly when the input was already valid
//! 5. Scroll offsets survive a round trip through canvas space
//! 6. Easing curves stay in `[0, 1]` for standard curves

use lightbox_core::animation::{Easing, MovementKind};
use lightbox_core::geometry::{BoundsConstraints, CanvasPosition};
use lightbox_core::transform::{canvas_to_scroll, clamp_to_bounds, interpolate_path, scroll_to_canvas};
use proptest::prelude::*;

// ── Strategies ──────────────────────────────────────────────────────────

fn position_strategy() -> impl Strategy<Value = CanvasPosition> {
    (-1_000.0f64..1_000.0, -1_000.0f64..1_000.0, 0.05f64..10.0)
        .prop_map(|(x, y, scale)| CanvasPosition::new(x, y, scale))
}

fn any_position_strategy() -> impl Strategy<Value = CanvasPosition> {
    let component = prop_oneof![
        8 => -5_000.0f64..5_000.0,
        1 => Just(f64::NAN),
        1 => Just(f64::INFINITY),
        1 => Just(f64::NEG_INFINITY),
    ];
    (component.clone(), component.clone(), component)
        .prop_map(|(x, y, scale)| CanvasPosition::new(x, y, scale))
}

fn kind_strategy() -> impl Strategy<Value = MovementKind> {
    prop::sample::select(MovementKind::ALL.to_vec())
}

// ═══════════════════════════════════════════════════════════════════════
// 1–2. Path boundaries
// ═══════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn path_endpoints_are_exact(
        from in position_strategy(),
        to in position_strategy(),
        kind in kind_strategy(),
        samples in 0usize..120,
    ) {
        let path = interpolate_path(&from, &to, kind, samples);
        prop_assert_eq!(path.len(), samples.max(2));
        prop_assert_eq!(path[0], from);
        prop_assert_eq!(*path.last().expect("non-empty"), to);
    }

    #[test]
    fn path_samples_are_finite(
        from in position_strategy(),
        to in position_strategy(),
        kind in kind_strategy(),
        samples in 2usize..60,
    ) {
        for p in interpolate_path(&from, &to, kind, samples) {
            prop_assert!(p.is_finite());
            prop_assert!(p.scale > 0.0);
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// 3–4. Clamping
// ═══════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn clamped_position_is_always_valid(position in any_position_strategy()) {
        let bounds = BoundsConstraints::default();
        let result = clamp_to_bounds(&position, &bounds);
        prop_assert!(bounds.contains(&result.position));
    }

    #[test]
    fn was_clamped_matches_validity(position in any_position_strategy()) {
        let bounds = BoundsConstraints::default();
        let result = clamp_to_bounds(&position, &bounds);
        prop_assert_eq!(result.was_clamped, !bounds.contains(&position));
        if !result.was_clamped {
            prop_assert_eq!(result.position, position);
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// 5–6. Scroll mapping and easing range
// ═══════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn scroll_round_trip(offset in 0.0f64..100_000.0, height in 1.0f64..4_000.0) {
        let back = canvas_to_scroll(&scroll_to_canvas(offset, height), height);
        prop_assert!((back - offset).abs() <= 1e-6 * offset.max(1.0));
    }

    #[test]
    fn standard_easings_stay_in_unit_range(t in -1.0f64..2.0) {
        for easing in [
            Easing::Linear,
            Easing::EaseInOut,
            Easing::EaseOutCubic,
            Easing::EaseOutExpo,
            Easing::CINEMATIC,
            Easing::DRAMATIC,
        ] {
            let v = easing.apply(t);
            prop_assert!((-1e-9..=1.0 + 1e-9).contains(&v), "{} gave {}", easing.name(), v);
        }
    }
}
