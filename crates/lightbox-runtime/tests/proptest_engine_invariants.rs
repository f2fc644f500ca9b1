//! Property tests for engine-level invariants.
//!
//! - The camera settles on the last requested section under arbitrary
//!   retargeting.
//! - Positions stay inside the bounds under arbitrary gesture sequences.
//! - Scroll suppression calls stay balanced.
//! - Every published snapshot passes validation.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use lightbox_core::clock::ManualClock;
use lightbox_core::geometry::{CanvasPosition, Point};
use lightbox_core::gesture::{GestureEvent, GestureKind, Velocity};
use lightbox_core::navigator::NavIntent;
use lightbox_core::section::{GridLayout, SectionId};
use lightbox_runtime::{
    CanvasEngine, CanvasSnapshot, EngineConfig, LayoutMode, ScrollArbiter, ScrollHost,
};
use proptest::prelude::*;

const FRAME: Duration = Duration::from_millis(16);

fn engine() -> (CanvasEngine<ManualClock>, ManualClock) {
    let clock = ManualClock::new();
    let engine = CanvasEngine::with_clock(EngineConfig::default(), clock.clone()).unwrap();
    (engine, clock)
}

fn settle(engine: &mut CanvasEngine<ManualClock>, clock: &ManualClock) {
    for _ in 0..200 {
        engine.tick(clock.advance(FRAME));
        if !engine.needs_frame() {
            break;
        }
    }
}

fn section() -> impl Strategy<Value = SectionId> {
    (0usize..SectionId::COUNT).prop_map(|i| SectionId::ALL[i])
}

fn layout() -> impl Strategy<Value = GridLayout> {
    prop_oneof![
        Just(GridLayout::Grid3x2),
        Just(GridLayout::Grid2x3),
        Just(GridLayout::Row),
        Just(GridLayout::Column),
    ]
}

fn gesture() -> impl Strategy<Value = GestureEvent> {
    let kind = prop_oneof![Just(GestureKind::Pan), Just(GestureKind::Pinch)];
    prop_oneof![
        kind.clone().prop_map(|kind| GestureEvent::Start {
            kind,
            position: Point::new(640.0, 360.0),
        }),
        (kind.clone(), -5_000.0f64..5_000.0, -5_000.0f64..5_000.0, 0.01f64..100.0).prop_map(
            |(kind, delta_x, delta_y, scale_ratio)| GestureEvent::Update {
                kind,
                delta_x,
                delta_y,
                scale_ratio,
                velocity: Velocity::ZERO,
            }
        ),
        (kind, -20_000.0f64..20_000.0, -20_000.0f64..20_000.0).prop_map(|(kind, vx, vy)| {
            GestureEvent::End {
                kind,
                final_velocity: Velocity::new(vx, vy),
            }
        }),
    ]
}

#[derive(Debug, Clone)]
enum Op {
    Section(SectionId),
    Position(f64, f64, f64),
    Gesture(GestureEvent),
    Nav(NavIntent),
    Layout(GridLayout),
    Mode(LayoutMode),
    ReducedMotion(bool),
    Tick(u64),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        section().prop_map(Op::Section),
        (-1_000.0f64..1_000.0, -1_000.0f64..1_000.0, 0.01f64..20.0)
            .prop_map(|(x, y, s)| Op::Position(x, y, s)),
        gesture().prop_map(Op::Gesture),
        prop_oneof![
            Just(NavIntent::MoveBy { dx: 100.0, dy: 0.0 }),
            Just(NavIntent::MoveBy { dx: 0.0, dy: -100.0 }),
            Just(NavIntent::ZoomBy { factor: 1.25 }),
            Just(NavIntent::ZoomBy { factor: 0.8 }),
            section().prop_map(NavIntent::GoToSection),
            Just(NavIntent::ToggleSpatialNavigation),
        ]
        .prop_map(Op::Nav),
        layout().prop_map(Op::Layout),
        prop_oneof![
            Just(LayoutMode::Canvas),
            Just(LayoutMode::FreeScroll),
            Just(LayoutMode::Timeline),
        ]
        .prop_map(Op::Mode),
        any::<bool>().prop_map(Op::ReducedMotion),
        (1u64..400).prop_map(Op::Tick),
    ]
}

proptest! {
    #[test]
    fn settles_on_last_requested_section(
        requests in prop::collection::vec((section(), 0u64..30), 1..12),
    ) {
        let (mut engine, clock) = engine();
        for &(id, ticks) in &requests {
            engine.request_section(id, None).unwrap();
            for _ in 0..ticks {
                engine.tick(clock.advance(FRAME));
            }
        }
        settle(&mut engine, &clock);

        let last = requests.last().map(|&(id, _)| id).unwrap();
        let snap = engine.snapshot();
        prop_assert_eq!(snap.active_section, last);
        prop_assert!(snap.target_position.is_none());
        prop_assert_eq!(
            snap.current_position,
            engine.sections().get(last).position
        );
    }

    #[test]
    fn gestures_never_leave_bounds(events in prop::collection::vec(gesture(), 1..60)) {
        let (mut engine, clock) = engine();
        let bounds = engine.config().bounds;
        for event in events {
            engine.apply_gesture_intent(event).unwrap();
            prop_assert!(bounds.contains(&engine.snapshot().current_position));
            engine.tick(clock.advance(FRAME));
            prop_assert!(bounds.contains(&engine.snapshot().current_position));
        }
        settle(&mut engine, &clock);
        prop_assert_eq!(engine.validate_state(), Ok(()));
    }

    #[test]
    fn scroll_suppression_stays_balanced(ops in prop::collection::vec(0u8..5, 0..80)) {
        struct Recorder(Rc<RefCell<Vec<bool>>>);
        impl ScrollHost for Recorder {
            fn set_document_scroll_suppressed(&mut self, suppressed: bool) {
                self.0.borrow_mut().push(suppressed);
            }
        }

        let calls = Rc::new(RefCell::new(Vec::new()));
        let mut arbiter = ScrollArbiter::new(Box::new(Recorder(Rc::clone(&calls))), LayoutMode::Canvas);
        for op in ops {
            match op {
                0 => arbiter.suppress(),
                1 => {
                    let _ = arbiter.restore();
                }
                2 => {
                    arbiter.set_mode(LayoutMode::Canvas);
                }
                3 => {
                    arbiter.set_mode(LayoutMode::FreeScroll);
                }
                _ => {
                    arbiter.set_mode(LayoutMode::Timeline);
                }
            }
            let log = calls.borrow();
            // The host sees strict alternation starting with "suppressed".
            for (i, &suppressed) in log.iter().enumerate() {
                prop_assert_eq!(suppressed, i % 2 == 0);
            }
            prop_assert_eq!(arbiter.is_suppressed(), log.last() == Some(&true));
        }
        arbiter.teardown();
        prop_assert_eq!(arbiter.depth(), 0);
        let last = calls.borrow().last().copied();
        prop_assert_ne!(last, Some(true));
    }

    #[test]
    fn every_snapshot_is_consistent(ops in prop::collection::vec(op(), 1..80)) {
        let (mut engine, clock) = engine();
        let bounds = engine.config().bounds;
        let seen: Rc<RefCell<Vec<CanvasSnapshot>>> = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        engine.subscribe(move |snap| sink.borrow_mut().push(snap.clone()));

        for op in ops {
            let _ = match op {
                Op::Section(id) => engine.request_section(id, None),
                Op::Position(x, y, s) => engine.request_position(CanvasPosition::new(x, y, s), None),
                Op::Gesture(event) => engine.apply_gesture_intent(event),
                Op::Nav(nav) => engine.apply_accessibility_intent(nav),
                Op::Layout(layout) => engine.set_layout(layout),
                Op::Mode(mode) => engine.set_layout_mode(mode),
                Op::ReducedMotion(on) => engine.set_reduced_motion(on),
                Op::Tick(ms) => {
                    engine.tick(clock.advance(Duration::from_millis(ms)));
                    Ok(())
                }
            };
            prop_assert_eq!(engine.validate_state(), Ok(()));
        }
        settle(&mut engine, &clock);

        for snap in seen.borrow().iter() {
            prop_assert_eq!(snap.validate(&bounds), Ok(()));
        }
        let versions: Vec<u64> = seen.borrow().iter().map(|s| s.version).collect();
        prop_assert!(versions.windows(2).all(|w| w[0] < w[1]));
    }
}
