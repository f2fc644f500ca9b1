//! End-to-end engine scenarios driven by a manual clock.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use lightbox_core::animation::MovementKind;
use lightbox_core::clock::{Clock, ManualClock};
use lightbox_core::event::{
    InputEvent, KeyCode, KeyEvent, Modifiers, Touch, TouchEvent, TouchPhase,
};
use lightbox_core::geometry::CanvasPosition;
use lightbox_core::section::SectionId;
use lightbox_runtime::{
    CanvasEngine, CanvasSnapshot, EngineConfig, IntentError, LayoutMode, PerformanceTier,
};
use tracing_subscriber::layer::SubscriberExt;

const FRAME: Duration = Duration::from_millis(16);

fn engine_with(config: EngineConfig) -> (CanvasEngine<ManualClock>, ManualClock) {
    let clock = ManualClock::new();
    let engine = CanvasEngine::with_clock(config, clock.clone()).unwrap();
    (engine, clock)
}

fn record_snapshots(engine: &mut CanvasEngine<ManualClock>) -> Rc<RefCell<Vec<CanvasSnapshot>>> {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    engine.subscribe(move |snap| sink.borrow_mut().push(snap.clone()));
    seen
}

fn tick_for(engine: &mut CanvasEngine<ManualClock>, clock: &ManualClock, step: Duration, n: usize) {
    for _ in 0..n {
        engine.tick(clock.advance(step));
    }
}

#[test]
fn pan_tilt_from_capture_to_portfolio() {
    let (mut engine, clock) = engine_with(EngineConfig::default());
    let seen = record_snapshots(&mut engine);
    assert_eq!(engine.snapshot().current_position, CanvasPosition::ORIGIN);
    assert_eq!(engine.snapshot().active_section, SectionId::Capture);

    engine
        .request_section(SectionId::Portfolio, Some(MovementKind::PanTilt))
        .unwrap();
    // 800ms at 60Hz, plus one tick to observe the deadline.
    tick_for(&mut engine, &clock, FRAME, 51);

    let snap = engine.snapshot();
    assert_eq!(snap.active_section, SectionId::Portfolio);
    assert_eq!(snap.previous_section, Some(SectionId::Capture));
    assert_eq!(snap.current_position, CanvasPosition::new(200.0, 100.0, 1.0));
    assert!(snap.target_position.is_none());
    assert!(snap.camera.active_movement.is_none());
    assert_eq!(snap.camera.progress, 0.0);

    let record = snap.transition_history.last().unwrap();
    assert!(record.success);
    assert_eq!(record.movement, MovementKind::PanTilt);
    assert_eq!(record.from_section, Some(SectionId::Capture));
    assert_eq!(record.to_section, Some(SectionId::Portfolio));

    // Intermediate frames move monotonically towards the target.
    let xs: Vec<f64> = seen.borrow().iter().map(|s| s.current_position.x).collect();
    assert!(xs.windows(2).all(|w| w[1] >= w[0] - 1e-9));
    assert!(seen.borrow().len() > 10);
}

#[test]
fn touch_pinch_triples_scale() {
    let (mut engine, clock) = engine_with(EngineConfig::default());
    let fingers = |phase, half_gap: f64, at| {
        InputEvent::Touch(TouchEvent::new(
            phase,
            vec![
                Touch::new(1, 640.0 - half_gap, 360.0),
                Touch::new(2, 640.0 + half_gap, 360.0),
            ],
            at,
        ))
    };

    engine.handle_input(&fingers(TouchPhase::Start, 25.0, clock.now())).unwrap();
    for step in 1..=10 {
        let at = clock.advance(FRAME);
        engine
            .handle_input(&fingers(TouchPhase::Move, 25.0 + 5.0 * f64::from(step), at))
            .unwrap();
        engine.tick(at);
    }
    let mid = engine.snapshot();
    assert!(mid.interaction.is_zooming);
    assert!((mid.current_position.scale - 3.0).abs() < 1e-9);

    let at = clock.advance(FRAME);
    engine
        .handle_input(&InputEvent::Touch(TouchEvent::new(TouchPhase::End, vec![], at)))
        .unwrap();
    engine.tick(at);
    let end = engine.snapshot();
    assert!(!end.interaction.is_zooming);
    assert_eq!(engine.validate_state(), Ok(()));
}

#[test]
fn slow_frames_degrade_then_recover() {
    let (mut engine, clock) = engine_with(EngineConfig::default());
    let target = CanvasPosition::new(200.0, 100.0, 1.0);
    let nominal_samples = engine.plan_path(target, MovementKind::PanTilt).unwrap().len();

    // The transition finishes long before the tier flips; the host keeps
    // rendering at the same slow cadence afterwards.
    engine.request_section(SectionId::Portfolio, None).unwrap();
    tick_for(&mut engine, &clock, Duration::from_millis(40), 40);

    let snap = engine.snapshot();
    assert_eq!(snap.active_section, SectionId::Portfolio);
    assert_eq!(snap.performance.tier, PerformanceTier::Degraded);
    assert!(snap.performance.fps < 30.0);
    let degraded_samples = engine.plan_path(target, MovementKind::PanTilt).unwrap().len();
    assert!(degraded_samples < nominal_samples);

    // Degraded fidelity drops intermediate frames.
    engine.request_section(SectionId::Capture, None).unwrap();
    tick_for(&mut engine, &clock, Duration::from_millis(40), 25);
    let snap = engine.snapshot();
    assert_eq!(snap.active_section, SectionId::Capture);
    assert!(snap.performance.counters.frames_skipped > 0);

    // Recovery happens at a healthy cadence even with nothing animating.
    tick_for(&mut engine, &clock, Duration::from_millis(10), 40);
    assert_eq!(engine.snapshot().performance.tier, PerformanceTier::Nominal);
    assert_eq!(
        engine.plan_path(target, MovementKind::PanTilt).unwrap().len(),
        nominal_samples
    );
}

#[test]
fn keyboard_move_with_reduced_motion_jumps() {
    let config = EngineConfig::default().with_reduced_motion(true);
    let (mut engine, clock) = engine_with(config);
    let seen = record_snapshots(&mut engine);
    let heard = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&heard);
    engine.on_announcement(move |text| sink.borrow_mut().push(text.to_string()));

    // Alt+G turns spatial navigation on; arrows do nothing before that.
    let right = InputEvent::Key(KeyEvent::new(KeyCode::Right, clock.now()));
    engine.handle_input(&right).unwrap();
    assert_eq!(engine.snapshot().current_position, CanvasPosition::ORIGIN);
    let toggle = InputEvent::Key(
        KeyEvent::new(KeyCode::Char('g'), clock.now()).with_modifiers(Modifiers::ALT),
    );
    engine.handle_input(&toggle).unwrap();
    engine.tick(clock.advance(FRAME));

    engine
        .handle_input(&InputEvent::Key(KeyEvent::new(KeyCode::Right, clock.now())))
        .unwrap();
    let snap = engine.snapshot();
    assert_eq!(snap.current_position, CanvasPosition::new(100.0, 0.0, 1.0));
    assert_eq!(snap.active_section, SectionId::Focus);
    tick_for(&mut engine, &clock, FRAME, 5);

    assert!(seen.borrow().iter().all(|s| s.camera.active_movement.is_none()));
    assert_eq!(
        *heard.borrow(),
        vec![
            "Spatial navigation on.".to_string(),
            "Focus section, 2 of 6. Zoom 100%.".to_string(),
        ]
    );
}

#[test]
fn rejected_intent_logs_warning() {
    #[derive(Default, Clone)]
    struct Warnings(Arc<AtomicU32>);

    impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for Warnings {
        fn on_event(&self, event: &tracing::Event<'_>, _ctx: tracing_subscriber::layer::Context<'_, S>) {
            if *event.metadata().level() == tracing::Level::WARN {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
        }
    }

    let warnings = Warnings::default();
    let subscriber = tracing_subscriber::registry().with(warnings.clone());
    tracing::subscriber::with_default(subscriber, || {
        let (mut engine, _clock) = engine_with(EngineConfig::default());
        let err = engine.request_section_named("darkroom", None).unwrap_err();
        assert!(matches!(err, IntentError::UnknownSection(_)));
        assert_eq!(engine.snapshot().active_section, SectionId::Capture);
    });
    assert_eq!(warnings.0.load(Ordering::SeqCst), 1);
}

#[test]
fn free_scroll_mode_ignores_touch() {
    let (mut engine, clock) = engine_with(EngineConfig::default().with_layout_mode(LayoutMode::FreeScroll));
    assert!(!engine.arbiter().is_suppressed());
    let drag = |phase, x: f64, at| InputEvent::Touch(TouchEvent::new(phase, vec![Touch::new(1, x, 300.0)], at));
    engine.handle_input(&drag(TouchPhase::Start, 400.0, clock.now())).unwrap();
    engine
        .handle_input(&drag(TouchPhase::Move, 200.0, clock.advance(FRAME)))
        .unwrap();
    assert_eq!(engine.snapshot().current_position, CanvasPosition::ORIGIN);
    assert!(!engine.snapshot().interaction.is_panning);
}

#[test]
fn stalled_touch_pan_clears_panning() {
    let (mut engine, clock) = engine_with(EngineConfig::default());
    let finger = |phase, x: f64, at| InputEvent::Touch(TouchEvent::new(phase, vec![Touch::new(1, x, 360.0)], at));
    engine.handle_input(&finger(TouchPhase::Start, 640.0, clock.now())).unwrap();
    engine
        .handle_input(&finger(TouchPhase::Move, 600.0, clock.advance(FRAME)))
        .unwrap();
    assert!(engine.snapshot().interaction.is_panning);

    // The finger never lifts and no End arrives.
    tick_for(&mut engine, &clock, FRAME, 30);
    let snap = engine.snapshot();
    assert!(!snap.interaction.is_panning);
    assert!(!snap.interaction.is_zooming);
    assert_eq!(engine.validate_state(), Ok(()));
}

#[test]
fn stalled_pinch_clears_zooming() {
    let (mut engine, clock) = engine_with(EngineConfig::default());
    let fingers = |phase, half_gap: f64, at| {
        InputEvent::Touch(TouchEvent::new(
            phase,
            vec![
                Touch::new(1, 640.0 - half_gap, 360.0),
                Touch::new(2, 640.0 + half_gap, 360.0),
            ],
            at,
        ))
    };
    engine.handle_input(&fingers(TouchPhase::Start, 25.0, clock.now())).unwrap();
    engine
        .handle_input(&fingers(TouchPhase::Move, 40.0, clock.advance(FRAME)))
        .unwrap();
    assert!(engine.snapshot().interaction.is_zooming);

    tick_for(&mut engine, &clock, FRAME, 30);
    let snap = engine.snapshot();
    assert!(!snap.interaction.is_zooming);
    assert!(!snap.interaction.is_panning);
    assert_eq!(engine.validate_state(), Ok(()));
}
