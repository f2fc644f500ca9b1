//! The prelude is enough to build and drive an engine.

use std::time::Duration;

use lightbox::prelude::*;
use lightbox::{IntentError, ManualClock};

fn run() -> Result<SectionId> {
    let clock = ManualClock::new();
    let mut engine = CanvasEngine::with_clock(EngineConfig::default(), clock.clone())?;
    engine.request_section(SectionId::Develop, Some(MovementKind::MatchCut))?;
    for _ in 0..40 {
        engine.tick(clock.advance(Duration::from_millis(16)));
    }
    Ok(engine.snapshot().active_section)
}

#[test]
fn prelude_drives_an_engine() {
    assert_eq!(run().unwrap(), SectionId::Develop);
}

#[test]
fn intent_errors_convert() {
    let clock = ManualClock::new();
    let mut engine = CanvasEngine::with_clock(EngineConfig::default(), clock).unwrap();
    let err: Error = engine.request_section_named("lobby", None).unwrap_err().into();
    assert!(matches!(err, Error::Intent(IntentError::UnknownSection(_))));
    assert!(err.to_string().contains("lobby"));
}
