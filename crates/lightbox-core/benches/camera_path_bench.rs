//! Benchmark: path sampling and animator ticking.
//!
//! Run with: `cargo bench -p lightbox-core --bench camera_path_bench`
//!
//! Covers the two per-frame hot spots: previewing a path at each fidelity
//! tier's sample count, and ticking an in-flight transition.

use std::hint::black_box;
use std::time::Duration;

use criterion::{Criterion, criterion_group, criterion_main};
use lightbox_core::animation::{AnimatorFidelity, CameraAnimator, CameraMovementProfile, MovementKind};
use lightbox_core::geometry::CanvasPosition;
use lightbox_core::transform::interpolate_path;
use web_time::Instant;

fn bench_interpolate_path(c: &mut Criterion) {
    let mut group = c.benchmark_group("interpolate_path");
    let from = CanvasPosition::new(0.0, 0.0, 1.0);
    let to = CanvasPosition::new(200.0, 100.0, 2.5);

    for samples in [15usize, 30, 60] {
        for kind in [MovementKind::PanTilt, MovementKind::DollyZoom] {
            group.bench_function(format!("{kind}/{samples}"), |b| {
                b.iter(|| interpolate_path(black_box(&from), black_box(&to), kind, samples));
            });
        }
    }
    group.finish();
}

fn bench_animator_tick(c: &mut Criterion) {
    let mut group = c.benchmark_group("animator_tick");
    let profile = CameraMovementProfile::standard(MovementKind::PanTilt);
    let from = CanvasPosition::ORIGIN;
    let to = CanvasPosition::new(200.0, 100.0, 1.0);

    for (label, fidelity) in [
        ("full", AnimatorFidelity::FULL),
        (
            "stride3",
            AnimatorFidelity {
                sample_stride: 3,
                secondary_effects: false,
            },
        ),
    ] {
        group.bench_function(label, |b| {
            let t0 = Instant::now();
            let mut anim = CameraAnimator::default();
            anim.set_fidelity(fidelity);
            anim.start(from, to, profile, t0);
            let mut now = t0;
            b.iter(|| {
                now += Duration::from_micros(10);
                if !anim.is_running() {
                    anim.start(from, to, profile, now);
                }
                black_box(anim.tick(now))
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_interpolate_path, bench_animator_tick);
criterion_main!(benches);
