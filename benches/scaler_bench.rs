// Scaler Benchmarks
// Performance benchmarks for the per-frame scaling and compositing passes

use criterion::{criterion_group, criterion_main, Criterion};
use pokemini_rs90::display::{
    mix, Feedback, NativeFrame, OverlayCompositor, PanelFrame, Scaler, ScalingMode, NATIVE_HEIGHT,
    NATIVE_WIDTH,
};
use std::hint::black_box;

/// Native frame with every pixel distinct so mixing does real work
fn patterned_frame() -> NativeFrame {
    let mut frame = NativeFrame::new();
    for y in 0..NATIVE_HEIGHT {
        for x in 0..NATIVE_WIDTH {
            frame.set_pixel(x, y, ((x * 0x0841) ^ (y * 0x1003)) as u16);
        }
    }
    frame
}

/// Benchmark the RGB565 mix used by the 2.5x scaler
fn bench_mix(c: &mut Criterion) {
    let mut group = c.benchmark_group("pixel");

    group.bench_function("mix", |b| {
        let (mut a, bb) = (0x1234u16, 0xF00Fu16);
        b.iter(|| {
            a = mix(black_box(a), black_box(bb));
            black_box(a)
        });
    });

    group.finish();
}

/// Benchmark placing one native frame on the canvas
fn bench_place(c: &mut Criterion) {
    let mut group = c.benchmark_group("scaler_place");
    let frame = patterned_frame();

    for mode in [ScalingMode::Integer2x, ScalingMode::Interpolated2_5x] {
        let scaler = Scaler::new(mode).expect("valid geometry");
        let mut canvas = PanelFrame::new();
        group.bench_function(mode.label(), |b| {
            b.iter(|| {
                scaler.place(black_box(&frame), &mut canvas, 0);
                black_box(canvas.as_slice()[0])
            });
        });
    }

    group.finish();
}

/// Benchmark the 2x2 to 5x5 upscale from scratch to panel
fn bench_upscale(c: &mut Criterion) {
    let mut group = c.benchmark_group("scaler_upscale");
    let frame = patterned_frame();
    let scaler = Scaler::new(ScalingMode::Interpolated2_5x).expect("valid geometry");
    let mut scratch = PanelFrame::new();
    let mut panel = PanelFrame::new();
    scaler.place(&frame, &mut scratch, 0);

    group.bench_function("2x2_to_5x5", |b| {
        b.iter(|| {
            scaler.upscale(black_box(&scratch), &mut panel);
            black_box(panel.as_slice()[0])
        });
    });

    group.finish();
}

/// Benchmark a full compose pass with and without feedback
fn bench_compose(c: &mut Criterion) {
    let mut group = c.benchmark_group("overlay_compose");
    let frame = patterned_frame();
    let scaler = Scaler::new(ScalingMode::Integer2x).expect("valid geometry");
    let compositor = OverlayCompositor::new(&scaler);
    let mut canvas = PanelFrame::new();

    group.bench_function("idle", |b| {
        b.iter(|| {
            compositor.compose(&scaler, black_box(&frame), &mut canvas, Feedback::Idle);
        });
    });

    group.bench_function("shake", |b| {
        let mut offset = 2;
        b.iter(|| {
            offset = -offset;
            compositor.compose(
                &scaler,
                black_box(&frame),
                &mut canvas,
                Feedback::Shake(offset),
            );
        });
    });

    group.finish();
}

criterion_group!(benches, bench_mix, bench_place, bench_upscale, bench_compose);
criterion_main!(benches);
