//! Benchmarks for the per-frame CPU path.
//!
//! Run with: `cargo bench`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use orrery::prelude::*;

const DT: f32 = 1.0 / 60.0;

fn engine(count: usize, request: ShapeRequest) -> Engine {
    let config = EngineConfig::default().with_particle_count(count).with_seed(3);
    let mut engine = match Engine::new(config) {
        Ok(engine) => engine,
        Err(err) => panic!("default config rejected: {err}"),
    };
    engine.resize(1280, 720);
    engine.request_shape(request);
    for _ in 0..120 {
        engine.update(DT, 12.0);
    }
    engine
}

fn bench_update(c: &mut Criterion) {
    let mut group = c.benchmark_group("update");

    for count in [2000, 8000, 32000] {
        group.bench_with_input(BenchmarkId::new("planet", count), &count, |b, &count| {
            let mut engine = engine(count, ShapeRequest::Home);
            b.iter(|| {
                engine.update(DT, 12.0);
                black_box(engine.batch_keys().len())
            })
        });
    }

    group.bench_function("monogram", |b| {
        let mut engine = engine(8000, ShapeId::Monogram.into());
        b.iter(|| {
            engine.update(DT, 12.0);
            black_box(engine.batch_keys().len())
        })
    });

    group.finish();
}

fn bench_frame(c: &mut Criterion) {
    let mut group = c.benchmark_group("frame");

    group.bench_function("update_and_batch", |b| {
        let mut engine = engine(8000, ShapeRequest::Home);
        b.iter(|| {
            engine.update(DT, 12.0);
            black_box(engine.draw_list().splat_count())
        })
    });

    group.bench_function("raster_720p", |b| {
        let mut engine = engine(8000, ShapeRequest::Home);
        let mut surface = RasterSurface::new(1280, 720);
        b.iter(|| {
            engine.update(DT, 12.0);
            engine.render(&mut surface).ok();
            black_box(surface.frames())
        })
    });

    group.finish();
}

fn bench_regenerate(c: &mut Criterion) {
    c.bench_function("resize_regenerate", |b| {
        let mut engine = engine(8000, ShapeRequest::Home);
        let mut wide = false;
        b.iter(|| {
            wide = !wide;
            let (w, h) = if wide { (1600, 900) } else { (1280, 720) };
            black_box(engine.resize(w, h))
        })
    });
}

criterion_group!(benches, bench_update, bench_frame, bench_regenerate);
criterion_main!(benches);
