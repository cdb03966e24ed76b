//! Benchmarks for pointer resolution and hover processing.
//!
//! Run with: cargo bench
//!
//! Results are saved to `target/criterion/` with HTML reports.
#![allow(clippy::expect_used, clippy::cast_precision_loss)]

use std::rc::Rc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use heatgrid::hover::{GridHoverController, HoverEvent, PointerChannel};
use heatgrid::layout::{resolve_in_shape, ScalePair};
use heatgrid::{Dataset, Datum, GridBounds, GridShape, HeatmapConfig, PointerPosition, Row};

fn dataset(rows: usize, columns: usize) -> Dataset {
    Dataset::new(
        (0..rows)
            .map(|_| Row::new(Datum::new(), (0..columns).map(|_| Datum::new()).collect()))
            .collect(),
    )
}

/// Diagonal sweep across (and past) a grid of the given pixel size
fn sweep(width: f64, height: f64, points: usize) -> Vec<PointerPosition> {
    (0..points)
        .map(|i| {
            let t = i as f64 / points as f64 * 1.1;
            PointerPosition::new(t * width, t * height)
        })
        .collect()
}

fn bench_resolve(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolve");
    for size in [10_u32, 100, 1000] {
        let scales = ScalePair::build(GridShape::new(size, size), 25.0);
        let bounds = GridBounds::from_origin(0.0, 0.0, scales.pixel_width, scales.pixel_height);
        let points = sweep(scales.pixel_width, scales.pixel_height, 1000);

        group.throughput(Throughput::Elements(points.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &points, |b, points| {
            b.iter(|| {
                for &p in points {
                    black_box(resolve_in_shape(black_box(p), &bounds, &scales));
                }
            })
        });
    }
    group.finish();
}

fn bench_controller(c: &mut Criterion) {
    let config = HeatmapConfig::default();
    let tile = config.tile_size;
    let ds = Rc::new(dataset(50, 50));
    let mut controller = GridHoverController::new(config, ds, |e: HoverEvent| {
        black_box(e);
    })
    .expect("valid config");
    let pointer = PointerChannel::new();
    controller.attach(
        &pointer,
        GridBounds::from_origin(0.0, 0.0, 50.0 * tile, 50.0 * tile),
    );
    let points = sweep(50.0 * tile, 50.0 * tile, 1000);

    c.bench_function("controller_sweep_50x50", |b| {
        b.iter(|| {
            for &p in &points {
                pointer.emit(p);
            }
        })
    });
}

criterion_group!(benches, bench_resolve, bench_controller);
criterion_main!(benches);
