// Performance benchmarks for the gain pipeline
//
// Run with: cargo bench --bench gain_bench

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use madrigal_core::domain::gain;
use madrigal_core::domain::mixer::{resolve_mutes, ChannelStrip, LevelDb, Pan};
use madrigal_core::domain::wire::encode_bus_payloads;
use std::hint::black_box;

fn bench_stereo_gain(c: &mut Criterion) {
    let mut group = c.benchmark_group("stereo_gain");

    for pan in [-64, -32, 0, 32, 64].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(pan), pan, |b, &pan| {
            let pan = Pan::new(pan).unwrap();
            b.iter(|| {
                black_box(gain::stereo_gain(black_box(-12), black_box(0), Some(pan)));
            });
        });
    }

    group.finish();
}

fn bench_quantize(c: &mut Criterion) {
    let mut group = c.benchmark_group("quantize");

    for g in [0.4, 50.0, 1455.06, 8192.0, 16000.0].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(g), g, |b, &g| {
            b.iter(|| {
                black_box(gain::quantize(black_box(g)));
            });
        });
    }

    group.finish();
}

fn bench_resolve_mutes(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolve_mutes");

    for num_strips in [4, 13].iter() {
        let mut strips: Vec<ChannelStrip> =
            (0..*num_strips).map(|_| ChannelStrip::input()).collect();
        strips[1].solo = true;
        strips[2].mute = true;

        group.bench_with_input(
            BenchmarkId::from_parameter(num_strips),
            num_strips,
            |b, _| {
                b.iter(|| {
                    black_box(resolve_mutes(black_box(&strips), LevelDb::UNITY));
                });
            },
        );
    }

    group.finish();
}

fn bench_encode_bus_payloads(c: &mut Criterion) {
    let gains: Vec<(u16, u16)> = (0..12).map(|i| (i * 100, 8192 - i * 100)).collect();

    c.bench_function("encode_bus_payloads_12_channels", |b| {
        b.iter(|| {
            black_box(encode_bus_payloads(black_box(&gains), black_box(5793)));
        });
    });
}

criterion_group!(
    benches,
    bench_stereo_gain,
    bench_quantize,
    bench_resolve_mutes,
    bench_encode_bus_payloads
);

criterion_main!(benches);
