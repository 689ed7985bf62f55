//! # OPT4048 Benchmarks
//!
//! Decodificação do bloco de 16 bytes, paridade de checksum e o caminho
//! colorimétrico completo (lux, cromaticidade, CCT).
//!
//! Run: `cargo bench --bench opt4048_bench`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use sil_opt4048::{
    compute_checksum, decode_frame, derive_color, ByteOrder, ChecksumStatus, QuadChannelFrame,
};

/// Bloco bruto de um frame sob luz do dia
const DAYLIGHT_BLOCK: [u8; 16] = [
    0x20, 0xED, 0xCB, 0x70, //
    0x22, 0x0F, 0x58, 0x70, //
    0x20, 0xA6, 0x36, 0x70, //
    0x23, 0xE8, 0x00, 0x70,
];

fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode");

    for order in [ByteOrder::BigEndian, ByteOrder::LittleEndian] {
        group.bench_with_input(
            BenchmarkId::new("frame", format!("{:?}", order)),
            &order,
            |b, &order| b.iter(|| black_box(decode_frame(black_box(&DAYLIGHT_BLOCK), order))),
        );
    }

    let frame = decode_frame(&DAYLIGHT_BLOCK, ByteOrder::BigEndian);
    group.bench_function("codes", |b| b.iter(|| black_box(frame.codes())));

    group.finish();
}

fn bench_checksum(c: &mut Criterion) {
    let mut group = c.benchmark_group("checksum");

    group.bench_function("compute", |b| {
        b.iter(|| black_box(compute_checksum(black_box(0xABCDE), black_box(7), black_box(9))))
    });

    let frame = decode_frame(&DAYLIGHT_BLOCK, ByteOrder::BigEndian);
    group.bench_function("check_frame", |b| {
        b.iter(|| black_box(ChecksumStatus::check(black_box(&frame))))
    });

    group.finish();
}

fn bench_colorimetry(c: &mut Criterion) {
    let mut group = c.benchmark_group("colorimetry");

    let frame: QuadChannelFrame = decode_frame(&DAYLIGHT_BLOCK, ByteOrder::BigEndian);
    group.bench_function("derive_color", |b| {
        b.iter(|| black_box(derive_color(black_box(&frame))))
    });

    group.finish();
}

criterion_group!(benches, bench_decode, bench_checksum, bench_colorimetry);
criterion_main!(benches);
