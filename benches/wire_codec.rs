//! Wire Codec Benchmarks
//!
//! Measures encode and decode throughput on the service channel plus the
//! region math the update path runs per dirty rectangle.

use bytes::BytesMut;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use freerds_surface::service::codec::{encode_server, MessageDecoder};
use freerds_surface::service::messages::{msg_type, ServerMessage};
use freerds_surface::Region;

/// Build the wire form of one client message
fn frame(msg_ty: u32, payload: &[u32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(8 + payload.len() * 4);
    bytes.extend_from_slice(&msg_ty.to_le_bytes());
    bytes.extend_from_slice(&((8 + payload.len() * 4) as u32).to_le_bytes());
    for value in payload {
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    bytes
}

/// Benchmark encoding one full update batch (begin, paint, end)
fn bench_encode_update_batch(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode_update_batch");

    let batch = [
        ServerMessage::BeginUpdate,
        ServerMessage::PaintRect {
            x: 0,
            y: 0,
            width: 1920,
            height: 1080,
        },
        ServerMessage::EndUpdate,
    ];

    group.throughput(Throughput::Elements(batch.len() as u64));
    group.bench_function("triplet", |b| {
        let mut buf = BytesMut::with_capacity(64);
        b.iter(|| {
            buf.clear();
            for msg in &batch {
                encode_server(black_box(msg), &mut buf);
            }
            black_box(buf.len())
        })
    });

    group.finish();
}

/// Benchmark encoding the attach message at typical name lengths
fn bench_encode_attach(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode_attach");

    let msg = ServerMessage::SharedFramebuffer {
        flags: 1,
        width: 1920,
        height: 1080,
        scanline: 7680,
        bits_per_pixel: 32,
        bytes_per_pixel: 4,
        name: "/freerds-shm.1.netsurf".to_string(),
    };

    group.bench_function("attach", |b| {
        let mut buf = BytesMut::with_capacity(128);
        b.iter(|| {
            buf.clear();
            encode_server(black_box(&msg), &mut buf);
            black_box(buf.len())
        })
    });

    group.finish();
}

/// Benchmark draining a burst of input messages through the decoder
fn bench_decode_input_burst(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_input_burst");

    // A second of busy pointer traffic plus some typing.
    let mut burst = Vec::new();
    for i in 0..1000u32 {
        burst.extend_from_slice(&frame(msg_type::MOUSE, &[0x0800, i % 1920, i % 1080]));
        if i % 10 == 0 {
            burst.extend_from_slice(&frame(msg_type::SCANCODE_KEYBOARD, &[0, 0x1e, 4]));
        }
    }

    group.throughput(Throughput::Bytes(burst.len() as u64));
    group.bench_function("burst_1100", |b| {
        b.iter(|| {
            let mut decoder = MessageDecoder::new();
            decoder.extend(black_box(&burst));
            let mut count = 0usize;
            while let Ok(Some(msg)) = decoder.next_message() {
                black_box(&msg);
                count += 1;
            }
            black_box(count)
        })
    });

    group.finish();
}

/// Benchmark the per-update region math at several damage sizes
fn bench_region_math(c: &mut Criterion) {
    let mut group = c.benchmark_group("region_math");

    let cases = [
        ("cursor", Region::new(500, 300, 532, 332)),
        ("text_line", Region::new(100, 400, 900, 420)),
        ("full_frame", Region::new(0, 0, 1920, 1080)),
    ];

    for (name, region) in cases {
        group.bench_with_input(BenchmarkId::new("align_clamp", name), &region, |b, r| {
            b.iter(|| black_box(r.align_to_tiles().clamp_to(1920, 1080)))
        });
    }

    group.bench_function("union_accumulate", |b| {
        let rects: Vec<Region> = (0..64)
            .map(|i| Region::new(i * 16, i * 8, i * 16 + 32, i * 8 + 32))
            .collect();
        b.iter(|| {
            let mut acc = Region::EMPTY;
            for r in &rects {
                acc = acc.union(black_box(r));
            }
            black_box(acc)
        })
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_encode_update_batch,
    bench_encode_attach,
    bench_decode_input_burst,
    bench_region_math
);
criterion_main!(benches);
