//! Benchmarks for chunking and reassembly
//!
//! - ChunkPlan iteration and slicing over typical VGA JPEG sizes
//! - Peer-side reassembly of the resulting notification stream
//!
//! Platform: Cross-platform, no hardware required

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use shutterlink::reassembly::FrameAssembler;
use shutterlink::test_utils::jpeg_like;
use shutterlink::types::Frame;
use std::hint::black_box;

/// Roughly QVGA, VGA and SVGA at the firmware's JPEG quality.
const FRAME_SIZES: [usize; 3] = [8 * 1024, 24 * 1024, 48 * 1024];

fn bench_chunk_plan(c: &mut Criterion) {
    let mut group = c.benchmark_group("chunk_plan");

    for size in FRAME_SIZES {
        let frame = Frame::new(jpeg_like(size, 0x5A), 1);
        group.throughput(Throughput::Bytes(frame.len() as u64));

        group.bench_with_input(BenchmarkId::new("slice_all", size), &frame, |b, frame| {
            b.iter(|| {
                let mut checksum = 0u64;
                for span in frame.chunk_plan(black_box(240)) {
                    let chunk = frame.slice(span);
                    checksum = checksum.wrapping_add(chunk.len() as u64);
                }
                black_box(checksum)
            })
        });
    }

    group.finish();
}

fn bench_reassembly(c: &mut Criterion) {
    let mut group = c.benchmark_group("reassembly");

    for size in FRAME_SIZES {
        let image = jpeg_like(size, 0x5A);
        let chunks: Vec<&[u8]> = image.chunks(240).collect();
        group.throughput(Throughput::Bytes(image.len() as u64));

        group.bench_with_input(BenchmarkId::new("push_chunks", size), &chunks, |b, chunks| {
            b.iter(|| {
                let mut assembler = FrameAssembler::default();
                let mut frames = Vec::new();
                for chunk in chunks {
                    frames.extend(assembler.push(black_box(chunk)));
                }
                black_box(frames)
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_chunk_plan, bench_reassembly);
criterion_main!(benches);
