#![allow(missing_docs)]

use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use graphcode::{Decoder, Encoder, Graphcode, GraphObject};
use std::hint::black_box;
use std::io::{self, Write};

#[derive(Clone, GraphObject, Debug, Default)]
struct BenchItem {
    id: u64,
    label: Option<String>,
    payload: Vec<u64>,
}

#[derive(Clone, GraphObject, Debug, Default)]
struct BenchCollection {
    data: Vec<BenchItem>,
}

fn generate_data(count: usize) -> BenchCollection {
    let items = (0..count)
        .map(|i| BenchItem {
            id: i as u64,
            label: (i % 3 == 0).then(|| format!("item-{i}")),
            payload: vec![i as u64; 128], // ~1KB
        })
        .collect();
    BenchCollection { data: items }
}

/// Discards bytes, so the writer cost is measured without sink overhead.
struct NullSink;

impl Write for NullSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

// --- BENCHMARKS ---

fn bench_writers(c: &mut Criterion) {
    let item_count = 20_000;
    let data = generate_data(item_count);
    let encoded_len = Graphcode::serialize(&data).expect("Failed to encode data").len();

    println!("Writers Item count: {}", item_count);

    let mut group = c.benchmark_group("Serialization Write");
    group.throughput(Throughput::Bytes(encoded_len as u64));

    // 1. Pipelined flushes
    group.bench_function("graphcode_pipelined", |b| {
        b.iter(|| {
            Graphcode::write(NullSink, black_box(&data)).expect("Failed to encode data");
        });
    });

    // 2. Inline flushes
    let inline = Graphcode::builder().pipelined(false);
    group.bench_function("graphcode_inline", |b| {
        b.iter(|| {
            inline
                .write(NullSink, black_box(&data))
                .expect("Failed to encode data");
        });
    });

    // 3. Small blocks stress the rotation path
    let small = Graphcode::builder().block_size(256);
    group.bench_function("graphcode_small_blocks", |b| {
        b.iter(|| {
            small
                .write(NullSink, black_box(&data))
                .expect("Failed to encode data");
        });
    });

    group.finish();
}

fn bench_readers(c: &mut Criterion) {
    let item_count = 20_000;

    println!("Readers Item count: {}", item_count);

    let data = generate_data(item_count);
    let buffer = Graphcode::serialize(&data).expect("Failed to encode data");

    let mut group = c.benchmark_group("Deserialization Read");
    group.throughput(Throughput::Bytes(buffer.len() as u64));

    // 1. Full graph
    group.bench_function("graphcode_read_all", |b| {
        b.iter(|| {
            let _res: BenchCollection =
                Graphcode::deserialize(black_box(&buffer)).expect("Failed to decode data");
        });
    });

    // 2. Many small values on one stream
    let mut encoder = Encoder::new(Vec::new());
    for item in &data.data {
        encoder.encode(item).expect("Failed to encode item");
    }
    let stream = encoder.finish().expect("Failed to finish stream");

    group.bench_function("graphcode_read_stream", |b| {
        b.iter(|| {
            let mut decoder = Decoder::new(black_box(stream.as_slice()));
            for _ in 0..item_count {
                let item: BenchItem = decoder.decode().expect("Failed to decode item");
                black_box(item);
            }
        });
    });

    group.finish();
}

criterion_group!(benches, bench_writers, bench_readers);
criterion_main!(benches);
