//! Performance benchmarks for segchan
//!
//! Run with: cargo bench --package segchan-core

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use segchan_core::Channel;
use std::time::SystemTime;

fn unique_names(tag: &str) -> (String, String, String) {
    let ts = SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    (
        format!("/segchan_bench_{tag}_{ts}"),
        format!("/segchan_bench_{tag}_{ts}_w"),
        format!("/segchan_bench_{tag}_{ts}_r"),
    )
}

fn bench_channel_create(c: &mut Criterion) {
    c.bench_function("channel_create", |b| {
        b.iter(|| {
            let (name, wsem, rsem) = unique_names("create");
            let chan = Channel::create(&name, &wsem, &rsem).unwrap();
            black_box(&chan);
            drop(chan);
            Channel::close(&name, &wsem, &rsem);
        });
    });
}

fn bench_round_trip(c: &mut Criterion) {
    let mut group = c.benchmark_group("round_trip");
    group.sample_size(50);

    for size in [1024, 65536, 1048576].iter() {
        group.throughput(Throughput::Bytes(*size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            let (name, wsem, rsem) = unique_names("rt");
            let mut chan = Channel::create(&name, &wsem, &rsem).unwrap();
            let data = vec![42u8; size];

            // Single-chunk messages round-trip within one thread.
            b.iter(|| {
                chan.send(&data).unwrap();
                black_box(chan.recv().unwrap());
            });

            drop(chan);
            Channel::close(&name, &wsem, &rsem);
        });
    }
    group.finish();
}

criterion_group!(benches, bench_channel_create, bench_round_trip);
criterion_main!(benches);
