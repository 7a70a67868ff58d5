//! Benchmarks for the pairing queue.
//!
//! Compares handoff-queue against crossbeam-channel's unbounded channel,
//! the closest widely-used blocking MPMC structure.

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use handoff_queue::PairingQueue;
use rand::prelude::*;
use std::sync::Arc;
use std::thread;

// ============================================================================
// Single-operation latency benchmarks
// ============================================================================

fn bench_uncontended_latency(c: &mut Criterion) {
    let mut group = c.benchmark_group("uncontended_latency");

    // Single enqueue + try_dequeue round trip, no contention
    group.bench_function("handoff/u64", |b| {
        let queue: PairingQueue<u64> = PairingQueue::new();
        b.iter(|| {
            queue.enqueue(black_box(42u64));
            black_box(queue.try_dequeue().unwrap())
        });
    });

    group.bench_function("crossbeam_unbounded/u64", |b| {
        let (tx, rx) = crossbeam_channel::unbounded::<u64>();
        b.iter(|| {
            tx.send(black_box(42u64)).unwrap();
            black_box(rx.try_recv().unwrap())
        });
    });

    // 128-byte message
    #[allow(unused)]
    #[derive(Debug, Clone, Copy)]
    struct Message128([u64; 16]);

    group.bench_function("handoff/128b", |b| {
        let queue: PairingQueue<Message128> = PairingQueue::new();
        let msg = Message128([42; 16]);
        b.iter(|| {
            queue.enqueue(black_box(msg));
            black_box(queue.try_dequeue().unwrap())
        });
    });

    group.bench_function("crossbeam_unbounded/128b", |b| {
        let (tx, rx) = crossbeam_channel::unbounded::<Message128>();
        let msg = Message128([42; 16]);
        b.iter(|| {
            tx.send(black_box(msg)).unwrap();
            black_box(rx.try_recv().unwrap())
        });
    });

    group.finish();
}

// ============================================================================
// Burst drain: enqueue a batch, then drain it non-blocking
// ============================================================================

fn bench_burst_drain(c: &mut Criterion) {
    let mut group = c.benchmark_group("burst_drain");

    // Random burst sizes so slab growth and slot reuse both show up
    let mut rng = StdRng::seed_from_u64(0xB0057);
    let bursts: Vec<usize> = (0..64).map(|_| rng.gen_range(1..=256)).collect();
    let total: usize = bursts.iter().sum();
    group.throughput(Throughput::Elements(total as u64));

    group.bench_function("handoff", |b| {
        let queue: PairingQueue<u64> = PairingQueue::new();
        b.iter(|| {
            for &burst in &bursts {
                for i in 0..burst as u64 {
                    queue.enqueue(i);
                }
                while let Some(v) = queue.try_dequeue() {
                    black_box(v);
                }
            }
        });
    });

    group.bench_function("crossbeam_unbounded", |b| {
        let (tx, rx) = crossbeam_channel::unbounded::<u64>();
        b.iter(|| {
            for &burst in &bursts {
                for i in 0..burst as u64 {
                    tx.send(i).unwrap();
                }
                while let Ok(v) = rx.try_recv() {
                    black_box(v);
                }
            }
        });
    });

    group.finish();
}

// ============================================================================
// Cross-thread blocking handoff
// ============================================================================

fn bench_blocking_handoff(c: &mut Criterion) {
    const COUNT: u64 = 10_000;

    let mut group = c.benchmark_group("blocking_handoff");
    group.throughput(Throughput::Elements(COUNT));
    group.sample_size(20);

    group.bench_function("handoff", |b| {
        b.iter(|| {
            let queue = Arc::new(PairingQueue::new());

            let q = Arc::clone(&queue);
            let consumer = thread::spawn(move || {
                let mut sum = 0u64;
                for _ in 0..COUNT {
                    sum = sum.wrapping_add(q.dequeue());
                }
                sum
            });

            for i in 0..COUNT {
                queue.enqueue(i);
            }

            black_box(consumer.join().unwrap())
        });
    });

    group.bench_function("crossbeam_unbounded", |b| {
        b.iter(|| {
            let (tx, rx) = crossbeam_channel::unbounded::<u64>();

            let consumer = thread::spawn(move || {
                let mut sum = 0u64;
                for _ in 0..COUNT {
                    sum = sum.wrapping_add(rx.recv().unwrap());
                }
                sum
            });

            for i in 0..COUNT {
                tx.send(i).unwrap();
            }

            black_box(consumer.join().unwrap())
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_uncontended_latency,
    bench_burst_drain,
    bench_blocking_handoff
);
criterion_main!(benches);
