//! # Smith-Chain Benchmarks
//!
//! | Subsystem | Operation | Measured |
//! |-----------|-----------|----------|
//! | sc-03 Mempool | Admission | `receive_from_network` of one transaction |
//! | sc-06 Block Service | Production | generate + push with `n` transactions |
//! | sc-06 Block Service | Pop-off | rollback of a 5 block tip |

use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion, Throughput};
use sc_tests::fixtures::{network, Network};
use std::time::Duration;

const RECIPIENT: [u8; 32] = [0x44; 32];

fn network_with_pending(count: usize) -> Network {
    let net = network(1);
    for i in 0..count {
        let tx = net
            .user()
            .send_money(net.now(), RECIPIENT, 1 + i as i64, 1)
            .expect("transaction builds");
        net.relay_transaction(0, &tx);
    }
    net
}

fn bench_mempool_admission(c: &mut Criterion) {
    let mut group = c.benchmark_group("sc-03-mempool");
    group.bench_function("receive_from_network", |b| {
        b.iter_batched(
            || {
                let net = network(1);
                let tx = net
                    .user()
                    .send_money(net.now(), RECIPIENT, 10, 1)
                    .expect("transaction builds");
                (net, tx)
            },
            |(net, tx)| net.relay_transaction(0, &tx),
            BatchSize::SmallInput,
        )
    });
    group.finish();
}

fn bench_block_production(c: &mut Criterion) {
    let mut group = c.benchmark_group("sc-06-block-production");
    group.measurement_time(Duration::from_secs(10));
    for size in [0usize, 10, 50] {
        group.throughput(Throughput::Elements(size.max(1) as u64));
        group.bench_with_input(BenchmarkId::new("produce_and_push", size), &size, |b, &size| {
            b.iter_batched(
                || network_with_pending(size),
                |net| net.produce_in_turn(0),
                BatchSize::SmallInput,
            )
        });
    }
    group.finish();
}

fn bench_pop_off(c: &mut Criterion) {
    let mut group = c.benchmark_group("sc-06-pop-off");
    group.bench_function("pop_off_5_blocks", |b| {
        b.iter_batched(
            || {
                let net = network(1);
                for _ in 0..5 {
                    net.produce_in_turn(0);
                }
                net
            },
            |net| {
                net.nodes[0]
                    .block_service
                    .pop_off_to_block(&net.genesis)
                    .expect("pop-off succeeds")
            },
            BatchSize::SmallInput,
        )
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_mempool_admission,
    bench_block_production,
    bench_pop_off
);
criterion_main!(benches);
