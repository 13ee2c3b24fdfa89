//! Relay Codec Benchmarks — Wire Hot-Path Performance
//!
//! Benchmarks the encode/decode pair that runs on every relayed
//! order in both directions.
//!
//! Run with: cargo bench --bench codec_bench

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use alloy::primitives::U256;
use orderbook_relay_bot::domain::codec::RelayMessage;

fn sample() -> RelayMessage {
    RelayMessage {
        market_id: U256::from(42u64),
        price: U256::from(550_000u64),
        amount: U256::from(1_000_000u64),
        is_buy: true,
    }
}

/// Benchmark order encoding.
fn bench_encode(c: &mut Criterion) {
    let msg = sample();

    c.bench_function("relay_message_encode", |b| {
        b.iter(|| {
            let _bytes = black_box(&msg).encode();
        });
    });
}

/// Benchmark payload decoding.
fn bench_decode(c: &mut Criterion) {
    let bytes = sample().encode();

    c.bench_function("relay_message_decode", |b| {
        b.iter(|| {
            let _msg = RelayMessage::decode(black_box(&bytes)).unwrap();
        });
    });
}

/// Benchmark the full round trip as the hub sees it.
fn bench_round_trip(c: &mut Criterion) {
    let msg = sample();

    c.bench_function("relay_message_round_trip", |b| {
        b.iter(|| {
            let bytes = black_box(&msg).encode();
            let _decoded = RelayMessage::decode(&bytes).unwrap();
        });
    });
}

criterion_group!(benches, bench_encode, bench_decode, bench_round_trip);
criterion_main!(benches);
