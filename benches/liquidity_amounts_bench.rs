use criterion::{criterion_group, criterion_main};

mod common;

criterion_group!(liquidity_amounts_benches, common::bench_liquidity_amounts);
criterion_main!(liquidity_amounts_benches);
