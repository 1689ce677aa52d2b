#![allow(dead_code)]

use std::hint::black_box;

use clmm_hypervisor::math::{
    bit_math, liquidity_amounts, math_helpers, sqrt_price_math, tick_math,
};
use clmm_hypervisor::vault::shares;
use clmm_hypervisor::{Q96, U256};
use criterion::Criterion;

const TICKS: [i32; 5] = [-887272, -60000, 0, 60000, 887272];

pub fn bench_tick_math(c: &mut Criterion) {
    let mut group = c.benchmark_group("tick_math");
    group.bench_function("get_sqrt_ratio_at_tick", |b| {
        b.iter(|| {
            for tick in TICKS {
                let _ = black_box(tick_math::get_sqrt_ratio_at_tick(black_box(tick)));
            }
        })
    });

    let prices: Vec<U256> = TICKS
        .iter()
        .map(|&tick| tick_math::get_sqrt_ratio_at_tick(tick).unwrap())
        .filter(|&price| price < tick_math::MAX_SQRT_RATIO)
        .collect();
    group.bench_function("get_tick_at_sqrt_ratio", |b| {
        b.iter(|| {
            for price in &prices {
                let _ = black_box(tick_math::get_tick_at_sqrt_ratio(black_box(*price)));
            }
        })
    });
    group.finish();
}

pub fn bench_math_helpers(c: &mut Criterion) {
    let a = U256::from(1_000_000_000_000_000_000u128) * Q96;
    let b = U256::from(987_654_321u64) * Q96;
    let denominator = U256::from(123_456_789u64) << 100;

    let mut group = c.benchmark_group("math_helpers");
    group.bench_function("mul_div", |bench| {
        bench.iter(|| math_helpers::mul_div(black_box(a), black_box(b), black_box(denominator)))
    });
    group.bench_function("mul_div_rounding_up", |bench| {
        bench.iter(|| {
            math_helpers::mul_div_rounding_up(black_box(a), black_box(b), black_box(denominator))
        })
    });
    group.finish();
}

pub fn bench_bit_math(c: &mut Criterion) {
    let x = U256::from(0xdead_beef_u64) << 77;
    c.bench_function("bit_math/most_significant_bit", |b| {
        b.iter(|| bit_math::most_significant_bit(black_box(x)))
    });
    c.bench_function("bit_math/least_significant_bit", |b| {
        b.iter(|| bit_math::least_significant_bit(black_box(x)))
    });
}

pub fn bench_share_price(c: &mut Criterion) {
    let low = tick_math::get_sqrt_ratio_at_tick(-800_000).unwrap();
    let high = tick_math::get_sqrt_ratio_at_tick(800_000).unwrap();

    let mut group = c.benchmark_group("shares");
    group.bench_function("price_x36/low", |b| b.iter(|| shares::price_x36(black_box(low))));
    group.bench_function("price_x36/high", |b| b.iter(|| shares::price_x36(black_box(high))));

    let price = shares::price_x36(Q96).unwrap();
    let total = U256::from(10u64).pow(U256::from(24u8));
    group.bench_function("shares_for_deposit", |b| {
        b.iter(|| {
            shares::shares_for_deposit(
                black_box(U256::from(5_000u64)),
                black_box(U256::from(7_000u64)),
                price,
                total,
                total,
                total,
            )
        })
    });
    group.finish();
}

pub fn bench_liquidity_amounts(c: &mut Criterion) {
    let price = tick_math::get_sqrt_ratio_at_tick(0).unwrap();
    let lower = tick_math::get_sqrt_ratio_at_tick(-600).unwrap();
    let upper = tick_math::get_sqrt_ratio_at_tick(600).unwrap();
    let amount = U256::from(1_000_000_000_000_000_000u128);

    let mut group = c.benchmark_group("liquidity_amounts");
    group.bench_function("get_liquidity_for_amounts", |b| {
        b.iter(|| {
            liquidity_amounts::get_liquidity_for_amounts(
                black_box(price),
                lower,
                upper,
                black_box(amount),
                black_box(amount),
            )
        })
    });

    let liquidity = liquidity_amounts::get_liquidity_for_amounts(price, lower, upper, amount, amount)
        .unwrap();
    group.bench_function("get_amounts_for_liquidity", |b| {
        b.iter(|| {
            liquidity_amounts::get_amounts_for_liquidity(black_box(price), lower, upper, black_box(liquidity))
        })
    });
    group.bench_function("get_amounts_for_liquidity_delta", |b| {
        b.iter(|| {
            sqrt_price_math::get_amounts_for_liquidity_delta(
                black_box(price),
                -600,
                600,
                black_box(liquidity),
                true,
            )
        })
    });
    group.finish();
}
