//! Concentrated‑liquidity position manager ("Hypervisor") in pure Rust.
//!
//! This crate exposes:
//! - Low‑level math primitives (`math::*`) for ticks, prices, full‑precision
//!   multiply/divide and liquidity ↔ amount conversion.
//! - The pool and token collaborator interfaces (`pool`, `token`) together
//!   with in‑memory implementations for simulation and tests.
//! - The `Hypervisor` vault (`vault::*`), which manages a base and a limit
//!   range on a pool and issues proportional shares.
//! - Optional `onchain` readers that hydrate pool state over JSON‑RPC.
//!
//! # Examples
//!
//! ## Pure math
//! ```no_run
//! use clmm_hypervisor::{math::{liquidity_amounts, tick_math}, U256};
//!
//! let price = tick_math::get_sqrt_ratio_at_tick(0).unwrap();
//! let lower = tick_math::get_sqrt_ratio_at_tick(-600).unwrap();
//! let upper = tick_math::get_sqrt_ratio_at_tick(600).unwrap();
//! let liquidity = liquidity_amounts::get_liquidity_for_amounts(
//!     price,
//!     lower,
//!     upper,
//!     U256::from(1_000_000u64),
//!     U256::from(1_000_000u64),
//! )
//! .unwrap();
//! assert!(liquidity > 0);
//! ```
//!
//! ## Running a vault against the in‑memory pool
//! ```no_run
//! use clmm_hypervisor::{
//!     math::tick_math::get_sqrt_ratio_at_tick,
//!     token::{Erc20, InMemoryTokens},
//!     vault::{HypervisorConfig, PositionRange},
//!     Address, Hypervisor, NoRewards, V3Pool, U256,
//! };
//!
//! let owner = Address::repeat_byte(0x01);
//! let token0 = Address::repeat_byte(0x10);
//! let token1 = Address::repeat_byte(0x11);
//! let pool = V3Pool::new(
//!     Address::repeat_byte(0xaa),
//!     token0,
//!     token1,
//!     3000,
//!     60,
//!     get_sqrt_ratio_at_tick(0).unwrap(),
//! )
//! .unwrap();
//!
//! let mut config = HypervisorConfig::new(owner);
//! config.whitelisted_address = owner;
//! config.fee_recipient = owner;
//!
//! let base = PositionRange::new(-600, 600, 60).unwrap();
//! let limit = PositionRange::new(60, 1200, 60).unwrap();
//! let mut vault = Hypervisor::new(Address::repeat_byte(0xee), pool, config, base, limit, NoRewards)
//!     .unwrap();
//!
//! let mut tokens = InMemoryTokens::default();
//! tokens.mint(token1, owner, U256::from(1_000_000u64));
//! tokens.approve(token1, owner, vault.address(), U256::MAX);
//!
//! let shares = vault
//!     .deposit(&mut tokens, owner, U256::ZERO, U256::from(1_000_000u64), owner, owner, [U256::ZERO; 4])
//!     .unwrap();
//! assert_eq!(shares, U256::from(1_000_000u64));
//! ```

pub use alloy_primitives::{Address, B256, I256, U256};

pub mod error;
mod hash;
pub mod math;
pub mod pool;
pub mod token;
pub mod tx;
pub mod vault;

pub use hash::FastMap;

pub use pool::v3_pool::V3Pool;
pub use vault::{Hypervisor, NoRewards};

pub const RESOLUTION: u8 = 96;
pub const Q96: U256 = U256::from_limbs([0, 4294967296, 0, 0]);
pub const Q128: U256 = U256::from_limbs([0, 0, 1, 0]);
pub const Q192: U256 = U256::from_limbs([0, 0, 0, 1]);

/// Fixed‑point scale of share prices (1e36).
pub const PRECISION: U256 = U256::from_limbs([12919594847110692864, 54210108624275221, 0, 0]);

const U128_MAX: U256 = U256::from_limbs([u64::MAX, u64::MAX, 0, 0]);
