//! The pool surface a vault needs: position reads, the mint/burn/collect
//! triple, and the TWAP oracle.

use crate::error::Error;
use crate::token::Erc20;
use alloy_primitives::{Address, B256, U256, keccak256};
use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot0 {
    pub sqrt_price_x96: U256,
    pub tick: i32,
}

/// A liquidity position as stored by the pool.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct PositionInfo {
    pub liquidity: u128,
    pub fee_growth_inside0_last_x128: U256,
    pub fee_growth_inside1_last_x128: U256,
    pub tokens_owed0: u128,
    pub tokens_owed1: u128,
}

/// How a pool derives the storage key of a position.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PositionKeyFormat {
    /// `keccak256(owner ‖ int24 lower ‖ int24 upper)`
    #[default]
    Standard,
    /// `keccak256(owner ‖ uint256 index ‖ int24 lower ‖ int24 upper)`, used by
    /// pools that let one owner hold several positions on the same range.
    Indexed(U256),
}

impl PositionKeyFormat {
    pub fn key(&self, owner: Address, tick_lower: i32, tick_upper: i32) -> B256 {
        let mut packed = Vec::with_capacity(20 + 32 + 6);
        packed.extend_from_slice(owner.as_slice());
        if let PositionKeyFormat::Indexed(index) = self {
            packed.extend_from_slice(&index.to_be_bytes::<32>());
        }
        packed.extend_from_slice(&int24_be(tick_lower));
        packed.extend_from_slice(&int24_be(tick_upper));
        keccak256(&packed)
    }
}

/// Two's complement big-endian `int24`.
#[inline]
fn int24_be(tick: i32) -> [u8; 3] {
    let bytes = tick.to_be_bytes();
    [bytes[1], bytes[2], bytes[3]]
}

/// Receives the pool's request for payment during `mint`.
///
/// The pool invokes this before its balance check, passing its own address
/// as `caller` and the opaque `data` given to `mint`.
pub trait MintCallback {
    fn uniswap_v3_mint_callback(
        &mut self,
        tokens: &mut dyn Erc20,
        caller: Address,
        amount0_owed: U256,
        amount1_owed: U256,
        data: &[u8],
    ) -> Result<(), Error>;
}

pub trait ConcentratedPool {
    fn address(&self) -> Address;

    fn token0(&self) -> Address;

    fn token1(&self) -> Address;

    fn tick_spacing(&self) -> i32;

    fn key_format(&self) -> PositionKeyFormat;

    fn slot0(&self) -> Slot0;

    /// Returns the default (empty) position for unknown keys.
    fn positions(&self, key: B256) -> PositionInfo;

    /// Adds `amount` liquidity for `recipient`, collecting payment through
    /// `callback`. Returns the token amounts paid, rounded up.
    #[allow(clippy::too_many_arguments)]
    fn mint(
        &mut self,
        tokens: &mut dyn Erc20,
        recipient: Address,
        tick_lower: i32,
        tick_upper: i32,
        amount: u128,
        data: &[u8],
        callback: &mut dyn MintCallback,
    ) -> Result<(U256, U256), Error>;

    /// Removes liquidity from `owner`'s position and credits the proceeds to
    /// its owed tokens. `amount == 0` only settles accrued fees.
    fn burn(
        &mut self,
        owner: Address,
        tick_lower: i32,
        tick_upper: i32,
        amount: u128,
    ) -> Result<(U256, U256), Error>;

    /// Sends up to the requested amounts of owed tokens to `recipient`.
    #[allow(clippy::too_many_arguments)]
    fn collect(
        &mut self,
        tokens: &mut dyn Erc20,
        owner: Address,
        recipient: Address,
        tick_lower: i32,
        tick_upper: i32,
        amount0_requested: u128,
        amount1_requested: u128,
    ) -> Result<(u128, u128), Error>;

    /// Tick cumulatives as of each `seconds_ago`.
    fn observe(&self, seconds_agos: &[u32]) -> Result<Vec<i64>, Error>;
}
