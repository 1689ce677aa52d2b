//! JSON-RPC readers for a live pool, used to seed or cross-check the
//! in-memory model.

use crate::error::OnchainError;
use crate::pool::interface::{PositionInfo, PositionKeyFormat, Slot0};
use crate::pool::v3_pool::sort_tokens;
use alloy_primitives::{Address, BlockNumber, U256};
use alloy_provider::Provider;
use alloy_sol_macro::sol;
use std::sync::Arc;

sol! {
    #[sol(rpc)]
    interface IV3Pool {
        function tickSpacing() external view returns (int24);
        function token0() external view returns (address);
        function token1() external view returns (address);
        function fee() external view returns (uint24);
        function slot0() external view returns (
            uint160 sqrtPriceX96,
            int24 tick,
            uint16 observationIndex,
            uint16 observationCardinality,
            uint16 observationCardinalityNext,
            uint8 feeProtocol,
            bool unlocked
        );
        function positions(bytes32 key) external view returns (
            uint128 liquidity,
            uint256 feeGrowthInside0LastX128,
            uint256 feeGrowthInside1LastX128,
            uint128 tokensOwed0,
            uint128 tokensOwed1
        );
    }
}

pub type OnchainProvider<P> = Arc<P>;

/// Immutable pool parameters, read once.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PoolMetadata {
    pub token0: Address,
    pub token1: Address,
    pub tick_spacing: i32,
}

pub struct OnchainPoolReader<P> {
    pub pool_address: Address,
    pub key_format: PositionKeyFormat,
    contract: IV3Pool::IV3PoolInstance<OnchainProvider<P>>,
}

impl<P> OnchainPoolReader<P>
where
    P: Provider + Send + Sync + 'static,
{
    pub fn new(pool_address: Address, provider: OnchainProvider<P>) -> Self {
        Self {
            pool_address,
            key_format: PositionKeyFormat::Standard,
            contract: IV3Pool::IV3PoolInstance::new(pool_address, provider),
        }
    }

    pub fn with_key_format(mut self, format: PositionKeyFormat) -> Self {
        self.key_format = format;
        self
    }

    pub async fn fetch_slot0(
        &self,
        block_number: Option<BlockNumber>,
    ) -> Result<Slot0, OnchainError> {
        let mut call = self.contract.slot0();
        if let Some(bn) = block_number {
            call = call.block(bn.into());
        }

        let slot0 = call
            .call()
            .await
            .map_err(|e| OnchainError::FailedToGetSlot0(e.to_string()))?;

        Ok(Slot0 {
            sqrt_price_x96: U256::from(slot0.sqrtPriceX96),
            tick: slot0.tick.as_i32(),
        })
    }

    pub async fn fetch_tick_spacing(
        &self,
        block_number: Option<BlockNumber>,
    ) -> Result<i32, OnchainError> {
        let mut call = self.contract.tickSpacing();
        if let Some(bn) = block_number {
            call = call.block(bn.into());
        }

        let tick_spacing = call
            .call()
            .await
            .map_err(|e| OnchainError::FailedToGetTickSpacing(e.to_string()))?;

        Ok(tick_spacing.as_i32())
    }

    /// Reads the position `owner` holds on `[tick_lower, tick_upper)`.
    pub async fn fetch_position(
        &self,
        owner: Address,
        tick_lower: i32,
        tick_upper: i32,
        block_number: Option<BlockNumber>,
    ) -> Result<PositionInfo, OnchainError> {
        let key = self.key_format.key(owner, tick_lower, tick_upper);
        let mut call = self.contract.positions(key);
        if let Some(bn) = block_number {
            call = call.block(bn.into());
        }

        let position = call
            .call()
            .await
            .map_err(|e| OnchainError::FailedToGetPosition(e.to_string()))?;

        Ok(PositionInfo {
            liquidity: position.liquidity,
            fee_growth_inside0_last_x128: position.feeGrowthInside0LastX128,
            fee_growth_inside1_last_x128: position.feeGrowthInside1LastX128,
            tokens_owed0: position.tokensOwed0,
            tokens_owed1: position.tokensOwed1,
        })
    }

    /// Token pair (sorted) and tick spacing.
    pub async fn fetch_metadata(
        &self,
        block_number: Option<BlockNumber>,
    ) -> Result<PoolMetadata, OnchainError> {
        let mut token0 = self.contract.token0();
        let mut token1 = self.contract.token1();
        if let Some(bn) = block_number {
            token0 = token0.block(bn.into());
            token1 = token1.block(bn.into());
        }

        let token0 = token0
            .call()
            .await
            .map_err(|e| OnchainError::FailedToGetToken(e.to_string()))?;
        let token1 = token1
            .call()
            .await
            .map_err(|e| OnchainError::FailedToGetToken(e.to_string()))?;
        let tick_spacing = self.fetch_tick_spacing(block_number).await?;

        let (token0, token1) = sort_tokens(token0, token1);
        Ok(PoolMetadata {
            token0,
            token1,
            tick_spacing,
        })
    }
}
