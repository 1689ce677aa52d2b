//! Two-phase mint payment.
//!
//! The vault arms a [`PendingMint`] right before calling `pool.mint`; the
//! pool's callback must then match it exactly and consumes it. A callback
//! that arrives without an armed mint, from another address, or for a
//! different range or payer is an integrity violation.

use crate::error::{Error, IntegrityError};
use crate::pool::interface::MintCallback;
use crate::token::Erc20;
use crate::vault::config::PositionRange;
use alloy_primitives::{Address, U256};

/// Opaque payload the vault hands to `pool.mint` and gets back in the
/// callback: `payer (20) ‖ tick_lower (4, BE) ‖ tick_upper (4, BE)`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct MintCallbackData {
    pub payer: Address,
    pub range: PositionRange,
}

impl MintCallbackData {
    pub const LEN: usize = 28;

    pub fn encode(&self) -> [u8; Self::LEN] {
        let mut out = [0u8; Self::LEN];
        out[..20].copy_from_slice(self.payer.as_slice());
        out[20..24].copy_from_slice(&self.range.tick_lower.to_be_bytes());
        out[24..].copy_from_slice(&self.range.tick_upper.to_be_bytes());
        out
    }

    pub fn decode(data: &[u8]) -> Result<Self, IntegrityError> {
        let data: &[u8; Self::LEN] = data
            .try_into()
            .map_err(|_| IntegrityError::CallbackMismatch)?;

        let mut lower = [0u8; 4];
        let mut upper = [0u8; 4];
        lower.copy_from_slice(&data[20..24]);
        upper.copy_from_slice(&data[24..]);

        Ok(Self {
            payer: Address::from_slice(&data[..20]),
            range: PositionRange {
                tick_lower: i32::from_be_bytes(lower),
                tick_upper: i32::from_be_bytes(upper),
            },
        })
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PendingMint {
    pub expected_pool: Address,
    pub range: PositionRange,
    pub payer: Address,
}

#[derive(Clone, Debug)]
pub struct MintSettlement {
    vault: Address,
    token0: Address,
    token1: Address,
    pending: Option<PendingMint>,
}

impl MintSettlement {
    pub fn new(vault: Address, token0: Address, token1: Address) -> Self {
        Self {
            vault,
            token0,
            token1,
            pending: None,
        }
    }

    /// Expects exactly one callback from `pool` for `range`, paid by `payer`.
    /// Returns the payload to pass to `mint`.
    pub fn arm(
        &mut self,
        pool: Address,
        range: PositionRange,
        payer: Address,
    ) -> [u8; MintCallbackData::LEN] {
        self.pending = Some(PendingMint {
            expected_pool: pool,
            range,
            payer,
        });
        MintCallbackData { payer, range }.encode()
    }

    /// Drops any unconsumed pending mint.
    pub fn disarm(&mut self) {
        self.pending = None;
    }

    pub fn pending(&self) -> Option<&PendingMint> {
        self.pending.as_ref()
    }

    fn pay(
        &self,
        tokens: &mut dyn Erc20,
        token: Address,
        payer: Address,
        pool: Address,
        amount: U256,
    ) -> Result<(), Error> {
        if amount.is_zero() {
            return Ok(());
        }
        if payer == self.vault {
            tokens.transfer(token, self.vault, pool, amount)?;
        } else {
            tokens.transfer_from(token, self.vault, payer, pool, amount)?;
        }
        Ok(())
    }
}

impl MintCallback for MintSettlement {
    fn uniswap_v3_mint_callback(
        &mut self,
        tokens: &mut dyn Erc20,
        caller: Address,
        amount0_owed: U256,
        amount1_owed: U256,
        data: &[u8],
    ) -> Result<(), Error> {
        let Some(pending) = self.pending else {
            tracing::warn!(%caller, "mint callback without a mint in flight");
            return Err(IntegrityError::NoMintInFlight.into());
        };
        if caller != pending.expected_pool {
            tracing::warn!(%caller, expected = %pending.expected_pool, "mint callback from unexpected caller");
            return Err(IntegrityError::UnexpectedCallbackCaller.into());
        }

        let decoded = MintCallbackData::decode(data)?;
        if decoded.payer != pending.payer || decoded.range != pending.range {
            tracing::warn!(?decoded, ?pending, "mint callback payload mismatch");
            return Err(IntegrityError::CallbackMismatch.into());
        }
        self.pending = None;

        self.pay(tokens, self.token0, pending.payer, caller, amount0_owed)?;
        self.pay(tokens, self.token1, pending.payer, caller, amount1_owed)?;

        tracing::debug!(
            payer = %pending.payer,
            %amount0_owed,
            %amount1_owed,
            "mint settled"
        );
        Ok(())
    }
}
