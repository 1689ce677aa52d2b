//! Share pricing and the share ledger.
//!
//! Vault value is always measured in token1. The first depositor fixes the
//! unit: one share per unit of token1-denominated value. Every later
//! deposit mints shares in proportion to the value it adds.

use crate::FastMap;
use crate::error::{MathError, VaultError};
use crate::math::liquidity_amounts::to_u128;
use crate::math::math_helpers::mul_div;
use crate::{PRECISION, Q96, Q192, U128_MAX};
use alloy_primitives::{Address, U256};

/// Token0 price in token1, scaled by 1e36.
pub fn price_x36(sqrt_price_x96: U256) -> Result<U256, MathError> {
    if sqrt_price_x96 <= U128_MAX {
        mul_div(sqrt_price_x96 * sqrt_price_x96, PRECISION, Q192)
    } else {
        // the square no longer fits in 256 bits
        mul_div(mul_div(sqrt_price_x96, sqrt_price_x96, Q96)?, PRECISION, Q96)
    }
}

pub fn value_in_token1(amount0: U256, amount1: U256, price: U256) -> Result<U256, MathError> {
    mul_div(amount0, price, PRECISION)?
        .checked_add(amount1)
        .ok_or(MathError::Overflow)
}

/// Shares minted for a deposit of `(deposit0, deposit1)`.
///
/// `pool0`/`pool1` are the vault's holdings before the deposit. Zero
/// supply prices shares one to one with token1 value.
pub fn shares_for_deposit(
    deposit0: U256,
    deposit1: U256,
    price: U256,
    total_supply: U256,
    pool0: U256,
    pool1: U256,
) -> Result<U256, MathError> {
    let shares = value_in_token1(deposit0, deposit1, price)?;
    if total_supply.is_zero() {
        return Ok(shares);
    }
    let pool_value = value_in_token1(pool0, pool1, price)?;
    mul_div(shares, total_supply, pool_value)
}

/// The part of `liquidity` owned by `shares` out of `total_supply`.
pub fn liquidity_for_shares(
    liquidity: u128,
    shares: U256,
    total_supply: U256,
) -> Result<u128, MathError> {
    to_u128(mul_div(U256::from(liquidity), shares, total_supply)?)
}

pub fn proportional(amount: U256, shares: U256, total_supply: U256) -> Result<U256, MathError> {
    mul_div(amount, shares, total_supply)
}

#[derive(Clone, Debug, Default)]
pub struct ShareLedger {
    total_supply: U256,
    balances: FastMap<Address, U256>,
}

impl ShareLedger {
    pub fn total_supply(&self) -> U256 {
        self.total_supply
    }

    pub fn balance_of(&self, holder: Address) -> U256 {
        self.balances.get(&holder).copied().unwrap_or_default()
    }

    pub fn mint(&mut self, to: Address, shares: U256) -> Result<(), MathError> {
        let total_supply = self
            .total_supply
            .checked_add(shares)
            .ok_or(MathError::Overflow)?;
        self.total_supply = total_supply;
        // bounded by total_supply
        *self.balances.entry(to).or_default() += shares;
        Ok(())
    }

    pub fn burn(&mut self, from: Address, shares: U256) -> Result<(), VaultError> {
        let balance = self.balance_of(from);
        let remaining = balance
            .checked_sub(shares)
            .ok_or(VaultError::InsufficientShares)?;

        if remaining.is_zero() {
            self.balances.remove(&from);
        } else {
            self.balances.insert(from, remaining);
        }
        self.total_supply -= shares;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::tick_math::{MAX_SQRT_RATIO, get_sqrt_ratio_at_tick};
    use proptest::prelude::*;

    const ALICE: Address = Address::repeat_byte(0xa1);
    const BOB: Address = Address::repeat_byte(0xb0);

    #[test]
    fn price_at_tick_zero_is_one() {
        let price = price_x36(get_sqrt_ratio_at_tick(0).unwrap()).unwrap();
        assert_eq!(price, PRECISION);
    }

    #[test]
    fn price_of_wide_sqrt_uses_the_split_path() {
        // sqrt^2 overflows 256 bits here
        let sqrt = MAX_SQRT_RATIO - U256::ONE;
        let price = price_x36(sqrt).unwrap();
        let reference = mul_div(mul_div(sqrt, sqrt, Q96).unwrap(), PRECISION, Q96).unwrap();
        assert_eq!(price, reference);
        assert!(price > PRECISION);
    }

    #[test]
    fn price_paths_agree_at_the_boundary() {
        let sqrt = U128_MAX;
        let direct = mul_div(sqrt * sqrt, PRECISION, Q192).unwrap();
        let split = mul_div(mul_div(sqrt, sqrt, Q96).unwrap(), PRECISION, Q96).unwrap();
        // the split path truncates once more
        assert!(direct >= split && direct - split <= (PRECISION >> 96) + U256::ONE);
        assert_eq!(price_x36(sqrt).unwrap(), direct);
    }

    #[test]
    fn first_deposit_of_token1_mints_one_to_one() {
        let shares = shares_for_deposit(
            U256::ZERO,
            U256::from(1_000_000u64),
            PRECISION,
            U256::ZERO,
            U256::ZERO,
            U256::ZERO,
        )
        .unwrap();
        assert_eq!(shares, U256::from(1_000_000u64));
    }

    #[test]
    fn first_deposit_prices_token0_in_token1() {
        let price = PRECISION * U256::from(2u8);
        let shares = shares_for_deposit(
            U256::from(100u8),
            U256::from(50u8),
            price,
            U256::ZERO,
            U256::ZERO,
            U256::ZERO,
        )
        .unwrap();
        assert_eq!(shares, U256::from(250u16));
    }

    #[test]
    fn later_deposit_is_proportional_to_added_value() {
        // vault holds 1000 value units backing 500 shares
        let shares = shares_for_deposit(
            U256::ZERO,
            U256::from(200u16),
            PRECISION,
            U256::from(500u16),
            U256::from(400u16),
            U256::from(600u16),
        )
        .unwrap();
        assert_eq!(shares, U256::from(100u8));
    }

    #[test]
    fn later_deposit_into_an_empty_vault_divides_by_zero() {
        let result = shares_for_deposit(
            U256::ZERO,
            U256::ONE,
            PRECISION,
            U256::from(10u8),
            U256::ZERO,
            U256::ZERO,
        );
        assert_eq!(result, Err(MathError::DivisionByZero));
    }

    #[test]
    fn liquidity_for_shares_rounds_down() {
        assert_eq!(
            liquidity_for_shares(1_000, U256::from(1u8), U256::from(3u8)).unwrap(),
            333
        );
        assert_eq!(
            liquidity_for_shares(1_000, U256::from(3u8), U256::from(3u8)).unwrap(),
            1_000
        );
    }

    #[test]
    fn ledger_mints_and_burns() {
        let mut ledger = ShareLedger::default();
        ledger.mint(ALICE, U256::from(70u8)).unwrap();
        ledger.mint(BOB, U256::from(30u8)).unwrap();
        assert_eq!(ledger.total_supply(), U256::from(100u8));

        ledger.burn(ALICE, U256::from(70u8)).unwrap();
        assert_eq!(ledger.balance_of(ALICE), U256::ZERO);
        assert_eq!(ledger.total_supply(), U256::from(30u8));
    }

    #[test]
    fn ledger_rejects_overburn() {
        let mut ledger = ShareLedger::default();
        ledger.mint(ALICE, U256::from(5u8)).unwrap();
        assert_eq!(
            ledger.burn(ALICE, U256::from(6u8)),
            Err(VaultError::InsufficientShares)
        );
        assert_eq!(ledger.total_supply(), U256::from(5u8));
    }

    #[test]
    fn ledger_rejects_supply_overflow() {
        let mut ledger = ShareLedger::default();
        ledger.mint(ALICE, U256::MAX).unwrap();
        assert_eq!(ledger.mint(BOB, U256::ONE), Err(MathError::Overflow));
        assert_eq!(ledger.balance_of(BOB), U256::ZERO);
    }

    proptest! {
        #[test]
        fn second_deposit_never_dilutes_existing_holders(
            first in 1u64..=u64::MAX,
            second in 1u64..=u64::MAX,
            earned in 0u64..=u64::MAX,
            tick in -200_000i32..200_000,
        ) {
            let price = price_x36(get_sqrt_ratio_at_tick(tick).unwrap()).unwrap();
            let first = U256::from(first);
            let second = U256::from(second);
            let held = first + U256::from(earned);

            let supply = shares_for_deposit(U256::ZERO, first, price, U256::ZERO, U256::ZERO, U256::ZERO).unwrap();
            let minted = shares_for_deposit(U256::ZERO, second, price, supply, U256::ZERO, held).unwrap();

            // value per share after the deposit is at least what it was before
            prop_assert!(minted * held <= second * supply);
        }
    }
}
