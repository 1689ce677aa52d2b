//! Conversions between token amounts and liquidity for a price range.
//!
//! Every function canonicalizes its bounds so that `sqrt_ratio_a_x96` is
//! the lower one, and every result rounds down: liquidity computed from
//! amounts never buys more than the amounts supplied, and amounts computed
//! from liquidity never exceed what burning that liquidity would return.

use crate::error::MathError;
use crate::math::math_helpers::mul_div;
use crate::{Q96, RESOLUTION, U128_MAX};
use alloy_primitives::U256;

#[inline]
fn sorted(a: U256, b: U256) -> (U256, U256) {
    if a > b { (b, a) } else { (a, b) }
}

/// Downcasts to `u128`, failing with `MathError::Overflow` instead of
/// truncating.
#[inline]
pub fn to_u128(x: U256) -> Result<u128, MathError> {
    if x > U128_MAX {
        return Err(MathError::Overflow);
    }
    Ok(x.to::<u128>())
}

/// Liquidity received for `amount0` of token0 over a range entirely above
/// the current price.
pub fn get_liquidity_for_amount0(
    sqrt_ratio_a_x96: U256,
    sqrt_ratio_b_x96: U256,
    amount0: U256,
) -> Result<u128, MathError> {
    let (a, b) = sorted(sqrt_ratio_a_x96, sqrt_ratio_b_x96);
    let intermediate = mul_div(a, b, Q96)?;
    to_u128(mul_div(amount0, intermediate, b - a)?)
}

/// Liquidity received for `amount1` of token1 over a range entirely below
/// the current price.
pub fn get_liquidity_for_amount1(
    sqrt_ratio_a_x96: U256,
    sqrt_ratio_b_x96: U256,
    amount1: U256,
) -> Result<u128, MathError> {
    let (a, b) = sorted(sqrt_ratio_a_x96, sqrt_ratio_b_x96);
    to_u128(mul_div(amount1, Q96, b - a)?)
}

/// Maximum liquidity obtainable from `amount0` and `amount1` at the current
/// price. Inside the range the scarcer token is the binding constraint.
pub fn get_liquidity_for_amounts(
    sqrt_ratio_x96: U256,
    sqrt_ratio_a_x96: U256,
    sqrt_ratio_b_x96: U256,
    amount0: U256,
    amount1: U256,
) -> Result<u128, MathError> {
    let (a, b) = sorted(sqrt_ratio_a_x96, sqrt_ratio_b_x96);

    if sqrt_ratio_x96 <= a {
        get_liquidity_for_amount0(a, b, amount0)
    } else if sqrt_ratio_x96 < b {
        let liquidity0 = get_liquidity_for_amount0(sqrt_ratio_x96, b, amount0)?;
        let liquidity1 = get_liquidity_for_amount1(a, sqrt_ratio_x96, amount1)?;
        Ok(liquidity0.min(liquidity1))
    } else {
        get_liquidity_for_amount1(a, b, amount1)
    }
}

pub fn get_amount0_for_liquidity(
    sqrt_ratio_a_x96: U256,
    sqrt_ratio_b_x96: U256,
    liquidity: u128,
) -> Result<U256, MathError> {
    let (a, b) = sorted(sqrt_ratio_a_x96, sqrt_ratio_b_x96);
    let numerator = mul_div(U256::from(liquidity) << RESOLUTION, b - a, b)?;
    numerator.checked_div(a).ok_or(MathError::DivisionByZero)
}

pub fn get_amount1_for_liquidity(
    sqrt_ratio_a_x96: U256,
    sqrt_ratio_b_x96: U256,
    liquidity: u128,
) -> Result<U256, MathError> {
    let (a, b) = sorted(sqrt_ratio_a_x96, sqrt_ratio_b_x96);
    mul_div(U256::from(liquidity), b - a, Q96)
}

/// Token amounts represented by `liquidity` at the current price.
pub fn get_amounts_for_liquidity(
    sqrt_ratio_x96: U256,
    sqrt_ratio_a_x96: U256,
    sqrt_ratio_b_x96: U256,
    liquidity: u128,
) -> Result<(U256, U256), MathError> {
    let (a, b) = sorted(sqrt_ratio_a_x96, sqrt_ratio_b_x96);

    if sqrt_ratio_x96 <= a {
        Ok((get_amount0_for_liquidity(a, b, liquidity)?, U256::ZERO))
    } else if sqrt_ratio_x96 < b {
        Ok((
            get_amount0_for_liquidity(sqrt_ratio_x96, b, liquidity)?,
            get_amount1_for_liquidity(a, sqrt_ratio_x96, liquidity)?,
        ))
    } else {
        Ok((U256::ZERO, get_amount1_for_liquidity(a, b, liquidity)?))
    }
}
