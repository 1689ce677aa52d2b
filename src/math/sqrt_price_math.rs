use crate::Q96;
use crate::RESOLUTION;
use crate::error::{Error, StateError};
use crate::math::math_helpers::{div_rounding_up, mul_div, mul_div_rounding_up};
use crate::math::tick_math::get_sqrt_ratio_at_tick;
use alloy_primitives::U256;

/// Token0 owed for `liquidity` between two sqrt prices, optionally
/// rounding up.
///
/// `liquidity * 2^96 * (sqrt_b - sqrt_a) / (sqrt_b * sqrt_a)`
pub fn get_amount_0_delta_base(
    mut sqrt_ratio_a_x96: U256,
    mut sqrt_ratio_b_x96: U256,
    liquidity: u128,
    round_up: bool,
) -> Result<U256, Error> {
    if sqrt_ratio_a_x96 > sqrt_ratio_b_x96 {
        (sqrt_ratio_a_x96, sqrt_ratio_b_x96) = (sqrt_ratio_b_x96, sqrt_ratio_a_x96)
    };

    if sqrt_ratio_a_x96.is_zero() {
        return Err(StateError::SqrtRatioIsZero.into());
    }

    let numerator1 = U256::from(liquidity) << RESOLUTION;
    let numerator2 = sqrt_ratio_b_x96 - sqrt_ratio_a_x96;

    if round_up {
        Ok(div_rounding_up(
            mul_div_rounding_up(numerator1, numerator2, sqrt_ratio_b_x96)?,
            sqrt_ratio_a_x96,
        ))
    } else {
        Ok(mul_div(numerator1, numerator2, sqrt_ratio_b_x96)? / sqrt_ratio_a_x96)
    }
}

/// Token1 owed for `liquidity` between two sqrt prices, optionally
/// rounding up.
///
/// `liquidity * (sqrt_b - sqrt_a) / 2^96`
pub fn get_amount_1_delta_base(
    mut sqrt_ratio_a_x96: U256,
    mut sqrt_ratio_b_x96: U256,
    liquidity: u128,
    round_up: bool,
) -> Result<U256, Error> {
    if sqrt_ratio_a_x96 > sqrt_ratio_b_x96 {
        (sqrt_ratio_a_x96, sqrt_ratio_b_x96) = (sqrt_ratio_b_x96, sqrt_ratio_a_x96)
    };
    let liquidity = U256::from(liquidity);

    let amount = if round_up {
        mul_div_rounding_up(liquidity, sqrt_ratio_b_x96 - sqrt_ratio_a_x96, Q96)?
    } else {
        mul_div(liquidity, sqrt_ratio_b_x96 - sqrt_ratio_a_x96, Q96)?
    };
    Ok(amount)
}

/// Token amounts backing a liquidity change of a `[tick_lower, tick_upper)`
/// position at the current price.
///
/// Pools round up what they take on mint and round down what they owe on
/// burn, so `round_up` is `true` for mints.
pub fn get_amounts_for_liquidity_delta(
    sqrt_price_x96: U256,
    tick_lower: i32,
    tick_upper: i32,
    liquidity: u128,
    round_up: bool,
) -> Result<(U256, U256), Error> {
    let sqrt_lower = get_sqrt_ratio_at_tick(tick_lower)?;
    let sqrt_upper = get_sqrt_ratio_at_tick(tick_upper)?;

    if sqrt_price_x96 <= sqrt_lower {
        Ok((
            get_amount_0_delta_base(sqrt_lower, sqrt_upper, liquidity, round_up)?,
            U256::ZERO,
        ))
    } else if sqrt_price_x96 < sqrt_upper {
        Ok((
            get_amount_0_delta_base(sqrt_price_x96, sqrt_upper, liquidity, round_up)?,
            get_amount_1_delta_base(sqrt_lower, sqrt_price_x96, liquidity, round_up)?,
        ))
    } else {
        Ok((
            U256::ZERO,
            get_amount_1_delta_base(sqrt_lower, sqrt_upper, liquidity, round_up)?,
        ))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::str::FromStr;

    // sqrt(1) and sqrt(1.21) in Q64.96
    fn price_one() -> U256 {
        U256::from_str("79228162514264337593543950336").unwrap()
    }

    fn price_one_point_two_one() -> U256 {
        U256::from_str("87150978765690771352898345369").unwrap()
    }

    #[test]
    fn amount_0_delta_is_zero_without_liquidity() {
        let amount_0 = get_amount_0_delta_base(price_one(), price_one_point_two_one(), 0, true);
        assert_eq!(amount_0.unwrap(), U256::ZERO);
    }

    #[test]
    fn amount_0_delta_is_zero_for_equal_prices() {
        let amount_0 = get_amount_0_delta_base(price_one(), price_one(), 1e18 as u128, true);
        assert_eq!(amount_0.unwrap(), U256::ZERO);
    }

    #[test]
    fn amount_0_delta_for_price_of_one_to_one_point_two_one() {
        let up = get_amount_0_delta_base(price_one(), price_one_point_two_one(), 1e18 as u128, true)
            .unwrap();
        assert_eq!(up, U256::from(90909090909090910u64));

        let down =
            get_amount_0_delta_base(price_one(), price_one_point_two_one(), 1e18 as u128, false)
                .unwrap();
        assert_eq!(down, up - U256::ONE);
    }

    #[test]
    fn amount_0_delta_for_prices_that_overflow_the_product() {
        let a = U256::from_str("2787593149816327892691964784081045188247552").unwrap();
        let b = U256::from_str("22300745198530623141535718272648361505980416").unwrap();

        let up = get_amount_0_delta_base(a, b, 1e18 as u128, true).unwrap();
        let down = get_amount_0_delta_base(a, b, 1e18 as u128, false).unwrap();
        assert_eq!(up, down + U256::ONE);
    }

    #[test]
    fn amount_0_delta_rejects_zero_price() {
        let result = get_amount_0_delta_base(U256::ZERO, price_one(), 1, true);
        assert!(matches!(
            result,
            Err(Error::StateError(StateError::SqrtRatioIsZero))
        ));
    }

    #[test]
    fn amount_1_delta_for_price_of_one_to_one_point_two_one() {
        let up = get_amount_1_delta_base(price_one(), price_one_point_two_one(), 1e18 as u128, true)
            .unwrap();
        assert_eq!(up, U256::from(100000000000000000u64));

        let down =
            get_amount_1_delta_base(price_one(), price_one_point_two_one(), 1e18 as u128, false)
                .unwrap();
        assert_eq!(down, up - U256::ONE);
    }

    #[test]
    fn amount_1_delta_is_order_independent() {
        let forward =
            get_amount_1_delta_base(price_one(), price_one_point_two_one(), 1e18 as u128, false);
        let backward =
            get_amount_1_delta_base(price_one_point_two_one(), price_one(), 1e18 as u128, false);
        assert_eq!(forward.unwrap(), backward.unwrap());
    }

    #[test]
    fn liquidity_delta_below_range_is_token0_only() {
        let price = get_sqrt_ratio_at_tick(-120).unwrap();
        let (amount0, amount1) =
            get_amounts_for_liquidity_delta(price, -60, 60, 1_000_000_000, true).unwrap();
        assert!(amount0 > U256::ZERO);
        assert_eq!(amount1, U256::ZERO);
    }

    #[test]
    fn liquidity_delta_above_range_is_token1_only() {
        let price = get_sqrt_ratio_at_tick(120).unwrap();
        let (amount0, amount1) =
            get_amounts_for_liquidity_delta(price, -60, 60, 1_000_000_000, false).unwrap();
        assert_eq!(amount0, U256::ZERO);
        assert!(amount1 > U256::ZERO);
    }

    #[test]
    fn liquidity_delta_rounding_up_never_owes_less() {
        let price = get_sqrt_ratio_at_tick(7).unwrap();
        let up = get_amounts_for_liquidity_delta(price, -60, 60, 123_456_789, true).unwrap();
        let down = get_amounts_for_liquidity_delta(price, -60, 60, 123_456_789, false).unwrap();
        assert!(up.0 >= down.0 && up.0 - down.0 <= U256::ONE);
        assert!(up.1 >= down.1 && up.1 - down.1 <= U256::ONE);
    }
}
