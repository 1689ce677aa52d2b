//! Read-only views of a pool from the vault's side.

use crate::error::{Error, StateError, VaultError};
use crate::pool::interface::{ConcentratedPool, PositionInfo};
use crate::vault::config::PositionRange;
use alloy_primitives::{Address, U256};

pub fn position<P: ConcentratedPool + ?Sized>(
    pool: &P,
    owner: Address,
    range: PositionRange,
) -> PositionInfo {
    let key = pool
        .key_format()
        .key(owner, range.tick_lower, range.tick_upper);
    pool.positions(key)
}

pub fn current_tick<P: ConcentratedPool + ?Sized>(pool: &P) -> i32 {
    pool.slot0().tick
}

pub fn sqrt_price_x96<P: ConcentratedPool + ?Sized>(pool: &P) -> U256 {
    pool.slot0().sqrt_price_x96
}

/// Arithmetic mean tick over the last `seconds`, rounded toward negative
/// infinity.
pub fn time_weighted_tick<P: ConcentratedPool + ?Sized>(
    pool: &P,
    seconds: u32,
) -> Result<i32, Error> {
    if seconds == 0 {
        return Err(VaultError::InvalidTwapWindow.into());
    }
    let cumulatives = pool.observe(&[seconds, 0])?;
    let [then, now] = cumulatives[..] else {
        return Err(StateError::ObservationTooOld.into());
    };
    let delta = now - then;
    let window = i64::from(seconds);

    let mut tick = delta / window;
    if delta < 0 && delta % window != 0 {
        tick -= 1;
    }
    Ok(tick as i32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::tick_math::get_sqrt_ratio_at_tick;
    use crate::pool::v3_pool::V3Pool;
    use crate::token::InMemoryTokens;

    const TRADER: Address = Address::repeat_byte(0x77);

    fn pool_at(tick: i32) -> V3Pool {
        V3Pool::new(
            Address::repeat_byte(0xaa),
            Address::repeat_byte(0x10),
            Address::repeat_byte(0x11),
            3000,
            60,
            get_sqrt_ratio_at_tick(tick).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn reads_slot0() {
        let pool = pool_at(-1234);
        assert_eq!(current_tick(&pool), -1234);
        assert_eq!(sqrt_price_x96(&pool), get_sqrt_ratio_at_tick(-1234).unwrap());
    }

    #[test]
    fn unknown_position_is_empty() {
        let pool = pool_at(0);
        let range = PositionRange::new(-60, 60, 60).unwrap();
        assert_eq!(position(&pool, Address::ZERO, range), PositionInfo::default());
    }

    #[test]
    fn twap_averages_over_the_window() {
        let mut pool = pool_at(100);
        pool.advance_time(60).unwrap();
        pool.swap_to_price(&mut InMemoryTokens::default(), TRADER, get_sqrt_ratio_at_tick(200).unwrap())
            .unwrap();
        pool.advance_time(60).unwrap();

        assert_eq!(time_weighted_tick(&pool, 120).unwrap(), 150);
        assert_eq!(time_weighted_tick(&pool, 60).unwrap(), 200);
    }

    #[test]
    fn twap_rounds_toward_negative_infinity() {
        let mut pool = pool_at(-1);
        pool.advance_time(1).unwrap();
        pool.swap_to_price(&mut InMemoryTokens::default(), TRADER, get_sqrt_ratio_at_tick(0).unwrap())
            .unwrap();
        pool.advance_time(1).unwrap();

        // mean of -1 and 0
        assert_eq!(time_weighted_tick(&pool, 2).unwrap(), -1);
    }

    #[test]
    fn twap_rejects_an_empty_window() {
        let pool = pool_at(0);
        assert!(matches!(
            time_weighted_tick(&pool, 0),
            Err(Error::VaultError(VaultError::InvalidTwapWindow))
        ));
    }
}
