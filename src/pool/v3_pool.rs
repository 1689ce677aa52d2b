use crate::FastMap;
use crate::Q128;
use crate::error::{Error, MathError, StateError};
use crate::math::liquidity_amounts::to_u128;
use crate::math::liquidity_math::{add_delta, tick_spacing_to_max_liquidity_per_tick};
use crate::math::math_helpers::mul_div;
use crate::math::sqrt_price_math::get_amounts_for_liquidity_delta;
use crate::math::tick_math::{
    MAX_SQRT_RATIO, MAX_TICK, MIN_SQRT_RATIO, MIN_TICK, get_tick_at_sqrt_ratio,
};
use crate::pool::interface::{
    ConcentratedPool, MintCallback, PositionInfo, PositionKeyFormat, Slot0,
};
use crate::token::Erc20;
use alloy_primitives::{Address, B256, I256, U160, U256};

fn signed(amount: U256) -> Result<I256, MathError> {
    I256::try_from(amount).map_err(|_| MathError::Overflow)
}

/// Converts an `Address` into its `U160` numeric representation.
#[inline(always)]
pub fn address_to_u160(address: Address) -> U160 {
    address.into()
}

/// Returns the token pair sorted by numeric address, as used by Uniswap V3.
pub fn sort_tokens(token0: Address, token1: Address) -> (Address, Address) {
    if address_to_u160(token0) < address_to_u160(token1) {
        (token0, token1)
    } else {
        (token1, token0)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Observation {
    pub timestamp: u32,
    pub tick_cumulative: i64,
}

/// Fee growth and liquidity shared by every position on one range.
#[derive(Copy, Clone, Debug, Default)]
struct RangeState {
    liquidity: u128,
    fee_growth0_x128: U256,
    fee_growth1_x128: U256,
}

/// In-memory concentrated-liquidity pool without a swap engine.
///
/// Positions, payments and oracle cumulatives follow Uniswap V3. Price
/// moves are settled against a trader with [`V3Pool::swap_to_price`] and
/// trading fees are injected with [`V3Pool::accrue_fees`]; the pool's own token balance lives in the
/// [`Erc20`] ledger under [`V3Pool::pool_address`].
#[derive(Clone, Debug)]
pub struct V3Pool {
    pub pool_address: Address,
    pub token0: Address,
    pub token1: Address,
    pub fee_pips: u32,
    pub tick_spacing: i32,
    pub slot0: Slot0,
    pub key_format: PositionKeyFormat,
    max_liquidity_per_tick: u128,
    positions: FastMap<B256, PositionInfo>,
    ranges: FastMap<(i32, i32), RangeState>,
    liquidity_gross: FastMap<i32, u128>,
    observations: Vec<Observation>,
    time: u32,
}

impl V3Pool {
    pub fn new(
        pool_address: Address,
        token0: Address,
        token1: Address,
        fee_pips: u32,
        tick_spacing: i32,
        sqrt_price_x96: U256,
    ) -> Result<Self, Error> {
        if tick_spacing <= 0 || tick_spacing > MAX_TICK {
            return Err(StateError::TickOutOfBounds.into());
        }
        let (token0, token1) = sort_tokens(token0, token1);
        let tick = get_tick_at_sqrt_ratio(sqrt_price_x96)?;

        Ok(Self {
            pool_address,
            token0,
            token1,
            fee_pips,
            tick_spacing,
            slot0: Slot0 {
                sqrt_price_x96,
                tick,
            },
            key_format: PositionKeyFormat::Standard,
            max_liquidity_per_tick: tick_spacing_to_max_liquidity_per_tick(tick_spacing),
            positions: FastMap::default(),
            ranges: FastMap::default(),
            liquidity_gross: FastMap::default(),
            observations: vec![Observation {
                timestamp: 0,
                tick_cumulative: 0,
            }],
            time: 0,
        })
    }

    /// Stores positions under `format` instead of the standard key.
    pub fn with_key_format(mut self, format: PositionKeyFormat) -> Self {
        self.key_format = format;
        self
    }

    /// Liquidity of every range containing the current tick.
    pub fn liquidity(&self) -> u128 {
        let tick = self.slot0.tick;
        self.ranges
            .iter()
            .filter(|((lower, upper), _)| *lower <= tick && tick < *upper)
            .fold(0u128, |acc, (_, range)| acc.saturating_add(range.liquidity))
    }

    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    pub fn now(&self) -> u32 {
        self.time
    }

    /// Moves the price to `sqrt_price_x96` the way a swap would, settling
    /// the change in what the pool's liquidity is worth with `trader`.
    ///
    /// Returns the pool's balance deltas: positive amounts were paid in by
    /// the trader, negative ones paid out to it. Payments into the pool
    /// round up and payments out round down, so the pool always holds at
    /// least what its positions are worth.
    pub fn swap_to_price(
        &mut self,
        tokens: &mut dyn Erc20,
        trader: Address,
        sqrt_price_x96: U256,
    ) -> Result<(I256, I256), Error> {
        if !(MIN_SQRT_RATIO..MAX_SQRT_RATIO).contains(&sqrt_price_x96) {
            return Err(StateError::SqrtPriceOutOfBounds.into());
        }
        let tick = get_tick_at_sqrt_ratio(sqrt_price_x96)?;

        let (before0, before1) = self.reserves_at(self.slot0.sqrt_price_x96, false)?;
        let (after0, after1) = self.reserves_at(sqrt_price_x96, true)?;
        let flows = [(self.token0, before0, after0), (self.token1, before1, after1)];

        // the trader pays first so a short trader leaves the pool untouched
        for (token, before, after) in flows {
            if after > before {
                tokens.transfer(token, trader, self.pool_address, after - before)?;
            }
        }
        for (token, before, after) in flows {
            if before > after {
                tokens.transfer(token, self.pool_address, trader, before - after)?;
            }
        }

        self.write_observation()?;
        self.slot0 = Slot0 {
            sqrt_price_x96,
            tick,
        };

        let amount0 = signed(after0)? - signed(before0)?;
        let amount1 = signed(after1)? - signed(before1)?;
        tracing::debug!(%trader, tick, %sqrt_price_x96, %amount0, %amount1, "pool price moved");
        Ok((amount0, amount1))
    }

    pub fn advance_time(&mut self, seconds: u32) -> Result<u32, Error> {
        self.time = self.time.checked_add(seconds).ok_or(MathError::Overflow)?;
        Ok(self.time)
    }

    /// Credits trading fees to the liquidity of `[tick_lower, tick_upper)`.
    ///
    /// The tokens themselves must already sit in the pool's balance; this
    /// only updates fee growth so that positions can claim them.
    pub fn accrue_fees(
        &mut self,
        tick_lower: i32,
        tick_upper: i32,
        fees0: U256,
        fees1: U256,
    ) -> Result<(), Error> {
        let range = self
            .ranges
            .get_mut(&(tick_lower, tick_upper))
            .filter(|range| range.liquidity > 0)
            .ok_or(StateError::NoPosition)?;

        let liquidity = U256::from(range.liquidity);
        range.fee_growth0_x128 = range
            .fee_growth0_x128
            .wrapping_add(mul_div(fees0, Q128, liquidity)?);
        range.fee_growth1_x128 = range
            .fee_growth1_x128
            .wrapping_add(mul_div(fees1, Q128, liquidity)?);

        tracing::debug!(tick_lower, tick_upper, %fees0, %fees1, "fees accrued");
        Ok(())
    }

    /// Token amounts backing every range at `sqrt_price_x96`.
    fn reserves_at(&self, sqrt_price_x96: U256, round_up: bool) -> Result<(U256, U256), Error> {
        let mut reserves = (U256::ZERO, U256::ZERO);
        for (&(tick_lower, tick_upper), range) in &self.ranges {
            if range.liquidity == 0 {
                continue;
            }
            let (amount0, amount1) = get_amounts_for_liquidity_delta(
                sqrt_price_x96,
                tick_lower,
                tick_upper,
                range.liquidity,
                round_up,
            )?;
            reserves.0 = reserves.0.checked_add(amount0).ok_or(MathError::Overflow)?;
            reserves.1 = reserves.1.checked_add(amount1).ok_or(MathError::Overflow)?;
        }
        Ok(reserves)
    }

    fn check_ticks(&self, tick_lower: i32, tick_upper: i32) -> Result<(), StateError> {
        if tick_lower >= tick_upper {
            return Err(StateError::InvalidTickRange);
        }
        if tick_lower < MIN_TICK || tick_upper > MAX_TICK {
            return Err(StateError::TickOutOfBounds);
        }
        for tick in [tick_lower, tick_upper] {
            if tick % self.tick_spacing != 0 {
                return Err(StateError::TickMisaligned(tick));
            }
        }
        Ok(())
    }

    fn check_liquidity_cap(
        &self,
        tick_lower: i32,
        tick_upper: i32,
        amount: u128,
    ) -> Result<(), Error> {
        for tick in [tick_lower, tick_upper] {
            let gross = self.liquidity_gross.get(&tick).copied().unwrap_or_default();
            let updated = gross.checked_add(amount).ok_or(MathError::Overflow)?;
            if updated > self.max_liquidity_per_tick {
                return Err(StateError::LiquidityExceedsMax.into());
            }
        }
        Ok(())
    }

    fn write_observation(&mut self) -> Result<(), Error> {
        let last = self.observations[self.observations.len() - 1];
        if last.timestamp == self.time {
            return Ok(());
        }
        let elapsed = i64::from(self.time - last.timestamp);
        let tick_cumulative = last
            .tick_cumulative
            .checked_add(i64::from(self.slot0.tick) * elapsed)
            .ok_or(MathError::Overflow)?;
        self.observations.push(Observation {
            timestamp: self.time,
            tick_cumulative,
        });
        Ok(())
    }

    fn cumulative_at(&self, target: u32) -> Result<i64, Error> {
        if target < self.observations[0].timestamp {
            return Err(StateError::ObservationTooOld.into());
        }
        let index = self
            .observations
            .partition_point(|obs| obs.timestamp <= target)
            - 1;
        let at = self.observations[index];
        let elapsed = i64::from(target - at.timestamp);

        let cumulative = match self.observations.get(index + 1) {
            // the tick is constant between two observations
            Some(next) => {
                let span = i64::from(next.timestamp - at.timestamp);
                at.tick_cumulative + (next.tick_cumulative - at.tick_cumulative) * elapsed / span
            }
            None => at.tick_cumulative + i64::from(self.slot0.tick) * elapsed,
        };
        Ok(cumulative)
    }

    /// Updates liquidity for one position and settles its accrued fees.
    fn modify_position(
        &mut self,
        owner: Address,
        tick_lower: i32,
        tick_upper: i32,
        liquidity_delta: i128,
    ) -> Result<B256, Error> {
        let key = self.key_format.key(owner, tick_lower, tick_upper);
        let mut position = self.positions.get(&key).copied().unwrap_or_default();

        if liquidity_delta == 0 && position.liquidity == 0 {
            return Err(StateError::NoPosition.into());
        }

        let range = self
            .ranges
            .get(&(tick_lower, tick_upper))
            .copied()
            .unwrap_or_default();

        let owed0 = mul_div(
            range
                .fee_growth0_x128
                .wrapping_sub(position.fee_growth_inside0_last_x128),
            U256::from(position.liquidity),
            Q128,
        )?;
        let owed1 = mul_div(
            range
                .fee_growth1_x128
                .wrapping_sub(position.fee_growth_inside1_last_x128),
            U256::from(position.liquidity),
            Q128,
        )?;

        position.liquidity = add_delta(position.liquidity, liquidity_delta)?;
        position.fee_growth_inside0_last_x128 = range.fee_growth0_x128;
        position.fee_growth_inside1_last_x128 = range.fee_growth1_x128;
        position.tokens_owed0 = position.tokens_owed0.saturating_add(to_u128(owed0)?);
        position.tokens_owed1 = position.tokens_owed1.saturating_add(to_u128(owed1)?);

        if liquidity_delta != 0 {
            for tick in [tick_lower, tick_upper] {
                let gross = self.liquidity_gross.entry(tick).or_default();
                *gross = add_delta(*gross, liquidity_delta)?;
            }
            let range = self.ranges.entry((tick_lower, tick_upper)).or_default();
            range.liquidity = add_delta(range.liquidity, liquidity_delta)?;
        }

        self.positions.insert(key, position);
        Ok(key)
    }
}

impl ConcentratedPool for V3Pool {
    fn address(&self) -> Address {
        self.pool_address
    }

    fn token0(&self) -> Address {
        self.token0
    }

    fn token1(&self) -> Address {
        self.token1
    }

    fn tick_spacing(&self) -> i32 {
        self.tick_spacing
    }

    fn key_format(&self) -> PositionKeyFormat {
        self.key_format
    }

    fn slot0(&self) -> Slot0 {
        self.slot0
    }

    fn positions(&self, key: B256) -> PositionInfo {
        self.positions.get(&key).copied().unwrap_or_default()
    }

    fn mint(
        &mut self,
        tokens: &mut dyn Erc20,
        recipient: Address,
        tick_lower: i32,
        tick_upper: i32,
        amount: u128,
        data: &[u8],
        callback: &mut dyn MintCallback,
    ) -> Result<(U256, U256), Error> {
        if amount == 0 {
            return Err(MathError::ZeroValue.into());
        }
        self.check_ticks(tick_lower, tick_upper)?;
        let delta = i128::try_from(amount).map_err(|_| MathError::Overflow)?;

        let (amount0, amount1) = get_amounts_for_liquidity_delta(
            self.slot0.sqrt_price_x96,
            tick_lower,
            tick_upper,
            amount,
            true,
        )?;

        self.check_liquidity_cap(tick_lower, tick_upper, amount)?;

        let balance0_before = tokens.balance_of(self.token0, self.pool_address);
        let balance1_before = tokens.balance_of(self.token1, self.pool_address);

        callback.uniswap_v3_mint_callback(tokens, self.pool_address, amount0, amount1, data)?;

        if tokens.balance_of(self.token0, self.pool_address) < balance0_before.saturating_add(amount0) {
            return Err(StateError::InsufficientPayment0.into());
        }
        if tokens.balance_of(self.token1, self.pool_address) < balance1_before.saturating_add(amount1) {
            return Err(StateError::InsufficientPayment1.into());
        }
        self.modify_position(recipient, tick_lower, tick_upper, delta)?;

        tracing::debug!(
            %recipient,
            tick_lower,
            tick_upper,
            liquidity = amount,
            %amount0,
            %amount1,
            "pool mint"
        );
        Ok((amount0, amount1))
    }

    fn burn(
        &mut self,
        owner: Address,
        tick_lower: i32,
        tick_upper: i32,
        amount: u128,
    ) -> Result<(U256, U256), Error> {
        self.check_ticks(tick_lower, tick_upper)?;
        let delta = i128::try_from(amount)
            .map(|amount| -amount)
            .map_err(|_| MathError::Overflow)?;

        let key = self.modify_position(owner, tick_lower, tick_upper, delta)?;

        let (amount0, amount1) = get_amounts_for_liquidity_delta(
            self.slot0.sqrt_price_x96,
            tick_lower,
            tick_upper,
            amount,
            false,
        )?;

        if amount0 > U256::ZERO || amount1 > U256::ZERO {
            let position = self.positions.entry(key).or_default();
            position.tokens_owed0 = position.tokens_owed0.saturating_add(to_u128(amount0)?);
            position.tokens_owed1 = position.tokens_owed1.saturating_add(to_u128(amount1)?);
        }

        tracing::debug!(
            %owner,
            tick_lower,
            tick_upper,
            liquidity = amount,
            %amount0,
            %amount1,
            "pool burn"
        );
        Ok((amount0, amount1))
    }

    fn collect(
        &mut self,
        tokens: &mut dyn Erc20,
        owner: Address,
        recipient: Address,
        tick_lower: i32,
        tick_upper: i32,
        amount0_requested: u128,
        amount1_requested: u128,
    ) -> Result<(u128, u128), Error> {
        let key = self.key_format.key(owner, tick_lower, tick_upper);
        let mut position = self.positions.get(&key).copied().unwrap_or_default();

        let amount0 = amount0_requested.min(position.tokens_owed0);
        let amount1 = amount1_requested.min(position.tokens_owed1);

        if amount0 > 0 {
            tokens.transfer(self.token0, self.pool_address, recipient, U256::from(amount0))?;
            position.tokens_owed0 -= amount0;
        }
        if amount1 > 0 {
            tokens.transfer(self.token1, self.pool_address, recipient, U256::from(amount1))?;
            position.tokens_owed1 -= amount1;
        }
        if self.positions.contains_key(&key) {
            self.positions.insert(key, position);
        }

        tracing::debug!(%owner, %recipient, tick_lower, tick_upper, amount0, amount1, "pool collect");
        Ok((amount0, amount1))
    }

    fn observe(&self, seconds_agos: &[u32]) -> Result<Vec<i64>, Error> {
        seconds_agos
            .iter()
            .map(|ago| {
                let target = self
                    .time
                    .checked_sub(*ago)
                    .ok_or(StateError::ObservationTooOld)?;
                self.cumulative_at(target)
            })
            .collect()
    }
}
