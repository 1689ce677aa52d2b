use crate::error::Error;
use crate::token::Erc20;
use crate::vault::config::PositionRange;
use alloy_primitives::{Address, U256};

/// Liquidity the vault holds in one of its ranges.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct StakedRange {
    pub range: PositionRange,
    pub liquidity: u128,
}

/// Claims incentive rewards earned by the vault's positions.
///
/// Runs on every withdrawal before liquidity leaves the pool, with the base
/// range first.
pub trait RewardHook {
    fn claim_rewards(
        &mut self,
        tokens: &mut dyn Erc20,
        owner: Address,
        staked: [StakedRange; 2],
    ) -> Result<U256, Error>;
}

/// For pools without a gauge.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoRewards;

impl RewardHook for NoRewards {
    fn claim_rewards(
        &mut self,
        _tokens: &mut dyn Erc20,
        _owner: Address,
        _staked: [StakedRange; 2],
    ) -> Result<U256, Error> {
        Ok(U256::ZERO)
    }
}

/// A gauge with the vault as its only staker, paying one reward token to a
/// fixed receiver.
///
/// While the vault has liquidity staked in either range it earns everything
/// the gauge has accumulated. With nothing staked the rewards stay in the
/// gauge for a later claim.
#[derive(Clone, Debug)]
pub struct GaugeRewards {
    pub gauge: Address,
    pub reward_token: Address,
    pub receiver: Address,
    claimed: U256,
}

impl GaugeRewards {
    pub fn new(gauge: Address, reward_token: Address, receiver: Address) -> Self {
        Self {
            gauge,
            reward_token,
            receiver,
            claimed: U256::ZERO,
        }
    }

    /// Rewards paid out over the gauge's lifetime.
    pub fn claimed(&self) -> U256 {
        self.claimed
    }
}

impl RewardHook for GaugeRewards {
    fn claim_rewards(
        &mut self,
        tokens: &mut dyn Erc20,
        owner: Address,
        staked: [StakedRange; 2],
    ) -> Result<U256, Error> {
        let [base, limit] = staked;
        if base.liquidity == 0 && limit.liquidity == 0 {
            return Ok(U256::ZERO);
        }
        let amount = tokens.balance_of(self.reward_token, self.gauge);
        if amount.is_zero() {
            return Ok(U256::ZERO);
        }
        tokens.transfer(self.reward_token, self.gauge, self.receiver, amount)?;
        self.claimed = self.claimed.saturating_add(amount);

        tracing::debug!(
            %owner,
            receiver = %self.receiver,
            %amount,
            base_liquidity = base.liquidity,
            limit_liquidity = limit.liquidity,
            "gauge rewards claimed"
        );
        Ok(amount)
    }
}
