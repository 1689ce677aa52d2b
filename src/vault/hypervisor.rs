use crate::error::{Error, IntegrityError, MathError, SlippageError, VaultError};
use crate::math::liquidity_amounts::{
    get_amounts_for_liquidity, get_liquidity_for_amounts, to_u128,
};
use crate::math::tick_math::get_sqrt_ratio_at_tick;
use crate::pool::interface::ConcentratedPool;
use crate::token::Erc20;
use crate::vault::accessor;
use crate::vault::config::{FeeSkim, HypervisorConfig, PositionRange};
use crate::vault::guard::ReentrancyGuard;
use crate::vault::hooks::{NoRewards, RewardHook, StakedRange};
use crate::vault::settlement::MintSettlement;
use crate::vault::shares::{self, ShareLedger};
use alloy_primitives::{Address, U256};

/// Liquidity of one range plus the token amounts it is worth, owed tokens
/// included.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct PositionAmounts {
    pub liquidity: u128,
    pub amount0: U256,
    pub amount1: U256,
}

/// Amounts returned to the vault by [`Hypervisor::pull_liquidity`].
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct PulledLiquidity {
    pub base0: U256,
    pub base1: U256,
    pub limit0: U256,
    pub limit1: U256,
}

/// Vault managing a base and a limit position on one pool.
///
/// Every mutating call takes the token ledger and the calling account
/// explicitly. Operations are all-or-nothing: preconditions are checked
/// before anything moves, and a later failure (slippage, payment,
/// arithmetic) restores both the vault, its pool included, and the ledger.
#[derive(Clone, Debug)]
pub struct Hypervisor<P, R = NoRewards> {
    address: Address,
    pool: P,
    token0: Address,
    token1: Address,
    tick_spacing: i32,
    config: HypervisorConfig,
    base: PositionRange,
    limit: PositionRange,
    shares: ShareLedger,
    guard: ReentrancyGuard,
    settlement: MintSettlement,
    rewards: R,
    /// Fees collected under [`FeeSkim::OnRebalance`] since the last skim.
    unskimmed: (U256, U256),
}

impl<P, R> Hypervisor<P, R>
where
    P: ConcentratedPool + Clone,
    R: RewardHook + Clone,
{
    pub fn new(
        address: Address,
        pool: P,
        config: HypervisorConfig,
        base: PositionRange,
        limit: PositionRange,
        rewards: R,
    ) -> Result<Self, Error> {
        if address.is_zero() {
            return Err(VaultError::InvalidRecipient.into());
        }
        config.validate()?;

        let tick_spacing = pool.tick_spacing();
        base.validate(tick_spacing)?;
        limit.validate(tick_spacing)?;
        if base == limit {
            return Err(VaultError::IdenticalRanges.into());
        }

        let (token0, token1) = (pool.token0(), pool.token1());
        tracing::info!(
            vault = %address,
            pool = %pool.address(),
            %token0,
            %token1,
            tick_spacing,
            "hypervisor created"
        );

        Ok(Self {
            address,
            pool,
            token0,
            token1,
            tick_spacing,
            config,
            base,
            limit,
            shares: ShareLedger::default(),
            guard: ReentrancyGuard::default(),
            settlement: MintSettlement::new(address, token0, token1),
            rewards,
            unskimmed: (U256::ZERO, U256::ZERO),
        })
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn pool(&self) -> &P {
        &self.pool
    }

    /// Direct access to the pool, e.g. to move the price of an in-memory
    /// pool between vault operations.
    pub fn pool_mut(&mut self) -> &mut P {
        &mut self.pool
    }

    pub fn rewards(&self) -> &R {
        &self.rewards
    }

    pub fn token0(&self) -> Address {
        self.token0
    }

    pub fn token1(&self) -> Address {
        self.token1
    }

    pub fn tick_spacing(&self) -> i32 {
        self.tick_spacing
    }

    pub fn config(&self) -> &HypervisorConfig {
        &self.config
    }

    pub fn base_range(&self) -> PositionRange {
        self.base
    }

    pub fn limit_range(&self) -> PositionRange {
        self.limit
    }

    /// Collected fees the next rebalance will skim under
    /// [`FeeSkim::OnRebalance`].
    pub fn unskimmed_fees(&self) -> (U256, U256) {
        self.unskimmed
    }

    pub fn total_supply(&self) -> U256 {
        self.shares.total_supply()
    }

    pub fn balance_of(&self, holder: Address) -> U256 {
        self.shares.balance_of(holder)
    }

    pub fn current_tick(&self) -> i32 {
        accessor::current_tick(&self.pool)
    }

    pub fn twap_tick(&self, seconds: u32) -> Result<i32, Error> {
        accessor::time_weighted_tick(&self.pool, seconds)
    }

    pub fn get_base_position(&self) -> Result<PositionAmounts, Error> {
        self.get_position(self.base)
    }

    pub fn get_limit_position(&self) -> Result<PositionAmounts, Error> {
        self.get_position(self.limit)
    }

    /// Everything the vault holds: unused balances plus both positions.
    pub fn get_total_amounts(&self, tokens: &dyn Erc20) -> Result<(U256, U256), Error> {
        let base = self.get_base_position()?;
        let limit = self.get_limit_position()?;

        let total0 = tokens
            .balance_of(self.token0, self.address)
            .checked_add(base.amount0)
            .and_then(|sum| sum.checked_add(limit.amount0))
            .ok_or(MathError::Overflow)?;
        let total1 = tokens
            .balance_of(self.token1, self.address)
            .checked_add(base.amount1)
            .and_then(|sum| sum.checked_add(limit.amount1))
            .ok_or(MathError::Overflow)?;
        Ok((total0, total1))
    }

    /// Deposits tokens pulled from `from` and mints shares to `to`.
    ///
    /// Only the whitelisted address may call this. With direct deposit on
    /// and shares outstanding, the whole unused balance is put to work in
    /// the base and then the limit range, each minting at least
    /// `in_min[0..2]` and `in_min[2..4]`.
    #[allow(clippy::too_many_arguments)]
    pub fn deposit<T: Erc20 + Clone>(
        &mut self,
        tokens: &mut T,
        caller: Address,
        deposit0: U256,
        deposit1: U256,
        to: Address,
        from: Address,
        in_min: [U256; 4],
    ) -> Result<U256, Error> {
        self.guarded(tokens, |this, tokens| {
            if deposit0.is_zero() && deposit1.is_zero() {
                return Err(VaultError::ZeroDeposit.into());
            }
            if deposit0 > this.config.deposit0_max || deposit1 > this.config.deposit1_max {
                return Err(VaultError::DepositExceedsMax.into());
            }
            if to.is_zero() || to == this.address {
                return Err(VaultError::InvalidRecipient.into());
            }
            let whitelisted = this.config.whitelisted_address;
            if whitelisted.is_zero() || caller != whitelisted {
                return Err(VaultError::Unauthorized.into());
            }

            this.zero_burn(tokens)?;

            let sqrt_price = get_sqrt_ratio_at_tick(this.current_tick())?;
            let price = shares::price_x36(sqrt_price)?;
            let (pool0, pool1) = this.get_total_amounts(tokens)?;
            let total_supply = this.shares.total_supply();

            let shares = shares::shares_for_deposit(
                deposit0,
                deposit1,
                price,
                total_supply,
                pool0,
                pool1,
            )?;
            if shares.is_zero() {
                return Err(VaultError::ZeroShares.into());
            }
            let max_total_supply = this.config.max_total_supply;
            if !max_total_supply.is_zero() {
                let new_supply = total_supply
                    .checked_add(shares)
                    .ok_or(MathError::Overflow)?;
                if new_supply > max_total_supply {
                    return Err(VaultError::MaxTotalSupplyExceeded.into());
                }
            }

            if !deposit0.is_zero() {
                tokens.transfer_from(this.token0, this.address, from, this.address, deposit0)?;
            }
            if !deposit1.is_zero() {
                tokens.transfer_from(this.token1, this.address, from, this.address, deposit1)?;
            }

            if !total_supply.is_zero() && this.config.direct_deposit {
                this.deploy_balances(tokens, in_min)?;
            }

            this.shares.mint(to, shares)?;

            tracing::info!(
                %from,
                %to,
                %shares,
                %deposit0,
                %deposit1,
                "deposit"
            );
            Ok(shares)
        })
    }

    /// Burns `shares` held by `from` and sends the proportional part of
    /// both positions and the unused balances to `to`.
    ///
    /// `min_amounts` bound what the base (`[0..2]`) and limit (`[2..4]`)
    /// burns must return.
    pub fn withdraw<T: Erc20 + Clone>(
        &mut self,
        tokens: &mut T,
        caller: Address,
        shares: U256,
        to: Address,
        from: Address,
        min_amounts: [U256; 4],
    ) -> Result<(U256, U256), Error> {
        self.guarded(tokens, |this, tokens| {
            if shares.is_zero() {
                return Err(VaultError::ZeroShares.into());
            }
            if to.is_zero() {
                return Err(VaultError::InvalidRecipient.into());
            }
            if caller != from {
                return Err(VaultError::Unauthorized.into());
            }
            if this.shares.balance_of(from) < shares {
                return Err(VaultError::InsufficientShares.into());
            }

            this.zero_burn(tokens)?;
            let staked = [this.base, this.limit].map(|range| StakedRange {
                range,
                liquidity: accessor::position(&this.pool, this.address, range).liquidity,
            });
            this.rewards.claim_rewards(tokens, this.address, staked)?;

            let total_supply = this.shares.total_supply();
            // fees leaving with the withdrawn shares are no longer skimmed
            let (unskimmed0, unskimmed1) = this.unskimmed;
            this.unskimmed = (
                unskimmed0 - shares::proportional(unskimmed0, shares, total_supply)?,
                unskimmed1 - shares::proportional(unskimmed1, shares, total_supply)?,
            );
            let (base0, base1) = {
                let range = this.base;
                let liquidity = this.liquidity_for_shares(range, shares, total_supply)?;
                this.burn_liquidity(
                    tokens,
                    range,
                    liquidity,
                    to,
                    false,
                    min_amounts[0],
                    min_amounts[1],
                )?
            };
            let (limit0, limit1) = {
                let range = this.limit;
                let liquidity = this.liquidity_for_shares(range, shares, total_supply)?;
                this.burn_liquidity(
                    tokens,
                    range,
                    liquidity,
                    to,
                    false,
                    min_amounts[2],
                    min_amounts[3],
                )?
            };

            let unused0 = shares::proportional(
                tokens.balance_of(this.token0, this.address),
                shares,
                total_supply,
            )?;
            let unused1 = shares::proportional(
                tokens.balance_of(this.token1, this.address),
                shares,
                total_supply,
            )?;
            if !unused0.is_zero() {
                tokens.transfer(this.token0, this.address, to, unused0)?;
            }
            if !unused1.is_zero() {
                tokens.transfer(this.token1, this.address, to, unused1)?;
            }

            this.shares.burn(from, shares)?;

            let amount0 = base0 + limit0 + unused0;
            let amount1 = base1 + limit1 + unused1;
            tracing::info!(%from, %to, %shares, %amount0, %amount1, "withdraw");
            Ok((amount0, amount1))
        })
    }

    /// Moves all liquidity into new base and limit ranges.
    ///
    /// `out_min` bounds the burns of the old ranges and `min_in` the mints
    /// into the new ones, base first in both arrays.
    #[allow(clippy::too_many_arguments)]
    pub fn rebalance<T: Erc20 + Clone>(
        &mut self,
        tokens: &mut T,
        caller: Address,
        base: PositionRange,
        limit: PositionRange,
        fee_recipient: Address,
        min_in: [U256; 4],
        out_min: [U256; 4],
    ) -> Result<(), Error> {
        self.guarded(tokens, |this, tokens| {
            this.only_owner(caller)?;
            base.validate(this.tick_spacing)?;
            limit.validate(this.tick_spacing)?;
            if base == limit {
                return Err(VaultError::IdenticalRanges.into());
            }
            if fee_recipient.is_zero() {
                return Err(VaultError::InvalidRecipient.into());
            }
            this.config.fee_recipient = fee_recipient;

            let (mut fees0, mut fees1) = this.zero_burn(tokens)?;

            let old_base = accessor::position(&this.pool, this.address, this.base);
            let old_limit = accessor::position(&this.pool, this.address, this.limit);
            // anything still owed after the zero-burn is fee income too
            let owed0 = U256::from(old_base.tokens_owed0) + U256::from(old_limit.tokens_owed0);
            let owed1 = U256::from(old_base.tokens_owed1) + U256::from(old_limit.tokens_owed1);
            fees0 += owed0;
            fees1 += owed1;

            let vault = this.address;
            this.burn_liquidity(
                tokens,
                this.base,
                old_base.liquidity,
                vault,
                true,
                out_min[0],
                out_min[1],
            )?;
            this.burn_liquidity(
                tokens,
                this.limit,
                old_limit.liquidity,
                vault,
                true,
                out_min[2],
                out_min[3],
            )?;

            if this.config.fee_skim == FeeSkim::OnRebalance {
                let (unskimmed0, unskimmed1) = this.unskimmed;
                let skim0 = unskimmed0.checked_add(owed0).ok_or(MathError::Overflow)?;
                let skim1 = unskimmed1.checked_add(owed1).ok_or(MathError::Overflow)?;
                this.skim_fees(tokens, skim0, skim1)?;
                this.unskimmed = (U256::ZERO, U256::ZERO);
            }

            let (total0, total1) = this.get_total_amounts(tokens)?;
            tracing::info!(
                tick = this.current_tick(),
                %total0,
                %total1,
                %fees0,
                %fees1,
                total_supply = %this.shares.total_supply(),
                "rebalance"
            );

            this.base = base;
            this.limit = limit;
            this.deploy_balances(tokens, min_in)?;
            Ok(())
        })
    }

    /// Collects fees and reinvests every unused token into both ranges.
    /// Returns the fees collected.
    pub fn compound<T: Erc20 + Clone>(
        &mut self,
        tokens: &mut T,
        caller: Address,
        in_min: [U256; 4],
    ) -> Result<(U256, U256), Error> {
        self.guarded(tokens, |this, tokens| {
            this.only_owner(caller)?;
            let (fees0, fees1) = this.zero_burn(tokens)?;
            this.deploy_balances(tokens, in_min)?;

            tracing::info!(%fees0, %fees1, "compound");
            Ok((fees0, fees1))
        })
    }

    /// Adds `amount0`/`amount1` of unused tokens to the base range, or the
    /// whole unused balance when both are zero.
    pub fn add_base_liquidity<T: Erc20 + Clone>(
        &mut self,
        tokens: &mut T,
        caller: Address,
        amount0: U256,
        amount1: U256,
        in_min: [U256; 2],
    ) -> Result<(U256, U256), Error> {
        self.guarded(tokens, |this, tokens| {
            this.only_owner(caller)?;
            let range = this.base;
            this.add_range_liquidity(tokens, range, amount0, amount1, in_min)
        })
    }

    /// Same as [`Self::add_base_liquidity`] for the limit range.
    pub fn add_limit_liquidity<T: Erc20 + Clone>(
        &mut self,
        tokens: &mut T,
        caller: Address,
        amount0: U256,
        amount1: U256,
        in_min: [U256; 2],
    ) -> Result<(U256, U256), Error> {
        self.guarded(tokens, |this, tokens| {
            this.only_owner(caller)?;
            let range = this.limit;
            this.add_range_liquidity(tokens, range, amount0, amount1, in_min)
        })
    }

    /// Burns the liquidity that `shares` would own back into the vault's
    /// unused balance. No shares are burned.
    pub fn pull_liquidity<T: Erc20 + Clone>(
        &mut self,
        tokens: &mut T,
        caller: Address,
        shares: U256,
        min_amounts: [U256; 4],
    ) -> Result<PulledLiquidity, Error> {
        self.guarded(tokens, |this, tokens| {
            this.only_owner(caller)?;
            if shares.is_zero() {
                return Err(VaultError::ZeroShares.into());
            }
            let total_supply = this.shares.total_supply();
            if shares > total_supply {
                return Err(VaultError::InsufficientShares.into());
            }

            this.zero_burn(tokens)?;

            let vault = this.address;
            let base = this.base;
            let liquidity = this.liquidity_for_shares(base, shares, total_supply)?;
            let (base0, base1) = this.burn_liquidity(
                tokens,
                base,
                liquidity,
                vault,
                false,
                min_amounts[0],
                min_amounts[1],
            )?;

            let limit = this.limit;
            let liquidity = this.liquidity_for_shares(limit, shares, total_supply)?;
            let (limit0, limit1) = this.burn_liquidity(
                tokens,
                limit,
                liquidity,
                vault,
                false,
                min_amounts[2],
                min_amounts[3],
            )?;

            let pulled = PulledLiquidity {
                base0,
                base1,
                limit0,
                limit1,
            };
            tracing::info!(%shares, ?pulled, "pull liquidity");
            Ok(pulled)
        })
    }

    /// Payment callback invoked by the pool during `mint`.
    pub fn uniswap_v3_mint_callback(
        &mut self,
        tokens: &mut dyn Erc20,
        caller: Address,
        amount0_owed: U256,
        amount1_owed: U256,
        data: &[u8],
    ) -> Result<(), Error> {
        use crate::pool::interface::MintCallback;

        if caller != self.pool.address() {
            tracing::warn!(%caller, "mint callback from an address other than the pool");
            return Err(IntegrityError::UnexpectedCallbackCaller.into());
        }
        self.settlement
            .uniswap_v3_mint_callback(tokens, caller, amount0_owed, amount1_owed, data)
    }

    pub fn set_whitelist(&mut self, caller: Address, account: Address) -> Result<(), Error> {
        self.only_owner(caller)?;
        self.config.whitelisted_address = account;
        tracing::info!(%account, "whitelist set");
        Ok(())
    }

    pub fn remove_whitelisted(&mut self, caller: Address) -> Result<(), Error> {
        self.only_owner(caller)?;
        self.config.whitelisted_address = Address::ZERO;
        tracing::info!("whitelist removed");
        Ok(())
    }

    pub fn set_fee(&mut self, caller: Address, fee: u8) -> Result<(), Error> {
        self.only_owner(caller)?;
        if fee == 0 {
            return Err(VaultError::InvalidFee.into());
        }
        self.config.fee = fee;
        tracing::info!(fee, "fee set");
        Ok(())
    }

    pub fn set_fee_recipient(&mut self, caller: Address, recipient: Address) -> Result<(), Error> {
        self.only_owner(caller)?;
        if recipient.is_zero() {
            return Err(VaultError::InvalidRecipient.into());
        }
        self.config.fee_recipient = recipient;
        tracing::info!(%recipient, "fee recipient set");
        Ok(())
    }

    pub fn set_fee_skim(&mut self, caller: Address, fee_skim: FeeSkim) -> Result<(), Error> {
        self.only_owner(caller)?;
        self.config.fee_skim = fee_skim;
        tracing::info!(?fee_skim, "fee skim policy set");
        Ok(())
    }

    pub fn toggle_direct_deposit(&mut self, caller: Address) -> Result<bool, Error> {
        self.only_owner(caller)?;
        self.config.direct_deposit = !self.config.direct_deposit;
        tracing::info!(direct_deposit = self.config.direct_deposit, "direct deposit toggled");
        Ok(self.config.direct_deposit)
    }

    pub fn set_deposit_max(
        &mut self,
        caller: Address,
        deposit0_max: U256,
        deposit1_max: U256,
    ) -> Result<(), Error> {
        self.only_owner(caller)?;
        self.config.deposit0_max = deposit0_max;
        self.config.deposit1_max = deposit1_max;
        tracing::info!(%deposit0_max, %deposit1_max, "deposit max set");
        Ok(())
    }

    pub fn set_max_total_supply(&mut self, caller: Address, max: U256) -> Result<(), Error> {
        self.only_owner(caller)?;
        self.config.max_total_supply = max;
        tracing::info!(%max, "max total supply set");
        Ok(())
    }

    pub fn transfer_ownership(&mut self, caller: Address, new_owner: Address) -> Result<(), Error> {
        self.only_owner(caller)?;
        if new_owner.is_zero() {
            return Err(VaultError::InvalidRecipient.into());
        }
        self.config.owner = new_owner;
        tracing::info!(previous = %caller, %new_owner, "ownership transferred");
        Ok(())
    }

    /// Runs `op` under the reentrancy guard. On failure the vault and the
    /// ledger are put back exactly as they were.
    fn guarded<T, O>(
        &mut self,
        tokens: &mut T,
        op: impl FnOnce(&mut Self, &mut T) -> Result<O, Error>,
    ) -> Result<O, Error>
    where
        T: Erc20 + Clone,
    {
        self.guard.enter()?;
        let (vault, ledger) = (self.clone(), tokens.clone());

        let result = op(self, tokens);
        if let Err(err) = &result {
            tracing::debug!(%err, "operation reverted");
            *self = vault;
            *tokens = ledger;
        }
        self.guard.exit();
        result
    }

    fn only_owner(&self, caller: Address) -> Result<(), VaultError> {
        if caller != self.config.owner {
            return Err(VaultError::Unauthorized);
        }
        Ok(())
    }

    fn get_position(&self, range: PositionRange) -> Result<PositionAmounts, Error> {
        let info = accessor::position(&self.pool, self.address, range);
        let (amount0, amount1) = self.amounts_for_liquidity(range, info.liquidity)?;
        Ok(PositionAmounts {
            liquidity: info.liquidity,
            amount0: amount0 + U256::from(info.tokens_owed0),
            amount1: amount1 + U256::from(info.tokens_owed1),
        })
    }

    fn amounts_for_liquidity(
        &self,
        range: PositionRange,
        liquidity: u128,
    ) -> Result<(U256, U256), Error> {
        Ok(get_amounts_for_liquidity(
            accessor::sqrt_price_x96(&self.pool),
            get_sqrt_ratio_at_tick(range.tick_lower)?,
            get_sqrt_ratio_at_tick(range.tick_upper)?,
            liquidity,
        )?)
    }

    fn liquidity_for_amounts(
        &self,
        range: PositionRange,
        amount0: U256,
        amount1: U256,
    ) -> Result<u128, Error> {
        Ok(get_liquidity_for_amounts(
            accessor::sqrt_price_x96(&self.pool),
            get_sqrt_ratio_at_tick(range.tick_lower)?,
            get_sqrt_ratio_at_tick(range.tick_upper)?,
            amount0,
            amount1,
        )?)
    }

    fn liquidity_for_shares(
        &self,
        range: PositionRange,
        shares: U256,
        total_supply: U256,
    ) -> Result<u128, Error> {
        let position = accessor::position(&self.pool, self.address, range);
        Ok(shares::liquidity_for_shares(
            position.liquidity,
            shares,
            total_supply,
        )?)
    }

    /// Settles and collects fees on both ranges. Under
    /// [`FeeSkim::OnZeroBurn`] the protocol's cut is forwarded per range,
    /// otherwise the collected fees are remembered for the next rebalance.
    fn zero_burn(&mut self, tokens: &mut dyn Erc20) -> Result<(U256, U256), Error> {
        let vault = self.address;
        let mut collected = (U256::ZERO, U256::ZERO);

        for range in [self.base, self.limit] {
            let position = accessor::position(&self.pool, vault, range);
            if position.liquidity == 0 {
                continue;
            }
            self.pool
                .burn(vault, range.tick_lower, range.tick_upper, 0)?;
            let (owed0, owed1) = self.pool.collect(
                tokens,
                vault,
                vault,
                range.tick_lower,
                range.tick_upper,
                u128::MAX,
                u128::MAX,
            )?;
            let (owed0, owed1) = (U256::from(owed0), U256::from(owed1));

            tracing::info!(
                fee = self.config.fee,
                %owed0,
                %owed1,
                tick_lower = range.tick_lower,
                tick_upper = range.tick_upper,
                "zero burn"
            );
            match self.config.fee_skim {
                FeeSkim::OnZeroBurn => {
                    self.skim_fees(tokens, owed0, owed1)?;
                }
                FeeSkim::OnRebalance => {
                    let (unskimmed0, unskimmed1) = self.unskimmed;
                    self.unskimmed = (
                        unskimmed0.checked_add(owed0).ok_or(MathError::Overflow)?,
                        unskimmed1.checked_add(owed1).ok_or(MathError::Overflow)?,
                    );
                }
            }

            collected.0 += owed0;
            collected.1 += owed1;
        }
        Ok(collected)
    }

    fn skim_fees(
        &mut self,
        tokens: &mut dyn Erc20,
        fees0: U256,
        fees1: U256,
    ) -> Result<(U256, U256), Error> {
        let fee = U256::from(self.config.fee);
        let recipient = self.config.fee_recipient;
        let (skim0, skim1) = (fees0 / fee, fees1 / fee);

        if !skim0.is_zero() {
            tokens.transfer(self.token0, self.address, recipient, skim0)?;
        }
        if !skim1.is_zero() {
            tokens.transfer(self.token1, self.address, recipient, skim1)?;
        }
        tracing::debug!(%recipient, %skim0, %skim1, "fees skimmed");
        Ok((skim0, skim1))
    }

    /// Mints everything the vault holds into the base range, then whatever
    /// is left into the limit range.
    fn deploy_balances(&mut self, tokens: &mut dyn Erc20, in_min: [U256; 4]) -> Result<(), Error> {
        for (range, min0, min1) in [
            (self.base, in_min[0], in_min[1]),
            (self.limit, in_min[2], in_min[3]),
        ] {
            let balance0 = tokens.balance_of(self.token0, self.address);
            let balance1 = tokens.balance_of(self.token1, self.address);
            let liquidity = self.liquidity_for_amounts(range, balance0, balance1)?;
            self.mint_liquidity(tokens, range, liquidity, min0, min1)?;
        }
        Ok(())
    }

    fn add_range_liquidity(
        &mut self,
        tokens: &mut dyn Erc20,
        range: PositionRange,
        amount0: U256,
        amount1: U256,
        in_min: [U256; 2],
    ) -> Result<(U256, U256), Error> {
        let (amount0, amount1) = if amount0.is_zero() && amount1.is_zero() {
            (
                tokens.balance_of(self.token0, self.address),
                tokens.balance_of(self.token1, self.address),
            )
        } else {
            (amount0, amount1)
        };
        let liquidity = self.liquidity_for_amounts(range, amount0, amount1)?;
        self.mint_liquidity(tokens, range, liquidity, in_min[0], in_min[1])
    }

    fn mint_liquidity(
        &mut self,
        tokens: &mut dyn Erc20,
        range: PositionRange,
        liquidity: u128,
        amount0_min: U256,
        amount1_min: U256,
    ) -> Result<(U256, U256), Error> {
        if liquidity == 0 {
            return Ok((U256::ZERO, U256::ZERO));
        }
        let vault = self.address;
        let data = self.settlement.arm(self.pool.address(), range, vault);

        let minted = self.pool.mint(
            tokens,
            vault,
            range.tick_lower,
            range.tick_upper,
            liquidity,
            &data,
            &mut self.settlement,
        );
        self.settlement.disarm();
        let (amount0, amount1) = minted?;

        if amount0 < amount0_min || amount1 < amount1_min {
            return Err(SlippageError::MintBelowMinimum.into());
        }
        tracing::debug!(
            tick_lower = range.tick_lower,
            tick_upper = range.tick_upper,
            liquidity,
            %amount0,
            %amount1,
            "liquidity minted"
        );
        Ok((amount0, amount1))
    }

    /// Burns `liquidity` from `range` and collects to `to`: exactly the
    /// burned amounts, or everything owed when `collect_all` is set.
    #[allow(clippy::too_many_arguments)]
    fn burn_liquidity(
        &mut self,
        tokens: &mut dyn Erc20,
        range: PositionRange,
        liquidity: u128,
        to: Address,
        collect_all: bool,
        amount0_min: U256,
        amount1_min: U256,
    ) -> Result<(U256, U256), Error> {
        if liquidity == 0 {
            return Ok((U256::ZERO, U256::ZERO));
        }
        let vault = self.address;
        let (owed0, owed1) =
            self.pool
                .burn(vault, range.tick_lower, range.tick_upper, liquidity)?;
        if owed0 < amount0_min || owed1 < amount1_min {
            return Err(SlippageError::BurnBelowMinimum.into());
        }

        let (request0, request1) = if collect_all {
            (u128::MAX, u128::MAX)
        } else {
            (to_u128(owed0)?, to_u128(owed1)?)
        };
        let (collected0, collected1) = self.pool.collect(
            tokens,
            vault,
            to,
            range.tick_lower,
            range.tick_upper,
            request0,
            request1,
        )?;

        tracing::debug!(
            tick_lower = range.tick_lower,
            tick_upper = range.tick_upper,
            liquidity,
            %to,
            collected0,
            collected1,
            "liquidity burned"
        );
        Ok((U256::from(collected0), U256::from(collected1)))
    }
}
