//! Fungible token collaborator.
//!
//! The vault and the pool only ever move tokens through [`Erc20`]. A single
//! ledger instance stands in for every token contract, keyed by token
//! address, the way chain state is shared by all contracts.

use crate::FastMap;
use crate::error::TokenError;
use alloy_primitives::{Address, U256};

pub trait Erc20 {
    fn balance_of(&self, token: Address, account: Address) -> U256;

    fn allowance(&self, token: Address, owner: Address, spender: Address) -> U256;

    fn approve(&mut self, token: Address, owner: Address, spender: Address, amount: U256);

    fn transfer(
        &mut self,
        token: Address,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<(), TokenError>;

    /// Moves `amount` on behalf of `from`, spending `spender`'s allowance.
    fn transfer_from(
        &mut self,
        token: Address,
        spender: Address,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<(), TokenError>;
}

/// In-memory balances and allowances for any number of tokens.
#[derive(Clone, Debug, Default)]
pub struct InMemoryTokens {
    balances: FastMap<(Address, Address), U256>,
    allowances: FastMap<(Address, Address, Address), U256>,
}

impl InMemoryTokens {
    /// Credits `amount` of `token` to `to` out of thin air.
    pub fn mint(&mut self, token: Address, to: Address, amount: U256) {
        let balance = self.balances.entry((token, to)).or_default();
        *balance = balance.saturating_add(amount);
    }
}

impl Erc20 for InMemoryTokens {
    fn balance_of(&self, token: Address, account: Address) -> U256 {
        self.balances
            .get(&(token, account))
            .copied()
            .unwrap_or_default()
    }

    fn allowance(&self, token: Address, owner: Address, spender: Address) -> U256 {
        self.allowances
            .get(&(token, owner, spender))
            .copied()
            .unwrap_or_default()
    }

    fn approve(&mut self, token: Address, owner: Address, spender: Address, amount: U256) {
        self.allowances.insert((token, owner, spender), amount);
    }

    fn transfer(
        &mut self,
        token: Address,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<(), TokenError> {
        let from_balance = self.balance_of(token, from);
        let remaining = from_balance
            .checked_sub(amount)
            .ok_or(TokenError::InsufficientBalance)?;

        self.balances.insert((token, from), remaining);
        let to_balance = self.balances.entry((token, to)).or_default();
        *to_balance = to_balance.saturating_add(amount);
        Ok(())
    }

    fn transfer_from(
        &mut self,
        token: Address,
        spender: Address,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<(), TokenError> {
        let allowance = self.allowance(token, from, spender);
        if allowance < amount {
            return Err(TokenError::InsufficientAllowance);
        }
        self.transfer(token, from, to, amount)?;
        // unlimited approvals are never decremented
        if allowance != U256::MAX {
            self.allowances
                .insert((token, from, spender), allowance - amount);
        }
        Ok(())
    }
}
