//! Fungible token capability and an in-memory ledger.
//!
//! [`FungibleToken`] covers balances, transfers and allowances;
//! [`MintableToken`] adds issuance. The staking engine pulls deposits
//! with [`FungibleToken::transfer_from`] (the pool custody account is
//! the approved spender) and pays out of custody with
//! [`FungibleToken::transfer`].

use std::collections::BTreeMap;

use granary_types::{AccountId, Amount};

use crate::{LedgerError, Result};

/// Balance, transfer and allowance operations of a fungible token.
pub trait FungibleToken {
    /// Balance held by `account`.
    fn balance_of(&self, account: &AccountId) -> Amount;

    /// Amount `spender` may still pull from `owner`.
    fn allowance(&self, owner: &AccountId, spender: &AccountId) -> Amount;

    /// Move `amount` from `from` to `to`.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::InsufficientFunds`] if `from` holds less than `amount`
    fn transfer(&mut self, from: &AccountId, to: &AccountId, amount: Amount) -> Result<()>;

    /// Move `amount` from `from` to `to` on behalf of `spender`, consuming allowance.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::InsufficientAllowance`] if `spender` is not approved for `amount`
    /// - [`LedgerError::InsufficientFunds`] if `from` holds less than `amount`
    fn transfer_from(
        &mut self,
        spender: &AccountId,
        from: &AccountId,
        to: &AccountId,
        amount: Amount,
    ) -> Result<()>;
}

/// A token that can issue new supply.
pub trait MintableToken: FungibleToken {
    /// Create `amount` new tokens in `to`, issued by `minter`.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::Unauthorized`] if `minter` does not hold the minter role
    /// - [`LedgerError::SupplyOverflow`] if total supply would overflow
    fn mint(&mut self, minter: &AccountId, to: &AccountId, amount: Amount) -> Result<()>;
}

/// An in-memory token ledger.
///
/// With no minter configured anyone may mint, which is what test
/// fixtures want for the deposit token. The reward token is built
/// [`with_minter`](MemoryToken::with_minter) so only the pool custody
/// account can issue it. An allowance of `Amount::MAX` is never
/// decremented.
#[derive(Debug, Clone, Default)]
pub struct MemoryToken {
    symbol: String,
    minter: Option<AccountId>,
    total_supply: Amount,
    balances: BTreeMap<AccountId, Amount>,
    allowances: BTreeMap<(AccountId, AccountId), Amount>,
}

impl MemoryToken {
    /// Create an empty token that anyone may mint.
    pub fn new(symbol: &str) -> Self {
        Self {
            symbol: symbol.to_string(),
            ..Self::default()
        }
    }

    /// Create an empty token that only `minter` may mint.
    pub fn with_minter(symbol: &str, minter: AccountId) -> Self {
        Self {
            symbol: symbol.to_string(),
            minter: Some(minter),
            ..Self::default()
        }
    }

    /// Token ticker.
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Sum of all balances.
    pub fn total_supply(&self) -> Amount {
        self.total_supply
    }

    /// Hand the minter role to `minter`.
    pub fn set_minter(&mut self, minter: AccountId) {
        tracing::info!(token = %self.symbol, %minter, "minter role transferred");
        self.minter = Some(minter);
    }

    /// Allow `spender` to pull up to `amount` from `owner`.
    pub fn approve(&mut self, owner: &AccountId, spender: &AccountId, amount: Amount) {
        self.allowances.insert((*owner, *spender), amount);
    }

    /// All non-zero balances, ordered by account.
    pub fn balances(&self) -> impl Iterator<Item = (&AccountId, &Amount)> {
        self.balances.iter().filter(|(_, amount)| **amount > 0)
    }

    fn debit(&mut self, account: &AccountId, amount: Amount) -> Result<()> {
        let available = self.balance_of(account);
        if available < amount {
            return Err(LedgerError::InsufficientFunds {
                account: *account,
                available,
                required: amount,
            });
        }
        self.balances.insert(*account, available - amount);
        Ok(())
    }

    fn credit(&mut self, account: &AccountId, amount: Amount) {
        // Cannot overflow: every credit is backed by supply, which is bounded by u128.
        *self.balances.entry(*account).or_insert(0) += amount;
    }
}

impl FungibleToken for MemoryToken {
    fn balance_of(&self, account: &AccountId) -> Amount {
        self.balances.get(account).copied().unwrap_or(0)
    }

    fn allowance(&self, owner: &AccountId, spender: &AccountId) -> Amount {
        self.allowances
            .get(&(*owner, *spender))
            .copied()
            .unwrap_or(0)
    }

    fn transfer(&mut self, from: &AccountId, to: &AccountId, amount: Amount) -> Result<()> {
        self.debit(from, amount)?;
        self.credit(to, amount);
        tracing::trace!(token = %self.symbol, %from, %to, amount, "transfer");
        Ok(())
    }

    fn transfer_from(
        &mut self,
        spender: &AccountId,
        from: &AccountId,
        to: &AccountId,
        amount: Amount,
    ) -> Result<()> {
        let allowed = self.allowance(from, spender);
        if allowed < amount {
            return Err(LedgerError::InsufficientAllowance {
                owner: *from,
                spender: *spender,
                available: allowed,
                required: amount,
            });
        }
        self.transfer(from, to, amount)?;
        if allowed != Amount::MAX {
            self.allowances.insert((*from, *spender), allowed - amount);
        }
        Ok(())
    }
}

impl MintableToken for MemoryToken {
    fn mint(&mut self, minter: &AccountId, to: &AccountId, amount: Amount) -> Result<()> {
        if let Some(expected) = &self.minter {
            if expected != minter {
                return Err(LedgerError::Unauthorized(format!(
                    "{minter} is not the minter of {}",
                    self.symbol
                )));
            }
        }
        self.total_supply = self
            .total_supply
            .checked_add(amount)
            .ok_or(LedgerError::SupplyOverflow)?;
        self.credit(to, amount);
        tracing::trace!(token = %self.symbol, %to, amount, "mint");
        Ok(())
    }
}
