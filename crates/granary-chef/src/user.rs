//! Per-staker records.
//!
//! A staker's pending reward is the part of the pool accumulator their
//! stake has not yet been credited with:
//!
//! ```text
//! pending = amount * acc_reward_per_share / PRECISION - reward_debt
//! ```
//!
//! `reward_debt` is rebased after every position change, so only the
//! accumulator growth since then counts toward the next payout.

use std::collections::BTreeMap;

use granary_types::{AccountId, Amount};
use serde::{Deserialize, Serialize};

use crate::pool::PoolState;
use crate::Result;

/// A staker's position.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    /// Currently staked amount.
    pub amount: Amount,
    /// Reward already priced in at the last position change.
    pub reward_debt: Amount,
}

impl UserRecord {
    /// Reward owed against the pool's current accumulator.
    ///
    /// Only meaningful right after the pool has been settled.
    /// Saturates at zero.
    pub fn pending(&self, pool: &PoolState) -> Result<Amount> {
        Ok(pool
            .accumulated(self.amount)?
            .saturating_sub(self.reward_debt))
    }

    /// Price the current accumulator into `reward_debt`.
    pub fn rebase(&mut self, pool: &PoolState) -> Result<()> {
        self.reward_debt = pool.accumulated(self.amount)?;
        Ok(())
    }
}

/// All staker records, keyed by account.
///
/// Records are created on first deposit and never removed; a record
/// whose amount fell to zero stays behind and is inert.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct UserLedger {
    records: BTreeMap<AccountId, UserRecord>,
}

impl UserLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// The record for `who`, if one has been created.
    pub fn get(&self, who: &AccountId) -> Option<&UserRecord> {
        self.records.get(who)
    }

    /// The record for `who`, or an empty record.
    pub fn info(&self, who: &AccountId) -> UserRecord {
        self.records.get(who).copied().unwrap_or_default()
    }

    /// Insert or replace the record for `who`.
    pub fn store(&mut self, who: AccountId, record: UserRecord) {
        self.records.insert(who, record);
    }

    /// Remove the record for `who`. Only used to undo a failed first deposit.
    pub(crate) fn forget(&mut self, who: &AccountId) {
        self.records.remove(who);
    }

    /// Number of records, including zeroed ones.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether no record exists.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// All records ordered by account.
    pub fn iter(&self) -> impl Iterator<Item = (&AccountId, &UserRecord)> {
        self.records.iter()
    }

    /// Sum of all staked amounts.
    pub fn total_amount(&self) -> Amount {
        self.records.values().map(|r| r.amount).sum()
    }
}
