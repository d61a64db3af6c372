//! Staking engine.
//!
//! Every operation follows the same sequence:
//!
//! 1. read the clock once
//! 2. validate the request and pre-check the token ledgers
//! 3. settle the pool (mint the emission into custody, then commit)
//! 4. compute the caller's pending reward against the *old* stake
//! 5. apply the stake change and rebase `reward_debt` on the *new* stake
//! 6. move tokens: pull deposit, push principal, pay reward
//!
//! Step 2 rejects before anything changes. If a token movement in
//! step 6 fails, the pool and caller record are restored to their
//! post-settlement values and any principal already moved is reversed.
//!
//! The engine owns its capabilities and takes `&mut self`, so a token
//! implementation cannot call back into the engine mid-operation.

use granary_ledger::{Clock, FungibleToken, LedgerError, MintableToken};
use granary_types::{AccountId, Amount, Timestamp};
use serde::{Deserialize, Serialize};

use crate::config::PoolConfig;
use crate::events::ChefEvent;
use crate::pool::PoolState;
use crate::user::{UserLedger, UserRecord};
use crate::{ChefError, Result};

/// What an operation paid out and where it left the caller.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    /// Reward tokens paid to the caller.
    pub reward: Amount,
    /// Deposit tokens moved (in for deposits, out for withdrawals).
    pub principal: Amount,
    /// Caller's stake after the operation.
    pub staked: Amount,
    /// Operation time.
    pub time: Timestamp,
}

/// How an operation changes the caller's stake.
#[derive(Clone, Copy, Debug)]
enum StakeChange {
    Keep,
    Add(Amount),
    Remove(Amount),
}

/// Single-pool staking engine over a deposit token `D`, a reward token
/// `R` and a clock `C`.
#[derive(Debug)]
pub struct Engine<D, R, C> {
    custody: AccountId,
    pool: PoolState,
    users: UserLedger,
    deposit_token: D,
    reward_token: R,
    clock: C,
    events: Vec<ChefEvent>,
    total_emitted: Amount,
    total_paid: Amount,
}

impl<D, R, C> Engine<D, R, C>
where
    D: FungibleToken,
    R: MintableToken,
    C: Clock,
{
    /// Build an engine from a validated config.
    ///
    /// The reward token must let `config.custody` mint.
    ///
    /// # Errors
    ///
    /// - [`ChefError::InvalidConfig`] if the config is invalid
    pub fn new(config: PoolConfig, deposit_token: D, reward_token: R, clock: C) -> Result<Self> {
        config.validate()?;
        let pool = PoolState::new(config.reward_per_second, config.start_time, clock.now());

        tracing::info!(
            reward_per_second = config.reward_per_second,
            start_time = config.start_time,
            custody = %config.custody,
            "pool created"
        );

        Ok(Self {
            custody: config.custody,
            pool,
            users: UserLedger::new(),
            deposit_token,
            reward_token,
            clock,
            events: Vec::new(),
            total_emitted: 0,
            total_paid: 0,
        })
    }

    /// Settle the pool at the current time. Returns the rewards minted.
    ///
    /// # Errors
    ///
    /// - [`ChefError::Overflow`] if the accumulator overflows
    /// - [`ChefError::Ledger`] if minting into custody fails
    pub fn update_pool(&mut self) -> Result<Amount> {
        let now = self.clock.now();
        self.settle(now)
    }

    /// Stake `amount` deposit tokens and collect pending rewards.
    ///
    /// A zero amount only collects rewards. The pool custody account must
    /// be approved to pull `amount` from `who`.
    ///
    /// # Errors
    ///
    /// - [`ChefError::Ledger`] if `who` lacks balance or allowance
    /// - [`ChefError::Overflow`] on arithmetic overflow
    pub fn deposit(&mut self, who: &AccountId, amount: Amount) -> Result<Receipt> {
        self.execute(who, StakeChange::Add(amount))
    }

    /// Unstake `amount` and collect pending rewards.
    ///
    /// # Errors
    ///
    /// - [`ChefError::InvalidAmount`] if `amount` is zero
    /// - [`ChefError::InsufficientBalance`] if `amount` exceeds the stake
    pub fn withdraw(&mut self, who: &AccountId, amount: Amount) -> Result<Receipt> {
        self.execute(who, StakeChange::Remove(amount))
    }

    /// Collect pending rewards without changing the stake.
    ///
    /// Succeeds with a zero reward for accounts that never staked.
    ///
    /// # Errors
    ///
    /// - [`ChefError::Overflow`] on arithmetic overflow
    /// - [`ChefError::Ledger`] if a reward movement fails
    pub fn claim(&mut self, who: &AccountId) -> Result<Receipt> {
        self.execute(who, StakeChange::Keep)
    }

    /// Collect all pending rewards and unstake `amount` under one settlement.
    ///
    /// Leaves the same balances as [`claim`](Self::claim) followed by
    /// [`withdraw`](Self::withdraw) at the same instant.
    ///
    /// # Errors
    ///
    /// - [`ChefError::InvalidAmount`] if `amount` is zero
    /// - [`ChefError::InsufficientBalance`] if `amount` exceeds the stake
    pub fn claim_and_withdraw(&mut self, who: &AccountId, amount: Amount) -> Result<Receipt> {
        // Withdraw already pays the full pending reward before unstaking.
        self.execute(who, StakeChange::Remove(amount))
    }

    /// The caller's `{amount, reward_debt}`; zero for unknown accounts.
    pub fn user_info(&self, who: &AccountId) -> UserRecord {
        self.users.info(who)
    }

    /// Pending reward of `who` projected to the current time, without settling.
    ///
    /// # Errors
    ///
    /// - [`ChefError::Overflow`] on arithmetic overflow
    pub fn pending_reward(&self, who: &AccountId) -> Result<Amount> {
        let mut projected = self.pool.clone();
        projected.update(self.clock.now())?;
        self.users.info(who).pending(&projected)
    }

    /// Current pool state.
    pub fn pool(&self) -> &PoolState {
        &self.pool
    }

    /// All staker records, including zeroed ones.
    pub fn stakers(&self) -> impl Iterator<Item = (&AccountId, &UserRecord)> {
        self.users.iter()
    }

    /// The pool's custody account.
    pub fn custody(&self) -> &AccountId {
        &self.custody
    }

    /// Rewards minted into custody so far.
    pub fn total_emitted(&self) -> Amount {
        self.total_emitted
    }

    /// Rewards paid out to stakers so far.
    pub fn total_paid(&self) -> Amount {
        self.total_paid
    }

    /// The deposit token ledger.
    pub fn deposit_token(&self) -> &D {
        &self.deposit_token
    }

    /// The reward token ledger.
    pub fn reward_token(&self) -> &R {
        &self.reward_token
    }

    /// The clock.
    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Drain the event log.
    pub fn take_events(&mut self) -> Vec<ChefEvent> {
        std::mem::take(&mut self.events)
    }

    /// Mint the emission since the last settlement into custody, then
    /// commit the new accumulator.
    fn settle(&mut self, now: Timestamp) -> Result<Amount> {
        let settlement = self.pool.settle(now)?;
        if settlement.reward > 0 {
            self.reward_token
                .mint(&self.custody, &self.custody, settlement.reward)?;
            self.total_emitted = self.total_emitted.saturating_add(settlement.reward);
            self.events.push(ChefEvent::PoolUpdated {
                time: settlement.time,
                acc_reward_per_share: settlement.acc_reward_per_share,
                minted: settlement.reward,
            });
            tracing::debug!(
                time = settlement.time,
                acc_reward_per_share = %settlement.acc_reward_per_share,
                minted = settlement.reward,
                total_staked = self.pool.total_staked,
                "pool settled"
            );
        }
        self.pool.apply(&settlement);
        Ok(settlement.reward)
    }

    fn execute(&mut self, who: &AccountId, change: StakeChange) -> Result<Receipt> {
        let now = self.clock.now();
        let existing = self.users.get(who).copied();
        let before = existing.unwrap_or_default();

        self.validate(who, &before, change)?;
        self.settle(now)?;

        let pending = before.pending(&self.pool)?;
        let mut after = before;
        let mut total_staked = self.pool.total_staked;
        match change {
            StakeChange::Keep => {}
            StakeChange::Add(amount) => {
                after.amount = after.amount.checked_add(amount).ok_or(ChefError::Overflow)?;
                total_staked = total_staked.checked_add(amount).ok_or(ChefError::Overflow)?;
            }
            StakeChange::Remove(amount) => {
                // Validated against `before.amount`, and total_staked >= any one stake.
                after.amount -= amount;
                total_staked -= amount;
            }
        }
        after.rebase(&self.pool)?;

        // Commit state before any token leaves custody.
        let pool_before = self.pool.clone();
        self.pool.total_staked = total_staked;
        let keeps_record = existing.is_some() || matches!(change, StakeChange::Add(_));
        if keeps_record {
            self.users.store(*who, after);
        }

        let (principal, reward) = match self.move_tokens(who, change, pending) {
            Ok(moved) => moved,
            Err(e) => {
                self.pool = pool_before;
                match existing {
                    Some(record) => self.users.store(*who, record),
                    None => self.users.forget(who),
                }
                tracing::error!(
                    %who,
                    ?change,
                    error = %e,
                    "token movement failed, operation rolled back"
                );
                return Err(e);
            }
        };

        self.total_paid = self.total_paid.saturating_add(reward);
        self.record(who, change, principal, reward, now);

        Ok(Receipt {
            reward,
            principal,
            staked: after.amount,
            time: now,
        })
    }

    /// Reject before settlement: bad amounts and deposits the ledger would refuse.
    fn validate(&self, who: &AccountId, record: &UserRecord, change: StakeChange) -> Result<()> {
        match change {
            StakeChange::Keep => Ok(()),
            StakeChange::Remove(0) => Err(ChefError::InvalidAmount),
            StakeChange::Remove(amount) if amount > record.amount => {
                Err(ChefError::InsufficientBalance {
                    staked: record.amount,
                    requested: amount,
                })
            }
            StakeChange::Remove(_) => Ok(()),
            StakeChange::Add(0) => Ok(()),
            StakeChange::Add(amount) => {
                let allowed = self.deposit_token.allowance(who, &self.custody);
                if allowed < amount {
                    return Err(LedgerError::InsufficientAllowance {
                        owner: *who,
                        spender: self.custody,
                        available: allowed,
                        required: amount,
                    }
                    .into());
                }
                let available = self.deposit_token.balance_of(who);
                if available < amount {
                    return Err(LedgerError::InsufficientFunds {
                        account: *who,
                        available,
                        required: amount,
                    }
                    .into());
                }
                Ok(())
            }
        }
    }

    /// Pull deposit, push principal, pay reward. Returns `(principal, reward)`.
    fn move_tokens(
        &mut self,
        who: &AccountId,
        change: StakeChange,
        pending: Amount,
    ) -> Result<(Amount, Amount)> {
        let principal = match change {
            StakeChange::Add(amount) if amount > 0 => {
                self.deposit_token
                    .transfer_from(&self.custody, who, &self.custody, amount)?;
                amount
            }
            StakeChange::Remove(amount) => {
                self.deposit_token.transfer(&self.custody, who, amount)?;
                amount
            }
            _ => 0,
        };

        match self.pay_reward(who, pending) {
            Ok(reward) => Ok((principal, reward)),
            Err(e) => {
                let undo = match change {
                    StakeChange::Add(amount) if amount > 0 => {
                        self.deposit_token.transfer(&self.custody, who, amount)
                    }
                    StakeChange::Remove(amount) => {
                        self.deposit_token.transfer(who, &self.custody, amount)
                    }
                    _ => Ok(()),
                };
                if let Err(undo) = undo {
                    tracing::error!(%who, principal, error = %undo, "principal reversal failed");
                }
                Err(e)
            }
        }
    }

    /// Transfer up to `amount` rewards from custody, clamped to the custody balance.
    fn pay_reward(&mut self, to: &AccountId, amount: Amount) -> Result<Amount> {
        if amount == 0 {
            return Ok(0);
        }
        let available = self.reward_token.balance_of(&self.custody);
        let paid = amount.min(available);
        if paid < amount {
            tracing::warn!(
                %to,
                owed = amount,
                available,
                "reward payout clamped to custody balance"
            );
        }
        if paid > 0 {
            self.reward_token.transfer(&self.custody, to, paid)?;
        }
        Ok(paid)
    }

    fn record(
        &mut self,
        who: &AccountId,
        change: StakeChange,
        principal: Amount,
        reward: Amount,
        time: Timestamp,
    ) {
        if reward > 0 {
            self.events.push(ChefEvent::Claim {
                who: *who,
                reward,
                time,
            });
        }
        match change {
            StakeChange::Add(_) if principal > 0 => {
                self.events.push(ChefEvent::Deposit {
                    who: *who,
                    amount: principal,
                    time,
                });
            }
            StakeChange::Remove(_) => {
                self.events.push(ChefEvent::Withdraw {
                    who: *who,
                    amount: principal,
                    time,
                });
            }
            _ => {}
        }
        tracing::info!(
            %who,
            ?change,
            reward,
            principal,
            total_staked = self.pool.total_staked,
            "stake operation"
        );
    }
}
