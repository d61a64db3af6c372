//! Pool accumulator.
//!
//! The pool keeps one global accumulator, `acc_reward_per_share`: the
//! reward earned by one unit of stake since genesis, scaled by
//! [`PRECISION`]. Settling the pool at time `now` folds the emission of
//! the interval `(last_reward_time, now]` into the accumulator:
//!
//! ```text
//! elapsed = now - max(last_reward_time, start_time)
//! reward  = reward_per_second * elapsed
//! acc    += reward * PRECISION / total_staked
//! ```
//!
//! Settlement is split into a pure step ([`PoolState::settle`]) and a
//! commit step ([`PoolState::apply`]) so the caller can mint the
//! emitted reward before the new accumulator becomes visible.

use granary_types::{Amount, Timestamp, PRECISION};
use primitive_types::U256;
use serde::{Deserialize, Serialize};

use crate::math::{self, mul_div};
use crate::{ChefError, Result};

/// Global accrual state of the pool.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolState {
    /// Reward tokens emitted per second while anything is staked.
    pub reward_per_second: Amount,
    /// Emission starts at this instant.
    pub start_time: Timestamp,
    /// Accrual has been settled up to this instant.
    pub last_reward_time: Timestamp,
    /// Reward per unit of stake since genesis, scaled by `PRECISION`.
    #[serde(with = "crate::math::decimal")]
    pub acc_reward_per_share: U256,
    /// Sum of all staked amounts.
    pub total_staked: Amount,
}

/// The outcome of settling a pool at some instant, not yet applied.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Settlement {
    /// New `last_reward_time`.
    pub time: Timestamp,
    /// New `acc_reward_per_share`.
    pub acc_reward_per_share: U256,
    /// Reward emitted over the settled interval.
    pub reward: Amount,
}

impl PoolState {
    /// Create a pool that starts emitting at `start_time`.
    ///
    /// The watermark begins at the later of `now` and `start_time`, so no
    /// interval before construction or before the start is ever settled.
    pub fn new(reward_per_second: Amount, start_time: Timestamp, now: Timestamp) -> Self {
        Self {
            reward_per_second,
            start_time,
            last_reward_time: now.max(start_time),
            acc_reward_per_share: U256::zero(),
            total_staked: 0,
        }
    }

    /// Compute the settlement at `now` without changing the pool.
    ///
    /// - `now <= last_reward_time` (which covers any `now` before
    ///   `start_time`): nothing to settle.
    /// - `total_staked == 0`: the watermark advances, nothing accrues.
    ///
    /// # Errors
    ///
    /// - [`ChefError::Overflow`] if the emission or accumulator overflows
    pub fn settle(&self, now: Timestamp) -> Result<Settlement> {
        if now <= self.last_reward_time {
            return Ok(self.unchanged());
        }
        if self.total_staked == 0 {
            return Ok(Settlement {
                time: now,
                acc_reward_per_share: self.acc_reward_per_share,
                reward: 0,
            });
        }

        let elapsed = now - self.last_reward_time.max(self.start_time);
        let reward = self
            .reward_per_second
            .checked_mul(Amount::from(elapsed))
            .ok_or(ChefError::Overflow)?;
        let increment = mul_div(
            U256::from(reward),
            U256::from(PRECISION),
            U256::from(self.total_staked),
        )?;
        let acc_reward_per_share = self
            .acc_reward_per_share
            .checked_add(increment)
            .ok_or(ChefError::Overflow)?;

        Ok(Settlement {
            time: now,
            acc_reward_per_share,
            reward,
        })
    }

    /// Commit a settlement produced by [`settle`](Self::settle).
    pub fn apply(&mut self, settlement: &Settlement) {
        self.last_reward_time = settlement.time;
        self.acc_reward_per_share = settlement.acc_reward_per_share;
    }

    /// Settle and commit in one step. Returns the emitted reward.
    ///
    /// # Errors
    ///
    /// - [`ChefError::Overflow`] if the emission or accumulator overflows
    pub fn update(&mut self, now: Timestamp) -> Result<Amount> {
        let settlement = self.settle(now)?;
        self.apply(&settlement);
        Ok(settlement.reward)
    }

    /// Reward credited to `amount` of stake by the current accumulator.
    ///
    /// # Errors
    ///
    /// - [`ChefError::Overflow`] if the result does not fit in `u128`
    pub fn accumulated(&self, amount: Amount) -> Result<Amount> {
        let credited = mul_div(
            U256::from(amount),
            self.acc_reward_per_share,
            U256::from(PRECISION),
        )?;
        math::to_amount(credited)
    }

    /// Whether emission has begun at `now`.
    pub fn has_started(&self, now: Timestamp) -> bool {
        now >= self.start_time
    }

    fn unchanged(&self) -> Settlement {
        Settlement {
            time: self.last_reward_time,
            acc_reward_per_share: self.acc_reward_per_share,
            reward: 0,
        }
    }
}
