//! Event log.
//!
//! The engine records one event per settlement that emitted rewards and
//! one per user-visible token movement. Callers drain the log with
//! [`Engine::take_events`](crate::Engine::take_events).

use granary_types::{AccountId, Amount, Timestamp};
use primitive_types::U256;
use serde::{Deserialize, Serialize};

/// An event emitted by the staking engine.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChefEvent {
    /// The pool accumulator advanced and `minted` rewards went to custody.
    PoolUpdated {
        /// Settlement time.
        time: Timestamp,
        /// Accumulator after settlement.
        #[serde(with = "crate::math::decimal")]
        acc_reward_per_share: U256,
        /// Rewards minted into custody.
        minted: Amount,
    },
    /// Deposit tokens moved into the pool.
    Deposit {
        /// Staker.
        who: AccountId,
        /// Amount staked.
        amount: Amount,
        /// Operation time.
        time: Timestamp,
    },
    /// Deposit tokens moved out of the pool.
    Withdraw {
        /// Staker.
        who: AccountId,
        /// Amount unstaked.
        amount: Amount,
        /// Operation time.
        time: Timestamp,
    },
    /// Rewards paid to a staker.
    Claim {
        /// Staker.
        who: AccountId,
        /// Reward tokens paid.
        reward: Amount,
        /// Operation time.
        time: Timestamp,
    },
}

impl ChefEvent {
    /// Event name, for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::PoolUpdated { .. } => "PoolUpdated",
            Self::Deposit { .. } => "Deposit",
            Self::Withdraw { .. } => "Withdraw",
            Self::Claim { .. } => "Claim",
        }
    }
}
