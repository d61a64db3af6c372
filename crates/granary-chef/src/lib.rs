//! # granary-chef
//!
//! Single-pool staking and reward distribution.
//!
//! Stakers lock a deposit token and accrue a reward token emitted at a
//! fixed rate per second, in proportion to their share of the pool at
//! every instant. Accrual is lazy: a global accumulator
//! (`acc_reward_per_share`) is settled at the start of every operation,
//! and each staker's `reward_debt` records how much of that accumulator
//! their current stake has already been credited with. All arithmetic is
//! integer fixed-point scaled by [`PRECISION`](granary_types::PRECISION).
//!
//! ## Modules
//!
//! - [`pool`] — Pool accumulator and settlement
//! - [`user`] — Per-staker records and pending reward
//! - [`engine`] — Deposit, withdraw, claim, claim-and-withdraw
//! - [`shared`] — Lock-guarded handle for concurrent callers
//! - [`config`] — Pool construction parameters
//! - [`events`] — Event log
//! - [`math`] — Wide fixed-point arithmetic

pub mod config;
pub mod engine;
pub mod events;
pub mod math;
pub mod pool;
pub mod shared;
pub mod user;

pub use config::PoolConfig;
pub use engine::{Engine, Receipt};
pub use events::ChefEvent;
pub use pool::{PoolState, Settlement};
pub use shared::SharedEngine;
pub use user::{UserLedger, UserRecord};

use granary_ledger::LedgerError;
use granary_types::Amount;

/// Error types for staking operations.
#[derive(Debug, thiserror::Error)]
pub enum ChefError {
    /// Zero amount where a positive amount is required.
    #[error("amount must be greater than zero")]
    InvalidAmount,

    /// Withdrawal exceeds the caller's stake.
    #[error("insufficient staked balance: staked {staked}, requested {requested}")]
    InsufficientBalance {
        /// Current stake.
        staked: Amount,
        /// Requested withdrawal.
        requested: Amount,
    },

    /// Fixed-point arithmetic exceeded 128 bits.
    #[error("arithmetic overflow")]
    Overflow,

    /// Fixed-point division by zero.
    #[error("division by zero")]
    DivisionByZero,

    /// A token capability rejected a movement.
    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),

    /// The pool lock is held by another operation.
    #[error("pool is busy")]
    Busy,

    /// Invalid pool configuration.
    #[error("invalid config: {0}")]
    InvalidConfig(String),
}

/// Convenience result type for staking operations.
pub type Result<T> = std::result::Result<T, ChefError>;
