//! # granary-ledger
//!
//! Capabilities the staking engine consumes but does not implement: a
//! time source and fungible token ledgers.
//!
//! The traits are the seam; the concrete types here are reference
//! adapters used by tests and the simulator.
//!
//! ## Modules
//!
//! - [`clock`] — Time oracle trait, manual and system clocks
//! - [`token`] — Fungible / mintable token traits and an in-memory ledger

pub mod clock;
pub mod token;

pub use clock::{Clock, ManualClock, SystemClock};
pub use token::{FungibleToken, MemoryToken, MintableToken};

use granary_types::{AccountId, Amount};

/// Error types for token ledger operations.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// The source account does not hold enough tokens.
    #[error("insufficient funds in {account}: have {available}, need {required}")]
    InsufficientFunds {
        /// The debited account.
        account: AccountId,
        /// Current balance.
        available: Amount,
        /// Requested amount.
        required: Amount,
    },

    /// The spender has not been approved for enough tokens.
    #[error("insufficient allowance from {owner} to {spender}: have {available}, need {required}")]
    InsufficientAllowance {
        /// Token owner.
        owner: AccountId,
        /// Approved spender.
        spender: AccountId,
        /// Current allowance.
        available: Amount,
        /// Requested amount.
        required: Amount,
    },

    /// Minting would overflow the total supply.
    #[error("total supply overflow")]
    SupplyOverflow,

    /// The caller is not allowed to perform the operation.
    #[error("unauthorized: {0}")]
    Unauthorized(String),
}

/// Convenience result type for ledger operations.
pub type Result<T> = std::result::Result<T, LedgerError>;
