//! # granary-types
//!
//! Shared domain types used across the granary workspace.
//!
//! ## Modules
//!
//! - [`account`] — Account identifiers
//! - [`amount`] — Amount parsing and text serialization

pub mod account;
pub mod amount;

pub use account::{AccountId, ParseAccountError};
pub use amount::{parse_amount, ParseAmountError};

/// Token amount in the token's smallest unit.
pub type Amount = u128;

/// Unix timestamp in seconds.
pub type Timestamp = u64;

/// Fixed-point scale for `acc_reward_per_share` (10^36).
///
/// A settlement floors away less than `amount / PRECISION` of any
/// stake's share, so stakes up to 10^36 base units lose under one unit.
pub const PRECISION: u128 = 1_000_000_000_000_000_000_000_000_000_000_000_000;

/// One whole token with 18 decimals.
pub const UNIT: Amount = 1_000_000_000_000_000_000;

/// Label the pool custody account is derived from when none is configured.
pub const DEFAULT_CUSTODY_LABEL: &str = "pool";
