//! Integration test crate for granary.
//!
//! No library code lives here. The tests under `tests/` drive the
//! staking engine through the in-memory ledgers end to end:
//!
//! - `scenarios` — the classic two-staker MasterChef walkthrough
//! - `conservation` — randomized operation sequences checked against
//!   reward and stake conservation
//! - `concurrency` — many tasks sharing one pool through `SharedEngine`
//!
//! ```sh
//! cargo test -p granary-integration-tests
//! ```
