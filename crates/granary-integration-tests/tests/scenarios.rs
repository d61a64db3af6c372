//! Integration test: two stakers through the full staking lifecycle.
//!
//! Pool emits 1 token per second starting one day after deployment.
//! Bob and Alice deposit 10 tokens each, then the pool is updated,
//! partially withdrawn from, claimed and drained.

use granary_chef::{ChefError, ChefEvent, Engine, PoolConfig};
use granary_ledger::{FungibleToken, ManualClock, MemoryToken, MintableToken};
use granary_types::{AccountId, Amount, Timestamp, UNIT};

/// Deployment time.
const DEPLOYED_AT: Timestamp = 1_700_000_000;

/// Emission starts one day after deployment.
const START: Timestamp = DEPLOYED_AT + 86_400;

type Pool = Engine<MemoryToken, MemoryToken, ManualClock>;

fn alice() -> AccountId {
    AccountId::from_label("alice")
}

fn bob() -> AccountId {
    AccountId::from_label("bob")
}

/// Deploy the pool with alice and bob each holding 10M deposit tokens.
fn deploy() -> (Pool, ManualClock) {
    let config = PoolConfig::new(UNIT, START);
    let clock = ManualClock::new(DEPLOYED_AT);

    let mut lp = MemoryToken::new("LP");
    for who in [alice(), bob()] {
        lp.mint(&who, &who, 10_000_000 * UNIT)
            .expect("Funding should succeed");
        lp.approve(&who, &config.custody, Amount::MAX);
    }
    // Reward token ownership handed to the pool.
    let mut reward = MemoryToken::with_minter("RWD", alice());
    reward.set_minter(config.custody);

    let pool = Engine::new(config, lp, reward, clock.clone()).expect("Pool should deploy");
    (pool, clock)
}

fn deposit_both(pool: &mut Pool) {
    pool.deposit(&bob(), 10 * UNIT)
        .expect("Bob deposit should succeed");
    pool.deposit(&alice(), 10 * UNIT)
        .expect("Alice deposit should succeed");
}

#[test]
fn deposits_are_recorded() {
    let (mut pool, _clock) = deploy();
    deposit_both(&mut pool);

    assert_eq!(pool.user_info(&bob()).amount, 10 * UNIT, "Bob stake");
    assert_eq!(pool.user_info(&alice()).amount, 10 * UNIT, "Alice stake");
    assert_eq!(
        pool.deposit_token().balance_of(pool.custody()),
        20 * UNIT,
        "Custody should hold both deposits"
    );
}

#[test]
fn update_pool_emits_rate_times_elapsed() {
    let (mut pool, clock) = deploy();
    deposit_both(&mut pool);

    // =========================================================
    // Move to the start; nothing accrued before it
    // =========================================================
    clock.set(START);
    assert_eq!(pool.update_pool().expect("update at start"), 0);
    let before = pool.reward_token().balance_of(pool.custody());

    // =========================================================
    // Ten seconds later the pool mints exactly 10 tokens
    // =========================================================
    clock.advance(10);
    pool.update_pool().expect("update");
    let after = pool.reward_token().balance_of(pool.custody());
    assert_eq!(after - before, 10 * UNIT, "Custody should receive rate x 10s");
}

#[test]
fn withdraw_returns_exact_principal() {
    let (mut pool, clock) = deploy();
    deposit_both(&mut pool);
    clock.set(START + 10);

    let before = pool.deposit_token().balance_of(&bob());
    pool.withdraw(&bob(), 40_000_000_000)
        .expect("Partial withdraw should succeed");
    let after = pool.deposit_token().balance_of(&bob());

    assert_eq!(after - before, 40_000_000_000, "Bob gets back exactly 4e10");
    assert_eq!(pool.user_info(&bob()).amount, 10 * UNIT - 40_000_000_000);
}

#[test]
fn claim_pays_proportional_share() {
    let (mut pool, clock) = deploy();
    deposit_both(&mut pool);
    clock.set(START + 10);

    let receipt = pool.claim(&bob()).expect("Claim should succeed");
    assert_eq!(receipt.reward, 5 * UNIT, "Half of 10 tokens");
    assert_eq!(pool.reward_token().balance_of(&bob()), 5 * UNIT);

    // Alice has not claimed; her share is still pending in custody.
    assert_eq!(pool.pending_reward(&alice()).expect("pending"), 5 * UNIT);
    assert_eq!(pool.reward_token().balance_of(pool.custody()), 5 * UNIT);
}

#[test]
fn claim_and_withdraw_matches_claim_then_withdraw() {
    let (mut combined, clock_a) = deploy();
    let (mut separate, clock_b) = deploy();
    deposit_both(&mut combined);
    deposit_both(&mut separate);
    clock_a.set(START + 37);
    clock_b.set(START + 37);

    combined
        .claim_and_withdraw(&bob(), 3 * UNIT)
        .expect("claim_and_withdraw");
    separate.claim(&bob()).expect("claim");
    separate.withdraw(&bob(), 3 * UNIT).expect("withdraw");

    for who in [alice(), bob()] {
        assert_eq!(
            combined.reward_token().balance_of(&who),
            separate.reward_token().balance_of(&who),
            "Reward balances must match"
        );
        assert_eq!(
            combined.deposit_token().balance_of(&who),
            separate.deposit_token().balance_of(&who),
            "Deposit balances must match"
        );
        assert_eq!(combined.user_info(&who), separate.user_info(&who));
    }
    assert_eq!(combined.pool(), separate.pool());
}

#[test]
fn late_depositor_earns_only_from_entry() {
    let (mut pool, clock) = deploy();
    clock.set(START);
    pool.deposit(&alice(), 10 * UNIT).expect("Alice deposit");

    clock.advance(10);
    pool.deposit(&bob(), 10 * UNIT).expect("Bob deposit");

    clock.advance(10);
    let alice_reward = pool.claim(&alice()).expect("Alice claim").reward;
    let bob_reward = pool.claim(&bob()).expect("Bob claim").reward;

    assert_eq!(alice_reward, 15 * UNIT, "10 alone + 5 shared");
    assert_eq!(bob_reward, 5 * UNIT, "5 shared");
    assert_eq!(pool.total_paid(), pool.total_emitted());
}

#[test]
fn empty_pool_interval_is_not_emitted() {
    let (mut pool, clock) = deploy();
    clock.set(START + 100);
    assert_eq!(pool.update_pool().expect("update"), 0, "Nothing staked");

    pool.deposit(&bob(), UNIT).expect("deposit");
    clock.advance(1);
    assert_eq!(pool.claim(&bob()).expect("claim").reward, UNIT);
    assert_eq!(pool.total_emitted(), UNIT);
}

#[test]
fn full_exit_leaves_inert_record() {
    let (mut pool, clock) = deploy();
    deposit_both(&mut pool);
    clock.set(START + 4);

    let receipt = pool.claim_and_withdraw(&bob(), 10 * UNIT).expect("exit");
    assert_eq!(receipt.reward, 2 * UNIT);
    assert_eq!(receipt.staked, 0);

    clock.advance(100);
    assert_eq!(pool.claim(&bob()).expect("claim").reward, 0, "No stake, no reward");
    assert!(matches!(
        pool.withdraw(&bob(), 1),
        Err(ChefError::InsufficientBalance { staked: 0, requested: 1 })
    ));
    // Alice now holds the whole pool.
    assert_eq!(pool.claim(&alice()).expect("claim").reward, 102 * UNIT);
}

#[test]
fn event_log_tracks_operations() {
    let (mut pool, clock) = deploy();
    clock.set(START);
    pool.deposit(&bob(), UNIT).expect("deposit");
    clock.advance(1);
    pool.claim(&bob()).expect("claim");

    let events = pool.take_events();
    assert!(matches!(events[0], ChefEvent::Deposit { amount, .. } if amount == UNIT));
    assert!(matches!(events[1], ChefEvent::PoolUpdated { minted, .. } if minted == UNIT));
    assert!(matches!(events[2], ChefEvent::Claim { reward, .. } if reward == UNIT));
    assert_eq!(events.len(), 3);

    let json = serde_json::to_string(&events).expect("events serialize");
    assert!(json.contains("\"type\":\"deposit\""));
}
