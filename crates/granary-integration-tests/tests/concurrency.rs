//! Integration test: many tasks sharing one pool.
//!
//! Operations on a `SharedEngine` are serialized by its lock, so the
//! outcome must equal some sequential interleaving: stakes add up,
//! rewards are conserved and a held lock turns `try_*` calls into
//! `Busy`.

use std::collections::BTreeSet;

use granary_chef::{ChefError, Engine, PoolConfig, SharedEngine};
use granary_ledger::{FungibleToken, ManualClock, MemoryToken, MintableToken};
use granary_types::{AccountId, Amount, Timestamp, UNIT};

const START: Timestamp = 500;
const TASKS: usize = 16;

type Shared = SharedEngine<MemoryToken, MemoryToken, ManualClock>;

fn staker(i: usize) -> AccountId {
    AccountId::from_label(&format!("task-{i}"))
}

fn deploy() -> (Shared, ManualClock) {
    let config = PoolConfig::new(UNIT, START);
    let clock = ManualClock::new(START);
    let mut lp = MemoryToken::new("LP");
    for i in 0..TASKS {
        let who = staker(i);
        lp.mint(&who, &who, 100 * UNIT).expect("fund");
        lp.approve(&who, &config.custody, Amount::MAX);
    }
    let reward = MemoryToken::with_minter("RWD", config.custody);
    let engine = Engine::new(config, lp, reward, clock.clone()).expect("deploy");
    (SharedEngine::new(engine), clock)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_deposits_sum_up() {
    let (pool, _clock) = deploy();

    let mut handles = Vec::new();
    for i in 0..TASKS {
        let pool = pool.clone();
        handles.push(tokio::spawn(async move {
            let who = staker(i);
            for _ in 0..4 {
                pool.deposit(&who, UNIT).await?;
            }
            Ok::<_, ChefError>(())
        }));
    }
    for handle in handles {
        handle
            .await
            .expect("Task should not panic")
            .expect("Deposits should succeed");
    }

    let state = pool.pool().await;
    assert_eq!(state.total_staked, (TASKS as Amount) * 4 * UNIT);
    for i in 0..TASKS {
        assert_eq!(pool.user_info(&staker(i)).await.amount, 4 * UNIT);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_claims_pay_each_share_once() {
    let (pool, clock) = deploy();
    for i in 0..TASKS {
        pool.deposit(&staker(i), UNIT).await.expect("deposit");
    }

    // =========================================================
    // 16 seconds at 1 token/s over 16 equal stakes: 1 token each
    // =========================================================
    clock.advance(TASKS as u64);

    let mut handles = Vec::new();
    for i in 0..TASKS {
        let pool = pool.clone();
        handles.push(tokio::spawn(async move {
            let who = staker(i);
            let first = pool.claim(&who).await?.reward;
            let second = pool.claim(&who).await?.reward;
            Ok::<_, ChefError>((first, second))
        }));
    }

    let mut total = 0;
    for handle in handles {
        let (first, second) = handle
            .await
            .expect("Task should not panic")
            .expect("Claims should succeed");
        assert_eq!(first, UNIT, "Each staker earns one token");
        assert_eq!(second, 0, "Second claim at the same instant pays nothing");
        total += first;
    }

    let engine = pool.lock().await;
    assert_eq!(total, engine.total_emitted());
    assert_eq!(engine.total_paid(), engine.total_emitted());
    assert_eq!(engine.reward_token().balance_of(engine.custody()), 0);
}

#[tokio::test]
async fn held_lock_reports_busy() {
    let (pool, _clock) = deploy();
    let who = staker(0);

    let guard = pool.lock().await;
    assert!(matches!(pool.try_deposit(&who, UNIT), Err(ChefError::Busy)));
    assert!(matches!(pool.try_withdraw(&who, UNIT), Err(ChefError::Busy)));
    assert!(matches!(pool.try_claim(&who), Err(ChefError::Busy)));
    assert!(matches!(pool.try_update_pool(), Err(ChefError::Busy)));
    drop(guard);

    let receipt = pool.try_deposit(&who, UNIT).expect("Lock is free again");
    assert_eq!(receipt.staked, UNIT);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn mixed_operations_conserve_rewards() {
    let (pool, clock) = deploy();
    for i in 0..TASKS {
        pool.deposit(&staker(i), 10 * UNIT).await.expect("deposit");
    }

    let mut handles = Vec::new();
    for i in 0..TASKS {
        let pool = pool.clone();
        let clock = clock.clone();
        handles.push(tokio::spawn(async move {
            let who = staker(i);
            clock.advance(1);
            match i % 3 {
                0 => pool.claim(&who).await.map(|_| ()),
                1 => pool.withdraw(&who, 5 * UNIT).await.map(|_| ()),
                _ => pool.claim_and_withdraw(&who, 10 * UNIT).await.map(|_| ()),
            }
        }));
    }
    for handle in handles {
        handle
            .await
            .expect("Task should not panic")
            .expect("Operation should succeed");
    }

    let engine = pool.lock().await;
    let stakers: BTreeSet<_> = engine.stakers().map(|(who, _)| *who).collect();
    assert_eq!(stakers.len(), TASKS);
    let sum: Amount = engine.stakers().map(|(_, r)| r.amount).sum();
    assert_eq!(engine.pool().total_staked, sum);
    assert_eq!(
        engine.total_paid() + engine.reward_token().balance_of(engine.custody()),
        engine.total_emitted(),
        "Rewards must be conserved"
    );
}
