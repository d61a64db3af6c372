//! Lock-guarded engine handle for concurrent callers.
//!
//! Operations on one pool are serialized behind a single
//! `tokio::sync::Mutex`. The `try_*` variants fail with
//! [`ChefError::Busy`] instead of waiting, which is how a caller observes
//! that another operation is mid-flight.

use std::sync::Arc;

use granary_ledger::{Clock, FungibleToken, MintableToken};
use granary_types::{AccountId, Amount};
use tokio::sync::{Mutex, MutexGuard};

use crate::engine::{Engine, Receipt};
use crate::pool::PoolState;
use crate::user::UserRecord;
use crate::{ChefError, Result};

/// Cloneable handle to an [`Engine`] shared across tasks.
pub struct SharedEngine<D, R, C> {
    inner: Arc<Mutex<Engine<D, R, C>>>,
}

impl<D, R, C> Clone for SharedEngine<D, R, C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<D, R, C> SharedEngine<D, R, C>
where
    D: FungibleToken,
    R: MintableToken,
    C: Clock,
{
    /// Wrap an engine.
    pub fn new(engine: Engine<D, R, C>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(engine)),
        }
    }

    /// Wait for the lock and hold it for direct access.
    pub async fn lock(&self) -> MutexGuard<'_, Engine<D, R, C>> {
        self.inner.lock().await
    }

    /// See [`Engine::update_pool`].
    pub async fn update_pool(&self) -> Result<Amount> {
        self.inner.lock().await.update_pool()
    }

    /// See [`Engine::deposit`].
    pub async fn deposit(&self, who: &AccountId, amount: Amount) -> Result<Receipt> {
        self.inner.lock().await.deposit(who, amount)
    }

    /// See [`Engine::withdraw`].
    pub async fn withdraw(&self, who: &AccountId, amount: Amount) -> Result<Receipt> {
        self.inner.lock().await.withdraw(who, amount)
    }

    /// See [`Engine::claim`].
    pub async fn claim(&self, who: &AccountId) -> Result<Receipt> {
        self.inner.lock().await.claim(who)
    }

    /// See [`Engine::claim_and_withdraw`].
    pub async fn claim_and_withdraw(&self, who: &AccountId, amount: Amount) -> Result<Receipt> {
        self.inner.lock().await.claim_and_withdraw(who, amount)
    }

    /// See [`Engine::user_info`].
    pub async fn user_info(&self, who: &AccountId) -> UserRecord {
        self.inner.lock().await.user_info(who)
    }

    /// Snapshot of the pool state.
    pub async fn pool(&self) -> PoolState {
        self.inner.lock().await.pool().clone()
    }

    /// Settle without waiting.
    ///
    /// # Errors
    ///
    /// - [`ChefError::Busy`] if another operation holds the lock
    pub fn try_update_pool(&self) -> Result<Amount> {
        self.try_lock()?.update_pool()
    }

    /// Deposit without waiting.
    ///
    /// # Errors
    ///
    /// - [`ChefError::Busy`] if another operation holds the lock
    pub fn try_deposit(&self, who: &AccountId, amount: Amount) -> Result<Receipt> {
        self.try_lock()?.deposit(who, amount)
    }

    /// Withdraw without waiting.
    ///
    /// # Errors
    ///
    /// - [`ChefError::Busy`] if another operation holds the lock
    pub fn try_withdraw(&self, who: &AccountId, amount: Amount) -> Result<Receipt> {
        self.try_lock()?.withdraw(who, amount)
    }

    /// Claim without waiting.
    ///
    /// # Errors
    ///
    /// - [`ChefError::Busy`] if another operation holds the lock
    pub fn try_claim(&self, who: &AccountId) -> Result<Receipt> {
        self.try_lock()?.claim(who)
    }

    fn try_lock(&self) -> Result<MutexGuard<'_, Engine<D, R, C>>> {
        self.inner.try_lock().map_err(|_| {
            tracing::debug!("pool lock contended");
            ChefError::Busy
        })
    }
}
