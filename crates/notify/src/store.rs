//! Config-store collaborator seam.
//!
//! The scheduler only ever talks to a [`ConfigStore`]; [`PgConfigStore`] is
//! the production implementation over the repository layer. Keeping the
//! seam a trait lets the scenario tests drive the scheduler against an
//! in-memory store.

use async_trait::async_trait;

use sentinel_core::types::{DbId, Timestamp};
use sentinel_db::models::{Account, ConfigStateUpdate, NotifyConfig};
use sentinel_db::repositories::{AccountRepo, NotifyConfigRepo};
use sentinel_db::DbPool;

/// Persistence operations the scheduler needs.
#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// Enabled configs due for a check at `now`. Read-only and idempotent
    /// between ticks.
    async fn list_due(&self, now: Timestamp) -> Result<Vec<NotifyConfig>, sqlx::Error>;

    /// Batch-load the accounts owning a set of configs.
    async fn accounts_by_ids(&self, ids: &[DbId]) -> Result<Vec<Account>, sqlx::Error>;

    /// Atomically apply one account's post-check state updates.
    async fn apply_updates(
        &self,
        account_id: DbId,
        updates: &[ConfigStateUpdate],
    ) -> Result<(), sqlx::Error>;

    /// Disable every config of an account whose credentials are dead.
    /// Returns the number of configs disabled.
    async fn disable_account_configs(&self, account_id: DbId) -> Result<u64, sqlx::Error>;
}

/// Production store over the PostgreSQL repositories.
pub struct PgConfigStore {
    pool: DbPool,
}

impl PgConfigStore {
    /// Create a store sharing the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ConfigStore for PgConfigStore {
    async fn list_due(&self, now: Timestamp) -> Result<Vec<NotifyConfig>, sqlx::Error> {
        NotifyConfigRepo::list_due(&self.pool, now).await
    }

    async fn accounts_by_ids(&self, ids: &[DbId]) -> Result<Vec<Account>, sqlx::Error> {
        AccountRepo::list_by_ids(&self.pool, ids).await
    }

    async fn apply_updates(
        &self,
        _account_id: DbId,
        updates: &[ConfigStateUpdate],
    ) -> Result<(), sqlx::Error> {
        NotifyConfigRepo::apply_state_updates(&self.pool, updates).await
    }

    async fn disable_account_configs(&self, account_id: DbId) -> Result<u64, sqlx::Error> {
        NotifyConfigRepo::disable_for_account(&self.pool, account_id).await
    }
}
