//! Repository for the `notify_configs` table.

use sqlx::PgPool;

use sentinel_core::types::{DbId, Timestamp};

use crate::models::notify_config::{ConfigStateUpdate, NotifyConfig, UpsertNotifySettings};

/// Column list for `notify_configs` SELECT queries.
const COLUMNS: &str = "\
    id, account_id, notify_type, enabled, threshold, \
    check_interval_minutes, notify_interval_minutes, \
    max_notify_count, current_notify_count, \
    last_check_at, last_notify_at, last_observed_value, \
    created_at, updated_at";

/// Provides query operations for notify configs.
pub struct NotifyConfigRepo;

impl NotifyConfigRepo {
    /// Get the config for a specific (account, notify type) pair.
    pub async fn get(
        pool: &PgPool,
        account_id: DbId,
        notify_type: &str,
    ) -> Result<Option<NotifyConfig>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM notify_configs \
             WHERE account_id = $1 AND notify_type = $2"
        );
        sqlx::query_as::<_, NotifyConfig>(&query)
            .bind(account_id)
            .bind(notify_type)
            .fetch_optional(pool)
            .await
    }

    /// List all configs for an account.
    pub async fn list_for_account(
        pool: &PgPool,
        account_id: DbId,
    ) -> Result<Vec<NotifyConfig>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM notify_configs \
             WHERE account_id = $1 ORDER BY notify_type"
        );
        sqlx::query_as::<_, NotifyConfig>(&query)
            .bind(account_id)
            .fetch_all(pool)
            .await
    }

    /// Insert or update a config from the settings surface.
    ///
    /// `check_interval_minutes` is fixed per type and only written on
    /// insert. Saving settings re-arms the notify counter; the scheduler
    /// owns the remaining dispatch state.
    pub async fn upsert_settings(
        pool: &PgPool,
        account_id: DbId,
        notify_type: &str,
        check_interval_minutes: i32,
        settings: &UpsertNotifySettings,
    ) -> Result<NotifyConfig, sqlx::Error> {
        let query = format!(
            "INSERT INTO notify_configs \
                (account_id, notify_type, enabled, threshold, \
                 check_interval_minutes, notify_interval_minutes, max_notify_count) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             ON CONFLICT (account_id, notify_type) DO UPDATE SET \
                enabled = EXCLUDED.enabled, \
                threshold = EXCLUDED.threshold, \
                notify_interval_minutes = EXCLUDED.notify_interval_minutes, \
                max_notify_count = EXCLUDED.max_notify_count, \
                current_notify_count = 0, \
                updated_at = NOW() \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, NotifyConfig>(&query)
            .bind(account_id)
            .bind(notify_type)
            .bind(settings.enabled)
            .bind(settings.threshold)
            .bind(check_interval_minutes)
            .bind(settings.notify_interval_minutes)
            .bind(settings.max_notify_count)
            .fetch_one(pool)
            .await
    }

    /// List enabled configs due for a check at `now`.
    ///
    /// A config is due when it has never been checked or its check interval
    /// has elapsed. Ordered by account so the scheduler's grouping is
    /// contiguous. Read-only: calling this twice without processing returns
    /// the same set.
    pub async fn list_due(pool: &PgPool, now: Timestamp) -> Result<Vec<NotifyConfig>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM notify_configs \
             WHERE enabled = true \
               AND (last_check_at IS NULL \
                    OR $1 - last_check_at >= make_interval(mins => check_interval_minutes)) \
             ORDER BY account_id, notify_type"
        );
        sqlx::query_as::<_, NotifyConfig>(&query)
            .bind(now)
            .fetch_all(pool)
            .await
    }

    /// Apply a batch of scheduler state updates for one account atomically.
    ///
    /// All rows land in a single transaction: a crash mid-tick leaves the
    /// account's configs either untouched (the tick redoes the work) or
    /// fully updated, never half-written.
    pub async fn apply_state_updates(
        pool: &PgPool,
        updates: &[ConfigStateUpdate],
    ) -> Result<(), sqlx::Error> {
        if updates.is_empty() {
            return Ok(());
        }

        let mut tx = pool.begin().await?;
        for update in updates {
            sqlx::query(
                "UPDATE notify_configs SET \
                    enabled = $2, \
                    current_notify_count = $3, \
                    last_check_at = $4, \
                    last_notify_at = $5, \
                    last_observed_value = $6, \
                    updated_at = NOW() \
                 WHERE id = $1",
            )
            .bind(update.config_id)
            .bind(update.enabled)
            .bind(update.current_notify_count)
            .bind(update.last_check_at)
            .bind(update.last_notify_at)
            .bind(update.last_observed_value)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await
    }

    /// Disable every config belonging to an account.
    ///
    /// Used when the account's credentials are rejected upstream. Returns
    /// the number of configs disabled.
    pub async fn disable_for_account(
        pool: &PgPool,
        account_id: DbId,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE notify_configs SET enabled = false, updated_at = NOW() \
             WHERE account_id = $1 AND enabled = true",
        )
        .bind(account_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }
}
