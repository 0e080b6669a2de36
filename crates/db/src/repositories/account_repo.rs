//! Repository for the `accounts` table.

use sqlx::PgPool;

use sentinel_core::types::{DbId, Timestamp};

use crate::models::account::{Account, CreateAccount};

/// Column list for `accounts` SELECT queries.
const COLUMNS: &str = "\
    id, uid, game, username, nickname, cookies, \
    discord_user_id, discord_channel_id, \
    daily_checkin, last_checkin_at, created_at, updated_at";

/// Provides query operations for game accounts.
pub struct AccountRepo;

impl AccountRepo {
    /// Get an account by primary key.
    pub async fn get(pool: &PgPool, id: DbId) -> Result<Option<Account>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM accounts WHERE id = $1");
        sqlx::query_as::<_, Account>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Get an account by its (uid, game) identity.
    pub async fn get_by_uid_game(
        pool: &PgPool,
        uid: i64,
        game: &str,
    ) -> Result<Option<Account>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM accounts WHERE uid = $1 AND game = $2");
        sqlx::query_as::<_, Account>(&query)
            .bind(uid)
            .bind(game)
            .fetch_optional(pool)
            .await
    }

    /// Batch-load accounts by primary key.
    pub async fn list_by_ids(pool: &PgPool, ids: &[DbId]) -> Result<Vec<Account>, sqlx::Error> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let query = format!("SELECT {COLUMNS} FROM accounts WHERE id = ANY($1) ORDER BY id");
        sqlx::query_as::<_, Account>(&query)
            .bind(ids)
            .fetch_all(pool)
            .await
    }

    /// Insert or update a linked account.
    ///
    /// Uses `INSERT ... ON CONFLICT (uid, game) DO UPDATE` so re-linking an
    /// existing account refreshes its credentials and dispatch target in one
    /// round-trip.
    pub async fn upsert(pool: &PgPool, account: &CreateAccount) -> Result<Account, sqlx::Error> {
        let query = format!(
            "INSERT INTO accounts \
                (uid, game, username, nickname, cookies, discord_user_id, discord_channel_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             ON CONFLICT (uid, game) DO UPDATE SET \
                username = EXCLUDED.username, \
                nickname = EXCLUDED.nickname, \
                cookies = EXCLUDED.cookies, \
                discord_user_id = EXCLUDED.discord_user_id, \
                discord_channel_id = EXCLUDED.discord_channel_id, \
                updated_at = NOW() \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Account>(&query)
            .bind(account.uid)
            .bind(&account.game)
            .bind(&account.username)
            .bind(&account.nickname)
            .bind(&account.cookies)
            .bind(account.discord_user_id)
            .bind(account.discord_channel_id)
            .fetch_one(pool)
            .await
    }

    /// Toggle the daily check-in opt-in.
    pub async fn set_daily_checkin(
        pool: &PgPool,
        id: DbId,
        enabled: bool,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE accounts SET daily_checkin = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(enabled)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// List accounts opted into daily check-in that have not claimed since
    /// the given cutoff (normally the start of the current UTC day).
    pub async fn list_checkin_due(
        pool: &PgPool,
        cutoff: Timestamp,
    ) -> Result<Vec<Account>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM accounts \
             WHERE daily_checkin = true \
               AND (last_checkin_at IS NULL OR last_checkin_at < $1) \
             ORDER BY id"
        );
        sqlx::query_as::<_, Account>(&query)
            .bind(cutoff)
            .fetch_all(pool)
            .await
    }

    /// Stamp a successful (or already-claimed) daily check-in.
    pub async fn mark_checkin(pool: &PgPool, id: DbId, at: Timestamp) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE accounts SET last_checkin_at = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(at)
            .execute(pool)
            .await?;
        Ok(())
    }
}
