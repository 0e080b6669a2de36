//! Daily check-in background task.
//!
//! [`DailyCheckin`] periodically claims the Hoyolab daily sign-in reward
//! for every opted-in account that has not claimed since the start of the
//! current UTC day. Polling instead of sleeping until midnight means newly
//! opted-in accounts are claimed on the next poll, and a restart shortly
//! after midnight does not lose the day.

use std::time::Duration;

use chrono::{NaiveTime, Utc};
use tokio_util::sync::CancellationToken;

use sentinel_core::game::Game;
use sentinel_db::repositories::AccountRepo;
use sentinel_db::DbPool;
use sentinel_hoyo::{CheckinOutcome, HoyoApi, HoyoError};

/// How often the task looks for unclaimed accounts.
const CHECKIN_POLL_INTERVAL: Duration = Duration::from_secs(600);

/// Background service claiming daily sign-in rewards.
pub struct DailyCheckin {
    pool: DbPool,
    api: HoyoApi,
}

impl DailyCheckin {
    /// Create a new task with the given pool and API client.
    pub fn new(pool: DbPool, api: HoyoApi) -> Self {
        Self { pool, api }
    }

    /// Run the claim loop until `cancel` is triggered.
    pub async fn run(&self, cancel: CancellationToken) {
        tracing::info!(
            poll_secs = CHECKIN_POLL_INTERVAL.as_secs(),
            "Daily check-in task started"
        );

        let mut interval = tokio::time::interval(CHECKIN_POLL_INTERVAL);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Daily check-in task stopping");
                    break;
                }
                _ = interval.tick() => {
                    if let Err(e) = self.claim_due().await {
                        tracing::error!(error = %e, "Failed to scan check-in accounts");
                    }
                }
            }
        }
    }

    /// Claim for every account that has not checked in today.
    async fn claim_due(&self) -> Result<(), sqlx::Error> {
        let today = Utc::now()
            .date_naive()
            .and_time(NaiveTime::MIN)
            .and_utc();
        let due = AccountRepo::list_checkin_due(&self.pool, today).await?;

        for account in &due {
            let game: Game = match account.game.parse() {
                Ok(game) => game,
                Err(e) => {
                    tracing::warn!(account_id = account.id, error = %e, "Skipping check-in");
                    continue;
                }
            };

            match self.api.claim_daily(game, &account.cookies).await {
                Ok(outcome) => {
                    if outcome == CheckinOutcome::Claimed {
                        tracing::info!(
                            account_id = account.id,
                            uid = account.uid,
                            "Daily reward claimed"
                        );
                    }
                    AccountRepo::mark_checkin(&self.pool, account.id, Utc::now()).await?;
                }
                Err(HoyoError::InvalidCookies { retcode }) => {
                    // The notes checker owns the disable policy for dead
                    // credentials; here we only stop hammering the endpoint
                    // for the rest of the day.
                    tracing::warn!(
                        account_id = account.id,
                        retcode,
                        "Check-in rejected, credentials invalid"
                    );
                    AccountRepo::mark_checkin(&self.pool, account.id, Utc::now()).await?;
                }
                Err(e) => {
                    tracing::warn!(
                        account_id = account.id,
                        error = %e,
                        "Check-in failed, will retry next poll"
                    );
                }
            }
        }

        if !due.is_empty() {
            tracing::info!(count = due.len(), "Processed daily check-ins");
        }
        Ok(())
    }
}
