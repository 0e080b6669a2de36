//! The periodic notes checker.
//!
//! [`NotesChecker`] drives everything: on a fixed tick it scans for due
//! configs, fetches each owning account's notes at most once, runs the
//! evaluator and the dispatch gate, sends notifications, and writes the
//! resulting state back atomically per account. Failures are contained at
//! the account unit; nothing an account does can abort the tick for its
//! siblings.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures::stream::{self, StreamExt};
use tokio_util::sync::CancellationToken;

use sentinel_core::backoff::{record_dispatch, reset_on_clear, should_dispatch};
use sentinel_core::evaluate::{evaluate, Observation};
use sentinel_core::notify::NotifyType;
use sentinel_core::types::{DbId, Timestamp};
use sentinel_db::models::{Account, ConfigStateUpdate, NotifyConfig};
use sentinel_hoyo::NotesSnapshot;

use crate::delivery::{NotifySender, SendError};
use crate::fetch::{FetchError, NotesFetcher};
use crate::message;
use crate::store::ConfigStore;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Tunables for the poll loop.
#[derive(Debug, Clone)]
pub struct CheckerConfig {
    /// Wall-clock tick cadence. One minute matches the smallest
    /// per-type check interval.
    pub tick_interval: Duration,
    /// Upper bound on concurrently-checked accounts per tick.
    pub max_concurrent_accounts: usize,
    /// Budget for one account's fetch-evaluate-dispatch unit. A stuck
    /// account is abandoned at this deadline and retried next due tick.
    pub account_timeout: Duration,
}

impl Default for CheckerConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_secs(60),
            max_concurrent_accounts: 8,
            account_timeout: Duration::from_secs(30),
        }
    }
}

/// What one tick did, for the summary log line.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TickSummary {
    /// Account units processed.
    pub accounts: usize,
    /// Notifications successfully dispatched.
    pub dispatched: usize,
    /// Accounts whose credentials were rejected (configs disabled).
    pub auth_failures: usize,
    /// Accounts skipped on a transient failure or timeout.
    pub transient_failures: usize,
}

/// Outcome of one account's unit of work.
#[derive(Debug, Default, Clone, Copy)]
struct AccountOutcome {
    dispatched: usize,
    auth_failed: bool,
    transient: bool,
}

// ---------------------------------------------------------------------------
// NotesChecker
// ---------------------------------------------------------------------------

/// The notification engine's periodic driver.
///
/// Holds only its three collaborators and its tunables; all per-tick state
/// is re-read from the store, so consecutive ticks cannot drift apart.
pub struct NotesChecker {
    store: Arc<dyn ConfigStore>,
    fetcher: Arc<dyn NotesFetcher>,
    sender: Arc<dyn NotifySender>,
    config: CheckerConfig,
}

impl NotesChecker {
    /// Create a checker from its collaborators.
    pub fn new(
        store: Arc<dyn ConfigStore>,
        fetcher: Arc<dyn NotesFetcher>,
        sender: Arc<dyn NotifySender>,
        config: CheckerConfig,
    ) -> Self {
        Self {
            store,
            fetcher,
            sender,
            config,
        }
    }

    /// Run the poll loop until `cancel` is triggered.
    pub async fn run(&self, cancel: CancellationToken) {
        tracing::info!(
            tick_secs = self.config.tick_interval.as_secs(),
            max_concurrent = self.config.max_concurrent_accounts,
            "Notes checker started"
        );

        let mut interval = tokio::time::interval(self.config.tick_interval);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Notes checker stopping");
                    break;
                }
                _ = interval.tick() => {
                    match self.run_tick(Utc::now()).await {
                        Ok(summary) if summary.accounts > 0 => {
                            tracing::info!(
                                accounts = summary.accounts,
                                dispatched = summary.dispatched,
                                auth_failures = summary.auth_failures,
                                transient_failures = summary.transient_failures,
                                "Tick complete"
                            );
                        }
                        Ok(_) => tracing::debug!("Tick complete, nothing due"),
                        Err(e) => tracing::error!(error = %e, "Tick failed to scan due configs"),
                    }
                }
            }
        }
    }

    /// Execute one tick at the given instant.
    ///
    /// Only the initial due-scan and account load can fail as a whole;
    /// everything after is contained per account.
    pub async fn run_tick(&self, now: Timestamp) -> Result<TickSummary, sqlx::Error> {
        let due = self.store.list_due(now).await?;
        if due.is_empty() {
            return Ok(TickSummary::default());
        }

        // One fetch per account even when several types are due.
        let mut groups: BTreeMap<DbId, Vec<NotifyConfig>> = BTreeMap::new();
        for config in due {
            groups.entry(config.account_id).or_default().push(config);
        }

        let ids: Vec<DbId> = groups.keys().copied().collect();
        let accounts: HashMap<DbId, Account> = self
            .store
            .accounts_by_ids(&ids)
            .await?
            .into_iter()
            .map(|a| (a.id, a))
            .collect();

        let units = groups.into_iter().filter_map(|(account_id, configs)| {
            match accounts.get(&account_id) {
                Some(account) => Some((account.clone(), configs)),
                None => {
                    tracing::warn!(account_id, "Due configs reference a missing account");
                    None
                }
            }
        });

        let outcomes: Vec<AccountOutcome> = stream::iter(units)
            .map(|(account, configs)| async move {
                let account_id = account.id;
                match tokio::time::timeout(
                    self.config.account_timeout,
                    self.check_account(&account, &configs, now),
                )
                .await
                {
                    Ok(outcome) => outcome,
                    Err(_) => {
                        tracing::warn!(account_id, "Account check timed out, abandoning");
                        AccountOutcome {
                            transient: true,
                            ..Default::default()
                        }
                    }
                }
            })
            .buffer_unordered(self.config.max_concurrent_accounts)
            .collect()
            .await;

        let mut summary = TickSummary {
            accounts: outcomes.len(),
            ..Default::default()
        };
        for outcome in outcomes {
            summary.dispatched += outcome.dispatched;
            summary.auth_failures += usize::from(outcome.auth_failed);
            summary.transient_failures += usize::from(outcome.transient);
        }
        Ok(summary)
    }

    /// Fetch one account's notes and process all of its due configs.
    async fn check_account(
        &self,
        account: &Account,
        configs: &[NotifyConfig],
        now: Timestamp,
    ) -> AccountOutcome {
        let snapshot = match self.fetcher.fetch_notes(account).await {
            Ok(snapshot) => snapshot,
            Err(FetchError::Auth(reason)) => {
                tracing::warn!(
                    account_id = account.id,
                    uid = account.uid,
                    reason = %reason,
                    "Credentials rejected, disabling account reminders"
                );
                match self.store.disable_account_configs(account.id).await {
                    Ok(disabled) => {
                        tracing::info!(account_id = account.id, disabled, "Reminders disabled")
                    }
                    Err(e) => {
                        tracing::error!(account_id = account.id, error = %e, "Failed to disable reminders")
                    }
                }
                return AccountOutcome {
                    auth_failed: true,
                    ..Default::default()
                };
            }
            Err(FetchError::Transient(reason)) => {
                tracing::warn!(
                    account_id = account.id,
                    reason = %reason,
                    "Notes fetch failed, skipping account this tick"
                );
                // Advance the check stamp anyway so a degraded upstream is
                // retried at the configured cadence, not every tick.
                let updates: Vec<ConfigStateUpdate> = configs
                    .iter()
                    .map(|c| ConfigStateUpdate::touch_check(c, now))
                    .collect();
                if let Err(e) = self.store.apply_updates(account.id, &updates).await {
                    tracing::error!(account_id = account.id, error = %e, "Failed to stamp check time");
                }
                return AccountOutcome {
                    transient: true,
                    ..Default::default()
                };
            }
        };

        let mut updates = Vec::with_capacity(configs.len());
        let mut outcome = AccountOutcome::default();
        for config in configs {
            let (update, dispatched) = self.check_config(account, &snapshot, config, now).await;
            updates.push(update);
            outcome.dispatched += usize::from(dispatched);
        }

        // All of this account's mutations land in one transaction.
        if let Err(e) = self.store.apply_updates(account.id, &updates).await {
            tracing::error!(account_id = account.id, error = %e, "Failed to write config state");
            outcome.transient = true;
        }
        outcome
    }

    /// Evaluate and possibly dispatch a single config.
    ///
    /// Always returns a state update, at minimum the advanced check stamp.
    async fn check_config(
        &self,
        account: &Account,
        snapshot: &NotesSnapshot,
        config: &NotifyConfig,
        now: Timestamp,
    ) -> (ConfigStateUpdate, bool) {
        let ty: NotifyType = match config.notify_type.parse() {
            Ok(ty) => ty,
            Err(e) => {
                tracing::warn!(config_id = config.id, error = %e, "Skipping unknown notify type");
                return (ConfigStateUpdate::touch_check(config, now), false);
            }
        };

        let Some(current) = snapshot.observed_value(ty) else {
            tracing::warn!(
                config_id = config.id,
                notify_type = %ty,
                "Snapshot has no value for this reminder, skipping"
            );
            return (ConfigStateUpdate::touch_check(config, now), false);
        };

        let observation = Observation {
            current,
            prior: config.last_observed_value,
            threshold: config.threshold,
        };
        let decision = match evaluate(ty, observation) {
            Ok(decision) => decision,
            Err(e) => {
                tracing::warn!(config_id = config.id, error = %e, "Unevaluable config, skipping");
                return (ConfigStateUpdate::touch_check(config, now), false);
            }
        };

        let mut state = config.dispatch_state();
        if !decision.condition_active && state.current_notify_count > 0 {
            tracing::debug!(
                config_id = config.id,
                notify_type = %ty,
                "Condition cleared, re-arming notify cap"
            );
            reset_on_clear(&mut state);
        }

        let mut enabled = config.enabled;
        let mut dispatched = false;
        if decision.should_notify && should_dispatch(&state, now) {
            if let Some(reason) = decision.reason {
                let message = message::build(ty, account, reason);
                match self.sender.send(account, &message).await {
                    Ok(()) => {
                        record_dispatch(&mut state, now);
                        dispatched = true;
                        tracing::info!(
                            account_id = account.id,
                            notify_type = %ty,
                            count = state.current_notify_count,
                            "Notification dispatched"
                        );
                    }
                    Err(SendError::Transient(reason)) => {
                        // Leave dispatch state untouched; the next due tick
                        // retries with fresh data.
                        tracing::warn!(
                            account_id = account.id,
                            notify_type = %ty,
                            reason = %reason,
                            "Delivery failed transiently, will retry next tick"
                        );
                    }
                    Err(SendError::Permanent(reason)) => {
                        tracing::warn!(
                            account_id = account.id,
                            notify_type = %ty,
                            reason = %reason,
                            "Delivery target gone, disabling this reminder"
                        );
                        enabled = false;
                    }
                }
            }
        }

        (
            ConfigStateUpdate {
                config_id: config.id,
                enabled,
                current_notify_count: state.current_notify_count,
                last_check_at: now,
                last_notify_at: state.last_notify_at,
                last_observed_value: Some(current),
            },
            dispatched,
        )
    }
}
