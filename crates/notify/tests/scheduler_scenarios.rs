//! End-to-end scheduler scenarios against in-memory collaborators.
//!
//! Each test drives [`NotesChecker::run_tick`] with explicit instants so
//! cooldown and check-interval arithmetic is exact.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{Duration as Delta, TimeZone, Utc};

use sentinel_core::types::{DbId, Timestamp};
use sentinel_db::models::{Account, ConfigStateUpdate, NotifyConfig};
use sentinel_hoyo::notes::{ExpeditionStatus, GenshinExpedition, GenshinNotes};
use sentinel_hoyo::NotesSnapshot;
use sentinel_notify::delivery::{NotifySender, SendError};
use sentinel_notify::fetch::{FetchError, NotesFetcher};
use sentinel_notify::message::NotifyMessage;
use sentinel_notify::scheduler::{CheckerConfig, NotesChecker};
use sentinel_notify::store::ConfigStore;

// ---------------------------------------------------------------------------
// In-memory collaborators
// ---------------------------------------------------------------------------

#[derive(Default)]
struct MemStore {
    accounts: Mutex<HashMap<DbId, Account>>,
    configs: Mutex<HashMap<DbId, NotifyConfig>>,
}

impl MemStore {
    fn add_account(&self, account: Account) {
        self.accounts.lock().unwrap().insert(account.id, account);
    }

    fn add_config(&self, config: NotifyConfig) {
        self.configs.lock().unwrap().insert(config.id, config);
    }

    fn config(&self, id: DbId) -> NotifyConfig {
        self.configs.lock().unwrap()[&id].clone()
    }
}

#[async_trait]
impl ConfigStore for MemStore {
    async fn list_due(&self, now: Timestamp) -> Result<Vec<NotifyConfig>, sqlx::Error> {
        let configs = self.configs.lock().unwrap();
        let mut due: Vec<NotifyConfig> = configs
            .values()
            .filter(|c| {
                c.enabled
                    && match c.last_check_at {
                        None => true,
                        Some(last) => {
                            now - last >= Delta::minutes(i64::from(c.check_interval_minutes))
                        }
                    }
            })
            .cloned()
            .collect();
        due.sort_by(|a, b| (a.account_id, &a.notify_type).cmp(&(b.account_id, &b.notify_type)));
        Ok(due)
    }

    async fn accounts_by_ids(&self, ids: &[DbId]) -> Result<Vec<Account>, sqlx::Error> {
        let accounts = self.accounts.lock().unwrap();
        Ok(ids.iter().filter_map(|id| accounts.get(id).cloned()).collect())
    }

    async fn apply_updates(
        &self,
        _account_id: DbId,
        updates: &[ConfigStateUpdate],
    ) -> Result<(), sqlx::Error> {
        let mut configs = self.configs.lock().unwrap();
        for update in updates {
            let config = configs.get_mut(&update.config_id).unwrap();
            config.enabled = update.enabled;
            config.current_notify_count = update.current_notify_count;
            config.last_check_at = Some(update.last_check_at);
            config.last_notify_at = update.last_notify_at;
            config.last_observed_value = update.last_observed_value;
        }
        Ok(())
    }

    async fn disable_account_configs(&self, account_id: DbId) -> Result<u64, sqlx::Error> {
        let mut configs = self.configs.lock().unwrap();
        let mut disabled = 0;
        for config in configs.values_mut() {
            if config.account_id == account_id && config.enabled {
                config.enabled = false;
                disabled += 1;
            }
        }
        Ok(disabled)
    }
}

#[derive(Default)]
struct ScriptedFetcher {
    responses: Mutex<HashMap<DbId, Result<NotesSnapshot, FetchError>>>,
    hangs: Mutex<HashSet<DbId>>,
    calls: Mutex<HashMap<DbId, usize>>,
}

impl ScriptedFetcher {
    fn respond(&self, account_id: DbId, response: Result<NotesSnapshot, FetchError>) {
        self.responses.lock().unwrap().insert(account_id, response);
    }

    fn hang(&self, account_id: DbId) {
        self.hangs.lock().unwrap().insert(account_id);
    }

    fn calls_for(&self, account_id: DbId) -> usize {
        self.calls.lock().unwrap().get(&account_id).copied().unwrap_or(0)
    }
}

#[async_trait]
impl NotesFetcher for ScriptedFetcher {
    async fn fetch_notes(&self, account: &Account) -> Result<NotesSnapshot, FetchError> {
        *self.calls.lock().unwrap().entry(account.id).or_insert(0) += 1;
        if self.hangs.lock().unwrap().contains(&account.id) {
            tokio::time::sleep(Duration::from_secs(30)).await;
        }
        self.responses
            .lock()
            .unwrap()
            .get(&account.id)
            .cloned()
            .unwrap_or_else(|| Err(FetchError::Transient("unscripted account".into())))
    }
}

#[derive(Default)]
struct RecordingSender {
    sent: Mutex<Vec<(DbId, String)>>,
    failure: Mutex<Option<SendError>>,
}

impl RecordingSender {
    fn fail_with(&self, error: SendError) {
        *self.failure.lock().unwrap() = Some(error);
    }

    fn succeed(&self) {
        *self.failure.lock().unwrap() = None;
    }

    fn sent(&self) -> Vec<(DbId, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotifySender for RecordingSender {
    async fn send(&self, account: &Account, message: &NotifyMessage) -> Result<(), SendError> {
        if let Some(error) = self.failure.lock().unwrap().clone() {
            return Err(error);
        }
        self.sent
            .lock()
            .unwrap()
            .push((account.id, message.title.clone()));
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

fn at(minutes: i64) -> Timestamp {
    Utc.with_ymd_and_hms(2024, 5, 1, 6, 0, 0).unwrap() + Delta::minutes(minutes)
}

fn account(id: DbId) -> Account {
    Account {
        id,
        uid: 800000000 + id,
        game: "genshin".into(),
        username: format!("user{id}"),
        nickname: None,
        cookies: serde_json::json!({"ltoken_v2": "x"}),
        discord_user_id: 100 + id,
        discord_channel_id: 200 + id,
        daily_checkin: false,
        last_checkin_at: None,
        created_at: at(0),
        updated_at: at(0),
    }
}

fn resin_config(id: DbId, account_id: DbId, threshold: i32, max_notify_count: i32) -> NotifyConfig {
    NotifyConfig {
        id,
        account_id,
        notify_type: "resin".into(),
        enabled: true,
        threshold: Some(threshold),
        check_interval_minutes: 10,
        notify_interval_minutes: 30,
        max_notify_count,
        current_notify_count: 0,
        last_check_at: None,
        last_notify_at: None,
        last_observed_value: None,
        created_at: at(0),
        updated_at: at(0),
    }
}

fn expedition_config(id: DbId, account_id: DbId) -> NotifyConfig {
    NotifyConfig {
        threshold: None,
        notify_type: "gi_expedition".into(),
        check_interval_minutes: 30,
        ..resin_config(id, account_id, 0, 3)
    }
}

fn resin_snapshot(resin: i32) -> NotesSnapshot {
    NotesSnapshot::Genshin(GenshinNotes {
        current_resin: resin,
        max_resin: 160,
        current_home_coin: 0,
        max_home_coin: 2400,
        expeditions: Vec::new(),
        transformer: None,
    })
}

fn expedition_snapshot(finished: usize) -> NotesSnapshot {
    NotesSnapshot::Genshin(GenshinNotes {
        current_resin: 0,
        max_resin: 160,
        current_home_coin: 0,
        max_home_coin: 2400,
        expeditions: (0..finished)
            .map(|_| GenshinExpedition {
                status: ExpeditionStatus::Finished,
                remained_time: "0".into(),
            })
            .collect(),
        transformer: None,
    })
}

struct Harness {
    store: Arc<MemStore>,
    fetcher: Arc<ScriptedFetcher>,
    sender: Arc<RecordingSender>,
    checker: NotesChecker,
}

fn harness() -> Harness {
    let store = Arc::new(MemStore::default());
    let fetcher = Arc::new(ScriptedFetcher::default());
    let sender = Arc::new(RecordingSender::default());
    let checker = NotesChecker::new(
        store.clone(),
        fetcher.clone(),
        sender.clone(),
        CheckerConfig {
            tick_interval: Duration::from_secs(60),
            max_concurrent_accounts: 4,
            account_timeout: Duration::from_millis(250),
        },
    );
    Harness {
        store,
        fetcher,
        sender,
        checker,
    }
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

/// Resin at threshold 150: quiet below, fire at crossing, cooldown blocks
/// the next check, fire again after the cooldown.
#[tokio::test]
async fn resin_reminder_end_to_end() {
    let h = harness();
    h.store.add_account(account(1));
    h.store.add_config(resin_config(10, 1, 150, 3));

    // t=0: resin 140, below threshold.
    h.fetcher.respond(1, Ok(resin_snapshot(140)));
    let summary = h.checker.run_tick(at(0)).await.unwrap();
    assert_eq!(summary.accounts, 1);
    assert_eq!(summary.dispatched, 0);
    let config = h.store.config(10);
    assert_eq!(config.last_check_at, Some(at(0)));
    assert_eq!(config.last_observed_value, Some(140));

    // t=10: resin 155, first fire.
    h.fetcher.respond(1, Ok(resin_snapshot(155)));
    let summary = h.checker.run_tick(at(10)).await.unwrap();
    assert_eq!(summary.dispatched, 1);
    let config = h.store.config(10);
    assert_eq!(config.current_notify_count, 1);
    assert_eq!(config.last_notify_at, Some(at(10)));

    // t=20: resin 160, cooldown still active.
    h.fetcher.respond(1, Ok(resin_snapshot(160)));
    let summary = h.checker.run_tick(at(20)).await.unwrap();
    assert_eq!(summary.dispatched, 0);
    assert_eq!(h.store.config(10).current_notify_count, 1);

    // t=40: cooldown cleared, second fire.
    h.fetcher.respond(1, Ok(resin_snapshot(165)));
    let summary = h.checker.run_tick(at(40)).await.unwrap();
    assert_eq!(summary.dispatched, 1);
    let config = h.store.config(10);
    assert_eq!(config.current_notify_count, 2);
    assert_eq!(config.last_notify_at, Some(at(40)));

    assert_eq!(h.sender.sent().len(), 2);
}

/// Hitting the cap silences the reminder; the condition clearing re-arms it
/// and the next occurrence counts from one.
#[tokio::test]
async fn cap_then_reset_on_clear() {
    let h = harness();
    h.store.add_account(account(1));
    h.store.add_config(resin_config(10, 1, 150, 2));

    for (minute, resin) in [(0, 152), (30, 156), (60, 158), (75, 159)] {
        h.fetcher.respond(1, Ok(resin_snapshot(resin)));
        h.checker.run_tick(at(minute)).await.unwrap();
    }
    // Two fires, then the cap blocks further dispatch.
    assert_eq!(h.sender.sent().len(), 2);
    assert_eq!(h.store.config(10).current_notify_count, 2);

    // Resource spent: condition clears, cap re-arms.
    h.fetcher.respond(1, Ok(resin_snapshot(40)));
    h.checker.run_tick(at(90)).await.unwrap();
    assert_eq!(h.store.config(10).current_notify_count, 0);

    // Refilled past the threshold: fires again, counting from one.
    h.fetcher.respond(1, Ok(resin_snapshot(151)));
    h.checker.run_tick(at(100)).await.unwrap();
    assert_eq!(h.sender.sent().len(), 3);
    assert_eq!(h.store.config(10).current_notify_count, 1);
}

/// The count never exceeds the cap no matter how long the condition holds.
#[tokio::test]
async fn count_never_exceeds_cap() {
    let h = harness();
    h.store.add_account(account(1));
    h.store.add_config(resin_config(10, 1, 150, 3));
    h.fetcher.respond(1, Ok(resin_snapshot(160)));

    for minute in (0..600).step_by(10) {
        h.checker.run_tick(at(minute)).await.unwrap();
        let config = h.store.config(10);
        assert!(config.current_notify_count <= config.max_notify_count);
    }
    assert_eq!(h.sender.sent().len(), 3);
}

/// Dead credentials disable all of that account's reminders; a healthy
/// account in the same tick is unaffected.
#[tokio::test]
async fn auth_failure_is_contained_to_one_account() {
    let h = harness();
    h.store.add_account(account(1));
    h.store.add_config(resin_config(10, 1, 150, 3));
    h.store.add_config(expedition_config(11, 1));
    h.store.add_account(account(2));
    h.store.add_config(resin_config(20, 2, 150, 3));

    h.fetcher
        .respond(1, Err(FetchError::Auth("retcode -100".into())));
    h.fetcher.respond(2, Ok(resin_snapshot(155)));

    let summary = h.checker.run_tick(at(0)).await.unwrap();
    assert_eq!(summary.accounts, 2);
    assert_eq!(summary.auth_failures, 1);
    assert_eq!(summary.dispatched, 1);

    assert!(!h.store.config(10).enabled);
    assert!(!h.store.config(11).enabled);
    assert!(h.store.config(20).enabled);
    assert_eq!(h.sender.sent(), vec![(2, "Resin Reminder".to_string())]);
}

/// A transient fetch failure advances the check stamp so the account is
/// retried at its configured cadence, not every tick.
#[tokio::test]
async fn transient_fetch_advances_check_stamp() {
    let h = harness();
    h.store.add_account(account(1));
    h.store.add_config(resin_config(10, 1, 150, 3));
    h.fetcher
        .respond(1, Err(FetchError::Transient("connection reset".into())));

    let summary = h.checker.run_tick(at(0)).await.unwrap();
    assert_eq!(summary.transient_failures, 1);
    assert_eq!(summary.dispatched, 0);
    assert_eq!(h.store.config(10).last_check_at, Some(at(0)));

    // Five minutes later the config is not due again yet.
    let summary = h.checker.run_tick(at(5)).await.unwrap();
    assert_eq!(summary.accounts, 0);
    assert_eq!(h.fetcher.calls_for(1), 1);
}

/// A gone delivery target disables the affected config only.
#[tokio::test]
async fn permanent_send_failure_disables_single_config() {
    let h = harness();
    h.store.add_account(account(1));
    h.store.add_config(resin_config(10, 1, 150, 3));
    h.store.add_config(expedition_config(11, 1));
    h.fetcher.respond(1, Ok(resin_snapshot(155)));
    h.sender
        .fail_with(SendError::Permanent("Discord returned 404".into()));

    let summary = h.checker.run_tick(at(0)).await.unwrap();
    assert_eq!(summary.dispatched, 0);

    assert!(!h.store.config(10).enabled);
    // The expedition reminder did not fire and stays enabled.
    assert!(h.store.config(11).enabled);
}

/// A transient delivery failure leaves dispatch state untouched so the next
/// due tick retries.
#[tokio::test]
async fn transient_send_failure_retries_next_tick() {
    let h = harness();
    h.store.add_account(account(1));
    h.store.add_config(resin_config(10, 1, 150, 3));
    h.fetcher.respond(1, Ok(resin_snapshot(155)));

    h.sender
        .fail_with(SendError::Transient("Discord returned 503".into()));
    h.checker.run_tick(at(0)).await.unwrap();
    let config = h.store.config(10);
    assert_eq!(config.current_notify_count, 0);
    assert_eq!(config.last_notify_at, None);
    assert!(config.enabled);

    h.sender.succeed();
    let summary = h.checker.run_tick(at(10)).await.unwrap();
    assert_eq!(summary.dispatched, 1);
    assert_eq!(h.store.config(10).current_notify_count, 1);
}

/// Completion reminders are edge-triggered on newly-finished tasks and
/// never fire from an unknown prior observation.
#[tokio::test]
async fn expedition_edge_triggering() {
    let h = harness();
    h.store.add_account(account(1));
    h.store.add_config(expedition_config(11, 1));

    // First observation: two already finished, but no prior to compare.
    h.fetcher.respond(1, Ok(expedition_snapshot(2)));
    h.checker.run_tick(at(0)).await.unwrap();
    assert_eq!(h.sender.sent().len(), 0);
    assert_eq!(h.store.config(11).last_observed_value, Some(2));

    // A third finishes: that's an edge.
    h.fetcher.respond(1, Ok(expedition_snapshot(3)));
    h.checker.run_tick(at(30)).await.unwrap();
    assert_eq!(h.sender.sent().len(), 1);

    // Level holds: no re-fire even with the cooldown elapsed.
    h.checker.run_tick(at(60)).await.unwrap();
    assert_eq!(h.sender.sent().len(), 1);

    // All collected: the cap re-arms.
    h.fetcher.respond(1, Ok(expedition_snapshot(0)));
    h.checker.run_tick(at(90)).await.unwrap();
    assert_eq!(h.store.config(11).current_notify_count, 0);
}

/// One stuck account is abandoned at its timeout without blocking others.
#[tokio::test]
async fn stuck_account_does_not_block_siblings() {
    let h = harness();
    h.store.add_account(account(1));
    h.store.add_config(resin_config(10, 1, 150, 3));
    h.store.add_account(account(2));
    h.store.add_config(resin_config(20, 2, 150, 3));

    h.fetcher.hang(1);
    h.fetcher.respond(2, Ok(resin_snapshot(155)));

    let summary = h.checker.run_tick(at(0)).await.unwrap();
    assert_eq!(summary.accounts, 2);
    assert_eq!(summary.transient_failures, 1);
    assert_eq!(summary.dispatched, 1);
    assert_eq!(h.sender.sent(), vec![(2, "Resin Reminder".to_string())]);
}

/// Several due types on one account share a single notes fetch.
#[tokio::test]
async fn one_fetch_per_account_per_tick() {
    let h = harness();
    h.store.add_account(account(1));
    h.store.add_config(resin_config(10, 1, 150, 3));
    h.store.add_config(expedition_config(11, 1));
    h.fetcher.respond(1, Ok(resin_snapshot(100)));

    h.checker.run_tick(at(0)).await.unwrap();
    assert_eq!(h.fetcher.calls_for(1), 1);
}

/// The due-scan is read-only: two scans without processing agree.
#[tokio::test]
async fn list_due_is_idempotent() {
    let h = harness();
    h.store.add_account(account(1));
    h.store.add_config(resin_config(10, 1, 150, 3));
    h.store.add_config(expedition_config(11, 1));

    let first: Vec<DbId> = h
        .store
        .list_due(at(0))
        .await
        .unwrap()
        .iter()
        .map(|c| c.id)
        .collect();
    let second: Vec<DbId> = h
        .store
        .list_due(at(0))
        .await
        .unwrap()
        .iter()
        .map(|c| c.id)
        .collect();
    assert_eq!(first, second);
    assert_eq!(first, vec![11, 10]);
}
