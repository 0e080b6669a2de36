//! Notify config models and DTOs.

use serde::{Deserialize, Serialize};
use sentinel_core::backoff::DispatchState;
use sentinel_core::types::{DbId, Timestamp};
use sqlx::FromRow;

/// A row from the `notify_configs` table: one reminder configuration for
/// one (account, notify type) pair.
///
/// `notify_type` is stored as its string code; rows carrying a code this
/// build does not know are skipped by the scheduler, never dropped.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct NotifyConfig {
    pub id: DbId,
    pub account_id: DbId,
    pub notify_type: String,
    pub enabled: bool,
    pub threshold: Option<i32>,
    pub check_interval_minutes: i32,
    pub notify_interval_minutes: i32,
    pub max_notify_count: i32,
    pub current_notify_count: i32,
    pub last_check_at: Option<Timestamp>,
    pub last_notify_at: Option<Timestamp>,
    pub last_observed_value: Option<i32>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl NotifyConfig {
    /// The dispatch-gate view of this row.
    pub fn dispatch_state(&self) -> DispatchState {
        DispatchState {
            enabled: self.enabled,
            notify_interval_minutes: self.notify_interval_minutes,
            max_notify_count: self.max_notify_count,
            current_notify_count: self.current_notify_count,
            last_notify_at: self.last_notify_at,
        }
    }
}

/// DTO for the user-facing settings surface.
///
/// `check_interval_minutes` is not settable: it is fixed per notify type and
/// written from the type table on insert.
#[derive(Debug, Clone, Deserialize)]
pub struct UpsertNotifySettings {
    pub enabled: bool,
    pub threshold: Option<i32>,
    pub notify_interval_minutes: i32,
    pub max_notify_count: i32,
}

/// Absolute scheduler-side state for one config, written back after a check.
///
/// Carries full values rather than deltas so a replayed tick converges to
/// the same row instead of compounding.
#[derive(Debug, Clone, Copy)]
pub struct ConfigStateUpdate {
    pub config_id: DbId,
    pub enabled: bool,
    pub current_notify_count: i32,
    pub last_check_at: Timestamp,
    pub last_notify_at: Option<Timestamp>,
    pub last_observed_value: Option<i32>,
}

impl ConfigStateUpdate {
    /// An update that only advances the check timestamp, leaving dispatch
    /// state as the row had it. Used when a fetch failed transiently.
    pub fn touch_check(config: &NotifyConfig, now: Timestamp) -> Self {
        Self {
            config_id: config.id,
            enabled: config.enabled,
            current_notify_count: config.current_notify_count,
            last_check_at: now,
            last_notify_at: config.last_notify_at,
            last_observed_value: config.last_observed_value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn touch_check_preserves_dispatch_state() {
        let now = Utc::now();
        let config = NotifyConfig {
            id: 7,
            account_id: 1,
            notify_type: "resin".into(),
            enabled: true,
            threshold: Some(150),
            check_interval_minutes: 10,
            notify_interval_minutes: 30,
            max_notify_count: 3,
            current_notify_count: 2,
            last_check_at: None,
            last_notify_at: Some(now),
            last_observed_value: Some(155),
            created_at: now,
            updated_at: now,
        };

        let later = now + chrono::Duration::minutes(10);
        let update = ConfigStateUpdate::touch_check(&config, later);
        assert_eq!(update.config_id, 7);
        assert_eq!(update.current_notify_count, 2);
        assert_eq!(update.last_check_at, later);
        assert_eq!(update.last_notify_at, Some(now));
        assert_eq!(update.last_observed_value, Some(155));
        assert!(update.enabled);
    }
}
