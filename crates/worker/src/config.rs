//! Worker configuration loaded from environment variables.

use std::time::Duration;

use sentinel_notify::CheckerConfig;

/// Daemon configuration.
///
/// All fields except the secrets have defaults suitable for local
/// development. In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// PostgreSQL connection URL.
    pub database_url: String,
    /// Discord bot token used for notification delivery.
    pub discord_token: String,
    /// Poll-loop tick cadence in seconds (default: `60`).
    pub tick_interval_secs: u64,
    /// Concurrently-checked accounts per tick (default: `8`).
    pub max_concurrent_accounts: usize,
    /// Per-account check budget in seconds (default: `30`).
    pub account_timeout_secs: u64,
    /// Whether to run the daily check-in task (default: `true`).
    pub daily_checkin_enabled: bool,
    /// Graceful shutdown grace period in seconds (default: `30`).
    pub shutdown_timeout_secs: u64,
}

impl WorkerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                   | Default  |
    /// |---------------------------|----------|
    /// | `DATABASE_URL`            | required |
    /// | `DISCORD_TOKEN`           | required |
    /// | `TICK_INTERVAL_SECS`      | `60`     |
    /// | `MAX_CONCURRENT_ACCOUNTS` | `8`      |
    /// | `ACCOUNT_TIMEOUT_SECS`    | `30`     |
    /// | `DAILY_CHECKIN_ENABLED`   | `true`   |
    /// | `SHUTDOWN_TIMEOUT_SECS`   | `30`     |
    pub fn from_env() -> Self {
        let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
        let discord_token = std::env::var("DISCORD_TOKEN").expect("DISCORD_TOKEN must be set");

        let tick_interval_secs: u64 = std::env::var("TICK_INTERVAL_SECS")
            .unwrap_or_else(|_| "60".into())
            .parse()
            .expect("TICK_INTERVAL_SECS must be a valid u64");

        let max_concurrent_accounts: usize = std::env::var("MAX_CONCURRENT_ACCOUNTS")
            .unwrap_or_else(|_| "8".into())
            .parse()
            .expect("MAX_CONCURRENT_ACCOUNTS must be a valid usize");

        let account_timeout_secs: u64 = std::env::var("ACCOUNT_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("ACCOUNT_TIMEOUT_SECS must be a valid u64");

        let daily_checkin_enabled: bool = std::env::var("DAILY_CHECKIN_ENABLED")
            .unwrap_or_else(|_| "true".into())
            .parse()
            .expect("DAILY_CHECKIN_ENABLED must be true or false");

        let shutdown_timeout_secs: u64 = std::env::var("SHUTDOWN_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("SHUTDOWN_TIMEOUT_SECS must be a valid u64");

        Self {
            database_url,
            discord_token,
            tick_interval_secs,
            max_concurrent_accounts,
            account_timeout_secs,
            daily_checkin_enabled,
            shutdown_timeout_secs,
        }
    }

    /// The checker tunables derived from this configuration.
    pub fn checker_config(&self) -> CheckerConfig {
        CheckerConfig {
            tick_interval: Duration::from_secs(self.tick_interval_secs),
            max_concurrent_accounts: self.max_concurrent_accounts,
            account_timeout: Duration::from_secs(self.account_timeout_secs),
        }
    }
}
