use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sentinel_hoyo::HoyoApi;
use sentinel_notify::{
    DailyCheckin, DiscordDelivery, HoyoNotesFetcher, NotesChecker, PgConfigStore,
};

mod config;

use config::WorkerConfig;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sentinel_worker=debug,sentinel_notify=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = WorkerConfig::from_env();
    tracing::info!(
        tick_secs = config.tick_interval_secs,
        max_concurrent = config.max_concurrent_accounts,
        "Loaded worker configuration"
    );

    // --- Database ---
    let pool = sentinel_db::create_pool(&config.database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    sentinel_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    tracing::info!("Database health check passed");

    sentinel_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    // --- Collaborators ---
    let store = Arc::new(PgConfigStore::new(pool.clone()));
    let fetcher = Arc::new(HoyoNotesFetcher::new(
        HoyoApi::new().expect("Failed to build Hoyolab API client"),
    ));
    let sender = Arc::new(
        DiscordDelivery::new(config.discord_token.clone())
            .expect("Failed to build Discord delivery client"),
    );

    // --- Background services ---
    let cancel = CancellationToken::new();
    let mut handles = Vec::new();

    let checker = NotesChecker::new(store, fetcher, sender, config.checker_config());
    let checker_cancel = cancel.clone();
    handles.push(tokio::spawn(async move {
        checker.run(checker_cancel).await;
    }));

    if config.daily_checkin_enabled {
        let checkin = DailyCheckin::new(
            pool.clone(),
            HoyoApi::new().expect("Failed to build Hoyolab API client"),
        );
        let checkin_cancel = cancel.clone();
        handles.push(tokio::spawn(async move {
            checkin.run(checkin_cancel).await;
        }));
    }

    tracing::info!("Worker started");

    // --- Graceful shutdown ---
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to listen for shutdown signal");
    tracing::info!("Shutdown signal received, draining");
    cancel.cancel();

    let drain = async {
        for handle in handles {
            let _ = handle.await;
        }
    };
    if tokio::time::timeout(Duration::from_secs(config.shutdown_timeout_secs), drain)
        .await
        .is_err()
    {
        tracing::warn!("Shutdown grace period elapsed, abandoning in-flight work");
    }

    pool.close().await;
    tracing::info!("Worker stopped");
}
