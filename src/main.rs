//! scorewatch: goalscorer reconciliation and selection settlement bot.
//!
//! Pulls finished fixtures from the Fantasy Premier League API, updates each
//! scorer's last-scored gameweek in the record store, and settles open
//! selections whose player scored, exactly once per selection.
//!
//! Architecture:
//! - Tokio async runtime
//! - Service-key authenticated PostgREST store client (or in-process dry-run)
//! - Pure event extraction with a configurable trailing window
//! - Guarded, idempotent writes so overlapping runs are safe
//! - Optional roster/games/gameweek sync tasks ahead of each pass

use std::sync::Arc;
use std::time::Duration;

use tokio::signal;
use tokio::sync::Notify;
use tracing::{error, info, warn};

use scorewatch::config::{Settings, StoreMode};
use scorewatch::feed::FplClient;
use scorewatch::reconcile::{ReconcileConfig, Reconciler};
use scorewatch::store::{MemoryStore, RestStore, RestStoreConfig, Store};
use scorewatch::sync;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration.
    let settings = Settings::from_env();

    // Initialize logging.
    init_logging(&settings);

    info!("=== scorewatch ===");
    info!(
        store_mode = ?settings.store_mode,
        feed = %settings.feed_base_url,
        window_days = settings.window_days,
        "Configuration loaded"
    );

    // Validate settings.
    if let Err(errors) = settings.validate() {
        for e in &errors {
            error!(error = %e, "Configuration error");
        }
        anyhow::bail!("Configuration validation failed");
    }

    let feed = FplClient::new(&settings.feed_base_url, settings.http_timeout_secs)?;

    let store: Arc<dyn Store> = match settings.store_mode {
        StoreMode::Rest => Arc::new(RestStore::new(RestStoreConfig {
            base_url: settings.store_url.clone(),
            service_key: settings.store_service_key.clone(),
            players_table: settings.players_table.clone(),
            selections_table: settings.selections_table.clone(),
            games_table: settings.games_table.clone(),
            gameweeks_table: settings.gameweeks_table.clone(),
            batch_size: settings.store_batch_size,
            rate_limit: settings.store_rate_limit,
            max_retries: settings.store_max_retries,
            timeout_secs: settings.http_timeout_secs,
        })?),
        StoreMode::DryRun => {
            warn!("Dry-run store: no writes leave this process");
            Arc::new(MemoryStore::new())
        }
    };

    let reconciler = Reconciler::new(
        store.clone(),
        ReconcileConfig {
            window: chrono::Duration::days(settings.window_days),
        },
    );

    // One-shot mode: a single pass, cron owns the cadence.
    if settings.run_interval_secs <= 0.0 {
        run_cycle(&feed, store.as_ref(), &reconciler, &settings).await;
        return Ok(());
    }

    // Shutdown signal.
    let shutdown = Arc::new(Notify::new());
    let shutdown_clone = shutdown.clone();
    tokio::spawn(async move {
        signal::ctrl_c().await.expect("Failed to listen for ctrl+c");
        info!("Shutdown signal received");
        shutdown_clone.notify_waiters();
    });

    let interval = Duration::from_secs_f64(settings.run_interval_secs);
    info!(
        interval_secs = settings.run_interval_secs,
        "Starting reconciliation loop"
    );

    loop {
        run_cycle(&feed, store.as_ref(), &reconciler, &settings).await;

        tokio::select! {
            _ = shutdown.notified() => {
                info!("Shutting down...");
                break;
            }
            _ = tokio::time::sleep(interval) => {}
        }
    }

    Ok(())
}

/// One full pass: optional sync tasks, then a reconciliation run.
///
/// A failed sync task or an unreachable feed never exits the process; the
/// next cycle (or cron invocation) starts from scratch.
async fn run_cycle(
    feed: &FplClient,
    store: &dyn Store,
    reconciler: &Reconciler,
    settings: &Settings,
) {
    // Sync tasks first so reconciliation sees a fresh roster.
    if settings.sync_players || settings.sync_gameweeks {
        match feed.bootstrap().await {
            Ok(bootstrap) => {
                if settings.sync_players {
                    if let Err(e) = sync::sync_players(store, &bootstrap.elements).await {
                        warn!(error = %e, "Roster sync failed");
                    }
                }
                if settings.sync_gameweeks {
                    if let Err(e) = sync::sync_gameweeks(store, &bootstrap.events).await {
                        warn!(error = %e, "Gameweek sync failed");
                    }
                }
            }
            Err(e) => {
                warn!(error = %e, "Bootstrap fetch failed, skipping roster/gameweek sync");
            }
        }
    }

    let fixtures = match feed.fixtures().await {
        Ok(fixtures) => fixtures,
        Err(e) => {
            error!(error = %e, "Fixture fetch failed, nothing to reconcile");
            return;
        }
    };

    if settings.sync_games {
        if let Err(e) = sync::sync_games(store, &fixtures).await {
            warn!(error = %e, "Games sync failed");
        }
    }

    let summary = reconciler.run(&fixtures).await;
    for failure in &summary.failures {
        warn!(item = %failure.item, reason = %failure.reason, "Run item failed");
    }
}

fn init_logging(settings: &Settings) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.log_level));

    if settings.log_json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .compact()
            .init();
    }
}
