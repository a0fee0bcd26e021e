//! Configuration management.
//!
//! Loads settings from environment variables and .env file.

use std::str::FromStr;

/// Application configuration loaded from environment.
#[derive(Debug, Clone)]
pub struct Settings {
    // Record store (PostgREST dialect, e.g. Supabase)
    pub store_url: String,
    pub store_service_key: String,
    pub store_mode: StoreMode,

    // Store tables
    pub players_table: String,
    pub selections_table: String,
    pub games_table: String,
    pub gameweeks_table: String,

    // Fixture feed
    pub feed_base_url: String,

    // Reconciliation
    pub window_days: i64,
    pub store_batch_size: usize,

    // Transport tuning
    pub http_timeout_secs: u64,
    pub store_rate_limit: u32,
    pub store_max_retries: u32,

    // Run cadence: 0 = single pass and exit, otherwise poll interval.
    pub run_interval_secs: f64,

    // Sync tasks
    pub sync_players: bool,
    pub sync_games: bool,
    pub sync_gameweeks: bool,

    // Logging
    pub log_level: String,
    pub log_json: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreMode {
    /// Writes go to the remote record store.
    Rest,
    /// Writes stay in an in-process store; nothing leaves the machine.
    DryRun,
}

impl FromStr for StoreMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "rest" => Ok(Self::Rest),
            "dry-run" | "dryrun" => Ok(Self::DryRun),
            _ => Err(format!("Invalid store mode: {s}")),
        }
    }
}

impl Settings {
    /// Load settings from environment variables (and .env file).
    pub fn from_env() -> Self {
        // Try to load .env file (ignore if not found).
        let _ = dotenvy::dotenv();

        Self {
            store_url: env_str("STORE_URL", ""),
            store_service_key: env_str("STORE_SERVICE_KEY", ""),
            store_mode: env_str("STORE_MODE", "rest")
                .parse()
                .unwrap_or(StoreMode::Rest),

            players_table: env_str("PLAYERS_TABLE", "footballers"),
            selections_table: env_str("SELECTIONS_TABLE", "selections"),
            games_table: env_str("GAMES_TABLE", "games"),
            gameweeks_table: env_str("GAMEWEEKS_TABLE", "gameweek"),

            feed_base_url: env_str("FEED_BASE_URL", "https://fantasy.premierleague.com/api"),

            window_days: env_i64("WINDOW_DAYS", 1),
            store_batch_size: env_usize("STORE_BATCH_SIZE", 100),

            http_timeout_secs: env_u64("HTTP_TIMEOUT_SECS", 30),
            store_rate_limit: env_u32("STORE_RATE_LIMIT", 10),
            store_max_retries: env_u32("STORE_MAX_RETRIES", 3),

            run_interval_secs: env_f64("RUN_INTERVAL_SECS", 0.0),

            sync_players: env_bool("SYNC_PLAYERS", false),
            sync_games: env_bool("SYNC_GAMES", false),
            sync_gameweeks: env_bool("SYNC_GAMEWEEKS", false),

            log_level: env_str("LOG_LEVEL", "info"),
            log_json: env_bool("LOG_JSON", false),
        }
    }

    /// Validate configuration for critical requirements.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.store_mode == StoreMode::Rest {
            if self.store_url.is_empty() {
                errors.push("STORE_URL is required for rest store mode".to_string());
            }
            if self.store_service_key.is_empty() {
                errors.push("STORE_SERVICE_KEY is required for rest store mode".to_string());
            }
        }

        if self.window_days < 1 {
            errors.push("WINDOW_DAYS must be at least 1".to_string());
        }

        if self.store_batch_size == 0 {
            errors.push("STORE_BATCH_SIZE must be at least 1".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

// =============================================================================
// Environment helpers
// =============================================================================

fn env_str(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .map(|v| matches!(v.to_lowercase().as_str(), "true" | "1" | "yes"))
        .unwrap_or(default)
}

fn env_f64(key: &str, default: f64) -> f64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_i64(key: &str, default: i64) -> i64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_u32(key: &str, default: u32) -> u32 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_usize(key: &str, default: usize) -> usize {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
