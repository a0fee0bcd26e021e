//! PostgREST client for the hosted record store (Supabase).
//!
//! Features:
//! - Service-key authentication (`apikey` + bearer headers)
//! - Rate limiting (configurable, default 10 req/sec)
//! - Automatic retries with exponential backoff
//! - Bulk writes chunked to a configurable batch size

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use governor::{Quota, RateLimiter};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Method, StatusCode};
use tracing::{debug, warn};

use super::error::StoreError;
use super::{
    GameRecord, GameweekRecord, GoalUpdate, PlayerRecord, Selection, SelectionKey, SettleOutcome,
    Store, UpdateOutcome, UpdateResult,
};

/// Column holding the last gameweek a player scored in.
const LAST_GOAL_COLUMN: &str = "last_goal_scored";

#[derive(Debug, Clone)]
pub struct RestStoreConfig {
    pub base_url: String,
    pub service_key: String,
    pub players_table: String,
    pub selections_table: String,
    pub games_table: String,
    pub gameweeks_table: String,
    pub batch_size: usize,
    pub rate_limit: u32,
    pub max_retries: u32,
    pub timeout_secs: u64,
}

impl Default for RestStoreConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            service_key: String::new(),
            players_table: "footballers".to_string(),
            selections_table: "selections".to_string(),
            games_table: "games".to_string(),
            gameweeks_table: "gameweek".to_string(),
            batch_size: 100,
            rate_limit: 10,
            max_retries: 3,
            timeout_secs: 30,
        }
    }
}

/// REST client for a PostgREST-dialect record store.
pub struct RestStore {
    config: RestStoreConfig,
    client: Client,
    headers: HeaderMap,
    rate_limiter: Arc<
        RateLimiter<
            governor::state::NotKeyed,
            governor::state::InMemoryState,
            governor::clock::DefaultClock,
        >,
    >,
}

impl RestStore {
    pub fn new(config: RestStoreConfig) -> Result<Self, StoreError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .pool_max_idle_per_host(20)
            .tcp_keepalive(Duration::from_secs(30))
            .build()
            .map_err(|e| StoreError::Network(e.to_string()))?;

        let mut headers = HeaderMap::new();
        let key_value = HeaderValue::from_str(&config.service_key)
            .map_err(|e| StoreError::Authentication(e.to_string()))?;
        let bearer = HeaderValue::from_str(&format!("Bearer {}", config.service_key))
            .map_err(|e| StoreError::Authentication(e.to_string()))?;
        headers.insert("apikey", key_value);
        headers.insert(AUTHORIZATION, bearer);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let quota = Quota::per_second(
            NonZeroU32::new(config.rate_limit).unwrap_or(NonZeroU32::new(10).unwrap()),
        );
        let rate_limiter = Arc::new(RateLimiter::direct(quota));

        Ok(Self {
            config,
            client,
            headers,
            rate_limiter,
        })
    }

    // =========================================================================
    // Core request method
    // =========================================================================

    /// Issue one request against `/rest/v1/{table_query}`, retrying rate
    /// limits, server errors and network failures with backoff.
    async fn request(
        &self,
        method: Method,
        table_query: &str,
        body: Option<&serde_json::Value>,
        prefer: Option<&str>,
    ) -> Result<serde_json::Value, StoreError> {
        let url = format!(
            "{}/rest/v1/{}",
            self.config.base_url.trim_end_matches('/'),
            table_query
        );
        let mut last_error: Option<StoreError> = None;

        for attempt in 0..self.config.max_retries {
            // Rate limiting
            self.rate_limiter.until_ready().await;

            debug!(
                method = %method,
                table_query = %table_query,
                attempt = attempt + 1,
                "Store request"
            );

            let mut req = self
                .client
                .request(method.clone(), &url)
                .headers(self.headers.clone());

            if let Some(body) = body {
                req = req.json(body);
            }

            if let Some(prefer) = prefer {
                req = req.header("Prefer", prefer);
            }

            let result = req.send().await;

            match result {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() {
                        if status == StatusCode::NO_CONTENT {
                            return Ok(serde_json::Value::Null);
                        }
                        let text = response
                            .text()
                            .await
                            .map_err(|e| StoreError::Network(e.to_string()))?;
                        if text.is_empty() {
                            return Ok(serde_json::Value::Null);
                        }
                        let json: serde_json::Value = serde_json::from_str(&text)
                            .map_err(|e| StoreError::Deserialization(e.to_string()))?;
                        return Ok(json);
                    }

                    // Rate limit — always retry
                    if status.as_u16() == 429 {
                        let retry_after = response
                            .headers()
                            .get("Retry-After")
                            .and_then(|v| v.to_str().ok())
                            .and_then(|v| v.parse::<u64>().ok())
                            .unwrap_or(1);
                        warn!(retry_after, attempt = attempt + 1, "Rate limited");
                        tokio::time::sleep(Duration::from_secs(retry_after)).await;
                        last_error = Some(StoreError::RateLimited { retry_after });
                        continue;
                    }

                    // Server errors — retry with backoff
                    if status.as_u16() >= 500 {
                        let delay_ms = 500 * 2u64.pow(attempt);
                        warn!(
                            status_code = status.as_u16(),
                            delay_ms,
                            attempt = attempt + 1,
                            "Server error, retrying"
                        );
                        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                        last_error = Some(StoreError::Http {
                            status_code: status.as_u16(),
                            error_code: "SERVER_ERROR".to_string(),
                            message: status.to_string(),
                        });
                        continue;
                    }

                    // Client errors — don't retry
                    let body_text = response.text().await.unwrap_or_default();
                    return Err(StoreError::from_response(status.as_u16(), &body_text));
                }
                Err(e) => {
                    let delay_ms = 500 * 2u64.pow(attempt);
                    warn!(
                        error = %e,
                        delay_ms,
                        attempt = attempt + 1,
                        "Network error, retrying"
                    );
                    tokio::time::sleep(Duration::from_millis(delay_ms)).await;

                    if e.is_timeout() {
                        last_error = Some(StoreError::Timeout(e.to_string()));
                    } else {
                        last_error = Some(StoreError::Network(e.to_string()));
                    }
                    continue;
                }
            }
        }

        Err(last_error.unwrap_or_else(|| StoreError::MaxRetriesExceeded {
            attempts: self.config.max_retries,
            last_error: "Unknown error".to_string(),
        }))
    }

    /// Upsert one chunked payload array into a table.
    async fn upsert_rows<T: serde::Serialize>(
        &self,
        table: &str,
        rows: &[T],
    ) -> Result<usize, StoreError> {
        let mut count = 0;
        for chunk in rows.chunks(self.config.batch_size) {
            let body = serde_json::to_value(chunk)
                .map_err(|e| StoreError::Deserialization(e.to_string()))?;
            self.request(
                Method::POST,
                table,
                Some(&body),
                Some("resolution=merge-duplicates"),
            )
            .await?;
            count += chunk.len();
        }
        Ok(count)
    }
}

fn join_ids(ids: &[i64]) -> String {
    ids.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

#[async_trait]
impl Store for RestStore {
    /// One PATCH per distinct gameweek with an `id=in.(…)` filter. Rows absent
    /// from the returned representation did not exist in the table.
    async fn update_last_scored(&self, updates: &[GoalUpdate]) -> Vec<UpdateResult> {
        let mut by_gameweek: BTreeMap<i32, Vec<i64>> = BTreeMap::new();
        for update in updates {
            by_gameweek
                .entry(update.gameweek)
                .or_default()
                .push(update.player_id);
        }

        let mut results = Vec::with_capacity(updates.len());
        for (gameweek, ids) in by_gameweek {
            for chunk in ids.chunks(self.config.batch_size) {
                let table_query = format!(
                    "{}?id=in.({})",
                    self.config.players_table,
                    join_ids(chunk)
                );
                let body = serde_json::json!({ LAST_GOAL_COLUMN: gameweek });

                match self
                    .request(
                        Method::PATCH,
                        &table_query,
                        Some(&body),
                        Some("return=representation"),
                    )
                    .await
                {
                    Ok(rows) => {
                        let updated: HashSet<i64> = rows
                            .as_array()
                            .map(|rows| {
                                rows.iter()
                                    .filter_map(|row| row.get("id").and_then(|v| v.as_i64()))
                                    .collect()
                            })
                            .unwrap_or_default();

                        for &player_id in chunk {
                            let outcome = if updated.contains(&player_id) {
                                UpdateOutcome::Updated
                            } else {
                                UpdateOutcome::NotFound
                            };
                            results.push(UpdateResult {
                                player_id,
                                gameweek,
                                outcome,
                            });
                        }
                    }
                    Err(e) => {
                        warn!(gameweek, error = %e, "Bulk last-scored update failed");
                        let reason = e.to_string();
                        for &player_id in chunk {
                            results.push(UpdateResult {
                                player_id,
                                gameweek,
                                outcome: UpdateOutcome::Failed(reason.clone()),
                            });
                        }
                    }
                }
            }
        }

        results
    }

    async fn open_selections(
        &self,
        player_ids: &BTreeSet<i64>,
    ) -> Result<Vec<Selection>, StoreError> {
        let ids: Vec<i64> = player_ids.iter().copied().collect();
        let mut selections = Vec::new();

        for chunk in ids.chunks(self.config.batch_size) {
            let table_query = format!(
                "{}?select=player_id,competition_id,has_scored,gameweek_scored\
                 &has_scored=is.false&player_id=in.({})",
                self.config.selections_table,
                join_ids(chunk)
            );
            let rows = self.request(Method::GET, &table_query, None, None).await?;
            let batch: Vec<Selection> = serde_json::from_value(rows)
                .map_err(|e| StoreError::Deserialization(e.to_string()))?;
            selections.extend(batch);
        }

        Ok(selections)
    }

    /// The `has_scored=is.false` filter on the PATCH is the settlement guard:
    /// an empty representation means the guard matched nothing and the write
    /// was a no-op.
    async fn settle_selection(
        &self,
        key: SelectionKey,
        gameweek: i32,
    ) -> Result<SettleOutcome, StoreError> {
        let table_query = format!(
            "{}?player_id=eq.{}&competition_id=eq.{}&has_scored=is.false",
            self.config.selections_table, key.player_id, key.competition_id
        );
        let body = serde_json::json!({
            "has_scored": true,
            "gameweek_scored": gameweek,
        });

        let rows = self
            .request(
                Method::PATCH,
                &table_query,
                Some(&body),
                Some("return=representation"),
            )
            .await?;

        match rows.as_array() {
            Some(settled) if !settled.is_empty() => Ok(SettleOutcome::Settled),
            _ => Ok(SettleOutcome::NoOpenRow),
        }
    }

    async fn upsert_players(&self, players: &[PlayerRecord]) -> Result<usize, StoreError> {
        self.upsert_rows(&self.config.players_table, players).await
    }

    async fn upsert_games(&self, games: &[GameRecord]) -> Result<usize, StoreError> {
        self.upsert_rows(&self.config.games_table, games).await
    }

    async fn upsert_gameweeks(&self, gameweeks: &[GameweekRecord]) -> Result<usize, StoreError> {
        self.upsert_rows(&self.config.gameweeks_table, gameweeks).await
    }
}
