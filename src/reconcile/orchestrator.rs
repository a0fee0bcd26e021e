//! Reconciliation orchestrator: extract -> update players -> match -> settle.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::feed::models::Fixture;
use crate::store::{GoalUpdate, Store, UpdateOutcome};

use super::extract::extract_scoring_events;
use super::matcher::{dedupe_by_player, match_open_selections};
use super::settlement::{settle, SettleReport};

#[derive(Debug, Clone)]
pub struct ReconcileConfig {
    /// Trailing window: only fixtures kicking off within this span of the run
    /// are eligible.
    pub window: Duration,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            window: Duration::days(1),
        }
    }
}

/// One failed item and why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunFailure {
    pub item: String,
    pub reason: String,
}

/// The sole observable result of a reconciliation run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub events: usize,
    pub updated: usize,
    pub not_found: usize,
    pub settled: usize,
    pub already_settled: usize,
    pub failures: Vec<RunFailure>,
}

impl RunSummary {
    fn new(run_id: Uuid) -> Self {
        Self {
            run_id,
            events: 0,
            updated: 0,
            not_found: 0,
            settled: 0,
            already_settled: 0,
            failures: Vec::new(),
        }
    }
}

/// Sequences one reconciliation pass over a fixture batch.
///
/// Per-item problems (missing players, rejected guards, transport hiccups)
/// are collected into the summary; nothing short of an empty batch stops the
/// pass, and an empty batch just returns an empty summary.
pub struct Reconciler {
    store: Arc<dyn Store>,
    config: ReconcileConfig,
}

impl Reconciler {
    pub fn new(store: Arc<dyn Store>, config: ReconcileConfig) -> Self {
        Self { store, config }
    }

    /// Run against the configured trailing window ending now.
    pub async fn run(&self, fixtures: &[Fixture]) -> RunSummary {
        let cutoff = Utc::now() - self.config.window;
        self.run_at(fixtures, cutoff).await
    }

    /// Run with an explicit window cutoff.
    pub async fn run_at(&self, fixtures: &[Fixture], cutoff: DateTime<Utc>) -> RunSummary {
        let run_id = Uuid::new_v4();
        let mut summary = RunSummary::new(run_id);

        let events = extract_scoring_events(fixtures, cutoff);
        summary.events = events.len();
        info!(
            run_id = %run_id,
            fixtures = fixtures.len(),
            events = events.len(),
            cutoff = %cutoff,
            "Reconciliation run starting"
        );

        if events.is_empty() {
            info!(run_id = %run_id, "No scoring events in window");
            return summary;
        }

        // One triggering gameweek per player, shared by the player update and
        // the settlement match so both apply the same tie-break.
        let triggers = dedupe_by_player(&events);

        let updates: Vec<GoalUpdate> = triggers
            .iter()
            .map(|(&player_id, &gameweek)| GoalUpdate {
                player_id,
                gameweek,
            })
            .collect();

        for result in self.store.update_last_scored(&updates).await {
            match result.outcome {
                UpdateOutcome::Updated => summary.updated += 1,
                UpdateOutcome::NotFound => {
                    debug!(player_id = result.player_id, "Player not tracked, skipping");
                    summary.not_found += 1;
                }
                UpdateOutcome::Failed(reason) => summary.failures.push(RunFailure {
                    item: format!("player {}", result.player_id),
                    reason,
                }),
            }
        }

        let candidates = match match_open_selections(self.store.as_ref(), &triggers).await {
            Ok(candidates) => candidates,
            Err(e) => {
                warn!(run_id = %run_id, error = %e, "Open-selection query failed");
                summary.failures.push(RunFailure {
                    item: "selection query".to_string(),
                    reason: e.to_string(),
                });
                return summary;
            }
        };

        for candidate in &candidates {
            match settle(self.store.as_ref(), candidate).await {
                SettleReport::Settled => summary.settled += 1,
                SettleReport::AlreadySettled => summary.already_settled += 1,
                SettleReport::Failed(reason) => summary.failures.push(RunFailure {
                    item: format!(
                        "selection ({}, {})",
                        candidate.selection.player_id, candidate.selection.competition_id
                    ),
                    reason,
                }),
            }
        }

        info!(
            run_id = %run_id,
            events = summary.events,
            updated = summary.updated,
            not_found = summary.not_found,
            settled = summary.settled,
            already_settled = summary.already_settled,
            failures = summary.failures.len(),
            "Reconciliation run complete"
        );

        summary
    }
}
