//! Record store: the two persisted record sets (players and selections) plus
//! the supporting tables kept fresh by the sync tasks.
//!
//! The `Store` trait is the seam between reconciliation semantics and
//! transport: `RestStore` speaks PostgREST to the hosted store, `MemoryStore`
//! backs dry-run mode and the test suite.

pub mod error;
pub mod memory;
pub mod rest;

pub use error::StoreError;
pub use memory::MemoryStore;
pub use rest::{RestStore, RestStoreConfig};

use std::collections::BTreeSet;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// =============================================================================
// Record types
// =============================================================================

/// Roster row in the players table. `last_goal_scored` is intentionally not
/// part of this payload: roster upserts must never clobber reconciliation
/// state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerRecord {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub web_name: String,
    pub position: i32,
    pub team: i32,
    #[serde(default, with = "rust_decimal::serde::str_option")]
    pub expected_goals: Option<Decimal>,
    #[serde(default, with = "rust_decimal::serde::str_option")]
    pub expected_assists: Option<Decimal>,
    pub news: String,
}

/// A user-made prediction that a player scores within a competition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub player_id: i64,
    pub competition_id: i64,
    pub has_scored: bool,
    pub gameweek_scored: Option<i32>,
}

impl Selection {
    pub fn key(&self) -> SelectionKey {
        SelectionKey {
            player_id: self.player_id,
            competition_id: self.competition_id,
        }
    }
}

/// Composite identity of a selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SelectionKey {
    pub player_id: i64,
    pub competition_id: i64,
}

/// Result row in the games table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameRecord {
    pub gameweek: i32,
    pub home_team: i64,
    pub away_team: i64,
    pub home_score: Option<i32>,
    pub away_score: Option<i32>,
}

/// Calendar row in the gameweeks table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameweekRecord {
    pub gameweek_id: i32,
    pub deadline_time: String,
}

// =============================================================================
// Write contracts
// =============================================================================

/// One pending write of a player's last-scored gameweek.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GoalUpdate {
    pub player_id: i64,
    pub gameweek: i32,
}

/// Per-item outcome of the bulk last-scored write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    Updated,
    NotFound,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateResult {
    pub player_id: i64,
    pub gameweek: i32,
    pub outcome: UpdateOutcome,
}

/// Outcome of a guarded settlement write. `NoOpenRow` covers both an already
/// settled selection and a missing one: either way the guard matched nothing
/// and no state changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettleOutcome {
    Settled,
    NoOpenRow,
}

// =============================================================================
// Store trait
// =============================================================================

/// Query and write access to the persisted record sets.
///
/// Contracts the reconciliation core relies on:
/// - `update_last_scored` is one bulk write per run, idempotent per item,
///   reporting every item's outcome (a transport failure marks the affected
///   items `Failed`, it never panics or loses the rest of the batch);
/// - `open_selections` is a single set-membership query over open selections;
/// - `settle_selection` re-checks the open guard at write time and is a no-op
///   when the guard matches nothing.
#[async_trait]
pub trait Store: Send + Sync {
    async fn update_last_scored(&self, updates: &[GoalUpdate]) -> Vec<UpdateResult>;

    async fn open_selections(
        &self,
        player_ids: &BTreeSet<i64>,
    ) -> Result<Vec<Selection>, StoreError>;

    async fn settle_selection(
        &self,
        key: SelectionKey,
        gameweek: i32,
    ) -> Result<SettleOutcome, StoreError>;

    async fn upsert_players(&self, players: &[PlayerRecord]) -> Result<usize, StoreError>;

    async fn upsert_games(&self, games: &[GameRecord]) -> Result<usize, StoreError>;

    async fn upsert_gameweeks(&self, gameweeks: &[GameweekRecord]) -> Result<usize, StoreError>;
}
