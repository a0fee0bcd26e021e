//! In-process record store.
//!
//! Backs dry-run mode (full pipeline, no remote writes) and the test suite.
//! Implements the same guarded-write semantics as the REST store: the
//! settlement check-and-set happens under one lock, so concurrent runs
//! settle a selection at most once.

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use super::error::StoreError;
use super::{
    GameRecord, GameweekRecord, GoalUpdate, PlayerRecord, Selection, SelectionKey, SettleOutcome,
    Store, UpdateOutcome, UpdateResult,
};

#[derive(Debug, Default)]
struct Inner {
    /// Tracked players: id -> last gameweek scored.
    last_goal: HashMap<i64, Option<i32>>,
    roster: HashMap<i64, PlayerRecord>,
    selections: HashMap<SelectionKey, Selection>,
    games: HashMap<(i32, i64, i64), GameRecord>,
    gameweeks: HashMap<i32, GameweekRecord>,
    /// Number of settlement writes attempted (guard hits included).
    settle_writes: u64,
}

/// Thread-safe in-memory store.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<Inner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tracked player with no scoring history.
    pub fn seed_player(&self, id: i64) {
        self.inner.write().unwrap().last_goal.entry(id).or_insert(None);
    }

    pub fn seed_players(&self, ids: &[i64]) {
        for &id in ids {
            self.seed_player(id);
        }
    }

    /// Register an open selection.
    pub fn seed_selection(&self, player_id: i64, competition_id: i64) {
        let selection = Selection {
            player_id,
            competition_id,
            has_scored: false,
            gameweek_scored: None,
        };
        self.inner
            .write()
            .unwrap()
            .selections
            .insert(selection.key(), selection);
    }

    /// Register a selection already in its settled state.
    pub fn seed_settled_selection(&self, player_id: i64, competition_id: i64, gameweek: i32) {
        let selection = Selection {
            player_id,
            competition_id,
            has_scored: true,
            gameweek_scored: Some(gameweek),
        };
        self.inner
            .write()
            .unwrap()
            .selections
            .insert(selection.key(), selection);
    }

    /// Last gameweek the player scored. Outer `None` = player not tracked.
    pub fn last_goal(&self, id: i64) -> Option<Option<i32>> {
        self.inner.read().unwrap().last_goal.get(&id).copied()
    }

    pub fn selection(&self, key: SelectionKey) -> Option<Selection> {
        self.inner.read().unwrap().selections.get(&key).cloned()
    }

    pub fn settle_writes(&self) -> u64 {
        self.inner.read().unwrap().settle_writes
    }

    pub fn roster_len(&self) -> usize {
        self.inner.read().unwrap().roster.len()
    }

    pub fn games_len(&self) -> usize {
        self.inner.read().unwrap().games.len()
    }

    pub fn gameweeks_len(&self) -> usize {
        self.inner.read().unwrap().gameweeks.len()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn update_last_scored(&self, updates: &[GoalUpdate]) -> Vec<UpdateResult> {
        let mut inner = self.inner.write().unwrap();
        updates
            .iter()
            .map(|update| {
                let outcome = match inner.last_goal.get_mut(&update.player_id) {
                    Some(last) => {
                        *last = Some(update.gameweek);
                        UpdateOutcome::Updated
                    }
                    None => UpdateOutcome::NotFound,
                };
                UpdateResult {
                    player_id: update.player_id,
                    gameweek: update.gameweek,
                    outcome,
                }
            })
            .collect()
    }

    async fn open_selections(
        &self,
        player_ids: &BTreeSet<i64>,
    ) -> Result<Vec<Selection>, StoreError> {
        let inner = self.inner.read().unwrap();
        let mut open: Vec<Selection> = inner
            .selections
            .values()
            .filter(|s| !s.has_scored && player_ids.contains(&s.player_id))
            .cloned()
            .collect();
        // Stable order for deterministic runs.
        open.sort_by_key(Selection::key);
        Ok(open)
    }

    async fn settle_selection(
        &self,
        key: SelectionKey,
        gameweek: i32,
    ) -> Result<SettleOutcome, StoreError> {
        let mut inner = self.inner.write().unwrap();
        inner.settle_writes += 1;

        match inner.selections.get_mut(&key) {
            Some(selection) if !selection.has_scored => {
                selection.has_scored = true;
                selection.gameweek_scored = Some(gameweek);
                Ok(SettleOutcome::Settled)
            }
            _ => Ok(SettleOutcome::NoOpenRow),
        }
    }

    async fn upsert_players(&self, players: &[PlayerRecord]) -> Result<usize, StoreError> {
        let mut inner = self.inner.write().unwrap();
        for player in players {
            inner.last_goal.entry(player.id).or_insert(None);
            inner.roster.insert(player.id, player.clone());
        }
        Ok(players.len())
    }

    async fn upsert_games(&self, games: &[GameRecord]) -> Result<usize, StoreError> {
        let mut inner = self.inner.write().unwrap();
        for game in games {
            inner
                .games
                .insert((game.gameweek, game.home_team, game.away_team), game.clone());
        }
        Ok(games.len())
    }

    async fn upsert_gameweeks(&self, gameweeks: &[GameweekRecord]) -> Result<usize, StoreError> {
        let mut inner = self.inner.write().unwrap();
        for gameweek in gameweeks {
            inner.gameweeks.insert(gameweek.gameweek_id, gameweek.clone());
        }
        Ok(gameweeks.len())
    }
}
