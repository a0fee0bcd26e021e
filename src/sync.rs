//! Sync tasks: keep the roster, games and gameweek tables in step with the
//! feed. All upserts are merge-on-key, so re-running a sync is harmless.

use tracing::{info, warn};

use crate::feed::models::{Element, Fixture, GameweekEvent};
use crate::store::{GameRecord, GameweekRecord, PlayerRecord, Store, StoreError};

/// Map bootstrap roster entries to players-table rows.
pub fn roster_records(elements: &[Element]) -> Vec<PlayerRecord> {
    elements
        .iter()
        .map(|e| PlayerRecord {
            id: e.id,
            first_name: e.first_name.clone(),
            last_name: e.second_name.clone(),
            web_name: e.web_name.clone(),
            position: e.element_type,
            team: e.team,
            expected_goals: e.expected_goals,
            expected_assists: e.expected_assists,
            news: e.news.clone(),
        })
        .collect()
}

/// Map fixtures to games-table rows. Fixtures without a gameweek or team ids
/// (postponed, unscheduled) are skipped.
pub fn game_records(fixtures: &[Fixture]) -> Vec<GameRecord> {
    fixtures
        .iter()
        .filter_map(|f| {
            let (gameweek, home_team, away_team) = match (f.event, f.team_h, f.team_a) {
                (Some(gw), Some(h), Some(a)) => (gw, h, a),
                _ => {
                    warn!(kickoff_time = ?f.kickoff_time, "Fixture not schedulable, skipping");
                    return None;
                }
            };
            Some(GameRecord {
                gameweek,
                home_team,
                away_team,
                home_score: f.team_h_score,
                away_score: f.team_a_score,
            })
        })
        .collect()
}

/// Map bootstrap gameweek events to gameweek-table rows.
pub fn gameweek_records(events: &[GameweekEvent]) -> Vec<GameweekRecord> {
    events
        .iter()
        .filter_map(|e| {
            let deadline_time = e.deadline_time.clone()?;
            Some(GameweekRecord {
                gameweek_id: e.id,
                deadline_time,
            })
        })
        .collect()
}

pub async fn sync_players(store: &dyn Store, elements: &[Element]) -> Result<usize, StoreError> {
    let records = roster_records(elements);
    let upserted = store.upsert_players(&records).await?;
    info!(upserted, "Roster sync complete");
    Ok(upserted)
}

pub async fn sync_games(store: &dyn Store, fixtures: &[Fixture]) -> Result<usize, StoreError> {
    let records = game_records(fixtures);
    let upserted = store.upsert_games(&records).await?;
    info!(upserted, "Games sync complete");
    Ok(upserted)
}

pub async fn sync_gameweeks(
    store: &dyn Store,
    events: &[GameweekEvent],
) -> Result<usize, StoreError> {
    let records = gameweek_records(events);
    let upserted = store.upsert_gameweeks(&records).await?;
    info!(upserted, "Gameweek sync complete");
    Ok(upserted)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_game_records_skip_unscheduled_fixtures() {
        let fixtures = vec![
            Fixture {
                finished: false,
                kickoff_time: None,
                event: None,
                team_h: Some(1),
                team_a: Some(2),
                team_h_score: None,
                team_a_score: None,
                stats: Vec::new(),
            },
            Fixture {
                finished: true,
                kickoff_time: Some("2025-08-16T14:00:00Z".to_string()),
                event: Some(1),
                team_h: Some(3),
                team_a: Some(4),
                team_h_score: Some(2),
                team_a_score: Some(0),
                stats: Vec::new(),
            },
        ];

        let records = game_records(&fixtures);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].gameweek, 1);
        assert_eq!(records[0].home_score, Some(2));
    }

    #[test]
    fn test_gameweek_records_require_deadline() {
        let events = vec![
            GameweekEvent {
                id: 1,
                deadline_time: Some("2025-08-15T17:30:00Z".to_string()),
            },
            GameweekEvent {
                id: 2,
                deadline_time: None,
            },
        ];

        let records = gameweek_records(&events);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].gameweek_id, 1);
    }
}
