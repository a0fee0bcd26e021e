//! Event extraction: raw fixtures -> flat scoring events.

use chrono::{DateTime, Utc};
use tracing::warn;

use crate::feed::models::{Fixture, GOALS_SCORED};

/// One observed goal: player and the gameweek it was scored in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoringEvent {
    pub player_id: i64,
    pub gameweek: i32,
}

/// Flatten a fixture batch into scoring events.
///
/// A fixture contributes events only if it is finished and kicked off at or
/// after `cutoff`. Malformed records (missing or unparseable kickoff, missing
/// gameweek) are skipped with a warning; one bad fixture never aborts the
/// batch. Output order follows feed order, home side before away, so runs are
/// deterministic. A player with `value` goals yields `value` identical events;
/// downstream de-duplication keeps that from double-settling.
pub fn extract_scoring_events(fixtures: &[Fixture], cutoff: DateTime<Utc>) -> Vec<ScoringEvent> {
    let mut events = Vec::new();

    for fixture in fixtures {
        if !fixture.finished {
            continue;
        }

        let Some(kickoff_raw) = fixture.kickoff_time.as_deref() else {
            warn!(event = ?fixture.event, "Fixture missing kickoff time, skipping");
            continue;
        };

        let kickoff = match DateTime::parse_from_rfc3339(kickoff_raw) {
            Ok(t) => t.with_timezone(&Utc),
            Err(e) => {
                warn!(kickoff_time = kickoff_raw, error = %e, "Unparseable kickoff time, skipping");
                continue;
            }
        };

        if kickoff < cutoff {
            continue;
        }

        let Some(gameweek) = fixture.event else {
            warn!(kickoff_time = kickoff_raw, "Finished fixture has no gameweek, skipping");
            continue;
        };

        for stat in &fixture.stats {
            if stat.identifier != GOALS_SCORED {
                continue;
            }
            for scorer in stat.h.iter().chain(stat.a.iter()) {
                for _ in 0..scorer.value.max(1) {
                    events.push(ScoringEvent {
                        player_id: scorer.element,
                        gameweek,
                    });
                }
            }
        }
    }

    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::models::{FixtureStat, StatEntry};
    use chrono::Duration;

    fn goals_stat(home: &[(i64, i64)], away: &[(i64, i64)]) -> FixtureStat {
        let entry = |&(element, value): &(i64, i64)| StatEntry { element, value };
        FixtureStat {
            identifier: GOALS_SCORED.to_string(),
            h: home.iter().map(entry).collect(),
            a: away.iter().map(entry).collect(),
        }
    }

    fn fixture(finished: bool, kickoff: Option<&str>, event: Option<i32>, stats: Vec<FixtureStat>) -> Fixture {
        Fixture {
            finished,
            kickoff_time: kickoff.map(str::to_string),
            event,
            team_h: Some(1),
            team_a: Some(2),
            team_h_score: None,
            team_a_score: None,
            stats,
        }
    }

    fn cutoff() -> DateTime<Utc> {
        "2025-08-16T00:00:00Z".parse::<DateTime<Utc>>().unwrap()
    }

    fn in_window() -> &'static str {
        "2025-08-16T14:00:00Z"
    }

    #[test]
    fn test_single_scorer_yields_single_event() {
        let fixtures = vec![fixture(
            true,
            Some(in_window()),
            Some(7),
            vec![goals_stat(&[(101, 1)], &[])],
        )];

        let events = extract_scoring_events(&fixtures, cutoff());
        assert_eq!(
            events,
            vec![ScoringEvent {
                player_id: 101,
                gameweek: 7
            }]
        );
    }

    #[test]
    fn test_unfinished_fixture_excluded() {
        let fixtures = vec![fixture(
            false,
            Some(in_window()),
            Some(7),
            vec![goals_stat(&[(101, 1)], &[])],
        )];

        assert!(extract_scoring_events(&fixtures, cutoff()).is_empty());
    }

    #[test]
    fn test_old_kickoff_excluded() {
        let fixtures = vec![fixture(
            true,
            Some("2025-08-01T14:00:00Z"),
            Some(5),
            vec![goals_stat(&[(101, 1)], &[])],
        )];

        assert!(extract_scoring_events(&fixtures, cutoff()).is_empty());
    }

    #[test]
    fn test_kickoff_exactly_at_cutoff_included() {
        let fixtures = vec![fixture(
            true,
            Some("2025-08-16T00:00:00Z"),
            Some(7),
            vec![goals_stat(&[(101, 1)], &[])],
        )];

        assert_eq!(extract_scoring_events(&fixtures, cutoff()).len(), 1);
    }

    #[test]
    fn test_missing_kickoff_skipped_without_aborting_batch() {
        let fixtures = vec![
            fixture(true, None, Some(7), vec![goals_stat(&[(101, 1)], &[])]),
            fixture(true, Some(in_window()), Some(7), vec![goals_stat(&[(202, 1)], &[])]),
        ];

        let events = extract_scoring_events(&fixtures, cutoff());
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].player_id, 202);
    }

    #[test]
    fn test_unparseable_kickoff_skipped() {
        let fixtures = vec![fixture(
            true,
            Some("yesterday teatime"),
            Some(7),
            vec![goals_stat(&[(101, 1)], &[])],
        )];

        assert!(extract_scoring_events(&fixtures, cutoff()).is_empty());
    }

    #[test]
    fn test_missing_gameweek_skipped() {
        let fixtures = vec![fixture(
            true,
            Some(in_window()),
            None,
            vec![goals_stat(&[(101, 1)], &[])],
        )];

        assert!(extract_scoring_events(&fixtures, cutoff()).is_empty());
    }

    #[test]
    fn test_fixture_without_goals_stat_contributes_nothing() {
        let other_stat = FixtureStat {
            identifier: "yellow_cards".to_string(),
            h: vec![StatEntry {
                element: 101,
                value: 1,
            }],
            a: vec![],
        };
        let fixtures = vec![fixture(true, Some(in_window()), Some(7), vec![other_stat])];

        assert!(extract_scoring_events(&fixtures, cutoff()).is_empty());
    }

    #[test]
    fn test_both_sides_emit_events_home_first() {
        let fixtures = vec![fixture(
            true,
            Some(in_window()),
            Some(7),
            vec![goals_stat(&[(101, 1)], &[(202, 1)])],
        )];

        let events = extract_scoring_events(&fixtures, cutoff());
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].player_id, 101);
        assert_eq!(events[1].player_id, 202);
    }

    #[test]
    fn test_brace_scorer_emits_one_event_per_goal() {
        let fixtures = vec![fixture(
            true,
            Some(in_window()),
            Some(7),
            vec![goals_stat(&[(101, 2)], &[])],
        )];

        let events = extract_scoring_events(&fixtures, cutoff());
        assert_eq!(events.len(), 2);
        assert!(events
            .iter()
            .all(|e| e.player_id == 101 && e.gameweek == 7));
    }

    #[test]
    fn test_window_is_relative_to_cutoff_not_hardcoded() {
        let wide_cutoff = cutoff() - Duration::days(30);
        let fixtures = vec![fixture(
            true,
            Some("2025-08-01T14:00:00Z"),
            Some(5),
            vec![goals_stat(&[(101, 1)], &[])],
        )];

        assert_eq!(extract_scoring_events(&fixtures, wide_cutoff).len(), 1);
    }
}
