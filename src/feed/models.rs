//! Serde models for the Fantasy Premier League public API.
//!
//! All fields are defensive: anything the feed occasionally omits (kickoff
//! times for unscheduled fixtures, the gameweek of postponed games) is an
//! `Option` or defaulted, so one odd record never fails a whole response.

use rust_decimal::Decimal;
use serde::Deserialize;

/// Stat identifier carrying goalscorer attributions.
pub const GOALS_SCORED: &str = "goals_scored";

// =============================================================================
// Fixtures endpoint
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct Fixture {
    #[serde(default)]
    pub finished: bool,
    /// ISO-8601 UTC kickoff, e.g. "2025-08-16T14:00:00Z". Null until scheduled.
    #[serde(default)]
    pub kickoff_time: Option<String>,
    /// Gameweek number. Null for postponed/unscheduled fixtures.
    #[serde(default)]
    pub event: Option<i32>,
    #[serde(default)]
    pub team_h: Option<i64>,
    #[serde(default)]
    pub team_a: Option<i64>,
    #[serde(default)]
    pub team_h_score: Option<i32>,
    #[serde(default)]
    pub team_a_score: Option<i32>,
    #[serde(default)]
    pub stats: Vec<FixtureStat>,
}

/// One per-statistic breakdown, split into away (`a`) and home (`h`) entries.
#[derive(Debug, Clone, Deserialize)]
pub struct FixtureStat {
    pub identifier: String,
    #[serde(default)]
    pub a: Vec<StatEntry>,
    #[serde(default)]
    pub h: Vec<StatEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatEntry {
    /// Player id the statistic is attributed to.
    pub element: i64,
    /// Statistic count (goals scored by that player in this fixture).
    #[serde(default = "one")]
    pub value: i64,
}

fn one() -> i64 {
    1
}

// =============================================================================
// Bootstrap-static endpoint (roster + gameweeks)
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct Bootstrap {
    #[serde(default)]
    pub elements: Vec<Element>,
    #[serde(default)]
    pub events: Vec<GameweekEvent>,
}

/// Roster entry from `bootstrap-static`.
#[derive(Debug, Clone, Deserialize)]
pub struct Element {
    pub id: i64,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub second_name: String,
    #[serde(default)]
    pub web_name: String,
    /// Position code (1=GKP, 2=DEF, 3=MID, 4=FWD).
    #[serde(default)]
    pub element_type: i32,
    #[serde(default)]
    pub team: i32,
    /// Expected goals, serialized by the feed as a decimal string.
    #[serde(default, with = "rust_decimal::serde::str_option")]
    pub expected_goals: Option<Decimal>,
    #[serde(default, with = "rust_decimal::serde::str_option")]
    pub expected_assists: Option<Decimal>,
    #[serde(default)]
    pub news: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GameweekEvent {
    pub id: i32,
    #[serde(default)]
    pub deadline_time: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_fixture_parses_with_missing_fields() {
        // Postponed fixture: no kickoff, no gameweek, no stats.
        let raw = r#"{"finished": false}"#;
        let fixture: Fixture = serde_json::from_str(raw).unwrap();
        assert!(!fixture.finished);
        assert!(fixture.kickoff_time.is_none());
        assert!(fixture.event.is_none());
        assert!(fixture.stats.is_empty());
    }

    #[test]
    fn test_stat_entry_value_defaults_to_one() {
        let raw = r#"{"element": 101}"#;
        let entry: StatEntry = serde_json::from_str(raw).unwrap();
        assert_eq!(entry.element, 101);
        assert_eq!(entry.value, 1);
    }

    #[test]
    fn test_element_parses_decimal_strings() {
        let raw = r#"{
            "id": 7,
            "first_name": "Bukayo",
            "second_name": "Saka",
            "web_name": "Saka",
            "element_type": 3,
            "team": 1,
            "expected_goals": "0.45",
            "expected_assists": "0.31",
            "news": ""
        }"#;
        let element: Element = serde_json::from_str(raw).unwrap();
        assert_eq!(element.expected_goals, Some(dec!(0.45)));
        assert_eq!(element.expected_assists, Some(dec!(0.31)));
    }
}
