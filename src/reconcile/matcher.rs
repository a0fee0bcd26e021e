//! Selection matching: which open selections does this event batch settle?

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use crate::store::{Selection, Store, StoreError};

use super::extract::ScoringEvent;

/// An open selection paired with the gameweek that settles it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettlementCandidate {
    pub selection: Selection,
    pub gameweek: i32,
}

/// Collapse an event batch to one triggering gameweek per player.
///
/// A player with several events in the batch (a brace, or goals in two
/// fixtures inside the window) must settle a selection once, not once per
/// goal. The maximum gameweek wins, matching the "last scored" meaning of the
/// player attribute.
pub fn dedupe_by_player(events: &[ScoringEvent]) -> BTreeMap<i64, i32> {
    let mut triggers: BTreeMap<i64, i32> = BTreeMap::new();
    for event in events {
        triggers
            .entry(event.player_id)
            .and_modify(|gw| *gw = (*gw).max(event.gameweek))
            .or_insert(event.gameweek);
    }
    triggers
}

/// Find all open selections referencing a player in the de-duplicated batch.
///
/// One set-membership query against the store regardless of batch size;
/// already settled selections are excluded by the query itself.
pub async fn match_open_selections(
    store: &dyn Store,
    triggers: &BTreeMap<i64, i32>,
) -> Result<Vec<SettlementCandidate>, StoreError> {
    if triggers.is_empty() {
        return Ok(Vec::new());
    }

    let player_ids: BTreeSet<i64> = triggers.keys().copied().collect();
    let open = store.open_selections(&player_ids).await?;
    debug!(
        players = player_ids.len(),
        open = open.len(),
        "Matched open selections"
    );

    Ok(open
        .into_iter()
        .filter_map(|selection| {
            triggers
                .get(&selection.player_id)
                .map(|&gameweek| SettlementCandidate {
                    selection,
                    gameweek,
                })
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(player_id: i64, gameweek: i32) -> ScoringEvent {
        ScoringEvent {
            player_id,
            gameweek,
        }
    }

    #[test]
    fn test_dedupe_collapses_identical_events() {
        let triggers = dedupe_by_player(&[event(101, 7), event(101, 7)]);
        assert_eq!(triggers.len(), 1);
        assert_eq!(triggers[&101], 7);
    }

    #[test]
    fn test_dedupe_keeps_max_gameweek() {
        // Feed order deliberately newest-first: the policy is max, not last.
        let triggers = dedupe_by_player(&[event(101, 8), event(101, 7)]);
        assert_eq!(triggers[&101], 8);

        let triggers = dedupe_by_player(&[event(101, 7), event(101, 8)]);
        assert_eq!(triggers[&101], 8);
    }

    #[test]
    fn test_dedupe_is_per_player() {
        let triggers = dedupe_by_player(&[event(101, 7), event(202, 8)]);
        assert_eq!(triggers.len(), 2);
        assert_eq!(triggers[&101], 7);
        assert_eq!(triggers[&202], 8);
    }

    #[tokio::test]
    async fn test_empty_batch_skips_the_query() {
        use crate::store::MemoryStore;

        let store = MemoryStore::new();
        let candidates = match_open_selections(&store, &BTreeMap::new())
            .await
            .unwrap();
        assert!(candidates.is_empty());
    }
}
