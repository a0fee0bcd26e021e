//! Settlement: the one-way open -> settled transition.

use tracing::{debug, info, warn};

use crate::store::{SettleOutcome, Store};

use super::matcher::SettlementCandidate;

/// What happened to one settlement attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettleReport {
    Settled,
    /// The open guard matched nothing: the selection was settled by an
    /// earlier or concurrent run, or no longer exists. Benign.
    AlreadySettled,
    Failed(String),
}

/// Attempt the guarded settlement write for one matched candidate.
///
/// The store re-checks the open guard at write time, so a race between two
/// runs resolves to one `Settled` and one `AlreadySettled`, never two writes.
pub async fn settle(store: &dyn Store, candidate: &SettlementCandidate) -> SettleReport {
    let key = candidate.selection.key();

    match store.settle_selection(key, candidate.gameweek).await {
        Ok(SettleOutcome::Settled) => {
            info!(
                player_id = key.player_id,
                competition_id = key.competition_id,
                gameweek = candidate.gameweek,
                "Selection settled"
            );
            SettleReport::Settled
        }
        Ok(SettleOutcome::NoOpenRow) => {
            debug!(
                player_id = key.player_id,
                competition_id = key.competition_id,
                "Selection no longer open, skipping"
            );
            SettleReport::AlreadySettled
        }
        Err(e) => {
            warn!(
                player_id = key.player_id,
                competition_id = key.competition_id,
                error = %e,
                "Settlement write failed"
            );
            SettleReport::Failed(e.to_string())
        }
    }
}
