//! The reconciliation core: scoring events against the persisted record sets.

pub mod extract;
pub mod matcher;
pub mod orchestrator;
pub mod settlement;

pub use extract::{extract_scoring_events, ScoringEvent};
pub use matcher::{dedupe_by_player, match_open_selections, SettlementCandidate};
pub use orchestrator::{ReconcileConfig, Reconciler, RunFailure, RunSummary};
pub use settlement::{settle, SettleReport};
