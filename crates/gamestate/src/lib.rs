//! Game state: what the player has, and whether they have won or failed.
//!
//! # Invariants
//! - Won and Failed are terminal until an explicit reset.
//! - Winning requires every `required` condition; the rest are reported only.
//! - Evaluation is idempotent: re-running it on unchanged state changes nothing.

mod conditions;
mod machine;
mod rewards;
mod state;

pub use conditions::{ConditionStatus, ItemCatalog};
pub use machine::{FailReason, GamePhase, GameStateMachine, Outcome};
pub use rewards::RewardTracker;
pub use state::{AddOutcome, Inventory, ObjectiveProgress, ObjectiveUpdate, PlayerRuntimeState};

pub fn crate_info() -> &'static str {
    "playspace-gamestate v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("gamestate"));
    }
}
