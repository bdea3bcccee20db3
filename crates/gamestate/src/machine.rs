use serde::{Deserialize, Serialize};

use playspace_common::{GameConfig, WinConditionKind};

use crate::conditions::{ConditionStatus, ItemCatalog, expired_fatally, measure};
use crate::state::PlayerRuntimeState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GamePhase {
    #[default]
    Running,
    Paused,
    Won,
    Failed,
}

impl GamePhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Won | Self::Failed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum FailReason {
    /// A required `time_limit` condition with `fail_on_expire` ran out.
    TimeLimit { seconds: f32 },
    /// The config's global time limit ran out.
    GlobalTimeLimit { seconds: f32 },
}

/// A terminal transition produced by [`GameStateMachine::evaluate`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Outcome {
    Won,
    Failed(FailReason),
}

/// Running ↔ Paused, Running → Won | Failed. Terminal phases hold until
/// [`GameStateMachine::reset`].
#[derive(Debug, Clone)]
pub struct GameStateMachine {
    phase: GamePhase,
    config: GameConfig,
    catalog: ItemCatalog,
}

impl GameStateMachine {
    pub fn new(config: GameConfig, catalog: ItemCatalog) -> Self {
        if !config.win_conditions.iter().any(|c| c.required) {
            tracing::warn!("no required win conditions; the session can only fail or run forever");
        }
        Self {
            phase: GamePhase::Running,
            config,
            catalog,
        }
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn catalog(&self) -> &ItemCatalog {
        &self.catalog
    }

    pub fn catalog_mut(&mut self) -> &mut ItemCatalog {
        &mut self.catalog
    }

    /// Running → Paused. Returns false from any other phase.
    pub fn pause(&mut self) -> bool {
        if self.phase != GamePhase::Running {
            return false;
        }
        self.phase = GamePhase::Paused;
        tracing::debug!("game paused");
        true
    }

    /// Paused → Running. Returns false from any other phase.
    pub fn resume(&mut self) -> bool {
        if self.phase != GamePhase::Paused {
            return false;
        }
        self.phase = GamePhase::Running;
        tracing::debug!("game resumed");
        true
    }

    /// Back to Running from any phase. The caller supplies fresh state.
    pub fn reset(&mut self) {
        self.phase = GamePhase::Running;
    }

    /// Evaluate win/fail once. Only acts while Running; returns the outcome
    /// on the tick the phase becomes terminal and `None` otherwise.
    pub fn evaluate(&mut self, state: &mut PlayerRuntimeState) -> Option<Outcome> {
        if self.phase != GamePhase::Running {
            return None;
        }

        if self.is_won(state) {
            self.phase = GamePhase::Won;
            state.has_won = true;
            tracing::info!(score = state.score, elapsed = state.elapsed_time, "session won");
            return Some(Outcome::Won);
        }

        if let Some(reason) = self.fail_reason(state) {
            self.phase = GamePhase::Failed;
            state.has_failed = true;
            tracing::info!(?reason, elapsed = state.elapsed_time, "session failed");
            return Some(Outcome::Failed(reason));
        }

        None
    }

    /// Every required condition holds, and there is at least one.
    fn is_won(&self, state: &PlayerRuntimeState) -> bool {
        let mut required = self
            .config
            .win_conditions
            .iter()
            .filter(|c| c.required)
            .peekable();
        if required.peek().is_none() {
            return false;
        }
        required.all(|c| measure(&c.kind, state, &self.config, &self.catalog).2)
    }

    fn fail_reason(&self, state: &PlayerRuntimeState) -> Option<FailReason> {
        for condition in &self.config.win_conditions {
            if expired_fatally(condition, state) {
                if let WinConditionKind::TimeLimit { seconds, .. } = condition.kind {
                    return Some(FailReason::TimeLimit { seconds });
                }
            }
        }
        match self.config.time_limit {
            Some(seconds) if state.elapsed_time > seconds => {
                Some(FailReason::GlobalTimeLimit { seconds })
            }
            _ => None,
        }
    }

    /// Status of every condition, required or informational.
    pub fn report(&self, state: &PlayerRuntimeState) -> Vec<ConditionStatus> {
        self.config
            .win_conditions
            .iter()
            .enumerate()
            .map(|(index, condition)| {
                let (current, target, satisfied) =
                    measure(&condition.kind, state, &self.config, &self.catalog);
                ConditionStatus {
                    index,
                    required: condition.required,
                    satisfied,
                    current,
                    target,
                }
            })
            .collect()
    }
}
