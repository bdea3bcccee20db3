use serde::Serialize;

use playspace_common::{Action, GameConfig, ItemId, ObjectId, ObjectiveId, PlacedObject};
use playspace_gamestate::{AddOutcome, ObjectiveUpdate, PlayerRuntimeState};

use crate::effect::Effect;

/// Default buzz when a vibrate action has no pattern.
const DEFAULT_VIBRATION_MS: u32 = 200;

/// Caller-level presentation policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, serde::Deserialize)]
#[serde(default)]
pub struct DispatchOptions {
    /// Emit a [`Effect::ScorePopup`] for every score change.
    pub score_popups: bool,
}

impl Default for DispatchOptions {
    fn default() -> Self {
        Self { score_popups: true }
    }
}

/// State changes produced by a dispatch, for the session event stream.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DispatchEvent {
    ScoreChanged { delta: i64, total: i64 },
    ItemAdded { item_id: ItemId, quantity: u32 },
    /// The inventory was at its slot cap; the add was a no-op.
    ItemRejected { item_id: ItemId },
    ObjectiveProgressed { objective_id: ObjectiveId, progress: u32, target: u32 },
    ObjectiveCompleted { objective_id: ObjectiveId },
}

/// Everything one interaction's action list produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dispatch {
    pub effects: Vec<Effect>,
    pub events: Vec<DispatchEvent>,
}

/// Applies an action list, in order, to the player's runtime state.
#[derive(Debug, Clone, Default)]
pub struct ActionDispatcher {
    pub options: DispatchOptions,
}

impl ActionDispatcher {
    pub fn new(options: DispatchOptions) -> Self {
        Self { options }
    }

    /// Apply `actions` fired from `source`. Object targets default to the
    /// source object.
    pub fn dispatch(
        &self,
        source: &PlacedObject,
        actions: &[Action],
        config: &GameConfig,
        state: &mut PlayerRuntimeState,
    ) -> Dispatch {
        let mut out = Dispatch::default();
        let origin = source.position();
        let target_or_source = |target: &Option<ObjectId>| {
            target
                .clone()
                .unwrap_or_else(|| source.instance_id.clone())
        };

        for action in actions {
            match action {
                Action::PlaySound {
                    sound,
                    volume,
                    looped,
                } => out.effects.push(Effect::PlaySound {
                    sound: sound.clone(),
                    volume: *volume,
                    looped: *looped,
                    position: origin,
                }),
                Action::ShowMessage {
                    text,
                    duration_ms,
                    style,
                } => out.effects.push(Effect::ShowMessage {
                    text: text.clone(),
                    duration_ms: *duration_ms,
                    style: *style,
                }),
                Action::AddScore { points } => {
                    let before = state.score;
                    let total = state.add_score(*points, &config.scoring);
                    out.events.push(DispatchEvent::ScoreChanged {
                        delta: total - before,
                        total,
                    });
                    if self.options.score_popups {
                        out.effects.push(Effect::ScorePopup {
                            points: total - before,
                            total,
                            position: origin,
                        });
                    }
                }
                Action::AddInventory {
                    item_id, quantity, ..
                } => match state.inventory.add(item_id, *quantity, &config.inventory) {
                    AddOutcome::Added { quantity } | AddOutcome::Stacked { quantity } => {
                        out.events.push(DispatchEvent::ItemAdded {
                            item_id: item_id.clone(),
                            quantity,
                        });
                    }
                    AddOutcome::Rejected => {
                        tracing::debug!(%item_id, "inventory full, item not added");
                        out.events.push(DispatchEvent::ItemRejected {
                            item_id: item_id.clone(),
                        });
                    }
                    AddOutcome::Ignored => {}
                },
                Action::ShowObject { target } => out.effects.push(Effect::ShowObject {
                    target: target_or_source(target),
                }),
                Action::HideObject { target } => out.effects.push(Effect::HideObject {
                    target: target_or_source(target),
                }),
                Action::Teleport { position, rotation } => out.effects.push(Effect::Teleport {
                    position: *position,
                    rotation: *rotation,
                }),
                Action::PlayAnimation {
                    target,
                    animation,
                    looped,
                } => out.effects.push(Effect::PlayAnimation {
                    target: target_or_source(target),
                    animation: animation.clone(),
                    looped: *looped,
                }),
                Action::EmitParticles {
                    effect,
                    count,
                    offset,
                } => out.effects.push(Effect::EmitParticles {
                    effect: effect.clone(),
                    count: *count,
                    position: origin + *offset,
                }),
                Action::Vibrate { pattern } => {
                    let pattern = if pattern.is_empty() {
                        vec![DEFAULT_VIBRATION_MS]
                    } else {
                        pattern.clone()
                    };
                    out.effects.push(Effect::Vibrate { pattern });
                }
                Action::CompleteObjective { objective_id } => {
                    let Some(objective) = config.objective(objective_id) else {
                        tracing::warn!(%objective_id, object = %source.instance_id, "unknown objective");
                        continue;
                    };
                    match state.advance_objective(objective) {
                        ObjectiveUpdate::Completed => {
                            out.events.push(DispatchEvent::ObjectiveCompleted {
                                objective_id: objective_id.clone(),
                            });
                        }
                        ObjectiveUpdate::Progressed { progress, target } => {
                            out.events.push(DispatchEvent::ObjectiveProgressed {
                                objective_id: objective_id.clone(),
                                progress,
                                target,
                            });
                        }
                        ObjectiveUpdate::AlreadyCompleted => {}
                    }
                }
            }
        }

        tracing::trace!(
            object = %source.instance_id,
            effects = out.effects.len(),
            events = out.events.len(),
            "actions dispatched"
        );
        out
    }
}
