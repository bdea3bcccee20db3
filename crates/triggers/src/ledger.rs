use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use playspace_common::{Interaction, InteractionId, ObjectId};

/// Identifies one interaction on one placed object.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct InteractionKey {
    pub object: ObjectId,
    pub interaction: InteractionId,
}

impl InteractionKey {
    pub fn new(object: &ObjectId, interaction: &InteractionId) -> Self {
        Self {
            object: object.clone(),
            interaction: interaction.clone(),
        }
    }
}

impl fmt::Display for InteractionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.object, self.interaction)
    }
}

/// Runtime fire bookkeeping for one interaction.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FireRecord {
    pub trigger_count: u32,
    /// Session clock (milliseconds) of the last fire.
    pub last_fired_at: Option<f64>,
}

/// Outcome of gating a candidate fire.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GateDecision {
    Allowed,
    CoolingDown { remaining_ms: f64 },
    Exhausted { max_triggers: u32 },
}

impl GateDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed)
    }
}

/// Per-session fire counts and timestamps, keyed by interaction.
///
/// Authored interactions stay immutable; their `triggerCount` and
/// `lastFiredAt` live here.
#[derive(Debug, Clone, Default)]
pub struct FireLedger {
    records: BTreeMap<InteractionKey, FireRecord>,
}

impl FireLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Gate a candidate fire without recording it.
    pub fn check(&self, key: &InteractionKey, interaction: &Interaction, now_ms: f64) -> GateDecision {
        let Some(record) = self.records.get(key) else {
            return GateDecision::Allowed;
        };
        if interaction.max_triggers > 0 && record.trigger_count >= interaction.max_triggers {
            return GateDecision::Exhausted {
                max_triggers: interaction.max_triggers,
            };
        }
        if interaction.cooldown_ms > 0 {
            if let Some(last) = record.last_fired_at {
                let since = now_ms - last;
                let cooldown = interaction.cooldown_ms as f64;
                if since < cooldown {
                    return GateDecision::CoolingDown {
                        remaining_ms: cooldown - since,
                    };
                }
            }
        }
        GateDecision::Allowed
    }

    /// Record a fire. Returns the new trigger count.
    pub fn record(&mut self, key: &InteractionKey, now_ms: f64) -> u32 {
        let record = self.records.entry(key.clone()).or_default();
        record.trigger_count += 1;
        record.last_fired_at = Some(now_ms);
        record.trigger_count
    }

    /// Gate and, when allowed, record in one step.
    pub fn try_fire(
        &mut self,
        key: &InteractionKey,
        interaction: &Interaction,
        now_ms: f64,
    ) -> GateDecision {
        let decision = self.check(key, interaction, now_ms);
        if decision.is_allowed() {
            self.record(key, now_ms);
        }
        decision
    }

    pub fn get(&self, key: &InteractionKey) -> Option<&FireRecord> {
        self.records.get(key)
    }

    pub fn trigger_count(&self, key: &InteractionKey) -> u32 {
        self.records.get(key).map_or(0, |r| r.trigger_count)
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }
}
