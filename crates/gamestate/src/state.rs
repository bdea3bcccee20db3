use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use playspace_common::{
    GameConfig, InventoryPolicy, ItemId, Objective, ObjectiveId, ScoringRules, SpawnPoint,
};

/// Result of adding items to the inventory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    /// A new item id took a slot.
    Added { quantity: u32 },
    /// Quantity was stacked onto an item already held.
    Stacked { quantity: u32 },
    /// The slot cap was reached and the item id is new.
    Rejected,
    /// Zero quantity; nothing to do.
    Ignored,
}

/// Item id → quantity. Every held item has a quantity of at least one.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Inventory {
    items: BTreeMap<ItemId, u32>,
}

impl Inventory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `quantity` of `item`. Stacking onto a held item always succeeds;
    /// a new item id is rejected once `policy.max_slots` ids are held.
    pub fn add(&mut self, item: &ItemId, quantity: u32, policy: &InventoryPolicy) -> AddOutcome {
        if quantity == 0 {
            return AddOutcome::Ignored;
        }
        if let Some(held) = self.items.get_mut(item) {
            *held = held.saturating_add(quantity);
            return AddOutcome::Stacked { quantity: *held };
        }
        if let Some(max) = policy.max_slots {
            if self.items.len() >= max {
                return AddOutcome::Rejected;
            }
        }
        self.items.insert(item.clone(), quantity);
        AddOutcome::Added { quantity }
    }

    /// Remove up to `quantity` of `item`. Returns how many were removed.
    pub fn remove(&mut self, item: &ItemId, quantity: u32) -> u32 {
        let Some(held) = self.items.get_mut(item) else {
            return 0;
        };
        let removed = quantity.min(*held);
        *held -= removed;
        if *held == 0 {
            self.items.remove(item);
        }
        removed
    }

    pub fn quantity(&self, item: &ItemId) -> u32 {
        self.items.get(item).copied().unwrap_or(0)
    }

    pub fn contains(&self, item: &ItemId) -> bool {
        self.items.contains_key(item)
    }

    /// Sum of all quantities.
    pub fn total(&self) -> u64 {
        self.items.values().map(|&q| q as u64).sum()
    }

    /// Number of distinct item ids held.
    pub fn slots_used(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ItemId, u32)> {
        self.items.iter().map(|(id, &q)| (id, q))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ObjectiveProgress {
    pub completed: bool,
    pub progress: u32,
}

/// Result of advancing an objective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectiveUpdate {
    Progressed { progress: u32, target: u32 },
    Completed,
    AlreadyCompleted,
}

/// Everything that changes about the player during a session. Exposed
/// read-only to the HUD.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PlayerRuntimeState {
    pub position: Vec3,
    pub rotation: Quat,
    pub score: i64,
    pub inventory: Inventory,
    pub objectives: BTreeMap<ObjectiveId, ObjectiveProgress>,
    /// Seconds of running (unpaused) play.
    pub elapsed_time: f32,
    pub has_won: bool,
    pub has_failed: bool,
}

impl PlayerRuntimeState {
    /// Fresh state: objectives from `config`, placed at `spawn` if given.
    pub fn new(config: &GameConfig, spawn: Option<&SpawnPoint>) -> Self {
        let mut state = Self {
            objectives: config
                .objectives
                .iter()
                .map(|o| (o.id.clone(), ObjectiveProgress::default()))
                .collect(),
            ..Self::default()
        };
        if let Some(spawn) = spawn {
            state.place_at(spawn);
        }
        state
    }

    pub fn place_at(&mut self, spawn: &SpawnPoint) {
        self.position = spawn.position;
        self.rotation = spawn.rotation;
    }

    /// Apply a score delta under `rules`. Returns the new score.
    pub fn add_score(&mut self, points: i64, rules: &ScoringRules) -> i64 {
        let score = self.score.saturating_add(points);
        self.score = if rules.allow_negative { score } else { score.max(0) };
        self.score
    }

    /// Advance an objective by one step, completing it at its target count.
    pub fn advance_objective(&mut self, objective: &Objective) -> ObjectiveUpdate {
        let entry = self.objectives.entry(objective.id.clone()).or_default();
        if entry.completed {
            return ObjectiveUpdate::AlreadyCompleted;
        }
        let target = objective.target();
        entry.progress = (entry.progress + 1).min(target);
        if entry.progress >= target {
            entry.completed = true;
            ObjectiveUpdate::Completed
        } else {
            ObjectiveUpdate::Progressed {
                progress: entry.progress,
                target,
            }
        }
    }

    pub fn objective_completed(&self, id: &ObjectiveId) -> bool {
        self.objectives.get(id).is_some_and(|p| p.completed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: &str) -> ItemId {
        ItemId::new(id)
    }

    #[test]
    fn inventory_stacks_quantities() {
        let mut inv = Inventory::new();
        let policy = InventoryPolicy::default();
        assert_eq!(inv.add(&item("coin"), 2, &policy), AddOutcome::Added { quantity: 2 });
        assert_eq!(inv.add(&item("coin"), 3, &policy), AddOutcome::Stacked { quantity: 5 });
        assert_eq!(inv.quantity(&item("coin")), 5);
        assert_eq!(inv.total(), 5);
        assert_eq!(inv.slots_used(), 1);
    }

    #[test]
    fn slot_cap_rejects_new_items_but_allows_stacking() {
        let mut inv = Inventory::new();
        let policy = InventoryPolicy { max_slots: Some(2) };
        inv.add(&item("a"), 1, &policy);
        inv.add(&item("b"), 1, &policy);
        assert_eq!(inv.add(&item("c"), 1, &policy), AddOutcome::Rejected);
        assert!(!inv.contains(&item("c")));
        assert_eq!(inv.add(&item("a"), 1, &policy), AddOutcome::Stacked { quantity: 2 });
    }

    #[test]
    fn remove_drops_empty_slots() {
        let mut inv = Inventory::new();
        let policy = InventoryPolicy::default();
        inv.add(&item("key"), 1, &policy);
        assert_eq!(inv.remove(&item("key"), 5), 1);
        assert!(!inv.contains(&item("key")));
        assert_eq!(inv.remove(&item("key"), 1), 0);
        assert_eq!(inv.add(&item("key"), 0, &policy), AddOutcome::Ignored);
        assert!(inv.is_empty());
    }

    #[test]
    fn score_clamps_unless_negative_allowed() {
        let mut state = PlayerRuntimeState::default();
        let clamp = ScoringRules::default();
        assert_eq!(state.add_score(10, &clamp), 10);
        assert_eq!(state.add_score(-25, &clamp), 0);

        let signed = ScoringRules {
            allow_negative: true,
            ..ScoringRules::default()
        };
        assert_eq!(state.add_score(-5, &signed), -5);
    }

    #[test]
    fn progressive_objective_completes_at_target() {
        let objective = Objective::new("gems").with_target_count(3);
        let mut state = PlayerRuntimeState::default();
        assert_eq!(
            state.advance_objective(&objective),
            ObjectiveUpdate::Progressed {
                progress: 1,
                target: 3
            }
        );
        state.advance_objective(&objective);
        assert_eq!(state.advance_objective(&objective), ObjectiveUpdate::Completed);
        assert_eq!(
            state.advance_objective(&objective),
            ObjectiveUpdate::AlreadyCompleted
        );
        assert_eq!(state.objectives[&objective.id].progress, 3);
    }

    #[test]
    fn simple_objective_completes_immediately() {
        let objective = Objective::new("door");
        let mut state = PlayerRuntimeState::default();
        assert_eq!(state.advance_objective(&objective), ObjectiveUpdate::Completed);
        assert!(state.objective_completed(&objective.id));
    }

    #[test]
    fn new_state_tracks_config_objectives_and_spawn() {
        let config = GameConfig {
            objectives: vec![Objective::new("a"), Objective::new("b")],
            ..GameConfig::default()
        };
        let spawn = SpawnPoint::new("s", Vec3::new(1.0, 0.0, 2.0));
        let state = PlayerRuntimeState::new(&config, Some(&spawn));
        assert_eq!(state.objectives.len(), 2);
        assert_eq!(state.position, Vec3::new(1.0, 0.0, 2.0));
        assert!(!state.has_won && !state.has_failed);
    }

    #[test]
    fn snapshot_serializes_inventory_as_map() {
        let mut state = PlayerRuntimeState::default();
        state
            .inventory
            .add(&item("coin"), 2, &InventoryPolicy::default());
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["inventory"]["coin"], 2);
    }
}
