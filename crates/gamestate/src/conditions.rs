use serde::Serialize;
use std::collections::BTreeMap;

use playspace_common::{
    Action, GameConfig, ItemId, ObjectiveScope, PlacedObject, WinCondition, WinConditionKind,
};

use crate::state::PlayerRuntimeState;

/// The collectible items of a session: every item granted by an
/// `add_inventory` action, with its optional category.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemCatalog {
    items: BTreeMap<ItemId, Option<String>>,
}

impl ItemCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_objects(objects: &[PlacedObject]) -> Self {
        let mut catalog = Self::new();
        catalog.extend_from(objects);
        catalog
    }

    /// Add items granted by `objects` (used again when a new scene loads).
    pub fn extend_from(&mut self, objects: &[PlacedObject]) {
        let actions = objects
            .iter()
            .flat_map(|o| &o.interactions)
            .flat_map(|i| &i.actions);
        for action in actions {
            if let Action::AddInventory {
                item_id, category, ..
            } = action
            {
                self.insert(item_id.clone(), category.clone());
            }
        }
    }

    pub fn insert(&mut self, item: ItemId, category: Option<String>) {
        let entry = self.items.entry(item).or_insert(None);
        if entry.is_none() {
            *entry = category;
        }
    }

    /// Items, optionally restricted to one category.
    pub fn items<'a>(&'a self, category: Option<&'a str>) -> impl Iterator<Item = &'a ItemId> + 'a {
        self.items
            .iter()
            .filter(move |(_, c)| category.is_none() || c.as_deref() == category)
            .map(|(id, _)| id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// HUD view of one win condition.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConditionStatus {
    pub index: usize,
    pub required: bool,
    pub satisfied: bool,
    pub current: f64,
    pub target: f64,
}

/// Measure a condition as (current, target, satisfied).
pub(crate) fn measure(
    kind: &WinConditionKind,
    state: &PlayerRuntimeState,
    config: &GameConfig,
    catalog: &ItemCatalog,
) -> (f64, f64, bool) {
    match kind {
        WinConditionKind::CollectAll { category } => {
            let wanted: Vec<_> = catalog.items(category.as_deref()).collect();
            let held = wanted
                .iter()
                .filter(|id| state.inventory.contains(id))
                .count();
            // An empty catalog would win instantly; treat it as unsatisfiable.
            let satisfied = !wanted.is_empty() && held == wanted.len();
            (held as f64, wanted.len() as f64, satisfied)
        }
        WinConditionKind::CollectCount { count, item_id } => {
            let have = match item_id {
                Some(id) => state.inventory.quantity(id) as u64,
                None => state.inventory.total(),
            };
            (have as f64, *count as f64, have >= *count as u64)
        }
        WinConditionKind::ReachScore { target } => (
            state.score as f64,
            *target as f64,
            state.score >= *target,
        ),
        WinConditionKind::CompleteObjectives { scope } => {
            let qualifying: Vec<_> = match scope {
                ObjectiveScope::All => config.objectives.iter().map(|o| &o.id).collect(),
                ObjectiveScope::Primary => config
                    .objectives
                    .iter()
                    .filter(|o| !o.optional)
                    .map(|o| &o.id)
                    .collect(),
                ObjectiveScope::Listed(ids) => ids.iter().collect(),
            };
            let done = qualifying
                .iter()
                .filter(|id| state.objective_completed(id))
                .count();
            let satisfied = !qualifying.is_empty() && done == qualifying.len();
            (done as f64, qualifying.len() as f64, satisfied)
        }
        WinConditionKind::TimeLimit { seconds, .. } => (
            state.elapsed_time as f64,
            *seconds as f64,
            state.elapsed_time <= *seconds,
        ),
    }
}

/// True when this condition's expiry fails the session.
pub(crate) fn expired_fatally(condition: &WinCondition, state: &PlayerRuntimeState) -> bool {
    match condition.kind {
        WinConditionKind::TimeLimit {
            seconds,
            fail_on_expire,
        } => condition.required && fail_on_expire && state.elapsed_time > seconds,
        _ => false,
    }
}
