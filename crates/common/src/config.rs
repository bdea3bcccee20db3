//! Game rules: win conditions, scoring, inventory policy, objectives and rewards.

use serde::{Deserialize, Serialize};

use crate::types::{ItemId, ObjectiveId, RewardId};

fn default_true() -> bool {
    true
}

/// Which objectives a `complete_objectives` condition waits for.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectiveScope {
    /// Every objective in the config.
    #[default]
    All,
    /// Objectives not marked `optional`.
    Primary,
    /// Exactly the listed objectives.
    Listed(Vec<ObjectiveId>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WinConditionKind {
    /// Every catalogued item (optionally of one category) is held.
    CollectAll {
        #[serde(default)]
        category: Option<String>,
    },
    /// Inventory total (or one item's quantity) reaches `count`.
    CollectCount {
        count: u32,
        #[serde(default)]
        item_id: Option<ItemId>,
    },
    ReachScore {
        target: i64,
    },
    CompleteObjectives {
        #[serde(default)]
        scope: ObjectiveScope,
    },
    /// Satisfied while elapsed time is within `seconds`.
    TimeLimit {
        seconds: f32,
        #[serde(default = "default_true")]
        fail_on_expire: bool,
    },
}

/// A win condition. Only `required` conditions gate winning; the rest are
/// informational.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WinCondition {
    #[serde(default = "default_true")]
    pub required: bool,
    #[serde(flatten)]
    pub kind: WinConditionKind,
}

impl WinCondition {
    pub fn required(kind: WinConditionKind) -> Self {
        Self {
            required: true,
            kind,
        }
    }

    pub fn optional(kind: WinConditionKind) -> Self {
        Self {
            required: false,
            kind,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringRules {
    /// Emit a score popup effect for every `add_score`.
    pub show_popups: bool,
    /// When false the score is clamped at zero.
    pub allow_negative: bool,
}

impl Default for ScoringRules {
    fn default() -> Self {
        Self {
            show_popups: true,
            allow_negative: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InventoryPolicy {
    /// Maximum number of distinct item ids held at once.
    pub max_slots: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Objective {
    pub id: ObjectiveId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Completion count for progressive objectives; absent or 1 completes on
    /// the first `complete_objective`.
    #[serde(default)]
    pub target_count: Option<u32>,
    #[serde(default)]
    pub optional: bool,
}

impl Objective {
    pub fn new(id: impl Into<ObjectiveId>) -> Self {
        Self {
            id: id.into(),
            title: String::new(),
            description: String::new(),
            target_count: None,
            optional: false,
        }
    }

    pub fn with_target_count(mut self, count: u32) -> Self {
        self.target_count = Some(count);
        self
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn target(&self) -> u32 {
        self.target_count.unwrap_or(1).max(1)
    }
}

/// When a reward is granted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "on", rename_all = "snake_case")]
pub enum RewardGrant {
    Win,
    Objective { objective_id: ObjectiveId },
    Score { points: i64 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reward {
    pub id: RewardId,
    #[serde(default)]
    pub name: String,
    pub grant: RewardGrant,
}

/// Per-session game rules.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub win_conditions: Vec<WinCondition>,
    pub scoring: ScoringRules,
    pub inventory: InventoryPolicy,
    pub objectives: Vec<Objective>,
    pub rewards: Vec<Reward>,
    /// Global time limit in seconds; expiry fails the session unless won.
    pub time_limit: Option<f32>,
}

impl GameConfig {
    pub fn objective(&self, id: &ObjectiveId) -> Option<&Objective> {
        self.objectives.iter().find(|o| &o.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn win_conditions_parse_with_flattened_tag() {
        let yaml = r#"
win_conditions:
  - type: reach_score
    target: 100
  - type: time_limit
    seconds: 60
    required: false
  - type: complete_objectives
    scope: primary
objectives:
  - id: find-key
    title: Find the key
"#;
        let config: GameConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.win_conditions.len(), 3);
        assert!(config.win_conditions[0].required);
        assert_eq!(
            config.win_conditions[0].kind,
            WinConditionKind::ReachScore { target: 100 }
        );
        assert!(!config.win_conditions[1].required);
        assert!(matches!(
            config.win_conditions[1].kind,
            WinConditionKind::TimeLimit {
                fail_on_expire: true,
                ..
            }
        ));
        assert_eq!(
            config.win_conditions[2].kind,
            WinConditionKind::CompleteObjectives {
                scope: ObjectiveScope::Primary
            }
        );
        assert!(config.scoring.show_popups);
        assert_eq!(config.inventory.max_slots, None);
    }

    #[test]
    fn listed_scope_and_rewards_parse() {
        let yaml = r#"
win_conditions:
  - type: complete_objectives
    scope:
      listed: [a, b]
rewards:
  - id: r1
    grant:
      on: score
      points: 50
"#;
        let config: GameConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(
            config.win_conditions[0].kind,
            WinConditionKind::CompleteObjectives {
                scope: ObjectiveScope::Listed(vec!["a".into(), "b".into()])
            }
        );
        assert_eq!(config.rewards[0].grant, RewardGrant::Score { points: 50 });
    }

    #[test]
    fn objective_target_never_below_one() {
        assert_eq!(Objective::new("o").target(), 1);
        assert_eq!(Objective::new("o").with_target_count(0).target(), 1);
        assert_eq!(Objective::new("o").with_target_count(3).target(), 3);
    }
}
