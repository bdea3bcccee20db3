//! Authored interaction data: placed objects, their triggers and action lists.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::types::{InteractionId, ItemId, ObjectId, ObjectiveId, Transform};

fn default_true() -> bool {
    true
}

fn default_one() -> u32 {
    1
}

fn default_volume() -> f32 {
    1.0
}

fn default_message_ms() -> u32 {
    3000
}

fn default_particle_count() -> u32 {
    24
}

/// Shape of a zone trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoneShape {
    Box,
    Sphere,
}

/// Which crossing of a zone boundary fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoneEvent {
    Enter,
    Exit,
}

/// Condition that makes an interaction eligible to fire.
///
/// Distances are world units, angles degrees, durations and delays seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Trigger {
    Proximity {
        radius: f32,
        #[serde(default = "default_true")]
        on_enter: bool,
        #[serde(default)]
        on_exit: bool,
    },
    Zone {
        shape: ZoneShape,
        /// Full extents for a box; a sphere uses `size.x` as its diameter.
        size: Vec3,
        event: ZoneEvent,
    },
    Look {
        angle: f32,
        duration: f32,
    },
    Timer {
        delay: f32,
        #[serde(default)]
        repeat: bool,
        /// Maximum number of repeats; unbounded when absent.
        #[serde(default)]
        repeat_count: Option<u32>,
    },
    Click,
    Collision {
        #[serde(default)]
        continuous: bool,
    },
}

impl Trigger {
    pub fn kind(&self) -> TriggerKind {
        match self {
            Self::Proximity { .. } => TriggerKind::Proximity,
            Self::Zone { .. } => TriggerKind::Zone,
            Self::Look { .. } => TriggerKind::Look,
            Self::Timer { .. } => TriggerKind::Timer,
            Self::Click => TriggerKind::Click,
            Self::Collision { .. } => TriggerKind::Collision,
        }
    }
}

/// Trigger discriminant, also used to label where a fire came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerKind {
    Proximity,
    Zone,
    Look,
    Timer,
    Click,
    Collision,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageStyle {
    #[default]
    Info,
    Success,
    Warning,
    Error,
}

/// Declarative effect applied when an interaction fires.
///
/// Object targets default to the object that owns the interaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    PlaySound {
        sound: String,
        #[serde(default = "default_volume")]
        volume: f32,
        #[serde(default)]
        looped: bool,
    },
    ShowMessage {
        text: String,
        #[serde(default = "default_message_ms")]
        duration_ms: u32,
        #[serde(default)]
        style: MessageStyle,
    },
    AddScore {
        points: i64,
    },
    AddInventory {
        item_id: ItemId,
        #[serde(default)]
        item_name: Option<String>,
        #[serde(default = "default_one")]
        quantity: u32,
        #[serde(default)]
        category: Option<String>,
    },
    ShowObject {
        #[serde(default)]
        target: Option<ObjectId>,
    },
    HideObject {
        #[serde(default)]
        target: Option<ObjectId>,
    },
    Teleport {
        position: Vec3,
        #[serde(default)]
        rotation: Option<Quat>,
    },
    PlayAnimation {
        #[serde(default)]
        target: Option<ObjectId>,
        animation: String,
        #[serde(default)]
        looped: bool,
    },
    EmitParticles {
        effect: String,
        #[serde(default = "default_particle_count")]
        count: u32,
        /// Offset from the owning object's position.
        #[serde(default)]
        offset: Vec3,
    },
    Vibrate {
        /// Alternating on/off durations in milliseconds.
        #[serde(default)]
        pattern: Vec<u32>,
    },
    CompleteObjective {
        objective_id: ObjectiveId,
    },
}

/// Named rule pairing one trigger with an ordered list of actions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interaction {
    pub id: InteractionId,
    #[serde(default)]
    pub name: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
    pub trigger: Trigger,
    #[serde(default)]
    pub actions: Vec<Action>,
    /// Minimum time between fires; 0 disables the cooldown.
    #[serde(default)]
    pub cooldown_ms: u64,
    /// Maximum number of fires per session; 0 means unlimited.
    #[serde(default)]
    pub max_triggers: u32,
}

impl Interaction {
    pub fn new(id: impl Into<InteractionId>, trigger: Trigger) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            enabled: true,
            trigger,
            actions: Vec::new(),
            cooldown_ms: 0,
            max_triggers: 0,
        }
    }

    pub fn with_action(mut self, action: Action) -> Self {
        self.actions.push(action);
        self
    }

    pub fn with_cooldown_ms(mut self, cooldown_ms: u64) -> Self {
        self.cooldown_ms = cooldown_ms;
        self
    }

    pub fn with_max_triggers(mut self, max_triggers: u32) -> Self {
        self.max_triggers = max_triggers;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}

/// An object placed in a scene together with its interactions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacedObject {
    pub instance_id: ObjectId,
    #[serde(default)]
    pub transform: Transform,
    #[serde(default)]
    pub interactions: Vec<Interaction>,
}

impl PlacedObject {
    pub fn new(instance_id: impl Into<ObjectId>, position: Vec3) -> Self {
        Self {
            instance_id: instance_id.into(),
            transform: Transform::from_position(position),
            interactions: Vec::new(),
        }
    }

    pub fn with_interaction(mut self, interaction: Interaction) -> Self {
        self.interactions.push(interaction);
        self
    }

    pub fn position(&self) -> Vec3 {
        self.transform.position
    }

    pub fn interaction(&self, id: &InteractionId) -> Option<&Interaction> {
        self.interactions.iter().find(|i| &i.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trigger_tags_deserialize_into_variants() {
        let yaml = r#"
- type: proximity
  radius: 2.0
- type: zone
  shape: box
  size: [2.0, 2.0, 2.0]
  event: exit
- type: timer
  delay: 1.5
  repeat: true
- type: click
"#;
        let triggers: Vec<Trigger> = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(
            triggers[0],
            Trigger::Proximity {
                radius: 2.0,
                on_enter: true,
                on_exit: false
            }
        );
        assert_eq!(triggers[1].kind(), TriggerKind::Zone);
        assert!(matches!(
            triggers[2],
            Trigger::Timer {
                repeat: true,
                repeat_count: None,
                ..
            }
        ));
        assert_eq!(triggers[3], Trigger::Click);
    }

    #[test]
    fn unknown_action_tag_is_rejected() {
        let json = r#"{"type": "summon_dragon"}"#;
        assert!(serde_json::from_str::<Action>(json).is_err());
    }

    #[test]
    fn interaction_defaults() {
        let json = r#"{"id": "i1", "trigger": {"type": "click"}}"#;
        let interaction: Interaction = serde_json::from_str(json).unwrap();
        assert!(interaction.enabled);
        assert_eq!(interaction.cooldown_ms, 0);
        assert_eq!(interaction.max_triggers, 0);
        assert!(interaction.actions.is_empty());
    }

    #[test]
    fn add_inventory_defaults_to_single_item() {
        let json = r#"{"type": "add_inventory", "item_id": "coin"}"#;
        let action: Action = serde_json::from_str(json).unwrap();
        assert!(matches!(action, Action::AddInventory { quantity: 1, .. }));
    }
}
