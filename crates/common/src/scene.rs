//! Scene content: placed objects, portals and spawn points.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::interaction::PlacedObject;
use crate::types::{ItemId, PortalId, SceneId, SpawnId};

fn default_true() -> bool {
    true
}

fn default_portal_size() -> Vec3 {
    Vec3::new(2.0, 3.0, 0.5)
}

/// How a portal is entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PortalTrigger {
    /// Walking into the portal enters it.
    #[default]
    Enter,
    /// The host must request entry while the portal is nearby.
    Interact,
    /// Like `Interact`, but only once the portal has been unlocked by a key.
    KeyRequired,
}

/// Visual treatment of a scene transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionEffect {
    #[default]
    Fade,
    Dissolve,
    SlideLeft,
    SlideRight,
    SlideUp,
    SlideDown,
    Zoom,
    Instant,
}

/// Spawn target of a portal: the destination's default spawn or a named one.
///
/// Authored as a plain string where `"default"` selects the default spawn.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SpawnRef {
    #[default]
    Default,
    Named(SpawnId),
}

impl From<String> for SpawnRef {
    fn from(value: String) -> Self {
        if value.is_empty() || value == "default" {
            Self::Default
        } else {
            Self::Named(SpawnId(value))
        }
    }
}

impl From<SpawnRef> for String {
    fn from(value: SpawnRef) -> Self {
        match value {
            SpawnRef::Default => "default".to_owned(),
            SpawnRef::Named(id) => id.0,
        }
    }
}

impl From<&str> for SpawnRef {
    fn from(value: &str) -> Self {
        Self::from(value.to_owned())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Portal {
    pub id: PortalId,
    #[serde(default)]
    pub name: String,
    pub position: Vec3,
    #[serde(default)]
    pub rotation: Quat,
    #[serde(default = "default_portal_size")]
    pub size: Vec3,
    pub destination_scene_id: SceneId,
    #[serde(default)]
    pub destination_spawn_id: SpawnRef,
    #[serde(default)]
    pub trigger_type: PortalTrigger,
    #[serde(default)]
    pub locked: bool,
    #[serde(default)]
    pub required_key_id: Option<ItemId>,
    #[serde(default)]
    pub transition_effect: TransitionEffect,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Portal {
    pub fn new(id: impl Into<PortalId>, position: Vec3, destination: impl Into<SceneId>) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            position,
            rotation: Quat::IDENTITY,
            size: default_portal_size(),
            destination_scene_id: destination.into(),
            destination_spawn_id: SpawnRef::Default,
            trigger_type: PortalTrigger::Enter,
            locked: false,
            required_key_id: None,
            transition_effect: TransitionEffect::Fade,
            enabled: true,
        }
    }

    pub fn with_trigger(mut self, trigger_type: PortalTrigger) -> Self {
        self.trigger_type = trigger_type;
        self
    }

    pub fn with_spawn(mut self, spawn: impl Into<SpawnRef>) -> Self {
        self.destination_spawn_id = spawn.into();
        self
    }

    /// Lock the portal behind a key item.
    pub fn with_key(mut self, key: impl Into<ItemId>) -> Self {
        self.trigger_type = PortalTrigger::KeyRequired;
        self.locked = true;
        self.required_key_id = Some(key.into());
        self
    }

    pub fn with_effect(mut self, effect: TransitionEffect) -> Self {
        self.transition_effect = effect;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpawnPoint {
    pub id: SpawnId,
    #[serde(default)]
    pub name: String,
    pub position: Vec3,
    #[serde(default)]
    pub rotation: Quat,
    #[serde(default)]
    pub is_default: bool,
}

impl SpawnPoint {
    pub fn new(id: impl Into<SpawnId>, position: Vec3) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            position,
            rotation: Quat::IDENTITY,
            is_default: false,
        }
    }

    pub fn as_default(mut self) -> Self {
        self.is_default = true;
        self
    }
}

/// Result of resolving a [`SpawnRef`] against a scene.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpawnResolution<'a> {
    pub spawn: &'a SpawnPoint,
    /// True when a named spawn was missing and the default was used instead.
    pub fell_back: bool,
}

/// Everything a session needs from one scene.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SceneData {
    pub id: SceneId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub objects: Vec<PlacedObject>,
    #[serde(default)]
    pub portals: Vec<Portal>,
    #[serde(default)]
    pub spawn_points: Vec<SpawnPoint>,
}

impl SceneData {
    pub fn new(id: impl Into<SceneId>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    pub fn with_object(mut self, object: PlacedObject) -> Self {
        self.objects.push(object);
        self
    }

    pub fn with_portal(mut self, portal: Portal) -> Self {
        self.portals.push(portal);
        self
    }

    pub fn with_spawn(mut self, spawn: SpawnPoint) -> Self {
        self.spawn_points.push(spawn);
        self
    }

    pub fn spawn(&self, id: &SpawnId) -> Option<&SpawnPoint> {
        self.spawn_points.iter().find(|s| &s.id == id)
    }

    /// The spawn flagged as default, or the first spawn when none is flagged.
    pub fn default_spawn(&self) -> Option<&SpawnPoint> {
        self.spawn_points
            .iter()
            .find(|s| s.is_default)
            .or_else(|| self.spawn_points.first())
    }

    /// Resolve a spawn reference, falling back to the default spawn when a
    /// named spawn does not exist. `None` only when the scene has no spawns.
    pub fn resolve_spawn(&self, spawn: &SpawnRef) -> Option<SpawnResolution<'_>> {
        match spawn {
            SpawnRef::Default => self.default_spawn().map(|spawn| SpawnResolution {
                spawn,
                fell_back: false,
            }),
            SpawnRef::Named(id) => match self.spawn(id) {
                Some(spawn) => Some(SpawnResolution {
                    spawn,
                    fell_back: false,
                }),
                None => self.default_spawn().map(|spawn| SpawnResolution {
                    spawn,
                    fell_back: true,
                }),
            },
        }
    }

    /// Make `id` the only default spawn. Returns false if it does not exist.
    pub fn set_default_spawn(&mut self, id: &SpawnId) -> bool {
        if self.spawn(id).is_none() {
            return false;
        }
        for spawn in &mut self.spawn_points {
            spawn.is_default = &spawn.id == id;
        }
        true
    }

    pub fn portal(&self, id: &PortalId) -> Option<&Portal> {
        self.portals.iter().find(|p| &p.id == id)
    }
}
