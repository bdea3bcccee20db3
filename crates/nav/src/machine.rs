use glam::Vec3;
use serde::{Deserialize, Serialize};

use playspace_common::{
    ItemId, Portal, PortalId, PortalTrigger, SceneData, SceneId, SpawnRef, TransitionEffect,
};
use playspace_gamestate::Inventory;

/// Distances (world units) that drive prompting and automatic entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigationConfig {
    /// A portal within this distance is "nearby" and can be prompted for.
    pub nearby_distance: f32,
    /// `enter` portals resolve when the player crosses into this distance.
    pub entry_distance: f32,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            nearby_distance: 3.0,
            entry_distance: 1.5,
        }
    }
}

/// A resolved trip through a portal.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PortalEntry {
    pub portal: PortalId,
    pub scene: SceneId,
    pub spawn: SpawnRef,
    pub effect: TransitionEffect,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NavEvent {
    /// The nearest prompt-able portal changed (`None` once out of range).
    NearbyChanged { portal: Option<PortalId> },
    PortalUnlocked { portal: PortalId, key: ItemId },
    /// Entry was attempted while the portal is still locked.
    EntryDenied { portal: PortalId },
    PortalEntered(PortalEntry),
}

/// Result of one navigation update.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NavUpdate {
    pub events: Vec<NavEvent>,
    pub entry: Option<PortalEntry>,
}

#[derive(Debug, Clone)]
struct PortalSlot {
    portal: Portal,
    locked: bool,
    inside: bool,
}

impl PortalSlot {
    fn distance(&self, position: Vec3) -> f32 {
        self.portal.position.distance(position)
    }

    fn entry(&self) -> PortalEntry {
        PortalEntry {
            portal: self.portal.id.clone(),
            scene: self.portal.destination_scene_id.clone(),
            spawn: self.portal.destination_spawn_id.clone(),
            effect: self.portal.transition_effect,
        }
    }
}

/// Per-scene portal state: runtime lock flags, the nearby portal and the
/// entry edge of every portal.
#[derive(Debug, Clone, Default)]
pub struct NavigationStateMachine {
    pub config: NavigationConfig,
    scene: SceneId,
    slots: Vec<PortalSlot>,
    nearby: Option<usize>,
    entry_requested: bool,
}

impl NavigationStateMachine {
    pub fn new(config: NavigationConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Take over the portals of `scene`. The player's `position` primes the
    /// entry edges so spawning inside a portal does not bounce straight back.
    pub fn load_scene(&mut self, scene: &SceneData, position: Vec3) {
        self.scene = scene.id.clone();
        self.slots = scene
            .portals
            .iter()
            .map(|portal| {
                if portal.locked && portal.required_key_id.is_none() {
                    tracing::warn!(portal = %portal.id, "locked portal has no key; it can never open");
                }
                PortalSlot {
                    portal: portal.clone(),
                    locked: portal.locked,
                    inside: false,
                }
            })
            .collect();
        self.nearby = None;
        self.entry_requested = false;
        self.prime(position);
        tracing::debug!(scene = %self.scene, portals = self.slots.len(), "navigation scene loaded");
    }

    /// Restore authored lock flags, as at scene load.
    pub fn reset(&mut self, position: Vec3) {
        for slot in &mut self.slots {
            slot.locked = slot.portal.locked;
        }
        self.nearby = None;
        self.entry_requested = false;
        self.prime(position);
    }

    fn prime(&mut self, position: Vec3) {
        let entry_distance = self.config.entry_distance;
        for slot in &mut self.slots {
            slot.inside = slot.distance(position) <= entry_distance;
        }
    }

    pub fn scene(&self) -> &SceneId {
        &self.scene
    }

    /// Ask to go through the nearby portal; resolved on the next update.
    pub fn request_entry(&mut self) {
        self.entry_requested = true;
    }

    pub fn nearby(&self) -> Option<&Portal> {
        self.nearby.map(|i| &self.slots[i].portal)
    }

    /// Runtime lock state of a portal in the current scene.
    pub fn is_locked(&self, id: &PortalId) -> Option<bool> {
        self.slots
            .iter()
            .find(|s| &s.portal.id == id)
            .map(|s| s.locked)
    }

    pub fn update(&mut self, position: Vec3, inventory: &Inventory) -> NavUpdate {
        let _span = tracing::trace_span!("nav_update", scene = %self.scene).entered();
        let mut out = NavUpdate::default();

        // Keys unlock for good; dropping the key later changes nothing.
        for slot in self.slots.iter_mut().filter(|s| s.locked) {
            if let Some(key) = &slot.portal.required_key_id {
                if inventory.contains(key) {
                    slot.locked = false;
                    tracing::info!(portal = %slot.portal.id, %key, "portal unlocked");
                    out.events.push(NavEvent::PortalUnlocked {
                        portal: slot.portal.id.clone(),
                        key: key.clone(),
                    });
                }
            }
        }

        let nearby = self
            .slots
            .iter()
            .enumerate()
            .filter(|(_, s)| s.portal.enabled)
            .map(|(i, s)| (i, s.distance(position)))
            .filter(|(_, d)| *d <= self.config.nearby_distance)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(i, _)| i);
        if nearby != self.nearby {
            self.nearby = nearby;
            out.events.push(NavEvent::NearbyChanged {
                portal: nearby.map(|i| self.slots[i].portal.id.clone()),
            });
        }

        let mut crossed: Option<(usize, f32)> = None;
        for (i, slot) in self.slots.iter_mut().enumerate() {
            let distance = slot.distance(position);
            let inside = distance <= self.config.entry_distance;
            let rising = inside && !slot.inside;
            slot.inside = inside;
            if rising
                && slot.portal.enabled
                && slot.portal.trigger_type == PortalTrigger::Enter
                && crossed.is_none_or(|(_, d)| distance < d)
            {
                crossed = Some((i, distance));
            }
        }

        let mut target = crossed.map(|(i, _)| i);
        if std::mem::take(&mut self.entry_requested) && target.is_none() {
            match self.nearby {
                Some(i) => target = Some(i),
                None => tracing::debug!("entry requested with no portal nearby"),
            }
        }

        if let Some(i) = target {
            let slot = &self.slots[i];
            if slot.locked {
                tracing::debug!(portal = %slot.portal.id, "portal locked, entry denied");
                out.events.push(NavEvent::EntryDenied {
                    portal: slot.portal.id.clone(),
                });
            } else {
                let entry = slot.entry();
                tracing::info!(portal = %entry.portal, scene = %entry.scene, "portal entered");
                out.events.push(NavEvent::PortalEntered(entry.clone()));
                out.entry = Some(entry);
            }
        }

        out
    }
}
