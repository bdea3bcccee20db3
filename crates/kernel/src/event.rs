use serde::Serialize;

use playspace_actions::DispatchEvent;
use playspace_common::{
    InteractionId, ItemId, ObjectId, ObjectiveId, PortalId, RewardId, SceneId, SessionId, SpawnId,
    SpawnRef, TransitionEffect, TriggerKind,
};
use playspace_gamestate::FailReason;
use playspace_nav::NavEvent;
use playspace_transition::{TransitionEvent, TransitionPhase};

/// A record of something that happened in a session.
///
/// The log is drained by the host each frame; it is the session's only
/// outward channel besides effects and snapshots.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    SessionStarted {
        session: SessionId,
        scene: SceneId,
        spawn: SpawnId,
    },
    InteractionFired {
        object: ObjectId,
        interaction: InteractionId,
        source: TriggerKind,
        /// Fires of this interaction so far, this one included.
        count: u32,
    },
    ScoreChanged {
        delta: i64,
        total: i64,
    },
    ItemAdded {
        item_id: ItemId,
        quantity: u32,
    },
    ItemRejected {
        item_id: ItemId,
    },
    ObjectiveProgressed {
        objective_id: ObjectiveId,
        progress: u32,
        target: u32,
    },
    ObjectiveCompleted {
        objective_id: ObjectiveId,
    },
    Won {
        score: i64,
        elapsed: f32,
    },
    Failed {
        reason: FailReason,
        elapsed: f32,
    },
    RewardGranted {
        reward: RewardId,
        name: String,
    },
    PortalNearby {
        portal: Option<PortalId>,
    },
    PortalUnlocked {
        portal: PortalId,
        key: ItemId,
    },
    PortalEntryDenied {
        portal: PortalId,
    },
    PortalEntered {
        portal: PortalId,
        scene: SceneId,
        spawn: SpawnRef,
    },
    TransitionStarted {
        scene: SceneId,
        effect: TransitionEffect,
    },
    TransitionPhase {
        phase: TransitionPhase,
    },
    SceneLoadFailed {
        scene: SceneId,
        error: String,
    },
    TransitionCompleted {
        scene: SceneId,
        loaded: bool,
    },
    TransitionCancelled {
        scene: SceneId,
    },
    SceneEntered {
        scene: SceneId,
        spawn: SpawnId,
        /// The requested spawn was missing and the default was used.
        fell_back: bool,
    },
    Paused,
    Resumed,
    Reset,
    SessionEnded,
}

impl From<DispatchEvent> for SessionEvent {
    fn from(event: DispatchEvent) -> Self {
        match event {
            DispatchEvent::ScoreChanged { delta, total } => Self::ScoreChanged { delta, total },
            DispatchEvent::ItemAdded { item_id, quantity } => Self::ItemAdded { item_id, quantity },
            DispatchEvent::ItemRejected { item_id } => Self::ItemRejected { item_id },
            DispatchEvent::ObjectiveProgressed {
                objective_id,
                progress,
                target,
            } => Self::ObjectiveProgressed {
                objective_id,
                progress,
                target,
            },
            DispatchEvent::ObjectiveCompleted { objective_id } => {
                Self::ObjectiveCompleted { objective_id }
            }
        }
    }
}

impl From<NavEvent> for SessionEvent {
    fn from(event: NavEvent) -> Self {
        match event {
            NavEvent::NearbyChanged { portal } => Self::PortalNearby { portal },
            NavEvent::PortalUnlocked { portal, key } => Self::PortalUnlocked { portal, key },
            NavEvent::EntryDenied { portal } => Self::PortalEntryDenied { portal },
            NavEvent::PortalEntered(entry) => Self::PortalEntered {
                portal: entry.portal,
                scene: entry.scene,
                spawn: entry.spawn,
            },
        }
    }
}

impl From<TransitionEvent> for SessionEvent {
    fn from(event: TransitionEvent) -> Self {
        match event {
            TransitionEvent::Started { scene, effect, .. } => {
                Self::TransitionStarted { scene, effect }
            }
            TransitionEvent::PhaseChanged { phase } => Self::TransitionPhase { phase },
            TransitionEvent::LoadFailed { scene, error } => Self::SceneLoadFailed { scene, error },
            TransitionEvent::Completed { scene, loaded } => {
                Self::TransitionCompleted { scene, loaded }
            }
            TransitionEvent::Cancelled { scene } => Self::TransitionCancelled { scene },
        }
    }
}

impl SessionEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::SessionStarted { .. } => "session_started",
            Self::InteractionFired { .. } => "interaction_fired",
            Self::ScoreChanged { .. } => "score_changed",
            Self::ItemAdded { .. } => "item_added",
            Self::ItemRejected { .. } => "item_rejected",
            Self::ObjectiveProgressed { .. } => "objective_progressed",
            Self::ObjectiveCompleted { .. } => "objective_completed",
            Self::Won { .. } => "won",
            Self::Failed { .. } => "failed",
            Self::RewardGranted { .. } => "reward_granted",
            Self::PortalNearby { .. } => "portal_nearby",
            Self::PortalUnlocked { .. } => "portal_unlocked",
            Self::PortalEntryDenied { .. } => "portal_entry_denied",
            Self::PortalEntered { .. } => "portal_entered",
            Self::TransitionStarted { .. } => "transition_started",
            Self::TransitionPhase { .. } => "transition_phase",
            Self::SceneLoadFailed { .. } => "scene_load_failed",
            Self::TransitionCompleted { .. } => "transition_completed",
            Self::TransitionCancelled { .. } => "transition_cancelled",
            Self::SceneEntered { .. } => "scene_entered",
            Self::Paused => "paused",
            Self::Resumed => "resumed",
            Self::Reset => "reset",
            Self::SessionEnded => "session_ended",
        }
    }
}
