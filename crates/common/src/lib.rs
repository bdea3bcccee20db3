//! Shared types for the playspace runtime: ids, transforms and the authored
//! data model consumed by every runtime component.
//!
//! # Invariants
//! - Authored data is immutable input to a session; runtime state lives in
//!   the crates that own it, never here.
//! - Every string-tagged authoring variant maps onto a closed enum.

pub mod config;
pub mod interaction;
pub mod scene;
pub mod types;

pub use config::{
    GameConfig, InventoryPolicy, Objective, ObjectiveScope, Reward, RewardGrant, ScoringRules,
    WinCondition, WinConditionKind,
};
pub use interaction::{
    Action, Interaction, MessageStyle, PlacedObject, Trigger, TriggerKind, ZoneEvent, ZoneShape,
};
pub use scene::{
    Portal, PortalTrigger, SceneData, SpawnPoint, SpawnRef, SpawnResolution, TransitionEffect,
};
pub use types::{
    InteractionId, ItemId, ObjectId, ObjectiveId, PortalId, RewardId, SceneId, SessionId, SpawnId,
    Transform,
};
