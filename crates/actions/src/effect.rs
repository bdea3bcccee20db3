use glam::{Quat, Vec3};
use serde::Serialize;

use playspace_common::{MessageStyle, ObjectId};

/// A presentation request for an external renderer, audio or haptics
/// collaborator.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Effect {
    PlaySound {
        sound: String,
        volume: f32,
        looped: bool,
        /// Where the sound originates (the owning object).
        position: Vec3,
    },
    ShowMessage {
        text: String,
        duration_ms: u32,
        style: MessageStyle,
    },
    ScorePopup {
        points: i64,
        total: i64,
        position: Vec3,
    },
    ShowObject {
        target: ObjectId,
    },
    HideObject {
        target: ObjectId,
    },
    Teleport {
        position: Vec3,
        rotation: Option<Quat>,
    },
    PlayAnimation {
        target: ObjectId,
        animation: String,
        looped: bool,
    },
    EmitParticles {
        effect: String,
        count: u32,
        position: Vec3,
    },
    Vibrate {
        pattern: Vec<u32>,
    },
}

impl Effect {
    /// Short label, handy for logs.
    pub fn label(&self) -> &'static str {
        match self {
            Self::PlaySound { .. } => "play_sound",
            Self::ShowMessage { .. } => "show_message",
            Self::ScorePopup { .. } => "score_popup",
            Self::ShowObject { .. } => "show_object",
            Self::HideObject { .. } => "hide_object",
            Self::Teleport { .. } => "teleport",
            Self::PlayAnimation { .. } => "play_animation",
            Self::EmitParticles { .. } => "emit_particles",
            Self::Vibrate { .. } => "vibrate",
        }
    }
}
