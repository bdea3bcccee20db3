use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use playspace_actions::DispatchOptions;
use playspace_nav::NavigationConfig;
use playspace_transition::TransitionConfig;

/// Runtime tuning for a session. Every section falls back to its defaults,
/// so a bundle's `runtime:` block only names what it overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionOptions {
    pub navigation: NavigationConfig,
    pub transition: TransitionConfig,
    pub dispatch: DispatchOptions,
    /// Radius within which collision triggers count as touching.
    pub collision_radius: f32,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            navigation: NavigationConfig::default(),
            transition: TransitionConfig::default(),
            dispatch: DispatchOptions::default(),
            collision_radius: 0.5,
        }
    }
}

/// What the host knows about the player this frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrameInput {
    pub position: Vec3,
    #[serde(default)]
    pub rotation: Quat,
    /// Seconds since the previous frame.
    pub delta_time: f32,
}

impl FrameInput {
    pub fn new(position: Vec3, delta_time: f32) -> Self {
        Self {
            position,
            rotation: Quat::IDENTITY,
            delta_time,
        }
    }

    pub fn with_rotation(mut self, rotation: Quat) -> Self {
        self.rotation = rotation;
        self
    }

    /// Look direction derived from the rotation (forward is -Z).
    pub fn look_direction(&self) -> Vec3 {
        self.rotation * Vec3::NEG_Z
    }
}
