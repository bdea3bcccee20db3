use glam::Vec2;
use serde::Serialize;

use playspace_common::TransitionEffect;

use crate::controller::{TransitionPhase, TransitionState};

/// What an overlay renderer should draw this frame.
///
/// `offset` is in screen widths/heights, `dissolve` is the noise threshold
/// below which overlay pixels are visible.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverlayFrame {
    pub opacity: f32,
    pub offset: Vec2,
    pub scale: f32,
    pub dissolve: f32,
    pub color: String,
}

impl OverlayFrame {
    pub fn hidden(color: &str) -> Self {
        Self {
            opacity: 0.0,
            offset: Vec2::ZERO,
            scale: 1.0,
            dissolve: 0.0,
            color: color.to_owned(),
        }
    }

    pub fn from_state(state: &TransitionState) -> Self {
        let coverage = coverage(state.phase, state.progress);
        let mut frame = Self::hidden(&state.color);
        if coverage <= 0.0 {
            return frame;
        }
        let remaining = 1.0 - coverage;
        match state.effect {
            TransitionEffect::Fade | TransitionEffect::Instant => frame.opacity = coverage,
            TransitionEffect::Dissolve => {
                frame.opacity = 1.0;
                frame.dissolve = coverage;
            }
            TransitionEffect::SlideLeft => {
                frame.opacity = 1.0;
                frame.offset = Vec2::new(remaining, 0.0);
            }
            TransitionEffect::SlideRight => {
                frame.opacity = 1.0;
                frame.offset = Vec2::new(-remaining, 0.0);
            }
            TransitionEffect::SlideUp => {
                frame.opacity = 1.0;
                frame.offset = Vec2::new(0.0, -remaining);
            }
            TransitionEffect::SlideDown => {
                frame.opacity = 1.0;
                frame.offset = Vec2::new(0.0, remaining);
            }
            TransitionEffect::Zoom => {
                frame.opacity = coverage;
                frame.scale = coverage;
            }
        }
        frame
    }
}

/// How much of the screen the overlay covers, 0..=1.
fn coverage(phase: TransitionPhase, progress: f32) -> f32 {
    match phase {
        TransitionPhase::FadeOut => progress,
        TransitionPhase::Loading => 1.0,
        TransitionPhase::FadeIn => 1.0 - progress,
        TransitionPhase::Idle | TransitionPhase::Complete => 0.0,
    }
    .clamp(0.0, 1.0)
}
