//! Scripted input for `simulate`: a list of frames fed to a session in order.

use anyhow::Context;
use glam::{Quat, Vec3};
use serde::Deserialize;
use std::path::Path;

use playspace_common::ObjectId;
use playspace_content::Format;
use playspace_kernel::{FrameInput, RuntimeSession};

fn default_dt() -> f32 {
    1.0 / 60.0
}

fn default_repeat() -> u32 {
    1
}

/// Host-side control applied before a frame's first tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Control {
    Pause,
    Resume,
    Reset,
    End,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ScriptFrame {
    /// Player position; the session's current position is kept when absent.
    #[serde(default)]
    pub position: Option<Vec3>,
    #[serde(default)]
    pub rotation: Option<Quat>,
    #[serde(default = "default_dt")]
    pub dt: f32,
    /// Number of ticks this frame is held for.
    #[serde(default = "default_repeat")]
    pub repeat: u32,
    #[serde(default)]
    pub click: Option<ObjectId>,
    /// Request entry into the nearby portal.
    #[serde(default)]
    pub interact: bool,
    #[serde(default)]
    pub control: Option<Control>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Script {
    pub frames: Vec<ScriptFrame>,
}

impl Script {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading script {}", path.display()))?;
        let script = match Format::from_path(path)? {
            Format::Yaml => serde_yaml::from_str(&text)?,
            Format::Json => serde_json::from_str(&text)?,
        };
        Ok(script)
    }

    pub fn ticks(&self) -> u64 {
        self.frames.iter().map(|f| u64::from(f.repeat)).sum()
    }

    /// Drive `session` through every frame, handing each tick's index to
    /// `on_tick` after it ran. Stops early once the session has ended.
    pub fn run(
        &self,
        session: &mut RuntimeSession,
        mut on_tick: impl FnMut(u64, &mut RuntimeSession),
    ) {
        let mut tick = 0;
        for frame in &self.frames {
            if session.is_ended() {
                break;
            }
            match frame.control {
                Some(Control::Pause) => {
                    session.pause();
                }
                Some(Control::Resume) => {
                    session.resume();
                }
                Some(Control::Reset) => {
                    session.reset();
                }
                Some(Control::End) => {
                    session.end();
                }
                None => {}
            }
            if let Some(object) = &frame.click {
                if !session.click(object.clone()) {
                    tracing::debug!(%object, "click ignored");
                }
            }
            if frame.interact && !session.request_portal_entry() {
                tracing::debug!("no portal to interact with");
            }
            for _ in 0..frame.repeat {
                // Unset fields follow the session, so teleports and scene
                // entries stick.
                let state = session.state();
                let position = frame.position.unwrap_or(state.position);
                let rotation = frame.rotation.unwrap_or(state.rotation);
                session.tick(FrameInput::new(position, frame.dt).with_rotation(rotation));
                tick += 1;
                on_tick(tick, session);
            }
        }
    }
}
