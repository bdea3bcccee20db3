use std::sync::Arc;
use std::task::{Context, Poll};

use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use futures_util::task::noop_waker_ref;
use serde::{Deserialize, Serialize};

use playspace_common::{SceneData, SceneId, SpawnRef, TransitionEffect};

use crate::loader::{SceneLoadError, SceneLoader};
use crate::overlay::OverlayFrame;

type LoadFuture = BoxFuture<'static, Result<SceneData, SceneLoadError>>;
type CompletionCallback = Box<dyn FnMut(&SceneId, &SpawnRef) + Send>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionPhase {
    #[default]
    Idle,
    FadeOut,
    Loading,
    FadeIn,
    Complete,
}

/// Timing and look of transitions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransitionConfig {
    /// Total fade time; fade out and fade in each take half.
    pub duration_ms: u32,
    /// Time spent in `complete` before returning to idle.
    pub grace_ms: u32,
    /// Overlay color, `#rrggbb`.
    pub color: String,
}

impl Default for TransitionConfig {
    fn default() -> Self {
        Self {
            duration_ms: 500,
            grace_ms: 100,
            color: "#000000".to_owned(),
        }
    }
}

/// Snapshot for overlay rendering.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransitionState {
    pub phase: TransitionPhase,
    /// 0..=1 within the current fade phase.
    pub progress: f32,
    pub effect: TransitionEffect,
    pub color: String,
    pub target: Option<SceneId>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    #[error("a transition to '{target}' is already in progress")]
    Busy { target: SceneId },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TransitionEvent {
    Started {
        scene: SceneId,
        spawn: SpawnRef,
        effect: TransitionEffect,
    },
    PhaseChanged {
        phase: TransitionPhase,
    },
    LoadFailed {
        scene: SceneId,
        error: String,
    },
    Completed {
        scene: SceneId,
        loaded: bool,
    },
    Cancelled {
        scene: SceneId,
    },
}

/// Handed back once, on the update that reaches `complete`.
#[derive(Debug, Clone, PartialEq)]
pub enum TransitionOutcome {
    Loaded { scene: SceneData, spawn: SpawnRef },
    Failed { scene: SceneId, error: SceneLoadError },
}

struct Request {
    scene: SceneId,
    spawn: SpawnRef,
}

pub struct TransitionController {
    config: TransitionConfig,
    loader: Arc<dyn SceneLoader>,
    phase: TransitionPhase,
    effect: TransitionEffect,
    elapsed_ms: f64,
    progress: f32,
    request: Option<Request>,
    pending: Option<LoadFuture>,
    loaded: Option<Result<SceneData, SceneLoadError>>,
    on_complete: Option<CompletionCallback>,
    events: Vec<TransitionEvent>,
    completed: u64,
}

impl TransitionController {
    pub fn new(config: TransitionConfig, loader: Arc<dyn SceneLoader>) -> Self {
        Self {
            config,
            loader,
            phase: TransitionPhase::Idle,
            effect: TransitionEffect::default(),
            elapsed_ms: 0.0,
            progress: 0.0,
            request: None,
            pending: None,
            loaded: None,
            on_complete: None,
            events: Vec::new(),
            completed: 0,
        }
    }

    /// Called with the destination on every successful completion.
    pub fn set_on_complete(&mut self, callback: impl FnMut(&SceneId, &SpawnRef) + Send + 'static) {
        self.on_complete = Some(Box::new(callback));
    }

    pub fn config(&self) -> &TransitionConfig {
        &self.config
    }

    pub fn phase(&self) -> TransitionPhase {
        self.phase
    }

    pub fn is_idle(&self) -> bool {
        self.phase == TransitionPhase::Idle
    }

    /// Number of transitions that reached `complete`.
    pub fn completed_count(&self) -> u64 {
        self.completed
    }

    pub fn state(&self) -> TransitionState {
        TransitionState {
            phase: self.phase,
            progress: self.progress,
            effect: self.effect,
            color: self.config.color.clone(),
            target: self.request.as_ref().map(|r| r.scene.clone()),
        }
    }

    pub fn overlay(&self) -> OverlayFrame {
        OverlayFrame::from_state(&self.state())
    }

    pub fn drain_events(&mut self) -> Vec<TransitionEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn start(
        &mut self,
        scene: SceneId,
        spawn: SpawnRef,
        effect: TransitionEffect,
    ) -> Result<(), TransitionError> {
        if let Some(active) = &self.request {
            return Err(TransitionError::Busy {
                target: active.scene.clone(),
            });
        }
        tracing::info!(%scene, ?effect, "transition started");
        self.events.push(TransitionEvent::Started {
            scene: scene.clone(),
            spawn: spawn.clone(),
            effect,
        });
        self.effect = effect;
        self.request = Some(Request { scene, spawn });
        self.enter(TransitionPhase::FadeOut);
        Ok(())
    }

    /// Abort from any phase. Returns false when already idle.
    pub fn cancel(&mut self) -> bool {
        if self.is_idle() {
            return false;
        }
        self.pending = None;
        self.loaded = None;
        if let Some(request) = self.request.take() {
            tracing::info!(scene = %request.scene, phase = ?self.phase, "transition cancelled");
            self.events.push(TransitionEvent::Cancelled {
                scene: request.scene,
            });
        }
        self.phase = TransitionPhase::Idle;
        self.elapsed_ms = 0.0;
        self.progress = 0.0;
        true
    }

    /// Advance by `delta_ms`. Time left over when a phase finishes carries
    /// into the next one.
    pub fn update(&mut self, delta_ms: f64) -> Option<TransitionOutcome> {
        if self.is_idle() {
            return None;
        }
        let _span = tracing::info_span!("transition_update", phase = ?self.phase).entered();

        let mut remaining = delta_ms.max(0.0);
        let mut outcome = None;
        loop {
            match self.phase {
                TransitionPhase::Idle => break,
                TransitionPhase::FadeOut | TransitionPhase::FadeIn => {
                    let half = self.half_duration();
                    self.elapsed_ms += remaining;
                    if self.elapsed_ms < half {
                        self.progress = (self.elapsed_ms / half) as f32;
                        break;
                    }
                    remaining = self.elapsed_ms - half;
                    if self.phase == TransitionPhase::FadeOut {
                        self.enter(TransitionPhase::Loading);
                    } else {
                        outcome = self.complete();
                    }
                }
                TransitionPhase::Loading => match self.poll_load() {
                    Some(result) => {
                        self.loaded = Some(result);
                        self.enter(TransitionPhase::FadeIn);
                    }
                    None => break,
                },
                TransitionPhase::Complete => {
                    self.elapsed_ms += remaining;
                    if self.elapsed_ms >= f64::from(self.config.grace_ms) {
                        self.request = None;
                        self.enter(TransitionPhase::Idle);
                    }
                    break;
                }
            }
        }
        outcome
    }

    fn half_duration(&self) -> f64 {
        if self.effect == TransitionEffect::Instant {
            0.0
        } else {
            f64::from(self.config.duration_ms) / 2.0
        }
    }

    fn enter(&mut self, phase: TransitionPhase) {
        tracing::debug!(from = ?self.phase, to = ?phase, "transition phase");
        self.phase = phase;
        self.elapsed_ms = 0.0;
        self.progress = 0.0;
        self.events.push(TransitionEvent::PhaseChanged { phase });
        if phase == TransitionPhase::Loading {
            if let Some(request) = &self.request {
                self.pending = Some(self.loader.load(&request.scene));
            }
        }
    }

    fn poll_load(&mut self) -> Option<Result<SceneData, SceneLoadError>> {
        let pending = self.pending.as_mut()?;
        let mut cx = Context::from_waker(noop_waker_ref());
        let result = match pending.poll_unpin(&mut cx) {
            Poll::Ready(result) => result,
            Poll::Pending => return None,
        };
        self.pending = None;
        Some(result.and_then(|scene| {
            if scene.spawn_points.is_empty() {
                Err(SceneLoadError::NoSpawnPoints { scene: scene.id })
            } else {
                Ok(scene)
            }
        }))
    }

    fn complete(&mut self) -> Option<TransitionOutcome> {
        self.enter(TransitionPhase::Complete);
        self.completed += 1;
        let request = self.request.as_ref()?;
        let outcome = match self.loaded.take() {
            Some(Ok(scene)) => {
                if let Some(callback) = self.on_complete.as_mut() {
                    callback(&request.scene, &request.spawn);
                }
                TransitionOutcome::Loaded {
                    scene,
                    spawn: request.spawn.clone(),
                }
            }
            Some(Err(error)) => {
                tracing::warn!(scene = %request.scene, %error, "scene load failed");
                self.events.push(TransitionEvent::LoadFailed {
                    scene: request.scene.clone(),
                    error: error.to_string(),
                });
                TransitionOutcome::Failed {
                    scene: request.scene.clone(),
                    error,
                }
            }
            None => TransitionOutcome::Failed {
                scene: request.scene.clone(),
                error: SceneLoadError::Failed {
                    scene: request.scene.clone(),
                    message: "loader produced no result".to_owned(),
                },
            },
        };
        let loaded = matches!(outcome, TransitionOutcome::Loaded { .. });
        tracing::info!(scene = %request.scene, loaded, "transition complete");
        self.events.push(TransitionEvent::Completed {
            scene: request.scene.clone(),
            loaded,
        });
        Some(outcome)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::loader::StaticSceneLoader;
    use futures_channel::oneshot;
    use glam::Vec3;
    use playspace_common::SpawnPoint;

    type Reply = Result<SceneData, SceneLoadError>;

    fn cave() -> SceneData {
        SceneData::new("cave").with_spawn(SpawnPoint::new("entrance", Vec3::ZERO))
    }

    /// A loader whose single load resolves when the test sends on `tx`.
    fn deferred() -> (Arc<dyn SceneLoader>, oneshot::Sender<Reply>) {
        let (tx, rx) = oneshot::channel::<Reply>();
        let slot = Mutex::new(Some(rx));
        let loader = move |scene: &SceneId| -> LoadFuture {
            let rx = slot.lock().unwrap().take();
            let scene = scene.clone();
            async move {
                match rx {
                    Some(rx) => rx.await.unwrap_or_else(|_| {
                        Err(SceneLoadError::Failed {
                            scene,
                            message: "sender dropped".into(),
                        })
                    }),
                    None => Err(SceneLoadError::UnknownScene { scene }),
                }
            }
            .boxed()
        };
        (Arc::new(loader), tx)
    }

    fn step(controller: &mut TransitionController, ms: f64, times: usize) -> Vec<TransitionOutcome> {
        (0..times).filter_map(|_| controller.update(ms)).collect()
    }

    #[test]
    fn fade_holds_through_slow_load() {
        let (loader, tx) = deferred();
        let mut controller = TransitionController::new(TransitionConfig::default(), loader);
        controller
            .start("cave".into(), SpawnRef::Default, TransitionEffect::Fade)
            .unwrap();

        step(&mut controller, 50.0, 4);
        assert_eq!(controller.phase(), TransitionPhase::FadeOut);
        assert!((controller.overlay().opacity - 0.8).abs() < 1e-6);

        step(&mut controller, 50.0, 1);
        assert_eq!(controller.phase(), TransitionPhase::Loading);
        assert_eq!(controller.overlay().opacity, 1.0);

        // The rest of the 2000ms load.
        assert!(step(&mut controller, 50.0, 35).is_empty());
        assert_eq!(controller.phase(), TransitionPhase::Loading);
        assert_eq!(controller.overlay().opacity, 1.0);

        tx.send(Ok(cave())).unwrap();
        step(&mut controller, 50.0, 1);
        assert_eq!(controller.phase(), TransitionPhase::FadeIn);
        assert!((controller.overlay().opacity - 0.8).abs() < 1e-6);

        let outcomes = step(&mut controller, 50.0, 4);
        assert_eq!(controller.phase(), TransitionPhase::Complete);
        assert_eq!(controller.overlay().opacity, 0.0);
        assert!(matches!(
            outcomes.as_slice(),
            [TransitionOutcome::Loaded { scene, .. }] if scene.id.as_str() == "cave"
        ));

        step(&mut controller, 50.0, 2);
        assert!(controller.is_idle());
        assert_eq!(controller.completed_count(), 1);
    }

    #[test]
    fn failed_load_still_completes_once() {
        let (loader, tx) = deferred();
        let mut controller = TransitionController::new(TransitionConfig::default(), loader);
        let calls = Arc::new(Mutex::new(0));
        let counter = Arc::clone(&calls);
        controller.set_on_complete(move |_, _| *counter.lock().unwrap() += 1);
        controller
            .start("cave".into(), SpawnRef::Default, TransitionEffect::Fade)
            .unwrap();

        step(&mut controller, 100.0, 3);
        tx.send(Err(SceneLoadError::Failed {
            scene: "cave".into(),
            message: "disk on fire".into(),
        }))
        .unwrap();
        let outcomes = step(&mut controller, 100.0, 10);

        assert_eq!(outcomes.len(), 1);
        assert!(matches!(outcomes[0], TransitionOutcome::Failed { .. }));
        assert!(controller.is_idle());
        assert_eq!(controller.completed_count(), 1);
        assert_eq!(*calls.lock().unwrap(), 0);
        let events = controller.drain_events();
        assert!(
            events
                .iter()
                .any(|e| matches!(e, TransitionEvent::LoadFailed { .. }))
        );
        let completed = events
            .iter()
            .filter(|e| matches!(e, TransitionEvent::Completed { loaded: false, .. }))
            .count();
        assert_eq!(completed, 1);
    }

    #[test]
    fn cancel_discards_pending_load() {
        let (loader, tx) = deferred();
        let mut controller = TransitionController::new(TransitionConfig::default(), loader);
        controller
            .start("cave".into(), SpawnRef::Default, TransitionEffect::Fade)
            .unwrap();
        step(&mut controller, 300.0, 1);
        assert_eq!(controller.phase(), TransitionPhase::Loading);

        assert!(controller.cancel());
        assert!(controller.is_idle());
        assert!(!controller.cancel());
        // The receiving side went away with the dropped future.
        assert!(tx.send(Ok(cave())).is_err());
        assert!(step(&mut controller, 100.0, 10).is_empty());
        assert_eq!(controller.completed_count(), 0);
        assert_eq!(controller.overlay().opacity, 0.0);
    }

    #[test]
    fn start_while_busy_is_rejected() {
        let loader = Arc::new(StaticSceneLoader::new([cave()]));
        let mut controller = TransitionController::new(TransitionConfig::default(), loader);
        controller
            .start("cave".into(), SpawnRef::Default, TransitionEffect::Fade)
            .unwrap();
        let err = controller
            .start("hall".into(), SpawnRef::Default, TransitionEffect::Fade)
            .unwrap_err();
        assert_eq!(
            err,
            TransitionError::Busy {
                target: "cave".into()
            }
        );
    }

    #[test]
    fn callback_receives_destination() {
        let loader = Arc::new(StaticSceneLoader::new([cave()]));
        let mut controller = TransitionController::new(TransitionConfig::default(), loader);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        controller.set_on_complete(move |scene, spawn| {
            sink.lock().unwrap().push((scene.clone(), spawn.clone()));
        });
        controller
            .start("cave".into(), "entrance".into(), TransitionEffect::Dissolve)
            .unwrap();
        step(&mut controller, 100.0, 10);
        assert_eq!(
            *seen.lock().unwrap(),
            vec![(SceneId::new("cave"), SpawnRef::from("entrance"))]
        );
    }

    #[test]
    fn instant_completes_in_one_update() {
        let loader = Arc::new(StaticSceneLoader::new([cave()]));
        let mut controller = TransitionController::new(TransitionConfig::default(), loader);
        controller
            .start("cave".into(), SpawnRef::Default, TransitionEffect::Instant)
            .unwrap();
        let outcome = controller.update(0.0);
        assert!(matches!(outcome, Some(TransitionOutcome::Loaded { .. })));
        assert_eq!(controller.phase(), TransitionPhase::Complete);
    }

    #[test]
    fn scene_without_spawns_fails() {
        let loader = Arc::new(StaticSceneLoader::new([SceneData::new("void")]));
        let mut controller = TransitionController::new(TransitionConfig::default(), loader);
        controller
            .start("void".into(), SpawnRef::Default, TransitionEffect::Fade)
            .unwrap();
        let outcomes = step(&mut controller, 100.0, 10);
        assert_eq!(
            outcomes,
            vec![TransitionOutcome::Failed {
                scene: "void".into(),
                error: SceneLoadError::NoSpawnPoints {
                    scene: "void".into()
                }
            }]
        );
    }
}
