use glam::Vec3;
use std::collections::BTreeMap;

use playspace_common::{PlacedObject, Trigger, TriggerKind, ZoneEvent, ZoneShape};

use crate::ledger::{FireLedger, GateDecision, InteractionKey};

/// Radius of the implicit collision volume around an object.
const COLLISION_RADIUS: f32 = 0.5;

/// Per-interaction state carried from one tick to the next.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TriggerState {
    pub in_range: bool,
    /// Seconds of continuous gaze (look triggers only).
    pub look_elapsed: f32,
    /// The current gaze already reached the look duration.
    pub look_reached: bool,
}

/// In-range map keyed by interaction. BTreeMap keeps iteration deterministic.
pub type TriggerStates = BTreeMap<InteractionKey, TriggerState>;

/// What the evaluator sees of the player this tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameView {
    pub position: Vec3,
    pub look_direction: Vec3,
    pub delta_time: f32,
    /// Session clock in milliseconds, used for cooldown gating.
    pub now_ms: f64,
}

/// A fire decision: the interaction to dispatch and what caused it.
#[derive(Debug, Clone, PartialEq)]
pub struct Fire {
    pub key: InteractionKey,
    pub source: TriggerKind,
}

/// Output of one evaluation pass, handed back to the caller.
#[derive(Debug, Clone, Default)]
pub struct Evaluation {
    /// Fires in authored order (objects, then interactions).
    pub fires: Vec<Fire>,
    /// The in-range map to pass as `previous` next tick.
    pub states: TriggerStates,
    /// Edges that were gated by cooldown or max-fire limits.
    pub blocked: Vec<(InteractionKey, GateDecision)>,
}

/// Scans every enabled spatial interaction and computes edge-triggered fire
/// decisions. Timer and click triggers are driven elsewhere.
#[derive(Debug, Clone)]
pub struct TriggerEvaluator {
    pub collision_radius: f32,
}

impl Default for TriggerEvaluator {
    fn default() -> Self {
        Self {
            collision_radius: COLLISION_RADIUS,
        }
    }
}

impl TriggerEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Evaluate all interactions against the previous tick's states.
    ///
    /// Fires are only checked against `ledger`, not recorded; the caller
    /// records each fire it dispatches. Disabled interactions keep their
    /// previous state untouched.
    pub fn evaluate(
        &self,
        frame: &FrameView,
        objects: &[PlacedObject],
        previous: &TriggerStates,
        ledger: &FireLedger,
    ) -> Evaluation {
        let _span = tracing::trace_span!("trigger_evaluate").entered();
        let mut out = Evaluation::default();

        for object in objects {
            let target = object.position();
            for interaction in &object.interactions {
                let key = InteractionKey::new(&object.instance_id, &interaction.id);
                let prev = previous.get(&key).copied().unwrap_or_default();

                if !interaction.enabled {
                    if previous.contains_key(&key) {
                        out.states.insert(key, prev);
                    }
                    continue;
                }

                let Some((state, fires)) = self.step(&interaction.trigger, prev, frame, target)
                else {
                    continue;
                };
                out.states.insert(key.clone(), state);

                if !fires {
                    continue;
                }
                match ledger.check(&key, interaction, frame.now_ms) {
                    GateDecision::Allowed => {
                        tracing::debug!(%key, source = ?interaction.trigger.kind(), "trigger fired");
                        out.fires.push(Fire {
                            key,
                            source: interaction.trigger.kind(),
                        });
                    }
                    decision => {
                        tracing::trace!(%key, ?decision, "fire gated");
                        out.blocked.push((key, decision));
                    }
                }
            }
        }

        out
    }

    /// Advance one trigger. Returns the new state and whether it fires, or
    /// `None` for triggers that are not spatially evaluated.
    fn step(
        &self,
        trigger: &Trigger,
        prev: TriggerState,
        frame: &FrameView,
        target: Vec3,
    ) -> Option<(TriggerState, bool)> {
        let distance = frame.position.distance(target);
        let rising = |now: bool| now && !prev.in_range;
        let falling = |now: bool| !now && prev.in_range;

        let result = match *trigger {
            Trigger::Proximity {
                radius,
                on_enter,
                on_exit,
            } => {
                let in_range = distance <= radius;
                let fires = (on_enter && rising(in_range)) || (on_exit && falling(in_range));
                (in_range_state(in_range), fires)
            }
            Trigger::Zone { shape, size, event } => {
                let in_range = zone_contains(shape, size, target, frame.position);
                let fires = match event {
                    ZoneEvent::Enter => rising(in_range),
                    ZoneEvent::Exit => falling(in_range),
                };
                (in_range_state(in_range), fires)
            }
            Trigger::Look { angle, duration } => {
                let in_range = is_looking_at(frame.position, frame.look_direction, target, angle);
                if in_range {
                    let elapsed = prev.look_elapsed + frame.delta_time;
                    let reached_now = elapsed >= duration;
                    let state = TriggerState {
                        in_range,
                        look_elapsed: elapsed,
                        look_reached: prev.look_reached || reached_now,
                    };
                    (state, reached_now && !prev.look_reached)
                } else {
                    (TriggerState::default(), false)
                }
            }
            Trigger::Collision { continuous } => {
                let in_range = distance <= self.collision_radius;
                let fires = rising(in_range) || (continuous && in_range);
                (in_range_state(in_range), fires)
            }
            Trigger::Timer { .. } | Trigger::Click => return None,
        };
        Some(result)
    }
}

fn in_range_state(in_range: bool) -> TriggerState {
    TriggerState {
        in_range,
        ..TriggerState::default()
    }
}

/// Axis-aligned containment test for zone triggers.
fn zone_contains(shape: ZoneShape, size: Vec3, center: Vec3, point: Vec3) -> bool {
    let local = point - center;
    match shape {
        ZoneShape::Box => {
            let half = size * 0.5;
            local.x.abs() <= half.x && local.y.abs() <= half.y && local.z.abs() <= half.z
        }
        ZoneShape::Sphere => local.length() <= size.x * 0.5,
    }
}

/// True when the angle between the look direction and the vector to `target`
/// is within `max_angle_deg`.
fn is_looking_at(eye: Vec3, look_direction: Vec3, target: Vec3, max_angle_deg: f32) -> bool {
    let to_target = target - eye;
    if to_target.length_squared() <= f32::EPSILON || look_direction.length_squared() <= f32::EPSILON
    {
        return false;
    }
    look_direction.angle_between(to_target).to_degrees() <= max_angle_deg
}
