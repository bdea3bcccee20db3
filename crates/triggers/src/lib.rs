//! Trigger evaluation: decides, once per tick, which interactions fire.
//!
//! # Invariants
//! - In-range state is edge-detected against the previous tick, never polled.
//! - Every candidate fire passes the cooldown / max-fire gate before it is
//!   emitted.
//! - Evaluation returns its result; it never mutates session state.
//! - Timer fires travel through a queue drained on the tick thread only.

mod evaluator;
mod ledger;
mod timer;

pub use evaluator::{Evaluation, Fire, FrameView, TriggerEvaluator, TriggerState, TriggerStates};
pub use ledger::{FireLedger, FireRecord, GateDecision, InteractionKey};
pub use timer::{TimerFire, TimerHandle, TimerScheduler};

pub fn crate_info() -> &'static str {
    "playspace-triggers v0.1.0"
}
