//! Scene transitions: idle → fade_out → loading → fade_in → complete → idle.
//!
//! # Invariants
//! - Every started transition reaches `complete` exactly once unless it is
//!   cancelled, including when the scene loader fails.
//! - Cancelling drops the pending load; its result can never resurface.
//! - The controller never blocks: the loader future is polled once per
//!   update with a no-op waker.

mod controller;
mod loader;
mod overlay;

pub use controller::{
    TransitionConfig, TransitionController, TransitionError, TransitionEvent, TransitionOutcome,
    TransitionPhase, TransitionState,
};
pub use loader::{SceneLoadError, SceneLoader, StaticSceneLoader};
pub use overlay::OverlayFrame;

pub fn crate_info() -> &'static str {
    "playspace-transition v0.1.0"
}
