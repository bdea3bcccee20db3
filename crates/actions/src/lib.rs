//! Action dispatch: turns a fired interaction into state changes and
//! declarative effect requests.
//!
//! # Invariants
//! - Actions apply in authored order, all of them before win evaluation.
//! - Presentation (sound, messages, visibility, haptics) is only ever
//!   requested through [`Effect`] records, never performed here.

mod dispatcher;
mod effect;

pub use dispatcher::{ActionDispatcher, Dispatch, DispatchEvent, DispatchOptions};
pub use effect::Effect;

pub fn crate_info() -> &'static str {
    "playspace-actions v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("actions"));
    }
}
