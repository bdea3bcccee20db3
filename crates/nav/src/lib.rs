//! Navigation: which portal is nearby, which portals are unlocked, and when
//! the player goes through one.
//!
//! # Invariants
//! - Unlocking is permanent for the lifetime of the loaded scene's session.
//! - `enter` portals resolve on the rising edge of the entry radius, never
//!   once per tick while the player stands inside.
//! - A resolved entry is reported once; starting the transition is the
//!   caller's job.

mod machine;
mod spawn;

pub use machine::{NavEvent, NavUpdate, NavigationConfig, NavigationStateMachine, PortalEntry};
pub use spawn::{NavError, resolve_spawn};

pub fn crate_info() -> &'static str {
    "playspace-nav v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("nav"));
    }
}
