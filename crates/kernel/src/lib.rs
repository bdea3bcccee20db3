//! Runtime kernel: one [`RuntimeSession`] per play-through, advanced by the
//! host once per frame.
//!
//! # Invariants
//! - Each tick runs trigger evaluation, action dispatch, win/fail evaluation
//!   and navigation in that fixed order, on the calling thread.
//! - Timer fires and click requests are queued and only applied at the start
//!   of a tick.
//! - After [`RuntimeSession::end`] nothing mutates the session again.

mod event;
mod options;
mod session;

pub use event::SessionEvent;
pub use options::{FrameInput, SessionOptions};
pub use session::{RuntimeSession, SessionError, TickStats};
