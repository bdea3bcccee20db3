use crossbeam_channel::{Receiver, Sender};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use playspace_common::{PlacedObject, SessionId, Trigger};

use crate::ledger::InteractionKey;

/// A queued timer fire. Fires never touch session state directly; they wait
/// in the queue until the tick thread drains them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimerFire {
    pub session: SessionId,
    pub key: InteractionKey,
    /// Scheduler generation at enqueue time; a mismatch marks the fire stale.
    pub generation: u64,
    /// Fired by the built-in clock rather than through a [`TimerHandle`].
    pub scheduled: bool,
}

#[derive(Debug, Clone)]
struct TimerSlot {
    delay: f32,
    /// Fires left; `None` repeats forever.
    remaining: Option<u32>,
    elapsed: f32,
}

/// Cloneable, `Send` handle that lets a host fire timers from any thread.
///
/// After the owning session ends every fire is a no-op.
#[derive(Debug, Clone)]
pub struct TimerHandle {
    session: SessionId,
    tx: Sender<TimerFire>,
    generation: Arc<AtomicU64>,
    closed: Arc<AtomicBool>,
}

impl TimerHandle {
    /// Enqueue a fire for `key`. Returns false when the session has ended.
    pub fn fire(&self, key: InteractionKey) -> bool {
        if self.closed.load(Ordering::Acquire) {
            return false;
        }
        let fire = TimerFire {
            session: self.session,
            key,
            generation: self.generation.load(Ordering::Acquire),
            scheduled: false,
        };
        self.tx.send(fire).is_ok()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

/// One-shot and repeating timers feeding fires into the tick boundary.
///
/// `advance` runs the built-in clock and enqueues due fires; `drain` hands
/// back every still-valid fire in arrival order.
#[derive(Debug)]
pub struct TimerScheduler {
    session: SessionId,
    timers: BTreeMap<InteractionKey, TimerSlot>,
    tx: Sender<TimerFire>,
    rx: Receiver<TimerFire>,
    generation: Arc<AtomicU64>,
    closed: Arc<AtomicBool>,
}

impl TimerScheduler {
    pub fn new(session: SessionId) -> Self {
        let (tx, rx) = crossbeam_channel::unbounded();
        Self {
            session,
            timers: BTreeMap::new(),
            tx,
            rx,
            generation: Arc::new(AtomicU64::new(0)),
            closed: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn handle(&self) -> TimerHandle {
        TimerHandle {
            session: self.session,
            tx: self.tx.clone(),
            generation: Arc::clone(&self.generation),
            closed: Arc::clone(&self.closed),
        }
    }

    /// Arm a timer for every enabled timer interaction on `objects`.
    /// Returns the number of timers armed.
    pub fn arm_scene(&mut self, objects: &[PlacedObject]) -> usize {
        let mut armed = 0;
        for object in objects {
            for interaction in object.interactions.iter().filter(|i| i.enabled) {
                if let Trigger::Timer {
                    delay,
                    repeat,
                    repeat_count,
                } = interaction.trigger
                {
                    let key = InteractionKey::new(&object.instance_id, &interaction.id);
                    self.arm(key, delay, repeat, repeat_count);
                    armed += 1;
                }
            }
        }
        armed
    }

    /// Arm (or re-arm) one timer. A repeat count of zero is unbounded.
    pub fn arm(&mut self, key: InteractionKey, delay: f32, repeat: bool, repeat_count: Option<u32>) {
        if self.is_closed() {
            return;
        }
        let remaining = if repeat {
            repeat_count.filter(|&n| n > 0)
        } else {
            Some(1)
        };
        tracing::trace!(%key, delay, repeat, ?remaining, "timer armed");
        self.timers.insert(
            key,
            TimerSlot {
                delay: delay.max(0.0),
                remaining,
                elapsed: 0.0,
            },
        );
    }

    /// Stop one timer. Fires it already queued are still delivered.
    pub fn cancel(&mut self, key: &InteractionKey) -> bool {
        self.timers.remove(key).is_some()
    }

    /// Cancel every timer and invalidate everything already queued.
    pub fn cancel_all(&mut self) {
        self.timers.clear();
        self.generation.fetch_add(1, Ordering::AcqRel);
        while self.rx.try_recv().is_ok() {}
    }

    /// Cancel everything and refuse all further fires.
    pub fn shutdown(&mut self) {
        self.closed.store(true, Ordering::Release);
        self.cancel_all();
        tracing::debug!(session = %self.session, "timer scheduler shut down");
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    pub fn active_count(&self) -> usize {
        self.timers.len()
    }

    /// Run the built-in clock by `dt` seconds and enqueue due fires.
    /// Returns the number of fires enqueued.
    pub fn advance(&mut self, dt: f32) -> usize {
        if self.is_closed() {
            return 0;
        }
        let generation = self.generation.load(Ordering::Acquire);
        let mut due = Vec::new();
        let mut finished = Vec::new();

        for (key, slot) in self.timers.iter_mut() {
            slot.elapsed += dt;
            loop {
                if slot.elapsed < slot.delay {
                    break;
                }
                slot.elapsed -= slot.delay;
                due.push(key.clone());
                if let Some(remaining) = slot.remaining.as_mut() {
                    *remaining -= 1;
                    if *remaining == 0 {
                        finished.push(key.clone());
                        break;
                    }
                }
                // A zero delay fires at most once per advance.
                if slot.delay <= 0.0 {
                    slot.elapsed = 0.0;
                    break;
                }
            }
        }

        for key in finished {
            self.timers.remove(&key);
        }
        let count = due.len();
        for key in due {
            let fire = TimerFire {
                session: self.session,
                key,
                generation,
                scheduled: true,
            };
            if self.tx.send(fire).is_err() {
                tracing::warn!("timer queue disconnected");
            }
        }
        count
    }

    /// Drain all valid fires. Stale fires (other session, older generation,
    /// after shutdown) are dropped silently.
    pub fn drain(&mut self) -> Vec<InteractionKey> {
        let closed = self.is_closed();
        let generation = self.generation.load(Ordering::Acquire);
        let mut keys = Vec::new();
        while let Ok(fire) = self.rx.try_recv() {
            if closed || fire.session != self.session || fire.generation != generation {
                tracing::trace!(key = %fire.key, "dropping stale timer fire");
                continue;
            }
            keys.push(fire.key);
        }
        keys
    }
}

impl Drop for TimerScheduler {
    fn drop(&mut self) {
        self.closed.store(true, Ordering::Release);
    }
}
