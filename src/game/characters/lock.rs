// Mutual-exclusion lock with timed auto-release

use crate::engine::{Scheduler, TimerHandle};

use super::events::TimerEvent;

/// Blocks new actions while one is running.
///
/// At most one expiry timer is outstanding at any time. Re-locking cancels the
/// previous timer first, so only the latest lock ever reports expiry.
#[derive(Debug, Default)]
pub struct StateLock {
    locked: bool,
    pending: Option<TimerHandle>,
    duration_ms: Option<u32>,
    detached: bool,
}

impl StateLock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock for `duration_ms`, then deliver `on_expire` through the scheduler
    pub fn lock(
        &mut self,
        timers: &mut Scheduler<TimerEvent>,
        duration_ms: u32,
        on_expire: TimerEvent,
    ) {
        if self.detached {
            return;
        }
        timers.cancel_slot(&mut self.pending);
        self.locked = true;
        self.duration_ms = Some(duration_ms);
        self.pending = Some(timers.schedule(duration_ms, on_expire));
    }

    /// Lock until explicitly released
    pub fn lock_indefinitely(&mut self, timers: &mut Scheduler<TimerEvent>) {
        if self.detached {
            return;
        }
        timers.cancel_slot(&mut self.pending);
        self.locked = true;
        self.duration_ms = None;
    }

    /// Release without reporting expiry
    pub fn unlock(&mut self, timers: &mut Scheduler<TimerEvent>) {
        if self.detached {
            return;
        }
        timers.cancel_slot(&mut self.pending);
        self.locked = false;
        self.duration_ms = None;
    }

    /// Release immediately, e.g. to interrupt a channel mid-lock
    pub fn force_unlock(&mut self, timers: &mut Scheduler<TimerEvent>) {
        if self.locked {
            log::debug!("lock force-released");
        }
        self.unlock(timers);
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// Duration of the current timed lock (None when unlocked or indefinite)
    pub fn duration_ms(&self) -> Option<u32> {
        if self.locked {
            self.duration_ms
        } else {
            None
        }
    }

    /// Time left on the current timed lock
    pub fn remaining_ms(&self, timers: &Scheduler<TimerEvent>) -> Option<u64> {
        self.pending.and_then(|handle| timers.remaining_ms(handle))
    }

    /// Called when a `LockExpired` timer fires.
    ///
    /// Returns true only for the live timer; anything else is stale and ignored.
    pub fn on_expired(&mut self, handle: TimerHandle) -> bool {
        if self.detached || self.pending != Some(handle) {
            return false;
        }
        self.pending = None;
        self.locked = false;
        self.duration_ms = None;
        true
    }

    /// Owner is going away: cancel the timer and ignore all further calls
    pub fn detach(&mut self, timers: &mut Scheduler<TimerEvent>) {
        timers.cancel_slot(&mut self.pending);
        self.locked = false;
        self.detached = true;
    }
}
