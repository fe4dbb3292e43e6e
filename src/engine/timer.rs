// Delayed-event scheduler driven by the frame clock
//
// Timers carry an event value instead of a closure. The owner pulls due events
// with `pop_due` and dispatches them itself, so nothing can fire into an owner
// that has already been torn down: clearing or dropping the scheduler is enough.

/// Handle to a scheduled timer, used for cancellation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(u64);

impl TimerHandle {
    /// Get the raw id
    pub fn id(&self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone)]
struct PendingTimer<E> {
    handle: TimerHandle,
    due_ms: u64,
    event: E,
}

/// Fire-once timer queue with a millisecond clock
#[derive(Debug, Clone)]
pub struct Scheduler<E> {
    now_ms: u64,
    next_id: u64,
    pending: Vec<PendingTimer<E>>,
}

impl<E> Default for Scheduler<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Scheduler<E> {
    pub fn new() -> Self {
        Self {
            now_ms: 0,
            next_id: 1,
            pending: Vec::with_capacity(8),
        }
    }

    /// Current clock value in milliseconds
    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    /// Schedule `event` to fire once after `delay_ms`
    pub fn schedule(&mut self, delay_ms: u32, event: E) -> TimerHandle {
        let handle = TimerHandle(self.next_id);
        self.next_id += 1;
        self.pending.push(PendingTimer {
            handle,
            due_ms: self.now_ms + u64::from(delay_ms),
            event,
        });
        handle
    }

    /// Cancel a pending timer. Returns false if it already fired or was cancelled.
    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        if let Some(pos) = self.pending.iter().position(|t| t.handle == handle) {
            self.pending.swap_remove(pos);
            true
        } else {
            false
        }
    }

    /// Cancel the timer in `slot` (if any) and leave the slot empty
    pub fn cancel_slot(&mut self, slot: &mut Option<TimerHandle>) {
        if let Some(handle) = slot.take() {
            self.cancel(handle);
        }
    }

    /// Check whether a timer is still waiting to fire
    pub fn is_pending(&self, handle: TimerHandle) -> bool {
        self.pending.iter().any(|t| t.handle == handle)
    }

    /// Milliseconds until a pending timer fires
    pub fn remaining_ms(&self, handle: TimerHandle) -> Option<u64> {
        self.pending
            .iter()
            .find(|t| t.handle == handle)
            .map(|t| t.due_ms.saturating_sub(self.now_ms))
    }

    /// Pop the earliest timer due at or before `until_ms`.
    ///
    /// The clock jumps to the timer's due time before returning, so anything
    /// scheduled while handling the event is timed from the exact expiry.
    /// Timers due at the same instant fire in scheduling order.
    pub fn pop_due(&mut self, until_ms: u64) -> Option<(TimerHandle, E)> {
        let pos = self
            .pending
            .iter()
            .enumerate()
            .filter(|(_, t)| t.due_ms <= until_ms)
            .min_by_key(|(_, t)| (t.due_ms, t.handle))
            .map(|(pos, _)| pos)?;

        let timer = self.pending.swap_remove(pos);
        self.now_ms = self.now_ms.max(timer.due_ms);
        Some((timer.handle, timer.event))
    }

    /// Move the clock forward to `until_ms` after all due timers were popped
    pub fn settle(&mut self, until_ms: u64) {
        self.now_ms = self.now_ms.max(until_ms);
    }

    /// Advance the clock and collect every event that fired, in order.
    ///
    /// Events scheduled by the caller in response are not picked up by this
    /// call; owners that react to events use `pop_due` in a loop instead.
    pub fn advance(&mut self, dt_ms: u32) -> Vec<(TimerHandle, E)> {
        let until = self.now_ms + u64::from(dt_ms);
        let mut fired = Vec::new();
        while let Some(entry) = self.pop_due(until) {
            fired.push(entry);
        }
        self.settle(until);
        fired
    }

    /// Drop every pending timer
    pub fn clear(&mut self) {
        self.pending.clear();
    }

    /// Number of pending timers
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schedule_and_fire() {
        let mut timers = Scheduler::new();
        let handle = timers.schedule(100, "expire");
        assert!(timers.is_pending(handle));

        assert!(timers.advance(99).is_empty());
        let fired = timers.advance(1);
        assert_eq!(fired, vec![(handle, "expire")]);
        assert!(!timers.is_pending(handle));
        assert_eq!(timers.now_ms(), 100);
    }

    #[test]
    fn test_cancel_is_idempotent() {
        let mut timers = Scheduler::new();
        let handle = timers.schedule(50, 1);
        assert!(timers.cancel(handle));
        assert!(!timers.cancel(handle));
        assert!(timers.advance(100).is_empty());
    }

    #[test]
    fn test_cancel_after_fire_is_noop() {
        let mut timers = Scheduler::new();
        let handle = timers.schedule(10, ());
        assert_eq!(timers.advance(10).len(), 1);
        assert!(!timers.cancel(handle));
    }

    #[test]
    fn test_fire_order() {
        let mut timers = Scheduler::new();
        timers.schedule(30, 'c');
        timers.schedule(10, 'a');
        timers.schedule(20, 'b');
        timers.schedule(10, 'd');

        let order: Vec<char> = timers.advance(50).into_iter().map(|(_, e)| e).collect();
        assert_eq!(order, vec!['a', 'd', 'b', 'c']);
    }

    #[test]
    fn test_pop_due_moves_clock_to_expiry() {
        let mut timers = Scheduler::new();
        timers.schedule(100, 1);

        let (_, event) = timers.pop_due(250).unwrap();
        assert_eq!(event, 1);
        assert_eq!(timers.now_ms(), 100);

        // Scheduled from the handler: timed from the expiry, not the frame end
        timers.schedule(150, 2);
        let (_, event) = timers.pop_due(250).unwrap();
        assert_eq!(event, 2);
        assert_eq!(timers.now_ms(), 250);
        assert!(timers.pop_due(250).is_none());
    }

    #[test]
    fn test_remaining_ms() {
        let mut timers = Scheduler::new();
        let handle = timers.schedule(100, ());
        timers.advance(40);
        assert_eq!(timers.remaining_ms(handle), Some(60));
    }

    #[test]
    fn test_cancel_slot() {
        let mut timers = Scheduler::new();
        let mut slot = Some(timers.schedule(10, ()));
        timers.cancel_slot(&mut slot);
        assert!(slot.is_none());
        assert!(timers.is_empty());
        // Empty slot is fine too
        timers.cancel_slot(&mut slot);
    }

    #[test]
    fn test_clear() {
        let mut timers = Scheduler::new();
        timers.schedule(10, ());
        timers.schedule(20, ());
        assert_eq!(timers.len(), 2);
        timers.clear();
        assert!(timers.advance(100).is_empty());
    }
}
