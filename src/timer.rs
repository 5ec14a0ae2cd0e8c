//! One-shot timers with group cancellation
//!
//! Everything here is single-threaded: callbacks are plain `FnOnce()` boxes
//! and shared state lives in `Rc<RefCell<_>>`, matching the browser event
//! loop the site runs on.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::{Rc, Weak};

/// A timer callback
pub type TimerCallback = Box<dyn FnOnce()>;

/// Platform timer source (`setTimeout` on the web, a virtual clock in tests)
pub trait Scheduler {
    type Handle: Copy + fmt::Debug + 'static;

    /// Run `callback` once after `delay_ms`. `None` if the platform refused.
    fn set_timeout(&self, delay_ms: u32, callback: TimerCallback) -> Option<Self::Handle>;

    /// Cancel a pending timer. Unknown or already-fired handles are ignored.
    fn clear_timeout(&self, handle: Self::Handle);
}

struct BatchState<H> {
    /// Bumped by every `cancel_all`; wrappers from an older epoch never run
    epoch: u64,
    next_seq: u64,
    pending: Vec<(u64, H)>,
}

/// A group of timers that can be cancelled together.
///
/// Cloning yields another handle to the same group, so a callback can
/// schedule follow-up work into the batch it was fired from.
pub struct TimerBatch<S: Scheduler> {
    scheduler: S,
    state: Rc<RefCell<BatchState<S::Handle>>>,
}

impl<S: Scheduler + Clone> Clone for TimerBatch<S> {
    fn clone(&self) -> Self {
        Self {
            scheduler: self.scheduler.clone(),
            state: Rc::clone(&self.state),
        }
    }
}

impl<S: Scheduler> TimerBatch<S> {
    pub fn new(scheduler: S) -> Self {
        Self {
            scheduler,
            state: Rc::new(RefCell::new(BatchState {
                epoch: 0,
                next_seq: 0,
                pending: Vec::new(),
            })),
        }
    }

    /// Schedule `callback` after `delay_ms` as part of this batch.
    /// Returns the platform handle, or `None` if the platform refused.
    pub fn schedule(&self, delay_ms: u32, callback: impl FnOnce() + 'static) -> Option<S::Handle> {
        let (seq, epoch) = {
            let mut state = self.state.borrow_mut();
            state.next_seq += 1;
            (state.next_seq, state.epoch)
        };

        let shared = Rc::clone(&self.state);
        let wrapped: TimerCallback = Box::new(move || {
            {
                let mut state = shared.borrow_mut();
                if state.epoch != epoch {
                    return;
                }
                state.pending.retain(|(s, _)| *s != seq);
            }
            callback();
        });

        let handle = self.scheduler.set_timeout(delay_ms, wrapped);
        match handle {
            Some(handle) => self.state.borrow_mut().pending.push((seq, handle)),
            None => log::warn!("timer refused by platform ({} ms)", delay_ms),
        }
        handle
    }

    /// Cancel every pending timer in the batch and empty it
    pub fn cancel_all(&self) {
        let pending = {
            let mut state = self.state.borrow_mut();
            state.epoch += 1;
            std::mem::take(&mut state.pending)
        };
        for (_, handle) in pending {
            self.scheduler.clear_timeout(handle);
        }
    }

    pub fn len(&self) -> usize {
        self.state.borrow().pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Run `apply` on `target` once nothing else has it borrowed, retrying on
/// zero-delay timers. Does nothing if `target` has been dropped.
pub fn apply_when_free<T, S>(target: Weak<RefCell<T>>, scheduler: S, apply: impl FnOnce(&mut T) + 'static)
where
    T: 'static,
    S: Scheduler + Clone + 'static,
{
    let Some(shared) = target.upgrade() else { return };
    let Ok(mut value) = shared.try_borrow_mut() else {
        let retry = scheduler.clone();
        let deferred: TimerCallback = Box::new(move || apply_when_free(target, retry, apply));
        if scheduler.set_timeout(0, deferred).is_none() {
            log::error!("could not defer work on a busy value");
        }
        return;
    };
    apply(&mut *value);
}

struct ManualState {
    now_ms: u64,
    next_id: u64,
    /// (due, id) keeps same-deadline timers in insertion order
    queue: BTreeMap<(u64, u64), TimerCallback>,
}

/// Deterministic virtual-clock scheduler.
///
/// Nothing fires until [`ManualScheduler::advance`] moves the clock.
#[derive(Clone)]
pub struct ManualScheduler {
    state: Rc<RefCell<ManualState>>,
}

impl Default for ManualScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ManualScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("ManualScheduler")
            .field("now_ms", &state.now_ms)
            .field("pending", &state.queue.len())
            .finish()
    }
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self {
            state: Rc::new(RefCell::new(ManualState {
                now_ms: 0,
                next_id: 0,
                queue: BTreeMap::new(),
            })),
        }
    }

    pub fn now_ms(&self) -> u64 {
        self.state.borrow().now_ms
    }

    /// Timers still waiting to fire
    pub fn pending(&self) -> usize {
        self.state.borrow().queue.len()
    }

    /// Move the clock forward, firing everything that comes due.
    /// Returns the number of callbacks run.
    pub fn advance(&self, ms: u64) -> usize {
        let target = self.state.borrow().now_ms + ms;
        let mut fired = 0;

        loop {
            // Release the borrow before running: callbacks may schedule more
            let next = {
                let mut state = self.state.borrow_mut();
                match state.queue.first_key_value() {
                    Some((&(due, _), _)) if due <= target => {
                        state.now_ms = due;
                        state.queue.pop_first()
                    }
                    _ => None,
                }
            };
            let Some((_, callback)) = next else { break };
            callback();
            fired += 1;
        }

        self.state.borrow_mut().now_ms = target;
        fired
    }
}

impl Scheduler for ManualScheduler {
    type Handle = u64;

    fn set_timeout(&self, delay_ms: u32, callback: TimerCallback) -> Option<u64> {
        let mut state = self.state.borrow_mut();
        state.next_id += 1;
        let id = state.next_id;
        let due = state.now_ms + u64::from(delay_ms);
        state.queue.insert((due, id), callback);
        Some(id)
    }

    fn clear_timeout(&self, handle: u64) {
        self.state
            .borrow_mut()
            .queue
            .retain(|&(_, id), _| id != handle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn counter() -> Rc<Cell<u32>> {
        Rc::new(Cell::new(0))
    }

    #[test]
    fn test_fires_in_deadline_order() {
        let clock = ManualScheduler::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        for (delay, tag) in [(30, 'c'), (10, 'a'), (20, 'b'), (10, 'a')] {
            let log = log.clone();
            clock.set_timeout(delay, Box::new(move || log.borrow_mut().push(tag)));
        }

        assert_eq!(clock.advance(15), 2);
        assert_eq!(clock.advance(100), 2);
        assert_eq!(*log.borrow(), vec!['a', 'a', 'b', 'c']);
        assert_eq!(clock.now_ms(), 115);
    }

    #[test]
    fn test_batch_prunes_fired_handles() {
        let clock = ManualScheduler::new();
        let batch = TimerBatch::new(clock.clone());
        let hits = counter();
        for delay in [0, 10, 20] {
            let hits = hits.clone();
            batch.schedule(delay, move || hits.set(hits.get() + 1));
        }
        assert_eq!(batch.len(), 3);

        clock.advance(10);
        assert_eq!(hits.get(), 2);
        assert_eq!(batch.len(), 1);
    }

    #[test]
    fn test_cancel_all_is_total() {
        let clock = ManualScheduler::new();
        let batch = TimerBatch::new(clock.clone());
        let hits = counter();
        for delay in [5, 50, 500] {
            let hits = hits.clone();
            batch.schedule(delay, move || hits.set(hits.get() + 1));
        }

        clock.advance(5);
        assert_eq!(hits.get(), 1);

        batch.cancel_all();
        assert!(batch.is_empty());
        assert_eq!(clock.pending(), 0);

        clock.advance(1_000);
        // The one that already fired stays fired; nothing else runs
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn test_schedule_returns_platform_handle() {
        let clock = ManualScheduler::new();
        let batch = TimerBatch::new(clock.clone());
        let hits = counter();
        let first = {
            let hits = hits.clone();
            batch.schedule(10, move || hits.set(hits.get() + 1))
        };
        let second = {
            let hits = hits.clone();
            batch.schedule(10, move || hits.set(hits.get() + 10))
        };
        let (Some(first), Some(second)) = (first, second) else {
            panic!("manual scheduler never refuses");
        };
        assert_ne!(first, second);

        clock.clear_timeout(first);
        clock.advance(10);
        assert_eq!(hits.get(), 10);
    }

    /// Scheduler that refuses every timer
    #[derive(Clone)]
    struct Refusing;

    impl Scheduler for Refusing {
        type Handle = ();

        fn set_timeout(&self, _delay_ms: u32, _callback: TimerCallback) -> Option<()> {
            None
        }

        fn clear_timeout(&self, _handle: ()) {}
    }

    #[test]
    fn test_refused_timer_is_not_tracked() {
        let batch = TimerBatch::new(Refusing);
        assert_eq!(batch.schedule(5, || {}), None);
        assert!(batch.is_empty());
    }

    #[test]
    fn test_apply_when_free_waits_for_borrow() {
        let clock = ManualScheduler::new();
        let shared = Rc::new(RefCell::new(Vec::new()));

        let held = shared.borrow_mut();
        apply_when_free(Rc::downgrade(&shared), clock.clone(), |v: &mut Vec<u32>| v.push(1));
        assert!(shared.try_borrow().is_err());
        assert_eq!(clock.pending(), 1);
        drop(held);

        clock.advance(0);
        assert_eq!(*shared.borrow(), vec![1]);
        assert_eq!(clock.pending(), 0);

        // Applied at once when free
        apply_when_free(Rc::downgrade(&shared), clock.clone(), |v: &mut Vec<u32>| v.push(2));
        assert_eq!(*shared.borrow(), vec![1, 2]);
    }

    #[test]
    fn test_apply_when_free_drops_for_dead_target() {
        let clock = ManualScheduler::new();
        let shared = Rc::new(RefCell::new(0u32));
        let weak = Rc::downgrade(&shared);
        drop(shared);
        apply_when_free(weak, clock.clone(), |v: &mut u32| *v += 1);
        assert_eq!(clock.pending(), 0);
    }

    #[test]
    fn test_cancel_all_on_empty_batch() {
        let batch = TimerBatch::new(ManualScheduler::new());
        batch.cancel_all();
        batch.cancel_all();
        assert!(batch.is_empty());
    }

    #[test]
    fn test_nested_schedule_joins_batch() {
        let clock = ManualScheduler::new();
        let batch = TimerBatch::new(clock.clone());
        let hits = counter();
        {
            let inner_batch = batch.clone();
            let hits = hits.clone();
            batch.schedule(10, move || {
                hits.set(hits.get() + 1);
                let hits = hits.clone();
                inner_batch.schedule(10, move || hits.set(hits.get() + 10));
            });
        }

        clock.advance(10);
        assert_eq!(hits.get(), 1);
        assert_eq!(batch.len(), 1);

        // Cancelling reaches the follow-up timer too
        batch.cancel_all();
        clock.advance(100);
        assert_eq!(hits.get(), 1);
    }

    /// Scheduler that "loses" clear_timeout calls, like a callback the event
    /// loop has already dequeued when clearTimeout runs.
    #[derive(Clone)]
    struct LeakyClear(ManualScheduler);

    impl Scheduler for LeakyClear {
        type Handle = u64;

        fn set_timeout(&self, delay_ms: u32, callback: TimerCallback) -> Option<u64> {
            self.0.set_timeout(delay_ms, callback)
        }

        fn clear_timeout(&self, _handle: u64) {}
    }

    #[test]
    fn test_epoch_guards_already_queued_callbacks() {
        let clock = ManualScheduler::new();
        let batch = TimerBatch::new(LeakyClear(clock.clone()));
        let hits = counter();
        {
            let hits = hits.clone();
            batch.schedule(10, move || hits.set(hits.get() + 1));
        }

        batch.cancel_all();
        assert_eq!(clock.advance(10), 1);
        assert_eq!(hits.get(), 0);
    }
}
