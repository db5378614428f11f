//! Cooperative single-threaded run loop
//!
//! The run loop hosts every periodic timer of one UI thread. It never spawns
//! threads: timers fire from [`RunLoop::poll`], which the embedding event loop
//! calls, or from the helpers that drive time themselves:
//!
//! - [`RunLoop::advance`] steps a [`ManualClock`] from deadline to deadline,
//!   which makes animation tests fully deterministic
//! - [`RunLoop::run_for`] sleeps between deadlines in real time
//!
//! Callbacks run with no internal borrow held, so a callback may create,
//! stop or drop timers, including the one currently firing.

use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::thread;
use std::time::Duration;

use slotmap::{new_key_type, SlotMap};

use crate::clock::{Clock, ManualClock, SystemClock};
use crate::error::{PlatformError, Result};
use crate::timer::{PlatformTimer, TimerCallback, TimerFactory};

new_key_type! {
    /// Handle to a timer registered with a run loop
    pub struct TimerId;
}

struct TimerSlot {
    interval_ms: u64,
    /// Next deadline, `None` while stopped
    next_fire: Option<u64>,
    /// Taken out while the callback runs
    callback: Option<TimerCallback>,
}

struct RunLoopInner {
    clock: Rc<dyn Clock>,
    timers: RefCell<SlotMap<TimerId, TimerSlot>>,
}

/// A single-threaded host for periodic timers
///
/// Cloning is cheap and yields another handle to the same loop.
#[derive(Clone)]
pub struct RunLoop {
    inner: Rc<RunLoopInner>,
}

impl RunLoop {
    /// Create a run loop reading time from `clock`
    pub fn new(clock: impl Clock + 'static) -> Self {
        Self {
            inner: Rc::new(RunLoopInner {
                clock: Rc::new(clock),
                timers: RefCell::new(SlotMap::with_key()),
            }),
        }
    }

    /// Create a run loop driven by the wall clock
    pub fn system() -> Self {
        Self::new(SystemClock::new())
    }

    /// Create a run loop on a fresh manual clock, returning both
    pub fn manual() -> (Self, ManualClock) {
        let clock = ManualClock::new();
        (Self::new(clock.clone()), clock)
    }

    /// Current time of the loop's clock
    pub fn now_ms(&self) -> u64 {
        self.inner.clock.now_ms()
    }

    /// Number of timers alive on this loop, running or stopped
    pub fn timer_count(&self) -> usize {
        self.inner.timers.borrow().len()
    }

    /// Number of timers currently scheduled to fire
    pub fn running_timer_count(&self) -> usize {
        self.inner
            .timers
            .borrow()
            .values()
            .filter(|slot| slot.next_fire.is_some())
            .count()
    }

    /// Earliest deadline among running timers
    pub fn next_deadline(&self) -> Option<u64> {
        self.inner
            .timers
            .borrow()
            .values()
            .filter_map(|slot| slot.next_fire)
            .min()
    }

    /// Fire every timer whose deadline has passed, once each
    ///
    /// Returns the number of callbacks run.
    pub fn poll(&self) -> usize {
        let now = self.now_ms();

        let mut due: Vec<(u64, TimerId)> = self
            .inner
            .timers
            .borrow()
            .iter()
            .filter_map(|(id, slot)| match slot.next_fire {
                Some(deadline) if deadline <= now => Some((deadline, id)),
                _ => None,
            })
            .collect();
        due.sort_by_key(|(deadline, _)| *deadline);

        let mut fired = 0;
        for (_, id) in due {
            // An earlier callback in this pass may have stopped or dropped it
            let callback = {
                let mut timers = self.inner.timers.borrow_mut();
                let Some(slot) = timers.get_mut(id) else {
                    continue;
                };
                let Some(deadline) = slot.next_fire else {
                    continue;
                };
                if deadline > now {
                    continue;
                }
                // Missed intervals are coalesced into a single firing
                let mut next = deadline + slot.interval_ms;
                if next <= now {
                    next = now + slot.interval_ms;
                }
                slot.next_fire = Some(next);
                slot.callback.take()
            };

            let Some(mut callback) = callback else {
                continue;
            };
            callback();
            fired += 1;

            let mut timers = self.inner.timers.borrow_mut();
            if let Some(slot) = timers.get_mut(id) {
                if slot.callback.is_none() {
                    slot.callback = Some(callback);
                }
            }
        }
        fired
    }

    /// Advance a manual clock by `by`, firing timers at each deadline on the way
    ///
    /// `clock` must be the clock this loop was created with.
    pub fn advance(&self, clock: &ManualClock, by: Duration) -> usize {
        let target = clock.now_ms().saturating_add(by.as_millis() as u64);
        let mut fired = 0;
        while let Some(deadline) = self.next_deadline() {
            if deadline > target {
                break;
            }
            clock.set_ms(deadline);
            fired += self.poll();
        }
        clock.set_ms(target);
        fired
    }

    /// Run in real time for `duration`, sleeping between deadlines
    pub fn run_for(&self, duration: Duration) -> usize {
        let end = self.now_ms().saturating_add(duration.as_millis() as u64);
        let mut fired = 0;
        loop {
            fired += self.poll();
            let now = self.now_ms();
            if now >= end {
                break;
            }
            let wake = self.next_deadline().map_or(end, |deadline| deadline.min(end));
            thread::sleep(Duration::from_millis(wake.saturating_sub(now).max(1)));
        }
        fired
    }

    /// Run in real time until no timer is running, or `limit` elapses
    pub fn run_until_idle(&self, limit: Duration) -> usize {
        let end = self.now_ms().saturating_add(limit.as_millis() as u64);
        let mut fired = 0;
        while let Some(deadline) = self.next_deadline() {
            let now = self.now_ms();
            if now >= end {
                break;
            }
            let wake = deadline.min(end);
            if wake > now {
                thread::sleep(Duration::from_millis(wake - now));
            }
            fired += self.poll();
        }
        fired
    }
}

impl TimerFactory for RunLoop {
    fn create_timer(
        &self,
        interval: Duration,
        callback: TimerCallback,
    ) -> Result<Box<dyn PlatformTimer>> {
        let interval_ms = interval.as_millis() as u64;
        if interval_ms == 0 {
            return Err(PlatformError::InvalidInterval(interval));
        }

        let id = self.inner.timers.borrow_mut().insert(TimerSlot {
            interval_ms,
            next_fire: None,
            callback: Some(callback),
        });
        tracing::trace!("RunLoop: timer {:?} created ({} ms)", id, interval_ms);

        Ok(Box::new(LoopTimer {
            id,
            interval,
            run_loop: Rc::downgrade(&self.inner),
        }))
    }

    fn now_ms(&self) -> u64 {
        RunLoop::now_ms(self)
    }
}

/// A periodic timer living on a [`RunLoop`]
///
/// Dropping it removes the timer from the loop.
struct LoopTimer {
    id: TimerId,
    interval: Duration,
    run_loop: Weak<RunLoopInner>,
}

impl PlatformTimer for LoopTimer {
    fn start(&mut self) -> Result<()> {
        let inner = self
            .run_loop
            .upgrade()
            .ok_or_else(|| PlatformError::Unavailable("run loop dropped".to_string()))?;
        let now = inner.clock.now_ms();
        let mut timers = inner.timers.borrow_mut();
        let slot = timers
            .get_mut(self.id)
            .ok_or_else(|| PlatformError::Other(format!("timer {:?} vanished", self.id)))?;
        slot.next_fire = Some(now + slot.interval_ms);
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(inner) = self.run_loop.upgrade() {
            if let Some(slot) = inner.timers.borrow_mut().get_mut(self.id) {
                slot.next_fire = None;
            }
        }
    }

    fn is_running(&self) -> bool {
        self.run_loop
            .upgrade()
            .and_then(|inner| {
                inner
                    .timers
                    .borrow()
                    .get(self.id)
                    .map(|slot| slot.next_fire.is_some())
            })
            .unwrap_or(false)
    }

    fn interval(&self) -> Duration {
        self.interval
    }
}

impl Drop for LoopTimer {
    fn drop(&mut self) {
        if let Some(inner) = self.run_loop.upgrade() {
            // The slot (and its callback) must not be dropped inside the borrow:
            // a callback may own handles whose Drop touches this loop again.
            let removed = inner.timers.borrow_mut().remove(self.id);
            drop(removed);
            tracing::trace!("RunLoop: timer {:?} released", self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};

    fn counting_timer(run_loop: &RunLoop, interval_ms: u64) -> (Box<dyn PlatformTimer>, Rc<Cell<u32>>) {
        let count = Rc::new(Cell::new(0));
        let counter = Rc::clone(&count);
        let timer = run_loop
            .create_timer(
                Duration::from_millis(interval_ms),
                Box::new(move || counter.set(counter.get() + 1)),
            )
            .unwrap();
        (timer, count)
    }

    #[test]
    fn test_timer_created_stopped() {
        let (run_loop, clock) = RunLoop::manual();
        let (timer, count) = counting_timer(&run_loop, 16);

        assert!(!timer.is_running());
        assert_eq!(run_loop.timer_count(), 1);
        assert_eq!(run_loop.running_timer_count(), 0);

        run_loop.advance(&clock, Duration::from_millis(100));
        assert_eq!(count.get(), 0);
    }

    #[test]
    fn test_timer_fires_at_interval() {
        let (run_loop, clock) = RunLoop::manual();
        let (mut timer, count) = counting_timer(&run_loop, 16);
        timer.start().unwrap();

        run_loop.advance(&clock, Duration::from_millis(15));
        assert_eq!(count.get(), 0);

        run_loop.advance(&clock, Duration::from_millis(1));
        assert_eq!(count.get(), 1);

        run_loop.advance(&clock, Duration::from_millis(64));
        assert_eq!(count.get(), 5);
        assert_eq!(clock.now_ms(), 80);
    }

    #[test]
    fn test_missed_intervals_coalesce() {
        let (run_loop, clock) = RunLoop::manual();
        let (mut timer, count) = counting_timer(&run_loop, 10);
        timer.start().unwrap();

        // Jump far ahead without stepping through the deadlines
        clock.advance_ms(95);
        assert_eq!(run_loop.poll(), 1);
        assert_eq!(count.get(), 1);
        assert_eq!(run_loop.next_deadline(), Some(105));
    }

    #[test]
    fn test_stop_and_drop() {
        let (run_loop, clock) = RunLoop::manual();
        let (mut timer, count) = counting_timer(&run_loop, 10);
        timer.start().unwrap();
        run_loop.advance(&clock, Duration::from_millis(10));
        assert_eq!(count.get(), 1);

        timer.stop();
        assert!(!timer.is_running());
        run_loop.advance(&clock, Duration::from_millis(50));
        assert_eq!(count.get(), 1);

        drop(timer);
        assert_eq!(run_loop.timer_count(), 0);
    }

    #[test]
    fn test_zero_interval_rejected() {
        let run_loop = RunLoop::system();
        let result = run_loop.create_timer(Duration::ZERO, Box::new(|| {}));
        assert!(matches!(result, Err(PlatformError::InvalidInterval(_))));
    }

    #[test]
    fn test_callback_may_drop_its_own_timer() {
        let (run_loop, clock) = RunLoop::manual();
        let slot: Rc<RefCell<Option<Box<dyn PlatformTimer>>>> = Rc::new(RefCell::new(None));
        let fired = Rc::new(Cell::new(0));

        let timer = {
            let slot = Rc::clone(&slot);
            let fired = Rc::clone(&fired);
            run_loop
                .create_timer(
                    Duration::from_millis(16),
                    Box::new(move || {
                        fired.set(fired.get() + 1);
                        slot.borrow_mut().take();
                    }),
                )
                .unwrap()
        };
        *slot.borrow_mut() = Some(timer);
        if let Some(timer) = slot.borrow_mut().as_mut() {
            timer.start().unwrap();
        }

        run_loop.advance(&clock, Duration::from_millis(100));
        assert_eq!(fired.get(), 1);
        assert_eq!(run_loop.timer_count(), 0);
    }

    #[test]
    fn test_callback_may_create_timers() {
        let (run_loop, clock) = RunLoop::manual();
        let spawned: Rc<RefCell<Vec<Box<dyn PlatformTimer>>>> = Rc::new(RefCell::new(Vec::new()));

        let mut timer = {
            let spawned = Rc::clone(&spawned);
            let handle = run_loop.clone();
            run_loop
                .create_timer(
                    Duration::from_millis(10),
                    Box::new(move || {
                        let child = handle
                            .create_timer(Duration::from_millis(10), Box::new(|| {}))
                            .unwrap();
                        spawned.borrow_mut().push(child);
                    }),
                )
                .unwrap()
        };
        timer.start().unwrap();

        run_loop.advance(&clock, Duration::from_millis(30));
        assert_eq!(spawned.borrow().len(), 3);
        assert_eq!(run_loop.timer_count(), 4);
    }

    #[test]
    fn test_timer_outliving_loop() {
        let (run_loop, _clock) = RunLoop::manual();
        let (mut timer, _count) = counting_timer(&run_loop, 10);
        drop(run_loop);

        assert!(matches!(timer.start(), Err(PlatformError::Unavailable(_))));
        assert!(!timer.is_running());
    }
}
