//! Shared frame timer
//!
//! One [`SharedTimer`] per UI thread owns a single periodic platform timer and
//! fans every tick out to the registered animators. The platform timer only
//! exists while at least one animator has something to animate.
//!
//! # Lifecycle
//!
//! ```text
//! first animator registers  -> platform timer created and started
//! tick                      -> every registered animator advanced, in order
//! last animator unregisters -> platform timer stopped and released
//! ```

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use cadence_platform::{PlatformTimer, TimerCallback, TimerFactory};
use smallvec::SmallVec;
use tracing::{debug, error, trace};

use crate::animator::AnimatorInner;
use crate::config::TimerConfig;

// ============================================================================
// Per-thread Shared Timer
// ============================================================================

thread_local! {
    static SHARED_TIMER: RefCell<Option<SharedTimer>> = const { RefCell::new(None) };
}

/// Install the shared timer for the current thread
///
/// Returns the timer back if one is already installed.
pub fn install_shared_timer(timer: SharedTimer) -> Result<(), SharedTimer> {
    SHARED_TIMER.with(|slot| {
        let mut slot = slot.borrow_mut();
        if slot.is_some() {
            return Err(timer);
        }
        *slot = Some(timer);
        Ok(())
    })
}

/// Get the shared timer of the current thread
///
/// # Panics
///
/// Panics if `install_shared_timer()` has not been called on this thread.
///
/// # Example
///
/// ```
/// use cadence_animation::{install_shared_timer, shared_timer, Animator, SharedTimer};
/// use cadence_platform::RunLoop;
///
/// let run_loop = RunLoop::system();
/// install_shared_timer(SharedTimer::new(run_loop.clone())).unwrap();
///
/// let animator = Animator::new(shared_timer());
/// assert!(animator.is_empty());
/// ```
pub fn shared_timer() -> SharedTimer {
    try_shared_timer()
        .expect("Shared timer not installed. Call install_shared_timer() at startup.")
}

/// Get the shared timer of the current thread, if installed
pub fn try_shared_timer() -> Option<SharedTimer> {
    SHARED_TIMER.with(|slot| slot.borrow().clone())
}

/// Check if a shared timer is installed on the current thread
pub fn is_shared_timer_installed() -> bool {
    SHARED_TIMER.with(|slot| slot.borrow().is_some())
}

// ============================================================================
// Shared Timer
// ============================================================================

struct TimerState {
    /// Registered animators in registration order
    animators: Vec<Weak<AnimatorInner>>,
    /// Unregistered during dispatch, removed after it
    pending_removal: SmallVec<[Weak<AnimatorInner>; 4]>,
    dispatching: bool,
    timer: Option<Box<dyn PlatformTimer>>,
}

struct SharedTimerInner {
    factory: Rc<dyn TimerFactory>,
    config: TimerConfig,
    state: RefCell<TimerState>,
}

impl Drop for SharedTimerInner {
    fn drop(&mut self) {
        if let Some(mut timer) = self.state.get_mut().timer.take() {
            timer.stop();
            debug!("shared timer released");
        }
    }
}

/// Handle to the shared animation timer
///
/// Cloning is cheap; all clones drive the same platform timer.
#[derive(Clone)]
pub struct SharedTimer {
    inner: Rc<SharedTimerInner>,
}

impl SharedTimer {
    /// Create a shared timer ticking at the default frequency
    pub fn new(factory: impl TimerFactory + 'static) -> Self {
        Self::with_config(factory, TimerConfig::default())
    }

    pub fn with_config(factory: impl TimerFactory + 'static, config: TimerConfig) -> Self {
        Self {
            inner: Rc::new(SharedTimerInner {
                factory: Rc::new(factory),
                config,
                state: RefCell::new(TimerState {
                    animators: Vec::new(),
                    pending_removal: SmallVec::new(),
                    dispatching: false,
                    timer: None,
                }),
            }),
        }
    }

    pub fn config(&self) -> TimerConfig {
        self.inner.config
    }

    /// Number of registered animators
    pub fn animator_count(&self) -> usize {
        let state = self.inner.state.borrow();
        state
            .animators
            .iter()
            .filter(|a| a.strong_count() > 0 && !state.pending_removal.iter().any(|p| p.ptr_eq(a)))
            .count()
    }

    /// Whether the platform timer exists and is running
    pub fn is_running(&self) -> bool {
        self.inner
            .state
            .borrow()
            .timer
            .as_ref()
            .is_some_and(|timer| timer.is_running())
    }

    pub(crate) fn register(&self, animator: Weak<AnimatorInner>) {
        let needs_timer = {
            let mut state = self.inner.state.borrow_mut();
            state.pending_removal.retain(|p| !p.ptr_eq(&animator));
            if !state.animators.iter().any(|a| a.ptr_eq(&animator)) {
                state.animators.push(animator);
                debug!(animators = state.animators.len(), "animator registered");
            }
            state.timer.is_none()
        };

        if needs_timer {
            self.start_timer();
        }
    }

    pub(crate) fn unregister(&self, animator: &Weak<AnimatorInner>) {
        let released = {
            let mut state = self.inner.state.borrow_mut();
            if state.dispatching {
                if !state.pending_removal.iter().any(|p| p.ptr_eq(animator)) {
                    state.pending_removal.push(animator.clone());
                }
                return;
            }

            state
                .animators
                .retain(|a| a.strong_count() > 0 && !a.ptr_eq(animator));
            debug!(animators = state.animators.len(), "animator unregistered");
            if state.animators.is_empty() {
                state.timer.take()
            } else {
                None
            }
        };

        Self::release(released);
    }

    /// Advance every registered animator to the current time
    ///
    /// This is what the platform timer runs on every tick. Nested calls are
    /// ignored.
    pub fn dispatch(&self) {
        let animators: Vec<Rc<AnimatorInner>> = {
            let mut state = self.inner.state.borrow_mut();
            if state.dispatching {
                return;
            }
            state.dispatching = true;
            state.animators.iter().filter_map(Weak::upgrade).collect()
        };

        let now_ms = self.inner.factory.now_ms();
        trace!(animators = animators.len(), now_ms, "shared tick");
        for animator in &animators {
            animator.on_tick(now_ms);
        }

        let released = {
            let mut state = self.inner.state.borrow_mut();
            state.dispatching = false;
            let pending = std::mem::take(&mut state.pending_removal);
            state
                .animators
                .retain(|a| a.strong_count() > 0 && !pending.iter().any(|p| p.ptr_eq(a)));
            if state.animators.is_empty() {
                state.timer.take()
            } else {
                None
            }
        };
        drop(animators);

        Self::release(released);
    }

    /// Run one tick now, outside the platform timer
    pub fn tick_now(&self) {
        self.dispatch();
    }

    /// Cancel every animation of every registered animator and release the
    /// platform timer
    ///
    /// Animators stay usable; adding an animation starts the timer again.
    pub fn shutdown(&self) {
        let animators: Vec<Rc<AnimatorInner>> = self
            .inner
            .state
            .borrow()
            .animators
            .iter()
            .filter_map(Weak::upgrade)
            .collect();
        debug!(animators = animators.len(), "shutting down shared timer");

        for animator in &animators {
            animator.cancel_all();
        }

        let released = {
            let mut state = self.inner.state.borrow_mut();
            let remaining = std::mem::take(&mut state.animators);
            for animator in remaining.iter().filter_map(Weak::upgrade) {
                animator.mark_unregistered();
            }
            if state.dispatching {
                state.pending_removal.extend(remaining);
            } else {
                state.pending_removal.clear();
            }
            state.timer.take()
        };
        drop(animators);

        Self::release(released);
    }

    fn start_timer(&self) {
        let weak = Rc::downgrade(&self.inner);
        let callback: TimerCallback = Box::new(move || {
            if let Some(inner) = weak.upgrade() {
                SharedTimer { inner }.dispatch();
            }
        });

        let interval = self.inner.config.interval;
        let created = self
            .inner
            .factory
            .create_timer(interval, callback)
            .and_then(|mut timer| {
                timer.start()?;
                Ok(timer)
            });

        match created {
            Ok(timer) => {
                debug!(interval_ms = interval.as_millis() as u64, "shared timer started");
                let previous = self.inner.state.borrow_mut().timer.replace(timer);
                Self::release(previous);
            }
            Err(err) => {
                error!("Failed to create shared animation timer: {}", err);
            }
        }
    }

    fn release(timer: Option<Box<dyn PlatformTimer>>) {
        if let Some(mut timer) = timer {
            timer.stop();
            debug!("shared timer stopped");
        }
    }
}

impl std::fmt::Debug for SharedTimer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedTimer")
            .field("config", &self.inner.config)
            .field("animators", &self.animator_count())
            .field("running", &self.is_running())
            .finish()
    }
}
