//! Periodic timer abstraction
//!
//! A platform hands out periodic timers through a [`TimerFactory`]. Timers are
//! created stopped, fire their callback every interval once started, and are
//! released by dropping the returned box.

use std::time::Duration;

use crate::error::Result;

/// Callback run every time a periodic timer fires
pub type TimerCallback = Box<dyn FnMut()>;

/// A periodic timer owned by exactly one consumer
pub trait PlatformTimer {
    /// Start (or restart) firing, the first time one interval from now
    fn start(&mut self) -> Result<()>;

    /// Stop firing. The timer can be started again.
    fn stop(&mut self);

    /// Whether the timer is currently scheduled
    fn is_running(&self) -> bool;

    /// The firing interval
    fn interval(&self) -> Duration;
}

/// Source of periodic timers and of the tick count they are measured in
pub trait TimerFactory {
    /// Create a stopped periodic timer
    fn create_timer(
        &self,
        interval: Duration,
        callback: TimerCallback,
    ) -> Result<Box<dyn PlatformTimer>>;

    /// Current platform ticks in milliseconds
    fn now_ms(&self) -> u64;
}
