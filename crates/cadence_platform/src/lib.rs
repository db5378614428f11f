//! Cadence Platform Abstraction Layer
//!
//! This crate provides the platform collaborators the animation scheduler
//! consumes: a monotonic clock, periodic timers, and a cooperative run loop
//! that fires those timers on the UI thread.
//!
//! # Architecture
//!
//! - [`Clock`] - Millisecond tick source ([`SystemClock`], [`ManualClock`])
//! - [`PlatformTimer`] - A periodic timer owned by exactly one consumer
//! - [`TimerFactory`] - Creates timers and reports the current ticks
//! - [`RunLoop`] - Single-threaded [`TimerFactory`] implementation
//!
//! # Example
//!
//! ```
//! use std::cell::Cell;
//! use std::rc::Rc;
//! use std::time::Duration;
//! use cadence_platform::{RunLoop, TimerFactory};
//!
//! let (run_loop, clock) = RunLoop::manual();
//! let ticks = Rc::new(Cell::new(0));
//! let counter = Rc::clone(&ticks);
//! let mut timer = run_loop
//!     .create_timer(Duration::from_millis(16), Box::new(move || counter.set(counter.get() + 1)))
//!     .unwrap();
//! timer.start().unwrap();
//!
//! run_loop.advance(&clock, Duration::from_millis(48));
//! assert_eq!(ticks.get(), 3);
//! ```

mod clock;
mod error;
mod run_loop;
mod timer;

// Re-export all public types
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{PlatformError, Result};
pub use run_loop::{RunLoop, TimerId};
pub use timer::{PlatformTimer, TimerCallback, TimerFactory};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::clock::{Clock, ManualClock, SystemClock};
    pub use crate::error::{PlatformError, Result};
    pub use crate::run_loop::RunLoop;
    pub use crate::timer::{PlatformTimer, TimerCallback, TimerFactory};
}
