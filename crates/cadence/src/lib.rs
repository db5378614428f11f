//! Cadence
//!
//! Cooperative animation scheduling for retained-mode UI views.
//!
//! # Quick Start
//!
//! ```
//! use std::time::Duration;
//! use cadence::prelude::*;
//!
//! let run_loop = cadence::init()?;
//! let frame = Frame::new(shared_timer());
//! let view = View::new(Rect::new(0.0, 0.0, 100.0, 40.0));
//! frame.attach(&view);
//!
//! frame
//!     .animations(&view)
//!     .add("fade", AlphaValueAnimation::new(0.0), LinearTimingFunction::new(50));
//! run_loop.run_until_idle(Duration::from_secs(2));
//!
//! assert_eq!(view.alpha(), 0.0);
//! # Ok::<(), anyhow::Error>(())
//! ```

pub use cadence_animation;
pub use cadence_core;
pub use cadence_platform;

use anyhow::{bail, Context};
use cadence_animation::{install_shared_timer, is_shared_timer_installed, SharedTimer, TimerConfig};
use cadence_platform::{RunLoop, TimerFactory};

/// Common imports for applications
pub mod prelude {
    pub use cadence_animation::{
        shared_timer, AlphaValueAnimation, AnimationOptions, AnimationTarget, Animator,
        AnimatorHandle, ControlValueAnimation, CubicBezierTimingFunction, FnTarget,
        FnTimingFunction, Frame, InterpolationTimingFunction, LinearTimingFunction,
        PowerTimingFunction, RepeatTimingFunction, SharedTimer, TimerConfig, TimingFunction,
        ViewSizeAnimation,
    };
    pub use cadence_core::{Point, Rect, Size, View, ViewRef};
    pub use cadence_platform::{ManualClock, RunLoop};
}

/// Initialize Cadence on the current thread with the default frame rate
///
/// Creates a real-time [`RunLoop`] and installs a [`SharedTimer`] on it as
/// the thread's shared timer. Drive the returned loop to run animations.
pub fn init() -> anyhow::Result<RunLoop> {
    init_with_config(TimerConfig::default())
}

/// Initialize Cadence on the current thread with a custom timer configuration
pub fn init_with_config(config: TimerConfig) -> anyhow::Result<RunLoop> {
    let run_loop = RunLoop::system();
    install(run_loop.clone(), config)?;
    Ok(run_loop)
}

/// Install a shared timer driven by `factory` on the current thread
pub fn install(factory: impl TimerFactory + 'static, config: TimerConfig) -> anyhow::Result<()> {
    if config.interval.as_millis() == 0 {
        bail!("timer interval must be at least one millisecond");
    }
    if is_shared_timer_installed() {
        bail!("a shared timer is already installed on this thread");
    }

    install_shared_timer(SharedTimer::with_config(factory, config))
        .ok()
        .context("failed to install the shared timer")?;
    tracing::debug!(
        frequency = config.frequency(),
        "cadence initialized"
    );
    Ok(())
}

/// Install a `tracing` subscriber printing to stderr, filtered by `RUST_LOG`
///
/// Does nothing if a global subscriber is already set.
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .try_init();
}
