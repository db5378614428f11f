//! Cadence Animation
//!
//! A cooperative, single-threaded animation scheduler driving property
//! animations of views from one shared frame timer.
//!
//! # Features
//!
//! - **Timing Functions**: linear, power, breakpoint interpolation, cubic
//!   bezier presets, repetition with auto-reverse, custom closures
//! - **Targets**: alpha fades, view resizing, control value sweeps, closures
//! - **Animator**: per-frame registry keyed by (view, name), safe to mutate
//!   from inside any animation callback
//! - **Shared Timer**: one platform timer per thread, alive only while
//!   something animates
//! - **Frames**: owner contexts that cancel a view's animations on detach

mod animation;
pub mod animator;
pub mod config;
pub mod frame;
pub mod shared_timer;
pub mod target;
pub mod targets;
pub mod timing;

#[cfg(test)]
mod test_support;

pub use animation::{AnimationOptions, DoneNotification};
pub use animator::{Animator, AnimatorHandle};
pub use config::{TimerConfig, DEFAULT_FREQUENCY_HZ};
pub use frame::{Frame, ViewAnimations};
pub use shared_timer::{
    install_shared_timer, is_shared_timer_installed, shared_timer, try_shared_timer, SharedTimer,
};
pub use target::{AnimationTarget, FnTarget};
pub use targets::{AlphaValueAnimation, ControlValueAnimation, ViewSizeAnimation};
pub use timing::{
    CubicBezierTimingFunction, FnTimingFunction, InterpolationTimingFunction,
    LinearTimingFunction, PowerTimingFunction, RepeatTimingFunction, TimingFunction,
};

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;
    use crate::test_support::{view, RecordingTarget, Rig};

    /// Opt-in log output: `RUST_LOG=cadence_animation=debug cargo test`
    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    }

    #[test]
    fn test_frame_fade_out_and_resize() {
        init_tracing();
        let rig = Rig::new();
        let frame = Frame::new(rig.timer.clone());
        let view = view();
        frame.attach(&view);

        let done = Rc::new(Cell::new(false));
        let flag = done.clone();
        let animations = frame.animations(&view);
        animations.add_with(
            "fade",
            AlphaValueAnimation::new(0.0),
            CubicBezierTimingFunction::easy_in_out(100),
            AnimationOptions::new().notify(move |_, _, _| flag.set(true)),
        );
        animations.add(
            "size",
            ViewSizeAnimation::new(cadence_core::Rect::new(10.0, 10.0, 40.0, 40.0)),
            PowerTimingFunction::new(100, 2.0),
        );

        rig.advance_ms(200);

        assert!(done.get());
        assert_eq!(view.alpha(), 0.0);
        assert_eq!(view.bounds(), cadence_core::Rect::new(10.0, 10.0, 40.0, 40.0));
        assert!(frame.animator().is_empty());
        assert!(!rig.timer.is_running());
    }

    #[test]
    fn test_chained_animation_from_notification() {
        init_tracing();
        let rig = Rig::new();
        let animator = Animator::new(rig.timer.clone());
        let view = view();

        let handle = animator.handle();
        let owner = Rc::downgrade(&view);
        animator.add_animation(
            &view,
            "out",
            AlphaValueAnimation::new(0.0),
            LinearTimingFunction::new(50),
        );
        animator.add_animation_with(
            &view,
            "trigger",
            RecordingTarget::new(),
            LinearTimingFunction::new(50),
            AnimationOptions::new().notify(move |_, _, _| {
                if let Some(owner) = owner.upgrade() {
                    handle.add_animation(
                        &owner,
                        "in",
                        AlphaValueAnimation::new(1.0),
                        LinearTimingFunction::new(50),
                    );
                }
            }),
        );

        rig.advance_ms(80);
        assert_eq!(view.alpha(), 0.0);
        assert!(animator.contains(&view, "in"));
        assert!(rig.timer.is_running());

        rig.advance_ms(200);
        assert_eq!(view.alpha(), 1.0);
        assert!(animator.is_empty());
        assert_eq!(rig.run_loop.timer_count(), 0);
    }

    #[test]
    fn test_repeat_forever_until_removed() {
        let rig = Rig::new();
        let animator = Animator::new(rig.timer.clone());
        let control = cadence_core::View::control(cadence_core::Rect::ZERO, 0.0);

        animator.add_animation(
            &control,
            "pulse",
            ControlValueAnimation::new(1.0),
            RepeatTimingFunction::forever(LinearTimingFunction::new(64), true),
        );

        rig.advance_ms(10_000);
        assert!(animator.contains(&control, "pulse"));

        animator.remove_animation(&control, "pulse");
        assert!(animator.is_empty());
        assert!(!rig.timer.is_running());
    }
}
