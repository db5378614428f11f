//! Animation targets
//!
//! A target applies animation progress to a view. The scheduler calls its
//! hooks in a fixed order: [`start`](AnimationTarget::start) once before the
//! first [`tick`](AnimationTarget::tick), then `tick` each time the position
//! changes, then [`finish`](AnimationTarget::finish) exactly once.

use cadence_core::View;

/// Strategy applying normalized progress to a view
pub trait AnimationTarget {
    /// Called once, on the first tick of the animation
    fn start(&mut self, _view: &View, _name: &str) {}

    /// Apply `position` to the view
    ///
    /// Never called twice in a row with the same position.
    fn tick(&mut self, view: &View, name: &str, position: f32);

    /// Called exactly once when the animation ends
    ///
    /// `was_canceled` is `false` when the timing function completed and `true`
    /// when the animation was removed, replaced or torn down first.
    fn finish(&mut self, _view: &View, _name: &str, _was_canceled: bool) {}
}

impl<T: AnimationTarget + ?Sized> AnimationTarget for Box<T> {
    fn start(&mut self, view: &View, name: &str) {
        (**self).start(view, name)
    }

    fn tick(&mut self, view: &View, name: &str, position: f32) {
        (**self).tick(view, name, position)
    }

    fn finish(&mut self, view: &View, name: &str, was_canceled: bool) {
        (**self).finish(view, name, was_canceled)
    }
}

type StartFn = Box<dyn FnMut(&View, &str)>;
type TickFn = Box<dyn FnMut(&View, &str, f32)>;
type FinishFn = Box<dyn FnMut(&View, &str, bool)>;

/// Closure-backed target for ad-hoc animations
///
/// ```
/// use cadence_animation::{AnimationTarget, FnTarget};
/// use cadence_core::{Rect, View};
///
/// let view = View::new(Rect::new(0.0, 0.0, 10.0, 10.0));
/// let mut target = FnTarget::new(|view, _name, pos| view.set_alpha(1.0 - pos));
/// target.tick(&view, "fade", 0.25);
/// assert_eq!(view.alpha(), 0.75);
/// ```
pub struct FnTarget {
    on_start: Option<StartFn>,
    on_tick: TickFn,
    on_finish: Option<FinishFn>,
}

impl FnTarget {
    pub fn new<F>(on_tick: F) -> Self
    where
        F: FnMut(&View, &str, f32) + 'static,
    {
        Self {
            on_start: None,
            on_tick: Box::new(on_tick),
            on_finish: None,
        }
    }

    /// Run `f` when the animation starts
    pub fn on_start<F>(mut self, f: F) -> Self
    where
        F: FnMut(&View, &str) + 'static,
    {
        self.on_start = Some(Box::new(f));
        self
    }

    /// Run `f` when the animation finishes
    pub fn on_finish<F>(mut self, f: F) -> Self
    where
        F: FnMut(&View, &str, bool) + 'static,
    {
        self.on_finish = Some(Box::new(f));
        self
    }
}

impl AnimationTarget for FnTarget {
    fn start(&mut self, view: &View, name: &str) {
        if let Some(f) = self.on_start.as_mut() {
            f(view, name);
        }
    }

    fn tick(&mut self, view: &View, name: &str, position: f32) {
        (self.on_tick)(view, name, position);
    }

    fn finish(&mut self, view: &View, name: &str, was_canceled: bool) {
        if let Some(f) = self.on_finish.as_mut() {
            f(view, name, was_canceled);
        }
    }
}

impl std::fmt::Debug for FnTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnTarget")
            .field("on_start", &self.on_start.is_some())
            .field("on_finish", &self.on_finish.is_some())
            .finish_non_exhaustive()
    }
}
