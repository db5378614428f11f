//! Frames: the owner context of an animator
//!
//! A [`Frame`] stands for a top-level window. Views attached to it animate
//! through its lazily created [`Animator`]; detaching a view cancels its
//! animations so nothing keeps running on a view that left the window.
//!
//! ```
//! use std::time::Duration;
//! use cadence_animation::{AlphaValueAnimation, Frame, LinearTimingFunction, SharedTimer};
//! use cadence_core::{Rect, View};
//! use cadence_platform::RunLoop;
//!
//! let (run_loop, clock) = RunLoop::manual();
//! let frame = Frame::new(SharedTimer::new(run_loop.clone()));
//! let view = View::new(Rect::new(0.0, 0.0, 20.0, 20.0));
//! frame.attach(&view);
//!
//! frame
//!     .animations(&view)
//!     .add("fade", AlphaValueAnimation::new(0.0), LinearTimingFunction::new(50));
//! run_loop.advance(&clock, Duration::from_millis(100));
//! assert_eq!(view.alpha(), 0.0);
//! ```

use std::cell::{OnceCell, RefCell};
use std::rc::{Rc, Weak};

use cadence_core::{View, ViewRef};
use tracing::{debug, warn};

use crate::animation::AnimationOptions;
use crate::animator::Animator;
use crate::shared_timer::SharedTimer;
use crate::target::AnimationTarget;
use crate::timing::TimingFunction;

/// Top-level owner context holding an animator and its attached views
pub struct Frame {
    timer: SharedTimer,
    animator: OnceCell<Animator>,
    views: RefCell<Vec<Weak<View>>>,
}

impl Frame {
    pub fn new(timer: SharedTimer) -> Self {
        Self {
            timer,
            animator: OnceCell::new(),
            views: RefCell::new(Vec::new()),
        }
    }

    /// The frame's animator, created on first use
    pub fn animator(&self) -> &Animator {
        self.animator
            .get_or_init(|| Animator::new(self.timer.clone()))
    }

    pub fn attach(&self, view: &ViewRef) {
        let mut views = self.views.borrow_mut();
        views.retain(|v| v.strong_count() > 0);
        if !views.iter().any(|v| std::ptr::eq(v.as_ptr(), Rc::as_ptr(view))) {
            views.push(Rc::downgrade(view));
            debug!(view = %view.id(), "view attached");
        }
    }

    /// Detach `view`, canceling its animations
    pub fn detach(&self, view: &View) {
        let removed = {
            let mut views = self.views.borrow_mut();
            let before = views.len();
            views.retain(|v| v.strong_count() > 0 && !std::ptr::eq(v.as_ptr(), view));
            views.len() != before
        };
        if removed {
            debug!(view = %view.id(), "view detached");
            if let Some(animator) = self.animator.get() {
                animator.remove_animations(view);
            }
        }
    }

    pub fn is_attached(&self, view: &View) -> bool {
        self.views
            .borrow()
            .iter()
            .any(|v| v.strong_count() > 0 && std::ptr::eq(v.as_ptr(), view))
    }

    /// Animation API for one attached view
    pub fn animations<'a>(&'a self, view: &'a ViewRef) -> ViewAnimations<'a> {
        ViewAnimations { frame: self, view }
    }
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame")
            .field("views", &self.views.borrow().len())
            .field("animator", &self.animator.get())
            .finish()
    }
}

/// Animations of one view, scoped to its frame
///
/// Every call on a view that is not attached to the frame is ignored.
pub struct ViewAnimations<'a> {
    frame: &'a Frame,
    view: &'a ViewRef,
}

impl ViewAnimations<'_> {
    fn animator(&self, operation: &str) -> Option<&Animator> {
        if self.frame.is_attached(self.view) {
            Some(self.frame.animator())
        } else {
            warn!(view = %self.view.id(), operation, "view is not attached to a frame");
            None
        }
    }

    pub fn add(
        &self,
        name: impl Into<String>,
        target: impl AnimationTarget + 'static,
        timing: impl TimingFunction + 'static,
    ) {
        self.add_with(name, target, timing, AnimationOptions::default());
    }

    pub fn add_with(
        &self,
        name: impl Into<String>,
        target: impl AnimationTarget + 'static,
        timing: impl TimingFunction + 'static,
        options: AnimationOptions,
    ) {
        if let Some(animator) = self.animator("add") {
            animator.add_animation_with(self.view, name, target, timing, options);
        }
    }

    pub fn remove(&self, name: &str) {
        if let Some(animator) = self.animator("remove") {
            animator.remove_animation(self.view, name);
        }
    }

    pub fn remove_all(&self) {
        if let Some(animator) = self.animator("remove_all") {
            animator.remove_animations(self.view);
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.frame
            .animator
            .get()
            .is_some_and(|animator| animator.contains(self.view, name))
    }
}
