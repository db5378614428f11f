//! Animator
//!
//! An [`Animator`] keeps the active animations of one owner context (usually a
//! [`Frame`](crate::Frame)) and advances them on every shared timer tick.
//!
//! # Re-entrancy
//!
//! Target hooks and notifications run with no internal borrow held, so they
//! may add, replace or remove animations of the same animator:
//!
//! - a tick pass works on a snapshot of the list, so an animation added during
//!   the pass first runs on the next tick;
//! - removals are finished immediately but taken out of the list only after
//!   the pass;
//! - an animation removing itself from its own hook is finished right after
//!   that hook returns.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use cadence_animation::{AlphaValueAnimation, Animator, LinearTimingFunction, SharedTimer};
//! use cadence_core::{Rect, View};
//! use cadence_platform::RunLoop;
//!
//! let (run_loop, clock) = RunLoop::manual();
//! let animator = Animator::new(SharedTimer::new(run_loop.clone()));
//! let view = View::new(Rect::new(0.0, 0.0, 50.0, 50.0));
//!
//! animator.add_animation(&view, "fade", AlphaValueAnimation::new(0.0), LinearTimingFunction::new(100));
//! run_loop.advance(&clock, Duration::from_millis(200));
//!
//! assert_eq!(view.alpha(), 0.0);
//! assert!(animator.is_empty());
//! ```

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use cadence_core::{View, ViewRef};
use smallvec::SmallVec;
use tracing::debug;

use crate::animation::{Animation, AnimationOptions};
use crate::shared_timer::SharedTimer;
use crate::target::AnimationTarget;
use crate::timing::TimingFunction;

pub(crate) struct AnimatorInner {
    /// Active animations in insertion order
    animations: RefCell<Vec<Rc<Animation>>>,
    /// Finished during the current pass, removed after it
    pending_removal: RefCell<SmallVec<[Rc<Animation>; 4]>>,
    ticking: Cell<bool>,
    registered: Cell<bool>,
    /// Set once the owning `Animator` is dropped
    closed: Cell<bool>,
    timer: SharedTimer,
    self_weak: Weak<AnimatorInner>,
}

impl AnimatorInner {
    fn new(timer: SharedTimer) -> Rc<Self> {
        Rc::new_cyclic(|self_weak| Self {
            animations: RefCell::new(Vec::new()),
            pending_removal: RefCell::new(SmallVec::new()),
            ticking: Cell::new(false),
            registered: Cell::new(false),
            closed: Cell::new(false),
            timer,
            self_weak: self_weak.clone(),
        })
    }

    fn add(
        &self,
        owner: &ViewRef,
        name: String,
        target: Box<dyn AnimationTarget>,
        timing: Box<dyn TimingFunction>,
        options: AnimationOptions,
    ) {
        if self.closed.get() {
            debug!(name = %name, "animator closed, animation dropped");
            return;
        }

        if let Some(existing) = self.find(owner, &name) {
            debug!(view = %owner.id(), name = %name, "replacing animation");
            existing.complete(owner, true);
            self.discard(&existing);
        }

        debug!(view = %owner.id(), name = %name, "animation added");
        let animation = Rc::new(Animation::new(owner, name, target, timing, options));
        self.animations.borrow_mut().push(animation);
        self.ensure_registered();
    }

    fn remove(&self, owner: &View, name: &str) {
        if let Some(animation) = self.find(owner, name) {
            debug!(view = %owner.id(), name, "removing animation");
            animation.complete(owner, true);
            self.discard(&animation);
            self.unregister_if_idle();
        }
    }

    fn remove_owner(&self, owner: &View) {
        let owned: Vec<Rc<Animation>> = self
            .animations
            .borrow()
            .iter()
            .filter(|a| !a.is_done() && a.is_owned_by(owner))
            .cloned()
            .collect();
        if owned.is_empty() {
            return;
        }

        debug!(view = %owner.id(), count = owned.len(), "removing animations");
        for animation in &owned {
            animation.complete(owner, true);
            self.discard(animation);
        }
        self.unregister_if_idle();
    }

    pub(crate) fn cancel_all(&self) {
        let active: Vec<Rc<Animation>> = self
            .animations
            .borrow()
            .iter()
            .filter(|a| !a.is_done())
            .cloned()
            .collect();

        for animation in &active {
            animation.cancel();
            self.discard(animation);
        }
        self.unregister_if_idle();
    }

    /// Advance every animation to `now_ms`
    pub(crate) fn on_tick(&self, now_ms: u64) {
        if self.ticking.replace(true) {
            return;
        }

        let snapshot: Vec<Rc<Animation>> = self.animations.borrow().clone();
        for animation in &snapshot {
            if animation.step(now_ms) {
                self.defer_removal(animation);
            }
        }
        self.ticking.set(false);

        let pending = std::mem::take(&mut *self.pending_removal.borrow_mut());
        if !pending.is_empty() {
            self.animations
                .borrow_mut()
                .retain(|a| !pending.iter().any(|p| Rc::ptr_eq(a, p)));
        }
        drop(pending);
        drop(snapshot);

        self.unregister_if_idle();
    }

    fn find(&self, owner: &View, name: &str) -> Option<Rc<Animation>> {
        self.animations
            .borrow()
            .iter()
            .find(|a| !a.is_done() && a.matches(owner, name))
            .cloned()
    }

    /// Take a finished animation out of the list, or queue it during a pass
    fn discard(&self, animation: &Rc<Animation>) {
        if self.ticking.get() {
            self.defer_removal(animation);
        } else {
            self.animations
                .borrow_mut()
                .retain(|a| !Rc::ptr_eq(a, animation));
        }
    }

    fn defer_removal(&self, animation: &Rc<Animation>) {
        let mut pending = self.pending_removal.borrow_mut();
        if !pending.iter().any(|p| Rc::ptr_eq(p, animation)) {
            pending.push(Rc::clone(animation));
        }
    }

    fn ensure_registered(&self) {
        if !self.registered.replace(true) {
            self.timer.register(self.self_weak.clone());
        }
    }

    fn unregister_if_idle(&self) {
        if self.ticking.get() || !self.registered.get() {
            return;
        }
        if self.animations.borrow().is_empty() {
            self.registered.set(false);
            self.timer.unregister(&self.self_weak);
        }
    }

    /// Called by the shared timer when it drops this animator on shutdown
    pub(crate) fn mark_unregistered(&self) {
        self.registered.set(false);
    }

    fn active(&self) -> impl Iterator<Item = Rc<Animation>> {
        let active: Vec<Rc<Animation>> = self
            .animations
            .borrow()
            .iter()
            .filter(|a| !a.is_done())
            .cloned()
            .collect();
        active.into_iter()
    }

    fn len(&self) -> usize {
        self.animations
            .borrow()
            .iter()
            .filter(|a| !a.is_done())
            .count()
    }

    fn contains(&self, owner: &View, name: &str) -> bool {
        self.find(owner, name).is_some()
    }

    fn animation_names(&self, owner: &View) -> Vec<String> {
        self.active()
            .filter(|a| a.is_owned_by(owner))
            .map(|a| a.name().to_string())
            .collect()
    }

    fn close(&self) {
        self.closed.set(true);
        self.cancel_all();
        if self.registered.replace(false) {
            self.timer.unregister(&self.self_weak);
        }
    }
}

/// Registry of the running animations of one owner context
///
/// Animations are keyed by (owner view, name); adding a second animation with
/// the same key cancels the first one. Dropping the animator cancels
/// everything still running.
///
/// Callbacks must not capture the `Animator` itself; use
/// [`handle`](Self::handle) instead.
pub struct Animator {
    inner: Rc<AnimatorInner>,
}

impl Animator {
    pub fn new(timer: SharedTimer) -> Self {
        Self {
            inner: AnimatorInner::new(timer),
        }
    }

    /// Start animating `owner`
    ///
    /// Any animation already running under the same owner and name is
    /// finished as canceled first.
    pub fn add_animation(
        &self,
        owner: &ViewRef,
        name: impl Into<String>,
        target: impl AnimationTarget + 'static,
        timing: impl TimingFunction + 'static,
    ) {
        self.add_animation_with(owner, name, target, timing, AnimationOptions::default());
    }

    /// [`add_animation`](Self::add_animation) with a notification and options
    pub fn add_animation_with(
        &self,
        owner: &ViewRef,
        name: impl Into<String>,
        target: impl AnimationTarget + 'static,
        timing: impl TimingFunction + 'static,
        options: AnimationOptions,
    ) {
        self.inner.add(
            owner,
            name.into(),
            Box::new(target),
            Box::new(timing),
            options,
        );
    }

    /// Cancel the animation `name` of `owner`, if any
    pub fn remove_animation(&self, owner: &View, name: &str) {
        self.inner.remove(owner, name);
    }

    /// Cancel every animation of `owner`
    pub fn remove_animations(&self, owner: &View) {
        self.inner.remove_owner(owner);
    }

    /// Cancel every animation
    pub fn remove_all(&self) {
        self.inner.cancel_all();
    }

    /// Advance all animations to `now_ms`
    ///
    /// Normally called by the shared timer. Nested calls from inside a tick
    /// are ignored.
    pub fn on_tick(&self, now_ms: u64) {
        self.inner.on_tick(now_ms);
    }

    /// Number of running animations
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, owner: &View, name: &str) -> bool {
        self.inner.contains(owner, name)
    }

    /// Names of the running animations of `owner`, in insertion order
    pub fn animation_names(&self, owner: &View) -> Vec<String> {
        self.inner.animation_names(owner)
    }

    /// Whether this animator is receiving shared timer ticks
    pub fn is_registered(&self) -> bool {
        self.inner.registered.get()
    }

    pub fn shared_timer(&self) -> &SharedTimer {
        &self.inner.timer
    }

    /// Weak handle for use inside callbacks
    pub fn handle(&self) -> AnimatorHandle {
        AnimatorHandle {
            inner: Rc::downgrade(&self.inner),
        }
    }
}

impl Drop for Animator {
    fn drop(&mut self) {
        self.inner.close();
    }
}

impl std::fmt::Debug for Animator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Animator")
            .field("animations", &self.len())
            .field("registered", &self.is_registered())
            .finish()
    }
}

/// Weak handle to an [`Animator`]
///
/// Operations on a handle whose animator has been dropped do nothing.
#[derive(Clone)]
pub struct AnimatorHandle {
    inner: Weak<AnimatorInner>,
}

impl AnimatorHandle {
    fn upgrade(&self) -> Option<Rc<AnimatorInner>> {
        self.inner.upgrade().filter(|inner| !inner.closed.get())
    }

    /// Whether the animator is still alive
    pub fn is_alive(&self) -> bool {
        self.upgrade().is_some()
    }

    pub fn add_animation(
        &self,
        owner: &ViewRef,
        name: impl Into<String>,
        target: impl AnimationTarget + 'static,
        timing: impl TimingFunction + 'static,
    ) {
        self.add_animation_with(owner, name, target, timing, AnimationOptions::default());
    }

    pub fn add_animation_with(
        &self,
        owner: &ViewRef,
        name: impl Into<String>,
        target: impl AnimationTarget + 'static,
        timing: impl TimingFunction + 'static,
        options: AnimationOptions,
    ) {
        if let Some(inner) = self.upgrade() {
            inner.add(
                owner,
                name.into(),
                Box::new(target),
                Box::new(timing),
                options,
            );
        }
    }

    pub fn remove_animation(&self, owner: &View, name: &str) {
        if let Some(inner) = self.upgrade() {
            inner.remove(owner, name);
        }
    }

    pub fn remove_animations(&self, owner: &View) {
        if let Some(inner) = self.upgrade() {
            inner.remove_owner(owner);
        }
    }

    pub fn remove_all(&self) {
        if let Some(inner) = self.upgrade() {
            inner.cancel_all();
        }
    }

    pub fn len(&self) -> usize {
        self.upgrade().map_or(0, |inner| inner.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, owner: &View, name: &str) -> bool {
        self.upgrade()
            .is_some_and(|inner| inner.contains(owner, name))
    }
}

impl std::fmt::Debug for AnimatorHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnimatorHandle")
            .field("alive", &self.is_alive())
            .finish()
    }
}
