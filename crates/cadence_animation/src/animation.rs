//! A single running animation
//!
//! An [`Animation`] binds an (owner view, name) key to a target, a timing
//! function and an optional completion notification. It is only ever handled
//! through `Rc` by its animator, so the tick pass can keep working on a
//! snapshot while callbacks add or remove entries.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use cadence_core::{View, ViewRef};
use tracing::{debug, trace, warn};

use crate::target::AnimationTarget;
use crate::timing::TimingFunction;

/// Completion callback, invoked once with the owner, the animation name and
/// the finished target
pub type DoneNotification = Box<dyn FnOnce(&View, &str, &dyn AnimationTarget)>;

/// Per-animation options
///
/// # Example
///
/// ```
/// use cadence_animation::AnimationOptions;
///
/// let options = AnimationOptions::new()
///     .notify(|view, name, _target| println!("{name} done on {}", view.id()))
///     .notify_on_cancel(false);
/// ```
pub struct AnimationOptions {
    pub(crate) notify: Option<DoneNotification>,
    pub(crate) notify_on_cancel: bool,
}

impl AnimationOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Call `f` once the animation has finished
    ///
    /// Not called if the owner view is dropped before the animation ends.
    pub fn notify<F>(mut self, f: F) -> Self
    where
        F: FnOnce(&View, &str, &dyn AnimationTarget) + 'static,
    {
        self.notify = Some(Box::new(f));
        self
    }

    /// Whether the notification also runs when the animation is canceled
    ///
    /// Defaults to `true`.
    pub fn notify_on_cancel(mut self, notify_on_cancel: bool) -> Self {
        self.notify_on_cancel = notify_on_cancel;
        self
    }
}

impl Default for AnimationOptions {
    fn default() -> Self {
        Self {
            notify: None,
            notify_on_cancel: true,
        }
    }
}

impl std::fmt::Debug for AnimationOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnimationOptions")
            .field("notify", &self.notify.is_some())
            .field("notify_on_cancel", &self.notify_on_cancel)
            .finish()
    }
}

pub(crate) struct Animation {
    owner: Weak<View>,
    name: String,
    target: RefCell<Box<dyn AnimationTarget>>,
    timing: Box<dyn TimingFunction>,
    notify: Cell<Option<DoneNotification>>,
    notify_on_cancel: bool,
    /// Clock time of the first tick, `None` until started
    start_time: Cell<Option<u64>>,
    /// Last position handed to the target
    last_position: Cell<Option<f32>>,
    /// Set once finish has been delivered or is owed
    done: Cell<bool>,
    /// Finish requested while a target hook was running
    owed_finish: Cell<Option<bool>>,
}

impl Animation {
    pub(crate) fn new(
        owner: &ViewRef,
        name: String,
        target: Box<dyn AnimationTarget>,
        timing: Box<dyn TimingFunction>,
        options: AnimationOptions,
    ) -> Self {
        Self {
            owner: Rc::downgrade(owner),
            name,
            target: RefCell::new(target),
            timing,
            notify: Cell::new(options.notify),
            notify_on_cancel: options.notify_on_cancel,
            start_time: Cell::new(None),
            last_position: Cell::new(None),
            done: Cell::new(false),
            owed_finish: Cell::new(None),
        }
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn is_done(&self) -> bool {
        self.done.get()
    }

    pub(crate) fn is_owned_by(&self, owner: &View) -> bool {
        std::ptr::eq(self.owner.as_ptr(), owner)
    }

    pub(crate) fn matches(&self, owner: &View, name: &str) -> bool {
        self.is_owned_by(owner) && self.name == name
    }

    /// Advance to `now_ms`
    ///
    /// Returns `true` once the animation is over and can be dropped from its
    /// animator.
    pub(crate) fn step(&self, now_ms: u64) -> bool {
        if self.done.get() {
            return true;
        }
        let Some(owner) = self.owner.upgrade() else {
            self.abandon();
            return true;
        };

        let start_time = match self.start_time.get() {
            Some(start_time) => start_time,
            None => {
                self.start_time.set(Some(now_ms));
                trace!(view = %owner.id(), name = %self.name, "animation started");
                self.with_target(&owner, |target| target.start(&owner, &self.name));
                if self.done.get() {
                    return true;
                }
                now_ms
            }
        };

        let elapsed = u32::try_from(now_ms.saturating_sub(start_time)).unwrap_or(u32::MAX);
        let position = self.timing.position(elapsed);
        if self.last_position.get() != Some(position) {
            self.last_position.set(Some(position));
            self.with_target(&owner, |target| target.tick(&owner, &self.name, position));
            if self.done.get() {
                return true;
            }
        }

        if self.timing.is_done(elapsed) {
            self.complete(&owner, false);
            return true;
        }
        false
    }

    /// Finish the animation, exactly once
    ///
    /// If one of this animation's own hooks is on the stack, the finish is
    /// delivered as soon as that hook returns.
    pub(crate) fn complete(&self, owner: &View, was_canceled: bool) {
        if self.done.replace(true) {
            return;
        }
        if self.target.try_borrow_mut().is_err() {
            self.owed_finish.set(Some(was_canceled));
            return;
        }
        self.deliver_finish(owner, was_canceled);
    }

    /// Cancel without a live owner reference at hand
    pub(crate) fn cancel(&self) {
        match self.owner.upgrade() {
            Some(owner) => self.complete(&owner, true),
            None => self.abandon(),
        }
    }

    fn with_target(&self, owner: &View, f: impl FnOnce(&mut Box<dyn AnimationTarget>)) {
        {
            let mut target = self.target.borrow_mut();
            f(&mut *target);
        }
        if let Some(was_canceled) = self.owed_finish.take() {
            self.deliver_finish(owner, was_canceled);
        }
    }

    fn deliver_finish(&self, owner: &View, was_canceled: bool) {
        debug!(
            view = %owner.id(),
            name = %self.name,
            was_canceled,
            "animation finished"
        );
        self.target
            .borrow_mut()
            .finish(owner, &self.name, was_canceled);

        if let Some(notify) = self.notify.take() {
            if !was_canceled || self.notify_on_cancel {
                let target = self.target.borrow();
                notify(owner, &self.name, &**target);
            }
        }
    }

    /// Retire the animation of a dropped owner without running any hook
    fn abandon(&self) {
        if self.done.replace(true) {
            return;
        }
        self.notify.take();
        warn!(name = %self.name, "owner dropped while animating, animation discarded");
    }
}

impl std::fmt::Debug for Animation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Animation")
            .field("name", &self.name)
            .field("start_time", &self.start_time.get())
            .field("last_position", &self.last_position.get())
            .field("done", &self.done.get())
            .finish_non_exhaustive()
    }
}
