//! Views: the long-lived objects animations act on
//!
//! A [`View`] is shared through [`ViewRef`] (`Rc<View>`) and mutated through
//! `&self`, because the animation hooks receive it while other parts of the
//! UI hold references too. Identity is pointer identity of the `Rc`.

use std::cell::Cell;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::geometry::Rect;

/// Shared handle to a view
pub type ViewRef = Rc<View>;

/// Stable identifier for logging and debugging
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ViewId(u64);

impl ViewId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        ViewId(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    pub fn to_raw(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for ViewId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "view#{}", self.0)
    }
}

/// A rectangular UI element with the properties animations drive
#[derive(Debug)]
pub struct View {
    id: ViewId,
    alpha: Cell<f32>,
    bounds: Cell<Rect>,
    mouseable_area: Cell<Rect>,
    /// Normalized control value, `None` for plain views
    value: Cell<Option<f32>>,
    /// Number of redraw requests since creation
    invalidations: Cell<u32>,
}

impl View {
    /// Create a plain view, fully opaque
    pub fn new(bounds: Rect) -> ViewRef {
        Rc::new(Self::build(bounds, None))
    }

    /// Create a control view carrying a normalized value
    pub fn control(bounds: Rect, value: f32) -> ViewRef {
        Rc::new(Self::build(bounds, Some(value.clamp(0.0, 1.0))))
    }

    fn build(bounds: Rect, value: Option<f32>) -> Self {
        Self {
            id: ViewId::next(),
            alpha: Cell::new(1.0),
            bounds: Cell::new(bounds),
            mouseable_area: Cell::new(bounds),
            value: Cell::new(value),
            invalidations: Cell::new(0),
        }
    }

    pub fn id(&self) -> ViewId {
        self.id
    }

    pub fn alpha(&self) -> f32 {
        self.alpha.get()
    }

    /// Set the alpha value, invalidating only on change
    pub fn set_alpha(&self, alpha: f32) {
        if self.alpha.get() != alpha {
            self.alpha.set(alpha);
            self.invalidate();
        }
    }

    pub fn bounds(&self) -> Rect {
        self.bounds.get()
    }

    pub fn set_bounds(&self, bounds: Rect) {
        self.bounds.set(bounds);
    }

    pub fn mouseable_area(&self) -> Rect {
        self.mouseable_area.get()
    }

    pub fn set_mouseable_area(&self, area: Rect) {
        self.mouseable_area.set(area);
    }

    /// Whether this view is a control (has a value)
    pub fn is_control(&self) -> bool {
        self.value.get().is_some()
    }

    /// The control value, `None` for plain views
    pub fn value(&self) -> Option<f32> {
        self.value.get()
    }

    /// Set the control value, clamped to `0.0..=1.0`
    ///
    /// Ignored on plain views.
    pub fn set_value(&self, value: f32) {
        if self.value.get().is_some() {
            self.value.set(Some(value.clamp(0.0, 1.0)));
            self.invalidate();
        }
    }

    /// Request a redraw
    pub fn invalidate(&self) {
        self.invalidations.set(self.invalidations.get().saturating_add(1));
    }

    pub fn invalidation_count(&self) -> u32 {
        self.invalidations.get()
    }
}
