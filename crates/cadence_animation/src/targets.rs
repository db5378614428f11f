//! Ready-made targets for common view properties

use cadence_core::{Rect, View};

use crate::target::AnimationTarget;

fn lerp(from: f32, to: f32, t: f32) -> f32 {
    from + (to - from) * t
}

/// Fades a view's alpha from its value at start to `end`
#[derive(Clone, Debug)]
pub struct AlphaValueAnimation {
    start_alpha: f32,
    end_alpha: f32,
    force_end_value_on_finish: bool,
}

impl AlphaValueAnimation {
    pub fn new(end_alpha: f32) -> Self {
        Self {
            start_alpha: 0.0,
            end_alpha,
            force_end_value_on_finish: false,
        }
    }

    /// Jump to the end value even when the animation is canceled
    pub fn force_end_value_on_finish(mut self, force: bool) -> Self {
        self.force_end_value_on_finish = force;
        self
    }

    pub fn end_alpha(&self) -> f32 {
        self.end_alpha
    }
}

impl AnimationTarget for AlphaValueAnimation {
    fn start(&mut self, view: &View, _name: &str) {
        self.start_alpha = view.alpha();
    }

    fn tick(&mut self, view: &View, _name: &str, position: f32) {
        view.set_alpha(lerp(self.start_alpha, self.end_alpha, position));
    }

    fn finish(&mut self, view: &View, _name: &str, was_canceled: bool) {
        if !was_canceled || self.force_end_value_on_finish {
            view.set_alpha(self.end_alpha);
        }
    }
}

/// Moves and resizes a view to `new_rect`
///
/// Each edge is interpolated on its own and truncated to whole units. The
/// mouseable area follows the bounds.
#[derive(Clone, Debug)]
pub struct ViewSizeAnimation {
    start_rect: Rect,
    new_rect: Rect,
    force_end_value_on_finish: bool,
}

impl ViewSizeAnimation {
    pub fn new(new_rect: Rect) -> Self {
        Self {
            start_rect: Rect::ZERO,
            new_rect,
            force_end_value_on_finish: false,
        }
    }

    /// Jump to the end rect even when the animation is canceled
    pub fn force_end_value_on_finish(mut self, force: bool) -> Self {
        self.force_end_value_on_finish = force;
        self
    }

    pub fn new_rect(&self) -> Rect {
        self.new_rect
    }

    fn apply(view: &View, rect: Rect) {
        if view.bounds() != rect {
            view.set_bounds(rect);
            view.set_mouseable_area(rect);
            view.invalidate();
        }
    }
}

impl AnimationTarget for ViewSizeAnimation {
    fn start(&mut self, view: &View, _name: &str) {
        self.start_rect = view.bounds();
    }

    fn tick(&mut self, view: &View, _name: &str, position: f32) {
        Self::apply(view, self.start_rect.lerp_edges(&self.new_rect, position));
    }

    fn finish(&mut self, view: &View, _name: &str, was_canceled: bool) {
        if !was_canceled || self.force_end_value_on_finish {
            Self::apply(view, self.new_rect);
        }
    }
}

/// Sweeps a control's value to `end`
///
/// Plain views have no value and are left untouched.
#[derive(Clone, Debug)]
pub struct ControlValueAnimation {
    start_value: f32,
    end_value: f32,
    force_end_value_on_finish: bool,
}

impl ControlValueAnimation {
    pub fn new(end_value: f32) -> Self {
        Self {
            start_value: 0.0,
            end_value,
            force_end_value_on_finish: false,
        }
    }

    /// Jump to the end value even when the animation is canceled
    pub fn force_end_value_on_finish(mut self, force: bool) -> Self {
        self.force_end_value_on_finish = force;
        self
    }

    pub fn end_value(&self) -> f32 {
        self.end_value
    }
}

impl AnimationTarget for ControlValueAnimation {
    fn start(&mut self, view: &View, _name: &str) {
        if let Some(value) = view.value() {
            self.start_value = value;
        }
    }

    fn tick(&mut self, view: &View, _name: &str, position: f32) {
        if view.is_control() {
            view.set_value(lerp(self.start_value, self.end_value, position));
        }
    }

    fn finish(&mut self, view: &View, _name: &str, was_canceled: bool) {
        if view.is_control() && (!was_canceled || self.force_end_value_on_finish) {
            view.set_value(self.end_value);
        }
    }
}
