//! Timing functions
//!
//! A timing function maps the milliseconds elapsed since an animation started
//! to a normalized position, and decides when the animation is over. They are
//! pure: the scheduler may ask for the same elapsed time any number of times.
//!
//! | Function | Curve |
//! |----------|-------|
//! | [`LinearTimingFunction`] | `t` |
//! | [`PowerTimingFunction`] | `t^factor` |
//! | [`InterpolationTimingFunction`] | piecewise linear through breakpoints |
//! | [`CubicBezierTimingFunction`] | CSS-style cubic bezier |
//! | [`RepeatTimingFunction`] | another function replayed, optionally reversed |
//! | [`FnTimingFunction`] | any closure over `t` |

use std::collections::BTreeMap;

use cadence_core::Point;

/// Maps elapsed time to normalized animation progress
pub trait TimingFunction {
    /// Progress for `elapsed_ms`, normally within `0.0..=1.0`
    fn position(&self, elapsed_ms: u32) -> f32;

    /// Whether the animation is over at `elapsed_ms`
    ///
    /// Independent of the value [`position`](Self::position) returns.
    fn is_done(&self, elapsed_ms: u32) -> bool {
        elapsed_ms >= self.duration_ms()
    }

    /// Total length of one run in milliseconds
    fn duration_ms(&self) -> u32;
}

impl<T: TimingFunction + ?Sized> TimingFunction for Box<T> {
    fn position(&self, elapsed_ms: u32) -> f32 {
        (**self).position(elapsed_ms)
    }

    fn is_done(&self, elapsed_ms: u32) -> bool {
        (**self).is_done(elapsed_ms)
    }

    fn duration_ms(&self) -> u32 {
        (**self).duration_ms()
    }
}

/// Normalized time, clamped to `0.0..=1.0`. A zero duration is already over.
fn normalized(elapsed_ms: u32, duration_ms: u32) -> f32 {
    if duration_ms == 0 {
        return 1.0;
    }
    (elapsed_ms as f32 / duration_ms as f32).clamp(0.0, 1.0)
}

// ============================================================================
// Linear
// ============================================================================

/// Constant-speed progress
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LinearTimingFunction {
    duration_ms: u32,
}

impl LinearTimingFunction {
    pub fn new(duration_ms: u32) -> Self {
        Self { duration_ms }
    }
}

impl TimingFunction for LinearTimingFunction {
    fn position(&self, elapsed_ms: u32) -> f32 {
        normalized(elapsed_ms, self.duration_ms)
    }

    fn duration_ms(&self) -> u32 {
        self.duration_ms
    }
}

// ============================================================================
// Power
// ============================================================================

/// Progress following `t^factor`: above 1 starts slow, below 1 starts fast
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PowerTimingFunction {
    duration_ms: u32,
    factor: f32,
}

impl PowerTimingFunction {
    pub fn new(duration_ms: u32, factor: f32) -> Self {
        Self {
            duration_ms,
            factor,
        }
    }
}

impl TimingFunction for PowerTimingFunction {
    fn position(&self, elapsed_ms: u32) -> f32 {
        normalized(elapsed_ms, self.duration_ms)
            .powf(self.factor)
            .clamp(0.0, 1.0)
    }

    fn duration_ms(&self) -> u32 {
        self.duration_ms
    }
}

// ============================================================================
// Interpolation
// ============================================================================

/// Piecewise linear progress through timed breakpoints
///
/// Breakpoints are given as (time fraction, value) pairs. Between two
/// breakpoints the value is interpolated linearly; after the last one the last
/// value holds.
///
/// ```
/// use cadence_animation::{InterpolationTimingFunction, TimingFunction};
///
/// // Overshoot to 1.2 at 80% of the time, settle at 1.0
/// let timing = InterpolationTimingFunction::new(1000, 0.0, 1.0).point(0.8, 1.2);
/// assert_eq!(timing.position(800), 1.2);
/// assert!((timing.position(900) - 1.1).abs() < 1e-6);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct InterpolationTimingFunction {
    duration_ms: u32,
    /// Breakpoint time in ms -> value
    points: BTreeMap<u32, f32>,
}

impl InterpolationTimingFunction {
    /// Create a function going from `start` at time 0 to `end` at `duration_ms`
    pub fn new(duration_ms: u32, start: f32, end: f32) -> Self {
        let mut points = BTreeMap::new();
        points.insert(0, start);
        points.insert(duration_ms, end);
        Self {
            duration_ms,
            points,
        }
    }

    /// Add a breakpoint, replacing any existing one at the same time
    ///
    /// `time` is a fraction of the duration.
    pub fn add_point(&mut self, time: f32, value: f32) {
        let at = (self.duration_ms as f32 * time.max(0.0)) as u32;
        self.points.insert(at, value);
    }

    /// Builder form of [`add_point`](Self::add_point)
    pub fn point(mut self, time: f32, value: f32) -> Self {
        self.add_point(time, value);
        self
    }

    /// Number of breakpoints, including start and end
    pub fn point_count(&self) -> usize {
        self.points.len()
    }
}

impl TimingFunction for InterpolationTimingFunction {
    fn position(&self, elapsed_ms: u32) -> f32 {
        let before = self.points.range(..=elapsed_ms).next_back();
        let after = self.points.range(elapsed_ms..).next();
        match (before, after) {
            (Some((&t0, &v0)), Some((&t1, &v1))) => {
                if t0 == t1 {
                    v0
                } else {
                    let f = f64::from(elapsed_ms - t0) / f64::from(t1 - t0);
                    (f64::from(v0) + (f64::from(v1) - f64::from(v0)) * f) as f32
                }
            }
            (Some((_, &value)), None) | (None, Some((_, &value))) => value,
            (None, None) => 1.0,
        }
    }

    fn duration_ms(&self) -> u32 {
        self.duration_ms
    }
}

// ============================================================================
// Cubic Bezier
// ============================================================================

/// CSS-style cubic bezier easing through (0,0), `p1`, `p2`, (1,1)
///
/// The curve is evaluated at parameter `t = elapsed / duration` and its y
/// coordinate is the position.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CubicBezierTimingFunction {
    duration_ms: u32,
    p1: Point,
    p2: Point,
}

impl CubicBezierTimingFunction {
    pub fn new(duration_ms: u32, p1: Point, p2: Point) -> Self {
        Self {
            duration_ms,
            p1,
            p2,
        }
    }

    /// The CSS `ease` curve
    pub fn easy(duration_ms: u32) -> Self {
        Self::new(duration_ms, Point::new(0.25, 0.1), Point::new(0.25, 1.0))
    }

    /// The CSS `ease-in` curve
    pub fn easy_in(duration_ms: u32) -> Self {
        Self::new(duration_ms, Point::new(0.42, 0.0), Point::new(1.0, 1.0))
    }

    /// The CSS `ease-out` curve
    pub fn easy_out(duration_ms: u32) -> Self {
        Self::new(duration_ms, Point::new(0.0, 0.0), Point::new(0.58, 1.0))
    }

    /// The CSS `ease-in-out` curve
    pub fn easy_in_out(duration_ms: u32) -> Self {
        Self::new(duration_ms, Point::new(0.42, 0.0), Point::new(0.58, 1.0))
    }
}

impl TimingFunction for CubicBezierTimingFunction {
    fn position(&self, elapsed_ms: u32) -> f32 {
        let t = normalized(elapsed_ms, self.duration_ms);

        // de Casteljau
        let a = Point::ZERO.lerp(self.p1, t);
        let b = self.p1.lerp(self.p2, t);
        let c = self.p2.lerp(Point::new(1.0, 1.0), t);
        let d = a.lerp(b, t);
        let e = b.lerp(c, t);
        d.lerp(e, t).y
    }

    fn duration_ms(&self) -> u32 {
        self.duration_ms
    }
}

// ============================================================================
// Repeat
// ============================================================================

/// Replays another timing function several times or forever
///
/// With `auto_reverse` every other run plays backwards, so the animation
/// oscillates instead of jumping back to the start.
pub struct RepeatTimingFunction {
    inner: Box<dyn TimingFunction>,
    /// `None` repeats forever
    repeat_count: Option<u32>,
    auto_reverse: bool,
}

impl RepeatTimingFunction {
    /// Play `inner` `repeat_count` times
    pub fn new(inner: impl TimingFunction + 'static, repeat_count: u32, auto_reverse: bool) -> Self {
        Self {
            inner: Box::new(inner),
            repeat_count: Some(repeat_count),
            auto_reverse,
        }
    }

    /// Play `inner` until the animation is removed
    pub fn forever(inner: impl TimingFunction + 'static, auto_reverse: bool) -> Self {
        Self {
            inner: Box::new(inner),
            repeat_count: None,
            auto_reverse,
        }
    }

    fn is_reversed(&self, run: u64) -> bool {
        self.auto_reverse && run % 2 == 1
    }
}

impl TimingFunction for RepeatTimingFunction {
    fn position(&self, elapsed_ms: u32) -> f32 {
        let length = self.inner.duration_ms();
        if length == 0 {
            return self.inner.position(elapsed_ms);
        }

        let elapsed = u64::from(elapsed_ms);
        let run = elapsed / u64::from(length);
        let (run, local) = match self.repeat_count {
            Some(count) if run >= u64::from(count) => {
                // Past the end: hold the final position of the last run
                (u64::from(count.max(1) - 1), length)
            }
            _ => (run, (elapsed % u64::from(length)) as u32),
        };

        let position = self.inner.position(local);
        if self.is_reversed(run) {
            1.0 - position
        } else {
            position
        }
    }

    fn is_done(&self, elapsed_ms: u32) -> bool {
        match self.repeat_count {
            Some(count) => {
                u64::from(elapsed_ms) >= u64::from(self.inner.duration_ms()) * u64::from(count)
            }
            None => false,
        }
    }

    fn duration_ms(&self) -> u32 {
        match self.repeat_count {
            Some(count) => self.inner.duration_ms().saturating_mul(count),
            None => u32::MAX,
        }
    }
}

// ============================================================================
// Closure
// ============================================================================

/// Custom easing from a closure over normalized time
///
/// ```
/// use cadence_animation::{FnTimingFunction, TimingFunction};
///
/// let ease_in_quad = FnTimingFunction::new(200, |t| t * t);
/// assert_eq!(ease_in_quad.position(100), 0.25);
/// ```
pub struct FnTimingFunction {
    duration_ms: u32,
    curve: Box<dyn Fn(f32) -> f32>,
}

impl FnTimingFunction {
    pub fn new<F>(duration_ms: u32, curve: F) -> Self
    where
        F: Fn(f32) -> f32 + 'static,
    {
        Self {
            duration_ms,
            curve: Box::new(curve),
        }
    }
}

impl TimingFunction for FnTimingFunction {
    fn position(&self, elapsed_ms: u32) -> f32 {
        (self.curve)(normalized(elapsed_ms, self.duration_ms))
    }

    fn duration_ms(&self) -> u32 {
        self.duration_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_is_monotonic_and_clamped() {
        let timing = LinearTimingFunction::new(100);
        assert_eq!(timing.position(0), 0.0);
        assert_eq!(timing.position(50), 0.5);
        assert_eq!(timing.position(100), 1.0);
        assert_eq!(timing.position(5000), 1.0);

        let mut last = 0.0;
        for t in 0..=150 {
            let pos = timing.position(t);
            assert!(pos >= last, "position went backwards at {t}");
            last = pos;
        }
    }

    #[test]
    fn test_linear_done_at_duration() {
        let timing = LinearTimingFunction::new(100);
        assert!(!timing.is_done(0));
        assert!(!timing.is_done(99));
        assert!(timing.is_done(100));
        assert!(timing.is_done(101));
    }

    #[test]
    fn test_zero_duration_is_finished_immediately() {
        let timing = LinearTimingFunction::new(0);
        assert_eq!(timing.position(0), 1.0);
        assert!(timing.is_done(0));
    }

    #[test]
    fn test_power() {
        let timing = PowerTimingFunction::new(100, 2.0);
        assert_eq!(timing.position(0), 0.0);
        assert_eq!(timing.position(50), 0.25);
        assert_eq!(timing.position(100), 1.0);
        assert_eq!(timing.position(200), 1.0);
    }

    #[test]
    fn test_interpolation_breakpoints() {
        let timing = InterpolationTimingFunction::new(1000, 0.0, 1.0).point(0.5, 0.8);
        assert_eq!(timing.point_count(), 3);
        assert_eq!(timing.position(0), 0.0);
        assert!((timing.position(250) - 0.4).abs() < 1e-6);
        assert_eq!(timing.position(500), 0.8);
        assert!((timing.position(750) - 0.9).abs() < 1e-6);
        assert_eq!(timing.position(1000), 1.0);
        assert!(!timing.is_done(999));
        assert!(timing.is_done(1000));
    }

    #[test]
    fn test_interpolation_holds_last_value() {
        let timing = InterpolationTimingFunction::new(100, 1.0, 0.25);
        assert_eq!(timing.position(100), 0.25);
        assert_eq!(timing.position(1000), 0.25);
    }

    #[test]
    fn test_interpolation_point_replaces() {
        let mut timing = InterpolationTimingFunction::new(100, 0.0, 1.0);
        timing.add_point(1.0, 0.5);
        assert_eq!(timing.point_count(), 2);
        assert_eq!(timing.position(100), 0.5);
    }

    #[test]
    fn test_bezier_end_points() {
        for timing in [
            CubicBezierTimingFunction::easy(300),
            CubicBezierTimingFunction::easy_in(300),
            CubicBezierTimingFunction::easy_out(300),
            CubicBezierTimingFunction::easy_in_out(300),
        ] {
            assert!(timing.position(0).abs() < 1e-6);
            assert!((timing.position(300) - 1.0).abs() < 1e-6);
            assert!((timing.position(10_000) - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn test_bezier_curve_shape() {
        let ease_in = CubicBezierTimingFunction::easy_in(100);
        let linear = LinearTimingFunction::new(100);
        assert!(ease_in.position(25) < linear.position(25));

        let ease_in_out = CubicBezierTimingFunction::easy_in_out(100);
        assert!((ease_in_out.position(50) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_repeat_counts_runs() {
        let timing = RepeatTimingFunction::new(LinearTimingFunction::new(100), 3, false);
        assert_eq!(timing.duration_ms(), 300);
        assert_eq!(timing.position(50), 0.5);
        assert_eq!(timing.position(150), 0.5);
        assert_eq!(timing.position(250), 0.5);
        assert!(!timing.is_done(299));
        assert!(timing.is_done(300));
        assert_eq!(timing.position(400), 1.0);
    }

    #[test]
    fn test_repeat_auto_reverse() {
        let timing = RepeatTimingFunction::new(LinearTimingFunction::new(100), 2, true);
        assert_eq!(timing.position(25), 0.25);
        assert_eq!(timing.position(125), 0.75);
        assert!(timing.is_done(200));
        // Second run played backwards ends at the start
        assert_eq!(timing.position(200), 0.0);
    }

    #[test]
    fn test_repeat_forever_never_done() {
        let timing = RepeatTimingFunction::forever(LinearTimingFunction::new(10), true);
        assert!(!timing.is_done(u32::MAX));
        assert_eq!(timing.duration_ms(), u32::MAX);
        assert_eq!(timing.position(15), 0.5);
    }

    #[test]
    fn test_fn_timing() {
        let timing = FnTimingFunction::new(100, |t| 1.0 - t);
        assert_eq!(timing.position(0), 1.0);
        assert_eq!(timing.position(100), 0.0);
        assert!(timing.is_done(100));
    }

    #[test]
    fn test_boxed_timing_forwards() {
        let boxed: Box<dyn TimingFunction> = Box::new(LinearTimingFunction::new(10));
        assert_eq!(boxed.position(5), 0.5);
        assert!(boxed.is_done(10));
    }
}
