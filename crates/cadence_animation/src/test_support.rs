//! Shared helpers for the scheduler tests

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use cadence_core::{Rect, View, ViewRef};
use cadence_platform::{ManualClock, RunLoop};

use crate::shared_timer::SharedTimer;
use crate::target::AnimationTarget;

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Event {
    Start,
    Tick(f32),
    Finish(bool),
}

/// Shared record of target hook calls
#[derive(Clone, Default)]
pub(crate) struct EventLog {
    events: Rc<RefCell<Vec<(String, Event)>>>,
}

impl EventLog {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn push(&self, name: &str, event: Event) {
        self.events.borrow_mut().push((name.to_string(), event));
    }

    pub(crate) fn events(&self) -> Vec<Event> {
        self.events.borrow().iter().map(|(_, e)| e.clone()).collect()
    }

    /// Events tagged with the animation name
    pub(crate) fn named_events(&self) -> Vec<(String, Event)> {
        self.events.borrow().clone()
    }

    pub(crate) fn count(&self, pred: impl Fn(&Event) -> bool) -> usize {
        self.events.borrow().iter().filter(|(_, e)| pred(e)).count()
    }

    pub(crate) fn finishes(&self) -> Vec<bool> {
        self.events
            .borrow()
            .iter()
            .filter_map(|(_, e)| match e {
                Event::Finish(canceled) => Some(*canceled),
                _ => None,
            })
            .collect()
    }
}

type TickHook = Box<dyn FnMut(&View, &str, f32)>;

/// Target that records every hook call, optionally running a closure on tick
pub(crate) struct RecordingTarget {
    log: EventLog,
    on_tick: Option<TickHook>,
}

impl RecordingTarget {
    pub(crate) fn new() -> Self {
        Self::with_log(EventLog::new())
    }

    pub(crate) fn with_log(log: EventLog) -> Self {
        Self { log, on_tick: None }
    }

    pub(crate) fn on_tick(mut self, f: impl FnMut(&View, &str, f32) + 'static) -> Self {
        self.on_tick = Some(Box::new(f));
        self
    }

    pub(crate) fn log(&self) -> EventLog {
        self.log.clone()
    }
}

impl AnimationTarget for RecordingTarget {
    fn start(&mut self, _view: &View, name: &str) {
        self.log.push(name, Event::Start);
    }

    fn tick(&mut self, view: &View, name: &str, position: f32) {
        self.log.push(name, Event::Tick(position));
        if let Some(f) = self.on_tick.as_mut() {
            f(view, name, position);
        }
    }

    fn finish(&mut self, _view: &View, name: &str, was_canceled: bool) {
        self.log.push(name, Event::Finish(was_canceled));
    }
}

/// A manual run loop with a shared timer on top
pub(crate) struct Rig {
    pub(crate) run_loop: RunLoop,
    pub(crate) clock: ManualClock,
    pub(crate) timer: SharedTimer,
}

impl Rig {
    pub(crate) fn new() -> Self {
        let (run_loop, clock) = RunLoop::manual();
        let timer = SharedTimer::new(run_loop.clone());
        Self {
            run_loop,
            clock,
            timer,
        }
    }

    pub(crate) fn advance_ms(&self, ms: u64) -> usize {
        self.run_loop
            .advance(&self.clock, Duration::from_millis(ms))
    }
}

pub(crate) fn view() -> ViewRef {
    View::new(Rect::new(0.0, 0.0, 100.0, 100.0))
}
