//! Fixed-interval label rotation with enter/visible/exit phases.
//!
//! The interval timer is the cadence: every tick asks the current label to
//! leave. Phase changes in between are driven by the transition ramps
//! completing, never by the timer:
//!
//! ```text
//! Entering(i) --ramp done--> Visible(i) --timer--> Exiting(i) --ramp done--> Entering(i + 1)
//! ```
//!
//! A tick that arrives while a ramp is still running is held and applied the
//! moment the label becomes visible. Ticks never skip or repeat labels.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

use crate::animation::{PhaseVisual, TransitionAnimator, TransitionTimings};
use crate::schedule::{ScheduleError, Scheduler, Subscription, Tick, TimerTick};

pub const DEFAULT_LABELS: [&str; 4] = ["Analyzing", "Syncing", "Measuring", "Ready"];
pub const DEFAULT_DWELL: Duration = Duration::from_millis(2500);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Entering,
    Visible,
    Exiting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelSetError {
    Empty,
}

impl fmt::Display for LabelSetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LabelSetError::Empty => write!(f, "a label set needs at least one label"),
        }
    }
}

impl std::error::Error for LabelSetError {}

/// Ordered, non-empty, immutable list of labels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelSet {
    labels: Arc<[String]>,
}

impl LabelSet {
    pub fn new<I, S>(labels: I) -> Result<Self, LabelSetError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let labels: Vec<String> = labels.into_iter().map(Into::into).collect();
        if labels.is_empty() {
            return Err(LabelSetError::Empty);
        }
        Ok(Self {
            labels: labels.into(),
        })
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// False for every constructed set.
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn get(&self, index: usize) -> &str {
        &self.labels[index % self.labels.len()]
    }

    pub fn next_index(&self, index: usize) -> usize {
        (index + 1) % self.labels.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.labels.iter().map(String::as_str)
    }
}

impl Default for LabelSet {
    fn default() -> Self {
        Self {
            labels: DEFAULT_LABELS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleState {
    pub index: usize,
    pub phase: Phase,
}

impl CycleState {
    pub const INITIAL: Self = Self {
        index: 0,
        phase: Phase::Entering,
    };
}

/// One state change, stamped with scheduler time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleEvent {
    pub at: Duration,
    pub from: CycleState,
    pub to: CycleState,
    pub label: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleTimings {
    pub dwell: Duration,
    pub transition: TransitionTimings,
}

impl Default for CycleTimings {
    fn default() -> Self {
        Self {
            dwell: DEFAULT_DWELL,
            transition: TransitionTimings::default(),
        }
    }
}

struct CycleCore {
    labels: LabelSet,
    state: CycleState,
    transition: TransitionAnimator,
    held_tick: bool,
    events: Vec<CycleEvent>,
}

impl CycleCore {
    fn new(labels: LabelSet, timings: TransitionTimings) -> Self {
        Self {
            labels,
            state: CycleState::INITIAL,
            transition: TransitionAnimator::new(timings),
            held_tick: false,
            events: Vec::new(),
        }
    }

    fn reset(&mut self) {
        self.state = CycleState::INITIAL;
        self.transition.begin(Phase::Entering);
        self.held_tick = false;
        self.events.clear();
    }

    fn enter(&mut self, to: CycleState, at: Duration) {
        let from = self.state;
        self.state = to;
        self.transition.begin(to.phase);

        let label = self.labels.get(to.index).to_string();
        log::debug!(
            "Label {:?} {:?} -> {:?} at {:?}",
            label,
            from.phase,
            to.phase,
            at
        );
        self.events.push(CycleEvent {
            at,
            from,
            to,
            label,
        });
    }

    fn on_timer(&mut self, tick: TimerTick) {
        if self.state.phase == Phase::Visible {
            let to = CycleState {
                phase: Phase::Exiting,
                ..self.state
            };
            self.enter(to, tick.now);
        } else {
            if self.held_tick {
                log::debug!("Cycle tick {} coalesced: transition still running", tick.count);
            }
            self.held_tick = true;
        }
    }

    fn on_tick(&mut self, tick: Tick) {
        let mut at = tick.now - tick.dt;
        let mut dt = tick.dt;

        while let Some(leftover) = self.transition.advance(dt) {
            at += dt - leftover;
            dt = leftover;
            self.complete_phase(at);
        }
    }

    fn complete_phase(&mut self, at: Duration) {
        match self.state.phase {
            Phase::Entering => {
                let visible = CycleState {
                    phase: Phase::Visible,
                    ..self.state
                };
                self.enter(visible, at);
                if std::mem::take(&mut self.held_tick) {
                    let exiting = CycleState {
                        phase: Phase::Exiting,
                        ..self.state
                    };
                    self.enter(exiting, at);
                }
            }
            Phase::Exiting => {
                let next = CycleState {
                    index: self.labels.next_index(self.state.index),
                    phase: Phase::Entering,
                };
                self.enter(next, at);
            }
            Phase::Visible => {}
        }
    }
}

type Observer = Box<dyn FnMut(&CycleEvent)>;

/// Rotates through a [`LabelSet`] on a fixed interval while started.
pub struct LabelCycleController {
    core: Rc<RefCell<CycleCore>>,
    observer: Rc<RefCell<Option<Observer>>>,
    timings: CycleTimings,
    timer: Option<Subscription>,
    ticker: Option<Subscription>,
}

impl LabelCycleController {
    pub fn new(labels: LabelSet, timings: CycleTimings) -> Self {
        Self {
            core: Rc::new(RefCell::new(CycleCore::new(labels, timings.transition))),
            observer: Rc::new(RefCell::new(None)),
            timings,
            timer: None,
            ticker: None,
        }
    }

    /// Called after every state change. The controller is not borrowed while
    /// the observer runs, so it may read state back.
    pub fn set_observer<F>(&mut self, observer: F)
    where
        F: FnMut(&CycleEvent) + 'static,
    {
        *self.observer.borrow_mut() = Some(Box::new(observer));
    }

    /// Resets to `Entering(labels[0])` and starts the interval timer and the
    /// transition ticker. On failure nothing stays subscribed.
    pub fn start(&mut self, scheduler: &Scheduler) -> Result<(), ScheduleError> {
        self.stop();
        self.core.borrow_mut().reset();

        let core = self.core.clone();
        let observer = self.observer.clone();
        let timer = scheduler.set_interval(self.timings.dwell, move |tick| {
            core.borrow_mut().on_timer(tick);
            notify(&core, &observer);
        })?;

        let core = self.core.clone();
        let observer = self.observer.clone();
        let ticker = scheduler.subscribe_ticker(move |tick| {
            core.borrow_mut().on_tick(tick);
            notify(&core, &observer);
        })?;

        self.timer = Some(timer);
        self.ticker = Some(ticker);
        Ok(())
    }

    /// Cancels the timer and any in-flight ramp. The last state stays readable.
    pub fn stop(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.cancel();
        }
        if let Some(ticker) = self.ticker.take() {
            ticker.cancel();
        }
    }

    pub fn is_running(&self) -> bool {
        self.timer.as_ref().map(Subscription::is_active).unwrap_or(false)
    }

    pub fn timings(&self) -> CycleTimings {
        self.timings
    }

    pub fn labels(&self) -> LabelSet {
        self.core.borrow().labels.clone()
    }

    pub fn state(&self) -> CycleState {
        self.core.borrow().state
    }

    pub fn label(&self) -> String {
        let core = self.core.borrow();
        core.labels.get(core.state.index).to_string()
    }

    pub fn phase_visual(&self) -> PhaseVisual {
        self.core.borrow().transition.visual()
    }
}

impl Drop for LabelCycleController {
    fn drop(&mut self) {
        self.stop();
    }
}

fn notify(core: &Rc<RefCell<CycleCore>>, observer: &Rc<RefCell<Option<Observer>>>) {
    let events = std::mem::take(&mut core.borrow_mut().events);
    if events.is_empty() {
        return;
    }
    if let Some(observer) = observer.borrow_mut().as_mut() {
        for event in &events {
            observer(event);
        }
    }
}
