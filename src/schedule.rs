//! Single-threaded host scheduling primitives.
//!
//! The host drives a [`Scheduler`] with two calls: [`Scheduler::advance`] when
//! wall-clock time has passed and [`Scheduler::frame`] when a display refresh
//! is about to be drawn. Animators subscribe to one of three timing domains:
//!
//! - frame callbacks, once per `frame()`;
//! - fixed-interval timers, on scheduler time;
//! - tickers, which receive every slice of elapsed time.
//!
//! Every subscription is an RAII [`Subscription`] guard. Dropping it (or
//! calling [`Subscription::cancel`]) removes the callback before the next
//! dispatch, including when done from inside a running callback.

use bitflags::bitflags;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::{Rc, Weak};
use std::time::Duration;

bitflags! {
    /// Primitives the host scheduler can provide.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct HostCapabilities: u8 {
        const FRAME_LOOP = 0b01;
        const TIMERS = 0b10;
    }
}

impl Default for HostCapabilities {
    fn default() -> Self {
        Self::all()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleError {
    FrameLoopUnavailable,
    TimersUnavailable,
    ZeroPeriod,
    SchedulerGone,
}

impl fmt::Display for ScheduleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScheduleError::FrameLoopUnavailable => write!(f, "host has no frame loop"),
            ScheduleError::TimersUnavailable => write!(f, "host has no timer service"),
            ScheduleError::ZeroPeriod => write!(f, "interval period must be greater than zero"),
            ScheduleError::SchedulerGone => write!(f, "scheduler was dropped"),
        }
    }
}

impl std::error::Error for ScheduleError {}

/// Passed to frame callbacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameTick {
    pub index: u64,
    pub now: Duration,
}

/// Passed to interval callbacks. `count` starts at 1 for the first firing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerTick {
    pub now: Duration,
    pub count: u64,
}

/// Passed to ticker callbacks: `dt` of scheduler time ending at `now`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
    pub dt: Duration,
    pub now: Duration,
}

type FrameCallback = Box<dyn FnMut(FrameTick)>;
type TimerCallback = Box<dyn FnMut(TimerTick)>;
type TickerCallback = Box<dyn FnMut(Tick)>;

struct TimerEntry {
    period: Duration,
    next_due: Duration,
    count: u64,
    // None while the callback is running.
    callback: Option<TimerCallback>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Domain {
    Frame,
    Timer,
    Ticker,
}

#[derive(Default)]
struct SchedulerInner {
    capabilities: HostCapabilities,
    now: Duration,
    frame_index: u64,
    next_id: u64,
    frames: BTreeMap<u64, Option<FrameCallback>>,
    timers: BTreeMap<u64, TimerEntry>,
    tickers: BTreeMap<u64, Option<TickerCallback>>,
}

impl SchedulerInner {
    fn allocate_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn remove(&mut self, domain: Domain, id: u64) {
        match domain {
            Domain::Frame => {
                self.frames.remove(&id);
            }
            Domain::Timer => {
                self.timers.remove(&id);
            }
            Domain::Ticker => {
                self.tickers.remove(&id);
            }
        }
    }

    fn earliest_due(&self, limit: Duration) -> Option<(u64, Duration)> {
        self.timers
            .iter()
            .filter(|(_, timer)| timer.next_due <= limit)
            .min_by_key(|(id, timer)| (timer.next_due, **id))
            .map(|(id, timer)| (*id, timer.next_due))
    }
}

/// Clonable handle to the host scheduler.
#[derive(Clone, Default)]
pub struct Scheduler {
    inner: Rc<RefCell<SchedulerInner>>,
}

/// Non-owning scheduler handle for use inside callbacks.
#[derive(Clone, Default)]
pub struct WeakScheduler {
    inner: Weak<RefCell<SchedulerInner>>,
}

impl WeakScheduler {
    pub fn upgrade(&self) -> Option<Scheduler> {
        self.inner.upgrade().map(|inner| Scheduler { inner })
    }
}

impl Scheduler {
    pub fn new() -> Self {
        Self::with_capabilities(HostCapabilities::all())
    }

    pub fn with_capabilities(capabilities: HostCapabilities) -> Self {
        Self {
            inner: Rc::new(RefCell::new(SchedulerInner {
                capabilities,
                ..SchedulerInner::default()
            })),
        }
    }

    pub fn downgrade(&self) -> WeakScheduler {
        WeakScheduler {
            inner: Rc::downgrade(&self.inner),
        }
    }

    pub fn capabilities(&self) -> HostCapabilities {
        self.inner.borrow().capabilities
    }

    /// Scheduler time since creation.
    pub fn now(&self) -> Duration {
        self.inner.borrow().now
    }

    pub fn frame_index(&self) -> u64 {
        self.inner.borrow().frame_index
    }

    /// Number of live subscriptions across all timing domains.
    pub fn subscription_count(&self) -> usize {
        let inner = self.inner.borrow();
        inner.frames.len() + inner.timers.len() + inner.tickers.len()
    }

    pub fn subscribe_frame<F>(&self, callback: F) -> Result<Subscription, ScheduleError>
    where
        F: FnMut(FrameTick) + 'static,
    {
        let mut inner = self.inner.borrow_mut();
        if !inner.capabilities.contains(HostCapabilities::FRAME_LOOP) {
            return Err(ScheduleError::FrameLoopUnavailable);
        }
        let id = inner.allocate_id();
        inner.frames.insert(id, Some(Box::new(callback)));
        Ok(self.guard(Domain::Frame, id))
    }

    /// Fires `callback` every `period`, first at `now + period`.
    pub fn set_interval<F>(&self, period: Duration, callback: F) -> Result<Subscription, ScheduleError>
    where
        F: FnMut(TimerTick) + 'static,
    {
        let mut inner = self.inner.borrow_mut();
        if !inner.capabilities.contains(HostCapabilities::TIMERS) {
            return Err(ScheduleError::TimersUnavailable);
        }
        if period.is_zero() {
            return Err(ScheduleError::ZeroPeriod);
        }
        let id = inner.allocate_id();
        let next_due = inner.now + period;
        inner.timers.insert(
            id,
            TimerEntry {
                period,
                next_due,
                count: 0,
                callback: Some(Box::new(callback)),
            },
        );
        Ok(self.guard(Domain::Timer, id))
    }

    pub fn subscribe_ticker<F>(&self, callback: F) -> Result<Subscription, ScheduleError>
    where
        F: FnMut(Tick) + 'static,
    {
        let mut inner = self.inner.borrow_mut();
        if !inner.capabilities.contains(HostCapabilities::TIMERS) {
            return Err(ScheduleError::TimersUnavailable);
        }
        let id = inner.allocate_id();
        inner.tickers.insert(id, Some(Box::new(callback)));
        Ok(self.guard(Domain::Ticker, id))
    }

    /// Signals that a new frame is about to be drawn.
    pub fn frame(&self) {
        let (tick, ids) = {
            let mut inner = self.inner.borrow_mut();
            inner.frame_index += 1;
            let tick = FrameTick {
                index: inner.frame_index,
                now: inner.now,
            };
            (tick, inner.frames.keys().copied().collect::<Vec<_>>())
        };

        for id in ids {
            let callback = self
                .inner
                .borrow_mut()
                .frames
                .get_mut(&id)
                .and_then(Option::take);
            let Some(mut callback) = callback else {
                continue;
            };
            callback(tick);
            if let Some(slot) = self.inner.borrow_mut().frames.get_mut(&id) {
                *slot = Some(callback);
            }
        }
    }

    /// Advances scheduler time by `dt`, firing due timers in order.
    ///
    /// Tickers are advanced up to each timer's due instant before that timer
    /// fires, so results do not depend on how the host slices time.
    pub fn advance(&self, dt: Duration) {
        let target = self.inner.borrow().now + dt;

        loop {
            let due = self.inner.borrow().earliest_due(target);
            let Some((id, due_at)) = due else {
                break;
            };

            self.run_tickers_until(due_at);
            self.fire_timer(id);
        }

        self.run_tickers_until(target);
    }

    fn run_tickers_until(&self, until: Duration) {
        let (tick, ids) = {
            let mut inner = self.inner.borrow_mut();
            if until <= inner.now {
                return;
            }
            let tick = Tick {
                dt: until - inner.now,
                now: until,
            };
            inner.now = until;
            (tick, inner.tickers.keys().copied().collect::<Vec<_>>())
        };

        for id in ids {
            let callback = self
                .inner
                .borrow_mut()
                .tickers
                .get_mut(&id)
                .and_then(Option::take);
            let Some(mut callback) = callback else {
                continue;
            };
            callback(tick);
            if let Some(slot) = self.inner.borrow_mut().tickers.get_mut(&id) {
                *slot = Some(callback);
            }
        }
    }

    fn fire_timer(&self, id: u64) {
        let fired = {
            let mut inner = self.inner.borrow_mut();
            let now = inner.now;
            inner.timers.get_mut(&id).map(|timer| {
                timer.count += 1;
                timer.next_due += timer.period;
                (
                    TimerTick {
                        now,
                        count: timer.count,
                    },
                    timer.callback.take(),
                )
            })
        };

        let Some((tick, Some(mut callback))) = fired else {
            return;
        };
        callback(tick);
        if let Some(timer) = self.inner.borrow_mut().timers.get_mut(&id) {
            timer.callback = Some(callback);
        }
    }

    fn guard(&self, domain: Domain, id: u64) -> Subscription {
        Subscription {
            scheduler: Rc::downgrade(&self.inner),
            domain,
            id,
            active: true,
        }
    }
}

/// Keeps a callback registered with the scheduler until cancelled or dropped.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    scheduler: Weak<RefCell<SchedulerInner>>,
    domain: Domain,
    id: u64,
    active: bool,
}

impl Subscription {
    pub fn cancel(mut self) {
        self.release();
    }

    pub fn is_active(&self) -> bool {
        self.active && self.scheduler.strong_count() > 0
    }

    fn release(&mut self) {
        if !self.active {
            return;
        }
        self.active = false;
        if let Some(inner) = self.scheduler.upgrade() {
            inner.borrow_mut().remove(self.domain, self.id);
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("domain", &self.domain)
            .field("id", &self.id)
            .field("active", &self.active)
            .finish()
    }
}
