use std::cell::RefCell;
use std::f32::consts::TAU;
use std::rc::Rc;

use crate::schedule::{ScheduleError, Scheduler, Subscription};

/// Default yaw advance per frame tick, in radians.
pub const DEFAULT_ANGULAR_STEP: f32 = 0.005;

/// Anything whose yaw the animator can drive.
pub trait YawTarget {
    fn set_yaw(&self, radians: f32);
}

/// The live angle, kept in `[0, 2π)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotationState {
    angle: f32,
    step: f32,
    ticks: u64,
}

impl RotationState {
    pub fn new(step: f32) -> Self {
        Self {
            angle: 0.0,
            step,
            ticks: 0,
        }
    }

    pub fn angle(&self) -> f32 {
        self.angle
    }

    pub fn step(&self) -> f32 {
        self.step
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// One discrete step, independent of how long the frame took.
    pub fn advance(&mut self) -> f32 {
        self.angle = (self.angle + self.step).rem_euclid(TAU);
        self.ticks += 1;
        self.angle
    }
}

/// Advances a node's yaw once per frame while started.
pub struct RotationAnimator {
    state: Rc<RefCell<RotationState>>,
    subscription: Option<Subscription>,
}

impl RotationAnimator {
    pub fn new(angular_step: f32) -> Self {
        Self {
            state: Rc::new(RefCell::new(RotationState::new(angular_step))),
            subscription: None,
        }
    }

    /// Subscribes to the frame loop and starts driving `target`.
    /// Restarting replaces the previous subscription; the angle carries over.
    pub fn start<T>(&mut self, scheduler: &Scheduler, target: T) -> Result<(), ScheduleError>
    where
        T: YawTarget + 'static,
    {
        self.stop();

        let state = self.state.clone();
        target.set_yaw(state.borrow().angle());

        let subscription = scheduler.subscribe_frame(move |_| {
            let angle = state.borrow_mut().advance();
            target.set_yaw(angle);
        })?;
        self.subscription = Some(subscription);
        Ok(())
    }

    pub fn stop(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            subscription.cancel();
        }
    }

    pub fn is_running(&self) -> bool {
        self.subscription
            .as_ref()
            .map(Subscription::is_active)
            .unwrap_or(false)
    }

    pub fn state(&self) -> RotationState {
        *self.state.borrow()
    }

    pub fn angle(&self) -> f32 {
        self.state.borrow().angle()
    }
}

impl Default for RotationAnimator {
    fn default() -> Self {
        Self::new(DEFAULT_ANGULAR_STEP)
    }
}

impl Drop for RotationAnimator {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::HostCapabilities;
    use std::cell::Cell;
    use std::time::Duration;

    #[derive(Clone, Default)]
    struct Probe {
        yaw: Rc<Cell<f32>>,
        writes: Rc<Cell<u32>>,
    }

    impl YawTarget for Probe {
        fn set_yaw(&self, radians: f32) {
            self.yaw.set(radians);
            self.writes.set(self.writes.get() + 1);
        }
    }

    #[test]
    fn advances_exactly_one_step_per_frame() {
        let scheduler = Scheduler::new();
        let probe = Probe::default();
        let mut animator = RotationAnimator::new(0.005);
        animator.start(&scheduler, probe.clone()).unwrap();

        let mut previous = animator.angle();
        for _ in 0..100 {
            scheduler.frame();
            let angle = animator.angle();
            assert!((angle - (previous + 0.005)).abs() < 1e-6);
            previous = angle;
        }
        assert_eq!(animator.state().ticks(), 100);
        assert!((probe.yaw.get() - 0.5).abs() < 1e-4);
    }

    #[test]
    fn frame_spacing_does_not_change_the_step() {
        let scheduler = Scheduler::new();
        let mut animator = RotationAnimator::new(0.01);
        animator.start(&scheduler, Probe::default()).unwrap();

        scheduler.advance(Duration::from_secs(3));
        scheduler.frame();
        scheduler.advance(Duration::from_millis(1));
        scheduler.frame();

        assert!((animator.angle() - 0.02).abs() < 1e-6);
    }

    #[test]
    fn angle_wraps_within_full_turn() {
        let mut state = RotationState::new(1.0);
        for _ in 0..20 {
            let angle = state.advance();
            assert!((0.0..TAU).contains(&angle));
        }
        assert!((state.angle() - (20.0f32).rem_euclid(TAU)).abs() < 1e-4);
    }

    #[test]
    fn stop_unsubscribes_from_frame_loop() {
        let scheduler = Scheduler::new();
        let probe = Probe::default();
        let mut animator = RotationAnimator::new(0.005);
        animator.start(&scheduler, probe.clone()).unwrap();
        scheduler.frame();
        animator.stop();
        let writes = probe.writes.get();

        scheduler.frame();
        scheduler.frame();

        assert!(!animator.is_running());
        assert_eq!(probe.writes.get(), writes);
        assert_eq!(scheduler.subscription_count(), 0);
    }

    #[test]
    fn missing_frame_loop_is_an_error() {
        let scheduler = Scheduler::with_capabilities(HostCapabilities::TIMERS);
        let mut animator = RotationAnimator::default();
        assert_eq!(
            animator.start(&scheduler, Probe::default()).unwrap_err(),
            ScheduleError::FrameLoopUnavailable
        );
        assert!(!animator.is_running());
    }
}
