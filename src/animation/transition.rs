//! Label enter/exit ramps and the free-running glow oscillators.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use super::tween::{Easing, Keyframes, Tween};
use crate::cycle::Phase;
use crate::schedule::{ScheduleError, Scheduler, Subscription};

/// Opacity, blur radius (px) and scale of the label at one instant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhaseVisual {
    pub opacity: f32,
    pub blur: f32,
    pub scale: f32,
}

impl PhaseVisual {
    /// Where every enter ramp starts.
    pub const BEFORE_ENTER: Self = Self {
        opacity: 0.0,
        blur: 3.0,
        scale: 0.9,
    };
    pub const SHOWN: Self = Self {
        opacity: 1.0,
        blur: 0.0,
        scale: 1.0,
    };
    /// Where every exit ramp ends.
    pub const AFTER_EXIT: Self = Self {
        opacity: 0.0,
        blur: 4.0,
        scale: 1.05,
    };

    pub fn lerp(self, other: Self, t: f32) -> Self {
        Self {
            opacity: self.opacity + (other.opacity - self.opacity) * t,
            blur: self.blur + (other.blur - self.blur) * t,
            scale: self.scale + (other.scale - self.scale) * t,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionTimings {
    pub enter: Duration,
    pub exit: Duration,
}

impl Default for TransitionTimings {
    fn default() -> Self {
        Self {
            enter: Duration::from_millis(900),
            exit: Duration::from_millis(600),
        }
    }
}

/// Interpolates the label between phases.
///
/// Each call to [`TransitionAnimator::begin`] starts a fresh ramp from the
/// phase's defined initial value, so an enter never inherits the end state
/// of the previous exit.
#[derive(Debug, Clone)]
pub struct TransitionAnimator {
    phase: Phase,
    ramp: Option<Tween>,
    timings: TransitionTimings,
    easing: Easing,
}

impl TransitionAnimator {
    pub fn new(timings: TransitionTimings) -> Self {
        let mut animator = Self {
            phase: Phase::Entering,
            ramp: None,
            timings,
            easing: Easing::EaseInOut,
        };
        animator.begin(Phase::Entering);
        animator
    }

    pub fn with_easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self.begin(self.phase);
        self
    }

    pub fn timings(&self) -> TransitionTimings {
        self.timings
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn begin(&mut self, phase: Phase) {
        self.phase = phase;
        self.ramp = match phase {
            Phase::Entering => Some(Tween::new(self.timings.enter, self.easing)),
            Phase::Visible => None,
            Phase::Exiting => Some(Tween::new(self.timings.exit, self.easing)),
        };
    }

    /// Advances the current ramp. Returns the leftover time when the ramp
    /// completes during this call. `Visible` has no ramp and never completes.
    pub fn advance(&mut self, dt: Duration) -> Option<Duration> {
        self.ramp.as_mut().and_then(|ramp| ramp.advance(dt))
    }

    pub fn visual(&self) -> PhaseVisual {
        let t = self.ramp.as_ref().map(Tween::value).unwrap_or(1.0);
        match self.phase {
            Phase::Entering => PhaseVisual::BEFORE_ENTER.lerp(PhaseVisual::SHOWN, t),
            Phase::Visible => PhaseVisual::SHOWN,
            Phase::Exiting => PhaseVisual::SHOWN.lerp(PhaseVisual::AFTER_EXIT, t),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlowTimings {
    pub pulse: Duration,
    pub sheen: Duration,
}

impl Default for GlowTimings {
    fn default() -> Self {
        Self {
            pulse: Duration::from_millis(1800),
            sheen: Duration::from_millis(2500),
        }
    }
}

/// Glow state at one instant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlowSample {
    /// Shadow alpha.
    pub intensity: f32,
    /// Shadow radius in px.
    pub radius: f32,
    pub scale: f32,
    /// Opacity of the reflection sweep over the label.
    pub sheen: f32,
}

impl GlowSample {
    pub const REST: Self = Self {
        intensity: 0.5,
        radius: 8.0,
        scale: 1.0,
        sheen: 0.2,
    };
}

#[derive(Debug, Clone)]
struct Oscillators {
    pulse: Tween,
    sheen: Tween,
    intensity: Keyframes,
    radius: Keyframes,
    scale: Keyframes,
    sheen_opacity: Keyframes,
}

impl Oscillators {
    fn new(timings: GlowTimings) -> Self {
        Self {
            pulse: Tween::looping(timings.pulse, Easing::Linear),
            sheen: Tween::looping(timings.sheen, Easing::Linear),
            intensity: Keyframes::new(vec![0.5, 0.8, 0.5], Easing::EaseInOut),
            radius: Keyframes::new(vec![8.0, 14.0, 8.0], Easing::EaseInOut),
            scale: Keyframes::new(vec![1.0, 1.05, 1.0], Easing::EaseInOut),
            sheen_opacity: Keyframes::new(vec![0.2, 0.4, 0.2], Easing::EaseInOut),
        }
    }

    fn advance(&mut self, dt: Duration) {
        self.pulse.advance(dt);
        self.sheen.advance(dt);
    }

    fn restart(&mut self) {
        self.pulse.restart();
        self.sheen.restart();
    }

    fn sample(&self) -> GlowSample {
        let pulse = self.pulse.progress();
        GlowSample {
            intensity: self.intensity.sample(pulse),
            radius: self.radius.sample(pulse),
            scale: self.scale.sample(pulse),
            sheen: self.sheen_opacity.sample(self.sheen.progress()),
        }
    }
}

/// Free-running glow pulse, on its own ticker and blind to label phases.
pub struct GlowPulse {
    oscillators: Rc<RefCell<Oscillators>>,
    subscription: Option<Subscription>,
}

impl GlowPulse {
    pub fn new(timings: GlowTimings) -> Self {
        Self {
            oscillators: Rc::new(RefCell::new(Oscillators::new(timings))),
            subscription: None,
        }
    }

    pub fn start(&mut self, scheduler: &Scheduler) -> Result<(), ScheduleError> {
        self.stop();
        let oscillators = self.oscillators.clone();
        let subscription =
            scheduler.subscribe_ticker(move |tick| oscillators.borrow_mut().advance(tick.dt))?;
        self.subscription = Some(subscription);
        Ok(())
    }

    pub fn stop(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            subscription.cancel();
        }
    }

    pub fn restart(&mut self) {
        self.oscillators.borrow_mut().restart();
    }

    pub fn is_running(&self) -> bool {
        self.subscription
            .as_ref()
            .map(Subscription::is_active)
            .unwrap_or(false)
    }

    pub fn sample(&self) -> GlowSample {
        self.oscillators.borrow().sample()
    }
}

impl Default for GlowPulse {
    fn default() -> Self {
        Self::new(GlowTimings::default())
    }
}

impl Drop for GlowPulse {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Everything an overlay needs to paint the current label.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelVisual {
    pub text: String,
    pub phase: Phase,
    pub opacity: f32,
    pub blur: f32,
    /// Phase scale multiplied by the glow pulse scale.
    pub scale: f32,
    pub glow: GlowSample,
}

impl LabelVisual {
    pub fn compose(text: &str, phase: Phase, visual: PhaseVisual, glow: GlowSample) -> Self {
        Self {
            text: text.to_string(),
            phase,
            opacity: visual.opacity,
            blur: visual.blur,
            scale: visual.scale * glow.scale,
            glow,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    fn close(a: PhaseVisual, b: PhaseVisual) -> bool {
        (a.opacity - b.opacity).abs() < 1e-5
            && (a.blur - b.blur).abs() < 1e-5
            && (a.scale - b.scale).abs() < 1e-5
    }

    #[test]
    fn enter_ramps_from_hidden_to_shown() {
        let mut animator = TransitionAnimator::new(TransitionTimings::default());
        assert!(close(animator.visual(), PhaseVisual::BEFORE_ENTER));

        assert_eq!(animator.advance(ms(450)), None);
        let mid = animator.visual();
        assert!(mid.opacity > 0.0 && mid.opacity < 1.0);
        assert!(mid.blur > 0.0 && mid.blur < 3.0);

        assert_eq!(animator.advance(ms(500)), Some(ms(50)));
        assert!(close(animator.visual(), PhaseVisual::SHOWN));
    }

    #[test]
    fn visible_holds_and_never_completes() {
        let mut animator = TransitionAnimator::new(TransitionTimings::default());
        animator.begin(Phase::Visible);
        assert_eq!(animator.advance(ms(10_000)), None);
        assert!(close(animator.visual(), PhaseVisual::SHOWN));
    }

    #[test]
    fn exit_ramps_out_and_blurs() {
        let mut animator = TransitionAnimator::new(TransitionTimings::default());
        animator.begin(Phase::Exiting);
        assert!(close(animator.visual(), PhaseVisual::SHOWN));
        assert_eq!(animator.advance(ms(600)), Some(Duration::ZERO));
        assert!(close(animator.visual(), PhaseVisual::AFTER_EXIT));
    }

    #[test]
    fn new_enter_starts_from_initial_value_after_interrupted_exit() {
        let mut animator = TransitionAnimator::new(TransitionTimings::default());
        animator.begin(Phase::Exiting);
        animator.advance(ms(200));
        animator.begin(Phase::Entering);
        assert!(close(animator.visual(), PhaseVisual::BEFORE_ENTER));
    }

    #[test]
    fn glow_pulses_independently_of_phase() {
        let scheduler = Scheduler::new();
        let mut glow = GlowPulse::default();
        glow.start(&scheduler).unwrap();
        assert_eq!(glow.sample(), GlowSample::REST);

        scheduler.advance(ms(900));
        let peak = glow.sample();
        assert!((peak.intensity - 0.8).abs() < 1e-4);
        assert!((peak.radius - 14.0).abs() < 1e-3);

        scheduler.advance(ms(900));
        assert!((glow.sample().intensity - 0.5).abs() < 1e-4);

        // Several periods later the pulse is still going.
        scheduler.advance(ms(1800 * 5 + 900));
        assert!((glow.sample().intensity - 0.8).abs() < 1e-4);
    }

    #[test]
    fn stopped_glow_freezes() {
        let scheduler = Scheduler::new();
        let mut glow = GlowPulse::default();
        glow.start(&scheduler).unwrap();
        scheduler.advance(ms(300));
        glow.stop();
        let frozen = glow.sample();
        scheduler.advance(ms(700));
        assert_eq!(glow.sample(), frozen);
        assert!(!glow.is_running());
    }

    #[test]
    fn restart_returns_glow_to_rest() {
        let scheduler = Scheduler::new();
        let mut glow = GlowPulse::default();
        glow.start(&scheduler).unwrap();
        scheduler.advance(ms(500));
        glow.restart();
        assert_eq!(glow.sample(), GlowSample::REST);
    }

    #[test]
    fn label_visual_multiplies_scales() {
        let glow = GlowSample {
            scale: 1.05,
            ..GlowSample::REST
        };
        let visual = LabelVisual::compose("Syncing", Phase::Visible, PhaseVisual::SHOWN, glow);
        assert_eq!(visual.text, "Syncing");
        assert!((visual.scale - 1.05).abs() < 1e-6);
        assert_eq!(visual.opacity, 1.0);
    }
}
