//! Interpolated values over time, driven by explicit `advance` calls.

use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Easing {
    Linear,
    EaseIn,
    EaseOut,
    EaseInOut,
    /// CSS-style `cubic-bezier(x1, y1, x2, y2)`.
    CubicBezier(f32, f32, f32, f32),
}

impl Default for Easing {
    fn default() -> Self {
        Easing::EaseInOut
    }
}

impl Easing {
    /// Maps linear progress in `[0, 1]` to eased progress.
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::EaseIn => cubic_bezier(0.42, 0.0, 1.0, 1.0, t),
            Easing::EaseOut => cubic_bezier(0.0, 0.0, 0.58, 1.0, t),
            Easing::EaseInOut => cubic_bezier(0.42, 0.0, 0.58, 1.0, t),
            Easing::CubicBezier(x1, y1, x2, y2) => cubic_bezier(x1, y1, x2, y2, t),
        }
    }
}

fn bezier(p1: f32, p2: f32, s: f32) -> f32 {
    // B(s) with endpoints fixed at 0 and 1.
    let inv = 1.0 - s;
    3.0 * inv * inv * s * p1 + 3.0 * inv * s * s * p2 + s * s * s
}

fn bezier_slope(p1: f32, p2: f32, s: f32) -> f32 {
    let inv = 1.0 - s;
    3.0 * inv * inv * p1 + 6.0 * inv * s * (p2 - p1) + 3.0 * s * s * (1.0 - p2)
}

fn cubic_bezier(x1: f32, y1: f32, x2: f32, y2: f32, x: f32) -> f32 {
    if x <= 0.0 || x >= 1.0 {
        return x;
    }

    let x1 = x1.clamp(0.0, 1.0);
    let x2 = x2.clamp(0.0, 1.0);

    // Newton first, bisection when the slope flattens out.
    let mut s = x;
    for _ in 0..8 {
        let err = bezier(x1, x2, s) - x;
        if err.abs() < 1e-6 {
            return bezier(y1, y2, s);
        }
        let slope = bezier_slope(x1, x2, s);
        if slope.abs() < 1e-6 {
            break;
        }
        s = (s - err / slope).clamp(0.0, 1.0);
    }

    let (mut lo, mut hi) = (0.0f32, 1.0f32);
    s = x;
    for _ in 0..32 {
        let value = bezier(x1, x2, s);
        if (value - x).abs() < 1e-6 {
            break;
        }
        if value < x {
            lo = s;
        } else {
            hi = s;
        }
        s = 0.5 * (lo + hi);
    }
    bezier(y1, y2, s)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Repeat {
    Once,
    Forever,
}

/// Progress through a fixed duration.
///
/// A `Once` tween stops at its end and reports the overshoot so chained
/// phases keep exact time. A `Forever` tween wraps around.
#[derive(Debug, Clone)]
pub struct Tween {
    duration: Duration,
    elapsed: Duration,
    easing: Easing,
    repeat: Repeat,
    finished: bool,
}

impl Tween {
    pub fn new(duration: Duration, easing: Easing) -> Self {
        Self {
            duration,
            elapsed: Duration::ZERO,
            easing,
            repeat: Repeat::Once,
            finished: false,
        }
    }

    pub fn looping(duration: Duration, easing: Easing) -> Self {
        Self {
            repeat: Repeat::Forever,
            ..Self::new(duration, easing)
        }
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn repeat(&self) -> Repeat {
        self.repeat
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Back to the start, clearing any finished flag.
    pub fn restart(&mut self) {
        self.elapsed = Duration::ZERO;
        self.finished = false;
    }

    /// Moves the tween forward. Returns the unused remainder of `dt` on the
    /// call that completes a `Once` tween, `None` otherwise.
    pub fn advance(&mut self, dt: Duration) -> Option<Duration> {
        if self.finished {
            return None;
        }

        let total = self.elapsed + dt;
        match self.repeat {
            Repeat::Once => {
                if total >= self.duration {
                    self.elapsed = self.duration;
                    self.finished = true;
                    Some(total - self.duration)
                } else {
                    self.elapsed = total;
                    None
                }
            }
            Repeat::Forever => {
                let period = self.duration.as_nanos();
                self.elapsed = if period == 0 {
                    Duration::ZERO
                } else {
                    Duration::from_nanos((total.as_nanos() % period) as u64)
                };
                None
            }
        }
    }

    /// Linear progress in `[0, 1]`.
    pub fn progress(&self) -> f32 {
        if self.duration.is_zero() {
            return if self.finished { 1.0 } else { 0.0 };
        }
        (self.elapsed.as_secs_f32() / self.duration.as_secs_f32()).clamp(0.0, 1.0)
    }

    /// Eased progress in `[0, 1]`.
    pub fn value(&self) -> f32 {
        self.easing.apply(self.progress())
    }
}

/// Evenly spaced keyframe values, eased per segment.
#[derive(Debug, Clone, PartialEq)]
pub struct Keyframes {
    values: Vec<f32>,
    easing: Easing,
}

impl Keyframes {
    pub fn new(values: impl Into<Vec<f32>>, easing: Easing) -> Self {
        Self {
            values: values.into(),
            easing,
        }
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    pub fn sample(&self, progress: f32) -> f32 {
        match self.values.len() {
            0 => 0.0,
            1 => self.values[0],
            len => {
                let segments = len - 1;
                let scaled = progress.clamp(0.0, 1.0) * segments as f32;
                let index = (scaled.floor() as usize).min(segments - 1);
                let local = self.easing.apply(scaled - index as f32);
                let (a, b) = (self.values[index], self.values[index + 1]);
                a + (b - a) * local
            }
        }
    }
}
