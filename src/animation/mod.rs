pub mod rotation;
pub mod transition;
pub mod tween;

pub use rotation::{RotationAnimator, RotationState, YawTarget, DEFAULT_ANGULAR_STEP};
pub use transition::{
    GlowPulse, GlowSample, GlowTimings, LabelVisual, PhaseVisual, TransitionAnimator,
    TransitionTimings,
};
pub use tween::{Easing, Keyframes, Repeat, Tween};
