//! Resolves a [`LabelVisual`] into concrete paint parameters.
//!
//! Kept free of any UI toolkit so the window-title fallback and the egui
//! overlay agree on what the label looks like.

use crate::animation::LabelVisual;

/// #59f59e
pub const ACCENT: [u8; 3] = [0x59, 0xf5, 0x9e];
/// #94ffd0, the middle stop of the text gradient.
pub const ACCENT_LIGHT: [u8; 3] = [0x94, 0xff, 0xd0];
/// Soft halo behind the label.
pub const HALO: [u8; 3] = [90, 255, 158];
pub const HALO_ALPHA: f32 = 0.08;

const MIN_FONT: f32 = 14.0;
const MAX_FONT: f32 = 22.0;
const WIDE_VIEWPORT: f32 = 768.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LabelStyle {
    pub font_size: f32,
    pub text_alpha: f32,
    pub glow_alpha: f32,
    pub glow_radius: f32,
    pub blur: f32,
    pub sheen_alpha: f32,
    /// Downward shift of the label from the panel center, in px.
    pub offset_y: f32,
}

impl LabelStyle {
    pub fn resolve(visual: &LabelVisual, viewport: [f32; 2]) -> Self {
        let [width, height] = viewport;
        let opacity = visual.opacity.clamp(0.0, 1.0);
        let base = (width * 0.02).clamp(MIN_FONT, MAX_FONT);
        let shift = if width >= WIDE_VIEWPORT { 0.10 } else { 0.06 };

        Self {
            font_size: base * visual.scale,
            text_alpha: opacity,
            glow_alpha: visual.glow.intensity * opacity,
            glow_radius: visual.glow.radius,
            blur: visual.blur.max(0.0),
            sheen_alpha: 0.1 * visual.glow.sheen * opacity,
            offset_y: height * shift,
        }
    }
}

pub fn display_text(visual: &LabelVisual) -> String {
    visual.text.to_uppercase()
}

/// Used when no overlay is available to paint the label.
pub fn window_title(base: &str, visual: &LabelVisual) -> String {
    format!("{} · {}", base, display_text(visual))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::{GlowSample, PhaseVisual};
    use crate::cycle::Phase;

    fn visual(phase_visual: PhaseVisual) -> LabelVisual {
        LabelVisual::compose("Syncing", Phase::Visible, phase_visual, GlowSample::REST)
    }

    #[test]
    fn font_size_is_clamped_to_viewport() {
        let shown = visual(PhaseVisual::SHOWN);
        assert_eq!(LabelStyle::resolve(&shown, [300.0, 300.0]).font_size, 14.0);
        assert_eq!(LabelStyle::resolve(&shown, [900.0, 900.0]).font_size, 18.0);
        assert_eq!(LabelStyle::resolve(&shown, [4000.0, 900.0]).font_size, 22.0);
    }

    #[test]
    fn hidden_label_paints_nothing() {
        let style = LabelStyle::resolve(&visual(PhaseVisual::AFTER_EXIT), [720.0, 720.0]);
        assert_eq!(style.text_alpha, 0.0);
        assert_eq!(style.glow_alpha, 0.0);
        assert_eq!(style.sheen_alpha, 0.0);
        assert_eq!(style.blur, 4.0);
    }

    #[test]
    fn wide_viewports_shift_label_further_down() {
        let shown = visual(PhaseVisual::SHOWN);
        assert_eq!(LabelStyle::resolve(&shown, [500.0, 500.0]).offset_y, 30.0);
        assert_eq!(LabelStyle::resolve(&shown, [800.0, 500.0]).offset_y, 50.0);
    }

    #[test]
    fn title_carries_uppercase_label() {
        assert_eq!(
            window_title("Hero Panel", &visual(PhaseVisual::SHOWN)),
            "Hero Panel · SYNCING"
        );
    }
}
