use egui::{Align2, Color32, FontId, Id, LayerId, Order, Pos2, Vec2};

use super::label_style::{display_text, LabelStyle, ACCENT, ACCENT_LIGHT, HALO, HALO_ALPHA};
use crate::animation::LabelVisual;

const AXES: [Vec2; 4] = [
    Vec2::new(1.0, 0.0),
    Vec2::new(-1.0, 0.0),
    Vec2::new(0.0, 1.0),
    Vec2::new(0.0, -1.0),
];

fn rgba(rgb: [u8; 3], alpha: f32) -> Color32 {
    let alpha = (alpha.clamp(0.0, 1.0) * 255.0) as u8;
    Color32::from_rgba_unmultiplied(rgb[0], rgb[1], rgb[2], alpha)
}

/// Paints the cycling label over the panel center.
pub fn paint_label(ctx: &egui::Context, visual: &LabelVisual) {
    let rect = ctx.screen_rect();
    let style = LabelStyle::resolve(visual, [rect.width(), rect.height()]);
    let painter = ctx.layer_painter(LayerId::new(Order::Foreground, Id::new("hero_label")));
    let center = Pos2::new(rect.center().x, rect.center().y + style.offset_y);

    // Radial halo: stacked translucent discs approximate the gradient.
    let halo_radius = rect.width().min(rect.height()) * 0.35;
    for ring in 0..8 {
        let t = ring as f32 / 8.0;
        painter.circle_filled(
            center,
            halo_radius * (1.0 - t),
            rgba(HALO, HALO_ALPHA * 0.25),
        );
    }

    if style.text_alpha <= 0.0 {
        return;
    }

    let text = display_text(visual);
    let font = FontId::monospace(style.font_size);

    let steps = 6;
    for step in 1..=steps {
        let spread = style.glow_radius * step as f32 / steps as f32 * 0.25;
        let alpha = style.glow_alpha / (steps as f32 * 1.5);
        for axis in AXES {
            painter.text(
                center + axis * spread,
                Align2::CENTER_CENTER,
                &text,
                font.clone(),
                rgba(ACCENT, alpha),
            );
        }
    }

    if style.blur > 0.05 {
        let ghost = style.text_alpha * 0.3;
        for axis in &AXES[..2] {
            painter.text(
                center + *axis * style.blur,
                Align2::CENTER_CENTER,
                &text,
                font.clone(),
                rgba(ACCENT_LIGHT, ghost),
            );
        }
    }

    let label_rect = painter.text(
        center,
        Align2::CENTER_CENTER,
        &text,
        font,
        rgba(ACCENT, style.text_alpha),
    );

    // Reflection sweep over the upper half.
    let mut sheen = label_rect.expand2(Vec2::new(style.font_size * 0.6, style.font_size * 0.3));
    sheen.set_bottom(sheen.center().y);
    painter.rect_filled(
        sheen,
        style.font_size,
        Color32::from_white_alpha((style.sheen_alpha * 255.0) as u8),
    );
}
