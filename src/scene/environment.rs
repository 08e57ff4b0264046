use glam::Vec3;
use serde::{Deserialize, Serialize};
use wgpu::Color;

/// Named lighting moods for the panel backdrop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnvironmentPreset {
    #[default]
    City,
    Studio,
    Sunset,
    Night,
}

/// Global lighting applied behind and around the model.
///
/// The clear color is the panel background. The sky and ground tints form a
/// hemisphere term that stands in for image-based lighting: surfaces facing up
/// pick up `sky`, surfaces facing down pick up `ground`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Environment {
    preset: EnvironmentPreset,
    clear_color: Color,
    sky: Vec3,
    ground: Vec3,
    intensity: f32,
}

/// #0e0f14
const PANEL_BACKGROUND: Color = Color {
    r: 14.0 / 255.0,
    g: 15.0 / 255.0,
    b: 20.0 / 255.0,
    a: 1.0,
};

impl Environment {
    pub fn from_preset(preset: EnvironmentPreset) -> Self {
        let (sky, ground, intensity) = match preset {
            EnvironmentPreset::City => (
                Vec3::new(0.62, 0.68, 0.78),
                Vec3::new(0.28, 0.25, 0.22),
                0.6,
            ),
            EnvironmentPreset::Studio => (
                Vec3::new(0.85, 0.85, 0.88),
                Vec3::new(0.4, 0.4, 0.4),
                0.7,
            ),
            EnvironmentPreset::Sunset => (
                Vec3::new(0.98, 0.62, 0.42),
                Vec3::new(0.32, 0.2, 0.26),
                0.55,
            ),
            EnvironmentPreset::Night => (
                Vec3::new(0.18, 0.22, 0.38),
                Vec3::new(0.05, 0.05, 0.08),
                0.35,
            ),
        };

        Self {
            preset,
            clear_color: PANEL_BACKGROUND,
            sky,
            ground,
            intensity,
        }
    }

    pub fn preset(&self) -> EnvironmentPreset {
        self.preset
    }

    pub fn clear_color(&self) -> Color {
        self.clear_color
    }

    pub fn with_clear_color(mut self, color: Color) -> Self {
        self.clear_color = color;
        self
    }

    pub fn sky(&self) -> Vec3 {
        self.sky
    }

    pub fn ground(&self) -> Vec3 {
        self.ground
    }

    pub fn intensity(&self) -> f32 {
        self.intensity
    }

    /// Hemisphere light arriving on a surface with the given normal.
    pub fn irradiance(&self, normal: Vec3) -> Vec3 {
        let t = normal.normalize_or_zero().y * 0.5 + 0.5;
        self.ground.lerp(self.sky, t) * self.intensity
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::from_preset(EnvironmentPreset::default())
    }
}
