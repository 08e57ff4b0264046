use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::animation::{GlowTimings, TransitionTimings, DEFAULT_ANGULAR_STEP};
use crate::cycle::{CycleTimings, LabelSet, DEFAULT_DWELL, DEFAULT_LABELS};
use crate::scene::EnvironmentPreset;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub window: WindowSettings,
    #[serde(default)]
    pub panel: PanelSettings,
}

impl Settings {
    pub fn load() -> Self {
        #[cfg(target_arch = "wasm32")]
        {
            info!("Using default settings for WebAssembly build");
            return Self::default();
        }

        #[cfg(not(target_arch = "wasm32"))]
        {
            let path = std::env::args()
                .nth(1)
                .unwrap_or_else(|| "settings.json".to_string());
            Self::load_from_path(path)
        }
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Self {
        use std::fs;

        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(contents) => match Self::from_json(&contents) {
                Ok(settings) => {
                    info!("Loaded settings from {:?}", path);
                    settings
                }
                Err(err) => {
                    warn!(
                        "Failed to parse {:?} ({}). Falling back to default settings.",
                        path, err
                    );
                    Settings::default()
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                info!("Settings file {:?} not found. Using default settings.", path);
                Settings::default()
            }
            Err(err) => {
                warn!(
                    "Failed to read {:?} ({}). Falling back to default settings.",
                    path, err
                );
                Settings::default()
            }
        }
    }

    pub fn from_json(contents: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str::<Settings>(contents).map(Settings::validate)
    }

    pub fn validate(mut self) -> Self {
        self.window = self.window.validate();
        self.panel = self.panel.validate();
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowSettings {
    #[serde(default = "WindowSettings::default_title")]
    pub title: String,
    #[serde(default)]
    pub resolution: Resolution,
    #[serde(default)]
    pub present_mode: PresentModeSetting,
}

impl Default for WindowSettings {
    fn default() -> Self {
        Self {
            title: Self::default_title(),
            resolution: Resolution::default(),
            present_mode: PresentModeSetting::default(),
        }
    }
}

impl WindowSettings {
    fn validate(mut self) -> Self {
        if self.resolution.width == 0 || self.resolution.height == 0 {
            warn!("Resolution must be greater than zero. Using default resolution.");
            self.resolution = Resolution::default();
        }
        self
    }

    pub fn present_mode(&self, available: &[wgpu::PresentMode]) -> wgpu::PresentMode {
        let desired = self.present_mode.to_wgpu();
        if available.contains(&desired) {
            return desired;
        }

        warn!(
            "Requested present mode {:?} is not supported. Falling back to FIFO.",
            desired
        );

        if available.contains(&wgpu::PresentMode::Fifo) {
            wgpu::PresentMode::Fifo
        } else {
            available
                .first()
                .copied()
                .unwrap_or(wgpu::PresentMode::Fifo)
        }
    }

    fn default_title() -> String {
        "Hero Panel".to_string()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Default for Resolution {
    fn default() -> Self {
        // Square like the panel it hosts.
        Self {
            width: 720,
            height: 720,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PresentModeSetting {
    #[default]
    Fifo,
    FifoRelaxed,
    Immediate,
    Mailbox,
    AutoVsync,
    AutoNoVsync,
}

impl PresentModeSetting {
    fn to_wgpu(self) -> wgpu::PresentMode {
        match self {
            PresentModeSetting::Fifo => wgpu::PresentMode::Fifo,
            PresentModeSetting::FifoRelaxed => wgpu::PresentMode::FifoRelaxed,
            PresentModeSetting::Immediate => wgpu::PresentMode::Immediate,
            PresentModeSetting::Mailbox => wgpu::PresentMode::Mailbox,
            PresentModeSetting::AutoVsync => wgpu::PresentMode::AutoVsync,
            PresentModeSetting::AutoNoVsync => wgpu::PresentMode::AutoNoVsync,
        }
    }
}

/// Everything the hero panel itself is configured with.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PanelSettings {
    #[serde(default)]
    pub model: ModelSettings,
    #[serde(default)]
    pub scene: SceneSettings,
    #[serde(default)]
    pub labels: LabelSettings,
    #[serde(default)]
    pub glow: GlowSettings,
}

impl PanelSettings {
    pub fn validate(mut self) -> Self {
        self.model = self.model.validate();
        self.scene = self.scene.validate();
        self.labels = self.labels.validate();
        self.glow = self.glow.validate();
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelSettings {
    #[serde(default = "ModelSettings::default_path")]
    pub path: String,
    #[serde(default = "ModelSettings::default_scale")]
    pub scale: f32,
    /// Yaw added on every frame tick, in radians.
    #[serde(default = "ModelSettings::default_angular_step")]
    pub angular_step: f32,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            path: Self::default_path(),
            scale: Self::default_scale(),
            angular_step: Self::default_angular_step(),
        }
    }
}

impl ModelSettings {
    fn validate(mut self) -> Self {
        if self.path.trim().is_empty() {
            warn!("Model path is empty. Using default model path.");
            self.path = Self::default_path();
        }
        if !self.scale.is_finite() || self.scale <= 0.0 {
            warn!("Model scale must be positive. Using default scale.");
            self.scale = Self::default_scale();
        }
        if !self.angular_step.is_finite() || self.angular_step < 0.0 {
            warn!("Angular step must be a non-negative number. Using default step.");
            self.angular_step = Self::default_angular_step();
        }
        self
    }

    fn default_path() -> String {
        "models/watch.glb".to_string()
    }

    const fn default_scale() -> f32 {
        1.4
    }

    const fn default_angular_step() -> f32 {
        DEFAULT_ANGULAR_STEP
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneSettings {
    #[serde(default = "SceneSettings::default_camera_position")]
    pub camera_position: [f32; 3],
    #[serde(default = "SceneSettings::default_fov_degrees")]
    pub fov_degrees: f32,
    #[serde(default = "SceneSettings::default_ambient_intensity")]
    pub ambient_intensity: f32,
    #[serde(default = "SceneSettings::default_light_position")]
    pub light_position: [f32; 3],
    #[serde(default = "SceneSettings::default_light_intensity")]
    pub light_intensity: f32,
    #[serde(default)]
    pub environment: EnvironmentPreset,
}

impl Default for SceneSettings {
    fn default() -> Self {
        Self {
            camera_position: Self::default_camera_position(),
            fov_degrees: Self::default_fov_degrees(),
            ambient_intensity: Self::default_ambient_intensity(),
            light_position: Self::default_light_position(),
            light_intensity: Self::default_light_intensity(),
            environment: EnvironmentPreset::default(),
        }
    }
}

impl SceneSettings {
    fn validate(mut self) -> Self {
        if !(self.fov_degrees > 1.0 && self.fov_degrees < 179.0) {
            warn!("Field of view must be between 1 and 179 degrees. Using default.");
            self.fov_degrees = Self::default_fov_degrees();
        }
        if self.camera_position.iter().any(|v| !v.is_finite())
            || self.camera_position == [0.0, 0.0, 0.0]
        {
            warn!("Camera position must be finite and away from the origin. Using default.");
            self.camera_position = Self::default_camera_position();
        }
        if !self.ambient_intensity.is_finite() || self.ambient_intensity < 0.0 {
            warn!("Ambient intensity must be non-negative. Using default.");
            self.ambient_intensity = Self::default_ambient_intensity();
        }
        if !self.light_intensity.is_finite() || self.light_intensity < 0.0 {
            warn!("Light intensity must be non-negative. Using default.");
            self.light_intensity = Self::default_light_intensity();
        }
        if self.light_position.iter().any(|v| !v.is_finite()) {
            warn!("Light position must be finite. Using default.");
            self.light_position = Self::default_light_position();
        }
        self
    }

    const fn default_camera_position() -> [f32; 3] {
        [0.0, 0.0, 3.0]
    }

    const fn default_fov_degrees() -> f32 {
        75.0
    }

    const fn default_ambient_intensity() -> f32 {
        0.5
    }

    const fn default_light_position() -> [f32; 3] {
        [3.0, 3.0, 5.0]
    }

    const fn default_light_intensity() -> f32 {
        1.2
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabelSettings {
    #[serde(default = "LabelSettings::default_texts")]
    pub texts: Vec<String>,
    #[serde(default = "LabelSettings::default_dwell_ms")]
    pub dwell_ms: u64,
    #[serde(default = "LabelSettings::default_enter_ms")]
    pub enter_ms: u64,
    #[serde(default = "LabelSettings::default_exit_ms")]
    pub exit_ms: u64,
}

impl Default for LabelSettings {
    fn default() -> Self {
        Self {
            texts: Self::default_texts(),
            dwell_ms: Self::default_dwell_ms(),
            enter_ms: Self::default_enter_ms(),
            exit_ms: Self::default_exit_ms(),
        }
    }
}

impl LabelSettings {
    fn validate(mut self) -> Self {
        if self.texts.is_empty() {
            warn!("Label list is empty. Using default labels.");
            self.texts = Self::default_texts();
        }

        if self.dwell_ms == 0 {
            warn!("Label dwell must be greater than zero. Using default dwell.");
            self.dwell_ms = Self::default_dwell_ms();
        }

        let ramps = self.enter_ms.saturating_add(self.exit_ms);
        if ramps >= self.dwell_ms {
            // Configured values may be anywhere up to u64::MAX.
            let budget = (u128::from(self.dwell_ms) * 4 / 5) as u64;
            let enter =
                (u128::from(self.enter_ms) * u128::from(budget) / u128::from(ramps)) as u64;
            warn!(
                "Enter + exit ({} ms) does not fit the {} ms dwell. Scaling ramps to {} ms.",
                ramps, self.dwell_ms, budget
            );
            self.enter_ms = enter;
            self.exit_ms = budget - enter;
        }

        self
    }

    pub fn label_set(&self) -> LabelSet {
        LabelSet::new(self.texts.iter().cloned()).unwrap_or_default()
    }

    pub fn timings(&self) -> CycleTimings {
        CycleTimings {
            dwell: Duration::from_millis(self.dwell_ms),
            transition: TransitionTimings {
                enter: Duration::from_millis(self.enter_ms),
                exit: Duration::from_millis(self.exit_ms),
            },
        }
    }

    fn default_texts() -> Vec<String> {
        DEFAULT_LABELS.iter().map(|s| s.to_string()).collect()
    }

    fn default_dwell_ms() -> u64 {
        DEFAULT_DWELL.as_millis() as u64
    }

    fn default_enter_ms() -> u64 {
        TransitionTimings::default().enter.as_millis() as u64
    }

    fn default_exit_ms() -> u64 {
        TransitionTimings::default().exit.as_millis() as u64
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlowSettings {
    #[serde(default = "GlowSettings::default_pulse_ms")]
    pub pulse_ms: u64,
    #[serde(default = "GlowSettings::default_sheen_ms")]
    pub sheen_ms: u64,
}

impl Default for GlowSettings {
    fn default() -> Self {
        Self {
            pulse_ms: Self::default_pulse_ms(),
            sheen_ms: Self::default_sheen_ms(),
        }
    }
}

impl GlowSettings {
    fn validate(mut self) -> Self {
        if self.pulse_ms == 0 {
            warn!("Glow pulse period must be greater than zero. Using default.");
            self.pulse_ms = Self::default_pulse_ms();
        }
        if self.sheen_ms == 0 {
            warn!("Sheen period must be greater than zero. Using default.");
            self.sheen_ms = Self::default_sheen_ms();
        }
        self
    }

    pub fn timings(&self) -> GlowTimings {
        GlowTimings {
            pulse: Duration::from_millis(self.pulse_ms),
            sheen: Duration::from_millis(self.sheen_ms),
        }
    }

    fn default_pulse_ms() -> u64 {
        GlowTimings::default().pulse.as_millis() as u64
    }

    fn default_sheen_ms() -> u64 {
        GlowTimings::default().sheen.as_millis() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let settings = Settings::from_json("{}").unwrap();
        assert_eq!(settings.panel.labels.texts, LabelSettings::default().texts);
        assert_eq!(settings.panel.model.path, "models/watch.glb");
        assert_eq!(settings.panel.scene.fov_degrees, 75.0);
        assert_eq!(settings.window.resolution.width, 720);
    }

    #[test]
    fn validate_replaces_invalid_values_with_defaults() {
        let json = r#"{
            "window": { "resolution": { "width": 0, "height": 600 } },
            "panel": {
                "model": { "scale": -1.0, "angular_step": -0.5 },
                "labels": { "texts": [], "dwell_ms": 0 },
                "glow": { "pulse_ms": 0 }
            }
        }"#;
        let settings = Settings::from_json(json).unwrap();

        assert_eq!(settings.window.resolution.width, Resolution::default().width);
        assert_eq!(settings.panel.model.scale, 1.4);
        assert_eq!(settings.panel.model.angular_step, DEFAULT_ANGULAR_STEP);
        assert_eq!(settings.panel.labels.texts.len(), 4);
        assert_eq!(settings.panel.labels.dwell_ms, 2500);
        assert_eq!(settings.panel.glow.pulse_ms, 1800);
    }

    #[test]
    fn ramps_are_scaled_into_dwell() {
        let labels = LabelSettings {
            texts: vec!["A".into()],
            dwell_ms: 1000,
            enter_ms: 900,
            exit_ms: 600,
        }
        .validate();

        assert_eq!(labels.enter_ms + labels.exit_ms, 800);
        assert_eq!(labels.enter_ms, 480);
    }

    #[test]
    fn oversized_ramps_scale_without_overflow() {
        let settings = Settings::from_json(
            r#"{ "panel": { "labels": { "enter_ms": 18446744073709551615, "exit_ms": 1 } } }"#,
        )
        .unwrap();
        let labels = &settings.panel.labels;
        assert_eq!(labels.dwell_ms, 2500);
        assert_eq!(labels.enter_ms + labels.exit_ms, 2000);
        assert!(labels.enter_ms <= labels.dwell_ms);

        let labels = LabelSettings {
            texts: vec!["A".into()],
            dwell_ms: 100_000_000_000,
            enter_ms: 100_000_000_000,
            exit_ms: 100_000_000_000,
        }
        .validate();
        assert_eq!(labels.enter_ms, 40_000_000_000);
        assert_eq!(labels.exit_ms, 40_000_000_000);

        let labels = LabelSettings {
            texts: vec!["A".into()],
            dwell_ms: u64::MAX,
            enter_ms: u64::MAX,
            exit_ms: u64::MAX,
        }
        .validate();
        assert!(labels.enter_ms <= labels.dwell_ms);
        assert!(labels.exit_ms <= labels.dwell_ms);
        assert!(labels.enter_ms.checked_add(labels.exit_ms).is_some());
    }

    #[test]
    fn validate_preserves_valid_values() {
        let labels = LabelSettings {
            texts: vec!["One".into(), "Two".into()],
            dwell_ms: 4000,
            enter_ms: 500,
            exit_ms: 500,
        };
        let validated = labels.clone().validate();
        assert_eq!(validated.texts, labels.texts);
        assert_eq!(validated.enter_ms, 500);
        assert_eq!(validated.label_set().len(), 2);
        assert_eq!(validated.timings().dwell, Duration::from_millis(4000));
    }

    #[test]
    fn environment_preset_parses_lowercase() {
        let settings =
            Settings::from_json(r#"{ "panel": { "scene": { "environment": "sunset" } } }"#).unwrap();
        assert_eq!(settings.panel.scene.environment, EnvironmentPreset::Sunset);
    }

    #[test]
    fn present_mode_falls_back_to_fifo_when_desired_missing() {
        let window = WindowSettings {
            present_mode: PresentModeSetting::Mailbox,
            ..WindowSettings::default()
        };
        let available = [wgpu::PresentMode::Fifo, wgpu::PresentMode::Immediate];
        assert_eq!(window.present_mode(&available), wgpu::PresentMode::Fifo);
    }

    #[test]
    fn missing_file_uses_defaults() {
        let settings = Settings::load_from_path("definitely/not/here/settings.json");
        assert_eq!(settings.panel.labels.dwell_ms, 2500);
    }
}
