pub mod label_style;

pub use label_style::{window_title, LabelStyle};

#[cfg(feature = "egui")]
mod egui_integration;

#[cfg(feature = "egui")]
mod label_overlay;

#[cfg(feature = "egui")]
pub use egui_integration::EguiContext;

#[cfg(feature = "egui")]
pub use label_overlay::paint_label;

#[cfg(feature = "egui")]
pub use egui;
