// Plain hecs components for the composed panel scene.

use glam::Vec3;

use crate::asset::ModelRef;
use crate::scene::Transform;

#[derive(Debug, Clone, Copy)]
pub struct TransformComponent(pub Transform);

/// A loaded model placed in the scene.
#[derive(Debug, Clone)]
pub struct ModelComponent(pub ModelRef);

#[derive(Debug, Clone, Copy)]
pub struct Visible(pub bool);

impl Default for Visible {
    fn default() -> Self {
        Self(true)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AmbientLight {
    pub color: Vec3,
    pub intensity: f32,
}

/// Shines from the entity's translation toward the origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectionalLight {
    pub color: Vec3,
    pub intensity: f32,
}

#[derive(Debug, Clone)]
pub struct Name(pub String);

impl Name {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }
}
