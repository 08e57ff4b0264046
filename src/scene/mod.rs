// scene/mod.rs

pub mod camera;
pub mod components;
pub mod composer;
pub mod environment;
pub mod transform;

pub use camera::Camera;
pub use composer::{ComposedScene, DirectionalInstance, ModelInstance, NodeRef, SceneComposer};
pub use environment::{Environment, EnvironmentPreset};
pub use transform::Transform;

pub use components::{
    AmbientLight, DirectionalLight, ModelComponent, Name, TransformComponent, Visible,
};
