use std::cell::RefCell;
use std::rc::{Rc, Weak};

use glam::{Mat4, Vec3};
use hecs::{Entity, World};

use super::components::*;
use super::{Camera, Environment, Transform};
use crate::animation::YawTarget;
use crate::asset::ModelRef;
use crate::settings::SceneSettings;

/// A model to draw this frame with its final model-to-world matrix.
#[derive(Debug, Clone)]
pub struct ModelInstance {
    pub model: ModelRef,
    pub transform: Mat4,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectionalInstance {
    /// Unit vector from the surface toward the light.
    pub to_light: Vec3,
    pub color: Vec3,
    pub intensity: f32,
}

/// Read-only snapshot of everything the host needs to draw one frame.
#[derive(Debug, Clone)]
pub struct ComposedScene {
    pub camera: Camera,
    pub environment: Environment,
    pub ambient: AmbientLight,
    pub directional: Vec<DirectionalInstance>,
    pub models: Vec<ModelInstance>,
}

impl ComposedScene {
    pub fn model_count(&self) -> usize {
        self.models.len()
    }
}

/// Owns the panel's scene graph: fixed camera, fixed lights, environment and
/// at most one model slot.
pub struct SceneComposer {
    world: Rc<RefCell<World>>,
    camera: Camera,
    environment: Environment,
    model: Option<Entity>,
}

impl SceneComposer {
    pub fn new(settings: &SceneSettings) -> Self {
        let mut world = World::new();

        world.spawn((
            Name::new("ambient"),
            AmbientLight {
                color: Vec3::ONE,
                intensity: settings.ambient_intensity,
            },
        ));
        world.spawn((
            Name::new("key light"),
            TransformComponent(Transform::from_translation(Vec3::from(
                settings.light_position,
            ))),
            DirectionalLight {
                color: Vec3::ONE,
                intensity: settings.light_intensity,
            },
        ));

        Self {
            world: Rc::new(RefCell::new(world)),
            camera: Camera::from_settings(settings),
            environment: Environment::from_preset(settings.environment),
            model: None,
        }
    }

    pub fn camera(&self) -> Camera {
        self.camera
    }

    pub fn environment(&self) -> Environment {
        self.environment
    }

    pub fn has_model(&self) -> bool {
        self.model.is_some()
    }

    /// Places `model` at the origin, replacing any previous one, and returns a
    /// handle the rotation animator can drive.
    pub fn attach_model(&mut self, model: ModelRef, scale: f32) -> NodeRef {
        self.detach_model();

        let name = model.source().to_string();
        let entity = self.world.borrow_mut().spawn((
            Name::new(name),
            TransformComponent(Transform::uniform_scale(scale)),
            ModelComponent(model),
            Visible::default(),
        ));
        self.model = Some(entity);

        NodeRef {
            world: Rc::downgrade(&self.world),
            entity,
        }
    }

    pub fn detach_model(&mut self) {
        if let Some(entity) = self.model.take() {
            let _ = self.world.borrow_mut().despawn(entity);
        }
    }

    pub fn compose(&self) -> ComposedScene {
        let world = self.world.borrow();

        let ambient = world
            .query::<&AmbientLight>()
            .iter()
            .map(|(_, light)| *light)
            .next()
            .unwrap_or(AmbientLight {
                color: Vec3::ONE,
                intensity: 0.0,
            });

        let directional = world
            .query::<(&TransformComponent, &DirectionalLight)>()
            .iter()
            .map(|(_, (transform, light))| DirectionalInstance {
                to_light: transform.0.translation.normalize_or_zero(),
                color: light.color,
                intensity: light.intensity,
            })
            .collect();

        let models = world
            .query::<(&TransformComponent, &ModelComponent, &Visible)>()
            .iter()
            .filter(|(_, (_, _, visible))| visible.0)
            .map(|(_, (transform, model, _))| ModelInstance {
                model: model.0.clone(),
                transform: transform.0.matrix(),
            })
            .collect();

        ComposedScene {
            camera: self.camera,
            environment: self.environment,
            ambient,
            directional,
            models,
        }
    }
}

impl Default for SceneComposer {
    fn default() -> Self {
        Self::new(&SceneSettings::default())
    }
}

/// Weak reference to a node in the composer's world. Writes after the node
/// or the composer is gone are ignored.
#[derive(Clone)]
pub struct NodeRef {
    world: Weak<RefCell<World>>,
    entity: Entity,
}

impl NodeRef {
    pub fn is_alive(&self) -> bool {
        self.world
            .upgrade()
            .map(|world| {
                let world = world.borrow();
                world.contains(self.entity)
            })
            .unwrap_or(false)
    }

    pub fn transform(&self) -> Option<Transform> {
        let world = self.world.upgrade()?;
        let world = world.borrow();
        let transform = world.get::<&TransformComponent>(self.entity).ok()?;
        Some(transform.0)
    }
}

impl YawTarget for NodeRef {
    fn set_yaw(&self, radians: f32) {
        let Some(world) = self.world.upgrade() else {
            return;
        };
        let world = world.borrow();
        if let Ok(mut transform) = world.get::<&mut TransformComponent>(self.entity) {
            transform.0.set_yaw(radians);
        };
    }
}
