// renderer/uniforms.rs
use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};

use crate::scene::ComposedScene;

/// Per-frame camera and lighting, mirrored by `Scene` in shader.wgsl.
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable, Debug, PartialEq)]
pub struct SceneUniform {
    pub view_proj: [[f32; 4]; 4],
    pub camera_pos: [f32; 4],
    pub ambient: [f32; 4],
    pub sky: [f32; 4],
    pub ground: [f32; 4],
    /// Toward the light, w unused.
    pub light_dir: [f32; 4],
    pub light_color: [f32; 4],
}

impl SceneUniform {
    pub fn new() -> Self {
        Self {
            view_proj: Mat4::IDENTITY.to_cols_array_2d(),
            camera_pos: [0.0; 4],
            ambient: [0.0; 4],
            sky: [0.0; 4],
            ground: [0.0; 4],
            light_dir: [0.0, 1.0, 0.0, 0.0],
            light_color: [0.0; 4],
        }
    }

    pub fn from_scene(scene: &ComposedScene, aspect: f32) -> Self {
        let env = &scene.environment;
        let ambient = scene.ambient.color * scene.ambient.intensity;

        // The shader takes one key light; extra ones are ignored.
        let (light_dir, light_color) = scene
            .directional
            .first()
            .map(|light| (light.to_light, light.color * light.intensity))
            .unwrap_or((Vec3::Y, Vec3::ZERO));

        Self {
            view_proj: scene.camera.view_proj(aspect).to_cols_array_2d(),
            camera_pos: scene.camera.position().extend(1.0).to_array(),
            ambient: ambient.extend(0.0).to_array(),
            sky: (env.sky() * env.intensity()).extend(0.0).to_array(),
            ground: (env.ground() * env.intensity()).extend(0.0).to_array(),
            light_dir: light_dir.extend(0.0).to_array(),
            light_color: light_color.extend(0.0).to_array(),
        }
    }
}

impl Default for SceneUniform {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::SceneComposer;

    #[test]
    fn scene_uniform_is_160_bytes() {
        // mat4x4<f32> = 64 bytes, six vec4<f32> = 96 bytes
        assert_eq!(std::mem::size_of::<SceneUniform>(), 160);
    }

    #[test]
    fn default_scene_lighting_is_uploaded() {
        let scene = SceneComposer::default().compose();
        let uniform = SceneUniform::from_scene(&scene, 1.0);

        assert_eq!(uniform.ambient, [0.5, 0.5, 0.5, 0.0]);
        assert_eq!(uniform.camera_pos, [0.0, 0.0, 3.0, 1.0]);
        assert!((uniform.light_color[0] - 1.2).abs() < 1e-6);
        let dir = Vec3::new(uniform.light_dir[0], uniform.light_dir[1], uniform.light_dir[2]);
        assert!((dir.length() - 1.0).abs() < 1e-5);
    }
}
