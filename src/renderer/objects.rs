// renderer/objects.rs
use bytemuck::{Pod, Zeroable};
use glam::Mat4;

/// One entry of the objects storage buffer, indexed by instance in the shader.
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable, Debug)]
pub struct ObjectData {
    pub model: [[f32; 4]; 4],  // 64 bytes
    pub normal: [[f32; 4]; 4], // 64 bytes
    pub color: [f32; 4],       // 16 bytes
}

impl ObjectData {
    pub fn new(model: Mat4, color: [f32; 4]) -> Self {
        let normal = if model.determinant().abs() > f32::EPSILON {
            model.inverse().transpose()
        } else {
            Mat4::IDENTITY
        };
        Self {
            model: model.to_cols_array_2d(),
            normal: normal.to_cols_array_2d(),
            color,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn object_stride_is_144_bytes() {
        assert_eq!(std::mem::size_of::<ObjectData>(), 144);
    }

    #[test]
    fn normal_matrix_undoes_non_uniform_scale() {
        let model = Mat4::from_scale(Vec3::new(2.0, 1.0, 1.0));
        let data = ObjectData::new(model, [1.0; 4]);
        let normal = Mat4::from_cols_array_2d(&data.normal);
        let n = normal.transform_vector3(Vec3::X);
        assert!(n.abs_diff_eq(Vec3::new(0.5, 0.0, 0.0), 1e-6));
    }

    #[test]
    fn degenerate_model_gets_identity_normals() {
        let data = ObjectData::new(Mat4::ZERO, [1.0; 4]);
        assert_eq!(Mat4::from_cols_array_2d(&data.normal), Mat4::IDENTITY);
    }
}
