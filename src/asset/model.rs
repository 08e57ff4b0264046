use glam::{Mat4, Vec3};
use std::sync::Arc;

use super::LoadError;

/// One drawable primitive, baked in model space.
#[derive(Debug, Clone)]
pub struct MeshData {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub indices: Vec<u32>,
    /// Node-to-model transform from the glTF hierarchy.
    pub transform: Mat4,
    pub base_color: [f32; 4],
}

impl MeshData {
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: Vec3,
    pub max: Vec3,
}

impl Bounds {
    fn empty() -> Self {
        Self {
            min: Vec3::splat(f32::INFINITY),
            max: Vec3::splat(f32::NEG_INFINITY),
        }
    }

    fn include(&mut self, point: Vec3) {
        self.min = self.min.min(point);
        self.max = self.max.max(point);
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }
}

/// A fully parsed 3D model. Immutable once loaded.
#[derive(Debug)]
pub struct Model {
    source: String,
    meshes: Vec<MeshData>,
    bounds: Bounds,
}

/// Opaque shared reference handed out by a ready `AssetHandle`.
pub type ModelRef = Arc<Model>;

impl Model {
    pub fn from_gltf_bytes(source: &str, bytes: &[u8]) -> Result<Self, LoadError> {
        let (document, buffers, _images) = gltf::import_slice(bytes)
            .map_err(|err| LoadError::Parse(format!("{}: {}", source, err)))?;

        let mut meshes = Vec::new();
        let scene = document
            .default_scene()
            .or_else(|| document.scenes().next());

        match scene {
            Some(scene) => {
                for node in scene.nodes() {
                    collect_node(&node, Mat4::IDENTITY, &buffers, &mut meshes);
                }
            }
            None => {
                // No scene graph: take every mesh at the origin.
                for mesh in document.meshes() {
                    collect_mesh(&mesh, Mat4::IDENTITY, &buffers, &mut meshes);
                }
            }
        }

        Self::from_meshes(source, meshes)
    }

    pub fn from_meshes(source: &str, meshes: Vec<MeshData>) -> Result<Self, LoadError> {
        if meshes.iter().all(|mesh| mesh.indices.is_empty()) {
            return Err(LoadError::Empty(source.to_string()));
        }

        let mut bounds = Bounds::empty();
        for mesh in &meshes {
            for position in &mesh.positions {
                bounds.include(mesh.transform.transform_point3(Vec3::from(*position)));
            }
        }

        Ok(Self {
            source: source.to_string(),
            meshes,
            bounds,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn meshes(&self) -> &[MeshData] {
        &self.meshes
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn triangle_count(&self) -> usize {
        self.meshes.iter().map(MeshData::triangle_count).sum()
    }
}

fn collect_node(
    node: &gltf::Node<'_>,
    parent: Mat4,
    buffers: &[gltf::buffer::Data],
    out: &mut Vec<MeshData>,
) {
    let local = Mat4::from_cols_array_2d(&node.transform().matrix());
    let world = parent * local;

    if let Some(mesh) = node.mesh() {
        collect_mesh(&mesh, world, buffers, out);
    }

    for child in node.children() {
        collect_node(&child, world, buffers, out);
    }
}

fn collect_mesh(
    mesh: &gltf::Mesh<'_>,
    transform: Mat4,
    buffers: &[gltf::buffer::Data],
    out: &mut Vec<MeshData>,
) {
    for primitive in mesh.primitives() {
        if primitive.mode() != gltf::mesh::Mode::Triangles {
            log::debug!(
                "Skipping non-triangle primitive {} of mesh {:?}",
                primitive.index(),
                mesh.name()
            );
            continue;
        }

        let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(|data| &data.0[..]));

        let Some(positions) = reader.read_positions() else {
            continue;
        };
        let positions: Vec<[f32; 3]> = positions.collect();

        let indices: Vec<u32> = match reader.read_indices() {
            Some(indices) => indices.into_u32().collect(),
            None => (0..positions.len() as u32).collect(),
        };

        let normals = match reader.read_normals() {
            Some(normals) => normals.collect(),
            None => face_normals(&positions, &indices),
        };

        let base_color = primitive
            .material()
            .pbr_metallic_roughness()
            .base_color_factor();

        out.push(MeshData {
            positions,
            normals,
            indices,
            transform,
            base_color,
        });
    }
}

/// Area-weighted vertex normals for primitives that ship without them.
fn face_normals(positions: &[[f32; 3]], indices: &[u32]) -> Vec<[f32; 3]> {
    let mut accum = vec![Vec3::ZERO; positions.len()];

    for tri in indices.chunks_exact(3) {
        let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
        if a >= positions.len() || b >= positions.len() || c >= positions.len() {
            continue;
        }
        let pa = Vec3::from(positions[a]);
        let pb = Vec3::from(positions[b]);
        let pc = Vec3::from(positions[c]);
        let normal = (pb - pa).cross(pc - pa);
        accum[a] += normal;
        accum[b] += normal;
        accum[c] += normal;
    }

    accum
        .into_iter()
        .map(|n| n.try_normalize().unwrap_or(Vec3::Y).to_array())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad() -> MeshData {
        MeshData {
            positions: vec![
                [0.0, 0.0, 0.0],
                [1.0, 0.0, 0.0],
                [1.0, 1.0, 0.0],
                [0.0, 1.0, 0.0],
            ],
            normals: Vec::new(),
            indices: vec![0, 1, 2, 0, 2, 3],
            transform: Mat4::from_translation(Vec3::new(0.0, 0.0, 2.0)),
            base_color: [1.0; 4],
        }
    }

    #[test]
    fn face_normals_point_out_of_ccw_triangles() {
        let mesh = quad();
        let normals = face_normals(&mesh.positions, &mesh.indices);
        for n in normals {
            assert!((Vec3::from(n) - Vec3::Z).length() < 1e-6);
        }
    }

    #[test]
    fn bounds_include_node_transform() {
        let model = Model::from_meshes("quad", vec![quad()]).unwrap();
        let bounds = model.bounds();
        assert_eq!(bounds.min, Vec3::new(0.0, 0.0, 2.0));
        assert_eq!(bounds.max, Vec3::new(1.0, 1.0, 2.0));
        assert_eq!(model.triangle_count(), 2);
    }

    #[test]
    fn model_without_triangles_is_empty_error() {
        let err = Model::from_meshes("nothing", Vec::new()).unwrap_err();
        assert!(matches!(err, LoadError::Empty(ref path) if path == "nothing"));
    }

    #[test]
    fn garbage_bytes_fail_to_parse() {
        let err = Model::from_gltf_bytes("junk.glb", b"definitely not gltf").unwrap_err();
        assert!(matches!(err, LoadError::Parse(_)));
    }
}
