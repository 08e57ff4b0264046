pub mod depth;
pub mod gpu;
pub mod mesh;
pub mod objects;
pub mod uniforms;
pub mod vertex;

pub use depth::Depth;
pub use gpu::{Gpu, OverlayTarget};
pub use mesh::{GpuMesh, MeshCache};
pub use objects::ObjectData;
pub use uniforms::SceneUniform;
pub use vertex::Vertex;
