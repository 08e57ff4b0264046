pub mod cache;
pub mod handle;
pub mod loader;
pub mod model;

pub use cache::ModelCache;
pub use handle::{AssetHandle, AssetState};
pub use loader::{AssetLoader, AssetSource, FsSource};
pub use model::{Bounds, MeshData, Model, ModelRef};

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    /// Transport failed (missing file, HTTP error).
    Fetch(String),
    /// Bytes were fetched but are not a usable glTF document.
    Parse(String),
    /// The document parsed but holds no triangles.
    Empty(String),
    /// Every interested handle went away before the load ran.
    Abandoned(String),
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadError::Fetch(reason) => write!(f, "fetch failed: {}", reason),
            LoadError::Parse(reason) => write!(f, "parse failed: {}", reason),
            LoadError::Empty(path) => write!(f, "{} contains no triangle meshes", path),
            LoadError::Abandoned(path) => write!(f, "load of {} was abandoned", path),
        }
    }
}

impl std::error::Error for LoadError {}
