use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::cache::LoadSlot;
use super::{AssetHandle, LoadError, Model, ModelCache};

/// Where asset bytes come from. `fetch` runs on a worker thread.
pub trait AssetSource: Send + Sync + 'static {
    fn fetch(&self, path: &str) -> Result<Vec<u8>, String>;

    /// URL the web build downloads `path` from without blocking. Sources
    /// returning `None` are read through [`AssetSource::fetch`].
    fn url(&self, _path: &str) -> Option<String> {
        None
    }
}

/// Reads assets relative to a root directory (or the page origin on the web).
#[derive(Debug, Clone)]
pub struct FsSource {
    root: PathBuf,
}

impl FsSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl Default for FsSource {
    fn default() -> Self {
        Self::new(".")
    }
}

impl FsSource {
    fn resolve(&self, path: &str) -> PathBuf {
        self.root.join(path.trim_start_matches('/'))
    }
}

impl AssetSource for FsSource {
    #[cfg(not(target_arch = "wasm32"))]
    fn fetch(&self, path: &str) -> Result<Vec<u8>, String> {
        crate::io::load_binary(&self.resolve(path))
    }

    #[cfg(target_arch = "wasm32")]
    fn fetch(&self, path: &str) -> Result<Vec<u8>, String> {
        Err(format!("{} has no URL to download from", path))
    }

    #[cfg(target_arch = "wasm32")]
    fn url(&self, path: &str) -> Option<String> {
        crate::io::web_url(&self.resolve(path)).ok()
    }
}

/// Starts model loads off the render thread and hands out [`AssetHandle`]s.
///
/// Loads are deduplicated per path through the loader's [`ModelCache`], which
/// outlives individual mounts.
pub struct AssetLoader {
    source: Arc<dyn AssetSource>,
    cache: ModelCache,
}

impl AssetLoader {
    pub fn new<S: AssetSource>(source: S) -> Self {
        Self {
            source: Arc::new(source),
            cache: ModelCache::new(),
        }
    }

    pub fn cache(&self) -> &ModelCache {
        &self.cache
    }

    pub fn cache_mut(&mut self) -> &mut ModelCache {
        &mut self.cache
    }

    /// Begins loading `path`. Never blocks.
    pub fn load(&mut self, path: &str) -> AssetHandle {
        if let Some(slot) = self.cache.attach(path) {
            log::debug!("Reusing cached load for {}", path);
            return AssetHandle::attached(path, slot);
        }

        let slot = LoadSlot::attached();
        self.cache.insert(path, slot.clone());
        self.spawn(path.to_string(), slot.clone());
        AssetHandle::attached(path, slot)
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn spawn(&self, path: String, slot: Arc<LoadSlot>) {
        let source = self.source.clone();
        rayon::spawn(move || run_load(source.as_ref(), &path, &slot));
    }

    #[cfg(target_arch = "wasm32")]
    fn spawn(&self, path: String, slot: Arc<LoadSlot>) {
        let source = self.source.clone();
        wasm_bindgen_futures::spawn_local(async move {
            let Some(url) = source.url(&path) else {
                run_load(source.as_ref(), &path, &slot);
                return;
            };
            if !slot.still_wanted(&path) {
                log::debug!("Skipping load of {}: no longer needed", path);
                return;
            }
            let bytes = crate::io::fetch_binary(&url).await;
            finish_load(&path, &slot, bytes);
        });
    }
}

fn run_load(source: &dyn AssetSource, path: &str, slot: &LoadSlot) {
    if !slot.still_wanted(path) {
        log::debug!("Skipping load of {}: no longer needed", path);
        return;
    }

    finish_load(path, slot, source.fetch(path));
}

/// Parses fetched bytes into the slot unless every handle has gone away.
fn finish_load(path: &str, slot: &LoadSlot, bytes: Result<Vec<u8>, String>) {
    if !slot.still_wanted(path) {
        log::debug!("Dropping fetched bytes for {}: no longer needed", path);
        return;
    }

    let result = bytes
        .map_err(LoadError::Fetch)
        .and_then(|bytes| Model::from_gltf_bytes(path, &bytes))
        .map(Arc::new);
    slot.complete(result);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FailingSource {
        calls: Arc<AtomicUsize>,
    }

    impl AssetSource for FailingSource {
        fn fetch(&self, path: &str) -> Result<Vec<u8>, String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(format!("{} is not here", path))
        }
    }

    #[test]
    fn run_load_skips_fetch_when_nobody_waits() {
        let calls = Arc::new(AtomicUsize::new(0));
        let source = FailingSource {
            calls: calls.clone(),
        };
        let slot = LoadSlot::attached();
        slot.detach();

        run_load(&source, "late.glb", &slot);

        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(matches!(slot.result(), Some(Err(LoadError::Abandoned(_)))));
    }

    #[test]
    fn run_load_records_fetch_error() {
        let calls = Arc::new(AtomicUsize::new(0));
        let source = FailingSource {
            calls: calls.clone(),
        };
        let slot = LoadSlot::attached();

        run_load(&source, "missing.glb", &slot);

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        match slot.result() {
            Some(Err(LoadError::Fetch(reason))) => assert!(reason.contains("missing.glb")),
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn fetched_bytes_are_discarded_once_abandoned() {
        let slot = LoadSlot::attached();
        slot.detach();

        finish_load("late.glb", &slot, Ok(b"not parsed".to_vec()));

        assert!(matches!(slot.result(), Some(Err(LoadError::Abandoned(_)))));
    }

    #[test]
    fn sources_without_url_are_fetched_directly() {
        let source = FailingSource {
            calls: Arc::new(AtomicUsize::new(0)),
        };
        assert_eq!(source.url("models/watch.glb"), None);
        assert_eq!(FsSource::default().url("models/watch.glb"), None);
    }

    #[test]
    fn fs_source_resolves_against_root() {
        let source = FsSource::new("no-such-root");
        let err = source.fetch("/models/watch.glb").unwrap_err();
        assert!(err.contains("watch.glb"), "{}", err);
        assert_eq!(source.root(), Path::new("no-such-root"));
    }
}
