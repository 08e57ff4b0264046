//! Shared fixtures for the integration tests.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use hero_panel::asset::{AssetHandle, AssetSource, AssetState};

pub const TRIANGLE_PATH: &str = "models/triangle.gltf";

/// A single unindexed triangle in the XY plane with its buffer inlined as a
/// base64 data URI.
pub fn triangle_gltf() -> Vec<u8> {
    let positions: [[f32; 3]; 3] = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]];
    let bytes: Vec<u8> = positions
        .iter()
        .flatten()
        .flat_map(|v| v.to_le_bytes())
        .collect();
    let uri = format!(
        "data:application/octet-stream;base64,{}",
        base64::encode(&bytes)
    );

    let document = serde_json::json!({
        "asset": { "version": "2.0" },
        "scene": 0,
        "scenes": [{ "nodes": [0] }],
        "nodes": [{ "mesh": 0 }],
        "meshes": [{ "primitives": [{ "attributes": { "POSITION": 0 } }] }],
        "buffers": [{ "byteLength": bytes.len(), "uri": uri }],
        "bufferViews": [{ "buffer": 0, "byteOffset": 0, "byteLength": bytes.len() }],
        "accessors": [{
            "bufferView": 0,
            "componentType": 5126,
            "count": 3,
            "type": "VEC3",
            "min": [0.0, 0.0, 0.0],
            "max": [1.0, 1.0, 0.0]
        }]
    });
    serde_json::to_vec(&document).unwrap()
}

/// In-memory source that counts fetches per path.
#[derive(Clone, Default)]
pub struct MemorySource {
    files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    fetches: Arc<Mutex<HashMap<String, usize>>>,
}

impl MemorySource {
    pub fn with_triangle() -> Self {
        let source = Self::default();
        source.insert(TRIANGLE_PATH, triangle_gltf());
        source
    }

    pub fn insert(&self, path: &str, bytes: Vec<u8>) {
        self.files.lock().unwrap().insert(path.to_string(), bytes);
    }

    pub fn fetches(&self, path: &str) -> usize {
        self.fetches.lock().unwrap().get(path).copied().unwrap_or(0)
    }
}

impl AssetSource for MemorySource {
    fn fetch(&self, path: &str) -> Result<Vec<u8>, String> {
        *self
            .fetches
            .lock()
            .unwrap()
            .entry(path.to_string())
            .or_default() += 1;
        self.files
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .ok_or_else(|| format!("{} not found", path))
    }
}

/// Source whose fetches block until the returned sender is dropped, then fail.
pub struct StalledSource {
    gate: Mutex<Receiver<()>>,
    started: Arc<AtomicUsize>,
}

impl StalledSource {
    pub fn new() -> (Self, Sender<()>, Arc<AtomicUsize>) {
        let (tx, rx) = mpsc::channel();
        let started = Arc::new(AtomicUsize::new(0));
        let source = Self {
            gate: Mutex::new(rx),
            started: started.clone(),
        };
        (source, tx, started)
    }
}

impl AssetSource for StalledSource {
    fn fetch(&self, path: &str) -> Result<Vec<u8>, String> {
        self.started.fetch_add(1, Ordering::SeqCst);
        let _ = self.gate.lock().unwrap().recv();
        Err(format!("{} released without data", path))
    }
}

/// Polls until the handle leaves `Loading`.
pub fn wait_for(handle: &mut AssetHandle) -> AssetState {
    for _ in 0..1000 {
        let state = handle.poll();
        if !state.is_loading() {
            return state.clone();
        }
        std::thread::sleep(Duration::from_millis(2));
    }
    panic!("load of {} never resolved", handle.path());
}
