use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use super::{LoadError, ModelRef};

#[derive(Debug)]
enum SlotState {
    Pending,
    Done(Result<ModelRef, LoadError>),
}

#[derive(Debug)]
struct SlotInner {
    state: SlotState,
    interest: usize,
}

/// Result cell for one in-flight or finished load, shared between the
/// worker, the cache and every handle waiting on it.
#[derive(Debug)]
pub struct LoadSlot {
    inner: Mutex<SlotInner>,
}

impl LoadSlot {
    /// Creates a pending slot with one interested handle already attached.
    pub(crate) fn attached() -> Arc<Self> {
        Arc::new(Self {
            inner: Mutex::new(SlotInner {
                state: SlotState::Pending,
                interest: 1,
            }),
        })
    }

    fn lock(&self) -> MutexGuard<'_, SlotInner> {
        // A panicking worker cannot leave the slot half-written.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Registers another interested handle. Fails for failed or abandoned
    /// slots, which must not be reused.
    pub(crate) fn attach(&self) -> bool {
        let mut inner = self.lock();
        if matches!(inner.state, SlotState::Done(Err(_))) {
            return false;
        }
        inner.interest += 1;
        true
    }

    pub(crate) fn detach(&self) {
        let mut inner = self.lock();
        inner.interest = inner.interest.saturating_sub(1);
    }

    /// Called by the worker before each expensive step. Marks the slot
    /// abandoned and returns false once nobody is waiting.
    pub(crate) fn still_wanted(&self, path: &str) -> bool {
        let mut inner = self.lock();
        if inner.interest > 0 {
            return true;
        }
        if matches!(inner.state, SlotState::Pending) {
            inner.state = SlotState::Done(Err(LoadError::Abandoned(path.to_string())));
        }
        false
    }

    pub(crate) fn complete(&self, result: Result<ModelRef, LoadError>) {
        let mut inner = self.lock();
        if matches!(inner.state, SlotState::Pending) {
            inner.state = SlotState::Done(result);
        }
    }

    /// Returns the finished result, if any.
    pub(crate) fn result(&self) -> Option<Result<ModelRef, LoadError>> {
        match &self.lock().state {
            SlotState::Pending => None,
            SlotState::Done(result) => Some(result.clone()),
        }
    }

    fn is_reusable(&self) -> bool {
        !matches!(self.lock().state, SlotState::Done(Err(_)))
    }
}

/// Per-path load slots kept across mounts.
///
/// Ready and pending slots are shared so a path is fetched at most once.
/// Failed or abandoned slots are evicted on lookup so the next mount makes
/// its own attempt.
#[derive(Debug, Default)]
pub struct ModelCache {
    slots: HashMap<String, Arc<LoadSlot>>,
}

impl ModelCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches to an existing reusable slot for `path`.
    pub(crate) fn attach(&mut self, path: &str) -> Option<Arc<LoadSlot>> {
        let slot = self.slots.get(path)?.clone();
        if slot.attach() {
            return Some(slot);
        }
        log::debug!("Evicting failed load slot for {}", path);
        self.slots.remove(path);
        None
    }

    pub(crate) fn insert(&mut self, path: &str, slot: Arc<LoadSlot>) {
        self.slots.insert(path.to_string(), slot);
    }

    /// Finished models currently held.
    pub fn ready_count(&self) -> usize {
        self.slots
            .values()
            .filter(|slot| matches!(slot.result(), Some(Ok(_))))
            .count()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.slots
            .get(path)
            .map(|slot| slot.is_reusable())
            .unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn clear(&mut self) {
        self.slots.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::{MeshData, Model};
    use glam::Mat4;

    fn model() -> ModelRef {
        Arc::new(
            Model::from_meshes(
                "tri",
                vec![MeshData {
                    positions: vec![[0.0; 3], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
                    normals: vec![[0.0, 0.0, 1.0]; 3],
                    indices: vec![0, 1, 2],
                    transform: Mat4::IDENTITY,
                    base_color: [1.0; 4],
                }],
            )
            .unwrap(),
        )
    }

    #[test]
    fn slot_is_abandoned_once_interest_drops_to_zero() {
        let slot = LoadSlot::attached();
        assert!(slot.still_wanted("a.glb"));
        slot.detach();
        assert!(!slot.still_wanted("a.glb"));
        assert!(matches!(slot.result(), Some(Err(LoadError::Abandoned(_)))));
        assert!(!slot.attach());
    }

    #[test]
    fn completion_is_written_once() {
        let slot = LoadSlot::attached();
        slot.complete(Ok(model()));
        slot.complete(Err(LoadError::Fetch("late".into())));
        assert!(matches!(slot.result(), Some(Ok(_))));
    }

    #[test]
    fn cache_shares_ready_slots_and_evicts_failed_ones() {
        let mut cache = ModelCache::new();

        let ready = LoadSlot::attached();
        ready.complete(Ok(model()));
        cache.insert("ok.glb", ready.clone());

        let failed = LoadSlot::attached();
        failed.complete(Err(LoadError::Fetch("404".into())));
        cache.insert("bad.glb", failed);

        let shared = cache.attach("ok.glb").expect("ready slot is reusable");
        assert!(Arc::ptr_eq(&shared, &ready));
        assert!(cache.attach("bad.glb").is_none());
        assert!(!cache.contains("bad.glb"));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.ready_count(), 1);
    }
}
