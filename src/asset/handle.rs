use std::sync::Arc;

use super::cache::LoadSlot;
use super::{LoadError, ModelRef};

#[derive(Debug, Clone)]
pub enum AssetState {
    Loading,
    Ready(ModelRef),
    Failed(LoadError),
}

impl AssetState {
    pub fn is_loading(&self) -> bool {
        matches!(self, AssetState::Loading)
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, AssetState::Ready(_))
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, AssetState::Failed(_))
    }
}

/// The consumer side of one load.
///
/// Starts in `Loading` and moves to `Ready` or `Failed` at most once, when
/// [`AssetHandle::poll`] observes the worker's result. A cancelled handle
/// keeps its last state and ignores anything the worker delivers later.
#[derive(Debug)]
pub struct AssetHandle {
    path: String,
    slot: Option<Arc<LoadSlot>>,
    state: AssetState,
}

impl AssetHandle {
    pub(crate) fn attached(path: &str, slot: Arc<LoadSlot>) -> Self {
        let mut handle = Self {
            path: path.to_string(),
            slot: Some(slot),
            state: AssetState::Loading,
        };
        // Cache hits resolve without waiting for a frame.
        handle.poll();
        handle
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn state(&self) -> &AssetState {
        &self.state
    }

    /// The loaded model. Never delivered for a failed load.
    pub fn model(&self) -> Option<&ModelRef> {
        match &self.state {
            AssetState::Ready(model) => Some(model),
            _ => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.slot.is_none() && self.state.is_loading()
    }

    pub fn poll(&mut self) -> &AssetState {
        if self.state.is_loading() {
            let result = self.slot.as_ref().and_then(|slot| slot.result());
            match result {
                Some(Ok(model)) => self.state = AssetState::Ready(model),
                Some(Err(err)) => self.state = AssetState::Failed(err),
                None => {}
            }
        }
        &self.state
    }

    /// Stops waiting on the load. Idempotent.
    pub fn cancel(&mut self) {
        if let Some(slot) = self.slot.take() {
            slot.detach();
        }
    }
}

impl Drop for AssetHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}
