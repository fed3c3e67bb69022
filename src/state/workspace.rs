use std::collections::HashMap;

use tracing::{debug, error, warn};

use super::data::WorkspaceState;
use super::error::StoreResult;
use super::preferences::{KeyValueStore, WORKSPACE_KEY};

pub type WorkspaceMap = HashMap<String, WorkspaceState>;

/// Persisted map from catalog-entry key to its viewing state.
pub struct WorkspaceStore<S: KeyValueStore> {
    backend: S,
}

impl<S: KeyValueStore> WorkspaceStore<S> {
    pub fn new(backend: S) -> Self {
        Self { backend }
    }

    /// Whole map; anything unreadable yields an empty map
    pub fn load_all(&self) -> WorkspaceMap {
        match self.backend.get(WORKSPACE_KEY) {
            Ok(Some(raw)) if !raw.is_empty() => match serde_json::from_slice(&raw) {
                Ok(map) => map,
                Err(e) => {
                    warn!(error = %e, "failed to decode workspace state, starting empty");
                    WorkspaceMap::new()
                }
            },
            Ok(_) => WorkspaceMap::new(),
            Err(e) => {
                error!(error = %e, "failed to read workspace state");
                WorkspaceMap::new()
            }
        }
    }

    /// Overwrite the whole map. Failures are logged and the previous blob stays.
    pub fn save_all(&self, map: &WorkspaceMap) {
        if let Err(e) = self.try_save_all(map) {
            error!(error = %e, entries = map.len(), "failed to save workspace state");
        }
    }

    fn try_save_all(&self, map: &WorkspaceMap) -> StoreResult<()> {
        let encoded = serde_json::to_vec(map)?;
        self.backend.set(WORKSPACE_KEY, &encoded)
    }

    /// Start a viewing session for one entry
    pub fn open_session(&self, key: impl Into<String>, image_count: usize) -> WorkspaceSession {
        WorkspaceSession::begin(self.load_all(), key.into(), image_count)
    }

    #[cfg(test)]
    pub(crate) fn backend(&self) -> &S {
        &self.backend
    }
}

/// Edits to one entry's workspace state, written back as a whole on `commit`.
///
/// The map is loaded once when the session starts; edits touch only the local
/// copy until the screen is dismissed (or reset).
#[derive(Debug, Clone, PartialEq)]
pub struct WorkspaceSession {
    map: WorkspaceMap,
    key: String,
    image_count: usize,
    local: WorkspaceState,
}

impl WorkspaceSession {
    fn begin(map: WorkspaceMap, key: String, image_count: usize) -> Self {
        let local = map
            .get(&key)
            .cloned()
            .unwrap_or_else(|| WorkspaceState::for_images(image_count));
        debug!(key = %key, image_count, "workspace session started");
        Self {
            map,
            key,
            image_count,
            local,
        }
    }

    pub fn image_count(&self) -> usize {
        self.image_count.max(1)
    }

    pub fn state(&self) -> &WorkspaceState {
        &self.local
    }

    pub fn state_mut(&mut self) -> &mut WorkspaceState {
        &mut self.local
    }

    /// Fresh counters and markers, saved right away
    pub fn reset<S: KeyValueStore>(&mut self, store: &WorkspaceStore<S>) {
        self.local.reset(self.image_count);
        self.commit(store);
    }

    /// Write the local state into the map and persist the whole map
    pub fn commit<S: KeyValueStore>(&mut self, store: &WorkspaceStore<S>) {
        self.map.insert(self.key.clone(), self.local.clone());
        store.save_all(&self.map);
        debug!(key = %self.key, "workspace session saved");
    }
}
