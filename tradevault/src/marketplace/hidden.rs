//! Locally hidden (delisted) resources.

use std::collections::BTreeSet;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, warn};

use crate::config::HIDDEN_SET_KEY;
use crate::error::{VaultError, VaultResult};
use crate::traits::KeyValueStore;

/// Lower-cased resource identifiers the user has delisted.
///
/// Persisted as a JSON array of strings under [`HIDDEN_SET_KEY`]. Membership
/// only grows: there is no removal operation.
///
/// Clones share one session copy. Every successful read of the store is
/// merged into it and a failed or malformed read falls back to it, so an
/// identifier hidden in this session stays hidden even when local storage
/// misbehaves.
#[derive(Debug, Clone)]
pub struct HiddenSet<S: KeyValueStore> {
    store: S,
    session: Arc<RwLock<BTreeSet<String>>>,
}

fn normalize(resource: &str) -> String {
    resource.trim().to_lowercase()
}

impl<S: KeyValueStore> HiddenSet<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            session: Arc::new(RwLock::new(BTreeSet::new())),
        }
    }

    fn read_store(&self) -> Option<Vec<String>> {
        let raw = match self.store.get(HIDDEN_SET_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Some(Vec::new()),
            Err(e) => {
                warn!("Failed to read hidden set, using session copy: {}", e);
                return None;
            }
        };
        match serde_json::from_str::<Vec<String>>(&raw) {
            Ok(ids) => Some(ids),
            Err(e) => {
                warn!("Ignoring malformed hidden set, using session copy: {}", e);
                None
            }
        }
    }

    /// Current membership: the session copy merged with whatever the store holds.
    pub fn load(&self) -> BTreeSet<String> {
        let stored = self.read_store();
        let mut session = self.session.write();
        if let Some(ids) = stored {
            session.extend(ids.iter().map(|id| normalize(id)).filter(|id| !id.is_empty()));
        }
        session.clone()
    }

    /// Whether `resource` has been hidden (case-insensitive).
    pub fn contains(&self, resource: &str) -> bool {
        self.load().contains(&normalize(resource))
    }

    /// Hide a resource. Returns `Ok(true)` if it was not hidden before.
    ///
    /// The identifier joins the session copy before the write, so it stays
    /// hidden for this session even when persisting fails with
    /// [`VaultError::Storage`].
    pub fn insert(&self, resource: &str) -> VaultResult<bool> {
        let id = normalize(resource);
        if id.is_empty() {
            return Ok(false);
        }
        if self.load().contains(&id) {
            return Ok(false);
        }

        let ids = {
            let mut session = self.session.write();
            session.insert(id.clone());
            session.iter().cloned().collect::<Vec<_>>()
        };
        let serialized = serde_json::to_string(&ids)?;
        self.store
            .set(HIDDEN_SET_KEY, &serialized)
            .map_err(|e| VaultError::Storage(format!("Failed to persist hidden set: {e}")))?;
        debug!("Hid resource {} ({} hidden)", id, ids.len());
        Ok(true)
    }
}
