//! Preview store and handle lifecycle
//!
//! The store is the only shared mutable structure in the core. Handles map
//! 1:1 to stored previews and are consumed at most once: `remove` is
//! atomic, so of two racing removers exactly one gets the preview and the
//! other observes absence. That race is how cancel-vs-execute and
//! execute-vs-execute are serialized.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tracing::debug;

use super::{Preview, PreviewId};

/// Storage abstraction for pending previews
///
/// Injected into the orchestrator; the in-memory implementation fits
/// single-instance deployments, while multi-instance deployments can
/// substitute an external key-value store behind the same trait.
#[async_trait]
pub trait PreviewStore: Send + Sync {
    /// Store a preview under a fresh, unguessable handle
    async fn store(&self, preview: Preview) -> PreviewId;

    /// Resolve a handle without consuming it
    async fn get(&self, id: &PreviewId) -> Option<Preview>;

    /// Consume a handle, returning its preview
    ///
    /// Atomic with respect to concurrent `get`/`remove` on the same
    /// handle: at most one caller gets `Some`.
    async fn remove(&self, id: &PreviewId) -> Option<Preview>;

    /// Number of pending previews
    async fn count(&self) -> usize;
}

struct StoredPreview {
    preview: Preview,
    stored_at: Instant,
}

/// In-memory preview store for single-instance deployments
pub struct InMemoryPreviewStore {
    entries: Mutex<HashMap<PreviewId, StoredPreview>>,
    ttl: Option<Duration>,
}

impl InMemoryPreviewStore {
    /// Create a store whose previews live until consumed
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl: None,
        }
    }

    /// Create a store whose previews also expire after `ttl`
    ///
    /// Expired entries behave exactly like consumed ones: gone for `get`,
    /// `remove`, and the count.
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl: Some(ttl),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<PreviewId, StoredPreview>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn expired(&self, stored: &StoredPreview) -> bool {
        self.ttl.is_some_and(|ttl| stored.stored_at.elapsed() > ttl)
    }
}

impl Default for InMemoryPreviewStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PreviewStore for InMemoryPreviewStore {
    async fn store(&self, preview: Preview) -> PreviewId {
        let id = PreviewId::generate();
        self.lock().insert(
            id,
            StoredPreview {
                preview,
                stored_at: Instant::now(),
            },
        );
        debug!(preview_id = %id, "Stored preview");
        id
    }

    async fn get(&self, id: &PreviewId) -> Option<Preview> {
        let mut entries = self.lock();
        match entries.get(id) {
            Some(stored) if self.expired(stored) => {
                entries.remove(id);
                None
            }
            Some(stored) => Some(stored.preview.clone()),
            None => None,
        }
    }

    async fn remove(&self, id: &PreviewId) -> Option<Preview> {
        let stored = self.lock().remove(id)?;
        if self.expired(&stored) {
            return None;
        }
        debug!(preview_id = %id, "Consumed preview");
        Some(stored.preview)
    }

    async fn count(&self) -> usize {
        let mut entries = self.lock();
        if self.ttl.is_some() {
            entries.retain(|_, stored| !self.expired(stored));
        }
        entries.len()
    }
}
