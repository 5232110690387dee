//! Document store abstraction for annotation persistence and live sync.

mod memory;

pub use memory::MemoryStore;

use crate::shapes::{Annotation, AnnotationDraft, AnnotationId, AnnotationPatch};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError, Weak};
use thiserror::Error;

/// Store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Annotation not found: {0}")]
    NotFound(AnnotationId),
    #[error("Store unavailable: {0}")]
    Unavailable(String),
    #[error("Store error: {0}")]
    Other(String),
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Boxed future for async operations.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// Name of a shared workspace (one document of annotations).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkspaceId(String);

impl WorkspaceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WorkspaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifies one client session issuing writes.
pub type WriterId = String;

/// Ordering stamp on writes produced by a gesture.
///
/// Tokens from the same writer compare by `(gesture, seq)`: a later gesture
/// supersedes every write of an earlier one, and within a gesture the final
/// commit carries the highest sequence number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteToken {
    pub writer: WriterId,
    pub gesture: u64,
    pub seq: u64,
}

impl WriteToken {
    fn order(&self) -> (u64, u64) {
        (self.gesture, self.seq)
    }
}

/// What the store did with an update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Applied,
    /// Dropped because a newer write from the same writer already landed.
    Stale,
}

/// Rejects out-of-order tokened writes.
///
/// Remembers, per annotation and writer, the newest token applied. Writes
/// without a token are always admitted.
#[derive(Debug, Default)]
pub struct SequenceGuard {
    latest: HashMap<(AnnotationId, WriterId), (u64, u64)>,
}

impl SequenceGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` and records the token if it is newer than anything seen.
    pub fn admit(&mut self, id: &AnnotationId, token: Option<&WriteToken>) -> bool {
        let Some(token) = token else {
            return true;
        };
        let key = (id.clone(), token.writer.clone());
        match self.latest.get(&key) {
            Some(latest) if *latest >= token.order() => false,
            _ => {
                self.latest.insert(key, token.order());
                true
            }
        }
    }

    /// Forget everything recorded for a deleted annotation.
    pub fn forget(&mut self, id: &AnnotationId) {
        self.latest.retain(|(annotation, _), _| annotation != id);
    }
}

type Slot = Mutex<Option<Vec<Annotation>>>;

/// Live feed of a workspace's annotations.
///
/// Each snapshot is complete, in z-order, back to front. Only the newest
/// unread snapshot is held; a newer one replaces it.
pub struct Subscription {
    slot: Arc<Slot>,
}

/// Store-side end of a [`Subscription`].
pub struct Publisher {
    slot: Weak<Slot>,
}

impl Subscription {
    /// A connected subscription and publisher pair.
    pub fn channel() -> (Subscription, Publisher) {
        let slot = Arc::new(Mutex::new(None));
        let publisher = Publisher {
            slot: Arc::downgrade(&slot),
        };
        (Subscription { slot }, publisher)
    }

    /// The newest snapshot published since the last call, if any.
    pub fn latest(&self) -> Option<Vec<Annotation>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner).take()
    }
}

impl Publisher {
    /// Replace the unread snapshot. Returns `false` once the subscription
    /// has been dropped.
    pub fn publish(&self, snapshot: Vec<Annotation>) -> bool {
        let Some(slot) = self.slot.upgrade() else {
            return false;
        };
        *slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(snapshot);
        true
    }
}

/// Trait for annotation store backends.
///
/// The store owns annotation ids and is the source of truth; clients
/// subscribe to snapshots and send merge-style updates.
pub trait DocumentStore: Send + Sync {
    /// Subscribe to a workspace. The current snapshot is delivered at once.
    fn subscribe(&self, workspace: &WorkspaceId) -> StoreResult<Subscription>;

    /// Persist a new annotation and return its assigned id.
    fn create(
        &self,
        workspace: &WorkspaceId,
        draft: AnnotationDraft,
    ) -> BoxFuture<'_, StoreResult<AnnotationId>>;

    /// Merge `patch` into an annotation.
    fn update(
        &self,
        workspace: &WorkspaceId,
        id: &AnnotationId,
        patch: &AnnotationPatch,
        token: Option<WriteToken>,
    ) -> BoxFuture<'_, StoreResult<WriteOutcome>>;

    /// Remove an annotation.
    fn delete(&self, workspace: &WorkspaceId, id: &AnnotationId) -> BoxFuture<'_, StoreResult<()>>;
}
