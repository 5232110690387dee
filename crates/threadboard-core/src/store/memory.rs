//! In-memory document store.

use super::{
    BoxFuture, DocumentStore, Publisher, SequenceGuard, StoreError, StoreResult, Subscription,
    WorkspaceId, WriteOutcome, WriteToken,
};
use crate::shapes::{Annotation, AnnotationDraft, AnnotationId, AnnotationPatch};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
struct WorkspaceState {
    /// Back to front.
    annotations: Vec<Annotation>,
    guard: SequenceGuard,
    subscribers: Vec<Publisher>,
}

impl WorkspaceState {
    fn broadcast(&mut self) {
        let snapshot = self.annotations.clone();
        self.subscribers
            .retain(|publisher| publisher.publish(snapshot.clone()));
    }

    fn position(&self, id: &AnnotationId) -> Option<usize> {
        self.annotations.iter().position(|a| &a.id == id)
    }
}

/// In-memory store for tests, demos and single-process use.
pub struct MemoryStore {
    workspaces: RwLock<HashMap<WorkspaceId, WorkspaceState>>,
    available: AtomicBool,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self {
            workspaces: RwLock::new(HashMap::new()),
            available: AtomicBool::new(true),
        }
    }
}

impl MemoryStore {
    /// Create a new empty memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate an outage: while unavailable every write fails.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Current annotations of a workspace, back to front.
    pub fn snapshot(&self, workspace: &WorkspaceId) -> StoreResult<Vec<Annotation>> {
        let workspaces = self.workspaces.read().map_err(lock_error)?;
        Ok(workspaces
            .get(workspace)
            .map(|state| state.annotations.clone())
            .unwrap_or_default())
    }

    fn check_available(&self) -> StoreResult<()> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StoreError::Unavailable("memory store is offline".into()))
        }
    }
}

fn lock_error<T>(e: std::sync::PoisonError<T>) -> StoreError {
    StoreError::Other(format!("Lock error: {}", e))
}

impl DocumentStore for MemoryStore {
    fn subscribe(&self, workspace: &WorkspaceId) -> StoreResult<Subscription> {
        let (subscription, publisher) = Subscription::channel();
        let mut workspaces = self.workspaces.write().map_err(lock_error)?;
        let state = workspaces.entry(workspace.clone()).or_default();
        publisher.publish(state.annotations.clone());
        state.subscribers.push(publisher);
        Ok(subscription)
    }

    fn create(
        &self,
        workspace: &WorkspaceId,
        draft: AnnotationDraft,
    ) -> BoxFuture<'_, StoreResult<AnnotationId>> {
        let workspace = workspace.clone();
        Box::pin(async move {
            self.check_available()?;
            let id = AnnotationId::new(Uuid::new_v4().to_string());
            let mut workspaces = self.workspaces.write().map_err(lock_error)?;
            let state = workspaces.entry(workspace).or_default();
            state.annotations.push(draft.into_annotation(id.clone()));
            state.broadcast();
            Ok(id)
        })
    }

    fn update(
        &self,
        workspace: &WorkspaceId,
        id: &AnnotationId,
        patch: &AnnotationPatch,
        token: Option<WriteToken>,
    ) -> BoxFuture<'_, StoreResult<WriteOutcome>> {
        let workspace = workspace.clone();
        let id = id.clone();
        let patch = patch.clone();
        Box::pin(async move {
            self.check_available()?;
            let mut workspaces = self.workspaces.write().map_err(lock_error)?;
            let state = workspaces
                .get_mut(&workspace)
                .ok_or_else(|| StoreError::NotFound(id.clone()))?;
            let index = state
                .position(&id)
                .ok_or_else(|| StoreError::NotFound(id.clone()))?;
            if !state.guard.admit(&id, token.as_ref()) {
                log::debug!("Dropping stale write to {}", id);
                return Ok(WriteOutcome::Stale);
            }
            state.annotations[index].apply_patch(&patch);
            state.broadcast();
            Ok(WriteOutcome::Applied)
        })
    }

    fn delete(&self, workspace: &WorkspaceId, id: &AnnotationId) -> BoxFuture<'_, StoreResult<()>> {
        let workspace = workspace.clone();
        let id = id.clone();
        Box::pin(async move {
            self.check_available()?;
            let mut workspaces = self.workspaces.write().map_err(lock_error)?;
            let state = workspaces
                .get_mut(&workspace)
                .ok_or_else(|| StoreError::NotFound(id.clone()))?;
            let index = state
                .position(&id)
                .ok_or_else(|| StoreError::NotFound(id.clone()))?;
            state.annotations.remove(index);
            state.guard.forget(&id);
            state.broadcast();
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Frame;
    use crate::shapes::{BoxKind, BoxShape, LifecycleStatus, Shape, ShapeStyle};
    use pollster::block_on;

    fn workspace() -> WorkspaceId {
        WorkspaceId::new("design-review")
    }

    fn rect_draft() -> AnnotationDraft {
        AnnotationDraft::new(
            Shape::Box(BoxShape::new(BoxKind::Rectangle, Frame::new(0.0, 0.0, 50.0, 50.0))),
            ShapeStyle::default(),
            "ana",
        )
    }

    fn token(seq: u64) -> Option<WriteToken> {
        Some(WriteToken {
            writer: "client".into(),
            gesture: 1,
            seq,
        })
    }

    #[test]
    fn test_create_assigns_distinct_ids() {
        let store = MemoryStore::new();
        let a = block_on(store.create(&workspace(), rect_draft())).unwrap();
        let b = block_on(store.create(&workspace(), rect_draft())).unwrap();
        assert_ne!(a, b);
        let snapshot = store.snapshot(&workspace()).unwrap();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot[0].id, a);
    }

    #[test]
    fn test_subscribe_delivers_snapshots() {
        let store = MemoryStore::new();
        let sub = store.subscribe(&workspace()).unwrap();
        assert_eq!(sub.latest(), Some(Vec::new()));

        let id = block_on(store.create(&workspace(), rect_draft())).unwrap();
        block_on(store.update(
            &workspace(),
            &id,
            &AnnotationPatch::status(LifecycleStatus::Resolved),
            None,
        ))
        .unwrap();

        let latest = sub.latest().unwrap();
        assert_eq!(latest.len(), 1);
        assert_eq!(latest[0].status, LifecycleStatus::Resolved);
        assert!(sub.latest().is_none());
    }

    #[test]
    fn test_update_merges_fields() {
        let store = MemoryStore::new();
        let id = block_on(store.create(&workspace(), rect_draft())).unwrap();
        block_on(store.update(&workspace(), &id, &AnnotationPatch::rotation(15.0), None)).unwrap();
        let annotation = &store.snapshot(&workspace()).unwrap()[0];
        assert!((annotation.shape.rotation() - 15.0).abs() < f64::EPSILON);
        assert_eq!(annotation.shape.frame().unwrap().width, 50.0);
    }

    #[test]
    fn test_stale_write_is_dropped() {
        let store = MemoryStore::new();
        let id = block_on(store.create(&workspace(), rect_draft())).unwrap();
        let final_write = AnnotationPatch::rotation(90.0);
        let late = AnnotationPatch::rotation(10.0);
        let outcome = block_on(store.update(&workspace(), &id, &final_write, token(3))).unwrap();
        assert_eq!(outcome, WriteOutcome::Applied);
        let outcome = block_on(store.update(&workspace(), &id, &late, token(2))).unwrap();
        assert_eq!(outcome, WriteOutcome::Stale);
        let annotation = &store.snapshot(&workspace()).unwrap()[0];
        assert!((annotation.shape.rotation() - 90.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_update_missing_annotation() {
        let store = MemoryStore::new();
        block_on(store.create(&workspace(), rect_draft())).unwrap();
        let err = block_on(store.update(
            &workspace(),
            &AnnotationId::from("ghost"),
            &AnnotationPatch::rotation(1.0),
            None,
        ))
        .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[test]
    fn test_delete() {
        let store = MemoryStore::new();
        let id = block_on(store.create(&workspace(), rect_draft())).unwrap();
        block_on(store.delete(&workspace(), &id)).unwrap();
        assert!(store.snapshot(&workspace()).unwrap().is_empty());
        assert!(block_on(store.delete(&workspace(), &id)).is_err());
    }

    #[test]
    fn test_offline_store_fails_writes() {
        let store = MemoryStore::new();
        store.set_available(false);
        let err = block_on(store.create(&workspace(), rect_draft())).unwrap_err();
        assert!(matches!(err, StoreError::Unavailable(_)));
        store.set_available(true);
        assert!(block_on(store.create(&workspace(), rect_draft())).is_ok());
    }

    #[test]
    fn test_unread_snapshots_are_replaced() {
        let store = MemoryStore::new();
        let sub = store.subscribe(&workspace()).unwrap();
        let id = block_on(store.create(&workspace(), rect_draft())).unwrap();
        for step in 1..=50 {
            let patch = AnnotationPatch::rotation(f64::from(step));
            block_on(store.update(&workspace(), &id, &patch, None)).unwrap();
        }

        let latest = sub.latest().unwrap();
        assert!((latest[0].shape.rotation() - 50.0).abs() < f64::EPSILON);
        assert!(sub.latest().is_none());
    }

    #[test]
    fn test_dropped_subscriber_is_pruned() {
        let store = MemoryStore::new();
        drop(store.subscribe(&workspace()).unwrap());
        block_on(store.create(&workspace(), rect_draft())).unwrap();
        let workspaces = store.workspaces.read().unwrap();
        assert!(workspaces[&workspace()].subscribers.is_empty());
    }
}
