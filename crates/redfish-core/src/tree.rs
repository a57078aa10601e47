//! Read-only view over the projected resource tree.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::CoreResult;
use crate::resource::{Resource, ResourceId};

/// Point-in-time mapping from URI to resource id.
///
/// Snapshots are immutable once published; the projector builds a new one
/// for every change.
#[derive(Debug, Clone, Default)]
pub struct TreeSnapshot {
    uris: HashMap<String, ResourceId>,
}

impl TreeSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up `uri`, tolerating a single trailing slash.
    pub fn get(&self, uri: &str) -> Option<ResourceId> {
        if let Some(id) = self.uris.get(uri) {
            return Some(*id);
        }
        let trimmed = uri.strip_suffix('/')?;
        self.uris.get(trimmed).copied()
    }

    pub fn contains(&self, uri: &str) -> bool {
        self.get(uri).is_some()
    }

    pub fn insert(&mut self, uri: impl Into<String>, id: ResourceId) {
        self.uris.insert(uri.into(), id);
    }

    pub fn remove(&mut self, uri: &str) -> Option<ResourceId> {
        self.uris.remove(uri)
    }

    pub fn len(&self) -> usize {
        self.uris.len()
    }

    pub fn is_empty(&self) -> bool {
        self.uris.is_empty()
    }

    pub fn uris(&self) -> impl Iterator<Item = &str> {
        self.uris.keys().map(String::as_str)
    }
}

/// Read access to the resource tree and individual resource records.
///
/// The view is eventually consistent: a resource created or removed a moment
/// ago may not be reflected yet. A `None` result is a normal outcome.
#[async_trait]
pub trait ResourceTreeView: Send + Sync {
    /// Current snapshot of the URI map.
    async fn tree(&self) -> CoreResult<Arc<TreeSnapshot>>;

    /// Fetch a resource record by id.
    async fn find(&self, id: ResourceId) -> CoreResult<Option<Arc<Resource>>>;

    /// Resolve a URI to its resource record through the current snapshot.
    async fn resolve(&self, uri: &str) -> CoreResult<Option<Arc<Resource>>> {
        let tree = self.tree().await?;
        match tree.get(uri) {
            Some(id) => self.find(id).await,
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_snapshot_trailing_slash() {
        let id = Uuid::new_v4();
        let mut tree = TreeSnapshot::new();
        tree.insert("/redfish/v1/SessionService", id);

        assert_eq!(tree.get("/redfish/v1/SessionService"), Some(id));
        assert_eq!(tree.get("/redfish/v1/SessionService/"), Some(id));
        assert_eq!(tree.get("/redfish/v1/Other"), None);
    }

    #[test]
    fn test_snapshot_remove() {
        let id = Uuid::new_v4();
        let mut tree = TreeSnapshot::new();
        tree.insert("/a", id);
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.remove("/a"), Some(id));
        assert!(tree.is_empty());
        assert!(!tree.contains("/a"));
    }

    /// View whose tree lists a URI that has no record behind it.
    struct StaleView {
        tree: Arc<TreeSnapshot>,
        record: Arc<Resource>,
    }

    #[async_trait]
    impl ResourceTreeView for StaleView {
        async fn tree(&self) -> CoreResult<Arc<TreeSnapshot>> {
            Ok(Arc::clone(&self.tree))
        }

        async fn find(&self, id: ResourceId) -> CoreResult<Option<Arc<Resource>>> {
            Ok((id == self.record.id).then(|| Arc::clone(&self.record)))
        }
    }

    #[test]
    fn test_resolve_goes_through_snapshot() {
        let record = Arc::new(Resource::new(Uuid::new_v4(), "/redfish/v1"));
        let mut tree = TreeSnapshot::new();
        tree.insert("/redfish/v1", record.id);
        tree.insert("/redfish/v1/Gone", Uuid::new_v4());
        let view = StaleView {
            tree: Arc::new(tree),
            record,
        };

        let found = tokio_test::block_on(view.resolve("/redfish/v1/")).unwrap();
        assert_eq!(found.unwrap().uri, "/redfish/v1");
        assert!(tokio_test::block_on(view.resolve("/redfish/v1/Gone")).unwrap().is_none());
        assert!(tokio_test::block_on(view.resolve("/nope")).unwrap().is_none());
    }
}
