use std::sync::Arc;

use arc_swap::ArcSwap;
use async_trait::async_trait;
use dashmap::DashMap;
use redfish_core::events::{Event, MembershipEvent, ResourceEvent};
use redfish_core::{
    Command, CommandBus, CoreError, CoreResult, EventBus, Resource, ResourceId, ResourceTreeView,
    TreeSnapshot,
};
use serde_json::{Value, json};
use tokio::sync::Mutex;

use crate::projector;

/// In-memory resource store.
///
/// This store provides:
/// - A command bus with writes serialized through a single async lock
/// - Lock-free reads of resource records via `DashMap`
/// - A projected URI tree published atomically via `ArcSwap`
/// - Event emission on the shared [`EventBus`] after each applied change
///
/// The tree is updated before the corresponding event is published, so a
/// listener reacting to `ResourceRemoved` already sees the resource gone.
pub struct InMemoryStore {
    records: DashMap<ResourceId, Arc<Resource>>,
    tree: ArcSwap<TreeSnapshot>,
    write_lock: Mutex<()>,
    events: EventBus,
}

impl InMemoryStore {
    pub fn new(events: EventBus) -> Self {
        Self {
            records: DashMap::new(),
            tree: ArcSwap::from_pointee(TreeSnapshot::new()),
            write_lock: Mutex::new(()),
            events,
        }
    }

    /// Creates a new store wrapped in an Arc for sharing.
    pub fn new_shared(events: EventBus) -> Arc<Self> {
        Arc::new(Self::new(events))
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Number of stored resources.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Applies the event to the tree, then publishes it.
    fn emit(&self, event: Event) {
        if let Some(next) = projector::project(&self.tree.load(), &event) {
            self.tree.store(Arc::new(next));
        }
        self.events.publish(event);
    }

    fn create(&self, resource: Resource) -> CoreResult<()> {
        if resource.uri.is_empty() || !resource.uri.starts_with('/') {
            return Err(CoreError::invalid_resource(format!(
                "resource URI must be absolute, got '{}'",
                resource.uri
            )));
        }
        if self.tree.load().contains(&resource.uri) || self.records.contains_key(&resource.id) {
            return Err(CoreError::resource_conflict(resource.uri));
        }

        let id = resource.id;
        let uri = resource.uri.clone();
        self.records.insert(id, Arc::new(resource));
        self.emit(ResourceEvent::created(id, uri).into());
        Ok(())
    }

    fn remove(&self, id: ResourceId, uri: &str) -> CoreResult<()> {
        let Some((_, removed)) = self.records.remove(&id) else {
            return Err(CoreError::resource_not_found(uri));
        };
        self.emit(ResourceEvent::removed(id, removed.uri.clone()).into());
        Ok(())
    }

    fn collection(&self, collection_uri: &str) -> CoreResult<Arc<Resource>> {
        let id = self
            .tree
            .load()
            .get(collection_uri)
            .ok_or_else(|| CoreError::resource_not_found(collection_uri))?;
        let record = self
            .records
            .get(&id)
            .map(|r| Arc::clone(r.value()))
            .ok_or_else(|| CoreError::resource_not_found(collection_uri))?;
        if !record.is_collection() {
            return Err(CoreError::not_a_collection(collection_uri));
        }
        Ok(record)
    }

    fn update_members<F>(&self, collection_uri: &str, edit: F) -> CoreResult<bool>
    where
        F: FnOnce(&mut Vec<Value>) -> bool,
    {
        let current = self.collection(collection_uri)?;
        let mut next = (*current).clone();

        let mut members = match next.properties.remove("Members") {
            Some(Value::Array(members)) => members,
            _ => Vec::new(),
        };
        let changed = edit(&mut members);
        next.properties
            .insert("Members@odata.count".to_string(), Value::from(members.len()));
        next.properties
            .insert("Members".to_string(), Value::Array(members));

        if changed {
            self.records.insert(next.id, Arc::new(next));
        }
        Ok(changed)
    }

    fn add_member(&self, collection_uri: &str, member_uri: &str) -> CoreResult<()> {
        let link = json!({ "@odata.id": member_uri });
        let changed = self.update_members(collection_uri, |members| {
            if members.contains(&link) {
                false
            } else {
                members.push(link.clone());
                true
            }
        })?;
        if changed {
            self.emit(MembershipEvent::added(collection_uri, member_uri).into());
        }
        Ok(())
    }

    fn remove_member(&self, collection_uri: &str, member_uri: &str) -> CoreResult<()> {
        let link = json!({ "@odata.id": member_uri });
        let changed = self.update_members(collection_uri, |members| {
            let before = members.len();
            members.retain(|m| m != &link);
            members.len() != before
        })?;
        if changed {
            self.emit(MembershipEvent::removed(collection_uri, member_uri).into());
        }
        Ok(())
    }
}

#[async_trait]
impl CommandBus for InMemoryStore {
    async fn dispatch(&self, command: Command) -> CoreResult<()> {
        let kind = command.kind();
        let _guard = self.write_lock.lock().await;

        let result = match command {
            Command::CreateResource(resource) => self.create(resource),
            Command::RemoveResource { id, uri } => self.remove(id, &uri),
            Command::AddCollectionMember {
                collection_uri,
                member_uri,
            } => self.add_member(&collection_uri, &member_uri),
            Command::RemoveCollectionMember {
                collection_uri,
                member_uri,
            } => self.remove_member(&collection_uri, &member_uri),
        };

        if let Err(e) = &result {
            tracing::debug!(command = kind, error = %e, "command rejected");
        }
        result
    }
}

#[async_trait]
impl ResourceTreeView for InMemoryStore {
    async fn tree(&self) -> CoreResult<Arc<TreeSnapshot>> {
        Ok(self.tree.load_full())
    }

    async fn find(&self, id: ResourceId) -> CoreResult<Option<Arc<Resource>>> {
        Ok(self.records.get(&id).map(|r| Arc::clone(r.value())))
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new(EventBus::new())
    }
}

impl std::fmt::Debug for InMemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryStore")
            .field("resources", &self.records.len())
            .field("tree_entries", &self.tree.load().len())
            .finish()
    }
}
