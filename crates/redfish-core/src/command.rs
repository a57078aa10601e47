//! Commands accepted by the write side of the resource store.

use async_trait::async_trait;

use crate::error::CoreResult;
use crate::resource::{Resource, ResourceId};

/// A state change request. All mutation of resources goes through one of
/// these; the store serializes them and emits the matching events.
#[derive(Debug, Clone)]
pub enum Command {
    /// Create a new resource at `resource.uri`.
    CreateResource(Resource),
    /// Remove the resource with the given id.
    RemoveResource { id: ResourceId, uri: String },
    /// Link `member_uri` into the collection at `collection_uri`.
    AddCollectionMember {
        collection_uri: String,
        member_uri: String,
    },
    /// Unlink `member_uri` from the collection at `collection_uri`.
    RemoveCollectionMember {
        collection_uri: String,
        member_uri: String,
    },
}

impl Command {
    /// Short name used in log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            Command::CreateResource(_) => "create-resource",
            Command::RemoveResource { .. } => "remove-resource",
            Command::AddCollectionMember { .. } => "add-collection-member",
            Command::RemoveCollectionMember { .. } => "remove-collection-member",
        }
    }
}

/// Dispatches commands to the aggregate that owns the target resource.
///
/// Implementations must be safe to call concurrently and must return
/// (success or error) without blocking indefinitely.
#[async_trait]
pub trait CommandBus: Send + Sync {
    async fn dispatch(&self, command: Command) -> CoreResult<()>;
}
