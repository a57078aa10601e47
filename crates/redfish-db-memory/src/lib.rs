//! In-memory backend for the Redfish resource store.
//!
//! [`InMemoryStore`] implements both seams the auth layer depends on:
//! [`CommandBus`](redfish_core::CommandBus) for writes and
//! [`ResourceTreeView`](redfish_core::ResourceTreeView) for reads.
//!
//! # Example
//!
//! ```ignore
//! use redfish_core::{Command, CommandBus, EventBus, Resource, ResourceTreeView};
//! use redfish_db_memory::InMemoryStore;
//!
//! let store = InMemoryStore::new(EventBus::new());
//! store.dispatch(Command::CreateResource(Resource::new(id, "/redfish/v1"))).await?;
//! let root = store.resolve("/redfish/v1").await?;
//! ```

pub mod projector;
pub mod store;

pub use store::InMemoryStore;
