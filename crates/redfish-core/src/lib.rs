//! Core types for the Redfish management server.
//!
//! - [`resource`]: resources, per-method ACLs and private fields
//! - [`command`]: the command model and the [`CommandBus`] seam
//! - [`tree`]: the projected URI map and the [`ResourceTreeView`] seam
//! - [`events`]: typed events, the [`EventBus`] and subscriptions

pub mod command;
pub mod error;
pub mod events;
pub mod resource;
pub mod tree;

pub use command::{Command, CommandBus};
pub use error::{CoreError, CoreResult};
pub use events::{Event, EventBus, EventSubscription, SubscriptionError};
pub use resource::{AclByMethod, PrivateValue, Resource, ResourceId, strip_fragment};
pub use tree::{ResourceTreeView, TreeSnapshot};
