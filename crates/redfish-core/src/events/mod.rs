//! Event stream shared by the resource store and the auth layer.
//!
//! # Architecture
//!
//! ```text
//!   producers (store, bearer resolver)
//!                 │ publish
//!                 ▼
//!   ┌──────────────────────────────┐
//!   │           EventBus           │  filter evaluated per listener
//!   └──────────────────────────────┘
//!        │            │           │
//!        ▼            ▼           ▼
//!     inbox 1      inbox 2     inbox 3   (unbounded, per subscription)
//!        │            │           │
//!     wait(cancel) wait(cancel) wait(cancel)
//! ```
//!
//! # Module Structure
//!
//! - [`types`]: closed set of event kinds (`ResourceEvent`, `MembershipEvent`, `TokenRefreshEvent`)
//! - [`bus`]: listener registry and publishing
//! - [`subscription`]: cancellable wait, run-once and run-forever helpers

pub mod bus;
pub mod subscription;
pub mod types;

pub use bus::{EventBus, EventFilter};
pub use subscription::{EventSubscription, SubscriptionError, SubscriptionHandle};
pub use types::{
    Event, MembershipEvent, MembershipEventType, ResourceEvent, ResourceEventType, TokenRefreshEvent,
};
