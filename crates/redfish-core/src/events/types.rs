//! Event types emitted by the resource store and the auth layer.
//!
//! The set of event kinds is closed: consumers match on [`Event`]
//! exhaustively instead of inspecting payloads at runtime.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::resource::ResourceId;

// ============================================================================
// Resource Events
// ============================================================================

/// Type of resource lifecycle change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceEventType {
    /// Resource was created
    Created,
    /// Resource was removed
    Removed,
}

impl ResourceEventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceEventType::Created => "created",
            ResourceEventType::Removed => "removed",
        }
    }
}

impl std::fmt::Display for ResourceEventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A resource was created or removed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceEvent {
    pub event_type: ResourceEventType,
    pub resource_id: ResourceId,
    pub uri: String,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

impl ResourceEvent {
    pub fn new(event_type: ResourceEventType, resource_id: ResourceId, uri: impl Into<String>) -> Self {
        Self {
            event_type,
            resource_id,
            uri: uri.into(),
            timestamp: OffsetDateTime::now_utc(),
        }
    }

    pub fn created(resource_id: ResourceId, uri: impl Into<String>) -> Self {
        Self::new(ResourceEventType::Created, resource_id, uri)
    }

    pub fn removed(resource_id: ResourceId, uri: impl Into<String>) -> Self {
        Self::new(ResourceEventType::Removed, resource_id, uri)
    }
}

// ============================================================================
// Membership Events
// ============================================================================

/// Type of collection membership change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MembershipEventType {
    Added,
    Removed,
}

/// A member was linked into or unlinked from a collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MembershipEvent {
    pub event_type: MembershipEventType,
    pub collection_uri: String,
    pub member_uri: String,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

impl MembershipEvent {
    pub fn added(collection_uri: impl Into<String>, member_uri: impl Into<String>) -> Self {
        Self {
            event_type: MembershipEventType::Added,
            collection_uri: collection_uri.into(),
            member_uri: member_uri.into(),
            timestamp: OffsetDateTime::now_utc(),
        }
    }

    pub fn removed(collection_uri: impl Into<String>, member_uri: impl Into<String>) -> Self {
        Self {
            event_type: MembershipEventType::Removed,
            collection_uri: collection_uri.into(),
            member_uri: member_uri.into(),
            timestamp: OffsetDateTime::now_utc(),
        }
    }
}

// ============================================================================
// Token Refresh Events
// ============================================================================

/// A bearer token bound to `session_uri` was successfully validated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenRefreshEvent {
    pub session_uri: String,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

impl TokenRefreshEvent {
    pub fn new(session_uri: impl Into<String>) -> Self {
        Self {
            session_uri: session_uri.into(),
            timestamp: OffsetDateTime::now_utc(),
        }
    }
}

// ============================================================================
// Event
// ============================================================================

/// Any event published on the bus.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "category", content = "event")]
pub enum Event {
    Resource(ResourceEvent),
    Membership(MembershipEvent),
    TokenRefresh(TokenRefreshEvent),
}

impl Event {
    /// `true` for a refresh signal scoped to `session_uri`.
    pub fn is_token_refresh_for(&self, session_uri: &str) -> bool {
        matches!(self, Event::TokenRefresh(e) if e.session_uri == session_uri)
    }

    /// `true` when this event removes the resource at `uri`.
    pub fn is_removal_of(&self, uri: &str) -> bool {
        matches!(
            self,
            Event::Resource(e) if e.event_type == ResourceEventType::Removed && e.uri == uri
        )
    }

    pub fn timestamp(&self) -> OffsetDateTime {
        match self {
            Event::Resource(e) => e.timestamp,
            Event::Membership(e) => e.timestamp,
            Event::TokenRefresh(e) => e.timestamp,
        }
    }
}

impl From<ResourceEvent> for Event {
    fn from(event: ResourceEvent) -> Self {
        Event::Resource(event)
    }
}

impl From<MembershipEvent> for Event {
    fn from(event: MembershipEvent) -> Self {
        Event::Membership(event)
    }
}

impl From<TokenRefreshEvent> for Event {
    fn from(event: TokenRefreshEvent) -> Self {
        Event::TokenRefresh(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    const SESSION: &str = "/redfish/v1/SessionService/Sessions/abc";

    #[test]
    fn test_refresh_predicate() {
        let event: Event = TokenRefreshEvent::new(SESSION).into();
        assert!(event.is_token_refresh_for(SESSION));
        assert!(!event.is_token_refresh_for("/redfish/v1/SessionService/Sessions/other"));
        assert!(!event.is_removal_of(SESSION));
    }

    #[test]
    fn test_removal_predicate() {
        let id = Uuid::new_v4();
        let removed: Event = ResourceEvent::removed(id, SESSION).into();
        let created: Event = ResourceEvent::created(id, SESSION).into();

        assert!(removed.is_removal_of(SESSION));
        assert!(!created.is_removal_of(SESSION));
        assert!(!removed.is_token_refresh_for(SESSION));
    }

    #[test]
    fn test_event_serialization() {
        let event: Event = MembershipEvent::added("/redfish/v1/Coll", "/redfish/v1/Coll/1").into();
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["category"], "Membership");
        assert_eq!(json["event"]["event_type"], "added");
        assert_eq!(json["event"]["member_uri"], "/redfish/v1/Coll/1");
    }
}
