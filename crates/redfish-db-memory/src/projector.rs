//! Projects resource lifecycle events onto the URI tree.

use redfish_core::events::{Event, ResourceEventType};
use redfish_core::TreeSnapshot;

/// Returns the next snapshot if `event` changes the tree, `None` otherwise.
pub fn project(current: &TreeSnapshot, event: &Event) -> Option<TreeSnapshot> {
    let Event::Resource(e) = event else {
        return None;
    };

    let mut next = current.clone();
    match e.event_type {
        ResourceEventType::Created => next.insert(e.uri.clone(), e.resource_id),
        ResourceEventType::Removed => {
            next.remove(&e.uri)?;
        }
    }
    Some(next)
}

#[cfg(test)]
mod tests {
    use super::*;
    use redfish_core::events::{MembershipEvent, ResourceEvent, TokenRefreshEvent};
    use uuid::Uuid;

    #[test]
    fn test_created_then_removed() {
        let id = Uuid::new_v4();
        let tree = TreeSnapshot::new();

        let tree = project(&tree, &ResourceEvent::created(id, "/a").into()).unwrap();
        assert_eq!(tree.get("/a"), Some(id));

        let tree = project(&tree, &ResourceEvent::removed(id, "/a").into()).unwrap();
        assert!(tree.is_empty());
    }

    #[test]
    fn test_non_resource_events_are_ignored() {
        let tree = TreeSnapshot::new();
        assert!(project(&tree, &TokenRefreshEvent::new("/s").into()).is_none());
        assert!(project(&tree, &MembershipEvent::added("/c", "/c/1").into()).is_none());
    }

    #[test]
    fn test_removing_unknown_uri_is_noop() {
        let tree = TreeSnapshot::new();
        assert!(project(&tree, &ResourceEvent::removed(Uuid::new_v4(), "/x").into()).is_none());
    }
}
