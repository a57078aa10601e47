//! Session lifecycle.
//!
//! - [`manager`]: login saga, logout, per-session cancellation handles
//! - [`watchdog`]: per-session idle-timeout task
//! - [`secret`]: injectable random source for ids and signing secrets

pub mod manager;
pub mod secret;
pub mod watchdog;

use std::collections::BTreeSet;

use redfish_core::{AclByMethod, PrivateValue, Resource, ResourceId};
use serde_json::json;

use crate::identity::{CONFIGURE_MANAGER, configure_self_for};

pub use manager::{LoginOutcome, LoginRequest, SessionManager};
pub use secret::SecretSource;
pub use watchdog::{SessionWatchdog, WatchdogExit};

/// Private field holding a session's token signing secret.
pub const TOKEN_SECRET_KEY: &str = "token_secret";

/// Private field holding the privileges granted at login.
pub const GRANTED_PRIVILEGES_KEY: &str = "granted_privileges";

const SESSION_ODATA_TYPE: &str = "#Session.v1_0_0.Session";
const SESSION_ODATA_CONTEXT: &str = "/redfish/v1/$metadata#Session.Session";

/// ACL of a session resource: administrators manage every session, owners
/// may delete their own.
pub fn session_acl(username: &str) -> AclByMethod {
    AclByMethod::new()
        .with("GET", [CONFIGURE_MANAGER])
        .with("POST", [CONFIGURE_MANAGER])
        .with("PUT", [CONFIGURE_MANAGER])
        .with("PATCH", [CONFIGURE_MANAGER])
        .with(
            "DELETE",
            [configure_self_for(username), CONFIGURE_MANAGER.to_string()],
        )
}

/// Builds the session resource created at login.
pub fn session_resource(
    id: ResourceId,
    uri: &str,
    username: &str,
    privileges: &BTreeSet<String>,
    secret: String,
) -> Resource {
    Resource::new(id, uri)
        .with_acl(session_acl(username))
        .with_property("@odata.type", json!(SESSION_ODATA_TYPE))
        .with_property("@odata.id", json!(uri))
        .with_property("@odata.context", json!(SESSION_ODATA_CONTEXT))
        .with_property("Id", json!(id.to_string()))
        .with_property("Name", json!("User Session"))
        .with_property("Description", json!("User Session"))
        .with_property("UserName", json!(username))
        .with_private(TOKEN_SECRET_KEY, PrivateValue::Text(secret))
        .with_private(
            GRANTED_PRIVILEGES_KEY,
            PrivateValue::List(privileges.iter().cloned().collect()),
        )
}
