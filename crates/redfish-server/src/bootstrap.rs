//! Startup seeding of the resource tree and the account store.
//!
//! The tree gets the service root, the session service with its sessions
//! collection, and the account service with one resource per role and per
//! configured account. Every resource carries its ACL; nothing is reachable
//! without one.

use redfish_auth::identity::{CONFIGURE_MANAGER, LOGIN, UNAUTHENTICATED, configure_self_for};
use redfish_auth::storage::{Account, InMemoryAccountStorage, default_roles};
use redfish_auth::{AuthConfig, AuthResult};
use redfish_core::{AclByMethod, Command, CommandBus, CoreResult, Resource};
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::config::BootstrapConfig;

pub const SERVICE_ROOT: &str = "/redfish/v1";
pub const SESSION_SERVICE: &str = "/redfish/v1/SessionService";
pub const ACCOUNT_SERVICE: &str = "/redfish/v1/AccountService";
pub const ACCOUNTS: &str = "/redfish/v1/AccountService/Accounts";
pub const ROLES: &str = "/redfish/v1/AccountService/Roles";

const CONFIGURE_USERS: &str = "ConfigureUsers";

fn link(uri: &str) -> serde_json::Value {
    json!({ "@odata.id": uri })
}

/// Creates the static part of the resource tree.
pub async fn seed_resource_tree(
    commands: &dyn CommandBus,
    auth: &AuthConfig,
    bootstrap: &BootstrapConfig,
) -> CoreResult<()> {
    let sessions = auth.session.collection_uri.as_str();

    let root = Resource::new(Uuid::new_v4(), SERVICE_ROOT)
        .with_acl(AclByMethod::new().with("GET", [UNAUTHENTICATED]))
        .with_property("@odata.type", json!("#ServiceRoot.v1_0_0.ServiceRoot"))
        .with_property("Id", json!("RootService"))
        .with_property("Name", json!("Root Service"))
        .with_property("RedfishVersion", json!("1.0.0"))
        .with_property("SessionService", link(SESSION_SERVICE))
        .with_property("AccountService", link(ACCOUNT_SERVICE))
        .with_property("Links", json!({ "Sessions": link(sessions) }));

    let session_service = Resource::new(Uuid::new_v4(), SESSION_SERVICE)
        .with_acl(
            AclByMethod::new()
                .with("GET", [LOGIN])
                .with("PATCH", [CONFIGURE_MANAGER]),
        )
        .with_property("@odata.type", json!("#SessionService.v1_0_0.SessionService"))
        .with_property("Id", json!("SessionService"))
        .with_property("Name", json!("Session Service"))
        .with_property("ServiceEnabled", json!(true))
        .with_property("SessionTimeout", json!(auth.session.idle_timeout.as_secs()))
        .with_property("Sessions", link(sessions));

    // POST is open so that login is reachable without credentials.
    let session_collection = Resource::new(Uuid::new_v4(), sessions)
        .with_acl(
            AclByMethod::new()
                .with("GET", [CONFIGURE_MANAGER])
                .with("POST", [UNAUTHENTICATED]),
        )
        .with_property(
            "@odata.type",
            json!("#SessionCollection.SessionCollection"),
        )
        .with_property("Name", json!("Session Collection"))
        .as_collection();

    let account_service = Resource::new(Uuid::new_v4(), ACCOUNT_SERVICE)
        .with_acl(AclByMethod::new().with("GET", [LOGIN]))
        .with_property("@odata.type", json!("#AccountService.v1_0_0.AccountService"))
        .with_property("Id", json!("AccountService"))
        .with_property("Name", json!("Account Service"))
        .with_property("Accounts", link(ACCOUNTS))
        .with_property("Roles", link(ROLES));

    let accounts = Resource::new(Uuid::new_v4(), ACCOUNTS)
        .with_acl(AclByMethod::new().with("GET", [CONFIGURE_USERS]))
        .with_property(
            "@odata.type",
            json!("#ManagerAccountCollection.ManagerAccountCollection"),
        )
        .with_property("Name", json!("Accounts Collection"))
        .as_collection();

    let roles = Resource::new(Uuid::new_v4(), ROLES)
        .with_acl(AclByMethod::new().with("GET", [LOGIN]))
        .with_property("@odata.type", json!("#RoleCollection.RoleCollection"))
        .with_property("Name", json!("Roles Collection"))
        .as_collection();

    for resource in [
        root,
        session_service,
        session_collection,
        account_service,
        accounts,
        roles,
    ] {
        commands.dispatch(Command::CreateResource(resource)).await?;
    }

    for role in default_roles() {
        let uri = format!("{ROLES}/{}", role.name);
        let resource = Resource::new(Uuid::new_v4(), uri.as_str())
            .with_acl(AclByMethod::new().with("GET", [LOGIN]))
            .with_property("@odata.type", json!("#Role.v1_0_0.Role"))
            .with_property("Id", json!(role.name))
            .with_property("Name", json!(format!("{} Role", role.name)))
            .with_property("IsPredefined", json!(true))
            .with_property("AssignedPrivileges", json!(role.assigned_privileges));
        create_member(commands, ROLES, resource).await?;
    }

    for account in &bootstrap.accounts {
        let uri = format!("{ACCOUNTS}/{}", account.username);
        let resource = Resource::new(Uuid::new_v4(), uri.as_str())
            .with_acl(AclByMethod::new().with(
                "GET",
                [CONFIGURE_USERS.to_string(), configure_self_for(&account.username)],
            ))
            .with_property("@odata.type", json!("#ManagerAccount.v1_0_0.ManagerAccount"))
            .with_property("Id", json!(account.username))
            .with_property("UserName", json!(account.username))
            .with_property("RoleId", json!(account.role))
            .with_property("Enabled", json!(account.enabled))
            .with_property("Links", json!({ "Role": link(&format!("{ROLES}/{}", account.role)) }));
        create_member(commands, ACCOUNTS, resource).await?;
    }

    info!(sessions = %sessions, "resource tree seeded");
    Ok(())
}

async fn create_member(
    commands: &dyn CommandBus,
    collection_uri: &str,
    resource: Resource,
) -> CoreResult<()> {
    let member_uri = resource.uri.clone();
    commands.dispatch(Command::CreateResource(resource)).await?;
    commands
        .dispatch(Command::AddCollectionMember {
            collection_uri: collection_uri.to_string(),
            member_uri,
        })
        .await
}

/// Loads the configured accounts, hashing their passwords.
pub async fn seed_accounts(
    storage: &InMemoryAccountStorage,
    bootstrap: &BootstrapConfig,
) -> AuthResult<()> {
    for entry in &bootstrap.accounts {
        let mut account = Account::new(entry.username.as_str(), &entry.password, entry.role.as_str())?;
        if !entry.enabled {
            account = account.disabled();
        }
        storage.upsert_account(account).await;
    }
    info!(count = bootstrap.accounts.len(), "accounts loaded");
    Ok(())
}
