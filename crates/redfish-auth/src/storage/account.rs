//! Accounts, roles and their storage.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::AuthResult;
use crate::error::AuthError;
use crate::password::hash_password;

/// A manager account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub username: String,
    /// Argon2 PHC string.
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Name of the assigned role.
    pub role: String,
    pub enabled: bool,
}

impl Account {
    /// Creates an enabled account, hashing `password`.
    pub fn new(
        username: impl Into<String>,
        password: &str,
        role: impl Into<String>,
    ) -> AuthResult<Self> {
        let password_hash = hash_password(password)
            .map_err(|e| AuthError::internal(format!("password hashing failed: {e}")))?;
        Ok(Self {
            username: username.into(),
            password_hash,
            role: role.into(),
            enabled: true,
        })
    }

    #[must_use]
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}

/// A named set of privileges.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub name: String,
    pub assigned_privileges: Vec<String>,
}

impl Role {
    pub fn new<I, S>(name: impl Into<String>, privileges: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            assigned_privileges: privileges.into_iter().map(Into::into).collect(),
        }
    }
}

/// The predefined roles.
pub fn default_roles() -> Vec<Role> {
    vec![
        Role::new(
            "Administrator",
            [
                "Login",
                "ConfigureManager",
                "ConfigureUsers",
                "ConfigureComponents",
                "ConfigureSelf",
            ],
        ),
        Role::new("Operator", ["Login", "ConfigureComponents", "ConfigureSelf"]),
        Role::new("ReadOnly", ["Login", "ConfigureSelf"]),
        Role::new("NoAccess", Vec::<String>::new()),
    ]
}

/// Storage operations for accounts and roles.
#[async_trait]
pub trait AccountStorage: Send + Sync {
    /// Find an account by username.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(account))` if found
    /// - `Ok(None)` if no account has that username
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn find_account(&self, username: &str) -> AuthResult<Option<Account>>;

    /// Find a role by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn find_role(&self, name: &str) -> AuthResult<Option<Role>>;
}

/// Account storage kept in process memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryAccountStorage {
    accounts: Arc<RwLock<HashMap<String, Account>>>,
    roles: Arc<RwLock<HashMap<String, Role>>>,
}

impl InMemoryAccountStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage pre-populated with [`default_roles`].
    pub fn with_default_roles() -> Self {
        let roles = default_roles()
            .into_iter()
            .map(|r| (r.name.clone(), r))
            .collect();
        Self {
            accounts: Arc::default(),
            roles: Arc::new(RwLock::new(roles)),
        }
    }

    pub async fn upsert_account(&self, account: Account) {
        self.accounts
            .write()
            .await
            .insert(account.username.clone(), account);
    }

    pub async fn upsert_role(&self, role: Role) {
        self.roles.write().await.insert(role.name.clone(), role);
    }

    pub async fn account_count(&self) -> usize {
        self.accounts.read().await.len()
    }
}

#[async_trait]
impl AccountStorage for InMemoryAccountStorage {
    async fn find_account(&self, username: &str) -> AuthResult<Option<Account>> {
        Ok(self.accounts.read().await.get(username).cloned())
    }

    async fn find_role(&self, name: &str) -> AuthResult<Option<Role>> {
        Ok(self.roles.read().await.get(name).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_default_roles_present() {
        let storage = InMemoryAccountStorage::with_default_roles();
        let admin = storage.find_role("Administrator").await.unwrap().unwrap();
        assert!(admin.assigned_privileges.contains(&"ConfigureManager".to_string()));

        let readonly = storage.find_role("ReadOnly").await.unwrap().unwrap();
        assert_eq!(readonly.assigned_privileges, vec!["Login", "ConfigureSelf"]);

        assert!(storage.find_role("Nope").await.unwrap().is_none());
    }

    #[test]
    fn test_disabled_account_is_stored_disabled() {
        let storage = InMemoryAccountStorage::new();
        let account = Account::new("bob", "pw", "Operator").unwrap().disabled();
        tokio_test::block_on(storage.upsert_account(account));

        let stored = tokio_test::block_on(storage.find_account("bob"))
            .unwrap()
            .unwrap();
        assert!(!stored.enabled);
        assert!(tokio_test::block_on(storage.find_role("Operator")).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_account_roundtrip() {
        let storage = InMemoryAccountStorage::with_default_roles();
        storage
            .upsert_account(Account::new("alice", "correct", "ReadOnly").unwrap())
            .await;

        let account = storage.find_account("alice").await.unwrap().unwrap();
        assert_eq!(account.role, "ReadOnly");
        assert!(account.enabled);
        assert!(storage.find_account("bob").await.unwrap().is_none());
        assert_eq!(storage.account_count().await, 1);
    }

    #[test]
    fn test_password_hash_not_serialized() {
        let account = Account::new("alice", "correct", "ReadOnly").unwrap();
        let json = serde_json::to_string(&account).unwrap();
        assert!(!json.contains("argon2"));
    }
}
