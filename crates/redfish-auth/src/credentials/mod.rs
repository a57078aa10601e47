//! Credential resolution.
//!
//! A [`CredentialResolver`] turns request headers into an [`Identity`].
//! Resolvers are tried in order by [`CredentialChain`]; a request that
//! carries no credentials for any scheme gets [`Identity::anonymous`].
//!
//! - [`basic`]: `Authorization: Basic` against account storage
//! - [`bearer`]: session token header, verified against the live session

pub mod basic;
pub mod bearer;

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use axum::http::HeaderMap;

use crate::AuthResult;
use crate::error::AuthError;
use crate::identity::{Identity, expand_role_privileges};
use crate::password::verify_password;
use crate::storage::AccountStorage;

pub use basic::BasicCredentialResolver;
pub use bearer::{BearerTokenResolver, TokenCache};

/// Resolves one credential scheme.
#[async_trait]
pub trait CredentialResolver: Send + Sync {
    /// - `Ok(None)`: the request carries no credentials for this scheme
    /// - `Ok(Some(identity))`: credentials present and verified
    /// - `Err(_)`: credentials present but invalid; the request ends with 401
    async fn resolve(&self, headers: &HeaderMap) -> AuthResult<Option<Identity>>;

    /// Scheme name for logs.
    fn scheme(&self) -> &'static str;
}

/// Ordered list of resolvers with an anonymous fallback.
#[derive(Clone, Default)]
pub struct CredentialChain {
    resolvers: Vec<Arc<dyn CredentialResolver>>,
}

impl CredentialChain {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, resolver: Arc<dyn CredentialResolver>) -> Self {
        self.resolvers.push(resolver);
        self
    }

    /// First resolver that recognises credentials wins. Errors short-circuit.
    pub async fn resolve(&self, headers: &HeaderMap) -> AuthResult<Identity> {
        for resolver in &self.resolvers {
            if let Some(identity) = resolver.resolve(headers).await? {
                return Ok(identity);
            }
        }
        Ok(Identity::anonymous())
    }
}

impl std::fmt::Debug for CredentialChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.resolvers.iter().map(|r| r.scheme()))
            .finish()
    }
}

/// Checks a username/password pair and returns the account's privileges.
///
/// Shared by basic authentication and session login.
pub async fn verify_account(
    accounts: &dyn AccountStorage,
    username: &str,
    password: &str,
) -> AuthResult<BTreeSet<String>> {
    let account = accounts
        .find_account(username)
        .await?
        .ok_or_else(|| AuthError::unauthorized(format!("unknown account '{username}'")))?;

    if !account.enabled {
        return Err(AuthError::unauthorized(format!(
            "account '{username}' is disabled"
        )));
    }

    let password = password.to_owned();
    let hash = account.password_hash.clone();
    let matches = tokio::task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .map_err(|e| AuthError::internal(format!("password verification task failed: {e}")))?
        .map_err(|e| {
            AuthError::internal(format!("stored password hash for '{username}' is invalid: {e}"))
        })?;

    if !matches {
        return Err(AuthError::unauthorized(format!(
            "wrong password for '{username}'"
        )));
    }

    let Some(role) = accounts.find_role(&account.role).await? else {
        tracing::warn!(
            username = %username,
            role = %account.role,
            "account references unknown role, granting no role privileges"
        );
        return Ok(expand_role_privileges(username, std::iter::empty()));
    };

    Ok(expand_role_privileges(username, &role.assigned_privileges))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::UNAUTHENTICATED;
    use crate::storage::{Account, InMemoryAccountStorage};
    use axum::http::HeaderValue;

    async fn storage() -> InMemoryAccountStorage {
        let storage = InMemoryAccountStorage::with_default_roles();
        storage
            .upsert_account(Account::new("alice", "correct", "ReadOnly").unwrap())
            .await;
        storage
            .upsert_account(Account::new("carol", "correct", "ReadOnly").unwrap().disabled())
            .await;
        storage
            .upsert_account(Account::new("dave", "correct", "Ghost").unwrap())
            .await;
        storage
    }

    #[tokio::test]
    async fn test_verify_account_expands_privileges() {
        let storage = storage().await;
        let privileges = verify_account(&storage, "alice", "correct").await.unwrap();
        assert_eq!(
            privileges,
            BTreeSet::from(["Login".to_string(), "ConfigureSelf_alice".to_string()])
        );
    }

    #[tokio::test]
    async fn test_verify_account_failures_are_401() {
        let storage = storage().await;
        for (user, pass) in [("alice", "wrong"), ("nobody", "correct"), ("carol", "correct")] {
            let err = verify_account(&storage, user, pass).await.unwrap_err();
            assert!(err.is_authentication_error(), "{user}: {err}");
        }
    }

    #[tokio::test]
    async fn test_unknown_role_grants_nothing() {
        let storage = storage().await;
        let privileges = verify_account(&storage, "dave", "correct").await.unwrap();
        assert_eq!(privileges, BTreeSet::from([UNAUTHENTICATED.to_string()]));
    }

    #[tokio::test]
    async fn test_chain_falls_back_to_anonymous() {
        let storage = Arc::new(storage().await);
        let chain = CredentialChain::new().with(Arc::new(BasicCredentialResolver::new(storage)));

        let identity = chain.resolve(&HeaderMap::new()).await.unwrap();
        assert_eq!(identity, Identity::anonymous());
    }

    #[tokio::test]
    async fn test_chain_short_circuits_on_error() {
        let storage = Arc::new(storage().await);
        let chain = CredentialChain::new().with(Arc::new(BasicCredentialResolver::new(storage)));

        let mut headers = HeaderMap::new();
        headers.insert(
            axum::http::header::AUTHORIZATION,
            HeaderValue::from_static("Basic !!!"),
        );
        assert!(chain.resolve(&headers).await.is_err());
    }
}
