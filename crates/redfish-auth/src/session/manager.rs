//! Session manager.
//!
//! Login runs as a short saga against the command bus:
//!
//! 1. verify the account and snapshot its privileges
//! 2. mint the session id, signing secret and token
//! 3. create the session resource
//! 4. link it into the sessions collection (the resource is removed again
//!    if this fails)
//! 5. start the session's idle watchdog
//!
//! Logout cancels the watchdog and issues the removal commands. From that
//! point every token bound to the session fails verification.

use std::sync::Arc;

use dashmap::DashMap;
use redfish_core::{Command, CommandBus, EventBus, ResourceTreeView};
use serde::Deserialize;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use super::secret::SecretSource;
use super::session_resource;
use super::watchdog::SessionWatchdog;
use crate::AuthResult;
use crate::config::{AuthConfig, SessionConfig};
use crate::credentials::verify_account;
use crate::error::AuthError;
use crate::storage::AccountStorage;
use crate::token::{SessionClaims, SessionTokenCodec};

/// Body of a login request.
#[derive(Clone, Deserialize)]
pub struct LoginRequest {
    #[serde(rename = "UserName")]
    pub username: String,
    #[serde(rename = "Password")]
    pub password: String,
}

impl LoginRequest {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Result of a successful login.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    /// Public representation of the new session.
    pub session: Value,
    /// Session token, delivered out of band (response header).
    pub token: String,
    /// URI of the new session resource.
    pub location: String,
}

/// Creates and removes sessions and owns their watchdogs.
pub struct SessionManager {
    config: SessionConfig,
    codec: SessionTokenCodec,
    accounts: Arc<dyn AccountStorage>,
    commands: Arc<dyn CommandBus>,
    tree: Arc<dyn ResourceTreeView>,
    events: EventBus,
    secrets: SecretSource,
    watchdogs: Arc<DashMap<String, CancellationToken>>,
}

impl SessionManager {
    pub fn new(
        config: &AuthConfig,
        accounts: Arc<dyn AccountStorage>,
        commands: Arc<dyn CommandBus>,
        tree: Arc<dyn ResourceTreeView>,
        events: EventBus,
        secrets: SecretSource,
    ) -> Self {
        Self {
            config: config.session.clone(),
            codec: SessionTokenCodec::new(config.issuer.clone()),
            accounts,
            commands,
            tree,
            events,
            secrets,
            watchdogs: Arc::new(DashMap::new()),
        }
    }

    pub fn collection_uri(&self) -> &str {
        &self.config.collection_uri
    }

    /// Number of sessions with a running watchdog.
    pub fn active_sessions(&self) -> usize {
        self.watchdogs.len()
    }

    /// Log in: create a session and return its token.
    ///
    /// # Errors
    ///
    /// - `Unauthorized` if the account is unknown, disabled or the password is wrong
    /// - `Storage` if the command bus rejects the session
    pub async fn login(&self, request: LoginRequest) -> AuthResult<LoginOutcome> {
        let LoginRequest { username, password } = request;
        let privileges = verify_account(self.accounts.as_ref(), &username, &password).await?;

        let id = self.secrets.session_id();
        let uri = format!("{}/{}", self.config.collection_uri.trim_end_matches('/'), id);
        let secret = self.secrets.generate_secret(self.config.secret_length);

        let claims = SessionClaims::new(
            self.codec.issuer(),
            username.as_str(),
            uri.as_str(),
            privileges.iter().cloned(),
        );
        let token = self
            .codec
            .sign(&claims, secret.as_bytes())
            .map_err(|e| AuthError::internal(e.to_string()))?;

        let resource = session_resource(id, &uri, &username, &privileges, secret);
        let session = resource.public_view();

        self.commands
            .dispatch(Command::CreateResource(resource))
            .await?;

        let link = Command::AddCollectionMember {
            collection_uri: self.config.collection_uri.clone(),
            member_uri: uri.clone(),
        };
        if let Err(e) = self.commands.dispatch(link).await {
            tracing::warn!(session_uri = %uri, error = %e, "failed to link session, rolling back");
            let rollback = Command::RemoveResource {
                id,
                uri: uri.clone(),
            };
            if let Err(re) = self.commands.dispatch(rollback).await {
                tracing::warn!(session_uri = %uri, error = %re, "session rollback failed");
            }
            return Err(e.into());
        }

        self.start_watchdog(id, &uri);

        tracing::info!(username = %username, session_uri = %uri, "session created");
        Ok(LoginOutcome {
            session,
            token,
            location: uri,
        })
    }

    fn start_watchdog(&self, id: redfish_core::ResourceId, uri: &str) {
        let cancel = CancellationToken::new();
        let watchdog = SessionWatchdog::new(
            id,
            uri,
            self.config.collection_uri.clone(),
            self.config.idle_timeout,
            Arc::clone(&self.commands),
            &self.events,
            cancel.clone(),
        );
        self.watchdogs.insert(uri.to_string(), cancel);

        let watchdogs = Arc::clone(&self.watchdogs);
        let uri = uri.to_string();
        tokio::spawn(async move {
            let exit = watchdog.run().await;
            watchdogs.remove(&uri);
            exit
        });
    }

    /// Log out: remove the session, then stop its watchdog.
    ///
    /// The watchdog keeps running until the removal has succeeded, so a
    /// failed logout still leaves the session to expire on its own.
    ///
    /// # Errors
    ///
    /// - `NotFound` if no session exists at `session_uri`
    /// - `Storage` if the removal command fails
    pub async fn logout(&self, session_uri: &str) -> AuthResult<()> {
        let session = self
            .tree
            .resolve(session_uri)
            .await?
            .ok_or_else(|| AuthError::not_found(session_uri))?;

        let unlink = Command::RemoveCollectionMember {
            collection_uri: self.config.collection_uri.clone(),
            member_uri: session.uri.clone(),
        };
        if let Err(e) = self.commands.dispatch(unlink).await {
            tracing::warn!(session_uri = %session.uri, error = %e, "failed to unlink session");
        }

        let remove = Command::RemoveResource {
            id: session.id,
            uri: session.uri.clone(),
        };
        if let Err(e) = self.commands.dispatch(remove).await {
            tracing::warn!(
                session_uri = %session.uri,
                error = %e,
                "failed to remove session, leaving it to the idle watchdog"
            );
            return Err(e.into());
        }

        if let Some((_, cancel)) = self.watchdogs.remove(&session.uri) {
            cancel.cancel();
        }

        tracing::info!(session_uri = %session.uri, "session deleted");
        Ok(())
    }

    /// Stop every watchdog without touching the sessions.
    pub fn shutdown(&self) {
        for entry in self.watchdogs.iter() {
            entry.value().cancel();
        }
        self.watchdogs.clear();
    }
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("collection_uri", &self.config.collection_uri)
            .field("active_sessions", &self.watchdogs.len())
            .finish_non_exhaustive()
    }
}
