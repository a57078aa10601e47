//! Session token credential resolver.
//!
//! The verification key for a token is the private secret of the session it
//! names, fetched through the resource tree. Once the session is removed the
//! lookup fails and every token for it is rejected; there is no separate
//! revocation list.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use axum::http::{HeaderMap, HeaderName};
use redfish_core::{EventBus, ResourceTreeView};

use super::CredentialResolver;
use crate::AuthResult;
use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::identity::Identity;
use crate::session::TOKEN_SECRET_KEY;
use crate::token::{SessionClaims, SessionTokenCodec, TokenError};

/// Small FIFO cache of recently verified tokens.
///
/// Entries are only trusted while their session is still in the tree, so
/// the cache never delays revocation.
#[derive(Debug)]
pub struct TokenCache {
    capacity: usize,
    entries: Mutex<VecDeque<(String, SessionClaims)>>,
}

impl TokenCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }

    pub fn get(&self, token: &str) -> Option<SessionClaims> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|(t, _)| t == token)
            .map(|(_, claims)| claims.clone())
    }

    pub fn insert(&self, token: &str, claims: SessionClaims) {
        if self.capacity == 0 {
            return;
        }
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        if entries.iter().any(|(t, _)| t == token) {
            return;
        }
        while entries.len() >= self.capacity {
            entries.pop_front();
        }
        entries.push_back((token.to_string(), claims));
    }

    pub fn remove(&self, token: &str) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|(t, _)| t != token);
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Resolves the session token header (`X-Auth-Token` by default).
///
/// Every successful resolution publishes a refresh signal for the session,
/// which keeps its idle watchdog from expiring it.
pub struct BearerTokenResolver {
    header: HeaderName,
    codec: SessionTokenCodec,
    tree: Arc<dyn ResourceTreeView>,
    events: EventBus,
    cache: TokenCache,
}

impl BearerTokenResolver {
    /// # Errors
    /// Returns a configuration error if the token header name is invalid.
    pub fn new(
        config: &AuthConfig,
        tree: Arc<dyn ResourceTreeView>,
        events: EventBus,
    ) -> AuthResult<Self> {
        let header = HeaderName::from_bytes(config.token_header.as_bytes()).map_err(|e| {
            AuthError::configuration(format!(
                "invalid token header '{}': {e}",
                config.token_header
            ))
        })?;
        Ok(Self {
            header,
            codec: SessionTokenCodec::new(config.issuer.clone()),
            tree,
            events,
            cache: TokenCache::new(config.session.token_cache_size),
        })
    }

    pub fn cache(&self) -> &TokenCache {
        &self.cache
    }

    /// Verify a token end to end, fetching the key through the tree.
    pub async fn verify(&self, token: &str) -> Result<SessionClaims, TokenError> {
        if let Some(claims) = self.cache.get(token) {
            match self.tree.tree().await {
                Ok(tree) if tree.contains(&claims.session_uri) => return Ok(claims),
                _ => self.cache.remove(token),
            }
        }

        let tree = Arc::clone(&self.tree);
        let claims = self
            .codec
            .verify_with(token, |session_uri| async move {
                lookup_session_secret(tree.as_ref(), &session_uri).await
            })
            .await?;

        self.cache.insert(token, claims.clone());
        Ok(claims)
    }
}

/// The private signing secret of the session at `session_uri`.
async fn lookup_session_secret(
    tree: &dyn ResourceTreeView,
    session_uri: &str,
) -> Result<Vec<u8>, TokenError> {
    let session = tree
        .resolve(session_uri)
        .await
        .map_err(|e| TokenError::key_lookup(e.to_string()))?
        .ok_or_else(|| TokenError::unknown_session(session_uri))?;

    session
        .private_bytes(TOKEN_SECRET_KEY)
        .map(<[u8]>::to_vec)
        .ok_or_else(|| TokenError::key_lookup(format!("{session_uri} has no signing secret")))
}

#[async_trait]
impl CredentialResolver for BearerTokenResolver {
    async fn resolve(&self, headers: &HeaderMap) -> AuthResult<Option<Identity>> {
        let Some(value) = headers.get(&self.header) else {
            return Ok(None);
        };
        let token = value
            .to_str()
            .map(str::trim)
            .map_err(|_| AuthError::invalid_token("token header is not valid ASCII"))?;
        if token.is_empty() {
            return Err(AuthError::invalid_token("token header is empty"));
        }

        let claims = self.verify(token).await.map_err(|e| {
            tracing::debug!(error = %e, "session token rejected");
            AuthError::invalid_token(e.to_string())
        })?;

        self.events.publish_token_refresh(claims.session_uri.clone());

        Ok(Some(Identity::session(
            claims.sub,
            claims.session_uri,
            claims.privileges,
        )))
    }

    fn scheme(&self) -> &'static str {
        "session"
    }
}
