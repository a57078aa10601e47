//! Axum integration: shared auth state, the privilege enforcement
//! middleware, request extractors, and error responses.
//!
//! # Usage
//!
//! ```ignore
//! let auth = AuthState::new(config, accounts, store.clone(), sessions, events)?;
//! let app = Router::new()
//!     .route("/{*path}", get(handler))
//!     .layer(middleware::from_fn_with_state(auth.clone(), enforce_privileges))
//!     .with_state(auth);
//! ```

pub mod enforce;
pub mod error;

use std::sync::Arc;

use axum::response::Response;
use redfish_core::{EventBus, ResourceTreeView};

use crate::AuthResult;
use crate::config::AuthConfig;
use crate::credentials::{BasicCredentialResolver, BearerTokenResolver, CredentialChain};
use crate::error::AuthError;
use crate::session::SessionManager;
use crate::storage::AccountStorage;

pub use enforce::{Authenticated, AuthorizedResource, enforce_privileges};
pub use error::{DEFAULT_REALM, redfish_error_json};

/// State shared by the auth middleware and the session handlers.
#[derive(Clone)]
pub struct AuthState {
    pub credentials: CredentialChain,
    pub tree: Arc<dyn ResourceTreeView>,
    pub sessions: Arc<SessionManager>,
    pub config: Arc<AuthConfig>,
}

impl AuthState {
    /// Wires the default credential chain: session token first, then basic.
    ///
    /// # Errors
    /// Returns a configuration error if the token header name is invalid.
    pub fn new(
        config: AuthConfig,
        accounts: Arc<dyn AccountStorage>,
        tree: Arc<dyn ResourceTreeView>,
        sessions: Arc<SessionManager>,
        events: EventBus,
    ) -> AuthResult<Self> {
        let bearer = BearerTokenResolver::new(&config, Arc::clone(&tree), events)?;
        let credentials = CredentialChain::new()
            .with(Arc::new(bearer))
            .with(Arc::new(BasicCredentialResolver::new(accounts)));

        Ok(Self {
            credentials,
            tree,
            sessions,
            config: Arc::new(config),
        })
    }

    /// Error response using the configured realm.
    pub fn error_response(&self, error: AuthError) -> Response {
        error.into_response_with_realm(&self.config.realm)
    }
}

impl std::fmt::Debug for AuthState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthState")
            .field("credentials", &self.credentials)
            .field("sessions", &self.sessions)
            .finish_non_exhaustive()
    }
}
