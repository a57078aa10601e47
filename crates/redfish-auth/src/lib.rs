//! # redfish-auth
//!
//! Authentication, authorization and session lifecycle for the Redfish server.
//!
//! This crate provides:
//! - Per-method privilege checks against resource ACLs
//! - Basic and session-token credential resolution
//! - Session login/logout with revocable, per-session signing secrets
//! - Idle-timeout watchdogs that expire unused sessions
//!
//! ## Modules
//!
//! - [`config`] - Auth and session configuration
//! - [`gate`] - Authorization decision for a method, ACL and identity
//! - [`identity`] - Authenticated principal and privilege names
//! - [`credentials`] - Header-based credential resolvers
//! - [`token`] - Session token signing and verification
//! - [`session`] - Session manager and watchdog
//! - [`storage`] - Account and role storage
//! - [`middleware`] - Axum middleware, extractors and error responses
//! - [`http`] - Session login/logout handlers

pub mod config;
pub mod credentials;
pub mod error;
pub mod gate;
pub mod http;
pub mod identity;
pub mod middleware;
pub mod password;
pub mod session;
pub mod storage;
pub mod token;

pub use config::{AuthConfig, ConfigError, SessionConfig};
pub use credentials::{
    BasicCredentialResolver, BearerTokenResolver, CredentialChain, CredentialResolver,
};
pub use error::{AuthError, ErrorCategory};
pub use gate::{AccessDecision, DenyReason, authorize};
pub use http::{login_handler, logout_handler};
pub use identity::{AuthScheme, Identity};
pub use middleware::{AuthState, Authenticated, AuthorizedResource, enforce_privileges};
pub use session::{
    LoginOutcome, LoginRequest, SecretSource, SessionManager, SessionWatchdog, WatchdogExit,
};
pub use storage::{Account, AccountStorage, InMemoryAccountStorage, Role};
pub use token::{SessionClaims, SessionTokenCodec, TokenError};

/// Type alias for authentication/authorization results.
pub type AuthResult<T> = Result<T, AuthError>;

/// Prelude module for convenient imports.
///
/// ```ignore
/// use redfish_auth::prelude::*;
/// ```
pub mod prelude {
    pub use crate::AuthResult;
    pub use crate::config::{AuthConfig, SessionConfig};
    pub use crate::error::AuthError;
    pub use crate::gate::{AccessDecision, authorize};
    pub use crate::identity::Identity;
    pub use crate::middleware::{AuthState, Authenticated, AuthorizedResource, enforce_privileges};
    pub use crate::session::{LoginRequest, SessionManager};
    pub use crate::storage::{AccountStorage, InMemoryAccountStorage};
}
