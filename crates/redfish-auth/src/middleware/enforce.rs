//! Privilege enforcement middleware and the extractors it feeds.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{FromRequestParts, State},
    http::{Request, request::Parts},
    middleware::Next,
    response::Response,
};
use redfish_core::{Resource, strip_fragment};

use super::AuthState;
use crate::error::AuthError;
use crate::gate::{AccessDecision, authorize};
use crate::identity::Identity;

// =============================================================================
// Middleware
// =============================================================================

/// Authenticates and authorizes every request before any handler runs.
///
/// 1. Resolves credentials into an [`Identity`] (401 on bad credentials)
/// 2. Resolves the request path through the resource tree (404 if absent)
/// 3. Checks the resource's ACL for the request method (401/403 on deny)
/// 4. Stores the identity and the resource in request extensions
pub async fn enforce_privileges(
    State(state): State<AuthState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let method = req.method().as_str().to_owned();
    let path = strip_fragment(req.uri().path()).to_owned();

    let identity = match state.credentials.resolve(req.headers()).await {
        Ok(identity) => identity,
        Err(e) => {
            tracing::debug!(method = %method, path = %path, error = %e, "credential resolution failed");
            return state.error_response(e);
        }
    };

    let resource = match state.tree.resolve(&path).await {
        Ok(Some(resource)) => resource,
        Ok(None) => return state.error_response(AuthError::not_found(path)),
        Err(e) => return state.error_response(AuthError::storage(e.to_string())),
    };

    if let AccessDecision::Deny(reason) = authorize(&method, &resource.acl, &identity) {
        tracing::debug!(
            method = %method,
            path = %path,
            scheme = identity.scheme.as_str(),
            status = reason.status().as_u16(),
            "access denied"
        );
        return state.error_response(reason.into());
    }

    req.extensions_mut().insert(identity);
    req.extensions_mut().insert(AuthorizedResource(resource));
    next.run(req).await
}

// =============================================================================
// Extractors
// =============================================================================

/// Identity of the current request, set by [`enforce_privileges`].
#[derive(Debug, Clone)]
pub struct Authenticated(pub Identity);

impl<S> FromRequestParts<S> for Authenticated
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Identity>()
            .cloned()
            .map(Authenticated)
            .ok_or_else(|| AuthError::internal("privilege enforcement middleware is not installed"))
    }
}

/// The resource the request was authorized against.
#[derive(Debug, Clone)]
pub struct AuthorizedResource(pub Arc<Resource>);

impl<S> FromRequestParts<S> for AuthorizedResource
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthorizedResource>()
            .cloned()
            .ok_or_else(|| AuthError::internal("privilege enforcement middleware is not installed"))
    }
}
