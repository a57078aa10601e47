//! Session logout endpoint.

use axum::{
    extract::State,
    http::{StatusCode, Uri},
    response::{IntoResponse, Response},
};
use redfish_core::strip_fragment;

use crate::middleware::AuthState;

/// Deletes the session addressed by the request path.
///
/// Responds `204 No Content`; every token issued for the session stops
/// verifying immediately.
pub async fn logout_handler(State(state): State<AuthState>, uri: Uri) -> Response {
    let session_uri = strip_fragment(uri.path());
    match state.sessions.logout(session_uri).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => state.error_response(e),
    }
}
