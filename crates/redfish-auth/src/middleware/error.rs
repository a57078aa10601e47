//! Error response handling for the auth layer.
//!
//! This module implements `IntoResponse` for `AuthError`, producing the
//! Redfish error body (`{"error": {"code", "message", "@Message.ExtendedInfo"}}`).
//! Authentication failures always carry the same generic message; the
//! detailed reason only goes to the log.

use axum::{
    Json,
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::error::AuthError;

/// Realm used when the configured one is not at hand.
pub const DEFAULT_REALM: &str = "redfish";

const GENERIC_UNAUTHORIZED: &str =
    "The request requires authentication: supply valid credentials or a valid session token.";
const GENERIC_INTERNAL: &str = "The request failed due to an internal service error.";

// =============================================================================
// IntoResponse Implementation
// =============================================================================

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        self.into_response_with_realm(DEFAULT_REALM)
    }
}

impl AuthError {
    /// Builds the HTTP response, advertising `realm` on 401.
    pub fn into_response_with_realm(self, realm: &str) -> Response {
        let (status, message_id, message) = error_details(&self);

        if self.is_server_error() {
            tracing::error!(error = %self, category = %self.category(), "request failed");
        }

        let body = redfish_error_json(message_id, &message, resolution(status));

        let mut headers = HeaderMap::new();
        if status == StatusCode::UNAUTHORIZED {
            let www_auth = build_www_authenticate_header(realm);
            if let Ok(value) = HeaderValue::from_str(&www_auth) {
                headers.insert(header::WWW_AUTHENTICATE, value);
            }
        }

        (status, headers, Json(body)).into_response()
    }
}

/// Extracts error details from an AuthError.
///
/// Returns (HTTP status, Redfish message id, client-facing message).
fn error_details(error: &AuthError) -> (StatusCode, &'static str, String) {
    match error {
        AuthError::Unauthorized { .. } | AuthError::InvalidToken { .. } => (
            StatusCode::UNAUTHORIZED,
            "Base.1.0.NoValidSession",
            GENERIC_UNAUTHORIZED.to_string(),
        ),
        AuthError::Forbidden { message } => (
            StatusCode::FORBIDDEN,
            "Base.1.0.InsufficientPrivilege",
            message.clone(),
        ),
        AuthError::NotFound { uri } => (
            StatusCode::NOT_FOUND,
            "Base.1.0.ResourceMissingAtURI",
            format!("The resource at the URI {uri} was not found."),
        ),
        AuthError::InvalidRequest { message } => (
            StatusCode::BAD_REQUEST,
            "Base.1.0.MalformedJSON",
            message.clone(),
        ),
        AuthError::Storage { .. }
        | AuthError::Configuration { .. }
        | AuthError::Internal { .. } => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Base.1.0.InternalError",
            GENERIC_INTERNAL.to_string(),
        ),
    }
}

fn resolution(status: StatusCode) -> &'static str {
    match status {
        StatusCode::UNAUTHORIZED => "Log in with valid credentials and resubmit the request.",
        StatusCode::FORBIDDEN => "Use an account with the required privilege.",
        StatusCode::NOT_FOUND => "Provide a valid URI and resubmit the request.",
        StatusCode::BAD_REQUEST => "Correct the request body and resubmit the request.",
        _ => "Resubmit the request. If the problem persists, contact the administrator.",
    }
}

/// Builds the WWW-Authenticate header value for 401 responses.
///
/// Format: `Basic realm="redfish"`
fn build_www_authenticate_header(realm: &str) -> String {
    let escaped = realm.replace('"', "\\\"");
    format!("Basic realm=\"{escaped}\"")
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Creates a Redfish error JSON body.
#[must_use]
pub fn redfish_error_json(message_id: &str, message: &str, resolution: &str) -> serde_json::Value {
    json!({
        "error": {
            "code": message_id,
            "message": message,
            "@Message.ExtendedInfo": [{
                "@odata.type": "#Message.v1_0_0.Message",
                "MessageId": message_id,
                "Message": message,
                "Severity": "Critical",
                "Resolution": resolution
            }]
        }
    })
}

// =============================================================================
// Tests
// =============================================================================
