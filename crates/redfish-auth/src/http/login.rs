//! Session login endpoint.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::{HeaderName, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};

use crate::error::AuthError;
use crate::middleware::AuthState;
use crate::session::LoginRequest;

/// Creates a session.
///
/// Responds `201 Created` with the session body, a `Location` header and
/// the token in the configured token header.
pub async fn login_handler(
    State(state): State<AuthState>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match body {
        Ok(body) => body,
        Err(rejection) => {
            return state.error_response(AuthError::invalid_request(format!(
                "invalid login request: {}",
                rejection.body_text()
            )));
        }
    };

    let outcome = match state.sessions.login(request).await {
        Ok(outcome) => outcome,
        Err(e) => return state.error_response(e),
    };

    let token_header = HeaderName::from_bytes(state.config.token_header.as_bytes());
    let token_value = HeaderValue::from_str(&outcome.token);
    let location = HeaderValue::from_str(&outcome.location);
    let (Ok(token_header), Ok(token_value), Ok(location)) = (token_header, token_value, location)
    else {
        return state.error_response(AuthError::internal("session headers are not valid"));
    };

    (
        StatusCode::CREATED,
        [(token_header, token_value), (header::LOCATION, location)],
        Json(outcome.session),
    )
        .into_response()
}
