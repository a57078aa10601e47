//! Session token encoding and verification.
//!
//! Session tokens are HS256-signed JWTs. Each session has its own signing
//! secret, stored in the session resource's private fields, so verifying a
//! token means finding the session first. The unverified payload is peeked
//! to learn which session to look up; the signature is then checked with
//! that session's secret.
//!
//! ## Claims
//!
//! | claim        | meaning                           |
//! |--------------|-----------------------------------|
//! | `iat`        | issued-at, unix seconds           |
//! | `iss`        | fixed issuer string               |
//! | `sub`        | username                          |
//! | `privileges` | privileges granted at login       |
//! | `sessionuri` | URI of the bound session resource |

use std::collections::HashSet;
use std::future::Future;

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

// ============================================================================
// Error Types
// ============================================================================

/// Errors that can occur while encoding or verifying session tokens.
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    /// Failed to sign a token.
    #[error("Failed to encode token: {message}")]
    Encoding { message: String },

    /// The token is not a well-formed JWT.
    #[error("Malformed token: {message}")]
    Malformed { message: String },

    /// The signature does not match the session secret.
    #[error("Invalid token signature")]
    InvalidSignature,

    /// A claim is missing or has an unexpected value.
    #[error("Invalid token claims: {message}")]
    InvalidClaims { message: String },

    /// The session named by the token does not exist (never created or removed).
    #[error("Unknown session: {session_uri}")]
    UnknownSession { session_uri: String },

    /// The key lookup itself failed.
    #[error("Key lookup failed: {message}")]
    KeyLookup { message: String },
}

impl TokenError {
    #[must_use]
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn invalid_claims(message: impl Into<String>) -> Self {
        Self::InvalidClaims {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn unknown_session(session_uri: impl Into<String>) -> Self {
        Self::UnknownSession {
            session_uri: session_uri.into(),
        }
    }

    #[must_use]
    pub fn key_lookup(message: impl Into<String>) -> Self {
        Self::KeyLookup {
            message: message.into(),
        }
    }
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        match err.kind() {
            ErrorKind::InvalidSignature => Self::InvalidSignature,
            ErrorKind::InvalidIssuer
            | ErrorKind::InvalidSubject
            | ErrorKind::MissingRequiredClaim(_) => Self::invalid_claims(err.to_string()),
            _ => Self::malformed(err.to_string()),
        }
    }
}

// ============================================================================
// Claims
// ============================================================================

/// Claims carried by a session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Issued at, unix seconds.
    pub iat: i64,
    pub iss: String,
    /// Username.
    pub sub: String,
    pub privileges: Vec<String>,
    #[serde(rename = "sessionuri")]
    pub session_uri: String,
}

impl SessionClaims {
    pub fn new<I, S>(
        issuer: impl Into<String>,
        username: impl Into<String>,
        session_uri: impl Into<String>,
        privileges: I,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            iat: OffsetDateTime::now_utc().unix_timestamp(),
            iss: issuer.into(),
            sub: username.into(),
            privileges: privileges.into_iter().map(Into::into).collect(),
            session_uri: session_uri.into(),
        }
    }
}

// ============================================================================
// Codec
// ============================================================================

/// Signs and verifies session tokens for a fixed issuer.
#[derive(Debug, Clone)]
pub struct SessionTokenCodec {
    issuer: String,
}

impl SessionTokenCodec {
    pub fn new(issuer: impl Into<String>) -> Self {
        Self {
            issuer: issuer.into(),
        }
    }

    #[must_use]
    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// Sign `claims` with the session secret.
    ///
    /// # Errors
    /// Returns an error if the claims cannot be serialized.
    pub fn sign(&self, claims: &SessionClaims, secret: &[u8]) -> Result<String, TokenError> {
        encode(
            &Header::new(Algorithm::HS256),
            claims,
            &EncodingKey::from_secret(secret),
        )
        .map_err(|e| TokenError::Encoding {
            message: e.to_string(),
        })
    }

    /// Read the claims without checking the signature.
    ///
    /// Only used to find the verification key; never trust the result.
    pub fn peek(&self, token: &str) -> Result<SessionClaims, TokenError> {
        let mut parts = token.split('.');
        let (Some(_header), Some(payload), Some(_signature), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(TokenError::malformed("expected three dot-separated segments"));
        };

        let bytes = URL_SAFE_NO_PAD
            .decode(payload)
            .map_err(|e| TokenError::malformed(format!("payload is not base64url: {e}")))?;
        serde_json::from_slice(&bytes)
            .map_err(|e| TokenError::malformed(format!("payload is not valid claims: {e}")))
    }

    /// Verify `token` against a known secret.
    pub fn verify(&self, token: &str, secret: &[u8]) -> Result<SessionClaims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.issuer]);
        // Session lifetime is enforced by the idle watchdog, not by `exp`.
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.required_spec_claims = HashSet::from(["iss".to_string()]);

        let data = decode::<SessionClaims>(token, &DecodingKey::from_secret(secret), &validation)?;
        Ok(data.claims)
    }

    /// Verify `token`, obtaining the secret from `key_for`.
    ///
    /// `key_for` receives the session URI named by the (still unverified)
    /// token and must fail when that session does not exist.
    pub async fn verify_with<F, Fut>(&self, token: &str, key_for: F) -> Result<SessionClaims, TokenError>
    where
        F: FnOnce(String) -> Fut,
        Fut: Future<Output = Result<Vec<u8>, TokenError>>,
    {
        let unverified = self.peek(token)?;
        if unverified.session_uri.is_empty() {
            return Err(TokenError::invalid_claims("sessionuri is empty"));
        }

        let secret = key_for(unverified.session_uri.clone()).await?;
        let claims = self.verify(token, &secret)?;

        if claims.session_uri != unverified.session_uri {
            return Err(TokenError::invalid_claims("sessionuri changed during verification"));
        }
        Ok(claims)
    }
}
