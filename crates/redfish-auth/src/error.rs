//! Authentication and authorization error types.
//!
//! This module defines all error types that can occur while resolving
//! credentials, authorizing requests and managing sessions.

use std::fmt;

use redfish_core::CoreError;

/// Errors that can occur during authentication and authorization operations.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The request lacks valid authentication credentials.
    #[error("Unauthorized: {message}")]
    Unauthorized {
        /// Description of why the request is unauthorized. Logged, never returned.
        message: String,
    },

    /// The bearer token is missing a claim, malformed, or fails verification.
    #[error("Invalid token: {message}")]
    InvalidToken {
        /// Description of why the token is invalid. Logged, never returned.
        message: String,
    },

    /// The identity is known but not entitled to the requested method.
    #[error("Forbidden: {message}")]
    Forbidden {
        /// Description of why access is forbidden.
        message: String,
    },

    /// No resource is registered at the requested URI.
    #[error("Resource not found: {uri}")]
    NotFound {
        /// The URI that could not be resolved.
        uri: String,
    },

    /// The request body or parameters are malformed.
    #[error("Invalid request: {message}")]
    InvalidRequest {
        /// Description of why the request is invalid.
        message: String,
    },

    /// An error occurred while reading or writing the resource store.
    #[error("Storage error: {message}")]
    Storage {
        /// Description of the storage error.
        message: String,
    },

    /// The auth configuration is invalid.
    #[error("Configuration error: {message}")]
    Configuration {
        /// Description of the configuration error.
        message: String,
    },

    /// An unexpected internal error occurred.
    #[error("Internal error: {message}")]
    Internal {
        /// Description of the internal error.
        message: String,
    },
}

impl AuthError {
    /// Creates a new `Unauthorized` error.
    #[must_use]
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: message.into(),
        }
    }

    /// Creates a new `InvalidToken` error.
    #[must_use]
    pub fn invalid_token(message: impl Into<String>) -> Self {
        Self::InvalidToken {
            message: message.into(),
        }
    }

    /// Creates a new `Forbidden` error.
    #[must_use]
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden {
            message: message.into(),
        }
    }

    /// Creates a new `NotFound` error.
    #[must_use]
    pub fn not_found(uri: impl Into<String>) -> Self {
        Self::NotFound { uri: uri.into() }
    }

    /// Creates a new `InvalidRequest` error.
    #[must_use]
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    /// Creates a new `Storage` error.
    #[must_use]
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Creates a new `Configuration` error.
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Creates a new `Internal` error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns `true` if this is a client error (4xx category).
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::Unauthorized { .. }
                | Self::InvalidToken { .. }
                | Self::Forbidden { .. }
                | Self::NotFound { .. }
                | Self::InvalidRequest { .. }
        )
    }

    /// Returns `true` if this is a server error (5xx category).
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        matches!(
            self,
            Self::Storage { .. } | Self::Configuration { .. } | Self::Internal { .. }
        )
    }

    /// Returns `true` if this error maps to 401.
    #[must_use]
    pub fn is_authentication_error(&self) -> bool {
        matches!(self, Self::Unauthorized { .. } | Self::InvalidToken { .. })
    }

    /// Returns `true` if this error maps to 403.
    #[must_use]
    pub fn is_authorization_error(&self) -> bool {
        matches!(self, Self::Forbidden { .. })
    }

    /// Returns the error category for logging purposes.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Unauthorized { .. } => ErrorCategory::Authentication,
            Self::InvalidToken { .. } => ErrorCategory::Token,
            Self::Forbidden { .. } => ErrorCategory::Authorization,
            Self::NotFound { .. } => ErrorCategory::Resolution,
            Self::InvalidRequest { .. } => ErrorCategory::Validation,
            Self::Storage { .. } => ErrorCategory::Infrastructure,
            Self::Configuration { .. } => ErrorCategory::Configuration,
            Self::Internal { .. } => ErrorCategory::Internal,
        }
    }
}

impl From<CoreError> for AuthError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ResourceNotFound { uri } => Self::NotFound { uri },
            CoreError::InvalidResource { message } => Self::InvalidRequest { message },
            other => Self::Storage {
                message: other.to_string(),
            },
        }
    }
}

/// Categories of authentication/authorization errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Credential verification failed.
    Authentication,
    /// Identity lacks the required privilege.
    Authorization,
    /// Bearer token problems.
    Token,
    /// Tree or resource lookup failed.
    Resolution,
    /// Malformed input.
    Validation,
    /// Store failures.
    Infrastructure,
    /// Misconfiguration.
    Configuration,
    /// Anything else.
    Internal,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Authentication => "authentication",
            Self::Authorization => "authorization",
            Self::Token => "token",
            Self::Resolution => "resolution",
            Self::Validation => "validation",
            Self::Infrastructure => "infrastructure",
            Self::Configuration => "configuration",
            Self::Internal => "internal",
        };
        write!(f, "{s}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AuthError::unauthorized("bad password");
        assert_eq!(err.to_string(), "Unauthorized: bad password");

        let err = AuthError::not_found("/redfish/v1/Nope");
        assert_eq!(err.to_string(), "Resource not found: /redfish/v1/Nope");
    }

    #[test]
    fn test_error_predicates() {
        let err = AuthError::invalid_token("signature mismatch");
        assert!(err.is_client_error());
        assert!(err.is_authentication_error());
        assert!(!err.is_authorization_error());

        let err = AuthError::forbidden("no privilege");
        assert!(err.is_client_error());
        assert!(!err.is_authentication_error());
        assert!(err.is_authorization_error());

        let err = AuthError::storage("store down");
        assert!(!err.is_client_error());
        assert!(err.is_server_error());
    }

    #[test]
    fn test_error_category() {
        assert_eq!(
            AuthError::unauthorized("x").category(),
            ErrorCategory::Authentication
        );
        assert_eq!(AuthError::invalid_token("x").category(), ErrorCategory::Token);
        assert_eq!(
            AuthError::not_found("/x").category(),
            ErrorCategory::Resolution
        );
        assert_eq!(
            AuthError::storage("x").category(),
            ErrorCategory::Infrastructure
        );
    }

    #[test]
    fn test_from_core_error() {
        let err: AuthError = CoreError::resource_not_found("/a").into();
        assert!(matches!(err, AuthError::NotFound { ref uri } if uri == "/a"));

        let err: AuthError = CoreError::resource_conflict("/a").into();
        assert!(err.is_server_error());
    }

    #[test]
    fn test_error_category_display() {
        assert_eq!(ErrorCategory::Authentication.to_string(), "authentication");
        assert_eq!(ErrorCategory::Resolution.to_string(), "resolution");
    }
}
