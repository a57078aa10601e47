//! Authentication and session configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Minimum accepted length of a session signing secret.
pub const MIN_SECRET_LENGTH: usize = 24;

/// Root authentication configuration.
///
/// # Example (TOML)
///
/// ```toml
/// [auth]
/// issuer = "localhost"
/// token_header = "X-Auth-Token"
///
/// [auth.session]
/// idle_timeout = "30s"
/// ```
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Value of the `iss` claim in session tokens.
    pub issuer: String,

    /// Request/response header that carries the session token.
    pub token_header: String,

    /// Realm advertised in `WWW-Authenticate` on 401 responses.
    pub realm: String,

    /// Session lifecycle configuration.
    pub session: SessionConfig,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            issuer: "localhost".to_string(),
            token_header: "X-Auth-Token".to_string(),
            realm: "redfish".to_string(),
            session: SessionConfig::default(),
        }
    }
}

/// Session lifecycle configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Sliding idle window after which an unused session is deleted.
    #[serde(with = "humantime_serde")]
    pub idle_timeout: Duration,

    /// Length of the per-session signing secret.
    pub secret_length: usize,

    /// Collection that session resources are linked into.
    pub collection_uri: String,

    /// Number of recently verified tokens kept by the bearer resolver.
    /// Zero disables the cache.
    pub token_cache_size: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            idle_timeout: Duration::from_secs(30),
            secret_length: MIN_SECRET_LENGTH,
            collection_uri: "/redfish/v1/SessionService/Sessions".to_string(),
            token_cache_size: 4,
        }
    }
}

/// Configuration validation errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    /// An invalid configuration value was provided.
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

impl AuthConfig {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if:
    /// - The issuer or token header is empty
    /// - The idle timeout is zero
    /// - The secret length is below [`MIN_SECRET_LENGTH`]
    /// - The session collection URI is not absolute
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.issuer.is_empty() {
            return Err(ConfigError::InvalidValue(
                "issuer cannot be empty".to_string(),
            ));
        }

        if self.token_header.is_empty() {
            return Err(ConfigError::InvalidValue(
                "token_header cannot be empty".to_string(),
            ));
        }

        if self.session.idle_timeout.is_zero() {
            return Err(ConfigError::InvalidValue(
                "session.idle_timeout must be > 0".to_string(),
            ));
        }

        if self.session.secret_length < MIN_SECRET_LENGTH {
            return Err(ConfigError::InvalidValue(format!(
                "session.secret_length must be >= {MIN_SECRET_LENGTH}, got {}",
                self.session.secret_length
            )));
        }

        if !self.session.collection_uri.starts_with('/') {
            return Err(ConfigError::InvalidValue(format!(
                "session.collection_uri must start with '/', got '{}'",
                self.session.collection_uri
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AuthConfig::default();
        assert_eq!(config.issuer, "localhost");
        assert_eq!(config.token_header, "X-Auth-Token");
        assert_eq!(config.session.idle_timeout, Duration::from_secs(30));
        assert_eq!(config.session.secret_length, 24);
        assert_eq!(config.session.token_cache_size, 4);
    }

    #[test]
    fn test_default_config_validates() {
        assert!(AuthConfig::default().validate().is_ok());
    }

    #[test]
    fn test_zero_idle_timeout_fails_validation() {
        let mut config = AuthConfig::default();
        config.session.idle_timeout = Duration::ZERO;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("idle_timeout"));
    }

    #[test]
    fn test_short_secret_fails_validation() {
        let mut config = AuthConfig::default();
        config.session.secret_length = 8;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("secret_length"));
    }

    #[test]
    fn test_relative_collection_uri_fails_validation() {
        let mut config = AuthConfig::default();
        config.session.collection_uri = "Sessions".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_deserialization_uses_defaults() {
        let config: AuthConfig = serde_json::from_value(serde_json::json!({
            "session": { "idle_timeout": "2m" }
        }))
        .unwrap();
        assert_eq!(config.session.idle_timeout, Duration::from_secs(120));
        assert_eq!(config.issuer, "localhost");
        assert_eq!(config.session.secret_length, 24);
    }
}
