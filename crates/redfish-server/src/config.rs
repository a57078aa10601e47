use redfish_auth::AuthConfig;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Authentication and session configuration
    #[serde(default)]
    pub auth: AuthConfig,
    /// Accounts created at startup
    #[serde(default)]
    pub bootstrap: BootstrapConfig,
}

impl AppConfig {
    pub fn addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("invalid server address: {e}"))
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.server.port == 0 {
            return Err("server.port must be > 0".into());
        }
        self.addr()?;
        let lvl = self.logging.level.to_ascii_lowercase();
        let valid_levels = ["trace", "debug", "info", "warn", "error", "off"];
        if !valid_levels.contains(&lvl.as_str()) {
            return Err(format!("logging.level must be one of {valid_levels:?}"));
        }
        self.auth.validate().map_err(|e| format!("auth: {e}"))?;
        for account in &self.bootstrap.accounts {
            if account.username.is_empty() {
                return Err("bootstrap.accounts: username cannot be empty".into());
            }
            if account.role.is_empty() {
                return Err(format!(
                    "bootstrap.accounts: account '{}' has no role",
                    account.username
                ));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".into()
}
fn default_port() -> u16 {
    8000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}
fn default_log_level() -> String {
    "info".into()
}
impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BootstrapConfig {
    #[serde(default)]
    pub accounts: Vec<BootstrapAccount>,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct BootstrapAccount {
    pub username: String,
    pub password: String,
    pub role: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl std::fmt::Debug for BootstrapAccount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BootstrapAccount")
            .field("username", &self.username)
            .field("role", &self.role)
            .field("enabled", &self.enabled)
            .finish_non_exhaustive()
    }
}

pub mod loader {
    use super::AppConfig;
    use config::{Config, Environment, File};
    use std::path::PathBuf;

    pub fn load_config(path: Option<&str>) -> Result<AppConfig, String> {
        let mut builder = Config::builder();
        let pathbuf = PathBuf::from(path.unwrap_or("redfish.toml"));
        if pathbuf.exists() {
            builder = builder.add_source(File::from(pathbuf));
        }
        // Environment variable overrides, e.g., REDFISH__SERVER__PORT=9090
        builder = builder.add_source(
            Environment::with_prefix("REDFISH")
                .try_parsing(true)
                .separator("__"),
        );
        let cfg = builder
            .build()
            .map_err(|e| format!("config build error: {e}"))?;
        let merged: AppConfig = cfg
            .try_deserialize()
            .map_err(|e| format!("config deserialize error: {e}"))?;
        merged.validate()?;
        Ok(merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let cfg = AppConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.addr().unwrap().port(), 8000);
    }

    #[test]
    fn test_invalid_log_level_rejected() {
        let mut cfg = AppConfig::default();
        cfg.logging.level = "loud".into();
        assert!(cfg.validate().unwrap_err().contains("logging.level"));
    }

    #[test]
    fn test_invalid_auth_rejected() {
        let mut cfg = AppConfig::default();
        cfg.auth.session.secret_length = 8;
        assert!(cfg.validate().unwrap_err().starts_with("auth:"));
    }

    #[test]
    fn test_bootstrap_account_needs_role() {
        let mut cfg = AppConfig::default();
        cfg.bootstrap.accounts.push(BootstrapAccount {
            username: "root".into(),
            password: "pw".into(),
            role: String::new(),
            enabled: true,
        });
        assert!(cfg.validate().unwrap_err().contains("root"));
    }

    #[test]
    fn test_bootstrap_account_debug_hides_password() {
        let account = BootstrapAccount {
            username: "root".into(),
            password: "hunter2".into(),
            role: "Administrator".into(),
            enabled: true,
        };
        assert!(!format!("{account:?}").contains("hunter2"));
    }
}
