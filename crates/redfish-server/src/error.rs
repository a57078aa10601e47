use redfish_auth::AuthError;
use redfish_core::CoreError;

/// Errors raised while assembling or running the server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("resource tree bootstrap failed: {0}")]
    Bootstrap(#[from] CoreError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
