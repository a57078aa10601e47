use thiserror::Error;

/// Core error types for resource store and read-model operations
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Resource not found: {uri}")]
    ResourceNotFound { uri: String },

    #[error("Resource conflict: {uri} already exists")]
    ResourceConflict { uri: String },

    #[error("Resource is not a collection: {uri}")]
    NotACollection { uri: String },

    #[error("Invalid resource data: {message}")]
    InvalidResource { message: String },

    #[error("Store error: {message}")]
    Store { message: String },

    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl CoreError {
    /// Create a new ResourceNotFound error
    pub fn resource_not_found(uri: impl Into<String>) -> Self {
        Self::ResourceNotFound { uri: uri.into() }
    }

    /// Create a new ResourceConflict error
    pub fn resource_conflict(uri: impl Into<String>) -> Self {
        Self::ResourceConflict { uri: uri.into() }
    }

    /// Create a new NotACollection error
    pub fn not_a_collection(uri: impl Into<String>) -> Self {
        Self::NotACollection { uri: uri.into() }
    }

    /// Create a new InvalidResource error
    pub fn invalid_resource(message: impl Into<String>) -> Self {
        Self::InvalidResource {
            message: message.into(),
        }
    }

    /// Create a new Store error
    pub fn store(message: impl Into<String>) -> Self {
        Self::Store {
            message: message.into(),
        }
    }

    /// Returns `true` for lookups that failed because the resource is absent.
    ///
    /// The read model is eventually consistent, so callers treat this as a
    /// legitimate transient outcome rather than a corrupted store.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::ResourceNotFound { .. })
    }
}

/// Result type alias for core operations
pub type CoreResult<T> = std::result::Result<T, CoreError>;
