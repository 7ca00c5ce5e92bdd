use discovery_llm::error::LlmError;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Storage operation failed: {0}")]
    OperationFailed(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Database lock poisoned: {0}")]
    Lock(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Migration failed: {0}")]
    Migration(String),
}

impl From<rusqlite::Error> for StorageError {
    fn from(err: rusqlite::Error) -> Self {
        StorageError::OperationFailed(err.to_string())
    }
}

impl From<refinery::Error> for StorageError {
    fn from(err: refinery::Error) -> Self {
        StorageError::Migration(err.to_string())
    }
}

/// Input errors surfaced to callers as `status: error`
#[derive(Debug, thiserror::Error)]
pub enum DiscoveryError {
    #[error("Project {0} not found")]
    ProjectNotFound(i64),

    #[error("No project named '{0}'")]
    ProjectNameNotFound(String),

    #[error("No SOW data found for project {0}")]
    MissingSowData(i64),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Failed to extract text from {path}: {message}")]
    Extraction { path: String, message: String },

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Llm(#[from] LlmError),
}
