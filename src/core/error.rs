use thiserror::Error;

#[derive(Error, Debug)]
pub enum ContextError {
    #[error("Key '{0}' not found")]
    NotFound(String),

    #[error("Read-only: cannot write '{key}' on remote unit record {record}")]
    ReadOnly { record: String, key: String },

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Invalid value type for '{key}': only text values are allowed, got {found}")]
    InvalidValueType { key: String, found: &'static str },

    #[error("Malformed identifier '{0}'")]
    MalformedId(String),

    #[error("Transport failure in {operation}: {message}")]
    Transport {
        operation: &'static str,
        message: String,
    },

    #[error("Snapshot error: {0}")]
    Snapshot(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ContextError {
    pub fn transport(operation: &'static str, message: impl Into<String>) -> Self {
        Self::Transport {
            operation,
            message: message.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    pub fn is_read_only(&self) -> bool {
        matches!(self, Self::ReadOnly { .. })
    }

    pub fn is_permission_denied(&self) -> bool {
        matches!(self, Self::PermissionDenied(_))
    }

    pub fn is_invalid_value(&self) -> bool {
        matches!(self, Self::InvalidValueType { .. })
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }
}

pub type Result<T> = std::result::Result<T, ContextError>;

impl From<serde_json::Error> for ContextError {
    fn from(err: serde_json::Error) -> Self {
        Self::Snapshot(err.to_string())
    }
}

impl From<std::io::Error> for ContextError {
    fn from(err: std::io::Error) -> Self {
        Self::Snapshot(err.to_string())
    }
}
