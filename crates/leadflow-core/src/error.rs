//! Error types for Leadflow.
//!
//! Every command is total over the current store: it either applies
//! completely or returns one of these without mutating anything.

/// Top-level error type for all Leadflow operations.
#[derive(Debug, thiserror::Error)]
pub enum LeadflowError {
    /// Missing or malformed input on create/edit. Nothing was recorded.
    #[error("validation error: {0}")]
    Validation(String),

    /// A command referenced an id the store does not know.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// The command is not allowed in the current state.
    #[error("state error: {0}")]
    State(String),

    /// Configuration loading or parsing error.
    #[error("config error: {0}")]
    Config(String),

    /// Outreach delivery failed in a channel transport.
    #[error("channel error: {0}")]
    Channel(String),

    /// External lookup (geocoding) failed.
    #[error("lookup error: {0}")]
    Lookup(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, LeadflowError>;

impl LeadflowError {
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Whether this is a not-found rejection.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_display() {
        let err = LeadflowError::not_found("campaign", "c-1");
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "campaign not found: c-1");
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: LeadflowError = io.into();
        assert!(matches!(err, LeadflowError::Io(_)));
        assert!(!err.is_not_found());
    }
}
