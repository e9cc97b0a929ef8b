//! Error types for the engine contract

use std::path::PathBuf;

/// A diagnostic reported by the reconciliation engine
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    /// General engine failure
    #[error("{0}")]
    Message(String),

    /// Failure attributed to one resource
    #[error("{address}: {message}")]
    Resource { address: String, message: String },

    /// Context could not be constructed from the supplied options
    #[error("invalid context: {0}")]
    Context(String),

    /// Interactive input could not be read
    #[error("input failed: {0}")]
    Input(String),

    /// The engine stopped because a hook asked it to
    #[error("halted by hook")]
    Halted,
}

impl EngineError {
    /// General failure with the given message
    pub fn msg(message: impl Into<String>) -> Self {
        Self::Message(message.into())
    }

    /// Failure attributed to `address`
    pub fn resource(address: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Resource {
            address: address.into(),
            message: message.into(),
        }
    }

    /// Resource address the diagnostic is attributed to, if any
    #[must_use]
    pub fn address(&self) -> Option<&str> {
        match self {
            Self::Resource { address, .. } => Some(address),
            _ => None,
        }
    }
}

/// Module tree could not be loaded
#[derive(Debug, thiserror::Error)]
#[error("{path}: {message}")]
pub struct ModuleError {
    /// Root the loader was given
    pub path: PathBuf,
    /// What went wrong
    pub message: String,
}

/// Errors reading or writing a saved plan
#[derive(Debug, thiserror::Error)]
pub enum PlanFileError {
    /// Plan file could not be read
    #[error("failed to read plan file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Plan file does not contain a plan
    #[error("failed to decode plan file {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Plan could not be encoded
    #[error("failed to encode plan: {0}")]
    Encode(#[source] serde_json::Error),

    /// Plan file could not be written
    #[error("failed to write plan file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resource_error_names_address() {
        let err = EngineError::resource("test_instance.foo", "quota exceeded");
        assert_eq!(err.to_string(), "test_instance.foo: quota exceeded");
        assert_eq!(err.address(), Some("test_instance.foo"));
        assert_eq!(EngineError::msg("x").address(), None);
    }
}
