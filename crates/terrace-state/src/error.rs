//! Error types for state handles
//!
//! Every variant that touches the backing store carries the path involved,
//! so callers can name both the failing phase and the location.

use std::path::PathBuf;

/// Errors raised while loading, writing, backing up or persisting state
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    /// Backing location exists but could not be read
    #[error("error reading state at {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Backing location was read but does not contain a valid state
    #[error("error parsing state at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// State was written by a newer format revision
    #[error("state at {path} has format version {found}, newer than supported version {supported}")]
    UnsupportedVersion {
        path: PathBuf,
        found: u32,
        supported: u32,
    },

    /// State could not be encoded
    #[error("error encoding state: {0}")]
    Encode(#[source] serde_json::Error),

    /// Durable write of the state failed
    #[error("error writing state to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Backup of the pre-write state failed
    #[error("error writing state backup to {path}: {source}")]
    Backup {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Serial cannot be advanced any further
    #[error("state at {path} has reached the maximum serial")]
    SerialExhausted { path: PathBuf },

    /// Failure reported by a non-file state backend
    #[error("state backend error: {0}")]
    Backend(String),
}

impl StateError {
    /// Create read error for path
    pub fn read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Read {
            path: path.into(),
            source,
        }
    }

    /// Create parse error for path
    pub fn parse(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Self::Parse {
            path: path.into(),
            source,
        }
    }

    /// Create write error for path
    pub fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Write {
            path: path.into(),
            source,
        }
    }

    /// Create backup error for path
    pub fn backup(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Backup {
            path: path.into(),
            source,
        }
    }

    /// Path of the backing location involved, if any
    #[must_use]
    pub fn path(&self) -> Option<&std::path::Path> {
        match self {
            Self::Read { path, .. }
            | Self::Parse { path, .. }
            | Self::UnsupportedVersion { path, .. }
            | Self::Write { path, .. }
            | Self::Backup { path, .. }
            | Self::SerialExhausted { path } => Some(path),
            Self::Encode(_) | Self::Backend(_) => None,
        }
    }

    /// Whether the stored content itself is damaged (as opposed to I/O trouble)
    #[inline]
    #[must_use]
    pub fn is_corrupt(&self) -> bool {
        matches!(self, Self::Parse { .. } | Self::UnsupportedVersion { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn state_error_carries_path() {
        let err = StateError::read("a/b.tfstate", io::Error::from(io::ErrorKind::PermissionDenied));
        assert_eq!(err.path(), Some(std::path::Path::new("a/b.tfstate")));
        assert!(err.to_string().contains("a/b.tfstate"));
        assert!(!err.is_corrupt());
    }

    #[test]
    fn parse_error_is_corrupt() {
        let source = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = StateError::parse("x.tfstate", source);
        assert!(err.is_corrupt());
        assert!(StateError::Backend("boom".into()).path().is_none());
    }
}
