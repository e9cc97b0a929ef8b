//! Error types for backends and operations
//!
//! Failures are split by the channel they travel on:
//! - [`BackendError`]: returned synchronously by `operation()` before any work starts
//! - [`OperationError`]: recorded on the [`RunningOperation`](crate::RunningOperation)
//! - [`ConfigError`]: backend configuration schema violations

use crate::operation::OperationType;
use std::fmt;
use std::path::PathBuf;
use terrace_engine::{EngineError, PlanFileError};
use terrace_state::StateError;

/// Pre-flight errors, raised before an operation is started
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// The backend does not handle this operation type
    #[error("unsupported operation type: {0}")]
    UnsupportedOperation(OperationType),

    /// Saved plans can only be referenced by path here
    #[error("plan ids are not supported by this backend, pass a plan file path instead")]
    PlanIdUnsupported,

    /// A saved plan already fixes its configuration
    #[error("a saved plan cannot be combined with a configuration module")]
    PlanWithModule,
}

/// Backend configuration errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// Key is not part of the schema
    #[error("unknown configuration key: {0}")]
    UnknownKey(String),

    /// Key has a value of the wrong type
    #[error("{key}: expected {expected}")]
    WrongType { key: String, expected: &'static str },

    /// Reported by a delegate backend
    #[error("{0}")]
    Backend(String),
}

/// All errors returned by one validation pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationErrors {
    errors: Vec<EngineError>,
}

impl ValidationErrors {
    /// Wrap a non-empty list of validation errors
    #[must_use]
    pub fn new(errors: Vec<EngineError>) -> Self {
        Self { errors }
    }

    /// Every collected error, in the order reported
    #[must_use]
    pub fn errors(&self) -> &[EngineError] {
        &self.errors
    }

    /// Number of collected errors
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Whether nothing was collected
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.errors.len() {
            1 => writeln!(f, "1 error occurred:")?,
            n => writeln!(f, "{n} errors occurred:")?,
        }
        for err in &self.errors {
            write!(f, "\n* {err}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

/// Coarse classification of an [`OperationError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// There is no state yet; the user should provision first
    NotProvisioned,
    /// State exists but could not be read
    StateUnreadable,
    /// State exists but its content is damaged or from a newer format
    StateCorrupt,
    /// State could not be written, backed up or persisted
    StateIo,
    /// The engine rejected the context options
    Context,
    /// Interactive input failed
    Input,
    /// Configuration failed validation
    Validation,
    /// The engine failed while refreshing, planning or applying
    Engine,
    /// A saved plan could not be read or written
    PlanFile,
    /// The caller cancelled the operation
    Cancelled,
    /// The handler panicked
    Panicked,
}

/// Asynchronous failures, recorded on the running operation
#[derive(Debug, thiserror::Error)]
pub enum OperationError {
    /// No state file where one is required
    #[error(
        "The state file for your infrastructure does not\n\
         exist. The 'refresh' command only works and only makes sense\n\
         when there is existing state that is being managed. Please\n\
         double-check the value given below and try again. If you\n\
         haven't created infrastructure yet, use the 'apply' command.\n\n\
         Path: {}",
        .path.display()
    )]
    NotProvisioned { path: PathBuf },

    /// State file exists but could not be inspected
    #[error(
        "There was an error reading the state that is needed\n\
         for refreshing. The path and error are shown below.\n\n\
         Path: {}\n\nError: {}",
        .path.display(),
        .source
    )]
    StateUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// State could not be loaded
    #[error("Error loading state: {0}")]
    StateLoad(#[source] StateError),

    /// State could not be written
    #[error("Error writing state: {0}")]
    StateWrite(#[source] StateError),

    /// State could not be persisted
    #[error("Error saving state: {0}")]
    StatePersist(#[source] StateError),

    /// Engine context could not be built
    #[error(transparent)]
    Context(EngineError),

    /// Interactive input failed
    #[error("Error asking for user input: {0}")]
    Input(#[source] EngineError),

    /// Validation reported errors
    #[error(transparent)]
    Validation(ValidationErrors),

    /// Engine refresh failed
    #[error("Error refreshing state: {0}")]
    Refresh(#[source] EngineError),

    /// Engine plan failed
    #[error("Error running plan: {0}")]
    Plan(#[source] EngineError),

    /// Engine apply failed
    #[error("Error applying plan: {0}")]
    Apply(#[source] EngineError),

    /// Apply failed and the state it reached could not be saved either
    #[error("Error applying plan: {apply}\n\n{save}")]
    ApplyNotSaved {
        apply: EngineError,
        #[source]
        save: Box<OperationError>,
    },

    /// Plan could not be saved
    #[error("Error writing plan file: {0}")]
    PlanFileWrite(#[source] PlanFileError),

    /// Saved plan could not be loaded
    #[error("Error reading plan file: {0}")]
    PlanFileRead(#[source] PlanFileError),

    /// Caller cancelled before the next phase started
    #[error("operation cancelled")]
    Cancelled,

    /// The handler panicked
    #[error("operation panicked: {0}")]
    Panicked(String),
}

impl OperationError {
    /// Classify the failure
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotProvisioned { .. } => ErrorKind::NotProvisioned,
            Self::StateUnreadable { .. } => ErrorKind::StateUnreadable,
            Self::StateLoad(e) if e.is_corrupt() => ErrorKind::StateCorrupt,
            Self::StateLoad(StateError::Read { .. }) => ErrorKind::StateUnreadable,
            Self::StateLoad(_) | Self::StateWrite(_) | Self::StatePersist(_) => ErrorKind::StateIo,
            Self::Context(_) => ErrorKind::Context,
            Self::Input(_) => ErrorKind::Input,
            Self::Validation(_) => ErrorKind::Validation,
            Self::Refresh(_) | Self::Plan(_) | Self::Apply(_) | Self::ApplyNotSaved { .. } => ErrorKind::Engine,
            Self::PlanFileWrite(_) | Self::PlanFileRead(_) => ErrorKind::PlanFile,
            Self::Cancelled => ErrorKind::Cancelled,
            Self::Panicked(_) => ErrorKind::Panicked,
        }
    }

    /// Whether the fix is to provision infrastructure first
    #[inline]
    #[must_use]
    pub fn is_not_provisioned(&self) -> bool {
        self.kind() == ErrorKind::NotProvisioned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn validation_errors_list_every_message() {
        let errs = ValidationErrors::new(vec![
            EngineError::msg("a"),
            EngineError::msg("b"),
            EngineError::resource("x.y", "c"),
        ]);
        assert_eq!(errs.to_string(), "3 errors occurred:\n\n* a\n* b\n* x.y: c");
        assert_eq!(
            ValidationErrors::new(vec![EngineError::msg("only")]).to_string(),
            "1 error occurred:\n\n* only"
        );
    }

    #[test]
    fn state_load_kinds_separate_corrupt_from_unreadable() {
        let corrupt = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = OperationError::StateLoad(StateError::parse("s", corrupt));
        assert_eq!(err.kind(), ErrorKind::StateCorrupt);

        let err = OperationError::StateLoad(StateError::read("s", io::Error::from(io::ErrorKind::PermissionDenied)));
        assert_eq!(err.kind(), ErrorKind::StateUnreadable);

        let err = OperationError::NotProvisioned { path: "s".into() };
        assert!(err.is_not_provisioned());
        assert!(err.to_string().ends_with("Path: s"));
    }
}
