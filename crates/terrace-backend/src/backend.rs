//! Backend capability traits
//!
//! [`Backend`] covers configuration and state access. [`Enhanced`] adds
//! running operations in-process. A backend that only implements
//! [`Backend`] can still be given operations by wrapping it in a
//! [`Local`](crate::Local) backend as its state delegate.

use crate::cancel::CancelToken;
use crate::error::{BackendError, ConfigError};
use crate::operation::Operation;
use crate::running::RunningOperation;
use async_trait::async_trait;
use std::fmt::Debug;
use std::sync::Arc;
use terrace_state::{InMemoryState, SharedStateHandle, State, StateError};

/// Untyped backend configuration block
pub type ResourceConfig = serde_json::Map<String, serde_json::Value>;

/// Configuration and state access
#[async_trait]
pub trait Backend: Send + Sync + Debug {
    /// Check a configuration block, returning warnings and errors
    fn validate(&self, config: &ResourceConfig) -> (Vec<String>, Vec<ConfigError>);

    /// Apply a configuration block
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the block does not fit the schema.
    fn configure(&self, config: &ResourceConfig) -> Result<(), ConfigError>;

    /// Handle to this backend's state, loaded and ready to read
    ///
    /// # Errors
    ///
    /// Returns [`StateError`] if the state cannot be loaded.
    async fn state(&self) -> Result<SharedStateHandle, StateError>;
}

/// Backends that run operations themselves
#[async_trait]
pub trait Enhanced: Backend {
    /// Start `op` in the background
    ///
    /// Returns as soon as the operation has been accepted. Only pre-flight
    /// problems are returned here; everything after that is recorded on the
    /// returned handle.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError`] if the operation cannot be started at all.
    async fn operation(&self, cancel: CancelToken, op: Operation) -> Result<RunningOperation, BackendError>;
}

/// Backend keeping state in memory only
///
/// Takes no configuration. Useful as a state delegate when nothing should
/// touch disk.
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    state: Arc<InMemoryState>,
}

impl InMemoryBackend {
    /// Empty backend
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend starting from `state`
    #[must_use]
    pub fn with_state(state: State) -> Self {
        Self {
            state: Arc::new(InMemoryState::with_state(state)),
        }
    }

    /// The underlying handle
    #[must_use]
    pub fn handle(&self) -> Arc<InMemoryState> {
        Arc::clone(&self.state)
    }
}

#[async_trait]
impl Backend for InMemoryBackend {
    fn validate(&self, config: &ResourceConfig) -> (Vec<String>, Vec<ConfigError>) {
        let errors = config.keys().map(|k| ConfigError::UnknownKey(k.clone())).collect();
        (Vec::new(), errors)
    }

    fn configure(&self, config: &ResourceConfig) -> Result<(), ConfigError> {
        match config.keys().next() {
            Some(key) => Err(ConfigError::UnknownKey(key.clone())),
            None => Ok(()),
        }
    }

    async fn state(&self) -> Result<SharedStateHandle, StateError> {
        let handle: SharedStateHandle = self.state.clone();
        Ok(handle)
    }
}
