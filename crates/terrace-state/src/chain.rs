//! Handle chain assembly
//!
//! A chain is a direct [`LocalState`] at the bottom, wrapped by an ordered
//! list of decorators. The list is fixed when the chain is built.

use crate::backup::BackupState;
use crate::error::StateError;
use crate::handle::{SharedStateHandle, StateHandle};
use crate::local::LocalState;
use std::path::PathBuf;
use std::sync::Arc;

/// A decorator applied on top of the direct handle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateLayer {
    /// Copy the pre-write snapshot to `path` once, before the first write
    Backup {
        /// Backup destination
        path: PathBuf,
    },
}

/// Where the direct handle reads and writes, plus its decorators
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainSpec {
    /// Input location
    pub path: PathBuf,
    /// Output location, `None` for the input location
    pub out_path: Option<PathBuf>,
    /// Decorators, innermost first
    pub layers: Vec<StateLayer>,
}

impl ChainSpec {
    /// Chain over a single file with no decorators
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            out_path: None,
            layers: Vec::new(),
        }
    }

    /// Persist to a distinct output file
    #[must_use]
    pub fn with_out_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.out_path = Some(path.into());
        self
    }

    /// Append a decorator
    #[must_use]
    pub fn with_layer(mut self, layer: StateLayer) -> Self {
        self.layers.push(layer);
        self
    }
}

/// Build the chain and load it
///
/// The direct handle is refreshed before any decorator is applied, so an
/// unreadable or malformed store fails here rather than in the first
/// operation that touches it.
///
/// # Errors
///
/// Returns the direct handle's refresh error.
pub async fn build_chain(spec: &ChainSpec) -> Result<SharedStateHandle, StateError> {
    let mut direct = LocalState::new(&spec.path);
    if let Some(out) = &spec.out_path {
        direct = direct.with_output(out);
    }
    direct.refresh().await?;

    let mut handle: SharedStateHandle = Arc::new(direct);
    for layer in &spec.layers {
        handle = match layer {
            StateLayer::Backup { path } => Arc::new(BackupState::new(handle, path)),
        };
    }
    Ok(handle)
}
