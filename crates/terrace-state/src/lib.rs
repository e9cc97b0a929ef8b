//! Terrace State - persisted infrastructure state
//!
//! This crate provides the snapshot model and the handle contract every
//! operation uses to load, replace and durably commit state:
//! - [`State`]: the serializable snapshot
//! - [`StateHandle`]: refresh / read / write / persist
//! - [`LocalState`]: a direct file-backed handle
//! - [`BackupState`]: backup-before-overwrite decorator
//! - [`InMemoryState`]: a handle with no backing store

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod backup;
pub mod chain;
pub mod error;
pub mod handle;
pub mod inmem;
pub mod local;
pub mod snapshot;

pub use backup::BackupState;
pub use chain::{build_chain, ChainSpec, StateLayer};
pub use error::StateError;
pub use handle::{SharedStateHandle, StateHandle};
pub use inmem::InMemoryState;
pub use local::LocalState;
pub use snapshot::{InstanceState, OutputState, ResourceState, State, STATE_VERSION};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
