//! The state handle contract
//!
//! A handle owns one in-memory snapshot and knows how to reload it from,
//! and durably commit it to, some backing store. `write` only touches memory;
//! nothing is durable until `persist` returns.

use crate::error::StateError;
use crate::snapshot::State;
use async_trait::async_trait;
use std::fmt::Debug;
use std::sync::Arc;

/// Access to a persisted infrastructure state
#[async_trait]
pub trait StateHandle: Send + Sync + Debug {
    /// Re-read the snapshot from the backing store
    ///
    /// # Errors
    ///
    /// Returns an error if the store exists but cannot be read or decoded.
    async fn refresh(&self) -> Result<(), StateError>;

    /// Current in-memory snapshot, `None` if nothing has been loaded or written
    fn read(&self) -> Option<State>;

    /// Replace the in-memory snapshot
    ///
    /// # Errors
    ///
    /// Decorators may perform I/O here (e.g. taking a backup first).
    async fn write(&self, state: &State) -> Result<(), StateError>;

    /// Durably commit the in-memory snapshot
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store rejects the write.
    async fn persist(&self) -> Result<(), StateError>;
}

/// Shared, type-erased handle as passed between backends and handlers
pub type SharedStateHandle = Arc<dyn StateHandle>;
