//! In-memory state handle

use crate::error::StateError;
use crate::handle::StateHandle;
use crate::snapshot::State;
use async_trait::async_trait;
use parking_lot::Mutex;

/// A handle with no backing store; `persist` just records a committed copy
#[derive(Debug, Default)]
pub struct InMemoryState {
    inner: Mutex<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    state: Option<State>,
    persisted: Option<State>,
    persist_count: usize,
}

impl InMemoryState {
    /// Empty handle
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle already holding `state` as both working and committed copy
    #[must_use]
    pub fn with_state(state: State) -> Self {
        Self {
            inner: Mutex::new(Inner {
                state: Some(state.clone()),
                persisted: Some(state),
                persist_count: 0,
            }),
        }
    }

    /// Last committed snapshot
    #[must_use]
    pub fn persisted(&self) -> Option<State> {
        self.inner.lock().persisted.clone()
    }

    /// Number of `persist` calls so far
    #[must_use]
    pub fn persist_count(&self) -> usize {
        self.inner.lock().persist_count
    }
}

#[async_trait]
impl StateHandle for InMemoryState {
    async fn refresh(&self) -> Result<(), StateError> {
        let inner = &mut *self.inner.lock();
        inner.state.clone_from(&inner.persisted);
        Ok(())
    }

    fn read(&self) -> Option<State> {
        self.inner.lock().state.clone()
    }

    async fn write(&self, state: &State) -> Result<(), StateError> {
        self.inner.lock().state = Some(state.clone());
        Ok(())
    }

    async fn persist(&self) -> Result<(), StateError> {
        let inner = &mut *self.inner.lock();
        inner.persisted.clone_from(&inner.state);
        inner.persist_count += 1;
        Ok(())
    }
}
