//! Backup-before-overwrite decorator

use crate::error::StateError;
use crate::handle::{SharedStateHandle, StateHandle};
use crate::local::write_atomic;
use crate::snapshot::State;
use async_trait::async_trait;
use std::fmt;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::debug;

/// Wraps a real handle and copies its pre-write snapshot to a backup
/// location exactly once, before the first write or persist reaches it.
pub struct BackupState {
    real: SharedStateHandle,
    path: PathBuf,
    done: Mutex<bool>,
}

impl BackupState {
    /// Wrap `real`, backing up to `path`
    pub fn new(real: SharedStateHandle, path: impl Into<PathBuf>) -> Self {
        Self {
            real,
            path: path.into(),
            done: Mutex::new(false),
        }
    }

    /// Backup location
    #[inline]
    #[must_use]
    pub fn backup_path(&self) -> &Path {
        &self.path
    }

    async fn ensure_backup(&self) -> Result<(), StateError> {
        let mut done = self.done.lock().await;
        if *done {
            return Ok(());
        }

        if let Some(previous) = self.real.read() {
            let bytes = previous.to_json().map_err(StateError::Encode)?;
            write_atomic(&self.path, &bytes)
                .await
                .map_err(|e| StateError::backup(&self.path, e))?;
            debug!(path = %self.path.display(), serial = previous.serial, "state backup written");
        }

        *done = true;
        Ok(())
    }
}

impl fmt::Debug for BackupState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackupState")
            .field("real", &self.real)
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl StateHandle for BackupState {
    async fn refresh(&self) -> Result<(), StateError> {
        self.real.refresh().await
    }

    fn read(&self) -> Option<State> {
        self.real.read()
    }

    async fn write(&self, state: &State) -> Result<(), StateError> {
        self.ensure_backup().await?;
        self.real.write(state).await
    }

    async fn persist(&self) -> Result<(), StateError> {
        self.ensure_backup().await?;
        self.real.persist().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::local::LocalState;
    use crate::snapshot::ResourceState;
    use std::sync::Arc;

    #[tokio::test]
    async fn backup_holds_previous_state() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("s.tfstate");
        let backup = dir.path().join("s.tfstate.backup");
        let before = State::new().with_resource("test_instance.foo", ResourceState::new("test_instance", "bar"));
        tokio::fs::write(&path, before.to_json().unwrap()).await.unwrap();

        let real = Arc::new(LocalState::new(&path));
        real.refresh().await.unwrap();
        let handle = BackupState::new(real, &backup);

        let after = State::new().with_resource("test_instance.foo", ResourceState::new("test_instance", "yes"));
        handle.write(&after).await.unwrap();
        handle.persist().await.unwrap();

        let saved = State::from_json(&tokio::fs::read(&backup).await.unwrap()).unwrap();
        let primary = State::from_json(&tokio::fs::read(&path).await.unwrap()).unwrap();
        assert_eq!(saved.resources["test_instance.foo"].id(), "bar");
        assert_eq!(primary.resources["test_instance.foo"].id(), "yes");
    }

    #[tokio::test]
    async fn backup_is_taken_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("s.tfstate");
        let backup = dir.path().join("b");
        tokio::fs::write(&path, State::new().with_resource("a.b", ResourceState::new("a", "1")).to_json().unwrap())
            .await
            .unwrap();

        let real = Arc::new(LocalState::new(&path));
        real.refresh().await.unwrap();
        let handle = BackupState::new(real, &backup);

        for id in ["2", "3"] {
            let next = State::new().with_resource("a.b", ResourceState::new("a", id));
            handle.write(&next).await.unwrap();
            handle.persist().await.unwrap();
        }

        let saved = State::from_json(&tokio::fs::read(&backup).await.unwrap()).unwrap();
        assert_eq!(saved.resources["a.b"].id(), "1");
    }

    #[tokio::test]
    async fn nothing_to_back_up_writes_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let backup = dir.path().join("b");
        let real = Arc::new(LocalState::new(dir.path().join("new.tfstate")));
        real.refresh().await.unwrap();

        let handle = BackupState::new(real, &backup);
        handle.write(&State::new()).await.unwrap();
        handle.persist().await.unwrap();
        assert!(!backup.exists());
    }
}
