//! Direct file-backed state handle

use crate::error::StateError;
use crate::handle::StateHandle;
use crate::snapshot::{State, STATE_VERSION};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// State handle reading one file and writing to the same or a distinct file
#[derive(Debug)]
pub struct LocalState {
    path: PathBuf,
    path_out: Option<PathBuf>,
    inner: Mutex<Snapshots>,
}

#[derive(Debug, Default)]
struct Snapshots {
    /// Working snapshot
    state: Option<State>,
    /// Snapshot as last read from disk, used to decide on serial bumps
    read_state: Option<State>,
}

impl LocalState {
    /// Handle over `path`, persisting back to the same file
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            path_out: None,
            inner: Mutex::new(Snapshots::default()),
        }
    }

    /// Persist to `path_out` instead of the input path
    #[must_use]
    pub fn with_output(mut self, path_out: impl Into<PathBuf>) -> Self {
        let path_out = path_out.into();
        if path_out != self.path {
            self.path_out = Some(path_out);
        }
        self
    }

    /// Input location
    #[inline]
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Location `persist` writes to
    #[inline]
    #[must_use]
    pub fn output_path(&self) -> &Path {
        self.path_out.as_deref().unwrap_or(&self.path)
    }
}

#[async_trait]
impl StateHandle for LocalState {
    async fn refresh(&self) -> Result<(), StateError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no state file, starting empty");
                let mut inner = self.inner.lock();
                inner.state = None;
                inner.read_state = None;
                return Ok(());
            }
            Err(e) => return Err(StateError::read(&self.path, e)),
        };

        let state = if bytes.iter().all(u8::is_ascii_whitespace) {
            None
        } else {
            let state = State::from_json(&bytes).map_err(|e| StateError::parse(&self.path, e))?;
            if state.version > STATE_VERSION {
                return Err(StateError::UnsupportedVersion {
                    path: self.path.clone(),
                    found: state.version,
                    supported: STATE_VERSION,
                });
            }
            Some(state)
        };

        debug!(
            path = %self.path.display(),
            serial = state.as_ref().map_or(0, |s| s.serial),
            "state loaded"
        );

        let mut inner = self.inner.lock();
        inner.read_state.clone_from(&state);
        inner.state = state;
        Ok(())
    }

    fn read(&self) -> Option<State> {
        self.inner.lock().state.clone()
    }

    async fn write(&self, state: &State) -> Result<(), StateError> {
        let mut inner = self.inner.lock();
        let mut next = state.clone();

        // Only bump the serial when the content actually moved on from disk
        if let Some(prev) = &inner.read_state {
            if !prev.same_content(&next) && next.serial <= prev.serial {
                next.serial = prev.serial.checked_add(1).ok_or_else(|| StateError::SerialExhausted {
                    path: self.path.clone(),
                })?;
            }
            // Lineage belongs to the stored state
            next.lineage.clone_from(&prev.lineage);
        }

        inner.state = Some(next);
        Ok(())
    }

    async fn persist(&self) -> Result<(), StateError> {
        let state = self.inner.lock().state.clone();
        let Some(state) = state else {
            return Ok(());
        };

        let target = self.output_path().to_path_buf();
        let bytes = state.to_json().map_err(StateError::Encode)?;
        write_atomic(&target, &bytes)
            .await
            .map_err(|e| StateError::write(&target, e))?;

        debug!(path = %target.display(), serial = state.serial, "state persisted");

        // Persisted content becomes the new baseline for serial bumps
        self.inner.lock().read_state = Some(state);
        Ok(())
    }
}

/// Write `bytes` next to `path` and rename over it
pub(crate) async fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    tokio::fs::write(&tmp, bytes).await?;
    tokio::fs::rename(&tmp, path).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::ResourceState;

    fn fixture() -> State {
        State::new().with_resource("test_instance.foo", ResourceState::new("test_instance", "bar"))
    }

    #[tokio::test]
    async fn missing_file_refreshes_to_none() {
        let dir = tempfile::tempdir().unwrap();
        let handle = LocalState::new(dir.path().join("none.tfstate"));
        handle.refresh().await.unwrap();
        assert!(handle.read().is_none());
    }

    #[tokio::test]
    async fn persist_goes_to_output_path() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.tfstate");
        let output = dir.path().join("out.tfstate");
        tokio::fs::write(&input, fixture().to_json().unwrap()).await.unwrap();

        let handle = LocalState::new(&input).with_output(&output);
        handle.refresh().await.unwrap();
        let mut next = handle.read().unwrap();
        next.resources.clear();
        handle.write(&next).await.unwrap();
        handle.persist().await.unwrap();

        let original = State::from_json(&tokio::fs::read(&input).await.unwrap()).unwrap();
        let written = State::from_json(&tokio::fs::read(&output).await.unwrap()).unwrap();
        assert_eq!(original.resources.len(), 1);
        assert!(written.resources.is_empty());
        assert_eq!(written.serial, original.serial + 1);
        assert_eq!(written.lineage, original.lineage);
    }

    #[tokio::test]
    async fn unchanged_write_keeps_serial() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("s.tfstate");
        tokio::fs::write(&path, fixture().to_json().unwrap()).await.unwrap();

        let handle = LocalState::new(&path);
        handle.refresh().await.unwrap();
        let same = handle.read().unwrap();
        handle.write(&same).await.unwrap();
        assert_eq!(handle.read().unwrap().serial, same.serial);
    }

    #[tokio::test]
    async fn garbage_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.tfstate");
        tokio::fs::write(&path, b"{ not json").await.unwrap();

        let err = LocalState::new(&path).refresh().await.unwrap_err();
        assert!(err.is_corrupt());
        assert_eq!(err.path(), Some(path.as_path()));
    }

    #[tokio::test]
    async fn newer_version_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("future.tfstate");
        let mut state = fixture();
        state.version = STATE_VERSION + 1;
        tokio::fs::write(&path, state.to_json().unwrap()).await.unwrap();

        let err = LocalState::new(&path).refresh().await.unwrap_err();
        assert!(matches!(err, StateError::UnsupportedVersion { .. }));
    }

    #[tokio::test]
    async fn exhausted_serial_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("old.tfstate");
        let mut state = fixture();
        state.serial = u64::MAX;
        tokio::fs::write(&path, state.to_json().unwrap()).await.unwrap();

        let handle = LocalState::new(&path);
        handle.refresh().await.unwrap();
        let mut next = handle.read().unwrap();
        next.resources.clear();

        let err = handle.write(&next).await.unwrap_err();
        assert!(matches!(err, StateError::SerialExhausted { .. }));
        assert_eq!(err.path(), Some(path.as_path()));
        assert_eq!(handle.read().unwrap().serial, u64::MAX);
    }

    #[tokio::test]
    async fn stored_lineage_survives_fresh_snapshots() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("s.tfstate");
        let stored = fixture();
        tokio::fs::write(&path, stored.to_json().unwrap()).await.unwrap();

        let handle = LocalState::new(&path);
        handle.refresh().await.unwrap();
        let fresh = State::new().with_resource("test_instance.foo", ResourceState::new("test_instance", "yes"));
        assert_ne!(fresh.lineage, stored.lineage);
        handle.write(&fresh).await.unwrap();
        handle.persist().await.unwrap();

        let written = State::from_json(&tokio::fs::read(&path).await.unwrap()).unwrap();
        assert_eq!(written.lineage, stored.lineage);
        assert_eq!(written.serial, stored.serial + 1);
    }
}
