//! Refresh handler

use super::context::operation_opts;
use super::Local;
use crate::cancel::CancelToken;
use crate::error::OperationError;
use crate::operation::Operation;
use crate::running::Completion;
use std::io;
use tracing::{debug, info};

impl Local {
    pub(super) async fn op_refresh(
        &self,
        op: &Operation,
        cancel: &CancelToken,
        run: &Completion,
    ) -> Result<(), OperationError> {
        // Refreshing needs existing state, unless someone else owns it
        if !self.is_delegated() {
            let path = self.inner.config.read().paths().state;
            if let Err(source) = tokio::fs::metadata(&path).await {
                return Err(if source.kind() == io::ErrorKind::NotFound {
                    OperationError::NotProvisioned { path }
                } else {
                    OperationError::StateUnreadable { path, source }
                });
            }
        }

        let handle = self.load_state().await?;
        let current = handle.read();
        run.set_state(current.clone());

        let opts = operation_opts(&self.context_opts(), op, current);
        let mut engine = self.build_context(&opts, cancel).await?;

        cancel.check()?;
        let state = engine.refresh().await.map_err(OperationError::Refresh)?;
        run.set_state(Some(state.clone()));
        debug!(resources = state.resources.len(), "refresh complete");

        handle.write(&state).await.map_err(OperationError::StateWrite)?;
        handle.persist().await.map_err(OperationError::StatePersist)?;
        info!(serial = handle.read().map_or(0, |s| s.serial), "refreshed state saved");
        Ok(())
    }
}
