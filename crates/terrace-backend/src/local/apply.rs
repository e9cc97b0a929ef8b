//! Apply handler
//!
//! Applies either a saved plan file or a plan computed on the spot. State
//! reported by the engine is written and persisted even when the apply
//! fails part way, so completed changes are never lost.

use super::context::operation_opts;
use super::{CountHook, Local};
use crate::cancel::CancelToken;
use crate::error::OperationError;
use crate::operation::Operation;
use crate::running::Completion;
use std::sync::Arc;
use terrace_engine::read_plan;
use terrace_state::{SharedStateHandle, State};
use tracing::{info, warn};

impl Local {
    pub(super) async fn op_apply(
        &self,
        op: &Operation,
        cancel: &CancelToken,
        run: &Completion,
    ) -> Result<(), OperationError> {
        let handle = self.load_state().await?;
        let current = handle.read();
        run.set_state(current.clone());

        let count_hook = Arc::new(CountHook::new());
        let _hooks = self.attach_hook(count_hook.clone());

        let mut engine = if let Some(path) = &op.plan_path {
            info!(path = %path.display(), "applying saved plan");
            let plan = read_plan(path).await.map_err(OperationError::PlanFileRead)?;
            let mut opts = plan.context_opts(&self.context_opts());
            if op.ui_in.is_some() {
                opts.ui_input.clone_from(&op.ui_in);
            }
            if op.ui_out.is_some() {
                opts.ui_output.clone_from(&op.ui_out);
            }
            self.build_context(&opts, cancel).await?
        } else {
            let opts = operation_opts(&self.context_opts(), op, current);
            let mut engine = self.build_context(&opts, cancel).await?;
            if op.plan_refresh {
                cancel.check()?;
                let refreshed = engine.refresh().await.map_err(OperationError::Refresh)?;
                run.set_state(Some(refreshed));
            }
            cancel.check()?;
            engine.plan().await.map_err(OperationError::Plan)?;
            engine
        };

        cancel.check()?;
        let (state, failure) = match engine.apply().await {
            Ok(state) => (Some(state), None),
            Err(partial) => {
                warn!(error = %partial.error, "apply failed, saving partial state");
                (partial.state, Some(partial.error))
            }
        };

        let saved = match &state {
            Some(state) => {
                run.set_state(Some(state.clone()));
                save_state(&handle, state).await
            }
            None => Ok(()),
        };
        match (failure, saved) {
            (None, Ok(())) => {}
            (None, Err(save)) => return Err(save),
            (Some(apply), Ok(())) => return Err(OperationError::Apply(apply)),
            (Some(apply), Err(save)) => {
                warn!(error = %save, "partial state could not be saved");
                return Err(OperationError::ApplyNotSaved {
                    apply,
                    save: Box::new(save),
                });
            }
        }

        let counts = count_hook.counts();
        info!(
            added = counts.added,
            changed = counts.changed,
            destroyed = counts.removed,
            "apply complete"
        );
        if let Some(cli) = &self.inner.cli {
            let message = if op.destroy {
                format!("[reset][bold][green]\nDestroy complete! Resources: {} destroyed.", counts.removed)
            } else {
                format!(
                    "[reset][bold][green]\nApply complete! Resources: {} added, {} changed, {} destroyed.",
                    counts.added, counts.changed, counts.removed
                )
            };
            cli.output(&self.inner.colorize.color(&message));
        }
        Ok(())
    }
}

async fn save_state(handle: &SharedStateHandle, state: &State) -> Result<(), OperationError> {
    handle.write(state).await.map_err(OperationError::StateWrite)?;
    handle.persist().await.map_err(OperationError::StatePersist)
}
