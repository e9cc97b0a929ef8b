//! Plan handler

use super::context::operation_opts;
use super::{CountHook, Counts, Local};
use crate::cancel::CancelToken;
use crate::error::OperationError;
use crate::operation::Operation;
use crate::running::Completion;
use crate::ui::{format_plan, plan_header, plan_summary, NO_CHANGES};
use std::sync::Arc;
use terrace_engine::{write_plan, Plan};
use tracing::info;
use ulid::Ulid;

impl Local {
    pub(super) async fn op_plan(
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

        let opts = operation_opts(&self.context_opts(), op, current);
        let mut engine = self.build_context(&opts, cancel).await?;

        if op.plan_refresh {
            cancel.check()?;
            let refreshed = engine.refresh().await.map_err(OperationError::Refresh)?;
            run.set_state(Some(refreshed));
        }

        cancel.check()?;
        let plan = engine.plan().await.map_err(OperationError::Plan)?;

        if let Some(path) = &op.plan_out_path {
            info!(path = %path.display(), "writing plan output");
            write_plan(path, &plan).await.map_err(OperationError::PlanFileWrite)?;
        }

        let plan_id = Ulid::new();
        run.set_plan_id(plan_id);
        info!(plan_id = %plan_id, resources = plan.diff.resources.len(), "plan computed");

        self.report_plan(op, &plan, count_hook.counts());
        Ok(())
    }

    fn report_plan(&self, op: &Operation, plan: &Plan, counts: Counts) {
        let Some(cli) = &self.inner.cli else {
            return;
        };
        let color = &self.inner.colorize;

        if plan.diff.is_empty() {
            cli.output(NO_CHANGES);
        }
        cli.output(&plan_header(op.plan_out_path.as_deref()));
        cli.output(&format_plan(plan, color));
        cli.output(&color.color(&plan_summary(
            counts.plan_add(),
            counts.plan_change(),
            counts.plan_destroy(),
        )));
    }
}
