//! Execution context assembly

use super::Local;
use crate::cancel::CancelToken;
use crate::error::{OperationError, ValidationErrors};
use crate::operation::Operation;
use parking_lot::RwLock;
use std::sync::Arc;
use terrace_engine::{ContextOpts, Engine, Hook, InputMode};
use terrace_state::State;
use tracing::{debug, warn};

/// Base options with the operation's overrides and `state` applied
///
/// The base is copied, never changed. Variables are merged: the
/// operation's values win for the names it sets, base values stay for the
/// rest.
pub(crate) fn operation_opts(base: &ContextOpts, op: &Operation, state: Option<State>) -> ContextOpts {
    let mut opts = base.clone();
    opts.destroy = op.destroy;
    opts.module.clone_from(&op.module);
    opts.targets.clone_from(&op.targets);
    opts.ui_input.clone_from(&op.ui_in);
    if op.ui_out.is_some() {
        opts.ui_output.clone_from(&op.ui_out);
    }
    if let Some(variables) = &op.variables {
        opts.merge_variables(variables);
    }
    opts.state = state;
    opts
}

/// Adds a hook to the base options until dropped, then puts the previous
/// hook list back
pub(crate) struct HookAttachment<'a> {
    opts: &'a RwLock<ContextOpts>,
    previous: Vec<Arc<dyn Hook>>,
}

impl<'a> HookAttachment<'a> {
    pub(crate) fn attach(opts: &'a RwLock<ContextOpts>, hook: Arc<dyn Hook>) -> Self {
        let mut guard = opts.write();
        let previous = guard.hooks.clone();
        guard.hooks.push(hook);
        Self { opts, previous }
    }
}

impl Drop for HookAttachment<'_> {
    fn drop(&mut self) {
        self.opts.write().hooks = std::mem::take(&mut self.previous);
    }
}

impl Local {
    /// Attach `hook` to the base options for the life of the guard
    pub(crate) fn attach_hook(&self, hook: Arc<dyn Hook>) -> HookAttachment<'_> {
        HookAttachment::attach(&self.inner.context_opts, hook)
    }

    /// Construct the engine, then ask for input and validate as configured
    pub(crate) async fn build_context(
        &self,
        opts: &ContextOpts,
        cancel: &CancelToken,
    ) -> Result<Box<dyn Engine>, OperationError> {
        let mut engine = self.inner.engine.new_context(opts).map_err(OperationError::Context)?;
        let (input, validation) = {
            let config = self.inner.config.read();
            (config.input, config.validation)
        };

        if input {
            cancel.check()?;
            let mode = InputMode::PROVIDER | InputMode::VAR | InputMode::VAR_UNSET;
            engine.input(mode).await.map_err(OperationError::Input)?;
        }

        if validation {
            cancel.check()?;
            let result = engine.validate().await;
            // Warnings reach users through hooks, not the error path
            for warning in &result.warnings {
                debug!(warning = %warning, "validation warning");
            }
            if !result.errors.is_empty() {
                warn!(count = result.errors.len(), "validation failed");
                return Err(OperationError::Validation(ValidationErrors::new(result.errors)));
            }
        }

        Ok(engine)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;
    use terrace_engine::{ModuleTree, UiOutput, Variables};
    use terrace_test_utils::{RecordingHook, RecordingOutput};

    fn vars(pairs: &[(&str, i64)]) -> Variables {
        pairs.iter().map(|(k, v)| ((*k).to_string(), json!(v))).collect()
    }

    #[test]
    fn overrides_apply_without_touching_base() {
        let base = ContextOpts::new().with_variable("a", 1).with_variable("b", 2);
        let mut op = Operation::default()
            .with_module(ModuleTree::new("root"))
            .with_variables(vars(&[("b", 20), ("c", 30)]));
        op.destroy = true;
        op.targets = vec!["x.y".into()];

        let opts = operation_opts(&base, &op, Some(State::new()));
        assert!(opts.destroy);
        assert_eq!(opts.targets, vec!["x.y".to_string()]);
        assert_eq!(opts.variables, vars(&[("a", 1), ("b", 20), ("c", 30)]));
        assert!(opts.state.is_some());
        assert_eq!(base.variables, vars(&[("a", 1), ("b", 2)]));
        assert!(!base.destroy);
    }

    #[test]
    fn operation_output_reaches_the_engine() {
        let base_out: Arc<dyn UiOutput> = Arc::new(RecordingOutput::default());
        let base = ContextOpts {
            ui_output: Some(base_out),
            ..ContextOpts::new()
        };
        assert!(operation_opts(&base, &Operation::default(), None).ui_output.is_some());

        let out = Arc::new(RecordingOutput::default());
        let op = Operation::default().with_ui_output(out.clone());
        let opts = operation_opts(&ContextOpts::new(), &op, None);
        opts.ui_output.unwrap().output("hello");
        assert_eq!(out.messages(), vec!["hello".to_string()]);
    }

    #[test]
    fn absent_overrides_keep_base_variables() {
        let base = ContextOpts::new().with_variable("a", 1);
        let opts = operation_opts(&base, &Operation::default(), None);
        assert_eq!(opts.variables, base.variables);
    }

    #[test]
    fn hook_attachment_restores_on_drop() {
        let existing: Arc<dyn Hook> = Arc::new(RecordingHook::default());
        let opts = RwLock::new(ContextOpts::new().with_hook(existing));
        {
            let _guard = HookAttachment::attach(&opts, Arc::new(RecordingHook::default()));
            assert_eq!(opts.read().hooks.len(), 2);
        }
        assert_eq!(opts.read().hooks.len(), 1);
    }

    proptest! {
        #[test]
        fn prop_merge_prefers_operation_values(
            base in proptest::collection::btree_map("[a-e]", 0i64..100, 0..5),
            overrides in proptest::collection::btree_map("[a-e]", 100i64..200, 0..5),
        ) {
            let mut base_opts = ContextOpts::new();
            for (k, v) in &base {
                base_opts = base_opts.with_variable(k.clone(), *v);
            }
            let op = Operation::default().with_variables(
                overrides.iter().map(|(k, v)| (k.clone(), json!(v))).collect(),
            );

            let merged = operation_opts(&base_opts, &op, None).variables;
            for (k, v) in &overrides {
                prop_assert_eq!(&merged[k], &json!(v));
            }
            for (k, v) in &base {
                if !overrides.contains_key(k) {
                    prop_assert_eq!(&merged[k], &json!(v));
                }
            }
            prop_assert!(merged.keys().all(|k| base.contains_key(k) || overrides.contains_key(k)));
        }
    }
}
