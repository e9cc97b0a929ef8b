//! Options an engine context is built from

use crate::diff::Diff;
use crate::hook::Hook;
use crate::input::{UiInput, UiOutput};
use crate::module::ModuleTree;
use std::collections::BTreeMap;
use std::sync::Arc;
use terrace_state::State;

/// Input variables by name
pub type Variables = BTreeMap<String, serde_json::Value>;

/// Everything needed to construct one engine context
#[derive(Debug, Clone, Default)]
pub struct ContextOpts {
    /// Compute a destroy plan
    pub destroy: bool,
    /// Configuration to reconcile against
    pub module: Option<ModuleTree>,
    /// Restrict to these resource addresses, empty for all
    pub targets: Vec<String>,
    /// Variable values
    pub variables: Variables,
    /// Interactive input, `None` when non-interactive
    pub ui_input: Option<Arc<dyn UiInput>>,
    /// Where engine messages go, `None` to drop them
    pub ui_output: Option<Arc<dyn UiOutput>>,
    /// Prior state
    pub state: Option<State>,
    /// Precomputed diff, set when applying a saved plan
    pub diff: Option<Diff>,
    /// Observers, called in order
    pub hooks: Vec<Arc<dyn Hook>>,
}

impl ContextOpts {
    /// Empty options
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a variable (builder style)
    #[must_use]
    pub fn with_variable(mut self, name: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.variables.insert(name.into(), value.into());
        self
    }

    /// Append a hook (builder style)
    #[must_use]
    pub fn with_hook(mut self, hook: Arc<dyn Hook>) -> Self {
        self.hooks.push(hook);
        self
    }

    /// Overlay `overrides` onto the current variables
    ///
    /// Same-named variables take the override's value; the rest are kept.
    pub fn merge_variables(&mut self, overrides: &Variables) {
        for (name, value) in overrides {
            self.variables.insert(name.clone(), value.clone());
        }
    }
}
