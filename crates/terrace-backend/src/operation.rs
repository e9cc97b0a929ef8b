//! Operation descriptors
//!
//! An [`Operation`] describes one unit of requested work. It is handed to
//! [`Enhanced::operation`](crate::Enhanced::operation) by value and never
//! changed afterwards.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use terrace_engine::{ModuleTree, UiInput, UiOutput, Variables};

/// Kind of work an operation performs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationType {
    /// Unset; no backend accepts it
    #[default]
    Invalid,
    /// Re-read real resources into state
    Refresh,
    /// Compute the changes needed
    Plan,
    /// Carry out changes
    Apply,
}

impl fmt::Display for OperationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Invalid => "invalid",
            Self::Refresh => "refresh",
            Self::Plan => "plan",
            Self::Apply => "apply",
        })
    }
}

/// One requested unit of work
#[derive(Debug, Clone, Default)]
pub struct Operation {
    /// Handler to run
    pub op_type: OperationType,
    /// Run these types in order instead of `op_type`
    pub sequence: Vec<OperationType>,
    /// Reference to a previously computed plan held by the backend
    pub plan_id: Option<String>,
    /// Saved plan file to apply
    pub plan_path: Option<PathBuf>,
    /// Where to save the computed plan
    pub plan_out_path: Option<PathBuf>,
    /// Refresh before planning
    pub plan_refresh: bool,
    /// Configuration to reconcile against
    pub module: Option<ModuleTree>,
    /// Compute a destroy plan
    pub destroy: bool,
    /// Restrict to these addresses, empty for all
    pub targets: Vec<String>,
    /// Overrides for same-named base variables
    pub variables: Option<Variables>,
    /// Interactive input
    pub ui_in: Option<Arc<dyn UiInput>>,
    /// Engine-originated messages
    pub ui_out: Option<Arc<dyn UiOutput>>,
}

impl Operation {
    /// Operation of the given type with everything else unset
    #[must_use]
    pub fn new(op_type: OperationType) -> Self {
        Self {
            op_type,
            ..Self::default()
        }
    }

    /// Chain several types under one run
    #[must_use]
    pub fn sequence(steps: impl IntoIterator<Item = OperationType>) -> Self {
        Self {
            sequence: steps.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Set the configuration module
    #[must_use]
    pub fn with_module(mut self, module: ModuleTree) -> Self {
        self.module = Some(module);
        self
    }

    /// Set variable overrides
    #[must_use]
    pub fn with_variables(mut self, variables: Variables) -> Self {
        self.variables = Some(variables);
        self
    }

    /// Set the plan output path
    #[must_use]
    pub fn with_plan_out(mut self, path: impl Into<PathBuf>) -> Self {
        self.plan_out_path = Some(path.into());
        self
    }

    /// Set the saved plan to apply
    #[must_use]
    pub fn with_plan_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.plan_path = Some(path.into());
        self
    }

    /// Set interactive input
    #[must_use]
    pub fn with_ui_input(mut self, ui: Arc<dyn UiInput>) -> Self {
        self.ui_in = Some(ui);
        self
    }

    /// Set the sink for engine messages
    #[must_use]
    pub fn with_ui_output(mut self, ui: Arc<dyn UiOutput>) -> Self {
        self.ui_out = Some(ui);
        self
    }

    /// Types to run, in order
    #[must_use]
    pub fn steps(&self) -> Vec<OperationType> {
        if self.sequence.is_empty() {
            vec![self.op_type]
        } else {
            self.sequence.clone()
        }
    }
}
