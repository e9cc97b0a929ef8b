//! Plan artifacts and saved plan files
//!
//! A saved plan carries everything needed to rebuild the context it was
//! computed in, so that applying it later executes exactly that diff.

use crate::context::{ContextOpts, Variables};
use crate::diff::Diff;
use crate::error::PlanFileError;
use crate::module::ModuleTree;
use serde::{Deserialize, Serialize};
use std::path::Path;
use terrace_state::State;
use tracing::debug;

/// A computed, not-yet-applied set of changes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    /// Resource actions
    pub diff: Diff,
    /// Configuration the plan was computed from
    pub module: Option<ModuleTree>,
    /// State the plan was computed against
    pub state: Option<State>,
    /// Variable values in force
    #[serde(default)]
    pub variables: Variables,
    /// Targets in force
    #[serde(default)]
    pub targets: Vec<String>,
    /// Whether this is a destroy plan
    #[serde(default)]
    pub destroy: bool,
}

impl Plan {
    /// Plan with only a diff
    #[must_use]
    pub fn from_diff(diff: Diff) -> Self {
        Self {
            diff,
            ..Self::default()
        }
    }

    /// Options that rebuild the planning context on top of `base`
    ///
    /// Hooks and UI input/output stay as in `base`; everything the plan recorded
    /// replaces the base value.
    #[must_use]
    pub fn context_opts(&self, base: &ContextOpts) -> ContextOpts {
        ContextOpts {
            destroy: self.destroy,
            module: self.module.clone(),
            targets: self.targets.clone(),
            variables: self.variables.clone(),
            ui_input: base.ui_input.clone(),
            ui_output: base.ui_output.clone(),
            state: self.state.clone(),
            diff: Some(self.diff.clone()),
            hooks: base.hooks.clone(),
        }
    }
}

/// Write `plan` to `path`
///
/// # Errors
///
/// Returns [`PlanFileError`] if encoding or the write fails.
pub async fn write_plan(path: &Path, plan: &Plan) -> Result<(), PlanFileError> {
    let bytes = serde_json::to_vec_pretty(plan).map_err(PlanFileError::Encode)?;
    tokio::fs::write(path, bytes).await.map_err(|source| PlanFileError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), resources = plan.diff.resources.len(), "plan written");
    Ok(())
}

/// Read a plan previously saved with [`write_plan`]
///
/// # Errors
///
/// Returns [`PlanFileError`] if the file is missing or not a plan.
pub async fn read_plan(path: &Path) -> Result<Plan, PlanFileError> {
    let bytes = tokio::fs::read(path).await.map_err(|source| PlanFileError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_slice(&bytes).map_err(|source| PlanFileError::Decode {
        path: path.to_path_buf(),
        source,
    })
}
