//! Session assembly for command front ends
//!
//! A [`Meta`] holds the settings a command collected (flags, environment,
//! UI handles) and turns them into a configured [`Local`] backend and a
//! pre-filled [`Operation`].

use crate::config::{input_enabled_from_env, LocalConfig};
use crate::local::Local;
use crate::operation::Operation;
use crate::ui::{Cli, Colorize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use terrace_engine::{ContextOpts, EngineFactory, ModuleError, ModuleLoader, ModuleTree, UiInput, UiOutput};
use tracing::debug;

/// Session-level failures
#[derive(Debug, thiserror::Error)]
pub enum MetaError {
    /// Configuration could not be loaded
    #[error("Error loading modules: {0}")]
    Module(#[from] ModuleError),
}

/// Settings for one command session
#[derive(Debug, Clone, Default)]
pub struct Meta {
    /// `-state`
    pub state_path: PathBuf,
    /// `-state-out`
    pub state_out_path: PathBuf,
    /// `-backup`
    pub backup_path: PathBuf,
    /// Whether the user allowed input
    pub input: bool,
    /// `-target` values
    pub targets: Vec<String>,
    /// Interactive input
    pub ui_input: Option<Arc<dyn UiInput>>,
    /// Sink for engine messages
    pub ui_output: Option<Arc<dyn UiOutput>>,
    /// Base engine options (variables, hooks)
    pub context_opts: ContextOpts,
    /// Output sink
    pub cli: Option<Arc<dyn Cli>>,
    /// Disable colors
    pub no_color: bool,
}

impl Meta {
    /// Empty session
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Local backend configuration for this session, defaults applied
    #[must_use]
    pub fn local_config(&self) -> LocalConfig {
        let config = LocalConfig::new()
            .with_state_path(&self.state_path)
            .with_state_out_path(&self.state_out_path)
            .with_backup_path(&self.backup_path);
        let paths = config.paths();

        LocalConfig {
            state_path: paths.state,
            state_out_path: paths.out,
            state_backup_path: paths.backup.unwrap_or_else(|| PathBuf::from(crate::config::BACKUP_DISABLED)),
            input: input_enabled_from_env(self.input),
            validation: true,
        }
    }

    /// Color translator for this session
    #[must_use]
    pub fn colorize(&self) -> Colorize {
        if self.no_color {
            Colorize::plain()
        } else {
            Colorize::default()
        }
    }

    /// Backend for this session
    ///
    /// Builds a new backend on every call; reuse the result.
    #[must_use]
    pub fn backend(&self, engine: Arc<dyn EngineFactory>) -> Local {
        let config = self.local_config();
        debug!(state = %config.state_path.display(), input = config.input, "session backend configured");

        let mut builder = Local::builder(engine)
            .config(config)
            .context_opts(self.context_opts.clone())
            .colorize(self.colorize());
        if let Some(cli) = &self.cli {
            builder = builder.cli(Arc::clone(cli));
        }
        builder.build()
    }

    /// Operation pre-filled with the session's targets and input
    #[must_use]
    pub fn operation(&self) -> Operation {
        Operation {
            targets: self.targets.clone(),
            ui_in: self.ui_input.clone(),
            ui_out: self.ui_output.clone(),
            ..Operation::default()
        }
    }

    /// Load the configuration rooted at `path`
    ///
    /// # Errors
    ///
    /// Returns [`MetaError::Module`] if the loader fails.
    pub async fn module(&self, loader: &dyn ModuleLoader, path: &Path) -> Result<ModuleTree, MetaError> {
        Ok(loader.load(path).await?)
    }
}
