//! Local backend
//!
//! Runs operations in-process against a reconciliation engine. State is
//! either owned here (a file handle chain built from [`LocalConfig`]) or
//! owned entirely by a delegate [`Backend`].
//!
//! # Concurrency
//!
//! Each backend instance has one execution slot. `operation()` waits for
//! the slot, then spawns the handler onto the tokio runtime and returns.
//! The slot is held by the spawned task and released when it ends, however
//! it ends.

mod apply;
mod context;
mod count_hook;
mod plan;
mod refresh;

pub use count_hook::{CountHook, Counts};

use crate::backend::{Backend, Enhanced, ResourceConfig};
use crate::cancel::CancelToken;
use crate::config::LocalConfig;
use crate::error::{BackendError, ConfigError, OperationError};
use crate::operation::{Operation, OperationType};
use crate::running::{Completion, RunningOperation};
use crate::ui::{Cli, Colorize};
use async_trait::async_trait;
use futures::FutureExt;
use parking_lot::RwLock;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use terrace_engine::{ContextOpts, EngineFactory};
use terrace_state::{build_chain, ChainSpec, SharedStateHandle, StateError, StateLayer};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Who owns the state
#[derive(Debug, Clone)]
pub enum StateStorage {
    /// Files described by the local config
    Local,
    /// Another backend; no local handle chain is built
    Delegated(Arc<dyn Backend>),
}

/// In-process operation runner
#[derive(Clone)]
pub struct Local {
    inner: Arc<Inner>,
}

struct Inner {
    config: RwLock<LocalConfig>,
    storage: StateStorage,
    context_opts: RwLock<ContextOpts>,
    engine: Arc<dyn EngineFactory>,
    cli: Option<Arc<dyn Cli>>,
    colorize: Colorize,
    slot: Arc<Mutex<()>>,
}

impl fmt::Debug for Local {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Local")
            .field("config", &*self.inner.config.read())
            .field("storage", &self.inner.storage)
            .field("engine", &self.inner.engine)
            .finish_non_exhaustive()
    }
}

/// Builder for [`Local`]
#[derive(Debug)]
pub struct LocalBuilder {
    config: LocalConfig,
    storage: StateStorage,
    context_opts: ContextOpts,
    engine: Arc<dyn EngineFactory>,
    cli: Option<Arc<dyn Cli>>,
    colorize: Colorize,
}

impl LocalBuilder {
    /// Set the local config
    #[must_use]
    pub fn config(mut self, config: LocalConfig) -> Self {
        self.config = config;
        self
    }

    /// Hand state ownership to another backend
    #[must_use]
    pub fn delegate(mut self, backend: Arc<dyn Backend>) -> Self {
        self.storage = StateStorage::Delegated(backend);
        self
    }

    /// Set the base context options
    #[must_use]
    pub fn context_opts(mut self, opts: ContextOpts) -> Self {
        self.context_opts = opts;
        self
    }

    /// Report to `cli`
    #[must_use]
    pub fn cli(mut self, cli: Arc<dyn Cli>) -> Self {
        self.cli = Some(cli);
        self
    }

    /// Set the color translator used for reports
    #[must_use]
    pub fn colorize(mut self, colorize: Colorize) -> Self {
        self.colorize = colorize;
        self
    }

    /// Build the backend
    #[must_use]
    pub fn build(self) -> Local {
        Local {
            inner: Arc::new(Inner {
                config: RwLock::new(self.config),
                storage: self.storage,
                context_opts: RwLock::new(self.context_opts),
                engine: self.engine,
                cli: self.cli,
                colorize: self.colorize,
                slot: Arc::new(Mutex::new(())),
            }),
        }
    }
}

impl Local {
    /// Start building a backend that runs `engine`
    #[must_use]
    pub fn builder(engine: Arc<dyn EngineFactory>) -> LocalBuilder {
        LocalBuilder {
            config: LocalConfig::default(),
            storage: StateStorage::Local,
            context_opts: ContextOpts::default(),
            engine,
            cli: None,
            colorize: Colorize::default(),
        }
    }

    /// Current settings
    #[must_use]
    pub fn config(&self) -> LocalConfig {
        self.inner.config.read().clone()
    }

    /// Whether state is owned by a delegate backend
    #[inline]
    #[must_use]
    pub fn is_delegated(&self) -> bool {
        matches!(self.inner.storage, StateStorage::Delegated(_))
    }

    /// Copy of the base context options
    #[must_use]
    pub fn context_opts(&self) -> ContextOpts {
        self.inner.context_opts.read().clone()
    }

    fn supports(op_type: OperationType) -> bool {
        matches!(
            op_type,
            OperationType::Refresh | OperationType::Plan | OperationType::Apply
        )
    }

    fn preflight(op: &Operation) -> Result<(), BackendError> {
        if let Some(unsupported) = op.steps().into_iter().find(|t| !Self::supports(*t)) {
            return Err(BackendError::UnsupportedOperation(unsupported));
        }
        if op.plan_id.is_some() {
            return Err(BackendError::PlanIdUnsupported);
        }
        if op.plan_path.is_some() && op.module.is_some() {
            return Err(BackendError::PlanWithModule);
        }
        Ok(())
    }

    /// Load the state handle and re-read it
    async fn load_state(&self) -> Result<SharedStateHandle, OperationError> {
        let handle = self.state().await.map_err(OperationError::StateLoad)?;
        handle.refresh().await.map_err(OperationError::StateLoad)?;
        Ok(handle)
    }

    async fn run(&self, op: &Operation, cancel: &CancelToken, run: &Completion) -> Result<(), OperationError> {
        for step in op.steps() {
            debug!(step = %step, "operation step starting");
            match step {
                OperationType::Refresh => self.op_refresh(op, cancel, run).await?,
                OperationType::Plan => self.op_plan(op, cancel, run).await?,
                OperationType::Apply => self.op_apply(op, cancel, run).await?,
                // Rejected during preflight
                OperationType::Invalid => {}
            }
        }
        Ok(())
    }
}

#[async_trait]
impl Backend for Local {
    fn validate(&self, config: &ResourceConfig) -> (Vec<String>, Vec<ConfigError>) {
        match &self.inner.storage {
            StateStorage::Delegated(backend) => backend.validate(config),
            StateStorage::Local => (Vec::new(), LocalConfig::validate_block(config)),
        }
    }

    fn configure(&self, config: &ResourceConfig) -> Result<(), ConfigError> {
        match &self.inner.storage {
            StateStorage::Delegated(backend) => backend.configure(config),
            StateStorage::Local => self.inner.config.write().apply_block(config),
        }
    }

    async fn state(&self) -> Result<SharedStateHandle, StateError> {
        if let StateStorage::Delegated(backend) = &self.inner.storage {
            return backend.state().await;
        }

        let paths = self.inner.config.read().paths();
        let mut spec = ChainSpec::new(&paths.state).with_out_path(&paths.out);
        if let Some(backup) = paths.backup {
            spec = spec.with_layer(StateLayer::Backup { path: backup });
        }
        build_chain(&spec).await
    }
}

#[async_trait]
impl Enhanced for Local {
    async fn operation(&self, cancel: CancelToken, op: Operation) -> Result<RunningOperation, BackendError> {
        Self::preflight(&op)?;

        let slot = Arc::clone(&self.inner.slot).lock_owned().await;
        let (running, completion) = RunningOperation::start();
        let id = running.id();
        info!(operation = %id, steps = ?op.steps(), "operation started");

        let backend = self.clone();
        tokio::spawn(async move {
            // Dropped in reverse order: the slot is free before done fires
            let completion = completion;
            let _slot = slot;

            let result = AssertUnwindSafe(backend.run(&op, &cancel, &completion))
                .catch_unwind()
                .await;

            match result {
                Ok(Ok(())) => info!(operation = %id, "operation finished"),
                Ok(Err(err)) => {
                    warn!(operation = %id, kind = ?err.kind(), error = %err, "operation failed");
                    completion.fail(err);
                }
                Err(panic) => {
                    let message = panic
                        .downcast_ref::<&str>()
                        .map(|s| (*s).to_string())
                        .or_else(|| panic.downcast_ref::<String>().cloned())
                        .unwrap_or_else(|| "unknown panic".to_string());
                    warn!(operation = %id, panic = %message, "operation panicked");
                    completion.fail(OperationError::Panicked(message));
                }
            }
        });

        Ok(running)
    }
}
