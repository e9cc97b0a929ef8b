//! The reconciliation engine contract
//!
//! An [`Engine`] is one context built from a [`ContextOpts`] bundle. The core
//! drives it through a fixed sequence of steps and never looks at how a
//! step is carried out.

use crate::context::ContextOpts;
use crate::error::EngineError;
use crate::input::InputMode;
use crate::plan::Plan;
use async_trait::async_trait;
use std::fmt::Debug;
use terrace_state::State;

/// Outcome of a validation pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Validation {
    /// Non-fatal findings
    pub warnings: Vec<String>,
    /// Fatal findings
    pub errors: Vec<EngineError>,
}

impl Validation {
    /// Whether validation found no errors (warnings are allowed)
    #[inline]
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// A failed apply together with whatever state the engine reached
#[derive(Debug, thiserror::Error)]
#[error("{error}")]
pub struct PartialApply {
    /// State after the resources that did get applied
    pub state: Option<State>,
    /// The failure
    #[source]
    pub error: EngineError,
}

/// One engine context
#[async_trait]
pub trait Engine: Send {
    /// Ask the user for the values selected by `mode`
    async fn input(&mut self, mode: InputMode) -> Result<(), EngineError>;

    /// Check the configuration for problems
    async fn validate(&mut self) -> Validation;

    /// Re-read every managed resource and return the resulting state
    async fn refresh(&mut self) -> Result<State, EngineError>;

    /// Compute the changes needed to reach the configuration
    async fn plan(&mut self) -> Result<Plan, EngineError>;

    /// Carry out the plan (or the saved diff the context was built with)
    async fn apply(&mut self) -> Result<State, PartialApply>;
}

/// Builds engine contexts
pub trait EngineFactory: Send + Sync + Debug {
    /// Construct a context from `opts`
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Context`] for options the engine cannot use
    /// (bad module, wrongly typed variables).
    fn new_context(&self, opts: &ContextOpts) -> Result<Box<dyn Engine>, EngineError>;
}
