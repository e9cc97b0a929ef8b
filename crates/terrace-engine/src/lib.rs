//! Terrace Engine - the reconciliation engine contract
//!
//! The core never computes or applies diffs itself. It builds a context
//! through an [`EngineFactory`] and drives the resulting [`Engine`] through
//! input, validate, refresh, plan and apply. This crate holds that contract
//! and the values that cross it:
//! - [`ContextOpts`]: options a context is built from
//! - [`Hook`]: passive observers of engine progress
//! - [`Diff`] / [`Plan`]: computed changes and the saved plan format
//! - [`ModuleTree`] / [`ModuleLoader`]: opaque configuration handles

#![warn(unreachable_pub)]

pub mod context;
pub mod diff;
pub mod engine;
pub mod error;
pub mod hook;
pub mod input;
pub mod module;
pub mod plan;

pub use context::{ContextOpts, Variables};
pub use diff::{AttributeDiff, Diff, DiffAction, InstanceDiff};
pub use engine::{Engine, EngineFactory, PartialApply, Validation};
pub use error::{EngineError, ModuleError, PlanFileError};
pub use hook::{Hook, HookAction};
pub use input::{InputMode, InputOpts, UiInput, UiOutput};
pub use module::{DirModuleLoader, ModuleLoader, ModuleTree};
pub use plan::{read_plan, write_plan, Plan};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
