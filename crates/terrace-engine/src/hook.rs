//! Engine hooks
//!
//! Hooks are passive observers the engine calls as it evaluates each
//! resource. Every method has a no-op default so observers only implement
//! the events they care about.

use crate::diff::{DiffAction, InstanceDiff};
use crate::error::EngineError;
use std::fmt::Debug;
use terrace_state::ResourceState;

/// Whether the engine should keep going after a hook call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HookAction {
    /// Carry on
    #[default]
    Continue,
    /// Stop walking as soon as possible
    Halt,
}

/// Observer of engine progress
pub trait Hook: Send + Sync + Debug {
    /// A resource's planned action has been computed
    fn post_diff(&self, _address: &str, _diff: &InstanceDiff) -> HookAction {
        HookAction::Continue
    }

    /// A resource is about to be changed
    fn pre_apply(&self, _address: &str, _diff: &InstanceDiff) -> HookAction {
        HookAction::Continue
    }

    /// A resource change finished, `error` is set if it failed
    fn post_apply(&self, _address: &str, _action: DiffAction, _error: Option<&EngineError>) -> HookAction {
        HookAction::Continue
    }

    /// A resource was re-read from its provider
    fn post_refresh(&self, _address: &str, _state: &ResourceState) -> HookAction {
        HookAction::Continue
    }
}
