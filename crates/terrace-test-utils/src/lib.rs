//! Testing utilities for Terrace workspace
//!
//! Shared test helpers, fixtures, and assertions.

#![allow(missing_docs)]

mod mock_engine;
mod probe;

pub use mock_engine::{Call, EngineScript, MockEngine, MockEngineFactory};
pub use probe::{ProbeState, RecordingHook, RecordingOutput, ScriptedInput};

use pretty_assertions::assert_eq;
use std::path::Path;
use terrace_engine::{Diff, DiffAction, InstanceDiff};
use terrace_state::{ResourceState, State};

pub fn create_test_state_with_id(id: &str) -> State {
    State::new().with_resource("test_instance.foo", ResourceState::new("test_instance", id))
}

/// One `test_instance.foo` with ID `bar`
pub fn create_test_state() -> State {
    create_test_state_with_id("bar")
}

/// What the provider reports for [`create_test_state`] after a refresh
pub fn create_refreshed_state() -> State {
    create_test_state_with_id("yes")
}

/// 2 creates, 1 update, 1 destroy, 1 replace
pub fn create_mixed_diff() -> Diff {
    Diff::new()
        .with("test_instance.a", InstanceDiff::new(DiffAction::Create).with_attribute("ami", "", "a"))
        .with("test_instance.b", InstanceDiff::new(DiffAction::Create).with_attribute("ami", "", "b"))
        .with("test_instance.c", InstanceDiff::new(DiffAction::Update).with_attribute("size", "1", "2"))
        .with("test_instance.d", InstanceDiff::new(DiffAction::Destroy))
        .with("test_instance.e", InstanceDiff::new(DiffAction::Replace).with_attribute("ami", "x", "y"))
}

pub async fn write_state_file(path: &Path, state: &State) {
    tokio::fs::write(path, state.to_json().unwrap()).await.unwrap();
}

pub async fn read_state_file(path: &Path) -> State {
    State::from_json(&tokio::fs::read(path).await.unwrap()).unwrap()
}

/// Compare the rendered state stored at `path` with `expected`
pub async fn assert_state_file(path: &Path, expected: &str) {
    let state = read_state_file(path).await;
    assert_eq!(state.to_string().trim(), expected.trim());
}
