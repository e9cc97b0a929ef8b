//! Probes recording what the core did and when

use async_trait::async_trait;
use parking_lot::Mutex;
use std::time::{Duration, Instant};
use terrace_engine::{DiffAction, EngineError, Hook, HookAction, InputOpts, InstanceDiff, UiInput, UiOutput};
use terrace_state::{InMemoryState, ResourceState, State, StateError, StateHandle};

/// In-memory state handle that times every refresh
#[derive(Debug)]
pub struct ProbeState {
    inner: InMemoryState,
    delay: Duration,
    spans: Mutex<Vec<(Instant, Instant)>>,
}

impl ProbeState {
    pub fn new(state: State, delay: Duration) -> Self {
        Self {
            inner: InMemoryState::with_state(state),
            delay,
            spans: Mutex::new(Vec::new()),
        }
    }

    /// Entry and exit time of each refresh
    pub fn spans(&self) -> Vec<(Instant, Instant)> {
        self.spans.lock().clone()
    }

    /// Whether any two refreshes were in flight at once
    pub fn overlapping(&self) -> bool {
        let mut spans = self.spans();
        spans.sort_by_key(|(start, _)| *start);
        spans.windows(2).any(|pair| pair[1].0 < pair[0].1)
    }

    pub fn persisted(&self) -> Option<State> {
        self.inner.persisted()
    }
}

#[async_trait]
impl StateHandle for ProbeState {
    async fn refresh(&self) -> Result<(), StateError> {
        let start = Instant::now();
        tokio::time::sleep(self.delay).await;
        let result = self.inner.refresh().await;
        self.spans.lock().push((start, Instant::now()));
        result
    }

    fn read(&self) -> Option<State> {
        self.inner.read()
    }

    async fn write(&self, state: &State) -> Result<(), StateError> {
        self.inner.write(state).await
    }

    async fn persist(&self) -> Result<(), StateError> {
        self.inner.persist().await
    }
}

/// Hook that logs every event as a line of text
#[derive(Debug, Default)]
pub struct RecordingHook {
    events: Mutex<Vec<String>>,
}

impl RecordingHook {
    pub fn events(&self) -> Vec<String> {
        self.events.lock().clone()
    }
}

impl Hook for RecordingHook {
    fn post_diff(&self, address: &str, diff: &InstanceDiff) -> HookAction {
        self.events.lock().push(format!("post_diff {address} {}", diff.action));
        HookAction::Continue
    }

    fn pre_apply(&self, address: &str, diff: &InstanceDiff) -> HookAction {
        self.events.lock().push(format!("pre_apply {address} {}", diff.action));
        HookAction::Continue
    }

    fn post_apply(&self, address: &str, action: DiffAction, error: Option<&EngineError>) -> HookAction {
        let outcome = if error.is_some() { "failed" } else { "ok" };
        self.events.lock().push(format!("post_apply {address} {action} {outcome}"));
        HookAction::Continue
    }

    fn post_refresh(&self, address: &str, state: &ResourceState) -> HookAction {
        self.events.lock().push(format!("post_refresh {address} {}", state.id()));
        HookAction::Continue
    }
}

/// Input source answering every question the same way, or failing
#[derive(Debug, Default)]
pub struct ScriptedInput {
    answer: Option<String>,
    asked: Mutex<Vec<String>>,
}

impl ScriptedInput {
    pub fn answering(answer: impl Into<String>) -> Self {
        Self {
            answer: Some(answer.into()),
            asked: Mutex::new(Vec::new()),
        }
    }

    /// Input whose channel is broken
    pub fn broken() -> Self {
        Self::default()
    }

    pub fn asked(&self) -> Vec<String> {
        self.asked.lock().clone()
    }
}

#[async_trait]
impl UiInput for ScriptedInput {
    async fn input(&self, opts: &InputOpts) -> Result<String, EngineError> {
        self.asked.lock().push(opts.id.clone());
        self.answer
            .clone()
            .ok_or_else(|| EngineError::Input("input channel closed".into()))
    }
}

/// Output sink keeping every message
#[derive(Debug, Default)]
pub struct RecordingOutput {
    messages: Mutex<Vec<String>>,
}

impl RecordingOutput {
    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().clone()
    }
}

impl UiOutput for RecordingOutput {
    fn output(&self, message: &str) {
        self.messages.lock().push(message.to_string());
    }
}
