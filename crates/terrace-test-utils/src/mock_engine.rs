//! Scriptable engine
//!
//! Every call made on a context built by [`MockEngineFactory`] is recorded,
//! and what each call returns is taken from an [`EngineScript`].

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use terrace_engine::{
    ContextOpts, Diff, DiffAction, Engine, EngineError, EngineFactory, HookAction, InputMode, InputOpts,
    PartialApply, Plan, Validation,
};
use terrace_state::{ResourceState, State};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    NewContext,
    Input(InputMode),
    Validate,
    Refresh,
    Plan,
    Apply,
}

#[derive(Debug, Clone, Default)]
pub struct EngineScript {
    pub context_error: Option<EngineError>,
    pub input_error: Option<EngineError>,
    pub validation: Validation,
    /// `None` returns the context's state unchanged
    pub refresh: Option<Result<State, EngineError>>,
    pub plan_diff: Diff,
    pub plan_error: Option<EngineError>,
    pub panic_on_plan: bool,
    /// `None` derives the result from the diff
    pub apply_state: Option<State>,
    pub apply_error: Option<EngineError>,
    /// Sleep this long inside refresh, plan and apply
    pub delay: Option<Duration>,
}

#[derive(Debug, Default)]
pub struct MockEngineFactory {
    script: Mutex<EngineScript>,
    calls: Arc<Mutex<Vec<Call>>>,
    contexts: Mutex<Vec<ContextOpts>>,
}

impl MockEngineFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_script(script: EngineScript) -> Self {
        Self {
            script: Mutex::new(script),
            ..Self::default()
        }
    }

    pub fn script(&self, update: impl FnOnce(&mut EngineScript)) {
        update(&mut self.script.lock());
    }

    pub fn refresh_to(self, state: State) -> Self {
        self.script(|s| s.refresh = Some(Ok(state)));
        self
    }

    pub fn plan_diff(self, diff: Diff) -> Self {
        self.script(|s| s.plan_diff = diff);
        self
    }

    pub fn validation_errors(self, errors: Vec<EngineError>) -> Self {
        self.script(|s| s.validation.errors = errors);
        self
    }

    pub fn delay(self, delay: Duration) -> Self {
        self.script(|s| s.delay = Some(delay));
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    pub fn count(&self, call: &Call) -> usize {
        self.calls.lock().iter().filter(|c| *c == call).count()
    }

    /// Options every context was built from, in order
    pub fn contexts(&self) -> Vec<ContextOpts> {
        self.contexts.lock().clone()
    }
}

impl EngineFactory for MockEngineFactory {
    fn new_context(&self, opts: &ContextOpts) -> Result<Box<dyn Engine>, EngineError> {
        self.calls.lock().push(Call::NewContext);
        self.contexts.lock().push(opts.clone());
        let script = self.script.lock().clone();
        if let Some(err) = script.context_error.clone() {
            return Err(err);
        }
        Ok(Box::new(MockEngine {
            script,
            opts: opts.clone(),
            calls: Arc::clone(&self.calls),
            planned: None,
        }))
    }
}

pub struct MockEngine {
    script: EngineScript,
    opts: ContextOpts,
    calls: Arc<Mutex<Vec<Call>>>,
    planned: Option<Diff>,
}

impl MockEngine {
    fn record(&self, call: Call) {
        self.calls.lock().push(call);
    }

    async fn pause(&self) {
        if let Some(delay) = self.script.delay {
            tokio::time::sleep(delay).await;
        }
    }

    fn applied_state(&self, diff: &Diff) -> State {
        let mut state = self.opts.state.clone().unwrap_or_default();
        for (address, change) in &diff.resources {
            let resource_type = address.split('.').next().unwrap_or(address);
            match change.action {
                DiffAction::Destroy => {
                    state.resources.remove(address);
                }
                DiffAction::Create | DiffAction::Replace | DiffAction::Update => {
                    let mut resource = ResourceState::new(resource_type, format!("{address}-applied"));
                    for (name, attr) in &change.attributes {
                        resource = resource.with_attribute(name.clone(), attr.new.clone());
                    }
                    state.resources.insert(address.clone(), resource);
                }
                DiffAction::Read => {}
            }
        }
        state
    }
}

#[async_trait]
impl Engine for MockEngine {
    async fn input(&mut self, mode: InputMode) -> Result<(), EngineError> {
        self.record(Call::Input(mode));
        if let Some(err) = self.script.input_error.clone() {
            return Err(err);
        }
        if let Some(ui) = &self.opts.ui_input {
            let opts = InputOpts {
                id: "var.input".into(),
                query: "var.input".into(),
                ..InputOpts::default()
            };
            ui.input(&opts).await?;
        }
        Ok(())
    }

    async fn validate(&mut self) -> Validation {
        self.record(Call::Validate);
        self.script.validation.clone()
    }

    async fn refresh(&mut self) -> Result<State, EngineError> {
        self.record(Call::Refresh);
        self.pause().await;
        let state = match self.script.refresh.clone() {
            Some(result) => result?,
            None => self.opts.state.clone().unwrap_or_default(),
        };
        for (address, resource) in &state.resources {
            for hook in &self.opts.hooks {
                hook.post_refresh(address, resource);
            }
        }
        self.opts.state = Some(state.clone());
        Ok(state)
    }

    async fn plan(&mut self) -> Result<Plan, EngineError> {
        self.record(Call::Plan);
        self.pause().await;
        if self.script.panic_on_plan {
            panic!("mock engine plan panic");
        }
        if let Some(err) = self.script.plan_error.clone() {
            return Err(err);
        }

        let diff = self.script.plan_diff.clone();
        for (address, change) in &diff.resources {
            for hook in &self.opts.hooks {
                if hook.post_diff(address, change) == HookAction::Halt {
                    return Err(EngineError::Halted);
                }
            }
        }
        self.planned = Some(diff.clone());

        Ok(Plan {
            diff,
            module: self.opts.module.clone(),
            state: self.opts.state.clone(),
            variables: self.opts.variables.clone(),
            targets: self.opts.targets.clone(),
            destroy: self.opts.destroy,
        })
    }

    async fn apply(&mut self) -> Result<State, PartialApply> {
        self.record(Call::Apply);
        self.pause().await;
        let diff = self
            .opts
            .diff
            .clone()
            .or_else(|| self.planned.clone())
            .unwrap_or_default();

        let failing = self.script.apply_error.clone();
        for (address, change) in &diff.resources {
            if let Some(ui) = &self.opts.ui_output {
                ui.output(&format!("{address}: {}", change.action));
            }
            for hook in &self.opts.hooks {
                hook.pre_apply(address, change);
                hook.post_apply(address, change.action, failing.as_ref());
            }
        }

        let state = self.script.apply_state.clone().unwrap_or_else(|| self.applied_state(&diff));
        match failing {
            Some(error) => Err(PartialApply {
                state: Some(state),
                error,
            }),
            None => Ok(state),
        }
    }
}
