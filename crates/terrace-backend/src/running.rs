//! Running operation handles
//!
//! The handler side holds a [`Completion`]; the caller side holds a
//! [`RunningOperation`]. Both share one result cell. The completion channel
//! belongs to the handle alone, so nothing the caller cancels can make it
//! fire early. It fires when the `Completion` is dropped, which happens on
//! every exit path of the background task, panics included.

use crate::error::OperationError;
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use terrace_state::State;
use tokio::sync::watch;
use ulid::Ulid;

/// Unique operation identifier (ULID for sortability)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OperationId(pub Ulid);

impl OperationId {
    /// Generate new operation ID
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for OperationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for OperationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Default)]
struct Outcome {
    state: Option<State>,
    err: Option<Arc<OperationError>>,
    plan_id: Option<Ulid>,
}

/// Caller's view of an operation started in the background
#[derive(Debug, Clone)]
pub struct RunningOperation {
    id: OperationId,
    done: watch::Receiver<bool>,
    outcome: Arc<Mutex<Outcome>>,
}

impl RunningOperation {
    /// New handle and the completion its handler reports through
    pub(crate) fn start() -> (Self, Completion) {
        let (tx, rx) = watch::channel(false);
        let outcome = Arc::new(Mutex::new(Outcome::default()));
        let handle = Self {
            id: OperationId::new(),
            done: rx,
            outcome: Arc::clone(&outcome),
        };
        (handle, Completion { outcome, done: tx })
    }

    /// Operation ID
    #[inline]
    #[must_use]
    pub fn id(&self) -> OperationId {
        self.id
    }

    /// Whether the handler has finished
    #[must_use]
    pub fn is_done(&self) -> bool {
        *self.done.borrow()
    }

    /// Wait until the handler has finished
    pub async fn wait(&self) {
        let mut done = self.done.clone();
        // The sender only goes away after sending `true`
        let _ = done.wait_for(|finished| *finished).await;
    }

    /// Failure, if the operation failed; read after [`wait`](Self::wait)
    #[must_use]
    pub fn err(&self) -> Option<Arc<OperationError>> {
        self.outcome.lock().err.clone()
    }

    /// Best known state snapshot; final after [`wait`](Self::wait)
    #[must_use]
    pub fn state(&self) -> Option<State> {
        self.outcome.lock().state.clone()
    }

    /// Correlation id of a successful plan
    #[must_use]
    pub fn plan_id(&self) -> Option<Ulid> {
        self.outcome.lock().plan_id
    }

    /// Wait and turn the outcome into a `Result`
    ///
    /// # Errors
    ///
    /// Returns the operation's failure, if any.
    pub async fn finish(&self) -> Result<Option<State>, Arc<OperationError>> {
        self.wait().await;
        let outcome = self.outcome.lock();
        match &outcome.err {
            Some(err) => Err(Arc::clone(err)),
            None => Ok(outcome.state.clone()),
        }
    }
}

/// Handler's side of a running operation
#[derive(Debug)]
pub(crate) struct Completion {
    outcome: Arc<Mutex<Outcome>>,
    done: watch::Sender<bool>,
}

impl Completion {
    pub(crate) fn set_state(&self, state: Option<State>) {
        self.outcome.lock().state = state;
    }

    pub(crate) fn set_plan_id(&self, id: Ulid) {
        self.outcome.lock().plan_id = Some(id);
    }

    /// Record the failure; the first one recorded wins
    pub(crate) fn fail(&self, err: OperationError) {
        let mut outcome = self.outcome.lock();
        if outcome.err.is_none() {
            outcome.err = Some(Arc::new(err));
        }
    }
}

impl Drop for Completion {
    fn drop(&mut self) {
        self.done.send_replace(true);
    }
}
