//! Per-run execution logs.
//!
//! Every service execution owns exactly one log for its lifetime. The log is
//! a small state machine: severity only ever escalates within a run
//! (`Success < Warning < Error < Exception`), and the final state plus all
//! captured diagnostics are recorded once when the run finishes.
//!
//! Two implementations share the same contract:
//! - `DatabaseServiceLog` - persists one row per run (production)
//! - `MockServiceLog` - collects completed runs into a test-owned buffer
//!
//! Misusing the log API (recording before `begin_execution`, recording after
//! an exception, finishing twice) is a bug in the scheduler or a driver, not
//! a runtime condition, and panics immediately.

mod database_log;
mod mock;

pub use database_log::DatabaseServiceLog;
pub use mock::{CompletedRun, LogBuffer, MockServiceLog};

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

/// Final state of a single service run, ordered by severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ServiceState {
    Success,
    Warning,
    Error,
    Exception,
}

impl ServiceState {
    /// Stable label used in persisted rows and serialized diagnostics.
    pub fn label(&self) -> &'static str {
        match self {
            ServiceState::Success => "success",
            ServiceState::Warning => "warning",
            ServiceState::Error => "error",
            ServiceState::Exception => "exception",
        }
    }
}

/// Contract every service log implementation honors.
///
/// `begin_execution` must be called exactly once before anything else;
/// `finish_execution` exactly once at the end. Warnings and errors may be
/// recorded any number of times in between; an exception is terminal.
#[async_trait]
pub trait ServiceLog: Send {
    /// Start the run. State becomes `Success` until something escalates it.
    fn begin_execution(&mut self);

    /// Record a recoverable issue. Escalates `Success` to `Warning`.
    fn warning(&mut self, data: Vec<Value>);

    /// Record a recoverable failure. Escalates `Success`/`Warning` to `Error`.
    fn error(&mut self, data: Vec<Value>);

    /// Record an unexpected failure. Escalates to `Exception` and makes the
    /// log terminal; only the scheduler calls this, never a driver.
    fn exception(&mut self, err: anyhow::Error);

    /// Record the final outcome. Exactly once per run; a persistence failure
    /// surfaces as `Err`.
    async fn finish_execution(&mut self) -> Result<()>;

    /// `true` iff the run ended in `Success` or `Warning`.
    fn success(&self) -> bool;

    /// Current state, `None` until `begin_execution` was called.
    fn state(&self) -> Option<ServiceState>;
}

/// Shared state-machine core backing both log implementations.
///
/// Holds the escalating state and the three insertion-ordered diagnostic
/// collections. All transition rules live here so the production log and the
/// mock cannot drift apart.
pub(crate) struct RunRecord {
    service_id: String,
    state: Option<ServiceState>,
    finished: bool,
    exceptions: Vec<anyhow::Error>,
    errors: Vec<Vec<Value>>,
    warnings: Vec<Vec<Value>>,
}

impl RunRecord {
    pub(crate) fn new(service_id: String) -> Self {
        Self {
            service_id,
            state: None,
            finished: false,
            exceptions: Vec::new(),
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub(crate) fn service_id(&self) -> &str {
        &self.service_id
    }

    pub(crate) fn begin(&mut self) {
        if self.state.is_some() {
            panic!(
                "execution of service '{}' has already begun",
                self.service_id
            );
        }
        self.state = Some(ServiceState::Success);
    }

    /// Panics unless the run has begun and no exception was recorded yet.
    fn assert_recordable(&self, what: &str) {
        match self.state {
            None => panic!(
                "cannot record a {} for service '{}' before execution begins",
                what, self.service_id
            ),
            Some(ServiceState::Exception) => panic!(
                "cannot record a {} for service '{}' after an exception",
                what, self.service_id
            ),
            Some(_) => {}
        }
    }

    pub(crate) fn warning(&mut self, data: Vec<Value>) {
        self.assert_recordable("warning");
        self.warnings.push(data);
        if self.state == Some(ServiceState::Success) {
            self.state = Some(ServiceState::Warning);
        }
    }

    pub(crate) fn error(&mut self, data: Vec<Value>) {
        self.assert_recordable("error");
        self.errors.push(data);
        if self.state < Some(ServiceState::Error) {
            self.state = Some(ServiceState::Error);
        }
    }

    pub(crate) fn exception(&mut self, err: anyhow::Error) {
        self.assert_recordable("exception");
        self.exceptions.push(err);
        self.state = Some(ServiceState::Exception);
    }

    /// Closes the record and returns the final state. Panics if the run never
    /// began or was already finished.
    pub(crate) fn finish(&mut self) -> ServiceState {
        let state = match self.state {
            None => panic!(
                "cannot finish execution of service '{}' before it begins",
                self.service_id
            ),
            Some(state) => state,
        };
        if self.finished {
            panic!(
                "execution of service '{}' has already finished",
                self.service_id
            );
        }
        self.finished = true;
        state
    }

    pub(crate) fn success(&self) -> bool {
        matches!(
            self.state,
            Some(ServiceState::Success) | Some(ServiceState::Warning)
        )
    }

    pub(crate) fn state(&self) -> Option<ServiceState> {
        self.state
    }

    pub(crate) fn exceptions(&self) -> &[anyhow::Error] {
        &self.exceptions
    }

    pub(crate) fn errors(&self) -> &[Vec<Value>] {
        &self.errors
    }

    pub(crate) fn warnings(&self) -> &[Vec<Value>] {
        &self.warnings
    }

    /// Moves the diagnostic collections out, leaving the record empty.
    pub(crate) fn take_collections(
        &mut self,
    ) -> (Vec<anyhow::Error>, Vec<Vec<Value>>, Vec<Vec<Value>>) {
        (
            std::mem::take(&mut self.exceptions),
            std::mem::take(&mut self.errors),
            std::mem::take(&mut self.warnings),
        )
    }
}
