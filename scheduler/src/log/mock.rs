//! In-memory service log for scheduler tests.
//!
//! Same state-machine contract as the database-backed log, but completed
//! runs land in an explicit, test-owned `LogBuffer` instead of storage. The
//! buffer is passed into each mock's constructor, so two test harnesses
//! never share state by accident.

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::{Arc, Mutex};

use super::{RunRecord, ServiceLog, ServiceState};

/// Everything one completed run recorded, in raw form.
#[derive(Debug)]
pub struct CompletedRun {
    pub service_id: String,
    pub state: ServiceState,
    pub exceptions: Vec<anyhow::Error>,
    pub errors: Vec<Vec<Value>>,
    pub warnings: Vec<Vec<Value>>,
}

/// Shared buffer collecting completed runs. Cloning yields a handle to the
/// same buffer.
#[derive(Clone, Default)]
pub struct LogBuffer {
    runs: Arc<Mutex<Vec<CompletedRun>>>,
}

impl LogBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Discards everything collected so far.
    pub fn reset(&self) {
        self.runs.lock().expect("log buffer poisoned").clear();
    }

    /// Returns all collected runs and clears the buffer, so a repeat call
    /// without new executions yields an empty list.
    pub fn take_logs(&self) -> Vec<CompletedRun> {
        std::mem::take(&mut *self.runs.lock().expect("log buffer poisoned"))
    }

    fn push(&self, run: CompletedRun) {
        self.runs.lock().expect("log buffer poisoned").push(run);
    }
}

pub struct MockServiceLog {
    record: RunRecord,
    buffer: LogBuffer,
}

impl MockServiceLog {
    pub fn new(service_id: String, buffer: LogBuffer) -> Self {
        Self {
            record: RunRecord::new(service_id),
            buffer,
        }
    }
}

#[async_trait]
impl ServiceLog for MockServiceLog {
    fn begin_execution(&mut self) {
        self.record.begin();
    }

    fn warning(&mut self, data: Vec<Value>) {
        self.record.warning(data);
    }

    fn error(&mut self, data: Vec<Value>) {
        self.record.error(data);
    }

    fn exception(&mut self, err: anyhow::Error) {
        self.record.exception(err);
    }

    async fn finish_execution(&mut self) -> Result<()> {
        let state = self.record.finish();
        let (exceptions, errors, warnings) = self.record.take_collections();
        self.buffer.push(CompletedRun {
            service_id: self.record.service_id().to_string(),
            state,
            exceptions,
            errors,
            warnings,
        });
        Ok(())
    }

    fn success(&self) -> bool {
        self.record.success()
    }

    fn state(&self) -> Option<ServiceState> {
        self.record.state()
    }
}
