//! Production service log backed by the `service_logs` table.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use sqlx::{Pool, Sqlite};
use std::time::Instant;
use tracing::debug;

use crate::database::{self, NewServiceLog};

use super::{RunRecord, ServiceLog, ServiceState};

/// One serialized diagnostic entry in a persisted log row.
#[derive(Debug, Serialize)]
struct LogMessage {
    #[serde(rename = "type")]
    kind: &'static str,
    message: String,
}

/// Writes one `service_logs` row per run on `finish_execution`.
///
/// Runtime is measured with a monotonic clock between `begin_execution` and
/// `finish_execution`. The write is not retried; a failed insert fails the
/// finish call.
pub struct DatabaseServiceLog {
    record: RunRecord,
    pool: Pool<Sqlite>,
    started_at: Option<Instant>,
}

impl DatabaseServiceLog {
    pub fn new(service_id: String, pool: Pool<Sqlite>) -> Self {
        Self {
            record: RunRecord::new(service_id),
            pool,
            started_at: None,
        }
    }

    /// Flattens exceptions, errors and warnings (each in insertion order)
    /// into one `{type, message}` list for the persisted `data` column.
    fn serialize_messages(&self) -> Result<String> {
        let mut messages = Vec::new();
        for err in self.record.exceptions() {
            messages.push(LogMessage {
                kind: ServiceState::Exception.label(),
                // Debug rendering carries the context chain and, when
                // captured, the backtrace.
                message: format!("{err:?}"),
            });
        }
        for data in self.record.errors() {
            messages.push(LogMessage {
                kind: ServiceState::Error.label(),
                message: join_data(data),
            });
        }
        for data in self.record.warnings() {
            messages.push(LogMessage {
                kind: ServiceState::Warning.label(),
                message: join_data(data),
            });
        }
        serde_json::to_string(&messages).context("failed to serialize log messages")
    }
}

/// Stringifies one recorded data tuple: bare strings stay unquoted, anything
/// else renders as JSON, values are comma-joined.
fn join_data(data: &[Value]) -> String {
    data.iter()
        .map(|value| match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

#[async_trait]
impl ServiceLog for DatabaseServiceLog {
    fn begin_execution(&mut self) {
        self.record.begin();
        self.started_at = Some(Instant::now());
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
        let runtime_ms = self
            .started_at
            .map(|started| started.elapsed().as_secs_f64() * 1000.0)
            .unwrap_or(0.0);
        let data = self.serialize_messages()?;

        let log = NewServiceLog {
            service_id: self.record.service_id().to_string(),
            state: state.label().to_string(),
            runtime_ms,
            timestamp: Utc::now(),
            data,
        };

        database::insert_service_log(&self.pool, &log).await?;
        debug!(
            "Recorded run of service '{}': {} ({:.1}ms)",
            log.service_id, log.state, log.runtime_ms
        );
        Ok(())
    }

    fn success(&self) -> bool {
        self.record.success()
    }

    fn state(&self) -> Option<ServiceState> {
        self.record.state()
    }
}
