//! Database record types (entities).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One configured service row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceRecord {
    pub id: String,
    pub name: String,
    /// Owning event; a grouping key the scheduler carries but never
    /// interprets.
    pub event_id: String,
    pub enabled: bool,
    /// Minimum seconds between two executions.
    pub interval_seconds: i64,
    /// Registry key resolved to a driver at load time.
    pub driver: String,
    /// Driver-specific JSON payload, passed verbatim to `execute`.
    pub params: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A service row joined with the timestamp of its most recent run, as
/// produced by the scheduler's load query.
#[derive(Debug, Clone)]
pub struct ServiceWithLastRun {
    pub record: ServiceRecord,
    pub last_run: Option<DateTime<Utc>>,
}

/// A run outcome about to be persisted.
#[derive(Debug, Clone)]
pub struct NewServiceLog {
    pub service_id: String,
    pub state: String,
    pub runtime_ms: f64,
    pub timestamp: DateTime<Utc>,
    /// JSON array of `{type, message}` diagnostic entries.
    pub data: String,
}

/// A persisted run outcome read back for inspection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceLogRecord {
    pub id: i64,
    pub service_id: String,
    pub state: String,
    pub runtime_ms: f64,
    pub timestamp: DateTime<Utc>,
    pub data: String,
}
