//! Driver that does nothing. Scheduling a `noop` service gives a heartbeat
//! row in `service_logs`, which is a cheap liveness check for the scheduler
//! itself.

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::log::ServiceLog;

use super::ServiceDriver;

pub struct NoopDriver;

#[async_trait]
impl ServiceDriver for NoopDriver {
    async fn execute(&self, _log: &mut dyn ServiceLog, _params: Value) -> Result<()> {
        debug!("noop driver executed");
        Ok(())
    }
}
