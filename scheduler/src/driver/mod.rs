//! Service drivers and their registry.
//!
//! A driver is "what a service does"; the scheduler decides when. Drivers
//! report recoverable issues through `log.warning()` / `log.error()` and let
//! unexpected failures propagate as `Err` - the scheduler is the only caller
//! of `log.exception()`.
//!
//! Drivers are resolved by the name stored in each service's `driver`
//! column. A name this build does not know is not an error: the row is
//! dropped at load time, which keeps a shared configuration database
//! compatible with deployments that ship different driver sets.

mod noop;
mod webhook;

pub use noop::NoopDriver;
pub use webhook::WebhookDriver;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

use crate::log::ServiceLog;

/// The one operation a service driver implements.
#[async_trait]
pub trait ServiceDriver: Send + Sync {
    /// Run the service once. `params` is the service row's payload, already
    /// parsed from JSON text.
    async fn execute(&self, log: &mut dyn ServiceLog, params: Value) -> Result<()>;
}

/// Produces a fresh driver instance for each run.
pub type DriverFactory = Arc<dyn Fn() -> Box<dyn ServiceDriver> + Send + Sync>;

/// Resolve a configured driver name to its factory. `None` means the name is
/// not deployed in this build and the service should be skipped at load.
pub fn resolve_driver(name: &str) -> Option<DriverFactory> {
    match name {
        "noop" => {
            let factory: DriverFactory = Arc::new(|| Box::new(NoopDriver) as Box<dyn ServiceDriver>);
            Some(factory)
        }
        "webhook" => {
            let factory: DriverFactory =
                Arc::new(|| Box::new(WebhookDriver::new()) as Box<dyn ServiceDriver>);
            Some(factory)
        }
        _ => None,
    }
}
