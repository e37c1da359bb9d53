//! Shared helpers for scheduler integration tests.

#![allow(dead_code)]

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

use scheduler::{DriverFactory, LogBuffer, LogFactory, MockServiceLog, Service, ServiceDriver, ServiceLog};

/// A service that is enabled, due, and carries empty params. Tests tweak
/// fields as needed.
pub fn test_service(id: &str, driver: DriverFactory) -> Service {
    Service {
        id: id.to_string(),
        name: id.to_string(),
        event_id: "event-1".to_string(),
        enabled: true,
        interval_seconds: 60,
        driver,
        params: "{}".to_string(),
        seconds_since_last_execution: 60,
    }
}

/// Log factory producing mocks wired to the given buffer.
pub fn mock_log_factory(buffer: &LogBuffer) -> LogFactory {
    let buffer = buffer.clone();
    Arc::new(move |service_id: &str| {
        Box::new(MockServiceLog::new(service_id.to_string(), buffer.clone())) as Box<dyn ServiceLog>
    })
}

/// Driver that records one warning and succeeds.
pub struct WarnDriver {
    pub message: &'static str,
}

#[async_trait]
impl ServiceDriver for WarnDriver {
    async fn execute(&self, log: &mut dyn ServiceLog, _params: Value) -> Result<()> {
        log.warning(vec![json!(self.message)]);
        Ok(())
    }
}

pub fn warn_driver(message: &'static str) -> DriverFactory {
    Arc::new(move || Box::new(WarnDriver { message }) as Box<dyn ServiceDriver>)
}

/// Driver that records one error and succeeds (run fails, batch continues).
pub struct ErrorDriver {
    pub message: &'static str,
}

#[async_trait]
impl ServiceDriver for ErrorDriver {
    async fn execute(&self, log: &mut dyn ServiceLog, _params: Value) -> Result<()> {
        log.error(vec![json!(self.message)]);
        Ok(())
    }
}

pub fn error_driver(message: &'static str) -> DriverFactory {
    Arc::new(move || Box::new(ErrorDriver { message }) as Box<dyn ServiceDriver>)
}

/// Driver that fails with an unexpected error.
pub struct FailDriver {
    pub message: &'static str,
}

#[async_trait]
impl ServiceDriver for FailDriver {
    async fn execute(&self, _log: &mut dyn ServiceLog, _params: Value) -> Result<()> {
        Err(anyhow!(self.message))
    }
}

pub fn fail_driver(message: &'static str) -> DriverFactory {
    Arc::new(move || Box::new(FailDriver { message }) as Box<dyn ServiceDriver>)
}

/// Driver that records a warning and an error, then fails, so one run ends
/// up carrying all three diagnostic kinds.
pub struct MixedDriver;

#[async_trait]
impl ServiceDriver for MixedDriver {
    async fn execute(&self, log: &mut dyn ServiceLog, _params: Value) -> Result<()> {
        log.warning(vec![json!("slow response")]);
        log.error(vec![json!("bad row")]);
        Err(anyhow!("boom"))
    }
}

pub fn mixed_driver() -> DriverFactory {
    Arc::new(|| Box::new(MixedDriver) as Box<dyn ServiceDriver>)
}

/// Driver that does nothing.
pub struct QuietDriver;

#[async_trait]
impl ServiceDriver for QuietDriver {
    async fn execute(&self, _log: &mut dyn ServiceLog, _params: Value) -> Result<()> {
        Ok(())
    }
}

pub fn quiet_driver() -> DriverFactory {
    Arc::new(|| Box::new(QuietDriver) as Box<dyn ServiceDriver>)
}
