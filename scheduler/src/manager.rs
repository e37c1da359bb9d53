//! Sequential execution of due, enabled services.
//!
//! The manager loads every configured service together with the timestamp of
//! its most recent run, fixes a randomized order, and on `execute` runs each
//! due service one at a time. A failing service only fails its own run;
//! every due service is attempted regardless of earlier failures.
//!
//! Known limitations, kept on purpose: there is no timeout around a driver
//! (a hanging driver blocks the rest of the batch), and nothing guards
//! against two overlapping `execute` calls on the same process.

use anyhow::{Context, Result};
use chrono::Utc;
use rand::seq::SliceRandom;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::database::Database;
use crate::driver::{resolve_driver, DriverFactory};
use crate::log::{DatabaseServiceLog, ServiceLog};

/// Constructs a fresh log for a service id; the seam that lets tests swap
/// the database-backed log for the mock.
pub type LogFactory = Arc<dyn Fn(&str) -> Box<dyn ServiceLog> + Send + Sync>;

/// One runnable service, as fixed at load time.
#[derive(Clone)]
pub struct Service {
    pub id: String,
    pub name: String,
    pub event_id: String,
    pub enabled: bool,
    pub interval_seconds: i64,
    pub driver: DriverFactory,
    /// Raw JSON text, parsed right before each run.
    pub params: String,
    /// Derived from the most recent log timestamp; a never-run service is
    /// set exactly one interval past due.
    pub seconds_since_last_execution: i64,
}

impl Service {
    fn is_due(&self) -> bool {
        self.seconds_since_last_execution >= self.interval_seconds
    }
}

pub struct ServiceManager {
    services: Vec<Service>,
    log_factory: LogFactory,
}

impl ServiceManager {
    /// Load all configured services and fix the execution order.
    ///
    /// The order is shuffled once here so that, when many services are due
    /// at the same time, a fixed listing order cannot systematically starve
    /// the later ones. Services whose driver name is unknown to this build
    /// are dropped. A failed configuration query yields `None`; the caller
    /// treats that as "nothing to do this round".
    pub async fn create(database: &Database) -> Option<Self> {
        let rows = match database.load_services_with_last_run().await {
            Ok(rows) => rows,
            Err(e) => {
                error!("Failed to load service configuration: {}", e);
                return None;
            }
        };

        let now = Utc::now();
        let mut services = Vec::with_capacity(rows.len());
        for row in rows {
            let Some(driver) = resolve_driver(&row.record.driver) else {
                debug!(
                    "Skipping service '{}': driver '{}' is not deployed in this build",
                    row.record.id, row.record.driver
                );
                continue;
            };

            let seconds_since_last_execution = match row.last_run {
                Some(last_run) => (now - last_run).num_seconds(),
                // Never ran: exactly one interval past due, immediately
                // eligible.
                None => row.record.interval_seconds,
            };

            services.push(Service {
                id: row.record.id,
                name: row.record.name,
                event_id: row.record.event_id,
                enabled: row.record.enabled,
                interval_seconds: row.record.interval_seconds,
                driver,
                params: row.record.params,
                seconds_since_last_execution,
            });
        }

        services.shuffle(&mut rand::thread_rng());

        let pool = database.pool().clone();
        let log_factory: LogFactory = Arc::new(move |service_id: &str| {
            Box::new(DatabaseServiceLog::new(service_id.to_string(), pool.clone()))
                as Box<dyn ServiceLog>
        });

        Some(Self {
            services,
            log_factory,
        })
    }

    /// Build a manager from explicit services and a log constructor,
    /// bypassing storage. The seam for deterministic scheduling tests.
    pub fn create_for_testing(services: Vec<Service>, log_factory: LogFactory) -> Self {
        Self {
            services,
            log_factory,
        }
    }

    /// Run every due, enabled service once, sequentially, in load-time
    /// order. Returns `Ok(true)` iff no attempted service failed. `force`
    /// overrides the interval check but never enablement. An `Err` means a
    /// run's outcome could not be persisted.
    pub async fn execute(&self, force: bool) -> Result<bool> {
        let mut all_succeeded = true;

        for service in &self.services {
            if !service.enabled {
                debug!("Skipping service '{}': disabled", service.name);
                continue;
            }
            if !force && !service.is_due() {
                debug!(
                    "Skipping service '{}': ran {}s ago, interval is {}s",
                    service.name, service.seconds_since_last_execution, service.interval_seconds
                );
                continue;
            }

            info!("Executing service '{}' ({})", service.name, service.id);
            if !self.execute_single(service).await? {
                warn!("Service '{}' failed", service.name);
                all_succeeded = false;
            }
        }

        Ok(all_succeeded)
    }

    /// Run one service with a fresh log and a fresh driver instance.
    ///
    /// The try/catch lives here: any `Err` out of the driver (or out of the
    /// params parse) becomes the run's exception, and `finish_execution`
    /// always runs. Returns the run's success flag.
    async fn execute_single(&self, service: &Service) -> Result<bool> {
        let mut log = (self.log_factory)(&service.id);
        log.begin_execution();

        match serde_json::from_str::<Value>(&service.params)
            .with_context(|| format!("invalid params for service '{}'", service.id))
        {
            Ok(params) => {
                let driver = (service.driver)();
                if let Err(e) = driver.execute(log.as_mut(), params).await {
                    log.exception(e);
                }
            }
            Err(e) => log.exception(e),
        }

        log.finish_execution()
            .await
            .with_context(|| format!("failed to record run of service '{}'", service.id))?;

        Ok(log.success())
    }
}
