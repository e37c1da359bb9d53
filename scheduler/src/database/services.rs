//! Service configuration and run-log database operations.

use anyhow::Result;
use sqlx::{Pool, Row, Sqlite};
use tracing::debug;

use super::records::{NewServiceLog, ServiceLogRecord, ServiceRecord, ServiceWithLastRun};
use super::Database;

impl Database {
    /// Upsert one configured service. Used by seeding and admin tooling; the
    /// scheduler itself only reads.
    pub async fn store_service(&self, service: &ServiceRecord) -> Result<()> {
        debug!("Storing service: {}", service.id);

        sqlx::query(
            r#"
            INSERT OR REPLACE INTO services (
                id, name, event_id, enabled, interval_seconds, driver, params,
                created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&service.id)
        .bind(&service.name)
        .bind(&service.event_id)
        .bind(service.enabled)
        .bind(service.interval_seconds)
        .bind(&service.driver)
        .bind(&service.params)
        .bind(service.created_at)
        .bind(service.updated_at)
        .execute(self.pool())
        .await?;

        Ok(())
    }

    /// The scheduler's one read: every service row joined with the timestamp
    /// of its most recent log, grouped per service.
    pub async fn load_services_with_last_run(&self) -> Result<Vec<ServiceWithLastRun>> {
        let rows = sqlx::query(
            r#"
            SELECT s.id, s.name, s.event_id, s.enabled, s.interval_seconds,
                   s.driver, s.params, s.created_at, s.updated_at,
                   MAX(l.timestamp) AS last_run
            FROM services s
            LEFT JOIN service_logs l ON l.service_id = s.id
            GROUP BY s.id
            "#,
        )
        .fetch_all(self.pool())
        .await?;

        let mut services = Vec::with_capacity(rows.len());
        for row in rows {
            services.push(ServiceWithLastRun {
                record: ServiceRecord {
                    id: row.try_get("id")?,
                    name: row.try_get("name")?,
                    event_id: row.try_get("event_id")?,
                    enabled: row.try_get("enabled")?,
                    interval_seconds: row.try_get("interval_seconds")?,
                    driver: row.try_get("driver")?,
                    params: row.try_get("params")?,
                    created_at: row.try_get("created_at")?,
                    updated_at: row.try_get("updated_at")?,
                },
                last_run: row.try_get("last_run")?,
            });
        }

        debug!("Loaded {} configured services", services.len());
        Ok(services)
    }

    pub async fn store_service_log(&self, log: &NewServiceLog) -> Result<()> {
        insert_service_log(self.pool(), log).await
    }

    /// Most recent run logs for one service, newest first.
    pub async fn get_service_logs(
        &self,
        service_id: &str,
        limit: i64,
    ) -> Result<Vec<ServiceLogRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT id, service_id, state, runtime_ms, timestamp, data
            FROM service_logs
            WHERE service_id = ?
            ORDER BY timestamp DESC, id DESC
            LIMIT ?
            "#,
        )
        .bind(service_id)
        .bind(limit)
        .fetch_all(self.pool())
        .await?;

        let mut logs = Vec::with_capacity(rows.len());
        for row in rows {
            logs.push(ServiceLogRecord {
                id: row.try_get("id")?,
                service_id: row.try_get("service_id")?,
                state: row.try_get("state")?,
                runtime_ms: row.try_get("runtime_ms")?,
                timestamp: row.try_get("timestamp")?,
                data: row.try_get("data")?,
            });
        }

        Ok(logs)
    }
}

/// Insert one completed-run row. Takes the pool directly so a log instance
/// can write without holding a `Database`.
pub(crate) async fn insert_service_log(pool: &Pool<Sqlite>, log: &NewServiceLog) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO service_logs (service_id, state, runtime_ms, timestamp, data)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(&log.service_id)
    .bind(&log.state)
    .bind(log.runtime_ms)
    .bind(log.timestamp)
    .bind(&log.data)
    .execute(pool)
    .await?;

    Ok(())
}
