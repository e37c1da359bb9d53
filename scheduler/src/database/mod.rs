//! Database layer for the service scheduler.
//!
//! SQLite persistence for:
//! - `services` - configured background services (what to run, how often)
//! - `service_logs` - one row per completed run (state, runtime, diagnostics)
//!
//! Submodules:
//! - `records` - all record types (entities)
//! - `services` - service configuration and run-log queries

pub(crate) mod records;
mod services;

pub use records::*;
pub(crate) use services::insert_service_log;

use anyhow::Result;
use sqlx::{Pool, Sqlite, SqlitePool};
use std::path::Path;
use tracing::{error, info};

pub struct Database {
    pool: Pool<Sqlite>,
}

impl Database {
    /// Expose pool for log construction and integration test queries
    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    pub async fn new(database_path: &str) -> Result<Self> {
        // Ensure parent directory exists (":memory:" has none)
        if let Some(parent) = Path::new(database_path).parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let database_url = format!("sqlite:{}?mode=rwc", database_path);
        let pool = match SqlitePool::connect(&database_url).await {
            Ok(pool) => pool,
            Err(e) => {
                error!("Failed to connect to database '{}': {}", database_path, e);
                return Err(e.into());
            }
        };

        let database = Self { pool };
        database.initialize_tables().await?;
        info!("Database initialized at '{}'", database_path);

        Ok(database)
    }

    async fn initialize_tables(&self) -> Result<()> {
        let services_table_sql = r#"
            CREATE TABLE IF NOT EXISTS services (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                event_id TEXT NOT NULL,
                enabled BOOLEAN NOT NULL DEFAULT 1,
                interval_seconds INTEGER NOT NULL,
                driver TEXT NOT NULL,
                params TEXT NOT NULL DEFAULT '{}',
                created_at DATETIME NOT NULL,
                updated_at DATETIME NOT NULL
            )
        "#;
        if let Err(e) = sqlx::query(services_table_sql).execute(&self.pool).await {
            error!("Failed to create services table: {}", e);
            return Err(e.into());
        }

        let logs_table_sql = r#"
            CREATE TABLE IF NOT EXISTS service_logs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                service_id TEXT NOT NULL,
                state TEXT NOT NULL,
                runtime_ms REAL NOT NULL,
                timestamp DATETIME NOT NULL,
                data TEXT NOT NULL
            )
        "#;
        if let Err(e) = sqlx::query(logs_table_sql).execute(&self.pool).await {
            error!("Failed to create service_logs table: {}", e);
            return Err(e.into());
        }

        let logs_index_sql = "CREATE INDEX IF NOT EXISTS idx_service_logs_service_timestamp \
             ON service_logs(service_id, timestamp DESC)";
        if let Err(e) = sqlx::query(logs_index_sql).execute(&self.pool).await {
            error!("Failed to create service_logs index: {}", e);
            return Err(e.into());
        }

        Ok(())
    }
}
