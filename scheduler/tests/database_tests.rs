//! End-to-end tests against an in-memory SQLite database: loading
//! configuration, deriving due-ness from persisted log timestamps, and the
//! rows the database-backed log writes.

mod common;

use chrono::{Duration, Utc};
use common::*;
use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;

use scheduler::database::{NewServiceLog, ServiceRecord};
use scheduler::{Database, DatabaseServiceLog, LogFactory, ServiceLog, ServiceManager};

fn service_record(driver: &str, interval_seconds: i64, enabled: bool) -> ServiceRecord {
    let now = Utc::now();
    ServiceRecord {
        id: Uuid::new_v4().to_string(),
        name: format!("{driver} service"),
        event_id: "event-1".to_string(),
        enabled,
        interval_seconds,
        driver: driver.to_string(),
        params: "{}".to_string(),
        created_at: now,
        updated_at: now,
    }
}

/// A file-backed database in a temp dir. A `:memory:` URL would give every
/// pooled connection its own empty database, so tests use a real file. The
/// `TempDir` must stay alive for the duration of the test.
async fn test_database() -> (Database, tempfile::TempDir) {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("services.db");
    let database = Database::new(path.to_str().expect("utf-8 path"))
        .await
        .expect("Failed to create test database");
    (database, dir)
}

#[tokio::test]
async fn never_run_service_is_immediately_due_and_logs_success() {
    let (database, _dir) = test_database().await;
    let record = service_record("noop", 3600, true);
    database.store_service(&record).await.expect("store");

    let manager = ServiceManager::create(&database)
        .await
        .expect("manager should be produced");
    assert!(manager.execute(false).await.expect("execute"));

    let logs = database
        .get_service_logs(&record.id, 10)
        .await
        .expect("logs");
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].state, "success");
    assert!(logs[0].runtime_ms >= 0.0);
    assert_eq!(logs[0].data, "[]");
}

#[tokio::test]
async fn recently_run_service_is_skipped_until_forced() {
    let (database, _dir) = test_database().await;
    let record = service_record("noop", 3600, true);
    database.store_service(&record).await.expect("store");

    // A run moments ago; well inside the interval.
    database
        .store_service_log(&NewServiceLog {
            service_id: record.id.clone(),
            state: "success".to_string(),
            runtime_ms: 1.0,
            timestamp: Utc::now() - Duration::seconds(5),
            data: "[]".to_string(),
        })
        .await
        .expect("seed log");

    let manager = ServiceManager::create(&database).await.expect("manager");
    assert!(manager.execute(false).await.expect("execute"));
    assert_eq!(
        database.get_service_logs(&record.id, 10).await.unwrap().len(),
        1,
        "not due, nothing new persisted"
    );

    assert!(manager.execute(true).await.expect("forced execute"));
    assert_eq!(
        database.get_service_logs(&record.id, 10).await.unwrap().len(),
        2,
        "force overrides the interval"
    );
}

#[tokio::test]
async fn overdue_service_runs_without_force() {
    let (database, _dir) = test_database().await;
    let record = service_record("noop", 60, true);
    database.store_service(&record).await.expect("store");

    database
        .store_service_log(&NewServiceLog {
            service_id: record.id.clone(),
            state: "success".to_string(),
            runtime_ms: 1.0,
            timestamp: Utc::now() - Duration::hours(2),
            data: "[]".to_string(),
        })
        .await
        .expect("seed log");

    let manager = ServiceManager::create(&database).await.expect("manager");
    assert!(manager.execute(false).await.expect("execute"));
    assert_eq!(
        database.get_service_logs(&record.id, 10).await.unwrap().len(),
        2
    );
}

#[tokio::test]
async fn unknown_driver_row_is_silently_dropped() {
    let (database, _dir) = test_database().await;
    let record = service_record("mailer-not-deployed", 60, true);
    database.store_service(&record).await.expect("store");

    let manager = ServiceManager::create(&database).await.expect("manager");
    assert!(manager.execute(true).await.expect("execute"));
    assert!(database
        .get_service_logs(&record.id, 10)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn disabled_service_is_never_attempted() {
    let (database, _dir) = test_database().await;
    let record = service_record("noop", 60, false);
    database.store_service(&record).await.expect("store");

    let manager = ServiceManager::create(&database).await.expect("manager");
    assert!(manager.execute(true).await.expect("execute"));
    assert!(database
        .get_service_logs(&record.id, 10)
        .await
        .unwrap()
        .is_empty());
}

/// The database-backed log serializes diagnostics in severity-major,
/// insertion-minor order into the persisted `data` column.
#[tokio::test]
async fn persisted_log_row_carries_serialized_diagnostics() {
    let (database, _dir) = test_database().await;
    let pool = database.pool().clone();
    let log_factory: LogFactory = Arc::new(move |service_id: &str| {
        Box::new(DatabaseServiceLog::new(service_id.to_string(), pool.clone()))
            as Box<dyn ServiceLog>
    });

    let manager = ServiceManager::create_for_testing(
        vec![
            test_service("svc-warn", warn_driver("slow response")),
            test_service("svc-boom", fail_driver("boom")),
        ],
        log_factory,
    );
    assert!(!manager.execute(false).await.expect("execute"));

    let warn_logs = database.get_service_logs("svc-warn", 10).await.unwrap();
    assert_eq!(warn_logs.len(), 1);
    assert_eq!(warn_logs[0].state, "warning");
    let messages: Vec<Value> = serde_json::from_str(&warn_logs[0].data).unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0]["type"], "warning");
    assert_eq!(messages[0]["message"], "slow response");

    let boom_logs = database.get_service_logs("svc-boom", 10).await.unwrap();
    assert_eq!(boom_logs.len(), 1);
    assert_eq!(boom_logs[0].state, "exception");
    let messages: Vec<Value> = serde_json::from_str(&boom_logs[0].data).unwrap();
    assert_eq!(messages[0]["type"], "exception");
    assert!(messages[0]["message"].as_str().unwrap().contains("boom"));
}

/// One run carrying all three diagnostic kinds persists them
/// severity-major: exceptions first, then errors, then warnings.
#[tokio::test]
async fn mixed_diagnostics_serialize_exceptions_then_errors_then_warnings() {
    let (database, _dir) = test_database().await;
    let pool = database.pool().clone();
    let log_factory: LogFactory = Arc::new(move |service_id: &str| {
        Box::new(DatabaseServiceLog::new(service_id.to_string(), pool.clone()))
            as Box<dyn ServiceLog>
    });

    let manager = ServiceManager::create_for_testing(
        vec![test_service("svc-mixed", mixed_driver())],
        log_factory,
    );
    assert!(!manager.execute(false).await.expect("execute"));

    let logs = database.get_service_logs("svc-mixed", 10).await.unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].state, "exception");

    let messages: Vec<Value> = serde_json::from_str(&logs[0].data).unwrap();
    let kinds: Vec<&str> = messages
        .iter()
        .map(|m| m["type"].as_str().unwrap())
        .collect();
    assert_eq!(kinds, vec!["exception", "error", "warning"]);
    assert!(messages[0]["message"].as_str().unwrap().contains("boom"));
    assert_eq!(messages[1]["message"], "bad row");
    assert_eq!(messages[2]["message"], "slow response");
}

/// A run whose outcome cannot be persisted fails `execute` outright rather
/// than being counted as a failed service.
#[tokio::test]
async fn persist_failure_aborts_the_batch() {
    let (database, _dir) = test_database().await;
    let pool = database.pool().clone();
    pool.close().await;

    let log_factory: LogFactory = Arc::new(move |service_id: &str| {
        Box::new(DatabaseServiceLog::new(service_id.to_string(), pool.clone()))
            as Box<dyn ServiceLog>
    });

    let manager = ServiceManager::create_for_testing(
        vec![test_service("svc-a", quiet_driver())],
        log_factory,
    );

    let err = manager
        .execute(false)
        .await
        .expect_err("a failed persist must abort the batch");
    assert!(err
        .to_string()
        .contains("failed to record run of service 'svc-a'"));
}

#[tokio::test]
async fn load_query_reports_the_latest_run_only() {
    let (database, _dir) = test_database().await;
    let record = service_record("noop", 60, true);
    database.store_service(&record).await.expect("store");

    for hours_ago in [5, 3, 1] {
        database
            .store_service_log(&NewServiceLog {
                service_id: record.id.clone(),
                state: "success".to_string(),
                runtime_ms: 1.0,
                timestamp: Utc::now() - Duration::hours(hours_ago),
                data: "[]".to_string(),
            })
            .await
            .expect("seed log");
    }

    let loaded = database
        .load_services_with_last_run()
        .await
        .expect("load");
    assert_eq!(loaded.len(), 1);
    let last_run = loaded[0].last_run.expect("has a last run");
    let age = Utc::now() - last_run;
    assert!(age >= Duration::minutes(59) && age <= Duration::minutes(61));
}
