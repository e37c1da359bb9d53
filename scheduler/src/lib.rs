pub mod config;
pub mod database;
pub mod driver;
pub mod log;
pub mod manager;

// Re-export commonly used types
pub use config::Config;
pub use database::Database;
pub use driver::{resolve_driver, DriverFactory, ServiceDriver};
pub use log::{
    CompletedRun, DatabaseServiceLog, LogBuffer, MockServiceLog, ServiceLog, ServiceState,
};
pub use manager::{LogFactory, Service, ServiceManager};
