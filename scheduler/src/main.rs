// File: scheduler/src/main.rs
use anyhow::Result;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use scheduler::{Config, Database, ServiceManager};

const CONFIG_PATH: &str = "config/scheduler.toml";

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging with reduced verbosity
    let env_filter = EnvFilter::from_default_env()
        .add_directive("scheduler=info".parse()?)
        .add_directive("sqlx=warn".parse()?)
        .add_directive("reqwest=warn".parse()?)
        .add_directive("hyper=warn".parse()?);

    fmt().with_env_filter(env_filter).init();

    info!("Starting background service scheduler");

    let config = Config::load(CONFIG_PATH)?;
    let database = Database::new(&config.database_path).await?;

    let Some(manager) = ServiceManager::create(&database).await else {
        warn!("Service configuration could not be loaded; nothing to do this round");
        return Ok(());
    };

    match manager.execute(config.force).await {
        Ok(true) => {
            info!("All executed services finished successfully");
            Ok(())
        }
        Ok(false) => {
            error!("One or more services failed; see service_logs for details");
            std::process::exit(1);
        }
        Err(e) => {
            error!("Scheduler run aborted: {:#}", e);
            std::process::exit(1);
        }
    }
}
