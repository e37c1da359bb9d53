//! Driver that POSTs a JSON payload to a configured webhook URL.
//!
//! A non-2xx response is a recoverable failure recorded on the log; a
//! network-level failure propagates as `Err` and becomes the run's
//! exception.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

use crate::log::ServiceLog;

use super::ServiceDriver;

#[derive(Debug, Deserialize)]
struct WebhookParams {
    url: String,
    #[serde(default)]
    payload: Value,
}

pub struct WebhookDriver {
    client: Client,
}

impl WebhookDriver {
    pub fn new() -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .expect("Failed to create HTTP client for WebhookDriver");

        Self { client }
    }
}

impl Default for WebhookDriver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ServiceDriver for WebhookDriver {
    async fn execute(&self, log: &mut dyn ServiceLog, params: Value) -> Result<()> {
        let params: WebhookParams =
            serde_json::from_value(params).context("invalid webhook driver params")?;

        debug!("Posting webhook to {}", params.url);
        let response = self
            .client
            .post(&params.url)
            .json(&params.payload)
            .send()
            .await
            .with_context(|| format!("webhook request to {} failed", params.url))?;

        let status = response.status();
        if !status.is_success() {
            log.error(vec![json!(format!(
                "webhook {} returned {}",
                params.url, status
            ))]);
        }

        Ok(())
    }
}
