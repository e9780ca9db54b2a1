//! Supervisor notification when a question is escalated

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use tracing::{info, warn};

use crate::types::HelpRequest;

/// Tells a human that a help request is waiting
#[async_trait]
pub trait SupervisorNotifier: Send + Sync {
    async fn notify(&self, request: &HelpRequest) -> Result<()>;

    fn name(&self) -> &'static str;
}

/// Writes the request to the log for whoever is watching the console
pub struct LogNotifier;

#[async_trait]
impl SupervisorNotifier for LogNotifier {
    async fn notify(&self, request: &HelpRequest) -> Result<()> {
        warn!("Supervisor needed: help request {} asks \"{}\"", request.id, request.question);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "log"
    }
}

/// Posts to an incoming webhook (Slack-compatible `{"text": ...}` payload)
pub struct WebhookNotifier {
    http: Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            url: url.into(),
        }
    }

    fn message(request: &HelpRequest) -> String {
        format!(
            "Hey, I need help answering \"{}\" (request {})",
            request.question, request.id
        )
    }
}

#[async_trait]
impl SupervisorNotifier for WebhookNotifier {
    async fn notify(&self, request: &HelpRequest) -> Result<()> {
        let payload = json!({
            "text": Self::message(request),
            "request_id": request.id,
            "question": request.question,
        });

        let response = self.http
            .post(&self.url)
            .json(&payload)
            .send()
            .await
            .context("Failed to send supervisor webhook")?;

        if response.status().is_success() {
            info!("Supervisor webhook sent for request {}", request.id);
            Ok(())
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            bail!("Supervisor webhook failed: {} - {}", status, body)
        }
    }

    fn name(&self) -> &'static str {
        "webhook"
    }
}
