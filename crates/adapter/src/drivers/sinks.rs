use anyhow::{Context, Result};
use async_trait::async_trait;
use std::time::Duration;
use tracing::info;

use crate::traits::{NotificationSink, OutboundNotification};

/// Writes notifications to the log. Default when no webhook is configured.
pub struct LogSink;

#[async_trait]
impl NotificationSink for LogSink {
    async fn deliver(&self, n: &OutboundNotification) -> Result<()> {
        info!(
            "Notification ({:?}) to {} for comment {} on {}{}",
            n.kind, n.to, n.comment_hex, n.domain, n.path
        );
        Ok(())
    }
}

/// POSTs each notification as JSON to a mail relay or similar.
pub struct WebhookSink {
    url: String,
    client: reqwest::Client,
}

impl WebhookSink {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build webhook HTTP client")?;
        Ok(Self {
            url: url.into(),
            client,
        })
    }
}

#[async_trait]
impl NotificationSink for WebhookSink {
    async fn deliver(&self, n: &OutboundNotification) -> Result<()> {
        self.client
            .post(&self.url)
            .json(n)
            .send()
            .await
            .context("Webhook delivery failed")?
            .error_for_status()?;
        Ok(())
    }
}
