use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

use crate::traits::{SpamCheck, SpamClassifier};

#[derive(Clone)]
pub struct AkismetConfig {
    pub api_key: String,
    /// Sent as `blog`; Akismet wants the front page of the site.
    pub site_url: String,
    pub timeout: Duration,
}

pub struct AkismetClassifier {
    config: AkismetConfig,
    client: reqwest::Client,
}

impl AkismetClassifier {
    pub fn new(config: AkismetConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .context("Failed to build Akismet HTTP client")?;
        Ok(Self { config, client })
    }

    fn endpoint(&self) -> String {
        format!(
            "https://{}.rest.akismet.com/1.1/comment-check",
            self.config.api_key
        )
    }
}

#[async_trait]
impl SpamClassifier for AkismetClassifier {
    async fn is_spam(&self, check: &SpamCheck<'_>) -> Result<bool> {
        let blog = if self.config.site_url.is_empty() {
            format!("https://{}", check.domain)
        } else {
            self.config.site_url.clone()
        };
        let form = [
            ("blog", blog.as_str()),
            ("user_ip", check.ip),
            ("user_agent", check.user_agent),
            ("comment_type", "comment"),
            ("comment_author", check.name),
            ("comment_author_email", check.email),
            ("comment_author_url", check.link),
            ("comment_content", check.text),
        ];

        let body = self
            .client
            .post(self.endpoint())
            .form(&form)
            .send()
            .await
            .context("Akismet request failed")?
            .error_for_status()?
            .text()
            .await?;

        debug!("Akismet verdict for {}: {}", check.domain, body);
        match body.trim() {
            "true" => Ok(true),
            "false" => Ok(false),
            other => bail!("Unexpected Akismet response: {}", other),
        }
    }
}

/// Used when no Akismet key is configured.
pub struct DisabledClassifier;

#[async_trait]
impl SpamClassifier for DisabledClassifier {
    async fn is_spam(&self, _check: &SpamCheck<'_>) -> Result<bool> {
        Ok(false)
    }
}
