use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

use crate::traits::PricingService;

pub struct HttpPricing {
    url: String,
    client: reqwest::Client,
}

impl HttpPricing {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build pricing HTTP client")?;
        Ok(Self {
            url: url.into(),
            client,
        })
    }
}

#[async_trait]
impl PricingService for HttpPricing {
    async fn price_of(&self, post_id: &str) -> Result<u64> {
        let resp: Value = self
            .client
            .post(&self.url)
            .json(&serde_json::json!({ "postId": post_id }))
            .send()
            .await
            .with_context(|| format!("Pricing request for post {} failed", post_id))?
            .error_for_status()?
            .json()
            .await?;

        parse_price(&resp)
    }
}

/// The pricing service answers `{"price": "15"}`; a bare number is accepted too.
pub(crate) fn parse_price(resp: &Value) -> Result<u64> {
    match resp.get("price") {
        Some(Value::String(s)) => s
            .trim()
            .parse::<u64>()
            .with_context(|| format!("Invalid price: {:?}", s)),
        Some(Value::Number(n)) => n.as_u64().ok_or_else(|| anyhow!("Invalid price: {}", n)),
        _ => Err(anyhow!("Pricing response has no price: {}", resp)),
    }
}
