use super::Renderer;
use anyhow::{Context, Result};
use async_trait::async_trait;
use localfiles_common::TargetId;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

#[derive(Debug, Serialize)]
struct SkinRequest<'a> {
    target: TargetId,
    reference: &'a str,
    raw: bool,
}

/// Posts every rotation as JSON to a configured endpoint.
pub struct WebhookRenderer {
    client: Client,
    url: String,
}

impl WebhookRenderer {
    pub fn new(url: &str, timeout_secs: u64) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!("Failed to build HTTP client with timeout: {}", e);
                Client::new()
            });

        Self {
            client,
            url: url.to_string(),
        }
    }
}

#[async_trait]
impl Renderer for WebhookRenderer {
    fn name(&self) -> &str {
        "webhook"
    }

    async fn apply_skin(&self, target: TargetId, reference: &str, raw: bool) -> Result<()> {
        let body = SkinRequest {
            target,
            reference,
            raw,
        };

        let response = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .context(format!("Failed to POST to {}", self.url))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            anyhow::bail!("Renderer webhook failed ({}): {}", status, text);
        }

        Ok(())
    }
}
