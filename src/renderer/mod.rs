//! Renderers display a resolved reference on a target.
//!
//! The scheduler only decides *what* a target should show; a [`Renderer`]
//! performs the display. Failures are reported to the caller, which logs
//! them and moves on.

pub mod webhook;

pub use webhook::WebhookRenderer;

use crate::config::{RendererConfig, RendererKind};
use anyhow::Result;
use async_trait::async_trait;
use localfiles_common::TargetId;
use std::sync::Arc;

/// Applies a reference (a `file://` path or remote URL) to a target.
#[async_trait]
pub trait Renderer: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// Show `reference` on `target`. `raw` disables any post-processing
    /// the renderer would otherwise apply.
    async fn apply_skin(&self, target: TargetId, reference: &str, raw: bool) -> Result<()>;
}

/// Renderer that only logs each rotation.
#[derive(Debug, Default, Clone)]
pub struct LogRenderer;

#[async_trait]
impl Renderer for LogRenderer {
    fn name(&self) -> &str {
        "log"
    }

    async fn apply_skin(&self, target: TargetId, reference: &str, raw: bool) -> Result<()> {
        tracing::info!(target_id = %target, raw, "Showing {}", reference);
        Ok(())
    }
}

/// Build the renderer selected in config.
pub fn create_renderer(config: &RendererConfig) -> Result<Arc<dyn Renderer>> {
    match config.kind {
        RendererKind::Log => Ok(Arc::new(LogRenderer)),
        RendererKind::Webhook => {
            let url = config
                .url
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("renderer.url is required for the webhook renderer"))?;
            Ok(Arc::new(WebhookRenderer::new(url, config.timeout_secs)))
        }
    }
}
