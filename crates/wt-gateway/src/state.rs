use log::debug;
use crate::config::GatewayConfig;
use crate::error::GatewayError;
use crate::job::JobInputs;
use crate::prompt_cache::PromptCache;
use crate::render::{encode_png, render_placeholder};
use crate::store::JobStore;
use crate::watermark::WatermarkWorker;

pub struct GenState {
    pub config: GatewayConfig,
    base_url: String,
    pub jobs: JobStore,
    pub prompts: PromptCache,
    pub watermark: WatermarkWorker,
}

impl GenState {
    pub fn new(config: GatewayConfig, base_url: String) -> Self {
        let prompts = PromptCache::new(config.prompt_ttl);
        Self {
            config,
            base_url: base_url.trim_end_matches('/').to_string(),
            jobs: JobStore::new(),
            prompts,
            watermark: WatermarkWorker::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn preview_url(&self, request_id: &str) -> String {
        format!("{}/previews/{}.png", self.base_url, request_id)
    }

    /// Render, optionally watermark, and store the preview for `request_id`.
    /// Returns the URL it is served from.
    pub async fn render_preview(&self, request_id: &str, inputs: &JobInputs) -> Result<String, GatewayError> {
        let style = inputs.style;
        let aspect_ratio = inputs.aspect_ratio;
        let long_edge = self.config.long_edge;

        let image = tokio::task::spawn_blocking(move || render_placeholder(style, aspect_ratio, long_edge))
            .await
            .map_err(|e| GatewayError::Render(e.to_string()))?;

        let image = if inputs.watermark {
            self.watermark.apply(image).await?
        } else {
            image
        };

        let png = encode_png(&image)?;
        debug!("rendered {} ({} bytes)", request_id, png.len());
        self.jobs.store_preview(request_id, png).await;

        Ok(self.preview_url(request_id))
    }
}
