//! Application wiring: builds the generation client from configuration and
//! runs the server or one-shot CLI commands.

use crate::ai::{GeminiGenerationClient, GenerationService};
use crate::handler::ThumbnailService;
use crate::models::{Config, GenerationRequest, GenerationResponse};
use crate::render::{FontChain, PngExporter};
use crate::{normalizer, server, Error, Result};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

pub struct App {
    config: Config,
    service: Arc<ThumbnailService>,
}

impl App {
    /// Build an app from a concrete generation client.
    ///
    /// Useful for integration tests and local harnesses that inject mocks.
    pub fn with_services(config: Config, generator: Box<dyn GenerationService>) -> Self {
        Self {
            config,
            service: Arc::new(ThumbnailService::new(generator)),
        }
    }

    /// Construct an app from environment configuration (`Config::from_env`).
    pub fn new() -> Result<Self> {
        let config = Config::from_env()?;
        FontChain::install(config.card_font_path.as_deref());
        info!(
            "Generation provider: Gemini (model: {}, timeout: {:?})",
            config.gemini_model, config.gemini_timeout
        );

        let generator = GeminiGenerationClient::new(
            config.gemini_model.clone(),
            config.gemini_timeout,
        )
        .with_base_url(config.gemini_base_url.clone());

        Ok(Self::with_services(config, Box::new(generator)))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub async fn serve(&self, bind_addr: Option<&str>) -> Result<()> {
        let bind_addr = bind_addr.unwrap_or(&self.config.bind_addr);
        server::serve(bind_addr, Arc::clone(&self.service)).await
    }

    /// One generation; with `out_dir`, every card is also exported as PNG.
    pub async fn generate(
        &self,
        title: &str,
        keywords: &str,
        api_key: Option<&str>,
        out_dir: Option<&Path>,
    ) -> Result<GenerationResponse> {
        let credential = api_key
            .map(str::to_string)
            .or_else(|| self.config.gemini_api_key.clone())
            .ok_or_else(|| {
                Error::Config("no API key: pass --api-key or set GEMINI_API_KEY".to_string())
            })?;

        let request = GenerationRequest::new(title, keywords, credential);
        let batch = self.service.generate(&request).await?;

        if let Some(dir) = out_dir {
            let paths = PngExporter::new(dir)?.export_batch(&batch).await?;
            info!("Exported {} cards to {}", paths.len(), dir.display());
        }

        Ok(batch)
    }

    /// Rasterize a saved `{ "thumbnails": [...] }` batch.
    pub async fn render_file(&self, input: &Path, out_dir: &Path) -> Result<usize> {
        let contents = tokio::fs::read_to_string(input).await?;
        let batch: GenerationResponse = serde_json::from_str(&contents)?;
        normalizer::validate(&batch)?;

        let paths = PngExporter::new(out_dir)?.export_batch(&batch).await?;
        Ok(paths.len())
    }
}
