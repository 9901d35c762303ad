use super::{file_name, render_png, RenderedCard};
use crate::models::{GenerationResponse, SuggestionItem};
use crate::{Error, Result};
use base64::Engine as _;
use std::path::{Path, PathBuf};

/// Writes rasterized cards into a directory.
pub struct PngExporter {
    output_dir: PathBuf,
}

impl PngExporter {
    pub fn new(output_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(output_dir)?;
        Ok(Self {
            output_dir: output_dir.to_path_buf(),
        })
    }

    /// Rasterization and encoding run on the blocking pool.
    pub async fn render(item: &SuggestionItem) -> Result<RenderedCard> {
        let item = item.clone();
        tokio::task::spawn_blocking(move || render_png(&item))
            .await
            .map_err(|e| Error::Invariant(format!("Card rendering task join error: {}", e)))?
    }

    pub async fn export(&self, item: &SuggestionItem) -> Result<PathBuf> {
        let card = Self::render(item).await?;
        let path = self.output_dir.join(&card.file_name);
        tokio::fs::write(&path, &card.png).await?;
        tracing::info!("Exported {}", path.display());
        Ok(path)
    }

    pub async fn export_batch(&self, response: &GenerationResponse) -> Result<Vec<PathBuf>> {
        let mut paths = Vec::with_capacity(response.items.len());
        for item in &response.items {
            paths.push(self.export(item).await?);
        }
        Ok(paths)
    }

    pub fn path_for(&self, item: &SuggestionItem) -> PathBuf {
        self.output_dir.join(file_name(item))
    }
}

/// `data:image/png;base64,...` URL for an encoded PNG.
pub fn to_data_url(png: &[u8]) -> String {
    format!(
        "data:image/png;base64,{}",
        base64::engine::general_purpose::STANDARD.encode(png)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalizer;
    use crate::render::{CARD_HEIGHT, CARD_WIDTH};
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_export_writes_named_png() {
        let dir = TempDir::new().unwrap();
        let exporter = PngExporter::new(dir.path()).unwrap();
        let batch = normalizer::normalize("", "제목", "키워드").unwrap();

        let path = exporter.export(&batch.items[0]).await.unwrap();

        assert_eq!(path, exporter.path_for(&batch.items[0]));
        assert!(path.ends_with("thumbnail-thumbnail-1.png"));
        let img = image::open(&path).unwrap();
        assert_eq!(img.width(), CARD_WIDTH);
        assert_eq!(img.height(), CARD_HEIGHT);
    }

    #[tokio::test]
    async fn test_export_batch_writes_every_card() {
        let dir = TempDir::new().unwrap();
        let exporter = PngExporter::new(&dir.path().join("nested")).unwrap();
        let batch = normalizer::normalize("", "제목", "키워드").unwrap();

        let paths = exporter.export_batch(&batch).await.unwrap();

        assert_eq!(paths.len(), batch.items.len());
        assert!(paths.iter().all(|p| p.exists()));
    }

    #[test]
    fn test_data_url_prefix() {
        let url = to_data_url(&[0x89, 0x50, 0x4E, 0x47]);
        assert_eq!(url, "data:image/png;base64,iVBORw==");
    }
}
